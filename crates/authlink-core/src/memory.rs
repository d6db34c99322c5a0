//! In-memory collaborators
//!
//! Useful for tests, fixtures and dry tooling. All data is lost when the
//! instance is dropped. Every type uses `Arc<RwLock<...>>` internally, so
//! clones share the same storage.

use crate::catalog::{
    AllowListSource, CatalogIndex, CheckpointStore, IdResolver, RecordStore, ResolutionBase,
    ResolveResult, StoreResult,
};
use crate::error::{ResolveError, StoreError};
use crate::record::{Record, RecordRef};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct StoreState {
    records: HashMap<RecordRef, Record>,
    saves: Vec<(RecordRef, Record)>,
    transport_failure: Option<String>,
}

/// Record store over a hash map that keeps a log of every save
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, record: RecordRef, content: Record) {
        self.state.write().await.records.insert(record, content);
    }

    /// Current content of a record
    pub async fn get(&self, record: &RecordRef) -> Option<Record> {
        self.state.read().await.records.get(record).cloned()
    }

    /// Every successful save, in order
    pub async fn saves(&self) -> Vec<(RecordRef, Record)> {
        self.state.read().await.saves.clone()
    }

    pub async fn save_count(&self) -> usize {
        self.state.read().await.saves.len()
    }

    /// Make every call fail with a transport error until cleared
    pub async fn set_transport_failure(&self, message: Option<&str>) {
        self.state.write().await.transport_failure = message.map(str::to_string);
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn read_record(&self, record: &RecordRef) -> StoreResult<Record> {
        let state = self.state.read().await;
        if let Some(message) = &state.transport_failure {
            return Err(StoreError::Transport(message.clone()));
        }
        state
            .records
            .get(record)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(record.clone()))
    }

    async fn save_record(&self, record: &RecordRef, content: &Record) -> StoreResult<()> {
        let mut state = self.state.write().await;
        if let Some(message) = &state.transport_failure {
            return Err(StoreError::Transport(message.clone()));
        }
        state.records.insert(record.clone(), content.clone());
        state.saves.push((record.clone(), content.clone()));
        Ok(())
    }
}

/// Resolver backed by a fixed local-to-union mapping
///
/// A local id mapped to several union ids resolves as ambiguous.
#[derive(Clone, Default)]
pub struct StaticIdResolver {
    mappings: Arc<RwLock<HashMap<(ResolutionBase, String), Vec<String>>>>,
}

impl StaticIdResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn map(&self, base: ResolutionBase, local_id: &str, union_id: &str) {
        self.mappings
            .write()
            .await
            .entry((base, local_id.to_string()))
            .or_default()
            .push(union_id.to_string());
    }
}

#[async_trait]
impl IdResolver for StaticIdResolver {
    async fn resolve(&self, local_id: &str, base: ResolutionBase, hints: &[String]) -> ResolveResult<String> {
        let mappings = self.mappings.read().await;
        let mut candidates: BTreeSet<String> = mappings
            .get(&(base, local_id.to_string()))
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default();
        candidates.extend(hints.iter().cloned());

        let mut candidates = candidates.into_iter();
        match (candidates.next(), candidates.next()) {
            (Some(id), None) => Ok(id),
            (None, _) => Err(ResolveError::NoMatch {
                local_id: local_id.to_string(),
            }),
            (Some(first), Some(second)) => {
                let mut all = vec![first, second];
                all.extend(candidates);
                Err(ResolveError::Ambiguous {
                    local_id: local_id.to_string(),
                    candidates: all,
                })
            }
        }
    }
}

#[derive(Default)]
struct IndexState {
    authority_ids: BTreeSet<u64>,
    linked: HashMap<String, Vec<String>>,
    indexed: HashMap<String, Vec<String>>,
    headings: HashMap<String, Vec<String>>,
}

/// Catalog index over explicit lookup tables
#[derive(Clone, Default)]
pub struct InMemoryCatalogIndex {
    state: Arc<RwLock<IndexState>>,
}

impl InMemoryCatalogIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_authority(&self, id: u64) {
        self.state.write().await.authority_ids.insert(id);
    }

    pub async fn link_authorities(&self, auth_id: &str, linked_id: &str) {
        self.state
            .write()
            .await
            .linked
            .entry(auth_id.to_string())
            .or_default()
            .push(linked_id.to_string());
    }

    pub async fn index_bib(&self, auth_id: &str, bib_id: &str) {
        self.state
            .write()
            .await
            .indexed
            .entry(auth_id.to_string())
            .or_default()
            .push(bib_id.to_string());
    }

    pub async fn add_heading(&self, heading: &str, bib_id: &str) {
        self.state
            .write()
            .await
            .headings
            .entry(heading.to_string())
            .or_default()
            .push(bib_id.to_string());
    }
}

#[async_trait]
impl CatalogIndex for InMemoryCatalogIndex {
    async fn last_authority_id(&self) -> StoreResult<u64> {
        Ok(self
            .state
            .read()
            .await
            .authority_ids
            .iter()
            .next_back()
            .copied()
            .unwrap_or(0))
    }

    async fn authority_ids_after(&self, after: u64, limit: usize) -> StoreResult<Vec<u64>> {
        let state = self.state.read().await;
        Ok(state
            .authority_ids
            .range(after.saturating_add(1)..)
            .take(limit)
            .copied()
            .collect())
    }

    async fn linked_authority_ids(&self, auth_id: &str) -> StoreResult<Vec<String>> {
        Ok(self.state.read().await.linked.get(auth_id).cloned().unwrap_or_default())
    }

    async fn indexed_bib_ids(&self, auth_id: &str) -> StoreResult<Vec<String>> {
        Ok(self.state.read().await.indexed.get(auth_id).cloned().unwrap_or_default())
    }

    async fn heading_bib_ids(&self, heading: &str) -> StoreResult<Vec<String>> {
        Ok(self.state.read().await.headings.get(heading).cloned().unwrap_or_default())
    }
}

/// Checkpoint held in memory, with a history of writes
#[derive(Clone, Default)]
pub struct InMemoryCheckpointStore {
    writes: Arc<RwLock<Vec<u64>>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(id: u64) -> Self {
        Self {
            writes: Arc::new(RwLock::new(vec![id])),
        }
    }

    pub async fn history(&self) -> Vec<u64> {
        self.writes.read().await.clone()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn read(&self) -> StoreResult<Option<u64>> {
        Ok(self.writes.read().await.last().copied())
    }

    async fn write(&self, id: u64) -> StoreResult<()> {
        self.writes.write().await.push(id);
        Ok(())
    }
}

/// Allow-list given up front
#[derive(Debug, Clone, Default)]
pub struct StaticAllowList {
    ids: Vec<u64>,
}

impl StaticAllowList {
    pub fn new(mut ids: Vec<u64>) -> Self {
        ids.sort_unstable();
        ids.dedup();
        Self { ids }
    }
}

#[async_trait]
impl AllowListSource for StaticAllowList {
    async fn load(&self) -> StoreResult<Option<Vec<u64>>> {
        Ok(Some(self.ids.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordKind;

    #[tokio::test]
    async fn store_logs_saves() {
        let store = InMemoryRecordStore::new();
        let id = RecordRef::new(RecordKind::LocalBibliographic, "1");
        let record: Record = "001    1".parse().unwrap();

        assert!(matches!(store.read_record(&id).await, Err(StoreError::NotFound(_))));
        store.save_record(&id, &record).await.unwrap();
        assert_eq!(store.read_record(&id).await.unwrap(), record);
        assert_eq!(store.save_count().await, 1);
    }

    #[tokio::test]
    async fn store_transport_failure() {
        let store = InMemoryRecordStore::new();
        store.set_transport_failure(Some("connection reset")).await;
        let id = RecordRef::new(RecordKind::LocalAuthority, "1");
        assert!(matches!(store.read_record(&id).await, Err(StoreError::Transport(_))));
    }

    #[tokio::test]
    async fn resolver_detects_ambiguity() {
        let resolver = StaticIdResolver::new();
        resolver.map(ResolutionBase::Authority, "1", "000001").await;

        assert_eq!(
            resolver.resolve("1", ResolutionBase::Authority, &[]).await.unwrap(),
            "000001"
        );
        assert_eq!(
            resolver
                .resolve("1", ResolutionBase::Authority, &["000001".to_string()])
                .await
                .unwrap(),
            "000001"
        );
        assert!(matches!(
            resolver
                .resolve("1", ResolutionBase::Authority, &["000002".to_string()])
                .await,
            Err(ResolveError::Ambiguous { .. })
        ));
        assert!(matches!(
            resolver.resolve("2", ResolutionBase::Bibliographic, &[]).await,
            Err(ResolveError::NoMatch { .. })
        ));
    }

    #[tokio::test]
    async fn index_pages_authority_ids() {
        let index = InMemoryCatalogIndex::new();
        for id in [3, 1, 7, 5] {
            index.add_authority(id).await;
        }
        assert_eq!(index.last_authority_id().await.unwrap(), 7);
        assert_eq!(index.authority_ids_after(1, 2).await.unwrap(), vec![3, 5]);
        assert_eq!(index.authority_ids_after(7, 2).await.unwrap(), Vec::<u64>::new());
    }

    #[tokio::test]
    async fn checkpoint_reads_last_write() {
        let store = InMemoryCheckpointStore::new();
        assert_eq!(store.read().await.unwrap(), None);
        store.write(4).await.unwrap();
        store.write(9).await.unwrap();
        assert_eq!(store.read().await.unwrap(), Some(9));
        assert_eq!(store.history().await, vec![4, 9]);
    }
}
