//! Collaborator contracts
//!
//! Catalog I/O lives outside the core. These traits are what the pipeline
//! consumes; `authlink-sqlite` provides a database-backed implementation
//! and [`crate::memory`] provides in-memory ones for tests and tooling.
//!
//! All traits are object safe and `Send + Sync` so they can be shared as
//! `Arc<dyn Trait>` across concurrently running handlers.

use crate::error::{ResolveError, StoreError};
use crate::record::{Record, RecordKind, RecordRef};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type StoreResult<T> = Result<T, StoreError>;
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Read and write access to the four catalogs
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read one record
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the catalog has no such record
    /// - `StoreError::Transport` for backend failures
    async fn read_record(&self, record: &RecordRef) -> StoreResult<Record>;

    /// Replace a stored record
    ///
    /// # Errors
    ///
    /// - `StoreError::Rejected` if the catalog refuses the content
    /// - `StoreError::Transport` for backend failures
    async fn save_record(&self, record: &RecordRef, content: &Record) -> StoreResult<()>;
}

/// Which union catalog a local id is resolved into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolutionBase {
    Authority,
    Bibliographic,
}

impl ResolutionBase {
    /// Kind of the records the resolved ids point at
    pub fn target_kind(&self) -> RecordKind {
        match self {
            ResolutionBase::Authority => RecordKind::UnionAuthority,
            ResolutionBase::Bibliographic => RecordKind::UnionBibliographic,
        }
    }

    /// Prefix of the hints carried in the local record's 035 field
    pub fn hint_prefix(&self) -> &'static str {
        match self {
            ResolutionBase::Authority => "(FI-ASTERI-N)",
            ResolutionBase::Bibliographic => "FCC",
        }
    }
}

impl fmt::Display for ResolutionBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.target_kind().catalog_name())
    }
}

/// Maps local catalog ids to union catalog ids
#[async_trait]
pub trait IdResolver: Send + Sync {
    /// Resolve `local_id` into exactly one union catalog id
    ///
    /// # Arguments
    ///
    /// * `local_id` - Id in the local catalog
    /// * `base` - Union catalog to resolve into
    /// * `hints` - Union ids already recorded in the local record
    ///
    /// # Errors
    ///
    /// - `ResolveError::NoMatch` when nothing matches
    /// - `ResolveError::Ambiguous` when more than one distinct record matches
    async fn resolve(&self, local_id: &str, base: ResolutionBase, hints: &[String]) -> ResolveResult<String>;
}

/// Id enumeration and discovery queries over the local catalogs
#[async_trait]
pub trait CatalogIndex: Send + Sync {
    /// Highest local authority id
    async fn last_authority_id(&self) -> StoreResult<u64>;

    /// Up to `limit` local authority ids greater than `after`, ascending
    async fn authority_ids_after(&self, after: u64, limit: usize) -> StoreResult<Vec<u64>>;

    /// Local authority ids whose headings reference `auth_id` or are
    /// referenced by it
    async fn linked_authority_ids(&self, auth_id: &str) -> StoreResult<Vec<String>>;

    /// Local bibliographic ids indexed under the headings of `auth_id`
    async fn indexed_bib_ids(&self, auth_id: &str) -> StoreResult<Vec<String>>;

    /// Local bibliographic ids carrying a personal name heading equal to
    /// the normalized `heading`
    async fn heading_bib_ids(&self, heading: &str) -> StoreResult<Vec<String>>;
}

/// Persisted scan position
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Last completed id; `None` means start from zero
    async fn read(&self) -> StoreResult<Option<u64>>;

    async fn write(&self, id: u64) -> StoreResult<()>;
}

/// Restricts the scan to explicit ids
#[async_trait]
pub trait AllowListSource: Send + Sync {
    /// Sorted, deduplicated ids; `None` means every id is processed
    async fn load(&self) -> StoreResult<Option<Vec<u64>>>;
}

/// No allow-list: every id is processed
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl AllowListSource for AllowAll {
    async fn load(&self) -> StoreResult<Option<Vec<u64>>> {
        Ok(None)
    }
}

/// Parse a newline-delimited id list, ignoring blank lines
///
/// The result is sorted and deduplicated.
pub fn parse_id_list(text: &str) -> Result<Vec<u64>, String> {
    let mut ids = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.parse::<u64>()
                .map_err(|_| format!("'{}' is not a numeric id", line))
        })
        .collect::<Result<Vec<_>, _>>()?;
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sorted_unique_ids() {
        assert_eq!(parse_id_list("5\n\n 3\n5\n1\n").unwrap(), vec![1, 3, 5]);
    }

    #[test]
    fn rejects_non_numeric_lines() {
        assert!(parse_id_list("1\nabc\n").is_err());
    }

    #[test]
    fn base_targets_union_catalogs() {
        assert_eq!(ResolutionBase::Authority.target_kind(), RecordKind::UnionAuthority);
        assert_eq!(ResolutionBase::Bibliographic.to_string(), "MELINDA");
    }

    #[tokio::test]
    async fn allow_all_has_no_list() {
        assert_eq!(AllowAll.load().await.unwrap(), None);
    }
}
