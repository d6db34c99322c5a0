//! Linkage discovery
//!
//! Turns one source authority id into the list of [`Task`]s to run:
//!
//! 1. Read the local authority and resolve its union counterpart
//! 2. Build the query terms and the year-fixed donor record
//! 3. Concurrently collect the authority side (related authorities in
//!    both catalogs) and the bibliographic side (local bibliographic
//!    records by index and by heading, then their union counterparts)
//!
//! Failures are sorted by class. System failures are returned; everything
//! else is logged and costs only the affected source id or sub-target.

use crate::error::{PipelineError, Result};
use crate::task::{LinkageContext, Task, TaskKind};
use authlink_core::utils::is_agent_authority;
use authlink_core::{
    fix_authority_years, name_heading_permutations, normalize, CatalogIndex, IdResolver,
    PunctuationFixer, Record, RecordKind, RecordRef, RecordStore, ResolutionBase,
};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Discovery configuration
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Rebuild the source's dates from its structured years
    pub fix_authority_years: bool,
    /// Local bibliographic ids resolved concurrently
    pub resolve_chunk_size: usize,
    /// Query bibliographic records by heading in addition to the index
    pub fuzzy_headings: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            fix_authority_years: true,
            resolve_chunk_size: 20,
            fuzzy_headings: true,
        }
    }
}

/// Heading queries for fuzzy bibliographic discovery
///
/// Name, name and birth year, name and both years, each normalized.
pub fn fuzzy_headings(record: &Record) -> Vec<String> {
    let Some(name) = record
        .first_value("100", 'a')
        .map(normalize)
        .filter(|n| !n.is_empty())
    else {
        return Vec::new();
    };

    let mut headings = vec![name.clone()];
    let birth = record.first_value("046", 'f').map(normalize);
    let death = record.first_value("046", 'g').map(normalize);

    if let Some(birth) = birth.filter(|b| !b.is_empty()) {
        let with_birth = format!("{} {}", name, birth);
        headings.push(with_birth.clone());
        if let Some(death) = death.filter(|d| !d.is_empty()) {
            headings.push(format!("{} {}", with_birth, death));
        }
    }

    headings
}

/// Keep a sub-target result, or log and drop a non-system failure
fn recover<T>(result: Result<T>, target: &RecordRef, auth_id: &str) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_system() => Err(e),
        Err(e) => {
            warn!(auth_id = %auth_id, target = %target, class = %e.class(), error = %e, "Skipping target");
            Ok(None)
        }
    }
}

/// Builds the tasks of one source authority id
pub struct LinkageDiscovery {
    store: Arc<dyn RecordStore>,
    resolver: Arc<dyn IdResolver>,
    index: Arc<dyn CatalogIndex>,
    fixer: Arc<dyn PunctuationFixer>,
    config: DiscoveryConfig,
}

impl LinkageDiscovery {
    pub fn new(
        store: Arc<dyn RecordStore>,
        resolver: Arc<dyn IdResolver>,
        index: Arc<dyn CatalogIndex>,
        fixer: Arc<dyn PunctuationFixer>,
    ) -> Self {
        Self::with_config(store, resolver, index, fixer, DiscoveryConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn RecordStore>,
        resolver: Arc<dyn IdResolver>,
        index: Arc<dyn CatalogIndex>,
        fixer: Arc<dyn PunctuationFixer>,
        config: DiscoveryConfig,
    ) -> Self {
        Self {
            store,
            resolver,
            index,
            fixer,
            config,
        }
    }

    /// Discover the tasks of `auth_id`
    ///
    /// # Errors
    ///
    /// Only system-class failures are returned. Any other failure is
    /// logged with the source record and yields no tasks.
    pub async fn discover(&self, auth_id: &str) -> Result<Vec<Task>> {
        match self.discover_tasks(auth_id).await {
            Ok(tasks) => {
                info!(auth_id = %auth_id, tasks = tasks.len(), "Discovery complete");
                Ok(tasks)
            }
            Err(e) if e.is_system() => Err(e),
            Err(e) => {
                error!(auth_id = %auth_id, class = %e.class(), error = %e, "Discovery failed");
                let source = RecordRef::new(RecordKind::LocalAuthority, auth_id);
                if let Ok(record) = self.store.read_record(&source).await {
                    error!("{}:\n{}", source.kind, record);
                }
                Ok(Vec::new())
            }
        }
    }

    async fn discover_tasks(&self, auth_id: &str) -> Result<Vec<Task>> {
        let source = RecordRef::new(RecordKind::LocalAuthority, auth_id);
        let authority_record = self.store.read_record(&source).await?;

        if !is_agent_authority(&authority_record) {
            debug!(auth_id = %auth_id, "Not an agent authority, skipping");
            return Ok(Vec::new());
        }

        let hints = authority_record.link_hints(ResolutionBase::Authority.hint_prefix());
        let asteri_id = self
            .resolver
            .resolve(auth_id, ResolutionBase::Authority, &hints)
            .await?;
        debug!(auth_id = %auth_id, asteri_id = %asteri_id, "Resolved union authority");

        let query_terms = name_heading_permutations(&authority_record)?;

        let fixed_record =
            if self.config.fix_authority_years && authority_record.fields_with_tag("100").count() == 1 {
                fix_authority_years(&authority_record, self.fixer.as_ref())?
            } else {
                authority_record.clone()
            };

        let union_ref = RecordRef::new(RecordKind::UnionAuthority, asteri_id.clone());
        let union_record = self.store.read_record(&union_ref).await?;

        let context = Arc::new(LinkageContext {
            auth_id: auth_id.to_string(),
            asteri_id: asteri_id.clone(),
            query_terms,
            authority_record: authority_record.clone(),
            fixed_record,
        });
        info!(auth_id = %auth_id, terms = %context.terms_description(), "Query terms");

        let mut tasks = vec![
            Task::new(TaskKind::FenauFix, auth_id, authority_record, context.clone()),
            Task::new(TaskKind::AsteriFix, asteri_id, union_record, context.clone()),
        ];

        let (authority_side, bibliographic_side) =
            tokio::try_join!(self.authority_side(&context), self.bibliographic_side(&context))?;
        tasks.extend(authority_side);
        tasks.extend(bibliographic_side);

        Ok(tasks)
    }

    /// Related authorities in the local and the union catalog
    async fn authority_side(&self, context: &Arc<LinkageContext>) -> Result<Vec<Task>> {
        let auth_id = context.auth_id.as_str();
        let linked_ids = self.index.linked_authority_ids(auth_id).await?;
        debug!(auth_id = %auth_id, linked = linked_ids.len(), "Related authorities");

        let mut tasks = Vec::new();
        for id in linked_ids.into_iter().filter(|id| id != auth_id) {
            let local_ref = RecordRef::new(RecordKind::LocalAuthority, id.clone());
            let read = self.store.read_record(&local_ref).await.map_err(PipelineError::from);
            let Some(record) = recover(read, &local_ref, auth_id)? else {
                continue;
            };
            tasks.push(Task::new(TaskKind::LinkedFenau, id.clone(), record.clone(), context.clone()));

            if !is_agent_authority(&record) {
                continue;
            }

            let hints = record.link_hints(ResolutionBase::Authority.hint_prefix());
            let resolved = self
                .resolver
                .resolve(&id, ResolutionBase::Authority, &hints)
                .await
                .map_err(PipelineError::from);
            let Some(union_id) = recover(resolved, &local_ref, auth_id)? else {
                continue;
            };

            let union_ref = RecordRef::new(RecordKind::UnionAuthority, union_id.clone());
            let read = self.store.read_record(&union_ref).await.map_err(PipelineError::from);
            if let Some(union_record) = recover(read, &union_ref, auth_id)? {
                tasks.push(Task::new(TaskKind::LinkedAsteri, union_id, union_record, context.clone()));
            }
        }

        Ok(tasks)
    }

    /// Local bibliographic records and their union counterparts
    async fn bibliographic_side(&self, context: &Arc<LinkageContext>) -> Result<Vec<Task>> {
        let auth_id = context.auth_id.as_str();
        let indexed = self.index.indexed_bib_ids(auth_id).await?;

        let mut bib_ids = indexed.clone();
        if self.config.fuzzy_headings {
            for heading in fuzzy_headings(&context.authority_record) {
                let found = self.index.heading_bib_ids(&heading).await?;
                bib_ids.extend(found.into_iter().filter(|id| !indexed.contains(id)));
            }
        }
        debug!(auth_id = %auth_id, indexed = indexed.len(), total = bib_ids.len(), "Bibliographic candidates");

        let mut local = Vec::new();
        for id in bib_ids {
            let local_ref = RecordRef::new(RecordKind::LocalBibliographic, id.clone());
            let read = self.store.read_record(&local_ref).await.map_err(PipelineError::from);
            if let Some(record) = recover(read, &local_ref, auth_id)? {
                local.push((id, record));
            }
        }

        let mut tasks: Vec<Task> = local
            .iter()
            .map(|(id, record)| Task::new(TaskKind::Fenni, id.clone(), record.clone(), context.clone()))
            .collect();

        for chunk in local.chunks(self.config.resolve_chunk_size.max(1)) {
            let resolved = join_all(chunk.iter().map(|(id, record)| self.union_bibliographic(id, record, context))).await;
            for result in resolved {
                if let Some(task) = result? {
                    tasks.push(task);
                }
            }
        }

        Ok(tasks)
    }

    async fn union_bibliographic(
        &self,
        local_id: &str,
        record: &Record,
        context: &Arc<LinkageContext>,
    ) -> Result<Option<Task>> {
        let auth_id = context.auth_id.as_str();
        let local_ref = RecordRef::new(RecordKind::LocalBibliographic, local_id);
        let hints = record.link_hints(ResolutionBase::Bibliographic.hint_prefix());

        let resolved = self
            .resolver
            .resolve(local_id, ResolutionBase::Bibliographic, &hints)
            .await
            .map_err(PipelineError::from);
        let Some(union_id) = recover(resolved, &local_ref, auth_id)? else {
            return Ok(None);
        };

        let union_ref = RecordRef::new(RecordKind::UnionBibliographic, union_id.clone());
        let read = self.store.read_record(&union_ref).await.map_err(PipelineError::from);
        Ok(recover(read, &union_ref, auth_id)?
            .map(|union_record| Task::new(TaskKind::Melinda, union_id, union_record, context.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(text: &str) -> Record {
        text.parse().unwrap()
    }

    #[test]
    fn fuzzy_headings_grow_with_years() {
        let authority = record("001    1\n046    ‡f1974‡g2099\n100 1  ‡aAakkula, Immo,‡d1974-2099");
        assert_eq!(
            fuzzy_headings(&authority),
            vec!["AAKKULA IMMO", "AAKKULA IMMO 1974", "AAKKULA IMMO 1974 2099"]
        );
    }

    #[test]
    fn fuzzy_headings_need_birth_before_death() {
        let authority = record("001    1\n046    ‡g2099\n100 1  ‡aAakkula, Immo");
        assert_eq!(fuzzy_headings(&authority), vec!["AAKKULA IMMO"]);
    }

    #[test]
    fn no_personal_name_no_headings() {
        assert!(fuzzy_headings(&record("001    1\n110 2  ‡aYhtiö Oy")).is_empty());
    }
}
