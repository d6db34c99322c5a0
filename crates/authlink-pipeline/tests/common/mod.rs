//! Common test utilities for pipeline tests.

#![allow(dead_code)]

use authlink_core::memory::{InMemoryCatalogIndex, InMemoryRecordStore, StaticIdResolver};
use authlink_core::{NameRules, Record, RecordKind, RecordRef, ResolutionBase};
use authlink_pipeline::{LinkageContext, LinkagePipeline, LinkagePipelineConfig, Task, TaskKind};
use std::sync::Arc;

/// In-memory catalogs seeded through small helpers
#[derive(Clone, Default)]
pub struct Catalogs {
    pub store: InMemoryRecordStore,
    pub resolver: StaticIdResolver,
    pub index: InMemoryCatalogIndex,
}

impl Catalogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add(&self, kind: RecordKind, id: &str, text: &str) {
        self.store.insert(RecordRef::new(kind, id), record(text)).await;
        if kind == RecordKind::LocalAuthority {
            if let Ok(numeric) = id.parse() {
                self.index.add_authority(numeric).await;
            }
        }
    }

    pub async fn map(&self, base: ResolutionBase, local_id: &str, union_id: &str) {
        self.resolver.map(base, local_id, union_id).await;
    }

    pub async fn saved(&self, kind: RecordKind, id: &str) -> Option<Record> {
        let target = RecordRef::new(kind, id);
        self.store
            .saves()
            .await
            .into_iter()
            .rev()
            .find(|(saved, _)| *saved == target)
            .map(|(_, content)| content)
    }

    pub async fn save_count_for(&self, kind: RecordKind, id: &str) -> usize {
        let target = RecordRef::new(kind, id);
        self.store
            .saves()
            .await
            .iter()
            .filter(|(saved, _)| *saved == target)
            .count()
    }

    pub fn pipeline(&self) -> LinkagePipeline {
        self.pipeline_with(LinkagePipelineConfig::default())
    }

    pub fn pipeline_with(&self, config: LinkagePipelineConfig) -> LinkagePipeline {
        LinkagePipeline::with_config(
            Arc::new(self.store.clone()),
            Arc::new(self.resolver.clone()),
            Arc::new(self.index.clone()),
            Arc::new(NameRules),
            config,
        )
    }
}

pub fn record(text: &str) -> Record {
    text.parse().expect("fixture record parses")
}

/// Seed the catalogs with one person found in every catalog
///
/// Local authority 115575 resolves to union authority 000001. Local
/// bibliographic record 10 is indexed under it and resolves to union
/// bibliographic record 900.
pub async fn seed_immo_aakkula(catalogs: &Catalogs, authority_text: &str) {
    catalogs.add(RecordKind::LocalAuthority, "115575", authority_text).await;
    catalogs
        .add(
            RecordKind::UnionAuthority,
            "000001",
            "001    000001\n100 1  ‡aAakkula, Immo,‡d1974-\nUPD    ‡aN",
        )
        .await;
    catalogs.map(ResolutionBase::Authority, "115575", "000001").await;

    catalogs
        .add(
            RecordKind::LocalBibliographic,
            "10",
            "001    10\n245 10 ‡aKirja\n700 1  ‡aAakkula, Immo,‡d1974-",
        )
        .await;
    catalogs.index.index_bib("115575", "10").await;
    catalogs.map(ResolutionBase::Bibliographic, "10", "900").await;
    catalogs
        .add(
            RecordKind::UnionBibliographic,
            "900",
            "001    900\n245 10 ‡aKirja\n700 1  ‡aAakkula, Immo,‡d1974-",
        )
        .await;
}

/// A context with no query terms, for tests that never match fields
pub fn empty_context() -> Arc<LinkageContext> {
    Arc::new(LinkageContext {
        auth_id: "1".into(),
        asteri_id: "000001".into(),
        query_terms: Vec::new(),
        authority_record: Record::default(),
        fixed_record: Record::default(),
    })
}

pub fn task(kind: TaskKind, id: &str) -> Task {
    Task::new(kind, id, Record::default(), empty_context())
}
