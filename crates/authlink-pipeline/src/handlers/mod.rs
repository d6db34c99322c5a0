//! Per-variant task handlers
//!
//! Each [`TaskHandler`] takes one [`TaskBatch`] (every task aimed at the
//! same target record), folds the tasks' transforms over the target,
//! collapses duplicate fields and saves the result at most once.
//!
//! ## Error Handling
//!
//! Linking, punctuation and record-level store failures are logged and
//! reported as [`Outcome::Abandoned`]. Only system-class failures are
//! returned as `Err`, which stops the scan attempt.

mod authority;
mod bibliographic;
mod logging;

pub use authority::{AsteriFixHandler, FenauFixHandler, LinkedAsteriHandler, LinkedFenauHandler};
pub use bibliographic::{FenniHandler, MelindaHandler};

use crate::dispatcher::TaskBatch;
use crate::error::{ErrorClass, PipelineError, Result};
use crate::task::TaskKind;
use async_trait::async_trait;
use authlink_core::utils::update_upd_to_y;
use authlink_core::{PunctuationFixer, Record, RecordStore, StoreError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

/// What a handler did with its batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Saved,
    Unchanged,
    /// Changes were computed but not written
    DryRun,
    /// Nothing to do for this target
    Skipped(String),
    /// The batch failed and was dropped
    Abandoned(ErrorClass),
}

/// Handler for one task variant
#[async_trait]
pub trait TaskHandler: Send + Sync {
    fn kind(&self) -> TaskKind;

    /// Apply every task of the batch to its target
    ///
    /// # Errors
    ///
    /// Only system-class failures are returned.
    async fn handle(&self, batch: &TaskBatch) -> Result<Outcome>;
}

/// Collaborators shared by all handlers
#[derive(Clone)]
pub struct HandlerContext {
    pub store: Arc<dyn RecordStore>,
    pub fixer: Arc<dyn PunctuationFixer>,
    pub dry_run: bool,
}

impl HandlerContext {
    pub fn new(store: Arc<dyn RecordStore>, fixer: Arc<dyn PunctuationFixer>) -> Self {
        Self {
            store,
            fixer,
            dry_run: false,
        }
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Save `updated` unless it equals `original`
    ///
    /// Union records get their update flag set before saving.
    pub(crate) async fn finish(&self, batch: &TaskBatch, original: &Record, mut updated: Record) -> Result<Outcome> {
        let target = &batch.target;

        if updated.to_string() == original.to_string() {
            info!(target = %target, "No changes");
            return Ok(Outcome::Unchanged);
        }

        if matches!(batch.kind, TaskKind::AsteriFix | TaskKind::LinkedAsteri) {
            update_upd_to_y(&mut updated);
        }

        info!(target = %target, "Saving record");
        if self.dry_run {
            info!(target = %target, "Dry run - not saving");
            return Ok(Outcome::DryRun);
        }

        match self.store.save_record(target, &updated).await {
            Ok(()) => {
                info!(target = %target, "Record saved successfully");
                Ok(Outcome::Saved)
            }
            Err(e @ (StoreError::Transport(_) | StoreError::InvalidData(_))) => Err(e.into()),
            Err(e) => {
                error!(target = %target, error = %e, "Saving failed");
                Ok(Outcome::Abandoned(PipelineError::from(e).class()))
            }
        }
    }
}

/// Handlers keyed by variant
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<TaskKind, Arc<dyn TaskHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the handler of every variant
    pub fn standard(context: HandlerContext) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(FenauFixHandler::new(context.clone())));
        registry.register(Arc::new(LinkedFenauHandler::new(context.clone())));
        registry.register(Arc::new(FenniHandler::new(context.clone())));
        registry.register(Arc::new(MelindaHandler::new(context.clone())));
        registry.register(Arc::new(AsteriFixHandler::new(context.clone())));
        registry.register(Arc::new(LinkedAsteriHandler::new(context)));
        registry
    }

    pub fn register(&mut self, handler: Arc<dyn TaskHandler>) {
        self.handlers.insert(handler.kind(), handler);
    }

    pub fn get(&self, kind: TaskKind) -> Result<Arc<dyn TaskHandler>> {
        self.handlers
            .get(&kind)
            .cloned()
            .ok_or_else(|| PipelineError::MissingHandler(kind.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use authlink_core::memory::InMemoryRecordStore;
    use authlink_core::NameRules;

    #[test]
    fn standard_registry_covers_every_variant() {
        let context = HandlerContext::new(Arc::new(InMemoryRecordStore::new()), Arc::new(NameRules));
        let registry = HandlerRegistry::standard(context);
        for kind in TaskKind::ALL {
            assert_eq!(registry.get(kind).unwrap().kind(), kind);
        }
    }

    #[test]
    fn empty_registry_reports_missing_handler() {
        let result = HandlerRegistry::new().get(TaskKind::Fenni);
        assert!(matches!(result, Err(PipelineError::MissingHandler(_))));
    }
}
