//! Per-id processing: discovery followed by dispatch

use crate::discovery::{DiscoveryConfig, LinkageDiscovery};
use crate::dispatcher::{DispatchConfig, DispatchReport, Dispatcher};
use crate::error::Result;
use crate::handlers::{HandlerContext, HandlerRegistry};
use async_trait::async_trait;
use authlink_core::{CatalogIndex, IdResolver, PunctuationFixer, RecordStore};
use std::sync::Arc;
use tracing::{debug, info};

/// Processes one source authority id
#[async_trait]
pub trait IdProcessor: Send + Sync {
    /// Run all work for `auth_id`
    ///
    /// # Errors
    ///
    /// Only system-class failures are returned; the caller restarts the
    /// scan on any error.
    async fn process(&self, auth_id: u64) -> Result<DispatchReport>;
}

/// Pipeline configuration
#[derive(Debug, Clone, Default)]
pub struct LinkagePipelineConfig {
    pub discovery: DiscoveryConfig,
    pub dispatch: DispatchConfig,
    /// Compute changes without saving
    pub dry_run: bool,
}

/// Discovery and dispatch wired to one set of collaborators
pub struct LinkagePipeline {
    discovery: LinkageDiscovery,
    dispatcher: Dispatcher,
}

impl LinkagePipeline {
    pub fn new(
        store: Arc<dyn RecordStore>,
        resolver: Arc<dyn IdResolver>,
        index: Arc<dyn CatalogIndex>,
        fixer: Arc<dyn PunctuationFixer>,
    ) -> Self {
        Self::with_config(store, resolver, index, fixer, LinkagePipelineConfig::default())
    }

    pub fn with_config(
        store: Arc<dyn RecordStore>,
        resolver: Arc<dyn IdResolver>,
        index: Arc<dyn CatalogIndex>,
        fixer: Arc<dyn PunctuationFixer>,
        config: LinkagePipelineConfig,
    ) -> Self {
        let handler_context = HandlerContext::new(store.clone(), fixer.clone()).with_dry_run(config.dry_run);
        let handlers = HandlerRegistry::standard(handler_context);

        Self {
            discovery: LinkageDiscovery::with_config(store, resolver, index, fixer, config.discovery),
            dispatcher: Dispatcher::with_config(handlers, config.dispatch),
        }
    }

    /// Build from explicit parts
    pub fn from_parts(discovery: LinkageDiscovery, dispatcher: Dispatcher) -> Self {
        Self { discovery, dispatcher }
    }
}

#[async_trait]
impl IdProcessor for LinkagePipeline {
    async fn process(&self, auth_id: u64) -> Result<DispatchReport> {
        let auth_id = auth_id.to_string();

        debug!(auth_id = %auth_id, "Phase 1: discovery");
        let tasks = self.discovery.discover(&auth_id).await?;
        if tasks.is_empty() {
            debug!(auth_id = %auth_id, "No tasks");
            return Ok(DispatchReport::default());
        }

        debug!(auth_id = %auth_id, tasks = tasks.len(), "Phase 2: dispatch");
        let report = self.dispatcher.dispatch(tasks).await?;
        info!(
            auth_id = %auth_id,
            batches = report.batches,
            saved = report.saved,
            abandoned = report.abandoned,
            "Authority processed"
        );
        Ok(report)
    }
}
