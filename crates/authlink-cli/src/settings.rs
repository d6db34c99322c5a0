//! Wiring from configuration to the pipeline and backend

use anyhow::{Context, Result};
use authlink_config::AuthlinkConfig;
use authlink_core::NameRules;
use authlink_pipeline::{DiscoveryConfig, DispatchConfig, LinkagePipeline, LinkagePipelineConfig, ScanConfig};
use authlink_sqlite::{SqliteCatalog, SqliteConfig, SqlitePool};
use std::sync::Arc;
use std::time::Duration;

pub fn scan_config(config: &AuthlinkConfig) -> ScanConfig {
    ScanConfig {
        limit: config.scan.limit,
        skip_on_error: config.scan.skip_on_error,
        backoff: Duration::from_secs(config.scan.backoff_seconds),
        max_restarts: config.scan.max_restarts,
        page_size: config.scan.page_size,
        ..ScanConfig::default()
    }
}

pub fn pipeline_config(config: &AuthlinkConfig) -> LinkagePipelineConfig {
    LinkagePipelineConfig {
        discovery: DiscoveryConfig {
            fix_authority_years: config.discovery.fix_authority_years,
            resolve_chunk_size: config.discovery.resolve_chunk_size,
            fuzzy_headings: config.discovery.fuzzy_headings,
        },
        dispatch: DispatchConfig {
            union_window: config.dispatch.union_window,
        },
        dry_run: config.scan.dry_run,
    }
}

pub fn open_pool(config: &AuthlinkConfig) -> Result<SqlitePool> {
    let path = &config.storage.database;
    SqlitePool::new(SqliteConfig::new(path))
        .with_context(|| format!("Failed to open catalog database {}", path.display()))
}

/// Pipeline over the configured database, with the bundled punctuation rules
pub fn build_pipeline(config: &AuthlinkConfig, catalog: &SqliteCatalog) -> LinkagePipeline {
    let catalog = Arc::new(catalog.clone());
    LinkagePipeline::with_config(
        catalog.clone(),
        catalog.clone(),
        catalog,
        Arc::new(NameRules),
        pipeline_config(config),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_settings_carry_over() {
        let mut config = AuthlinkConfig::default();
        config.scan.backoff_seconds = 7;
        config.scan.max_restarts = Some(3);

        let scan = scan_config(&config);
        assert_eq!(scan.backoff, Duration::from_secs(7));
        assert_eq!(scan.max_restarts, Some(3));
        assert_eq!(scan.direct_list_threshold, ScanConfig::default().direct_list_threshold);
    }

    #[test]
    fn dry_run_reaches_pipeline() {
        let mut config = AuthlinkConfig::default();
        config.scan.dry_run = true;
        config.dispatch.union_window = 3;

        let pipeline = pipeline_config(&config);
        assert!(pipeline.dry_run);
        assert_eq!(pipeline.dispatch.union_window, 3);
    }
}
