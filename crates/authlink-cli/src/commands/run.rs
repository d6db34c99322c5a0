use crate::cli::RunArgs;
use crate::settings;
use anyhow::{Context, Result};
use authlink_config::AuthlinkConfig;
use authlink_pipeline::{FileAllowList, FileCheckpointStore, ScanController, ScanSummary};
use authlink_sqlite::SqliteCatalog;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub async fn execute(mut config: AuthlinkConfig, args: RunArgs) -> Result<()> {
    args.apply(&mut config);

    let catalog = SqliteCatalog::new(settings::open_pool(&config)?);
    let pipeline = Arc::new(settings::build_pipeline(&config, &catalog));
    let checkpoint = Arc::new(FileCheckpointStore::new(config.storage.checkpoint_file.clone()));

    let mut controller =
        ScanController::new(pipeline, Arc::new(catalog), checkpoint).with_config(settings::scan_config(&config));
    if let Some(path) = &config.storage.allow_list_file {
        info!(path = %path.display(), "Restricting scan to allow-list");
        controller = controller.with_allow_list(Arc::new(FileAllowList::new(path.clone())));
    }

    let stop = controller.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Stop requested, finishing the current id");
            stop.store(true, Ordering::SeqCst);
        }
    });

    let summary = controller.run().await.context("Scan aborted")?;
    println!("{}", summarize(&summary));
    Ok(())
}

pub fn summarize(summary: &ScanSummary) -> String {
    let last = summary
        .last_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "Processed {} ids (last {}), {} restarts, stopped: {:?}",
        summary.processed, last, summary.restarts, summary.stop_reason
    )
}
