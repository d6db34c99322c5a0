use crate::settings;
use anyhow::{Context, Result};
use authlink_config::AuthlinkConfig;
use authlink_pipeline::{DispatchReport, IdProcessor};
use authlink_sqlite::SqliteCatalog;

/// Process one authority id; the checkpoint is left alone
pub async fn execute(mut config: AuthlinkConfig, id: u64, dry_run: bool) -> Result<()> {
    if dry_run {
        config.scan.dry_run = true;
    }

    let catalog = SqliteCatalog::new(settings::open_pool(&config)?);
    let pipeline = settings::build_pipeline(&config, &catalog);

    let report = pipeline
        .process(id)
        .await
        .with_context(|| format!("Processing authority {} failed", id))?;

    println!("{}", summarize(id, &report));
    Ok(())
}

pub fn summarize(id: u64, report: &DispatchReport) -> String {
    format!(
        "{}: {} batches, {} saved, {} unchanged, {} dry run, {} skipped, {} abandoned",
        id,
        report.batches,
        report.saved,
        report.unchanged,
        report.dry_run,
        report.skipped,
        report.abandoned
    )
}
