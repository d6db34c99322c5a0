use anyhow::{anyhow, Context, Result};
use authlink_core::{RecordKind, ResolutionBase};
use authlink_sqlite::{parse_mappings, parse_records, CatalogImporter, IndexStats, SqliteCatalog, SqlitePool};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

const CHUNK: usize = 500;

pub async fn execute(pool: SqlitePool, kind: RecordKind, file: &Path, reindex: bool) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let records = parse_records(&text).with_context(|| format!("Failed to parse {}", file.display()))?;

    if records.is_empty() {
        println!("No records found in {}", file.display());
        return Ok(());
    }

    let catalog = SqliteCatalog::new(pool.clone());
    let importer = CatalogImporter::new(pool);
    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
            .map_err(|e| anyhow!("Invalid progress template: {}", e))?
            .progress_chars("##-"),
    );
    pb.set_message(kind.to_string());

    let mut imported = 0;
    for chunk in records.chunks(CHUNK) {
        imported += importer
            .import_records(kind, chunk.to_vec())
            .await
            .with_context(|| format!("Failed to import into {}", kind))?;
        pb.inc(chunk.len() as u64);
    }
    pb.finish_and_clear();
    let total = catalog
        .count(kind)
        .await
        .with_context(|| format!("Failed to count {} records", kind))?;
    println!("Imported {} records into {} ({} total)", imported, kind, total);

    if reindex {
        let stats = importer.rebuild_index().await.context("Failed to rebuild index")?;
        println!("{}", describe(&stats));
    }
    Ok(())
}

pub async fn map(pool: SqlitePool, base: ResolutionBase, file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let pairs = parse_mappings(&text).map_err(|e| anyhow!("{}: {}", file.display(), e))?;

    let count = CatalogImporter::new(pool)
        .import_mappings(base, pairs)
        .await
        .context("Failed to import mappings")?;
    println!("Imported {} {} mappings", count, base);
    Ok(())
}

pub async fn reindex(pool: SqlitePool) -> Result<()> {
    let stats = CatalogImporter::new(pool)
        .rebuild_index()
        .await
        .context("Failed to rebuild index")?;
    println!("{}", describe(&stats));
    Ok(())
}

fn describe(stats: &IndexStats) -> String {
    format!(
        "Index: {} headings, {} indexed records, {} authority links",
        stats.headings, stats.indexed, stats.authority_links
    )
}
