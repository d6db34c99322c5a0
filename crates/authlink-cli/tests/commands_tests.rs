//! Command wiring against a real database file

use authlink_cli::cli::RunArgs;
use authlink_cli::commands;
use authlink_config::AuthlinkConfig;
use authlink_core::{RecordKind, RecordRef, RecordStore, ResolutionBase};
use authlink_sqlite::{SqliteCatalog, SqliteConfig, SqlitePool};
use std::path::Path;
use tempfile::TempDir;

// ============================================================================
// Fixtures
// ============================================================================

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn config_in(dir: &TempDir) -> AuthlinkConfig {
    let mut config = AuthlinkConfig::default();
    config.storage.database = dir.path().join("catalog.db");
    config.storage.checkpoint_file = dir.path().join("checkpoint.txt");
    config.scan.max_restarts = Some(0);
    config
}

fn pool(config: &AuthlinkConfig) -> SqlitePool {
    SqlitePool::new(SqliteConfig::new(&config.storage.database)).unwrap()
}

async fn import_fixture(dir: &TempDir, config: &AuthlinkConfig) {
    let files = [
        (
            RecordKind::LocalAuthority,
            "fenau.txt",
            "001    115575\n100 1  ‡aAakkula, Immo,‡d1974-\n",
        ),
        (
            RecordKind::UnionAuthority,
            "asteri.txt",
            "001    000001\n100 1  ‡aAakkula, Immo,‡d1974-\nUPD    ‡aN\n",
        ),
        (
            RecordKind::LocalBibliographic,
            "fenni.txt",
            "001    10\n245 10 ‡aKirja\n700 1  ‡aAakkula, Immo,‡d1974-\n",
        ),
    ];
    for (kind, name, content) in files {
        let path = write(dir.path(), name, content);
        commands::import::execute(pool(config), kind, &path, false).await.unwrap();
    }

    let mappings = write(dir.path(), "authority.map", "115575\t000001\n");
    commands::import::map(pool(config), ResolutionBase::Authority, &mappings)
        .await
        .unwrap();
    commands::import::reindex(pool(config)).await.unwrap();
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn run_links_and_writes_checkpoint() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    import_fixture(&dir, &config).await;

    commands::run::execute(config.clone(), RunArgs::default()).await.unwrap();

    let checkpoint = std::fs::read_to_string(&config.storage.checkpoint_file).unwrap();
    assert_eq!(checkpoint.trim(), "115575");

    let catalog = SqliteCatalog::new(pool(&config));
    let fenni = catalog
        .read_record(&RecordRef::new(RecordKind::LocalBibliographic, "10"))
        .await
        .unwrap();
    assert_eq!(
        fenni.first_field("700").unwrap().to_string(),
        "700 1  ‡aAakkula, Immo,‡d1974-‡0(FI-ASTERI-N)000001"
    );
}

#[tokio::test]
async fn dry_run_link_leaves_records_and_checkpoint() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    import_fixture(&dir, &config).await;

    commands::link::execute(config.clone(), 115575, true).await.unwrap();

    assert!(!config.storage.checkpoint_file.exists());
    let catalog = SqliteCatalog::new(pool(&config));
    let fenni = catalog
        .read_record(&RecordRef::new(RecordKind::LocalBibliographic, "10"))
        .await
        .unwrap();
    assert!(fenni.first_value("700", '0').is_none());
}

#[tokio::test]
async fn import_rejects_unparsable_file() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    let path = write(dir.path(), "broken.txt", "1\n");

    let result = commands::import::execute(pool(&config), RecordKind::LocalAuthority, &path, false).await;
    assert!(result.is_err());
}
