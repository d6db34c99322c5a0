//! Schema management and migrations

use crate::error::{SqliteError, SqliteResult};
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

/// Schema version - increment when making schema changes
const SCHEMA_VERSION: i32 = 1;

/// Apply all pending migrations
pub fn apply_migrations(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current_version = current_version(conn)?;
    debug!(current_version, target_version = SCHEMA_VERSION, "Checking migrations");

    if current_version < SCHEMA_VERSION {
        info!(from = current_version, to = SCHEMA_VERSION, "Applying schema migrations");
        apply_migration_v1(conn)?;
    }

    Ok(())
}

fn current_version(conn: &Connection) -> SqliteResult<i32> {
    let version: Option<i32> = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| row.get(0))
        .optional()?
        .flatten();
    Ok(version.unwrap_or(0))
}

fn record_migration(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("INSERT INTO schema_migrations (version) VALUES (?)", [version])?;
    Ok(())
}

/// Migration v1: catalogs, id mappings and discovery index
fn apply_migration_v1(conn: &Connection) -> SqliteResult<()> {
    debug!("Applying migration v1: catalog schema");

    conn.execute_batch(SCHEMA_V1)
        .map_err(|e| SqliteError::Schema(format!("Failed to apply v1 schema: {}", e)))?;

    record_migration(conn, 1)?;
    info!("Migration v1 applied successfully");
    Ok(())
}

const SCHEMA_V1: &str = r#"
-- ============================================================================
-- TABLE: records
-- ============================================================================
-- All four catalogs, keyed by catalog and control number. Bodies use the
-- line-oriented text form.

CREATE TABLE IF NOT EXISTS records (
    kind TEXT NOT NULL CHECK (kind IN (
        'local_authority', 'local_bibliographic', 'union_authority', 'union_bibliographic'
    )),
    id TEXT NOT NULL,
    seq INTEGER,  -- numeric id, for ordered scans
    body TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (kind, id)
);

CREATE INDEX IF NOT EXISTS idx_records_seq ON records(kind, seq);

-- ============================================================================
-- TABLE: id_map
-- ============================================================================
-- Local id to union id, per union catalog

CREATE TABLE IF NOT EXISTS id_map (
    base TEXT NOT NULL CHECK (base IN ('authority', 'bibliographic')),
    local_id TEXT NOT NULL,
    union_id TEXT NOT NULL,
    PRIMARY KEY (base, local_id, union_id)
);

-- ============================================================================
-- TABLES: discovery index
-- ============================================================================

-- Local authorities related through see-also headings, both directions
CREATE TABLE IF NOT EXISTS authority_links (
    auth_id TEXT NOT NULL,
    linked_id TEXT NOT NULL,
    PRIMARY KEY (auth_id, linked_id)
);

-- Local bibliographic records indexed under a local authority heading
CREATE TABLE IF NOT EXISTS bib_index (
    auth_id TEXT NOT NULL,
    bib_id TEXT NOT NULL,
    PRIMARY KEY (auth_id, bib_id)
);

-- Normalized personal name headings of local bibliographic records
CREATE TABLE IF NOT EXISTS headings (
    heading TEXT NOT NULL,
    bib_id TEXT NOT NULL,
    PRIMARY KEY (heading, bib_id)
);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        apply_migrations(&conn).unwrap();
        apply_migrations(&conn).unwrap();

        let applied: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(applied, 1);
    }

    #[test]
    fn creates_catalog_tables() {
        let conn = Connection::open_in_memory().unwrap();
        apply_migrations(&conn).unwrap();

        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap();
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(Result::ok)
            .collect();

        for table in ["authority_links", "bib_index", "headings", "id_map", "records"] {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }
    }
}
