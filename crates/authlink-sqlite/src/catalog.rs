//! Record store, catalog index and id resolver over one database
//!
//! The discovery tables are populated by [`crate::import`]; this module only
//! reads them.

use crate::connection::SqlitePool;
use crate::error::SqliteResult;
use async_trait::async_trait;
use authlink_core::{
    CatalogIndex, IdResolver, Record, RecordKind, RecordRef, ResolutionBase, ResolveError,
    ResolveResult, RecordStore, StoreError, StoreResult,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeSet;
use tracing::debug;

/// Column value for a catalog
pub(crate) fn kind_key(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::LocalAuthority => "local_authority",
        RecordKind::LocalBibliographic => "local_bibliographic",
        RecordKind::UnionAuthority => "union_authority",
        RecordKind::UnionBibliographic => "union_bibliographic",
    }
}

pub(crate) fn base_key(base: ResolutionBase) -> &'static str {
    match base {
        ResolutionBase::Authority => "authority",
        ResolutionBase::Bibliographic => "bibliographic",
    }
}

fn query_ids<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> SqliteResult<Vec<String>> {
    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map(params, |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

/// SQLite implementation of the catalog collaborators
#[derive(Clone)]
pub struct SqliteCatalog {
    pool: SqlitePool,
}

impl SqliteCatalog {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Number of records in one catalog
    pub async fn count(&self, kind: RecordKind) -> SqliteResult<u64> {
        self.pool
            .run(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM records WHERE kind = ?1",
                    [kind_key(kind)],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
    }
}

#[async_trait]
impl RecordStore for SqliteCatalog {
    async fn read_record(&self, record: &RecordRef) -> StoreResult<Record> {
        let key = record.clone();
        let body = self
            .pool
            .run(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT body FROM records WHERE kind = ?1 AND id = ?2",
                        params![kind_key(key.kind), key.id],
                        |row| row.get::<_, String>(0),
                    )
                    .optional()?)
            })
            .await?;

        let body = body.ok_or_else(|| StoreError::NotFound(record.clone()))?;
        body.parse().map_err(|e: authlink_core::RecordParseError| StoreError::Malformed {
            record: record.clone(),
            reason: e.to_string(),
        })
    }

    async fn save_record(&self, record: &RecordRef, content: &Record) -> StoreResult<()> {
        let key = record.clone();
        let body = content.to_string();
        let updated = self
            .pool
            .run(move |conn| {
                Ok(conn.execute(
                    "UPDATE records SET body = ?1, updated_at = datetime('now') WHERE kind = ?2 AND id = ?3",
                    params![body, kind_key(key.kind), key.id],
                )?)
            })
            .await?;

        if updated == 0 {
            return Err(StoreError::Rejected {
                record: record.clone(),
                reason: "no such record".to_string(),
            });
        }
        debug!(record = %record, "Saved record");
        Ok(())
    }
}

#[async_trait]
impl CatalogIndex for SqliteCatalog {
    async fn last_authority_id(&self) -> StoreResult<u64> {
        let last = self
            .pool
            .run(|conn| {
                let last: Option<i64> = conn.query_row(
                    "SELECT MAX(seq) FROM records WHERE kind = 'local_authority'",
                    [],
                    |row| row.get(0),
                )?;
                Ok(last.unwrap_or(0) as u64)
            })
            .await?;
        Ok(last)
    }

    async fn authority_ids_after(&self, after: u64, limit: usize) -> StoreResult<Vec<u64>> {
        let ids = self
            .pool
            .run(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT seq FROM records
                     WHERE kind = 'local_authority' AND seq > ?1
                     ORDER BY seq LIMIT ?2",
                )?;
                let ids = stmt
                    .query_map(params![after as i64, limit as i64], |row| row.get::<_, i64>(0))?
                    .map(|id| id.map(|id| id as u64))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ids)
            })
            .await?;
        Ok(ids)
    }

    async fn linked_authority_ids(&self, auth_id: &str) -> StoreResult<Vec<String>> {
        let auth_id = auth_id.to_string();
        Ok(self
            .pool
            .run(move |conn| {
                query_ids(
                    conn,
                    "SELECT linked_id FROM authority_links WHERE auth_id = ?1 ORDER BY linked_id",
                    [auth_id],
                )
            })
            .await?)
    }

    async fn indexed_bib_ids(&self, auth_id: &str) -> StoreResult<Vec<String>> {
        let auth_id = auth_id.to_string();
        Ok(self
            .pool
            .run(move |conn| {
                query_ids(
                    conn,
                    "SELECT bib_id FROM bib_index WHERE auth_id = ?1 ORDER BY bib_id",
                    [auth_id],
                )
            })
            .await?)
    }

    async fn heading_bib_ids(&self, heading: &str) -> StoreResult<Vec<String>> {
        let heading = heading.to_string();
        Ok(self
            .pool
            .run(move |conn| {
                query_ids(
                    conn,
                    "SELECT bib_id FROM headings WHERE heading = ?1 ORDER BY bib_id",
                    [heading],
                )
            })
            .await?)
    }
}

#[async_trait]
impl IdResolver for SqliteCatalog {
    /// Candidates are the mapped union ids plus every hint naming an
    /// existing union record; exactly one distinct candidate resolves.
    async fn resolve(&self, local_id: &str, base: ResolutionBase, hints: &[String]) -> ResolveResult<String> {
        let local = local_id.to_string();
        let hints = hints.to_vec();
        let candidates = self
            .pool
            .run(move |conn| {
                let mut candidates: BTreeSet<String> = query_ids(
                    conn,
                    "SELECT union_id FROM id_map WHERE base = ?1 AND local_id = ?2",
                    params![base_key(base), local],
                )?
                .into_iter()
                .collect();

                for hint in hints {
                    let exists = conn
                        .query_row(
                            "SELECT 1 FROM records WHERE kind = ?1 AND id = ?2",
                            params![kind_key(base.target_kind()), hint],
                            |_| Ok(()),
                        )
                        .optional()?
                        .is_some();
                    if exists {
                        candidates.insert(hint);
                    }
                }
                Ok(candidates)
            })
            .await?;

        let mut candidates = candidates.into_iter();
        match (candidates.next(), candidates.next()) {
            (Some(id), None) => Ok(id),
            (None, _) => Err(ResolveError::NoMatch {
                local_id: local_id.to_string(),
            }),
            (Some(first), Some(second)) => {
                let mut all = vec![first, second];
                all.extend(candidates);
                Err(ResolveError::Ambiguous {
                    local_id: local_id.to_string(),
                    candidates: all,
                })
            }
        }
    }
}
