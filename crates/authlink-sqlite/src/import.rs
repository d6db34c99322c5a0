//! Catalog import and discovery index construction
//!
//! Records are loaded from the text form, one record per blank-line
//! separated block. After loading, [`CatalogImporter::rebuild_index`]
//! derives the discovery tables from the local catalogs:
//!
//! - `headings`: every personal name field of a local bibliographic record
//!   under its name, name + birth and name + birth + death keys
//! - `bib_index`: local bibliographic records whose name field carries the
//!   full heading of a local authority
//! - `authority_links`: local authorities whose see-also heading equals
//!   another authority's heading, recorded in both directions

use crate::catalog::{base_key, kind_key};
use crate::connection::SqlitePool;
use crate::error::{SqliteError, SqliteResult};
use authlink_core::permutations::years_from_date_subfield;
use authlink_core::{normalize, Field, Record, RecordKind, RecordParseError, ResolutionBase};
use rusqlite::{params, Connection};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

const AGENT_TAGS: [&str; 3] = ["100", "110", "111"];
const SEE_ALSO_TAGS: [&str; 3] = ["500", "510", "511"];
const BIB_NAME_TAGS: [&str; 3] = ["100", "600", "700"];

/// Split text into records at blank lines
pub fn parse_records(text: &str) -> Result<Vec<Record>, RecordParseError> {
    let mut records = Vec::new();
    let mut block = Vec::new();

    for line in text.lines().chain(std::iter::once("")) {
        if line.trim().is_empty() {
            if !block.is_empty() {
                records.push(block.join("\n").parse()?);
                block.clear();
            }
        } else {
            block.push(line);
        }
    }
    Ok(records)
}

/// Parse `local<TAB>union` lines; `#` starts a comment
pub fn parse_mappings(text: &str) -> Result<Vec<(String, String)>, String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(|line| {
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next(), parts.next()) {
                (Some(local), Some(union), None) => Ok((local.to_string(), union.to_string())),
                _ => Err(format!("expected two columns: '{}'", line)),
            }
        })
        .collect()
}

/// Lookup keys of a name field, least specific first
pub fn heading_keys(field: &Field) -> Vec<String> {
    let Some(name) = field.first('a').map(normalize).filter(|n| !n.is_empty()) else {
        return Vec::new();
    };

    let mut keys = vec![name.clone()];
    if let Some(date) = field.first('d') {
        let (birth, death) = years_from_date_subfield(date);
        if let Some(birth) = birth.map(|b| normalize(&b)).filter(|b| !b.is_empty()) {
            let with_birth = format!("{} {}", name, birth);
            keys.push(with_birth.clone());
            if let Some(death) = death.map(|d| normalize(&d)).filter(|d| !d.is_empty()) {
                keys.push(format!("{} {}", with_birth, death));
            }
        }
    }
    keys
}

fn full_heading(field: &Field) -> Option<String> {
    heading_keys(field).pop()
}

/// Counts from an index rebuild
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub headings: usize,
    pub indexed: usize,
    pub authority_links: usize,
}

/// Writes records, mappings and the derived index
#[derive(Clone)]
pub struct CatalogImporter {
    pool: SqlitePool,
}

impl CatalogImporter {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace records, keyed by their control number
    pub async fn import_records(&self, kind: RecordKind, records: Vec<Record>) -> SqliteResult<usize> {
        let count = self
            .pool
            .run_mut(move |conn| {
                let tx = conn.transaction()?;
                for record in &records {
                    let id = record
                        .control_number()
                        .ok_or_else(|| SqliteError::InvalidRecord(format!("no 001 in:\n{}", record)))?;
                    let seq = id.parse::<i64>().ok();
                    tx.execute(
                        "INSERT INTO records (kind, id, seq, body) VALUES (?1, ?2, ?3, ?4)
                         ON CONFLICT(kind, id) DO UPDATE SET
                             body = excluded.body,
                             seq = excluded.seq,
                             updated_at = datetime('now')",
                        params![kind_key(kind), id, seq, record.to_string()],
                    )?;
                }
                tx.commit()?;
                Ok(records.len())
            })
            .await?;

        info!(catalog = %kind, count, "Imported records");
        Ok(count)
    }

    pub async fn add_mapping(&self, base: ResolutionBase, local_id: &str, union_id: &str) -> SqliteResult<()> {
        self.import_mappings(base, vec![(local_id.to_string(), union_id.to_string())])
            .await
            .map(|_| ())
    }

    pub async fn import_mappings(&self, base: ResolutionBase, pairs: Vec<(String, String)>) -> SqliteResult<usize> {
        self.pool
            .run_mut(move |conn| {
                let tx = conn.transaction()?;
                for (local, union) in &pairs {
                    tx.execute(
                        "INSERT OR IGNORE INTO id_map (base, local_id, union_id) VALUES (?1, ?2, ?3)",
                        params![base_key(base), local, union],
                    )?;
                }
                tx.commit()?;
                Ok(pairs.len())
            })
            .await
    }

    /// Replace the discovery tables with ones derived from the local catalogs
    pub async fn rebuild_index(&self) -> SqliteResult<IndexStats> {
        let stats = self.pool.run_mut(rebuild).await?;
        info!(
            headings = stats.headings,
            indexed = stats.indexed,
            authority_links = stats.authority_links,
            "Rebuilt discovery index"
        );
        Ok(stats)
    }
}

fn load_catalog(conn: &Connection, kind: RecordKind) -> SqliteResult<Vec<(String, Record)>> {
    let mut stmt = conn.prepare("SELECT id, body FROM records WHERE kind = ?1 ORDER BY id")?;
    let rows = stmt
        .query_map([kind_key(kind)], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(id, body)| {
            let record = body
                .parse()
                .map_err(|e: RecordParseError| SqliteError::InvalidRecord(format!("{} {}: {}", kind, id, e)))?;
            Ok((id, record))
        })
        .collect()
}

fn rebuild(conn: &mut Connection) -> SqliteResult<IndexStats> {
    let authorities = load_catalog(conn, RecordKind::LocalAuthority)?;
    let bibs = load_catalog(conn, RecordKind::LocalBibliographic)?;

    let mut by_heading: HashMap<String, Vec<String>> = HashMap::new();
    for (id, record) in &authorities {
        for field in AGENT_TAGS.iter().copied().flat_map(|tag| record.fields_with_tag(tag)) {
            if let Some(heading) = full_heading(field) {
                by_heading.entry(heading).or_default().push(id.clone());
            }
        }
    }

    let mut links = BTreeSet::new();
    for (id, record) in &authorities {
        for field in SEE_ALSO_TAGS.iter().copied().flat_map(|tag| record.fields_with_tag(tag)) {
            let Some(heading) = full_heading(field) else { continue };
            for other in by_heading.get(&heading).into_iter().flatten() {
                if other != id {
                    links.insert((other.clone(), id.clone()));
                    links.insert((id.clone(), other.clone()));
                }
            }
        }
    }

    let mut headings = BTreeSet::new();
    let mut indexed = BTreeSet::new();
    for (bib_id, record) in &bibs {
        for field in BIB_NAME_TAGS.iter().copied().flat_map(|tag| record.fields_with_tag(tag)) {
            let keys = heading_keys(field);
            if let Some(full) = keys.last() {
                for auth_id in by_heading.get(full).into_iter().flatten() {
                    indexed.insert((auth_id.clone(), bib_id.clone()));
                }
            }
            for key in keys {
                headings.insert((key, bib_id.clone()));
            }
        }
    }

    let tx = conn.transaction()?;
    tx.execute_batch("DELETE FROM headings; DELETE FROM bib_index; DELETE FROM authority_links;")?;
    for (heading, bib_id) in &headings {
        tx.execute(
            "INSERT INTO headings (heading, bib_id) VALUES (?1, ?2)",
            params![heading, bib_id],
        )?;
    }
    for (auth_id, bib_id) in &indexed {
        tx.execute(
            "INSERT INTO bib_index (auth_id, bib_id) VALUES (?1, ?2)",
            params![auth_id, bib_id],
        )?;
    }
    for (auth_id, linked_id) in &links {
        tx.execute(
            "INSERT INTO authority_links (auth_id, linked_id) VALUES (?1, ?2)",
            params![auth_id, linked_id],
        )?;
    }
    tx.commit()?;

    debug!(authorities = authorities.len(), bibs = bibs.len(), "Index derived");
    Ok(IndexStats {
        headings: headings.len(),
        indexed: indexed.len(),
        authority_links: links.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_records_at_blank_lines() {
        let records = parse_records("001    1\n100 1  ‡aA\n\n\n001    2\n100 1  ‡aB\n").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].control_number(), Some("2"));
    }

    #[test]
    fn mapping_lines_need_two_columns() {
        assert_eq!(
            parse_mappings("# local union\n10\t900\n\n11 901\n").unwrap(),
            vec![("10".to_string(), "900".to_string()), ("11".to_string(), "901".to_string())]
        );
        assert!(parse_mappings("10\n").is_err());
    }

    #[test]
    fn heading_keys_grow_with_years() {
        let field: Field = "700 1  ‡aAakkula, Immo,‡d1974-2020.".parse().unwrap();
        assert_eq!(
            heading_keys(&field),
            vec!["AAKKULA IMMO", "AAKKULA IMMO 1974", "AAKKULA IMMO 1974 2020"]
        );
    }

    #[test]
    fn heading_keys_without_name_are_empty() {
        let field: Field = "700 1  ‡d1974-".parse().unwrap();
        assert!(heading_keys(&field).is_empty());
    }
}
