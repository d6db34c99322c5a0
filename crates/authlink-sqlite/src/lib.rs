//! SQLite catalog backend for authlink
//!
//! Stores all four catalogs, the local-to-union id mappings and the
//! discovery index in one database, and implements the core collaborator
//! traits over it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use authlink_sqlite::{CatalogImporter, SqliteCatalog, SqliteConfig, SqlitePool};
//!
//! let pool = SqlitePool::new(SqliteConfig::new("./authlink.db"))?;
//! CatalogImporter::new(pool.clone()).rebuild_index().await?;
//!
//! let catalog = Arc::new(SqliteCatalog::new(pool));
//! let pipeline = LinkagePipeline::new(catalog.clone(), catalog.clone(), catalog, Arc::new(NameRules));
//! ```

pub mod catalog;
pub mod config;
pub mod connection;
pub mod error;
pub mod import;
pub mod schema;

pub use catalog::SqliteCatalog;
pub use config::SqliteConfig;
pub use connection::SqlitePool;
pub use error::{SqliteError, SqliteResult};
pub use import::{heading_keys, parse_mappings, parse_records, CatalogImporter, IndexStats};
