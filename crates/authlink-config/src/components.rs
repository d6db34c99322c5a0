//! Component configuration
//!
//! One struct per concern. Every field has a default so partial files are
//! valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Id scan settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Stop after this many processed authority ids
    pub limit: Option<u64>,
    /// Advance the checkpoint past an id that caused a system error
    pub skip_on_error: bool,
    /// Seconds to wait before restarting after a system error
    pub backoff_seconds: u64,
    /// Restart cap; unset retries forever
    pub max_restarts: Option<u32>,
    /// Authority ids fetched per index query
    pub page_size: usize,
    /// Compute changes without saving
    pub dry_run: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            limit: None,
            skip_on_error: false,
            backoff_seconds: 2,
            max_restarts: None,
            page_size: 1000,
            dry_run: false,
        }
    }
}

/// Task dispatch settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Concurrent union bibliographic saves
    pub union_window: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self { union_window: 10 }
    }
}

/// Linkage discovery settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub fix_authority_years: bool,
    /// Concurrent union bibliographic id resolutions
    pub resolve_chunk_size: usize,
    pub fuzzy_headings: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            fix_authority_years: true,
            resolve_chunk_size: 20,
            fuzzy_headings: true,
        }
    }
}

/// File locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite catalog database
    pub database: PathBuf,
    /// Scan position file
    pub checkpoint_file: PathBuf,
    /// Optional file of ids to restrict the scan to
    pub allow_list_file: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("./authlink.db"),
            checkpoint_file: PathBuf::from("./authlink-checkpoint.txt"),
            allow_list_file: None,
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `error`, `warn`, `info`, `debug` or `trace`
    pub level: String,
    /// `full` or `compact`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "full".to_string(),
        }
    }
}

impl LoggingConfig {
    pub const LEVELS: [&'static str; 5] = ["error", "warn", "info", "debug", "trace"];
    pub const FORMATS: [&'static str; 2] = ["full", "compact"];
}
