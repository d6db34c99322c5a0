//! Configuration for authlink
//!
//! Settings come from a TOML file with one table per component, then
//! `AUTHLINK_*` environment variables override individual values:
//!
//! ```toml
//! [scan]
//! skip_on_error = true
//! backoff_seconds = 2
//!
//! [dispatch]
//! union_window = 10
//!
//! [storage]
//! database = "./authlink.db"
//! checkpoint_file = "./authlink-checkpoint.txt"
//! ```

pub mod components;
pub mod error;
pub mod loader;

pub use components::{DiscoveryConfig, DispatchConfig, LoggingConfig, ScanConfig, StorageConfig};
pub use error::{ConfigError, Result};
pub use loader::{AuthlinkConfig, LOCAL_CONFIG_FILE};
