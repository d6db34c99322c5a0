//! Config file discovery, parsing and environment overrides

use crate::components::{DiscoveryConfig, DispatchConfig, LoggingConfig, ScanConfig, StorageConfig};
use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "authlink.toml";

/// Complete runtime configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthlinkConfig {
    pub scan: ScanConfig,
    pub dispatch: DispatchConfig,
    pub discovery: DiscoveryConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl AuthlinkConfig {
    /// Load configuration and apply `AUTHLINK_*` overrides.
    ///
    /// An explicit path must exist. Without one, `./authlink.toml` and then
    /// `<config dir>/authlink/authlink.toml` are tried; if neither exists the
    /// defaults are used.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path.to_path_buf()));
                }
                Self::from_file(path)?
            }
            None => match Self::default_locations().into_iter().find(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Candidate locations in lookup order
    pub fn default_locations() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("authlink").join(LOCAL_CONFIG_FILE));
        }
        paths
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { message, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            message: e.to_string(),
        })
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("AUTHLINK_LIMIT") {
            self.scan.limit = Some(parse("AUTHLINK_LIMIT", &value)?);
        }
        if let Some(value) = lookup("AUTHLINK_SKIP_ON_ERROR") {
            self.scan.skip_on_error = parse_flag("AUTHLINK_SKIP_ON_ERROR", &value)?;
        }
        if let Some(value) = lookup("AUTHLINK_BACKOFF_SECONDS") {
            self.scan.backoff_seconds = parse("AUTHLINK_BACKOFF_SECONDS", &value)?;
        }
        if let Some(value) = lookup("AUTHLINK_MAX_RESTARTS") {
            self.scan.max_restarts = Some(parse("AUTHLINK_MAX_RESTARTS", &value)?);
        }
        if let Some(value) = lookup("AUTHLINK_DRY_RUN") {
            self.scan.dry_run = parse_flag("AUTHLINK_DRY_RUN", &value)?;
        }
        if let Some(value) = lookup("AUTHLINK_UNION_WINDOW") {
            self.dispatch.union_window = parse("AUTHLINK_UNION_WINDOW", &value)?;
        }
        if let Some(value) = lookup("AUTHLINK_DATABASE") {
            self.storage.database = PathBuf::from(value);
        }
        if let Some(value) = lookup("AUTHLINK_CHECKPOINT_FILE") {
            self.storage.checkpoint_file = PathBuf::from(value);
        }
        if let Some(value) = lookup("AUTHLINK_ALLOW_LIST") {
            self.storage.allow_list_file = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup("AUTHLINK_LOG_LEVEL") {
            self.logging.level = value.to_lowercase();
        }
        Ok(())
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.dispatch.union_window == 0 {
            return Err(ConfigError::invalid("dispatch.union_window", "0"));
        }
        if self.discovery.resolve_chunk_size == 0 {
            return Err(ConfigError::invalid("discovery.resolve_chunk_size", "0"));
        }
        if self.scan.page_size == 0 {
            return Err(ConfigError::invalid("scan.page_size", "0"));
        }
        if !LoggingConfig::LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::invalid("logging.level", self.logging.level.clone()));
        }
        if !LoggingConfig::FORMATS.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::invalid("logging.format", self.logging.format.clone()));
        }
        Ok(())
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid(key, value))
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(key, value)),
    }
}
