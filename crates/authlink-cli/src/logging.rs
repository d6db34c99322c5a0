//! Tracing subscriber setup

use crate::cli::LogLevel;
use anyhow::{anyhow, Result};
use authlink_config::LoggingConfig;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Pick the filter: `--log-level`, then `--verbose`, then `RUST_LOG`, then config
pub fn filter(level: Option<LogLevel>, verbose: bool, config: &LoggingConfig) -> EnvFilter {
    match (level, verbose) {
        (Some(level), _) => EnvFilter::new(LevelFilter::from(level).to_string()),
        (None, true) => EnvFilter::new("debug"),
        (None, false) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level)),
    }
}

/// Install the global subscriber; logs go to stderr so command output stays clean
pub fn init(level: Option<LogLevel>, verbose: bool, config: &LoggingConfig) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter(level, verbose, config))
        .with_writer(std::io::stderr);

    let installed = if config.format == "compact" {
        builder.compact().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}
