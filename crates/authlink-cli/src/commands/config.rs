use anyhow::{Context, Result};
use authlink_config::AuthlinkConfig;

pub fn execute(config: &AuthlinkConfig) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("Failed to render configuration")?;
    print!("{}", rendered);
    Ok(())
}
