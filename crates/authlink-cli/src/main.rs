use anyhow::{Context, Result};
use authlink_cli::cli::{Cli, Commands};
use authlink_cli::{commands, logging, settings};
use authlink_config::AuthlinkConfig;
use clap::Parser;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AuthlinkConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(db) = cli.db {
        config.storage.database = db;
    }

    logging::init(cli.log_level, cli.verbose, &config.logging)?;
    debug!(database = %config.storage.database.display(), "Configuration loaded");

    match cli.command {
        Commands::Run(args) => commands::run::execute(config, args).await?,

        Commands::Link { id, dry_run } => commands::link::execute(config, id, dry_run).await?,

        Commands::Normalize { text } => commands::normalize::execute(&text)?,

        Commands::Permutations { file } => commands::permutations::execute(&file)?,

        Commands::Import {
            catalog,
            file,
            reindex,
        } => commands::import::execute(settings::open_pool(&config)?, catalog.into(), &file, reindex).await?,

        Commands::Map { base, file } => {
            commands::import::map(settings::open_pool(&config)?, base.into(), &file).await?
        }

        Commands::Reindex => commands::import::reindex(settings::open_pool(&config)?).await?,

        Commands::Config => commands::config::execute(&config)?,
    }

    Ok(())
}
