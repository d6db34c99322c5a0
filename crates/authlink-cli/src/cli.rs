use authlink_config::AuthlinkConfig;
use authlink_core::{RecordKind, ResolutionBase};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    Info,
    /// Debug messages
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

#[derive(Parser)]
#[command(name = "authlink")]
#[command(about = "authlink - Link authority headings across local and union catalogs")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set log level; overrides RUST_LOG and the config file
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (defaults to ./authlink.toml, then the user config dir)
    #[arg(short = 'C', long, global = true, env = "AUTHLINK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Catalog database (overrides config file)
    #[arg(long, global = true, env = "AUTHLINK_DATABASE")]
    pub db: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan local authority ids from the checkpoint onwards
    Run(RunArgs),

    /// Process a single authority id without touching the checkpoint
    Link {
        /// Local authority id
        id: u64,

        /// Compute changes without saving
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the normalized form of a heading
    Normalize {
        /// Heading text; multiple words are joined with spaces
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Print the query terms generated for authority records
    Permutations {
        /// File of records in text form, separated by blank lines
        file: PathBuf,
    },

    /// Load records into one catalog
    Import {
        #[arg(value_enum)]
        catalog: CatalogArg,

        /// File of records in text form, separated by blank lines
        file: PathBuf,

        /// Rebuild the discovery index afterwards
        #[arg(long)]
        reindex: bool,
    },

    /// Load local-to-union id mappings
    Map {
        #[arg(value_enum)]
        base: BaseArg,

        /// Two whitespace separated columns: local id, union id
        file: PathBuf,
    },

    /// Rebuild the discovery index from the local catalogs
    Reindex,

    /// Print the effective configuration
    Config,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Stop after this many processed ids
    #[arg(long)]
    pub limit: Option<u64>,

    /// Advance past an id that keeps failing
    #[arg(long)]
    pub skip_on_error: bool,

    /// Compute changes without saving
    #[arg(long)]
    pub dry_run: bool,

    /// Restrict the scan to the ids listed in this file
    #[arg(long)]
    pub allow_list: Option<PathBuf>,

    /// Checkpoint file (overrides config file)
    #[arg(long)]
    pub checkpoint: Option<PathBuf>,

    /// Give up after this many restarts
    #[arg(long)]
    pub max_restarts: Option<u32>,
}

impl RunArgs {
    /// Layer the flags over the loaded configuration
    pub fn apply(&self, config: &mut AuthlinkConfig) {
        if let Some(limit) = self.limit {
            config.scan.limit = Some(limit);
        }
        if self.skip_on_error {
            config.scan.skip_on_error = true;
        }
        if self.dry_run {
            config.scan.dry_run = true;
        }
        if let Some(path) = &self.allow_list {
            config.storage.allow_list_file = Some(path.clone());
        }
        if let Some(path) = &self.checkpoint {
            config.storage.checkpoint_file = path.clone();
        }
        if let Some(max) = self.max_restarts {
            config.scan.max_restarts = Some(max);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CatalogArg {
    /// Local authority catalog (FENAU)
    LocalAuthority,
    /// Local bibliographic catalog (FENNI)
    LocalBibliographic,
    /// Union authority catalog (ASTERI)
    UnionAuthority,
    /// Union bibliographic catalog (MELINDA)
    UnionBibliographic,
}

impl From<CatalogArg> for RecordKind {
    fn from(arg: CatalogArg) -> Self {
        match arg {
            CatalogArg::LocalAuthority => RecordKind::LocalAuthority,
            CatalogArg::LocalBibliographic => RecordKind::LocalBibliographic,
            CatalogArg::UnionAuthority => RecordKind::UnionAuthority,
            CatalogArg::UnionBibliographic => RecordKind::UnionBibliographic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BaseArg {
    Authority,
    Bibliographic,
}

impl From<BaseArg> for ResolutionBase {
    fn from(arg: BaseArg) -> Self {
        match arg {
            BaseArg::Authority => ResolutionBase::Authority,
            BaseArg::Bibliographic => ResolutionBase::Bibliographic,
        }
    }
}
