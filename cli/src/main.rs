//! MEAM First-Login CLI
//!
//! Generates first-login codes into the published store and checks them.
//!
//! # Usage
//!
//! ```bash
//! meam-firstlogin generate --level 3 --aud "2a1cae831a8b85fb..."
//! meam-firstlogin generate --level 2 --aud "edc14b0fbb1c6364..." --dry-run
//! meam-firstlogin verify --level 3 --aud "2a1cae831a8b85fb..."
//! meam-firstlogin list --format json
//! meam-firstlogin tiers
//! ```

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod output;

#[derive(Parser)]
#[command(name = "meam-firstlogin")]
#[command(author = "MEAM")]
#[command(version)]
#[command(about = "Generate and verify MEAM first-login codes", long_about = None)]
struct Cli {
    /// Output format
    #[arg(long, short, global = true)]
    format: Option<output::OutputFormat>,

    /// Profile name from config file
    #[arg(long, short, global = true)]
    profile: Option<String>,

    /// Log filter, overrides RUST_LOG (e.g. "debug")
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Shortest audience id accepted
    #[arg(long, global = true, env = "MEAM_MIN_AUDIENCE_LEN")]
    min_audience_len: Option<usize>,

    /// Keystream start position within the audience id
    #[arg(long, global = true, env = "MEAM_AUDIENCE_OFFSET")]
    audience_offset: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a first-login code and merge it into the store
    Generate {
        /// Access tier: 1=BASIC (levels 6-8), 2=RESTRICTED (levels 3-5), 3=FULL (levels 0-2)
        #[arg(long)]
        level: u8,
        /// Audience id of the target application
        #[arg(long)]
        aud: String,
        /// Store file (default: somenumbers.json)
        #[arg(long, short, env = "MEAM_STORE_PATH")]
        output: Option<PathBuf>,
        /// Generate only; do not read or write the store
        #[arg(long)]
        dry_run: bool,
    },
    /// Decode a stored code and check its payload
    Verify {
        /// Access tier the code was generated for
        #[arg(long)]
        level: u8,
        /// Audience id the code was generated for
        #[arg(long)]
        aud: String,
        /// Store file (default: somenumbers.json)
        #[arg(long, short, env = "MEAM_STORE_PATH")]
        store: Option<PathBuf>,
    },
    /// List first-login entries in a store
    List {
        /// Store file (default: somenumbers.json)
        #[arg(long, short, env = "MEAM_STORE_PATH")]
        store: Option<PathBuf>,
    },
    /// Show the tier table
    Tiers,
    /// Configure CLI
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Set configuration value
    Set { key: String, value: String },
    /// Get configuration value
    Get { key: String },
    /// List all configuration
    List,
    /// Initialize configuration
    Init,
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let profile = cli.profile.as_deref();
    let context = || -> anyhow::Result<commands::Context> {
        let config = config::Config::load(profile)?;
        let policy = config.codec_policy(cli.min_audience_len, cli.audience_offset);
        commands::Context::new(policy, cli.format.or(config.default_format), config.store_path)
    };

    match cli.command {
        Commands::Generate {
            level,
            aud,
            output,
            dry_run,
        } => commands::generate::handle(&context()?, level, aud, output, dry_run),
        Commands::Verify { level, aud, store } => {
            commands::verify::handle(&context()?, level, &aud, store)
        }
        Commands::List { store } => commands::list::handle(&context()?, store),
        Commands::Tiers => commands::tiers::handle(&context()?),
        Commands::Config { action } => commands::config::handle(action, profile),
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    tracing::debug!("meam-firstlogin v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
