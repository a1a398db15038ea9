mod commands;
mod lock;
mod logging;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::error;

use sweeper_core::{load_config, validate_config, Config};

#[derive(Parser)]
#[command(
    name = "sweeper",
    version,
    about = "Unselects unwanted files in Transmission torrents and removes torrents with nothing left worth downloading"
)]
struct Cli {
    /// Configuration file
    #[arg(
        long,
        short,
        global = true,
        env = "SWEEPER_CONFIG",
        default_value = "config.toml"
    )]
    config: PathBuf,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run one cleanup pass (default)
    Run {
        /// Decide, record and notify without changing the client
        #[arg(long)]
        dry_run: bool,
    },
    /// Drop processed records and activity log lines past their retention
    Prune,
    /// Show processed torrents, newest first
    History {
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Print the effective configuration with secrets redacted
    Config,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let config = match load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            logging::init_console();
            error!("Fatal error: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = logging::init(&config.logging) {
        logging::init_console();
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(cli.command, config).await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn load(path: &Path) -> Result<Config> {
    let config =
        load_config(path).with_context(|| format!("Failed to load config from {:?}", path))?;
    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}

async fn run(command: Option<Command>, config: Config) -> Result<()> {
    match command.unwrap_or(Command::Run { dry_run: false }) {
        Command::Run { dry_run } => commands::run_cleanup(&config, dry_run).await,
        Command::Prune => commands::prune(&config),
        Command::History { limit } => commands::history(&config, limit),
        Command::Config => commands::show_config(&config),
    }
}
