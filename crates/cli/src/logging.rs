//! Tracing setup: console output plus the optional activity log file.

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sweeper_core::activity_log::{open_log_file, prune_log_file};
use sweeper_core::config::LoggingConfig;

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Console-only logging, used when the configuration could not be loaded.
pub fn init_console() {
    let _ = tracing_subscriber::registry()
        .with(env_filter("info"))
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Initialize logging from configuration.
///
/// The activity log is pruned to its retention window before it is attached.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let (file_layer, pruned) = match &config.file {
        Some(path) => {
            let pruned = prune(path, config.retention_days);
            let file = open_log_file(path)
                .with_context(|| format!("Failed to open activity log {:?}", path))?;
            let layer = fmt::layer().with_ansi(false).with_writer(Mutex::new(file));
            (Some(layer), pruned)
        }
        None => (None, Ok(0)),
    };

    tracing_subscriber::registry()
        .with(env_filter(&config.level))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    match pruned {
        Ok(0) => {}
        Ok(dropped) => info!(dropped, "Pruned old activity log entries"),
        Err(e) => warn!(error = %e, "Failed to prune activity log"),
    }
    Ok(())
}

fn prune(path: &Path, retention_days: u32) -> std::io::Result<usize> {
    let cutoff = Utc::now() - Duration::days(i64::from(retention_days));
    prune_log_file(path, cutoff)
}
