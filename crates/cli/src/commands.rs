//! Subcommand implementations.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use tracing::{info, warn};

use sweeper_core::{
    create_notifiers, create_torrent_client, CleanupOrchestrator, Config, ExtensionPolicy,
    NotificationDispatcher, ProcessedRecord, ProcessedStore, RunOptions, SanitizedConfig,
    SqliteProcessedStore,
};

use crate::lock::RunLock;

fn open_tracker(path: &Path) -> Result<SqliteProcessedStore> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create tracker directory {:?}", parent))?;
    }
    SqliteProcessedStore::new(path)
        .with_context(|| format!("Failed to open processed-torrent store {:?}", path))
}

/// One cleanup pass, guarded by the run lock.
pub async fn run_cleanup(config: &Config, dry_run: bool) -> Result<()> {
    let Some(lock) = RunLock::try_acquire(&config.run.lock_file)
        .with_context(|| format!("Failed to open lock file {:?}", config.run.lock_file))?
    else {
        info!(
            lock_file = ?config.run.lock_file,
            "Another cleanup run is in progress, exiting"
        );
        return Ok(());
    };

    let policy = ExtensionPolicy::from(&config.extensions);
    let overlap = policy.overlap();
    if !overlap.is_empty() {
        warn!(
            extensions = ?overlap,
            "Extensions listed as both unwanted and allowed are treated as unwanted"
        );
    }

    let tracker: Arc<dyn ProcessedStore> = Arc::new(open_tracker(&config.tracker.path)?);
    info!("Processed-torrent store: {:?}", config.tracker.path);

    let client = create_torrent_client(&config.client).context("Failed to create torrent client")?;
    info!("Using torrent client: {}", client.name());

    let notifiers =
        create_notifiers(&config.notifications).context("Failed to create notifiers")?;
    let dispatcher = NotificationDispatcher::new(&config.notifications, notifiers);

    let mut options = RunOptions::from(config);
    options.dry_run |= dry_run;

    let orchestrator = CleanupOrchestrator::new(client, tracker, dispatcher, policy, options);
    let report = orchestrator.run().await.context("Cleanup run failed")?;

    if report.failed() > 0 {
        warn!(
            failed = report.failed(),
            "Some torrents could not be processed and will be retried next run"
        );
    }

    drop(lock);
    Ok(())
}

/// Retention housekeeping without a cleanup run.
///
/// The activity log itself was already pruned when logging started.
pub fn prune(config: &Config) -> Result<()> {
    let tracker = open_tracker(&config.tracker.path)?;
    let cutoff = Utc::now() - Duration::days(i64::from(config.tracker.retention_days));
    let pruned = tracker
        .prune(cutoff)
        .context("Failed to prune processed torrents")?;

    info!(pruned, cutoff = %cutoff, "Pruned processed torrents");
    println!("Pruned {} processed records older than {}", pruned, cutoff);
    Ok(())
}

/// Print processed records, newest first.
pub fn history(config: &Config, limit: usize) -> Result<()> {
    let tracker = open_tracker(&config.tracker.path)?;
    let records = tracker
        .list(limit)
        .context("Failed to read processed torrents")?;

    if records.is_empty() {
        println!("No processed torrents");
        return Ok(());
    }

    for record in &records {
        println!("{}", format_record(record));
    }
    Ok(())
}

fn format_record(record: &ProcessedRecord) -> String {
    let mut line = format!(
        "{}  {:<17}  {:<12}  {}",
        record.timestamp.format("%Y-%m-%d %H:%M:%S"),
        record.decision.as_str(),
        record.torrent_id.as_str(),
        record.torrent_name
    );
    if record.dry_run {
        line.push_str("  [dry run]");
    }
    line
}

/// Print the effective configuration as JSON with secrets redacted.
pub fn show_config(config: &Config) -> Result<()> {
    let sanitized = SanitizedConfig::from(config);
    let json =
        serde_json::to_string_pretty(&sanitized).context("Failed to serialize configuration")?;
    println!("{}", json);
    Ok(())
}
