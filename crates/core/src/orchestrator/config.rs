//! Per-run options.

use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Options that shape a single cleanup run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    /// Evaluate, record and notify without writing to the client.
    pub dry_run: bool,
    /// Delete downloaded data when removing a torrent.
    pub delete_data: bool,
    /// Leave torrents without files alone instead of removing them.
    pub skip_zero_file_torrents: bool,
    /// Tracker records older than this are pruned when the run starts.
    pub tracker_retention_days: u32,
    /// Re-evaluate SkippedNoAction records made under a different policy.
    pub revisit_skipped_on_policy_change: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            delete_data: true,
            skip_zero_file_torrents: true,
            tracker_retention_days: 30,
            revisit_skipped_on_policy_change: true,
        }
    }
}

impl From<&Config> for RunOptions {
    fn from(config: &Config) -> Self {
        Self {
            dry_run: config.run.dry_run,
            delete_data: config.run.delete_data,
            skip_zero_file_torrents: config.run.skip_zero_file_torrents,
            tracker_retention_days: config.tracker.retention_days,
            revisit_skipped_on_policy_change: config.tracker.revisit_skipped_on_policy_change,
        }
    }
}
