//! Types for the cleanup orchestrator.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::torrent_client::TorrentId;
use crate::tracker::Decision;

/// Errors that abort a whole run.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The torrent list could not be fetched; nothing was changed.
    #[error("failed to fetch torrents: {0}")]
    Fetch(#[from] crate::torrent_client::TorrentClientError),

    /// The processed-set store is unusable.
    #[error("tracker error: {0}")]
    Tracker(#[from] crate::tracker::TrackerError),
}

/// Per-torrent step that can fail without aborting the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStep {
    /// Looking the torrent up in the tracker.
    Check,
    /// Unselecting files or removing the torrent.
    Apply,
    /// Writing the processed record.
    Record,
}

impl fmt::Display for RunStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStep::Check => "check",
            RunStep::Apply => "apply",
            RunStep::Record => "record",
        };
        f.write_str(s)
    }
}

/// What happened to one torrent during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TorrentOutcome {
    /// A terminal record already exists; nothing was done.
    AlreadyProcessed,
    /// The client reported no files yet; left for a later run.
    NoFiles,
    /// A decision was applied and recorded.
    Decided { decision: Decision },
    /// Processing stopped at `step`; the torrent is retried next run.
    Failed { step: RunStep, error: String },
}

/// Outcome for one torrent, with its identity for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TorrentReport {
    pub torrent_id: TorrentId,
    pub torrent_name: String,
    #[serde(flatten)]
    pub outcome: TorrentOutcome,
}

/// Result of one cleanup run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    /// Tracker records dropped by retention at the start of the run.
    pub pruned_records: usize,
    pub torrents: Vec<TorrentReport>,
}

impl RunReport {
    pub(crate) fn new(dry_run: bool) -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            dry_run,
            pruned_records: 0,
            torrents: Vec::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.torrents.len()
    }

    /// Number of torrents that reached `decision` in this run.
    pub fn decided(&self, decision: Decision) -> usize {
        self.torrents
            .iter()
            .filter(|t| t.outcome == TorrentOutcome::Decided { decision })
            .count()
    }

    pub fn already_processed(&self) -> usize {
        self.count_matching(|o| matches!(o, TorrentOutcome::AlreadyProcessed))
    }

    pub fn no_files(&self) -> usize {
        self.count_matching(|o| matches!(o, TorrentOutcome::NoFiles))
    }

    pub fn failed(&self) -> usize {
        self.count_matching(|o| matches!(o, TorrentOutcome::Failed { .. }))
    }

    /// Outcome for a torrent, if it was part of the run.
    pub fn outcome_for(&self, id: &str) -> Option<&TorrentOutcome> {
        self.torrents
            .iter()
            .find(|t| t.torrent_id.as_str() == id)
            .map(|t| &t.outcome)
    }

    fn count_matching(&self, predicate: impl Fn(&TorrentOutcome) -> bool) -> usize {
        self.torrents.iter().filter(|t| predicate(&t.outcome)).count()
    }
}
