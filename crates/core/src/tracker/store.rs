use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::torrent_client::TorrentId;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

/// Terminal decision reached for a torrent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Unwanted files were unselected and the torrent kept.
    Unselected,
    /// The torrent was removed from the client.
    Removed,
    /// Nothing needed doing.
    SkippedNoAction,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Unselected => "unselected",
            Decision::Removed => "removed",
            Decision::SkippedNoAction => "skipped_no_action",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Decision {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unselected" => Ok(Decision::Unselected),
            "removed" => Ok(Decision::Removed),
            "skipped_no_action" => Ok(Decision::SkippedNoAction),
            other => Err(TrackerError::InvalidRecord(format!(
                "unknown decision: {}",
                other
            ))),
        }
    }
}

/// A torrent's terminal decision. Written once, never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessedRecord {
    pub torrent_id: TorrentId,
    pub torrent_name: String,
    pub decision: Decision,
    pub timestamp: DateTime<Utc>,
    /// Fingerprint of the extension policy the decision was made under.
    pub policy_fingerprint: String,
    /// Decided during a dry run; the client was not touched.
    pub dry_run: bool,
}

impl ProcessedRecord {
    /// Whether this record keeps the torrent out of evaluation.
    ///
    /// Unselected and Removed are always terminal. SkippedNoAction is terminal
    /// while the policy is unchanged, or forever when `revisit_skipped` is off.
    pub fn blocks_reevaluation(&self, current_fingerprint: &str, revisit_skipped: bool) -> bool {
        match self.decision {
            Decision::Unselected | Decision::Removed => true,
            Decision::SkippedNoAction => {
                !revisit_skipped || self.policy_fingerprint == current_fingerprint
            }
        }
    }
}

/// Trait for processed-set storage
pub trait ProcessedStore: Send + Sync {
    /// Get the record for a torrent, if any
    fn get(&self, id: &TorrentId) -> Result<Option<ProcessedRecord>, TrackerError>;

    /// Whether a terminal decision exists for the torrent
    fn is_processed(&self, id: &TorrentId) -> Result<bool, TrackerError> {
        Ok(self.get(id)?.is_some())
    }

    /// Store a record, replacing any previous one for the same torrent.
    /// Must be durable when this returns.
    fn record(&self, record: &ProcessedRecord) -> Result<(), TrackerError>;

    /// Delete records decided before `older_than`, returns how many were removed
    fn prune(&self, older_than: DateTime<Utc>) -> Result<usize, TrackerError>;

    /// Most recent records first
    fn list(&self, limit: usize) -> Result<Vec<ProcessedRecord>, TrackerError>;

    /// Number of stored records
    fn count(&self) -> Result<usize, TrackerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(decision: Decision, fingerprint: &str) -> ProcessedRecord {
        ProcessedRecord {
            torrent_id: TorrentId::new("1"),
            torrent_name: "Test".to_string(),
            decision,
            timestamp: Utc::now(),
            policy_fingerprint: fingerprint.to_string(),
            dry_run: false,
        }
    }

    #[test]
    fn test_decision_string_round_trip() {
        for decision in [
            Decision::Unselected,
            Decision::Removed,
            Decision::SkippedNoAction,
        ] {
            assert_eq!(decision.as_str().parse::<Decision>().unwrap(), decision);
        }
        assert!("deleted".parse::<Decision>().is_err());
    }

    #[test]
    fn test_unselected_and_removed_are_always_terminal() {
        for decision in [Decision::Unselected, Decision::Removed] {
            let rec = record(decision, "old");
            assert!(rec.blocks_reevaluation("new", true));
            assert!(rec.blocks_reevaluation("new", false));
        }
    }

    #[test]
    fn test_skipped_is_revisited_after_policy_change() {
        let rec = record(Decision::SkippedNoAction, "old");
        assert!(rec.blocks_reevaluation("old", true));
        assert!(!rec.blocks_reevaluation("new", true));
        assert!(rec.blocks_reevaluation("new", false));
    }
}
