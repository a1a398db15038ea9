//! Types produced by torrent evaluation.

use serde::{Deserialize, Serialize};

use crate::torrent_client::FileEntry;

/// Whether the torrent stays in the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Keep,
    Remove,
}

/// Why the evaluator reached its verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationReason {
    /// Nothing to unselect and the torrent is kept.
    NoAction,
    /// Some unwanted files get unselected; allowed files remain.
    PartialCleanup,
    /// No allowed file would remain selected.
    NoAllowedFilesRemain,
}

impl EvaluationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationReason::NoAction => "no_action",
            EvaluationReason::PartialCleanup => "partial_cleanup",
            EvaluationReason::NoAllowedFilesRemain => "no_allowed_files_remain",
        }
    }
}

/// Per-class file counts, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationSummary {
    pub unwanted: usize,
    pub allowed: usize,
    pub unknown: usize,
}

/// Outcome of evaluating one torrent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Unwanted files that are currently selected, in client order.
    pub to_unselect: Vec<FileEntry>,
    pub verdict: Verdict,
    pub reason: EvaluationReason,
    pub summary: ClassificationSummary,
    /// Allowed files still selected after the unselect step.
    pub remaining_allowed: usize,
}

impl EvaluationResult {
    /// Client indices of the files to unselect.
    pub fn unselect_indices(&self) -> Vec<usize> {
        self.to_unselect.iter().map(|f| f.index).collect()
    }

    /// Paths of the files to unselect.
    pub fn unselect_paths(&self) -> Vec<String> {
        self.to_unselect.iter().map(|f| f.path.clone()).collect()
    }

    pub fn is_no_action(&self) -> bool {
        self.reason == EvaluationReason::NoAction
    }
}
