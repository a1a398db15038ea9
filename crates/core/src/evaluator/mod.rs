//! Torrent evaluation.
//!
//! Pure decision logic: given a snapshot and a policy, work out which files to
//! unselect and whether the torrent should be removed. Never fails and never
//! talks to the client.

mod types;

pub use types::*;

use crate::policy::{classify_extension, Classification, ExtensionPolicy};
use crate::torrent_client::TorrentSnapshot;

/// Evaluate one torrent against the policy.
///
/// Only files classified `Unwanted` and currently selected are ever proposed
/// for unselection. The torrent is removed when no `Allowed` file would stay
/// selected, provided at least one of its files is covered by the policy; a
/// torrent made only of unknown extensions is always kept.
pub fn evaluate(snapshot: &TorrentSnapshot, policy: &ExtensionPolicy) -> EvaluationResult {
    let mut summary = ClassificationSummary::default();
    let mut to_unselect = Vec::new();
    let mut remaining_allowed = 0;

    for file in &snapshot.files {
        match classify_extension(file.extension.as_deref(), policy) {
            Classification::Unwanted => {
                summary.unwanted += 1;
                if file.selected {
                    to_unselect.push(file.clone());
                }
            }
            Classification::Allowed => {
                summary.allowed += 1;
                if file.selected {
                    remaining_allowed += 1;
                }
            }
            Classification::Unknown => summary.unknown += 1,
        }
    }

    let policy_applies = summary.unwanted + summary.allowed > 0;
    let verdict = if policy_applies && remaining_allowed == 0 {
        Verdict::Remove
    } else {
        Verdict::Keep
    };

    let reason = match verdict {
        Verdict::Remove => EvaluationReason::NoAllowedFilesRemain,
        Verdict::Keep if to_unselect.is_empty() => EvaluationReason::NoAction,
        Verdict::Keep => EvaluationReason::PartialCleanup,
    };

    EvaluationResult {
        to_unselect,
        verdict,
        reason,
        summary,
        remaining_allowed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::torrent_client::FileEntry;

    fn policy() -> ExtensionPolicy {
        ExtensionPolicy::new(["jpg", "txt"], ["mkv"])
    }

    fn torrent(files: &[(&str, bool)]) -> TorrentSnapshot {
        let files = files
            .iter()
            .enumerate()
            .map(|(i, (path, selected))| FileEntry::new(i, *path, *selected, 100))
            .collect();
        TorrentSnapshot::new("1", "Test", files)
    }

    #[test]
    fn test_mixed_torrent_is_partially_cleaned() {
        let result = evaluate(
            &torrent(&[("a.mkv", true), ("b.jpg", true), ("c.txt", true)]),
            &policy(),
        );
        assert_eq!(result.unselect_paths(), vec!["b.jpg", "c.txt"]);
        assert_eq!(result.unselect_indices(), vec![1, 2]);
        assert_eq!(result.verdict, Verdict::Keep);
        assert_eq!(result.reason, EvaluationReason::PartialCleanup);
        assert_eq!(result.remaining_allowed, 1);
        assert_eq!(
            result.summary,
            ClassificationSummary {
                unwanted: 2,
                allowed: 1,
                unknown: 0
            }
        );
    }

    #[test]
    fn test_torrent_without_allowed_files_is_removed() {
        let result = evaluate(&torrent(&[("b.jpg", true), ("c.txt", true)]), &policy());
        assert_eq!(result.unselect_paths(), vec!["b.jpg", "c.txt"]);
        assert_eq!(result.verdict, Verdict::Remove);
        assert_eq!(result.reason, EvaluationReason::NoAllowedFilesRemain);
    }

    #[test]
    fn test_unknown_only_torrent_is_kept() {
        let result = evaluate(&torrent(&[("d.srt", true)]), &policy());
        assert!(result.to_unselect.is_empty());
        assert_eq!(result.verdict, Verdict::Keep);
        assert_eq!(result.reason, EvaluationReason::NoAction);
        assert!(result.is_no_action());
    }

    #[test]
    fn test_already_unselected_files_are_left_alone() {
        let result = evaluate(
            &torrent(&[("a.mkv", true), ("b.jpg", false), ("c.txt", true)]),
            &policy(),
        );
        assert_eq!(result.unselect_paths(), vec!["c.txt"]);
        assert_eq!(result.summary.unwanted, 2);
    }

    #[test]
    fn test_clean_torrent_needs_no_action() {
        let result = evaluate(
            &torrent(&[("a.mkv", true), ("b.jpg", false), ("d.srt", true)]),
            &policy(),
        );
        assert!(result.to_unselect.is_empty());
        assert_eq!(result.reason, EvaluationReason::NoAction);
    }

    #[test]
    fn test_unselected_allowed_files_do_not_keep_torrent() {
        let result = evaluate(&torrent(&[("a.mkv", false), ("d.srt", true)]), &policy());
        assert!(result.to_unselect.is_empty());
        assert_eq!(result.verdict, Verdict::Remove);
    }

    #[test]
    fn test_unknown_files_never_unselected() {
        let result = evaluate(
            &torrent(&[("b.jpg", true), ("d.srt", true), ("README", true)]),
            &policy(),
        );
        assert_eq!(result.unselect_paths(), vec!["b.jpg"]);
        assert_eq!(result.summary.unknown, 2);
        assert_eq!(result.verdict, Verdict::Remove);
    }

    #[test]
    fn test_conflicting_extension_is_unselected() {
        let policy = ExtensionPolicy::new(["mkv"], ["mkv", "mp4"]);
        let result = evaluate(&torrent(&[("a.mkv", true), ("b.mp4", true)]), &policy);
        assert_eq!(result.unselect_paths(), vec!["a.mkv"]);
        assert_eq!(result.verdict, Verdict::Keep);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let snapshot = torrent(&[("a.mkv", true), ("b.jpg", true), ("d.srt", false)]);
        assert_eq!(evaluate(&snapshot, &policy()), evaluate(&snapshot, &policy()));
    }

    #[test]
    fn test_applying_result_leaves_nothing_to_unselect() {
        let mut snapshot = torrent(&[("a.mkv", true), ("b.jpg", true), ("c.txt", true)]);
        let first = evaluate(&snapshot, &policy());
        for file in snapshot.files.iter_mut() {
            if first.unselect_indices().contains(&file.index) {
                file.selected = false;
            }
        }

        let second = evaluate(&snapshot, &policy());
        assert!(second.to_unselect.is_empty());
        assert_eq!(second.verdict, Verdict::Keep);
        assert_eq!(second.reason, EvaluationReason::NoAction);
    }
}
