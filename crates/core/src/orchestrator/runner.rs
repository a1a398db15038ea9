//! Cleanup run implementation.
//!
//! Each torrent moves through
//! `Fetched -> (skip if processed) -> Evaluated -> Applied -> Recorded -> Notified`.
//! A failure before Recorded leaves the torrent unrecorded so the next run
//! retries it; a failure of the whole fetch aborts the run before any write.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, error, info, warn};

use crate::evaluator::{evaluate, EvaluationResult, Verdict};
use crate::notifier::{NotificationAction, NotificationDispatcher, NotificationEvent};
use crate::policy::ExtensionPolicy;
use crate::torrent_client::{TorrentClient, TorrentClientError, TorrentSnapshot};
use crate::tracker::{Decision, ProcessedRecord, ProcessedStore};

use super::config::RunOptions;
use super::types::{OrchestratorError, RunReport, RunStep, TorrentOutcome, TorrentReport};

const NO_FILES_DETAILS: &str = "No files found";
const NO_ALLOWED_DETAILS: &str = "No allowed files remaining";
const ALREADY_PROCESSED_DETAILS: &str = "Already processed";

/// Client write chosen for a torrent.
enum Action {
    None,
    Unselect(Vec<usize>),
    Remove,
}

/// A decision ready to be applied, recorded and announced.
struct Plan {
    action: Action,
    decision: Decision,
    event: NotificationEvent,
}

/// Drives one cleanup run against a client, a tracker and the notifiers.
pub struct CleanupOrchestrator {
    client: Arc<dyn TorrentClient>,
    tracker: Arc<dyn ProcessedStore>,
    notifier: NotificationDispatcher,
    policy: ExtensionPolicy,
    options: RunOptions,
}

impl CleanupOrchestrator {
    pub fn new(
        client: Arc<dyn TorrentClient>,
        tracker: Arc<dyn ProcessedStore>,
        notifier: NotificationDispatcher,
        policy: ExtensionPolicy,
        options: RunOptions,
    ) -> Self {
        Self {
            client,
            tracker,
            notifier,
            policy,
            options,
        }
    }

    /// Run one cleanup pass over every torrent in the client.
    pub async fn run(&self) -> Result<RunReport, OrchestratorError> {
        let mut report = RunReport::new(self.options.dry_run);
        info!(
            client = self.client.name(),
            dry_run = self.options.dry_run,
            "Starting cleanup run"
        );

        let known = self.tracker.count()?;
        info!(records = known, "Loaded processed torrents");

        let torrents = self.client.list_torrents().await.map_err(|e| {
            error!(error = %e, "Failed to fetch torrents, aborting run");
            OrchestratorError::Fetch(e)
        })?;
        info!(count = torrents.len(), "Fetched torrents");

        // Only touch the tracker once the snapshot is in hand
        report.pruned_records = self.prune_tracker();

        let fingerprint = self.policy.fingerprint();
        for torrent in &torrents {
            let outcome = self.process_torrent(torrent, &fingerprint).await;
            report.torrents.push(TorrentReport {
                torrent_id: torrent.id.clone(),
                torrent_name: torrent.name.clone(),
                outcome,
            });
        }

        report.finished_at = Utc::now();
        info!(
            total = report.total(),
            unselected = report.decided(Decision::Unselected),
            removed = report.decided(Decision::Removed),
            kept = report.decided(Decision::SkippedNoAction),
            already_processed = report.already_processed(),
            no_files = report.no_files(),
            failed = report.failed(),
            "Cleanup run completed"
        );
        Ok(report)
    }

    /// Drop expired tracker records. Failure only costs housekeeping.
    fn prune_tracker(&self) -> usize {
        let cutoff = Utc::now() - Duration::days(i64::from(self.options.tracker_retention_days));
        match self.tracker.prune(cutoff) {
            Ok(pruned) => {
                if pruned > 0 {
                    info!(pruned, cutoff = %cutoff, "Pruned expired processed records");
                }
                pruned
            }
            Err(e) => {
                warn!(error = %e, "Failed to prune processed records");
                0
            }
        }
    }

    async fn process_torrent(
        &self,
        torrent: &TorrentSnapshot,
        fingerprint: &str,
    ) -> TorrentOutcome {
        match self.tracker.get(&torrent.id) {
            Ok(Some(record))
                if record.blocks_reevaluation(
                    fingerprint,
                    self.options.revisit_skipped_on_policy_change,
                ) =>
            {
                debug!(
                    torrent_id = %torrent.id,
                    torrent_name = %torrent.name,
                    decision = %record.decision,
                    "Already processed, skipping"
                );
                self.notify(
                    self.event(NotificationAction::Skip, torrent)
                        .with_details(ALREADY_PROCESSED_DETAILS),
                )
                .await;
                return TorrentOutcome::AlreadyProcessed;
            }
            Ok(Some(_)) => {
                info!(
                    torrent_id = %torrent.id,
                    torrent_name = %torrent.name,
                    "Extension policy changed since torrent was kept, re-evaluating"
                );
            }
            Ok(None) => {}
            Err(e) => {
                error!(
                    torrent_id = %torrent.id,
                    torrent_name = %torrent.name,
                    step = %RunStep::Check,
                    error = %e,
                    "Failed to read processed record"
                );
                return TorrentOutcome::Failed {
                    step: RunStep::Check,
                    error: e.to_string(),
                };
            }
        }

        info!(
            torrent_id = %torrent.id,
            torrent_name = %torrent.name,
            files = torrent.files.len(),
            "Processing torrent"
        );

        let plan = if torrent.files.is_empty() {
            if self.options.skip_zero_file_torrents {
                info!(
                    torrent_id = %torrent.id,
                    torrent_name = %torrent.name,
                    "Torrent has no files yet, skipping"
                );
                self.notify(
                    self.event(NotificationAction::Skip, torrent)
                        .with_details(NO_FILES_DETAILS),
                )
                .await;
                return TorrentOutcome::NoFiles;
            }
            Plan {
                action: Action::Remove,
                decision: Decision::Removed,
                event: self
                    .event(NotificationAction::Remove, torrent)
                    .with_details(NO_FILES_DETAILS),
            }
        } else {
            let result = evaluate(torrent, &self.policy);
            info!(
                torrent_id = %torrent.id,
                unwanted = result.summary.unwanted,
                allowed = result.summary.allowed,
                unknown = result.summary.unknown,
                to_unselect = result.to_unselect.len(),
                verdict = ?result.verdict,
                reason = result.reason.as_str(),
                "Evaluated torrent"
            );
            self.plan(torrent, &result)
        };

        if let Err(e) = self.apply(torrent, &plan.action).await {
            if e.is_not_found() {
                warn!(
                    torrent_id = %torrent.id,
                    torrent_name = %torrent.name,
                    step = %RunStep::Apply,
                    "Torrent left the client before it could be changed"
                );
            } else {
                error!(
                    torrent_id = %torrent.id,
                    torrent_name = %torrent.name,
                    step = %RunStep::Apply,
                    error = %e,
                    "Failed to apply decision, will retry next run"
                );
            }
            return TorrentOutcome::Failed {
                step: RunStep::Apply,
                error: e.to_string(),
            };
        }

        let record = ProcessedRecord {
            torrent_id: torrent.id.clone(),
            torrent_name: torrent.name.clone(),
            decision: plan.decision,
            timestamp: Utc::now(),
            policy_fingerprint: fingerprint.to_string(),
            dry_run: self.options.dry_run,
        };
        if let Err(e) = self.tracker.record(&record) {
            error!(
                torrent_id = %torrent.id,
                torrent_name = %torrent.name,
                step = %RunStep::Record,
                decision = %plan.decision,
                error = %e,
                "Failed to record decision, notification withheld"
            );
            return TorrentOutcome::Failed {
                step: RunStep::Record,
                error: e.to_string(),
            };
        }

        self.notify(plan.event).await;
        TorrentOutcome::Decided {
            decision: plan.decision,
        }
    }

    fn plan(&self, torrent: &TorrentSnapshot, result: &EvaluationResult) -> Plan {
        if result.verdict == Verdict::Remove {
            // Removal supersedes unselecting.
            return Plan {
                action: Action::Remove,
                decision: Decision::Removed,
                event: self
                    .event(NotificationAction::Remove, torrent)
                    .with_details(NO_ALLOWED_DETAILS),
            };
        }

        if result.is_no_action() {
            let details = if result.remaining_allowed > 0 {
                format!("Kept {} allowed files", result.remaining_allowed)
            } else {
                "No files matched the extension policy".to_string()
            };
            return Plan {
                action: Action::None,
                decision: Decision::SkippedNoAction,
                event: self
                    .event(NotificationAction::Keep, torrent)
                    .with_details(details),
            };
        }

        let count = result.to_unselect.len();
        let details = if self.options.dry_run {
            format!("Would unselect {} files", count)
        } else {
            format!("Unselected {} files", count)
        };
        Plan {
            action: Action::Unselect(result.unselect_indices()),
            decision: Decision::Unselected,
            event: self
                .event(NotificationAction::Unselect, torrent)
                .with_details(details)
                .with_unselected_files(result.unselect_paths()),
        }
    }

    async fn apply(
        &self,
        torrent: &TorrentSnapshot,
        action: &Action,
    ) -> Result<(), TorrentClientError> {
        match action {
            Action::None => Ok(()),
            Action::Unselect(indices) => {
                if self.options.dry_run {
                    info!(
                        torrent_id = %torrent.id,
                        files = indices.len(),
                        "[DRY RUN] Would unselect files"
                    );
                    return Ok(());
                }
                self.client
                    .set_files_wanted(&torrent.id, indices, false)
                    .await?;
                info!(
                    torrent_id = %torrent.id,
                    torrent_name = %torrent.name,
                    files = indices.len(),
                    "Unselected unwanted files"
                );
                Ok(())
            }
            Action::Remove => {
                if self.options.dry_run {
                    info!(torrent_id = %torrent.id, "[DRY RUN] Would remove torrent");
                    return Ok(());
                }
                self.client
                    .remove_torrent(&torrent.id, self.options.delete_data)
                    .await?;
                info!(
                    torrent_id = %torrent.id,
                    torrent_name = %torrent.name,
                    delete_data = self.options.delete_data,
                    "Removed torrent"
                );
                Ok(())
            }
        }
    }

    fn event(&self, action: NotificationAction, torrent: &TorrentSnapshot) -> NotificationEvent {
        NotificationEvent::new(
            action,
            torrent.id.clone(),
            torrent.name.clone(),
            self.options.dry_run,
        )
    }

    async fn notify(&self, event: NotificationEvent) {
        self.notifier.dispatch(&event).await;
    }
}
