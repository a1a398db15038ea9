//! Cleanup orchestrator.
//!
//! Runs one pass over the client: fetch every torrent, skip the ones already
//! processed, evaluate the rest, apply and record the decisions, then notify.
//! Runs are independent; all cross-run state lives in the tracker.

mod config;
mod runner;
mod types;

pub use config::RunOptions;
pub use runner::CleanupOrchestrator;
pub use types::{OrchestratorError, RunReport, RunStep, TorrentOutcome, TorrentReport};
