pub mod activity_log;
pub mod config;
pub mod evaluator;
pub mod notifier;
pub mod orchestrator;
pub mod policy;
pub mod testing;
pub mod torrent_client;
pub mod tracker;

pub use config::{
    load_config, load_config_from_str, validate_config, ClientBackend, Config, ConfigError,
    SanitizedConfig,
};
pub use evaluator::{evaluate, EvaluationReason, EvaluationResult, Verdict};
pub use notifier::{
    create_notifiers, NotificationAction, NotificationDispatcher, NotificationEvent, Notifier,
    NotifierError,
};
pub use orchestrator::{
    CleanupOrchestrator, OrchestratorError, RunOptions, RunReport, TorrentOutcome,
};
pub use policy::{classify, Classification, ExtensionPolicy};
pub use torrent_client::{
    create_torrent_client, FileEntry, TorrentClient, TorrentClientError, TorrentId,
    TorrentSnapshot,
};
pub use tracker::{Decision, ProcessedRecord, ProcessedStore, SqliteProcessedStore, TrackerError};
