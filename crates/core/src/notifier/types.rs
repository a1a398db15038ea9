use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::torrent_client::TorrentId;

#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Unexpected status {status}: {body}")]
    Status { status: u16, body: String },
}

/// What happened to a torrent. The name doubles as the webhook path suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationAction {
    Unselect,
    Remove,
    Skip,
    Keep,
}

impl NotificationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationAction::Unselect => "Unselect",
            NotificationAction::Remove => "Remove",
            NotificationAction::Skip => "Skip",
            NotificationAction::Keep => "Keep",
        }
    }
}

impl fmt::Display for NotificationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload sent to every transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub action: NotificationAction,
    pub torrent_id: TorrentId,
    pub torrent_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Paths of the unselected files (Unselect only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unselected_files: Option<Vec<String>>,
    pub timestamp: DateTime<Utc>,
    pub dry_run: bool,
}

impl NotificationEvent {
    pub fn new(
        action: NotificationAction,
        torrent_id: TorrentId,
        torrent_name: impl Into<String>,
        dry_run: bool,
    ) -> Self {
        Self {
            action,
            torrent_id,
            torrent_name: torrent_name.into(),
            details: None,
            unselected_files: None,
            timestamp: Utc::now(),
            dry_run,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_unselected_files(mut self, files: Vec<String>) -> Self {
        self.unselected_files = Some(files);
        self
    }
}

/// A notification transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Transport name for logging.
    fn name(&self) -> &str;

    /// Deliver one event.
    async fn notify(&self, event: &NotificationEvent) -> Result<(), NotifierError>;
}
