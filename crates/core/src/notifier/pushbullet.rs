//! Pushbullet push transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::config::PushbulletConfig;

use super::{NotificationAction, NotificationEvent, Notifier, NotifierError};

const PUSHBULLET_API_URL: &str = "https://api.pushbullet.com/v2/pushes";
const PUSHBULLET_TIMEOUT_SECS: u64 = 10;
/// Unselected files named in a push body before the rest is summarised.
const MAX_LISTED_FILES: usize = 3;

#[derive(Debug, Serialize)]
struct Push<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    title: String,
    body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    device_iden: Option<&'a str>,
}

pub struct PushbulletNotifier {
    client: Client,
    config: PushbulletConfig,
    api_url: String,
}

impl PushbulletNotifier {
    pub fn new(config: PushbulletConfig) -> Result<Self, NotifierError> {
        Self::with_api_url(config, PUSHBULLET_API_URL)
    }

    /// Use a different pushes endpoint.
    pub fn with_api_url(
        config: PushbulletConfig,
        api_url: impl Into<String>,
    ) -> Result<Self, NotifierError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(PUSHBULLET_TIMEOUT_SECS))
            .build()
            .map_err(|e| NotifierError::Http(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            api_url: api_url.into(),
        })
    }

    fn device_iden(&self) -> Option<&str> {
        self.config
            .device_iden
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }
}

/// Push title for an event.
pub(crate) fn push_title(event: &NotificationEvent) -> String {
    format!("Transmission Cleanup - {}", event.action)
}

/// Human-readable push body for an event.
pub(crate) fn push_body(event: &NotificationEvent) -> String {
    let name = &event.torrent_name;
    let details = event.details.as_deref().unwrap_or_default();

    let message = match event.action {
        NotificationAction::Unselect => {
            let files = event.unselected_files.as_deref().unwrap_or_default();
            let mut message = format!("Unselected {} files from '{}'", files.len(), name);
            if !files.is_empty() {
                let listed = files
                    .iter()
                    .take(MAX_LISTED_FILES)
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                message.push_str(&format!("\nFiles: {}", listed));
                if files.len() > MAX_LISTED_FILES {
                    message.push_str(&format!(
                        "... (+{} more)",
                        files.len() - MAX_LISTED_FILES
                    ));
                }
            }
            message
        }
        NotificationAction::Remove => format!("Removed torrent '{}'\nReason: {}", name, details),
        NotificationAction::Skip => format!("Skipped torrent '{}'\nReason: {}", name, details),
        NotificationAction::Keep => format!("Kept torrent '{}'\nReason: {}", name, details),
    };

    if event.dry_run {
        format!("[DRY RUN] {}", message)
    } else {
        message
    }
}

#[async_trait]
impl Notifier for PushbulletNotifier {
    fn name(&self) -> &str {
        "pushbullet"
    }

    async fn notify(&self, event: &NotificationEvent) -> Result<(), NotifierError> {
        let push = Push {
            kind: "note",
            title: push_title(event),
            body: push_body(event),
            device_iden: self.device_iden(),
        };
        debug!(action = %event.action, "Sending Pushbullet push");

        let response = self
            .client
            .post(&self.api_url)
            .header("Access-Token", &self.config.access_token)
            .json(&push)
            .send()
            .await
            .map_err(|e| NotifierError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}
