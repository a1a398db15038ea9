//! JSON webhook transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::WebhookConfig;

use super::{NotificationEvent, Notifier, NotifierError};

/// POSTs each event as JSON to `<url>/<Action>`.
pub struct WebhookNotifier {
    client: Client,
    base_url: String,
}

impl WebhookNotifier {
    pub fn new(config: WebhookConfig) -> Result<Self, NotifierError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| NotifierError::Http(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, event: &NotificationEvent) -> String {
        format!("{}/{}", self.base_url, event.action)
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn notify(&self, event: &NotificationEvent) -> Result<(), NotifierError> {
        let url = self.url_for(event);
        debug!(url = %url, action = %event.action, "Sending webhook");

        let response = self
            .client
            .post(&url)
            .json(event)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::NotificationAction;
    use crate::torrent_client::TorrentId;
    use httpmock::prelude::*;

    fn notifier_for(url: String) -> WebhookNotifier {
        WebhookNotifier::new(WebhookConfig {
            enabled: true,
            url,
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_posts_to_action_path() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/Cleanup/Remove")
                    .header("content-type", "application/json");
                then.status(200);
            })
            .await;

        let notifier = notifier_for(server.url("/Cleanup/"));
        let event = NotificationEvent::new(
            NotificationAction::Remove,
            TorrentId::new("12"),
            "Sample.Only",
            false,
        )
        .with_details("No allowed files remaining");

        notifier.notify(&event).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/Cleanup/Keep");
                then.status(500).body("boom");
            })
            .await;

        let notifier = notifier_for(server.url("/Cleanup"));
        let event = NotificationEvent::new(
            NotificationAction::Keep,
            TorrentId::new("1"),
            "Movie",
            false,
        );

        let err = notifier.notify(&event).await.unwrap_err();
        match err {
            NotifierError::Status { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_http_error() {
        let notifier = notifier_for("http://127.0.0.1:9/Cleanup".to_string());
        let event = NotificationEvent::new(
            NotificationAction::Skip,
            TorrentId::new("1"),
            "Movie",
            false,
        );

        let err = notifier.notify(&event).await.unwrap_err();
        assert!(matches!(err, NotifierError::Http(_)));
    }
}
