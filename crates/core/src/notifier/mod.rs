//! Notification events and transports.
//!
//! Notifications are best-effort: the dispatcher logs transport failures and
//! never reports them back to the caller.

mod dispatcher;
mod pushbullet;
mod types;
mod webhook;

use std::sync::Arc;

pub use dispatcher::NotificationDispatcher;
pub use pushbullet::PushbulletNotifier;
pub use types::*;
pub use webhook::WebhookNotifier;

use crate::config::NotificationsConfig;

/// Build the enabled transports from configuration.
pub fn create_notifiers(
    config: &NotificationsConfig,
) -> Result<Vec<Arc<dyn Notifier>>, NotifierError> {
    let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::new();

    if config.webhook.enabled {
        notifiers.push(Arc::new(WebhookNotifier::new(config.webhook.clone())?));
    }
    if config.pushbullet.enabled {
        notifiers.push(Arc::new(PushbulletNotifier::new(
            config.pushbullet.clone(),
        )?));
    }

    Ok(notifiers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PushbulletConfig, WebhookConfig};

    #[test]
    fn test_create_notifiers_only_builds_enabled_transports() {
        let mut config = NotificationsConfig::default();
        assert!(create_notifiers(&config).unwrap().is_empty());

        config.webhook = WebhookConfig {
            enabled: true,
            url: "http://localhost:8080/Cleanup".to_string(),
            timeout_secs: 5,
        };
        config.pushbullet = PushbulletConfig {
            enabled: true,
            access_token: "token".to_string(),
            device_iden: None,
        };

        let notifiers = create_notifiers(&config).unwrap();
        let names: Vec<&str> = notifiers.iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["webhook", "pushbullet"]);
    }
}
