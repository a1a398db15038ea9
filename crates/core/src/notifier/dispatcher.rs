use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::NotificationsConfig;

use super::{NotificationAction, NotificationEvent, Notifier};

/// Fans events out to every transport, honouring the per-action toggles.
#[derive(Clone)]
pub struct NotificationDispatcher {
    send_on_unselect: bool,
    send_on_remove: bool,
    send_on_skip: bool,
    send_on_keep: bool,
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl NotificationDispatcher {
    pub fn new(config: &NotificationsConfig, notifiers: Vec<Arc<dyn Notifier>>) -> Self {
        Self {
            send_on_unselect: config.send_on_unselect,
            send_on_remove: config.send_on_remove,
            send_on_skip: config.send_on_skip,
            send_on_keep: config.send_on_keep,
            notifiers,
        }
    }

    /// A dispatcher that never sends anything.
    pub fn disabled() -> Self {
        Self {
            send_on_unselect: false,
            send_on_remove: false,
            send_on_skip: false,
            send_on_keep: false,
            notifiers: Vec::new(),
        }
    }

    pub fn is_enabled(&self, action: NotificationAction) -> bool {
        match action {
            NotificationAction::Unselect => self.send_on_unselect,
            NotificationAction::Remove => self.send_on_remove,
            NotificationAction::Skip => self.send_on_skip,
            NotificationAction::Keep => self.send_on_keep,
        }
    }

    /// Send the event to every transport.
    ///
    /// Returns the number of transports that accepted it. Failures are logged
    /// and otherwise ignored.
    pub async fn dispatch(&self, event: &NotificationEvent) -> usize {
        if !self.is_enabled(event.action) {
            debug!(action = %event.action, "Notification disabled for action");
            return 0;
        }

        let mut delivered = 0;
        for notifier in &self.notifiers {
            match notifier.notify(event).await {
                Ok(()) => {
                    delivered += 1;
                    info!(
                        notifier = notifier.name(),
                        action = %event.action,
                        torrent_id = %event.torrent_id,
                        "Notification sent"
                    );
                }
                Err(e) => {
                    warn!(
                        notifier = notifier.name(),
                        action = %event.action,
                        torrent_id = %event.torrent_id,
                        error = %e,
                        "Failed to send notification"
                    );
                }
            }
        }
        delivered
    }
}
