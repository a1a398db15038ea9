//! Mock notifier for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::notifier::{NotificationEvent, Notifier, NotifierError};

/// Records every event it is asked to deliver.
///
/// When failing, events are still recorded but `notify` returns an error.
#[derive(Debug, Default)]
pub struct MockNotifier {
    events: Arc<RwLock<Vec<NotificationEvent>>>,
    failing: Arc<RwLock<bool>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `notify` call fail.
    pub async fn set_failing(&self, failing: bool) {
        *self.failing.write().await = failing;
    }

    /// All events received so far.
    pub async fn events(&self) -> Vec<NotificationEvent> {
        self.events.read().await.clone()
    }

    pub async fn clear(&self) {
        self.events.write().await.clear();
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    fn name(&self) -> &str {
        "mock"
    }

    async fn notify(&self, event: &NotificationEvent) -> Result<(), NotifierError> {
        self.events.write().await.push(event.clone());

        if *self.failing.read().await {
            return Err(NotifierError::Http("mock notifier failure".to_string()));
        }
        Ok(())
    }
}
