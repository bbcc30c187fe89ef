use crate::rpc::Notification;
use futures::channel::mpsc;
use serde_json::Value;
use std::collections::HashMap;

/// Routes server notifications to the subscription streams that asked for them.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    subscriptions: HashMap<String, mpsc::UnboundedSender<Value>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a stream for `subscription_id`, replacing any previous one.
    pub fn register(&mut self, subscription_id: impl Into<String>) -> mpsc::UnboundedReceiver<Value> {
        let (tx, rx) = mpsc::unbounded();
        self.subscriptions.insert(subscription_id.into(), tx);
        rx
    }

    /// Delivers a notification. Returns `false` if nobody was listening.
    pub fn deliver(&mut self, notification: Notification) -> bool {
        let Some(subscription_id) = notification.subscription_id().map(str::to_owned) else {
            tracing::warn!(
                "Dropping notification `{}` without a subscription id",
                notification.method
            );
            return false;
        };

        let Some(sender) = self.subscriptions.get(&subscription_id) else {
            tracing::warn!(
                "Dropping notification for unknown subscription {}",
                subscription_id
            );
            return false;
        };

        let Some(item) = notification.into_subscription_result() else {
            tracing::warn!(
                "Dropping notification for subscription {} without a result",
                subscription_id
            );
            return false;
        };

        if sender.unbounded_send(item).is_err() {
            // Receiver dropped; stop tracking it.
            self.subscriptions.remove(&subscription_id);
            return false;
        }
        true
    }

    pub fn remove(&mut self, subscription_id: &str) -> bool {
        self.subscriptions.remove(subscription_id).is_some()
    }

    /// Ends every subscription stream.
    pub fn close_all(&mut self) {
        self.subscriptions.clear();
    }

    pub fn contains(&self, subscription_id: &str) -> bool {
        self.subscriptions.contains_key(subscription_id)
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}
