//! Configuration snapshot propagation.
//!
//! Reconfiguration is modeled as a channel of immutable snapshots: whoever
//! reloads the file publishes a fresh `Arc<AppConfig>`, and interested
//! components hold a receiver. There is no shared mutable configuration
//! pointer and no callback list; a subscriber that never polls simply keeps
//! its old snapshot. Constructed [`StorageManager`]s deliberately do not
//! subscribe — a manager is bound to the snapshot given at construction.
//!
//! [`StorageManager`]: crate::storage::StorageManager

use crate::config::AppConfig;
use std::sync::Arc;
use tokio::sync::watch;

/// Receiving side of the snapshot channel.
pub type ConfigUpdates = watch::Receiver<Arc<AppConfig>>;

/// Publishing side of the snapshot channel.
#[derive(Debug)]
pub struct ConfigPublisher {
    tx: watch::Sender<Arc<AppConfig>>,
}

/// Creates a snapshot channel seeded with the initial configuration.
#[must_use]
pub fn channel(initial: Arc<AppConfig>) -> (ConfigPublisher, ConfigUpdates) {
    let (tx, rx) = watch::channel(initial);
    (ConfigPublisher { tx }, rx)
}

impl ConfigPublisher {
    /// Publishes a new snapshot to all subscribers.
    ///
    /// Subscribers observe snapshots in publish order; a slow subscriber
    /// skips intermediate snapshots and sees only the latest.
    pub fn publish(&self, config: Arc<AppConfig>) {
        // send only fails when every receiver is gone, which is fine:
        // nobody is listening for updates.
        let _ = self.tx.send(config);
    }

    /// Creates an additional subscription.
    #[must_use]
    pub fn subscribe(&self) -> ConfigUpdates {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_sees_published_snapshot() {
        let initial = Arc::new(AppConfig::default());
        let (publisher, mut updates) = channel(initial);
        assert_eq!(updates.borrow().server.port, 8080);

        let mut next = AppConfig::default();
        next.server.port = 9999;
        publisher.publish(Arc::new(next));

        updates.changed().await.unwrap();
        assert_eq!(updates.borrow_and_update().server.port, 9999);
    }

    #[tokio::test]
    async fn test_late_subscriber_gets_latest_snapshot() {
        let (publisher, _updates) = channel(Arc::new(AppConfig::default()));

        let mut next = AppConfig::default();
        next.server.port = 9001;
        publisher.publish(Arc::new(next));

        let late = publisher.subscribe();
        assert_eq!(late.borrow().server.port, 9001);
    }

    #[test]
    fn test_publish_without_subscribers_is_harmless() {
        let (publisher, updates) = channel(Arc::new(AppConfig::default()));
        drop(updates);
        publisher.publish(Arc::new(AppConfig::default()));
    }
}
