//! Change notifications published to the presentation layer.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{AccountId, DashboardSnapshot, Money};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// The active account changed. `None` after logout.
    ScopeChanged { account: Option<AccountId> },
    ItemCountChanged { count: usize },
    LowStockChanged { count: usize },
    RevenueChanged { total: Money, this_month: Money },
    ItemNearExpiry {
        item_id: Uuid,
        name: String,
        expiry_date: NaiveDate,
    },
    /// A full recomputation finished.
    SnapshotReady { snapshot: Arc<DashboardSnapshot> },
    ErrorOccurred { message: String },
}

/// Fan-out of [`LedgerEvent`]s to any number of subscribers.
///
/// Receivers that fall more than `capacity` events behind get
/// `RecvError::Lagged` and skip ahead.
#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<LedgerEvent>,
}

impl EventBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.sender.subscribe()
    }

    /// Publish `event`. Having no subscriber is fine.
    pub fn publish(&self, event: LedgerEvent) {
        if let Err(broadcast::error::SendError(event)) = self.sender.send(event) {
            tracing::trace!(?event, "event dropped, no subscribers");
        }
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_without_subscribers_is_silent() {
        let bus = EventBus::new(4);
        bus.publish(LedgerEvent::ItemCountChanged { count: 1 });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn every_subscriber_sees_every_event() {
        let bus = EventBus::new(4);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish(LedgerEvent::LowStockChanged { count: 3 });

        assert_eq!(
            first.recv().await.unwrap(),
            LedgerEvent::LowStockChanged { count: 3 }
        );
        assert_eq!(
            second.recv().await.unwrap(),
            LedgerEvent::LowStockChanged { count: 3 }
        );
    }
}
