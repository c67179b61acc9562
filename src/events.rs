// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! In-process event bus for sync notifications.
//!
//! A single broadcast channel carries the closed [`SyncEvent`] enum.
//! Publishing never blocks and never fails: with no live subscribers an
//! event is simply dropped, and a slow subscriber loses the oldest
//! events rather than stalling publishers.
//!
//! Delivery is at-least-once per publish per live subscriber, with no
//! ordering guarantee across distinct subscribers. Subscribers must
//! tolerate duplicate events (the offline transition may be announced
//! more than once under concurrent failures).

use tokio::sync::broadcast;
use tracing::trace;

use crate::record::{AccessToken, AccountingRecord};
use crate::store::document::OfflineDocument;

/// Events published by the sync core.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// The failover repository observed a connectivity failure and is now
    /// serving from the offline path.
    SystemWentOffline,
    /// A remote fetch succeeded; the offline cache converges from this.
    CollectionReceived { entities: Vec<AccountingRecord> },
    /// The offline document was committed.
    DocumentUpdated {
        document: OfflineDocument,
        /// Epoch milliseconds of the commit.
        updated_at: i64,
    },
    /// A token was freshly acquired from the token endpoint (externally
    /// installed tokens are not announced).
    TokenAcquired { token: AccessToken },
}

impl SyncEvent {
    /// Label for logs and metrics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SystemWentOffline => "system_went_offline",
            Self::CollectionReceived { .. } => "collection_received",
            Self::DocumentUpdated { .. } => "document_updated",
            Self::TokenAcquired { .. } => "token_acquired",
        }
    }
}

/// Cheaply cloneable publish/subscribe handle.
///
/// All clones share the same channel; subscriptions made from any clone
/// see events published from any other.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SyncEvent>,
}

impl EventBus {
    /// Default per-subscriber buffer before lagging drops old events.
    pub const DEFAULT_CAPACITY: usize = 64;

    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event to every current subscriber.
    pub fn publish(&self, event: SyncEvent) {
        trace!(event = event.name(), "publishing sync event");
        crate::metrics::record_event_published(event.name());
        // No subscribers is not an error; the core does not depend on
        // anyone consuming its events.
        let _ = self.tx.send(event);
    }

    /// Register a subscriber. Dropping the receiver unsubscribes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.tx.subscribe()
    }

    /// Number of currently registered subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
