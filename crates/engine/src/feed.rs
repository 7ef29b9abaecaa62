//! Per-context change notifications.
//!
//! Every collection mutation publishes a [`ChangeEvent`] on the feed of the
//! context that performed it. Indicators subscribe to that feed and re-read
//! their aggregate when an event for their collection arrives.
//!
//! A feed never spans contexts. Two contexts sharing one durable store each
//! have their own feed, so a mutation in one is invisible to the other's
//! indicators until the other re-reads storage.

use shopstate_core::ProductId;
use tokio::sync::broadcast;
use tracing::trace;

use crate::collection::CollectionKind;

/// Default number of undelivered events a subscriber may fall behind by.
pub const DEFAULT_FEED_CAPACITY: usize = 64;

/// What happened to a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeOp {
    /// An entry was appended, or merged into an existing one.
    Added { id: ProductId, new_insertion: bool },
    /// An entry was removed.
    Removed { id: ProductId },
    /// An existing entry was mutated in place.
    Updated { id: ProductId },
    /// Membership was flipped.
    Toggled { id: ProductId, member: bool },
    /// The collection was emptied.
    Cleared,
}

/// A mutation notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: CollectionKind,
    pub op: ChangeOp,
}

impl ChangeEvent {
    /// Create an event.
    #[must_use]
    pub const fn new(kind: CollectionKind, op: ChangeOp) -> Self {
        Self { kind, op }
    }
}

/// Broadcast channel of [`ChangeEvent`]s for one context.
///
/// Cloning yields another publisher for the same channel.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    /// Create a feed whose subscribers may lag by up to `capacity` events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event to current subscribers.
    ///
    /// Publishing with no subscribers is not an error.
    pub fn publish(&self, event: ChangeEvent) {
        match self.tx.send(event) {
            Ok(receivers) => trace!(receivers, "Published change event"),
            Err(_) => trace!("Change event dropped, no subscribers"),
        }
    }

    /// Subscribe to events published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}
