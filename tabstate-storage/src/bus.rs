//! Cross-context change notification channel.
//!
//! Every [`Storage`](crate::Storage) attached to the same [`ChangeBus`]
//! represents one execution context (a tab or window) over a shared medium.
//! Writes and removals are published as [`StorageEvent`]s; each context
//! drains its own receiver when it chooses to, mirroring an event loop
//! delivering storage events between turns.
//!
//! Delivery is best effort: ordering is FIFO per receiver, and a receiver
//! that falls more than the channel capacity behind loses the oldest events.

use crate::config::StorageConfig;
use serde::{Deserialize, Serialize};
use tabstate_types::ContextId;
use tokio::sync::broadcast;

/// Default number of events buffered per receiver.
pub const DEFAULT_BUS_CAPACITY: usize = 256;

/// A change published by one context for the others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEvent {
    /// Namespaced medium key that changed.
    pub key: String,
    /// The serialized envelope now stored, or `None` on removal.
    pub new_value: Option<String>,
    /// Origin of the writer (the page URL in a browser).
    pub origin: String,
    /// Context that performed the write.
    pub context: ContextId,
}

/// A publish/subscribe channel shared by the contexts of one medium.
#[derive(Debug, Clone)]
pub struct ChangeBus {
    sender: broadcast::Sender<StorageEvent>,
}

impl ChangeBus {
    /// Creates a bus buffering up to `capacity` events per receiver.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Creates a bus sized by `config.bus_capacity`.
    pub fn for_config(config: &StorageConfig) -> Self {
        Self::new(config.bus_capacity)
    }

    /// Publishes an event. Returns the number of receivers it reached.
    pub fn publish(&self, event: StorageEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Opens a new receiver that sees events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.sender.subscribe()
    }

    /// Number of attached receivers.
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}
