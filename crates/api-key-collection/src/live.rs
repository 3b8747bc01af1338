//! Live subscriptions for the API-key collection.
//!
//! # Design Principles
//!
//! - Subscribers are notified after the change is applied
//! - Each subscriber gets its own copy of every change
//! - Changes sent before a subscription was created are not replayed

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::RwLock;

use api_key_types::{ApiKeyId, ApiKeyRecord};

/// A change applied to the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionChange {
    /// A single record was inserted.
    Inserted(ApiKeyRecord),
    /// A single record was removed.
    Deleted(ApiKeyId),
    /// The whole collection was swapped; `keys` is the new key set.
    Replaced { keys: Vec<ApiKeyId> },
}

/// A subscription to collection changes.
pub struct CollectionSubscription {
    receiver: Receiver<CollectionChange>,
}

impl CollectionSubscription {
    fn new(receiver: Receiver<CollectionChange>) -> Self {
        Self { receiver }
    }

    /// Returns the next change if one is already queued.
    pub fn try_recv(&self) -> Option<CollectionChange> {
        self.receiver.try_recv().ok()
    }

    /// Drains every change queued so far without blocking.
    pub fn drain(&self) -> Vec<CollectionChange> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

/// Fan-out point for collection changes.
#[derive(Debug, Default)]
pub struct LiveHub {
    subscribers: RwLock<Vec<Sender<CollectionChange>>>,
}

impl LiveHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber.
    pub fn subscribe(&self) -> CollectionSubscription {
        let (sender, receiver) = mpsc::channel();
        self.subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(sender);
        CollectionSubscription::new(receiver)
    }

    /// Sends `change` to every live subscriber, dropping the dead ones.
    pub fn notify(&self, change: CollectionChange) {
        let mut subscribers = self
            .subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        subscribers.retain(|sender| sender.send(change.clone()).is_ok());
    }

    /// Number of registered subscribers, possibly including dead ones that
    /// have not been pruned by a `notify` yet.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}
