//! Remote log store abstraction.
//!
//! A store issues record ids, accepts appends and deletes, and pushes the full
//! current record set to every live subscription after each change. Stores own
//! ordering and consistency; clients only mirror what they are sent.

mod libsql_store;
mod memory;

use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;

pub use libsql_store::LibSqlLogStore;
pub use memory::MemoryLogStore;

use crate::error::Result;
use crate::models::{RecordDraft, RecordId, SleepRecord};

/// Default collection holding the shared log.
pub const DEFAULT_COLLECTION: &str = "sleep_logs";

/// Notification delivered on a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// The complete current record set, in store order.
    Snapshot(Vec<SleepRecord>),
    /// The feed failed; no further events follow.
    Error(String),
}

/// Hosted collection of sleep records with a live change feed.
#[allow(async_fn_in_trait)]
pub trait RemoteLogStore: Send + Sync + 'static {
    /// Open a live feed. The first event is the initial snapshot.
    async fn subscribe(&self) -> Result<Subscription>;

    /// Store a new record and return the id assigned to it.
    async fn append(&self, draft: &RecordDraft) -> Result<RecordId>;

    /// Remove the record with `id`. Unknown ids are not an error.
    async fn delete(&self, id: &RecordId) -> Result<()>;
}

/// Receiving half of a live feed. Dropping it releases the subscription.
#[derive(Debug)]
pub struct Subscription {
    events: mpsc::UnboundedReceiver<FeedEvent>,
}

impl Subscription {
    /// Create a connected sender/subscription pair.
    #[must_use]
    pub fn channel() -> (FeedSender, Self) {
        let (sender, events) = mpsc::unbounded_channel();
        (FeedSender(sender), Self { events })
    }

    /// Wait for the next event; `None` once the store closed the feed.
    pub async fn next(&mut self) -> Option<FeedEvent> {
        self.events.recv().await
    }
}

/// Sending half of a live feed, held by the store.
#[derive(Debug, Clone)]
pub struct FeedSender(mpsc::UnboundedSender<FeedEvent>);

impl FeedSender {
    /// Deliver `event`; returns `false` when the subscriber is gone.
    pub fn send(&self, event: FeedEvent) -> bool {
        self.0.send(event).is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}

/// Live subscriptions of one store.
#[derive(Debug, Default)]
pub struct Subscribers {
    senders: Mutex<Vec<FeedSender>>,
}

impl Subscribers {
    /// Register a new subscription, optionally seeding it with `initial`.
    pub fn register(&self, initial: Option<FeedEvent>) -> Subscription {
        let (sender, subscription) = Subscription::channel();
        if let Some(event) = initial {
            sender.send(event);
        }
        self.lock().push(sender);
        subscription
    }

    /// Send `event` to every open subscription, pruning released ones.
    /// Returns how many subscriptions received it.
    pub fn publish(&self, event: &FeedEvent) -> usize {
        let mut senders = self.lock();
        senders.retain(|sender| sender.send(event.clone()));
        senders.len()
    }

    /// Number of subscriptions that have not been released yet.
    pub fn active(&self) -> usize {
        let mut senders = self.lock();
        senders.retain(|sender| !sender.is_closed());
        senders.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<FeedSender>> {
        self.senders.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
