//! In-process log store.
//!
//! Behaves like the hosted store from a client's point of view: ids are
//! assigned on append and every change pushes a full snapshot. Faults can be
//! injected to exercise rejected writes and failing feeds.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{FeedEvent, RemoteLogStore, Subscribers, Subscription};
use crate::error::{Error, Result};
use crate::models::{RecordDraft, RecordId, SleepRecord};

#[derive(Debug, Default)]
struct MemoryState {
    records: Vec<SleepRecord>,
    write_rejection: Option<String>,
    subscribe_rejection: Option<String>,
    paused: bool,
}

#[derive(Debug, Default)]
struct MemoryInner {
    state: Mutex<MemoryState>,
    subscribers: Subscribers,
    append_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

/// Cloneable handle to a shared in-memory collection.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogStore {
    inner: Arc<MemoryInner>,
}

impl MemoryLogStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `records` already in the collection, in the given order.
    #[must_use]
    pub fn with_records(records: Vec<SleepRecord>) -> Self {
        let store = Self::default();
        store.state().records = records;
        store
    }

    /// Reject every append/delete with `reason` until cleared with `None`.
    pub fn reject_writes(&self, reason: Option<&str>) {
        self.state().write_rejection = reason.map(str::to_string);
    }

    /// Make `subscribe` fail with `reason` until cleared with `None`.
    pub fn reject_subscriptions(&self, reason: Option<&str>) {
        self.state().subscribe_rejection = reason.map(str::to_string);
    }

    /// Stop delivering snapshots, as if the feed never resolved.
    /// Resuming publishes the current state.
    pub fn pause_feed(&self, paused: bool) {
        self.state().paused = paused;
        if !paused {
            self.publish_snapshot();
        }
    }

    /// Send a terminal error to every subscription.
    pub fn fail_feed(&self, message: &str) {
        self.inner
            .subscribers
            .publish(&FeedEvent::Error(message.to_string()));
    }

    /// Record written by another client; bypasses fault injection.
    pub fn insert_remote(&self, record: SleepRecord) {
        self.state().records.push(record);
        self.publish_snapshot();
    }

    /// Current contents in store order.
    pub fn records(&self) -> Vec<SleepRecord> {
        self.state().records.clone()
    }

    /// Number of append requests that reached the store.
    pub fn append_calls(&self) -> usize {
        self.inner.append_calls.load(Ordering::SeqCst)
    }

    /// Number of delete requests that reached the store.
    pub fn delete_calls(&self) -> usize {
        self.inner.delete_calls.load(Ordering::SeqCst)
    }

    pub fn active_subscriptions(&self) -> usize {
        self.inner.subscribers.active()
    }

    fn publish_snapshot(&self) {
        let snapshot = {
            let state = self.state();
            if state.paused {
                return;
            }
            state.records.clone()
        };
        let delivered = self
            .inner
            .subscribers
            .publish(&FeedEvent::Snapshot(snapshot));
        tracing::debug!(subscribers = delivered, "Published memory snapshot");
    }

    fn check_writable(&self) -> Result<()> {
        match &self.state().write_rejection {
            Some(reason) => Err(Error::Rejected(reason.clone())),
            None => Ok(()),
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl RemoteLogStore for MemoryLogStore {
    async fn subscribe(&self) -> Result<Subscription> {
        // Registering under the state lock keeps writes from slipping between
        // the initial snapshot and the first published change.
        let state = self.state();
        if let Some(reason) = &state.subscribe_rejection {
            return Err(Error::Rejected(reason.clone()));
        }
        let initial = (!state.paused).then(|| FeedEvent::Snapshot(state.records.clone()));
        Ok(self.inner.subscribers.register(initial))
    }

    async fn append(&self, draft: &RecordDraft) -> Result<RecordId> {
        self.inner.append_calls.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;

        let id = RecordId::generate();
        self.state()
            .records
            .push(draft.clone().into_record(id.clone()));
        self.publish_snapshot();
        Ok(id)
    }

    async fn delete(&self, id: &RecordId) -> Result<()> {
        self.inner.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.check_writable()?;

        self.state().records.retain(|record| &record.id != id);
        self.publish_snapshot();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::RecordLocale;
    use crate::models::SpouseLabel;

    fn draft(timestamp: i64) -> RecordDraft {
        let at = chrono::DateTime::from_timestamp_millis(timestamp).unwrap();
        RecordDraft::at(&at, "uid", SpouseLabel::SpouseA, RecordLocale::ZhTw).unwrap()
    }

    #[tokio::test]
    async fn subscribe_delivers_initial_snapshot_then_changes() {
        let store = MemoryLogStore::new();
        let mut feed = store.subscribe().await.unwrap();
        assert_eq!(feed.next().await, Some(FeedEvent::Snapshot(Vec::new())));

        let id = store.append(&draft(1_000)).await.unwrap();
        let Some(FeedEvent::Snapshot(records)) = feed.next().await else {
            panic!("expected snapshot");
        };
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);

        store.delete(&id).await.unwrap();
        assert_eq!(feed.next().await, Some(FeedEvent::Snapshot(Vec::new())));
    }

    #[tokio::test]
    async fn rejected_writes_leave_collection_untouched() {
        let store = MemoryLogStore::new();
        store.reject_writes(Some("permission denied"));

        let error = store.append(&draft(1_000)).await.unwrap_err();
        assert!(matches!(error, Error::Rejected(_)));
        assert!(store.records().is_empty());
        assert_eq!(store.append_calls(), 1);
    }

    #[tokio::test]
    async fn deleting_unknown_id_succeeds() {
        let store = MemoryLogStore::new();
        store.delete(&"missing".parse().unwrap()).await.unwrap();
        assert_eq!(store.delete_calls(), 1);
    }

    #[tokio::test]
    async fn paused_feed_withholds_snapshots() {
        let store = MemoryLogStore::new();
        store.pause_feed(true);
        let mut feed = store.subscribe().await.unwrap();
        store.append(&draft(1_000)).await.unwrap();

        store.pause_feed(false);
        let Some(FeedEvent::Snapshot(records)) = feed.next().await else {
            panic!("expected snapshot");
        };
        assert_eq!(records.len(), 1);
    }
}
