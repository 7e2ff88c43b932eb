//! libSQL-backed log store.
//!
//! Works against a local file, an in-memory database, or a Turso embedded
//! replica. Every successful write (and every `refresh`) republishes the full
//! collection to live subscriptions.

use std::path::Path;

use super::{FeedEvent, RemoteLogStore, Subscribers, Subscription};
use crate::db::{Database, LibSqlSleepLogRepository, SleepLogRepository, SyncConfig};
use crate::error::Result;
use crate::models::{RecordDraft, RecordId, SleepRecord};

pub struct LibSqlLogStore {
    db: Database,
    subscribers: Subscribers,
}

impl LibSqlLogStore {
    /// Open a local-only store at `path`.
    pub async fn open(path: impl AsRef<Path>, collection: &str) -> Result<Self> {
        Ok(Self::from_database(Database::open(path, collection).await?))
    }

    /// Open an in-memory store (useful for testing).
    pub async fn open_in_memory(collection: &str) -> Result<Self> {
        Ok(Self::from_database(
            Database::open_in_memory(collection).await?,
        ))
    }

    /// Open an embedded replica of a remote Turso database.
    pub async fn open_with_sync(
        path: impl AsRef<Path>,
        collection: &str,
        sync_config: SyncConfig,
    ) -> Result<Self> {
        Ok(Self::from_database(
            Database::open_with_sync(path, collection, sync_config).await?,
        ))
    }

    #[must_use]
    pub fn from_database(db: Database) -> Self {
        tracing::info!(
            collection = db.collection(),
            sync = db.is_sync_enabled(),
            "Opened libSQL log store"
        );
        Self {
            db,
            subscribers: Subscribers::default(),
        }
    }

    pub const fn is_sync_enabled(&self) -> bool {
        self.db.is_sync_enabled()
    }

    /// Pull remote changes (replicas only) and republish the collection.
    pub async fn refresh(&self) -> Result<()> {
        if let Err(error) = self.db.sync().await {
            tracing::warn!("Replica sync failed: {}", error);
            self.subscribers
                .publish(&FeedEvent::Error(error.to_string()));
            return Err(error);
        }
        self.publish_snapshot().await;
        Ok(())
    }

    /// Every record, newest first.
    pub async fn list(&self) -> Result<Vec<SleepRecord>> {
        self.repository().list_all().await
    }

    pub fn active_subscriptions(&self) -> usize {
        self.subscribers.active()
    }

    fn repository(&self) -> LibSqlSleepLogRepository<'_> {
        LibSqlSleepLogRepository::new(self.db.connection(), self.db.collection())
    }

    async fn snapshot_event(&self) -> FeedEvent {
        match self.list().await {
            Ok(records) => FeedEvent::Snapshot(records),
            Err(error) => {
                tracing::warn!("Failed to read snapshot: {}", error);
                FeedEvent::Error(error.to_string())
            }
        }
    }

    async fn publish_snapshot(&self) {
        let event = self.snapshot_event().await;
        let delivered = self.subscribers.publish(&event);
        tracing::debug!(subscribers = delivered, "Published libSQL snapshot");
    }

    /// Writes land on the primary for replicas; pull them back before publishing.
    async fn after_write(&self) {
        if let Err(error) = self.db.sync().await {
            tracing::warn!("Post-write sync failed: {}", error);
        }
        self.publish_snapshot().await;
    }
}

impl RemoteLogStore for LibSqlLogStore {
    async fn subscribe(&self) -> Result<Subscription> {
        let initial = self.snapshot_event().await;
        if let FeedEvent::Error(message) = &initial {
            return Err(crate::Error::Database(message.clone()));
        }
        Ok(self.subscribers.register(Some(initial)))
    }

    async fn append(&self, draft: &RecordDraft) -> Result<RecordId> {
        let id = self.repository().insert(draft).await?;
        tracing::debug!(%id, "Appended record");
        self.after_write().await;
        Ok(id)
    }

    async fn delete(&self, id: &RecordId) -> Result<()> {
        self.repository().delete(id).await?;
        tracing::debug!(%id, "Deleted record");
        self.after_write().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::RecordLocale;
    use crate::models::SpouseLabel;
    use tempfile::tempdir;

    fn draft(timestamp: i64) -> RecordDraft {
        let at = chrono::DateTime::from_timestamp_millis(timestamp).unwrap();
        RecordDraft::at(&at, "uid", SpouseLabel::SpouseA, RecordLocale::ZhTw).unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn writes_are_pushed_to_subscribers() {
        let store = LibSqlLogStore::open_in_memory("sleep_logs").await.unwrap();
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

    #[tokio::test(flavor = "multi_thread")]
    async fn local_refresh_republishes_current_state() {
        let store = LibSqlLogStore::open_in_memory("sleep_logs").await.unwrap();
        store.append(&draft(1_000)).await.unwrap();

        let mut feed = store.subscribe().await.unwrap();
        let initial = feed.next().await;
        store.refresh().await.unwrap();
        assert_eq!(feed.next().await, initial);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn records_persist_across_reopen() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("goodnight.db");
        let id = {
            let store = LibSqlLogStore::open(&path, "sleep_logs").await.unwrap();
            store.append(&draft(1_000)).await.unwrap()
        };

        let reopened = LibSqlLogStore::open(&path, "sleep_logs").await.unwrap();
        let records = reopened.list().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, id);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn dropped_subscriptions_are_released() {
        let store = LibSqlLogStore::open_in_memory("sleep_logs").await.unwrap();
        let feed = store.subscribe().await.unwrap();
        assert_eq!(store.active_subscriptions(), 1);
        drop(feed);
        assert_eq!(store.active_subscriptions(), 0);
    }
}
