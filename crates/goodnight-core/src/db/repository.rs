//! Sleep log repository implementation

use crate::error::Result;
use crate::models::{RecordDraft, RecordId, SleepRecord, SpouseLabel};
use libsql::{Connection, Row, Value};

/// Trait for sleep log storage operations (async)
#[allow(async_fn_in_trait)]
pub trait SleepLogRepository {
    /// Insert a record under a freshly generated id
    async fn insert(&self, draft: &RecordDraft) -> Result<RecordId>;

    /// Delete a record; missing ids are ignored
    async fn delete(&self, id: &RecordId) -> Result<()>;

    /// Every record in the collection, newest first
    async fn list_all(&self) -> Result<Vec<SleepRecord>>;
}

/// libSQL implementation of `SleepLogRepository`
pub struct LibSqlSleepLogRepository<'a> {
    conn: &'a Connection,
    collection: &'a str,
}

impl<'a> LibSqlSleepLogRepository<'a> {
    /// Create a repository over `collection`, which must already be migrated
    pub const fn new(conn: &'a Connection, collection: &'a str) -> Self {
        Self { conn, collection }
    }

    fn parse_record(row: &Row) -> Result<SleepRecord> {
        let id: String = row.get(0)?;
        let user_name = match row.get_value(5)? {
            Value::Text(label) => match label.parse::<SpouseLabel>() {
                Ok(label) => Some(label),
                Err(error) => {
                    tracing::warn!(record = %id, "Ignoring unknown label {:?}: {}", label, error);
                    None
                }
            },
            _ => None,
        };
        Ok(SleepRecord {
            id: id.parse()?,
            timestamp: row.get(1)?,
            date_string: row.get(2)?,
            time_string: row.get(3)?,
            user_id: row.get(4)?,
            user_name,
        })
    }
}

impl SleepLogRepository for LibSqlSleepLogRepository<'_> {
    async fn insert(&self, draft: &RecordDraft) -> Result<RecordId> {
        let id = RecordId::generate();
        let sql = format!(
            "INSERT INTO {} (id, timestamp, date_string, time_string, user_id, user_name)
             VALUES (?, ?, ?, ?, ?, ?)",
            self.collection
        );
        self.conn
            .execute(
                sql.as_str(),
                libsql::params![
                    id.as_str(),
                    draft.timestamp,
                    draft.date_string.as_str(),
                    draft.time_string.as_str(),
                    draft.user_id.as_str(),
                    draft.user_name.as_str()
                ],
            )
            .await?;
        Ok(id)
    }

    async fn delete(&self, id: &RecordId) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?", self.collection);
        self.conn.execute(sql.as_str(), [id.as_str()]).await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<SleepRecord>> {
        let sql = format!(
            "SELECT id, timestamp, date_string, time_string, user_id, user_name
             FROM {} ORDER BY timestamp DESC, id ASC",
            self.collection
        );
        let mut rows = self.conn.query(sql.as_str(), ()).await?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(Self::parse_record(&row)?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::format::RecordLocale;

    async fn setup() -> Database {
        Database::open_in_memory("sleep_logs").await.unwrap()
    }

    fn draft(timestamp: i64, label: SpouseLabel) -> RecordDraft {
        let at = chrono::DateTime::from_timestamp_millis(timestamp).unwrap();
        RecordDraft::at(&at, "uid", label, RecordLocale::ZhTw).unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_insert_and_list_newest_first() {
        let db = setup().await;
        let repo = LibSqlSleepLogRepository::new(db.connection(), db.collection());

        let older = repo.insert(&draft(1_000, SpouseLabel::SpouseA)).await.unwrap();
        let newer = repo.insert(&draft(2_000, SpouseLabel::SpouseB)).await.unwrap();

        let records = repo.list_all().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, newer);
        assert_eq!(records[0].user_name, Some(SpouseLabel::SpouseB));
        assert_eq!(records[1].id, older);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_delete_removes_only_target() {
        let db = setup().await;
        let repo = LibSqlSleepLogRepository::new(db.connection(), db.collection());

        let keep = repo.insert(&draft(1_000, SpouseLabel::SpouseA)).await.unwrap();
        let gone = repo.insert(&draft(1_500, SpouseLabel::SpouseA)).await.unwrap();
        repo.delete(&gone).await.unwrap();
        repo.delete(&gone).await.unwrap();

        let records = repo.list_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, keep);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unlabelled_rows_load_without_label() {
        let db = setup().await;
        db.connection()
            .execute(
                "INSERT INTO sleep_logs (id, timestamp, date_string, time_string, user_id)
                 VALUES ('legacy', 5, '2024/1/5', '下午11:30', 'uid')",
                (),
            )
            .await
            .unwrap();

        let repo = LibSqlSleepLogRepository::new(db.connection(), db.collection());
        let records = repo.list_all().await.unwrap();
        assert_eq!(records[0].user_name, None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unknown_label_loads_without_label() {
        let db = setup().await;
        db.connection()
            .execute(
                "INSERT INTO sleep_logs (id, timestamp, date_string, time_string, user_id, user_name)
                 VALUES ('odd', 5, '2024/1/5', '下午11:30', 'uid', 'spouse-C')",
                (),
            )
            .await
            .unwrap();

        let repo = LibSqlSleepLogRepository::new(db.connection(), db.collection());
        let records = repo.list_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].user_name, None);
    }
}
