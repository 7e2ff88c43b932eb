//! Database migrations
//!
//! The collection name is interpolated into DDL, so callers must pass a name
//! that already passed `is_valid_collection_name`.

use crate::error::Result;
use libsql::Connection;

/// Current schema version
const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations for `collection`
pub async fn run(conn: &Connection, collection: &str) -> Result<()> {
    ensure_version_table(conn).await?;
    let version = get_version(conn, collection).await?;

    if version < 1 {
        migrate_v1(conn, collection).await?;
    }
    if version < 2 {
        migrate_v2(conn, collection).await?;
    }

    tracing::debug!(collection, version = CURRENT_VERSION, "Schema up to date");
    Ok(())
}

async fn ensure_version_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            collection TEXT NOT NULL,
            version INTEGER NOT NULL,
            PRIMARY KEY (collection, version)
        )",
        (),
    )
    .await?;
    Ok(())
}

/// Get the current schema version of one collection
async fn get_version(conn: &Connection, collection: &str) -> Result<i32> {
    let mut rows = conn
        .query(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version WHERE collection = ?",
            [collection],
        )
        .await?;

    let version: i32 = if let Some(row) = rows.next().await? {
        row.get(0)?
    } else {
        0
    };

    Ok(version)
}

/// Migration to version 1: the log table
async fn migrate_v1(conn: &Connection, collection: &str) -> Result<()> {
    // libsql doesn't have execute_batch, so each statement runs separately
    // inside one transaction.
    conn.execute("BEGIN TRANSACTION", ()).await?;

    let statements = [
        format!(
            "CREATE TABLE IF NOT EXISTS {collection} (
                id TEXT PRIMARY KEY,
                timestamp INTEGER NOT NULL,
                date_string TEXT NOT NULL,
                time_string TEXT NOT NULL,
                user_id TEXT NOT NULL
            )"
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS idx_{collection}_timestamp ON {collection}(timestamp DESC)"
        ),
    ];

    for statement in &statements {
        if let Err(error) = conn.execute(statement.as_str(), ()).await {
            conn.execute("ROLLBACK", ()).await.ok();
            return Err(error.into());
        }
    }

    record_version(conn, collection, 1).await?;
    conn.execute("COMMIT", ()).await?;
    Ok(())
}

/// Migration to version 2: display label per record
///
/// Rows written before labels existed keep a NULL `user_name`.
async fn migrate_v2(conn: &Connection, collection: &str) -> Result<()> {
    conn.execute("BEGIN TRANSACTION", ()).await?;

    let statement = format!("ALTER TABLE {collection} ADD COLUMN user_name TEXT");
    if let Err(error) = conn.execute(statement.as_str(), ()).await {
        conn.execute("ROLLBACK", ()).await.ok();
        return Err(error.into());
    }

    record_version(conn, collection, 2).await?;
    conn.execute("COMMIT", ()).await?;
    Ok(())
}

async fn record_version(conn: &Connection, collection: &str, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (collection, version) VALUES (?, ?)",
        libsql::params![collection, version],
    )
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use libsql::Builder;

    async fn connect() -> Connection {
        let db = Builder::new_local(":memory:").build().await.unwrap();
        db.connect().unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn migrations_reach_current_version() {
        let conn = connect().await;
        run(&conn, "sleep_logs").await.unwrap();
        assert_eq!(get_version(&conn, "sleep_logs").await.unwrap(), CURRENT_VERSION);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn migrations_are_idempotent() {
        let conn = connect().await;
        run(&conn, "sleep_logs").await.unwrap();
        run(&conn, "sleep_logs").await.unwrap();
        assert_eq!(get_version(&conn, "sleep_logs").await.unwrap(), CURRENT_VERSION);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn collections_are_versioned_independently() {
        let conn = connect().await;
        run(&conn, "sleep_logs").await.unwrap();
        assert_eq!(get_version(&conn, "nap_logs").await.unwrap(), 0);
        run(&conn, "nap_logs").await.unwrap();
        assert_eq!(get_version(&conn, "nap_logs").await.unwrap(), CURRENT_VERSION);
    }
}
