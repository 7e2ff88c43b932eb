//! Database connection management

use crate::error::{Error, Result};
use crate::util::is_valid_collection_name;
use libsql::{Builder, Connection, Database as LibSqlDatabase};
use std::path::Path;
use std::time::Duration;

use super::migrations;

/// Configuration for Turso embedded-replica sync
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    /// Remote database URL (e.g., `libsql://your-db.turso.io`)
    pub url: Option<String>,
    /// Authentication token for remote database
    pub auth_token: Option<String>,
    /// Automatic sync interval (default: 60 seconds)
    pub sync_interval: Option<Duration>,
}

impl SyncConfig {
    /// Create a new sync configuration
    pub fn new(url: impl Into<String>, auth_token: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            auth_token: Some(auth_token.into()),
            sync_interval: Some(Duration::from_secs(60)),
        }
    }

    /// Check if sync is configured
    pub const fn is_configured(&self) -> bool {
        self.url.is_some() && self.auth_token.is_some()
    }
}

/// Database wrapper for libSQL connections holding one log collection
pub struct Database {
    db: LibSqlDatabase,
    conn: Connection,
    collection: String,
    sync_config: Option<SyncConfig>,
}

impl Database {
    /// Open a local-only database at the given path, creating it if it doesn't exist
    ///
    /// Runs migrations automatically.
    pub async fn open(path: impl AsRef<Path>, collection: &str) -> Result<Self> {
        let collection = validate_collection(collection)?;
        let path_str = path.as_ref().to_string_lossy().to_string();
        let db = Builder::new_local(&path_str).build().await?;
        let conn = db.connect()?;

        let database = Self {
            db,
            conn,
            collection,
            sync_config: None,
        };
        database.configure().await;
        database.migrate().await?;
        Ok(database)
    }

    /// Open an in-memory database (useful for testing)
    pub async fn open_in_memory(collection: &str) -> Result<Self> {
        let collection = validate_collection(collection)?;
        let db = Builder::new_local(":memory:").build().await?;
        let conn = db.connect()?;

        let database = Self {
            db,
            conn,
            collection,
            sync_config: None,
        };
        database.configure().await;
        database.migrate().await?;
        Ok(database)
    }

    /// Open a database with embedded replica (syncs with remote Turso database)
    ///
    /// Reads are served from the local file, writes go to the remote primary
    /// and come back on the next sync.
    pub async fn open_with_sync(
        local_path: impl AsRef<Path>,
        collection: &str,
        sync_config: SyncConfig,
    ) -> Result<Self> {
        let collection = validate_collection(collection)?;
        let path_str = local_path.as_ref().to_string_lossy().to_string();

        let url = sync_config
            .url
            .as_ref()
            .ok_or_else(|| Error::InvalidInput("Sync URL is required".into()))?;
        let token = sync_config
            .auth_token
            .as_ref()
            .ok_or_else(|| Error::InvalidInput("Auth token is required".into()))?;

        let mut builder = Builder::new_remote_replica(&path_str, url.clone(), token.clone());

        if let Some(interval) = sync_config.sync_interval {
            builder = builder.sync_interval(interval);
            tracing::debug!("Automatic sync interval set to {:?}", interval);
        }

        let db = builder.build().await?;
        let conn = db.connect()?;

        let database = Self {
            db,
            conn,
            collection,
            sync_config: Some(sync_config),
        };

        // Pull the remote schema before migrating so an existing log is reused.
        tracing::debug!("Performing initial sync...");
        database.sync().await?;

        database.configure().await;
        database.migrate().await?;

        Ok(database)
    }

    async fn configure(&self) {
        // Remote replicas reject some pragmas; those failures are ignored.
        self.conn
            .execute("PRAGMA journal_mode = WAL;", ())
            .await
            .ok();
        self.conn
            .execute("PRAGMA synchronous = NORMAL;", ())
            .await
            .ok();
    }

    async fn migrate(&self) -> Result<()> {
        migrations::run(&self.conn, &self.collection).await
    }

    /// Sync with remote database (if configured)
    ///
    /// For embedded replicas, this pulls changes from the remote database.
    pub async fn sync(&self) -> Result<()> {
        if self.sync_config.is_some() {
            self.db.sync().await?;
            tracing::debug!("Database synced with remote");
        }
        Ok(())
    }

    /// Check if sync is configured
    pub const fn is_sync_enabled(&self) -> bool {
        self.sync_config.is_some()
    }

    /// Name of the table holding the log
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Get a reference to the underlying connection
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn validate_collection(collection: &str) -> Result<String> {
    let collection = collection.trim();
    if is_valid_collection_name(collection) {
        Ok(collection.to_string())
    } else {
        Err(Error::InvalidInput(format!(
            "Collection name '{collection}' must be lowercase letters, digits, or underscores"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::tempdir;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_open_in_memory() {
        let db = Database::open_in_memory("sleep_logs").await.unwrap();
        assert!(!db.is_sync_enabled());
        assert_eq!(db.collection(), "sleep_logs");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_open_rejects_invalid_collection() {
        assert!(Database::open_in_memory("sleep-logs; --").await.is_err());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_open_file_twice_reuses_schema() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("goodnight.db");
        drop(Database::open(&path, "sleep_logs").await.unwrap());
        let reopened = Database::open(&path, "sleep_logs").await.unwrap();
        assert_eq!(reopened.collection(), "sleep_logs");
    }

    #[test]
    fn test_sync_config_new() {
        let config = SyncConfig::new("libsql://test.turso.io", "test-token");
        assert!(config.is_configured());
        assert_eq!(config.url, Some("libsql://test.turso.io".to_string()));
        assert_eq!(config.sync_interval, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_sync_config_default_not_configured() {
        let config = SyncConfig::default();
        assert!(!config.is_configured());
    }

    /// Only runs when Turso credentials are present:
    /// TURSO_DATABASE_URL=... TURSO_AUTH_TOKEN=... cargo test test_sync_with_turso -- --ignored
    #[tokio::test(flavor = "multi_thread")]
    #[ignore = "Requires TURSO_DATABASE_URL and TURSO_AUTH_TOKEN"]
    async fn test_sync_with_turso() {
        let url = env::var("TURSO_DATABASE_URL").expect("TURSO_DATABASE_URL must be set");
        let token = env::var("TURSO_AUTH_TOKEN").expect("TURSO_AUTH_TOKEN must be set");

        let tmp = tempdir().unwrap();
        let db_path = tmp.path().join("test_sync.db");

        let db = Database::open_with_sync(&db_path, "sleep_logs", SyncConfig::new(url, token))
            .await
            .unwrap();
        assert!(db.is_sync_enabled());
        db.sync().await.expect("Sync should succeed");
    }
}
