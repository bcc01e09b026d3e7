use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("store connection lock poisoned")]
    Poisoned,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable string key-value storage backing the persistent cache tier.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// SQLite-backed store. Reads and writes run on tokio's blocking pool so the
/// event loop keeps servicing input while the disk is busy.
pub struct SqliteStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    pub fn open_file(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_from_config(cfg: &Config) -> Result<Self, StorageError> {
        Self::open_file(&cfg.store_path)
    }

    pub fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS cache_entry (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_epoch_secs INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn len(&self) -> Result<usize, StorageError> {
        let db = self.db.lock().map_err(|_| StorageError::Poisoned)?;
        let count: i64 = db.query_row("SELECT COUNT(*) FROM cache_entry", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }

    async fn with_db<T, F>(&self, work: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StorageError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let conn = db.lock().map_err(|_| StorageError::Poisoned)?;
            work(&conn)
        })
        .await
        .map_err(|error| StorageError::Unavailable(format!("store worker failed: {error}")))?
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let key = key.to_string();
        self.with_db(move |db| {
            let value = db
                .query_row(
                    "SELECT value FROM cache_entry WHERE key = ?1",
                    params![key],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(value)
        })
        .await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let key = key.to_string();
        let value = value.to_string();
        self.with_db(move |db| {
            db.execute(
                "INSERT INTO cache_entry (key, value, updated_epoch_secs) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value=excluded.value,
                     updated_epoch_secs=excluded.updated_epoch_secs",
                params![key, value, now_epoch_secs()],
            )?;
            Ok(())
        })
        .await
    }
}

fn now_epoch_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
