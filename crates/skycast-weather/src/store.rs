//! Local key-value persistence for the preferred city and unit preferences.
//!
//! `SqliteKeyValueStore` implements the synchronous `KeyValueBackend` trait;
//! `KeyValueStore` is the cloneable async handle the pipeline uses, running
//! backend calls on the blocking thread pool.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::{WeatherError, WeatherResult};

/// Key holding the last selected city name
pub const CITY_KEY: &str = "city";

/// Synchronous string key-value storage.
///
/// A missing key is `Ok(None)`, never an error.
pub trait KeyValueBackend: Send {
    fn get(&self, key: &str) -> rusqlite::Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> rusqlite::Result<()>;
}

/// SQLite-based key-value storage.
pub struct SqliteKeyValueStore {
    conn: Connection,
}

impl SqliteKeyValueStore {
    /// Open (or create) a store at the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> rusqlite::Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
    }
}

impl KeyValueBackend for SqliteKeyValueStore {
    fn get(&self, key: &str) -> rusqlite::Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()
    }

    fn set(&self, key: &str, value: &str) -> rusqlite::Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

/// Async handle over a key-value backend.
#[derive(Clone)]
pub struct KeyValueStore {
    backend: Arc<Mutex<dyn KeyValueBackend>>,
}

impl KeyValueStore {
    pub fn new<B: KeyValueBackend + 'static>(backend: B) -> Self {
        Self {
            backend: Arc::new(Mutex::new(backend)),
        }
    }

    /// Open the SQLite store at `path`.
    ///
    /// # Errors
    /// Returns `WeatherError::StoreUnavailable` if the database cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> WeatherResult<Self> {
        let store = SqliteKeyValueStore::new(path)
            .map_err(|e| WeatherError::store_unavailable("*", e))?;
        Ok(Self::new(store))
    }

    /// Fresh in-memory store.
    ///
    /// # Errors
    /// Returns `WeatherError::StoreUnavailable` if SQLite cannot allocate it.
    pub fn in_memory() -> WeatherResult<Self> {
        let store =
            SqliteKeyValueStore::in_memory().map_err(|e| WeatherError::store_unavailable("*", e))?;
        Ok(Self::new(store))
    }

    /// Read a value; `None` when the key was never set.
    pub async fn get(&self, key: &str) -> WeatherResult<Option<String>> {
        let backend = self.backend.clone();
        let owned_key = key.to_string();
        let result = tokio::task::spawn_blocking(move || backend.lock().get(&owned_key)).await;

        match result {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                tracing::error!("Failed to read '{}' from store: {}", key, e);
                Err(WeatherError::store_unavailable(key, e))
            }
            Err(e) => {
                tracing::error!("Store read task for '{}' failed: {}", key, e);
                Err(WeatherError::store_unavailable(key, e))
            }
        }
    }

    /// Write a value, replacing any previous one.
    pub async fn set(&self, key: &str, value: &str) -> WeatherResult<()> {
        let backend = self.backend.clone();
        let owned_key = key.to_string();
        let owned_value = value.to_string();
        let result =
            tokio::task::spawn_blocking(move || backend.lock().set(&owned_key, &owned_value)).await;

        match result {
            Ok(Ok(())) => {
                tracing::debug!("Stored '{}'", key);
                Ok(())
            }
            Ok(Err(e)) => {
                tracing::error!("Failed to write '{}' to store: {}", key, e);
                Err(WeatherError::store_unavailable(key, e))
            }
            Err(e) => {
                tracing::error!("Store write task for '{}' failed: {}", key, e);
                Err(WeatherError::store_unavailable(key, e))
            }
        }
    }
}
