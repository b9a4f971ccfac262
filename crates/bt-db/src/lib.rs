//! Storage layer for the browser time tracker.
//!
//! Persists the tracker state using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` can be moved into a `bt_core::Tracker`, which serializes all access
//! behind its own mutex. Separate processes serialize through a file lock held by
//! the caller.
//!
//! # Schema
//!
//! The state is a key-value table mirroring the browser's local storage:
//!
//! | key            | value                                   |
//! |----------------|-----------------------------------------|
//! | `currentEntry` | JSON object or `null`                   |
//! | `history`      | JSON array of `{url, title, duration}`  |
//!
//! `currentEntry.startTime` is milliseconds since the Unix epoch.
//!
//! ## Corrupt Values
//!
//! A value that fails to decode is logged and read as its empty default
//! (`null` / `[]`). The next write replaces it. Only failures of `SQLite`
//! itself are returned as errors.

use std::path::Path;

use bt_core::{HistoryEntry, OpenEntry, StateStore};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

const CURRENT_ENTRY_KEY: &str = "currentEntry";
const HISTORY_KEY: &str = "history";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failed to encode a value for storage.
    #[error("failed to encode {key}: {source}")]
    Encode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.conn.path())
            .finish()
    }
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- Tracker state: one row per storage key
            -- value: JSON, updated_at: ISO 8601 (e.g., '2024-01-15T10:30:00Z')
            CREATE TABLE IF NOT EXISTS state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Returns when `key` was last written, if ever.
    #[cfg(test)]
    fn updated_at(&self, key: &str) -> Result<Option<String>, DbError> {
        let updated = self
            .conn
            .query_row(
                "SELECT updated_at FROM state WHERE key = ?",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(updated)
    }

    fn get_raw(&self, key: &str) -> Result<Option<String>, DbError> {
        let value = self
            .conn
            .query_row("SELECT value FROM state WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Reads and decodes `key`, falling back to the default on bad JSON.
    fn get<T: DeserializeOwned + Default>(&self, key: &'static str) -> Result<T, DbError> {
        let Some(raw) = self.get_raw(key)? else {
            return Ok(T::default());
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(err) => {
                tracing::warn!(key, error = %err, "corrupt stored value; using default");
                Ok(T::default())
            }
        }
    }

    fn put<T: Serialize + ?Sized>(
        conn: &Connection,
        key: &'static str,
        value: &T,
        now: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let json = serde_json::to_string(value).map_err(|source| DbError::Encode { key, source })?;
        conn.execute(
            "
            INSERT INTO state (key, value, updated_at) VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
            params![key, json, format_timestamp(now)],
        )?;
        Ok(())
    }

    /// Writes raw JSON for `key` without validation.
    #[cfg(test)]
    fn put_raw(&self, key: &str, value: &str) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO state (key, value, updated_at) VALUES (?, ?, ?)",
            params![key, value, format_timestamp(Utc::now())],
        )?;
        Ok(())
    }
}

impl StateStore for Database {
    type Error = DbError;

    fn current_entry(&self) -> Result<Option<OpenEntry>, DbError> {
        self.get(CURRENT_ENTRY_KEY)
    }

    fn history(&self) -> Result<Vec<HistoryEntry>, DbError> {
        self.get(HISTORY_KEY)
    }

    fn set_current_entry(&mut self, entry: Option<&OpenEntry>) -> Result<(), DbError> {
        Self::put(&self.conn, CURRENT_ENTRY_KEY, &entry, Utc::now())
    }

    fn set_history(&mut self, history: &[HistoryEntry]) -> Result<(), DbError> {
        Self::put(&self.conn, HISTORY_KEY, history, Utc::now())
    }

    /// Writes both keys in one transaction.
    fn save(&mut self, history: &[HistoryEntry], entry: Option<&OpenEntry>) -> Result<(), DbError> {
        let now = Utc::now();
        let tx = self.conn.transaction()?;
        Self::put(&tx, HISTORY_KEY, history, now)?;
        Self::put(&tx, CURRENT_ENTRY_KEY, &entry, now)?;
        tx.commit()?;
        Ok(())
    }
}

/// Formats a timestamp for storage.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
