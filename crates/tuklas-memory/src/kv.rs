//! String-valued key-value substrate.
//!
//! # Storage layout
//!
//! [`SqliteKvStore`] keeps every key in a single table `kv_store`, created
//! if it does not already exist:
//!
//! | column | type | description                         |
//! |--------|------|-------------------------------------|
//! | key    | TEXT | Primary key, e.g. `"@discoveries"`  |
//! | value  | TEXT | Whole document stored under the key |
//!
//! # Example
//!
//! ```rust
//! use tuklas_memory::kv::{KeyValueStore, SqliteKvStore};
//!
//! let kv = SqliteKvStore::open_in_memory().unwrap();
//! kv.set("@tuklasPoints", "30").unwrap();
//! assert_eq!(kv.get("@tuklasPoints").unwrap().as_deref(), Some("30"));
//! ```

use std::collections::HashMap;
use std::sync::Mutex;

use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Error type
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can arise from key-value operations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Failed to encode value for {key}: {details}")]
    Encode { key: String, details: String },
    #[error("Store lock poisoned")]
    Poisoned,
}

// ─────────────────────────────────────────────────────────────────────────────
// Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A device-local store of string values addressed by string keys.
///
/// Writes replace the whole value; there are no partial updates and no
/// transactions spanning more than one key.
pub trait KeyValueStore: Send {
    /// Read the value under `key`, or `None` if the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the value under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key`. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// SqliteKvStore
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite-backed [`KeyValueStore`].
pub struct SqliteKvStore {
    conn: Connection,
}

impl SqliteKvStore {
    /// Open (or create) a persistent SQLite database at `path`.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Open a temporary in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key   TEXT NOT NULL PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }
}

impl KeyValueStore for SqliteKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv_store (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MemoryKvStore
// ─────────────────────────────────────────────────────────────────────────────

/// Process-local [`KeyValueStore`]; contents are lost on drop.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(kv: &dyn KeyValueStore) {
        assert_eq!(kv.get("@userLevel").unwrap(), None);

        kv.set("@userLevel", "College Innovator").unwrap();
        assert_eq!(kv.get("@userLevel").unwrap().as_deref(), Some("College Innovator"));

        kv.set("@userLevel", "Batang Kuryoso").unwrap();
        assert_eq!(kv.get("@userLevel").unwrap().as_deref(), Some("Batang Kuryoso"));

        kv.remove("@userLevel").unwrap();
        assert_eq!(kv.get("@userLevel").unwrap(), None);

        // removing twice is fine
        kv.remove("@userLevel").unwrap();
    }

    #[test]
    fn sqlite_store_get_set_remove() {
        exercise(&SqliteKvStore::open_in_memory().unwrap());
    }

    #[test]
    fn memory_store_get_set_remove() {
        exercise(&MemoryKvStore::new());
    }

    #[test]
    fn keys_are_independent() {
        let kv = SqliteKvStore::open_in_memory().unwrap();
        kv.set("@tuklasPoints", "10").unwrap();
        kv.set("@discoveries", "[]").unwrap();
        kv.remove("@discoveries").unwrap();
        assert_eq!(kv.get("@tuklasPoints").unwrap().as_deref(), Some("10"));
    }

    #[test]
    fn sqlite_store_persists_across_reopen() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("journal.sqlite");
        let path = path.to_string_lossy();

        {
            let kv = SqliteKvStore::open(&path).unwrap();
            kv.set("@tuklasPoints", "40").unwrap();
        }
        let kv = SqliteKvStore::open(&path).unwrap();
        assert_eq!(kv.get("@tuklasPoints").unwrap().as_deref(), Some("40"));
    }
}
