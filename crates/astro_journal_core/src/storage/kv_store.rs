//! Key-value backends.
//!
//! # Invariants
//! - `set_item` fully replaces the previous value for a key.
//! - `remove_items` is atomic per call and ignores absent keys.

use super::{StorageError, StorageResult};
use crate::db::{open_db, open_db_in_memory};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Durable string key-value store. All operations may fail.
pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> StorageResult<()>;
    fn remove_items(&self, keys: &[&str]) -> StorageResult<()>;
}

/// SQLite-backed store over the `kv_store` table.
pub struct SqliteKeyValueStore {
    conn: Mutex<Connection>,
}

impl SqliteKeyValueStore {
    /// Opens (or creates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps a connection that already has migrations applied.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn()
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.conn().execute(
            "INSERT INTO kv_store (key, value, updated_at)
             VALUES (?1, ?2, CAST(strftime('%s', 'now') AS INTEGER) * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove_items(&self, keys: &[&str]) -> StorageResult<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        for key in keys {
            tx.execute("DELETE FROM kv_store WHERE key = ?1;", [*key])?;
        }
        tx.commit()?;
        Ok(())
    }
}

/// Process-local store. Contents are lost when dropped.
///
/// Can be switched into an unavailable state where every call fails, which
/// mirrors a storage backend that went away mid-session.
#[derive(Default)]
pub struct MemoryKeyValueStore {
    items: Mutex<BTreeMap<String, String>>,
    unavailable: AtomicBool,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    fn items(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_available(&self) -> StorageResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(
                "memory store marked unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        self.ensure_available()?;
        Ok(self.items().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.ensure_available()?;
        self.items().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_items(&self, keys: &[&str]) -> StorageResult<()> {
        self.ensure_available()?;
        let mut items = self.items();
        for key in keys {
            items.remove(*key);
        }
        Ok(())
    }
}
