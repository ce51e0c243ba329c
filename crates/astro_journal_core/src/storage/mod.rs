//! Persistent store adapter.
//!
//! # Responsibility
//! - Define the fallible key-value backend contract (`KeyValueStore`).
//! - Provide SQLite and in-memory backends.
//! - Wrap backends in `StorageService`, which owns JSON (de)serialization
//!   and converts every failure into a logged, benign result.
//!
//! # Invariants
//! - Only `StorageService` is used by store-level code; it never returns
//!   errors to its callers.
//! - Journal entries and the selected sign live under fixed keys.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod kv_store;
pub mod storage_service;

pub use kv_store::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};
pub use storage_service::{StorageService, JOURNAL_STORAGE_KEY, SELECTED_SIGN_KEY};

pub type StorageResult<T> = Result<T, StorageError>;

/// Failure raised by a key-value backend or by (de)serialization.
#[derive(Debug)]
pub enum StorageError {
    Db(DbError),
    Serialization(serde_json::Error),
    /// Backend cannot serve requests (closed, quota, injected failure).
    Unavailable(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "storage payload is not valid JSON: {err}"),
            Self::Unavailable(reason) => write!(f, "storage unavailable: {reason}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}
