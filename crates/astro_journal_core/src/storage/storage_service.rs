//! Journal-aware facade over a key-value backend.
//!
//! # Responsibility
//! - Read/write the journal entries mapping and the selected sign.
//! - Catch, log and absorb every backend or JSON failure.
//!
//! # Invariants
//! - No method returns an error: reads degrade to `None`, writes to a no-op.
//! - Entries are always written as one JSON object (whole-map snapshot).

use super::kv_store::KeyValueStore;
use super::{StorageError, StorageResult};
use crate::model::journal::{EntryKey, JournalEntry, StoredEntry};
use crate::model::zodiac::ZodiacSign;
use log::{debug, error, warn};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Storage key of the serialized entries mapping.
pub const JOURNAL_STORAGE_KEY: &str = "@astro_journal_entries";
/// Storage key of the selected sign identifier.
pub const SELECTED_SIGN_KEY: &str = "@astro_selected_sign";

/// Cheaply cloneable handle shared by the hydrator and the persistence
/// writer.
#[derive(Clone)]
pub struct StorageService {
    backend: Arc<dyn KeyValueStore>,
}

impl StorageService {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Reads a raw value; failures are logged and read as `None`.
    pub fn get(&self, key: &str) -> Option<String> {
        match self.backend.get_item(key) {
            Ok(value) => value,
            Err(err) => {
                log_failure("storage_get", key, &err);
                None
            }
        }
    }

    /// Writes a raw value. Returns whether the write landed.
    pub fn set(&self, key: &str, value: &str) -> bool {
        match self.backend.set_item(key, value) {
            Ok(()) => {
                debug!(
                    "event=storage_set module=storage status=ok key={} bytes={}",
                    key,
                    value.len()
                );
                true
            }
            Err(err) => {
                log_failure("storage_set", key, &err);
                false
            }
        }
    }

    /// Removes several keys at once. Returns whether the removal landed.
    pub fn remove(&self, keys: &[&str]) -> bool {
        match self.backend.remove_items(keys) {
            Ok(()) => true,
            Err(err) => {
                log_failure("storage_remove", &keys.join(","), &err);
                false
            }
        }
    }

    /// Serializes and stores the whole entries mapping.
    pub fn save_journal_entries(&self, entries: &BTreeMap<EntryKey, JournalEntry>) -> bool {
        match serde_json::to_string(entries) {
            Ok(json) => self.set(JOURNAL_STORAGE_KEY, &json),
            Err(err) => {
                log_failure("storage_save_entries", JOURNAL_STORAGE_KEY, &err.into());
                false
            }
        }
    }

    /// Loads the stored entries mapping.
    ///
    /// Returns `None` when nothing is stored or the payload is unreadable.
    /// Legacy plain-text values are upgraded with timestamps implied by
    /// their key; keys that are not valid entry keys are skipped.
    pub fn load_journal_entries(&self) -> Option<BTreeMap<EntryKey, JournalEntry>> {
        let json = self.get(JOURNAL_STORAGE_KEY)?;
        match decode_entries(&json) {
            Ok(entries) => Some(entries),
            Err(err) => {
                log_failure("storage_load_entries", JOURNAL_STORAGE_KEY, &err);
                None
            }
        }
    }

    pub fn save_selected_sign(&self, sign: ZodiacSign) -> bool {
        self.set(SELECTED_SIGN_KEY, sign.as_str())
    }

    /// Loads the selected sign; unknown identifiers read as `None`.
    pub fn load_selected_sign(&self) -> Option<ZodiacSign> {
        let raw = self.get(SELECTED_SIGN_KEY)?;
        match raw.parse::<ZodiacSign>() {
            Ok(sign) => Some(sign),
            Err(err) => {
                warn!(
                    "event=storage_load_sign module=storage status=skip key={} error={}",
                    SELECTED_SIGN_KEY, err
                );
                None
            }
        }
    }

    /// Removes both journal records.
    pub fn clear_all_data(&self) -> bool {
        self.remove(&[JOURNAL_STORAGE_KEY, SELECTED_SIGN_KEY])
    }
}

fn decode_entries(json: &str) -> StorageResult<BTreeMap<EntryKey, JournalEntry>> {
    let raw: Option<BTreeMap<String, StoredEntry>> = serde_json::from_str(json)?;
    let mut entries = BTreeMap::new();
    for (key, stored) in raw.unwrap_or_default() {
        match EntryKey::parse(&key) {
            Ok(entry_key) => {
                let entry = stored.into_entry(&entry_key);
                entries.insert(entry_key, entry);
            }
            Err(err) => {
                warn!(
                    "event=storage_load_entries module=storage status=skip error={}",
                    err
                );
            }
        }
    }
    Ok(entries)
}

fn log_failure(event: &str, key: &str, err: &StorageError) {
    error!(
        "event={} module=storage status=error key={} error={}",
        event, key, err
    );
}
