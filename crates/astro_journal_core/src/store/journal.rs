//! Journal state container.
//!
//! # Responsibility
//! - Hold the date-keyed entries mapping and the selected sign.
//! - Apply journal transitions as pure, synchronous state changes.
//! - Provide read selectors used by UI-facing layers.
//!
//! # Invariants
//! - Transitions never fail.
//! - `created_at` of an existing entry is never modified.

use crate::model::journal::{EntryKey, JournalEntry};
use crate::model::zodiac::ZodiacSign;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;

/// Journal transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalAction {
    /// Create or replace one entry's text (and optionally title).
    UpsertEntry {
        key: EntryKey,
        text: String,
        title: Option<String>,
    },
    DeleteEntry { key: EntryKey },
    SetSelectedSign(ZodiacSign),
    /// Replace all entries with the durable copy; `None` resets to empty.
    Hydrate(Option<BTreeMap<EntryKey, JournalEntry>>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JournalState {
    pub entries: BTreeMap<EntryKey, JournalEntry>,
    pub selected_sign: ZodiacSign,
}

impl JournalState {
    pub fn reduce(&mut self, action: JournalAction, now: DateTime<Utc>) {
        match action {
            JournalAction::UpsertEntry { key, text, title } => {
                self.upsert_entry(key, text, title, now)
            }
            JournalAction::DeleteEntry { key } => self.delete_entry(&key),
            JournalAction::SetSelectedSign(sign) => self.set_selected_sign(sign),
            JournalAction::Hydrate(entries) => self.hydrate(entries),
        }
    }

    /// Creates or updates one entry.
    ///
    /// An existing title is only replaced when `title` is provided.
    pub fn upsert_entry(
        &mut self,
        key: EntryKey,
        text: String,
        title: Option<String>,
        now: DateTime<Utc>,
    ) {
        match self.entries.get_mut(&key) {
            Some(entry) => {
                entry.text = text;
                if let Some(title) = title {
                    entry.title = title;
                }
                entry.updated_at = now;
            }
            None => {
                self.entries.insert(key, JournalEntry::new(text, title, now));
            }
        }
    }

    pub fn delete_entry(&mut self, key: &EntryKey) {
        self.entries.remove(key);
    }

    pub fn set_selected_sign(&mut self, sign: ZodiacSign) {
        self.selected_sign = sign;
    }

    pub fn hydrate(&mut self, entries: Option<BTreeMap<EntryKey, JournalEntry>>) {
        self.entries = entries.unwrap_or_default();
    }
}

/// Text of the entry under `key`, or `""` when absent.
pub fn select_journal_entry<'a>(state: &'a JournalState, key: &EntryKey) -> &'a str {
    state
        .entries
        .get(key)
        .map_or("", |entry| entry.text.as_str())
}

/// Full entry under `key`.
pub fn select_journal_entry_full<'a>(
    state: &'a JournalState,
    key: &EntryKey,
) -> Option<&'a JournalEntry> {
    state.entries.get(key)
}

/// Text of the primary entry for `today`, or `""`.
pub fn select_today_journal_entry(state: &JournalState, today: NaiveDate) -> &str {
    select_journal_entry(state, &EntryKey::for_date(today))
}

pub fn select_selected_sign(state: &JournalState) -> ZodiacSign {
    state.selected_sign
}

/// Entries shown in list views: non-empty text only, newest key first.
pub fn select_listed_entries(state: &JournalState) -> Vec<(&EntryKey, &JournalEntry)> {
    state
        .entries
        .iter()
        .rev()
        .filter(|(_, entry)| entry.is_listable())
        .collect()
}

/// Key for the next entry written on `today`.
///
/// The primary key is reused while today's primary entry is missing or
/// empty; otherwise a supplementary key stamped with `now` is returned.
pub fn next_entry_key(state: &JournalState, today: NaiveDate, now: DateTime<Utc>) -> EntryKey {
    let primary = EntryKey::for_date(today);
    match state.entries.get(&primary) {
        Some(entry) if entry.is_listable() => {
            EntryKey::supplementary(today, now.timestamp_millis())
        }
        _ => primary,
    }
}
