//! Journal entry domain model.
//!
//! # Responsibility
//! - Define the dated entry record and its storage shape.
//! - Build and validate entry keys (`YYYY-MM-DD[-<unix-ms>]`).
//!
//! # Invariants
//! - `created_at` is assigned once at first write and never changes.
//! - `updated_at` is refreshed on every write.
//! - An entry key always carries a valid calendar date.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Title assigned when a write does not provide one.
pub const DEFAULT_ENTRY_TITLE: &str = "Journal Entry";

const DATE_FORMAT: &str = "%Y-%m-%d";

static ENTRY_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{4}-\d{2}-\d{2})(?:-(\d{1,16}))?$").expect("valid entry key regex")
});

/// Entry key validation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKeyError {
    /// Input does not match `YYYY-MM-DD` or `YYYY-MM-DD-<unix-ms>`.
    Malformed(String),
    /// Shape is right but the date does not exist (e.g. `2024-02-30`).
    InvalidDate(String),
}

impl Display for EntryKeyError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(value) => write!(
                f,
                "entry key `{value}` must be `YYYY-MM-DD` or `YYYY-MM-DD-<unix-ms>`"
            ),
            Self::InvalidDate(value) => write!(f, "entry key `{value}` has an invalid date"),
        }
    }
}

impl Error for EntryKeyError {}

/// Identity of one journal entry.
///
/// Ordered by calendar date, then by supplementary timestamp (primary entry
/// first), so map iteration is chronological.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryKey {
    date: NaiveDate,
    supplementary_ms: Option<i64>,
    raw: String,
}

impl EntryKey {
    /// Key of the primary entry for `date`.
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            date,
            supplementary_ms: None,
            raw: date.format(DATE_FORMAT).to_string(),
        }
    }

    /// Key of a same-day supplementary entry created at `epoch_ms`.
    pub fn supplementary(date: NaiveDate, epoch_ms: i64) -> Self {
        Self {
            date,
            supplementary_ms: Some(epoch_ms),
            raw: format!("{}-{epoch_ms}", date.format(DATE_FORMAT)),
        }
    }

    /// Parses a stored or user-provided key.
    pub fn parse(value: &str) -> Result<Self, EntryKeyError> {
        let trimmed = value.trim();
        let caps = ENTRY_KEY_RE
            .captures(trimmed)
            .ok_or_else(|| EntryKeyError::Malformed(value.to_string()))?;

        let date_text = caps.get(1).map_or("", |m| m.as_str());
        let date = NaiveDate::parse_from_str(date_text, DATE_FORMAT)
            .map_err(|_| EntryKeyError::InvalidDate(value.to_string()))?;

        let supplementary_ms = match caps.get(2) {
            Some(m) => Some(
                m.as_str()
                    .parse::<i64>()
                    .map_err(|_| EntryKeyError::Malformed(value.to_string()))?,
            ),
            None => None,
        };

        Ok(Self {
            date,
            supplementary_ms,
            raw: trimmed.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Calendar date this entry belongs to.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Creation timestamp suffix for supplementary entries.
    pub fn supplementary_ms(&self) -> Option<i64> {
        self.supplementary_ms
    }

    pub fn is_primary(&self) -> bool {
        self.supplementary_ms.is_none()
    }

    /// Stable timestamp derived from the key alone: the supplementary suffix
    /// when present, otherwise midnight UTC of the entry date.
    pub fn implied_timestamp(&self) -> DateTime<Utc> {
        self.supplementary_ms
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .unwrap_or_else(|| self.date.and_time(NaiveTime::default()).and_utc())
    }
}

impl Display for EntryKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for EntryKey {
    type Err = EntryKeyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for EntryKey {
    type Error = EntryKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EntryKey> for String {
    fn from(value: EntryKey) -> Self {
        value.raw
    }
}

/// One dated journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub text: String,
    #[serde(default = "default_title")]
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JournalEntry {
    /// Creates a first-write entry with `created_at == updated_at == now`.
    pub fn new(text: impl Into<String>, title: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            title: title.unwrap_or_else(default_title),
            created_at: now,
            updated_at: now,
        }
    }

    /// Entries with empty text are kept in storage but hidden from lists.
    pub fn is_listable(&self) -> bool {
        !self.text.is_empty()
    }
}

fn default_title() -> String {
    DEFAULT_ENTRY_TITLE.to_string()
}

/// Persisted value shape for one entry.
///
/// Older installs stored the entry text directly under the date key; both
/// shapes are accepted on load.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StoredEntry {
    Full(JournalEntry),
    Legacy(String),
}

impl StoredEntry {
    /// Upgrades a stored value under `key` to the full entry shape.
    ///
    /// Legacy values have no timestamps; both come from the key, so repeated
    /// loads agree on `created_at`.
    pub fn into_entry(self, key: &EntryKey) -> JournalEntry {
        match self {
            Self::Full(entry) => entry,
            Self::Legacy(text) => JournalEntry::new(text, None, key.implied_timestamp()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EntryKey, EntryKeyError, JournalEntry, StoredEntry, DEFAULT_ENTRY_TITLE};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    #[test]
    fn primary_and_supplementary_keys_format_as_expected() {
        assert_eq!(EntryKey::for_date(date(2024, 1, 5)).as_str(), "2024-01-05");
        let extra = EntryKey::supplementary(date(2024, 1, 5), 1_704_450_000_123);
        assert_eq!(extra.as_str(), "2024-01-05-1704450000123");
        assert!(!extra.is_primary());
    }

    #[test]
    fn parse_accepts_both_shapes() {
        let primary = EntryKey::parse("2024-01-15").unwrap();
        assert!(primary.is_primary());
        assert_eq!(primary.date(), date(2024, 1, 15));

        let extra = EntryKey::parse("2024-01-15-1705312800000").unwrap();
        assert_eq!(extra.supplementary_ms(), Some(1_705_312_800_000));
        assert_eq!(extra.date(), date(2024, 1, 15));
    }

    #[test]
    fn parse_rejects_malformed_and_impossible_dates() {
        assert!(matches!(
            EntryKey::parse("15/01/2024"),
            Err(EntryKeyError::Malformed(_))
        ));
        assert!(matches!(
            EntryKey::parse("2024-02-30"),
            Err(EntryKeyError::InvalidDate(_))
        ));
    }

    #[test]
    fn keys_order_by_date_then_supplementary_suffix() {
        let mut keys = vec![
            EntryKey::parse("2024-01-16").unwrap(),
            EntryKey::parse("2024-01-15-200").unwrap(),
            EntryKey::parse("2024-01-15").unwrap(),
            EntryKey::parse("2024-01-15-100").unwrap(),
        ];
        keys.sort();
        let raw: Vec<&str> = keys.iter().map(EntryKey::as_str).collect();
        assert_eq!(
            raw,
            vec!["2024-01-15", "2024-01-15-100", "2024-01-15-200", "2024-01-16"]
        );
    }

    #[test]
    fn entry_json_uses_camel_case_and_defaults_title() {
        let json = r#"{"text":"hi","createdAt":"2024-01-15T08:00:00Z","updatedAt":"2024-01-15T09:00:00Z"}"#;
        let entry: JournalEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.title, DEFAULT_ENTRY_TITLE);

        let out = serde_json::to_value(&entry).unwrap();
        assert!(out.get("createdAt").is_some());
        assert!(out.get("updatedAt").is_some());
    }

    #[test]
    fn legacy_plain_text_value_upgrades_to_full_entry() {
        let stored: StoredEntry = serde_json::from_str("\"old text\"").unwrap();
        let entry = stored.into_entry(&EntryKey::parse("2024-03-01").unwrap());
        let midnight = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(entry.text, "old text");
        assert_eq!(entry.title, DEFAULT_ENTRY_TITLE);
        assert_eq!(entry.created_at, midnight);
        assert_eq!(entry.updated_at, midnight);
    }

    #[test]
    fn implied_timestamp_prefers_supplementary_suffix() {
        let extra = EntryKey::parse("2024-01-15-1705312800000").unwrap();
        assert_eq!(
            extra.implied_timestamp(),
            Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap()
        );
    }
}
