//! Horoscope domain model.
//!
//! # Invariants
//! - At most one record is kept per sign; a newer fetch replaces it whole.
//! - Every field is a plain string; missing remote fields become `""`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Daily horoscope content for one sign.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoroscopeData {
    pub description: String,
    pub compatibility: String,
    pub mood: String,
    pub color: String,
    pub lucky_number: String,
    pub lucky_time: String,
    pub date_range: String,
    pub current_date: String,
}

/// Horoscope content plus the moment it was stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoroscopeRecord {
    #[serde(flatten)]
    pub data: HoroscopeData,
    #[serde(rename = "fetchedAt")]
    pub fetched_at: DateTime<Utc>,
}

impl HoroscopeRecord {
    pub fn new(data: HoroscopeData, fetched_at: DateTime<Utc>) -> Self {
        Self { data, fetched_at }
    }

    /// Age of this record at `now`. Negative when the clock moved backwards.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.fetched_at
    }
}
