//! Horoscope state container.
//!
//! # Responsibility
//! - Cache one horoscope record per sign.
//! - Track fetch status and last error separately for every sign.
//!
//! # Invariants
//! - A fulfilled fetch overwrites the sign's record and clears its error.
//! - A rejected fetch leaves the sign's record untouched.
//! - Transitions for one sign never change another sign's status.

use crate::model::horoscope::{HoroscopeData, HoroscopeRecord};
use crate::model::zodiac::ZodiacSign;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

/// Error text used when a rejection carries no reason.
pub const UNKNOWN_FETCH_ERROR: &str = "An unknown error occurred";

/// Records younger than this are served from cache.
pub const FRESHNESS_WINDOW_MS: i64 = 3_600_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

impl FetchStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

/// Status of the latest fetch for one sign.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestState {
    pub status: FetchStatus,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoroscopeAction {
    FetchPending(ZodiacSign),
    FetchFulfilled {
        sign: ZodiacSign,
        data: HoroscopeData,
    },
    FetchRejected {
        sign: ZodiacSign,
        reason: Option<String>,
    },
    ClearError(ZodiacSign),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HoroscopeState {
    pub data: BTreeMap<ZodiacSign, HoroscopeRecord>,
    pub requests: BTreeMap<ZodiacSign, RequestState>,
}

impl HoroscopeState {
    pub fn reduce(&mut self, action: HoroscopeAction, now: DateTime<Utc>) {
        match action {
            HoroscopeAction::FetchPending(sign) => {
                let request = self.requests.entry(sign).or_default();
                request.status = FetchStatus::Loading;
                request.error = None;
            }
            HoroscopeAction::FetchFulfilled { sign, data } => {
                self.data.insert(sign, HoroscopeRecord::new(data, now));
                let request = self.requests.entry(sign).or_default();
                request.status = FetchStatus::Succeeded;
                request.error = None;
            }
            HoroscopeAction::FetchRejected { sign, reason } => {
                let request = self.requests.entry(sign).or_default();
                request.status = FetchStatus::Failed;
                request.error = Some(
                    reason
                        .filter(|value| !value.trim().is_empty())
                        .unwrap_or_else(|| UNKNOWN_FETCH_ERROR.to_string()),
                );
            }
            HoroscopeAction::ClearError(sign) => {
                if let Some(request) = self.requests.get_mut(&sign) {
                    request.error = None;
                }
            }
        }
    }

    pub fn record(&self, sign: ZodiacSign) -> Option<&HoroscopeRecord> {
        self.data.get(&sign)
    }

    pub fn status(&self, sign: ZodiacSign) -> FetchStatus {
        self.requests
            .get(&sign)
            .map_or(FetchStatus::Idle, |request| request.status)
    }

    pub fn error(&self, sign: ZodiacSign) -> Option<&str> {
        self.requests
            .get(&sign)
            .and_then(|request| request.error.as_deref())
    }

    /// Whether `sign` needs a (re)fetch at `now`.
    pub fn needs_fetch(&self, sign: ZodiacSign, now: DateTime<Utc>) -> bool {
        self.needs_fetch_within(sign, now, default_freshness_window())
    }

    /// Whether `sign` needs a (re)fetch at `now` given a freshness `window`.
    pub fn needs_fetch_within(
        &self,
        sign: ZodiacSign,
        now: DateTime<Utc>,
        window: Duration,
    ) -> bool {
        !self
            .record(sign)
            .is_some_and(|record| record.age(now) < window)
    }
}

pub fn default_freshness_window() -> Duration {
    Duration::milliseconds(FRESHNESS_WINDOW_MS)
}

/// A record is fresh while its age is below the one-hour window.
pub fn is_fresh(record: &HoroscopeRecord, now: DateTime<Utc>) -> bool {
    record.age(now) < default_freshness_window()
}
