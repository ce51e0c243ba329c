//! Time source abstraction.
//!
//! Store transitions stamp entries and horoscope records with the clock's
//! `now()`. "Today" is derived at call time and never cached, so a session
//! that crosses local midnight sees the date change.

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use std::sync::{Mutex, PoisonError};

/// Source of wall-clock time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Calendar date used for "today" entry keys.
    fn today(&self) -> NaiveDate;
}

/// Process wall clock; `today()` uses the local time zone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Manually driven clock. `today()` is the UTC date of `now()`.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, value: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = value;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, ManualClock};
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    #[test]
    fn manual_clock_advances_across_midnight() {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 15, 23, 59, 59).unwrap());
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());

        clock.advance(Duration::seconds(2));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 1, 16).unwrap());
    }
}
