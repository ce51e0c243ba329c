//! Horoscope fetch orchestration.
//!
//! # Responsibility
//! - Run the fallback chain: remote source, per-sign mock, generic reading.
//! - Gate store fetches behind the freshness window (one hour by default).
//! - Drive the per-sign fetch status machine in the store.
//!
//! # Invariants
//! - With fallback enabled, a fetch always yields data.
//! - With fallback disabled, a remote failure becomes a `failed` status
//!   carrying the error text.
//! - The freshness gate is a courtesy cache: concurrent requests issued
//!   before the first one lands may both reach the remote.

use super::horoscope_client::{HoroscopeSource, SourceError};
use super::horoscope_fallback::fallback_horoscope;
use crate::clock::Clock;
use crate::model::horoscope::HoroscopeData;
use crate::model::zodiac::ZodiacSign;
use crate::store::horoscope::{default_freshness_window, HoroscopeAction};
use crate::store::Store;
use log::{info, warn};
use std::sync::Arc;
use std::time::Instant;

/// What `HoroscopeService::request` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A fresh record was already cached; nothing was fetched.
    Cached,
    /// Data was fetched (remote or fallback) and stored.
    Fetched,
    /// Fetch failed and the sign's status is now `failed`.
    Failed,
}

pub struct HoroscopeService {
    source: Arc<dyn HoroscopeSource>,
    clock: Arc<dyn Clock>,
    fallback_enabled: bool,
    freshness: chrono::Duration,
}

impl HoroscopeService {
    pub fn new(source: Arc<dyn HoroscopeSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            clock,
            fallback_enabled: true,
            freshness: default_freshness_window(),
        }
    }

    /// Overrides how long a cached record skips `request` refetches.
    pub fn with_freshness(mut self, window: std::time::Duration) -> Self {
        self.freshness =
            chrono::Duration::from_std(window).unwrap_or_else(|_| chrono::Duration::max_value());
        self
    }

    /// Enables or disables the offline fallback for `request`.
    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback_enabled = enabled;
        self
    }

    pub fn fallback_enabled(&self) -> bool {
        self.fallback_enabled
    }

    /// Fetches today's reading for a raw sign identifier. Never fails.
    pub async fn fetch(&self, sign: &str) -> HoroscopeData {
        match self.fetch_remote(sign).await {
            Ok(data) => data,
            Err(_) => fallback_horoscope(sign, self.clock.today()),
        }
    }

    /// Fetches today's reading for `sign` and records it in `store`, unless
    /// the cached record is still fresh.
    pub async fn request(&self, store: &Store, sign: ZodiacSign) -> FetchOutcome {
        let now = store.clock().now();
        let stale = store.with_state(|state| {
            state
                .horoscope
                .needs_fetch_within(sign, now, self.freshness)
        });
        if !stale {
            info!(
                "event=horoscope_request module=service status=skip reason=fresh sign={}",
                sign
            );
            return FetchOutcome::Cached;
        }
        self.refresh(store, sign).await
    }

    /// Fetches and records `sign` regardless of cache age.
    pub async fn refresh(&self, store: &Store, sign: ZodiacSign) -> FetchOutcome {
        store.dispatch(HoroscopeAction::FetchPending(sign));

        let result = if self.fallback_enabled {
            Ok(self.fetch(sign.as_str()).await)
        } else {
            self.fetch_remote(sign.as_str()).await
        };

        match result {
            Ok(data) => {
                store.dispatch(HoroscopeAction::FetchFulfilled { sign, data });
                FetchOutcome::Fetched
            }
            Err(err) => {
                store.dispatch(HoroscopeAction::FetchRejected {
                    sign,
                    reason: Some(err.to_string()),
                });
                FetchOutcome::Failed
            }
        }
    }

    async fn fetch_remote(&self, sign: &str) -> Result<HoroscopeData, SourceError> {
        let started_at = Instant::now();
        let result = match self.source.fetch_today(sign).await {
            Ok(Some(data)) => Ok(data),
            Ok(None) => Err(SourceError::EmptyBody),
            Err(err) => Err(err),
        };
        match &result {
            Ok(_) => info!(
                "event=horoscope_fetch module=service status=ok source=remote sign={} duration_ms={}",
                sign,
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=horoscope_fetch module=service status=error source=remote sign={} duration_ms={} fallback={} error={}",
                sign,
                started_at.elapsed().as_millis(),
                self.fallback_enabled,
                err
            ),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::{FetchOutcome, HoroscopeService};
    use crate::clock::{Clock, ManualClock};
    use crate::model::horoscope::HoroscopeData;
    use crate::model::zodiac::ZodiacSign;
    use crate::service::horoscope_client::{HoroscopeSource, SourceError};
    use crate::service::horoscope_fallback::{generic_horoscope, mock_horoscope};
    use crate::store::horoscope::FetchStatus;
    use crate::store::Store;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    enum Reply {
        Data(&'static str),
        NoBody,
        Fail,
    }

    struct StubSource {
        reply: Reply,
        calls: AtomicUsize,
    }

    impl StubSource {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HoroscopeSource for StubSource {
        async fn fetch_today(&self, _sign: &str) -> Result<Option<HoroscopeData>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Reply::Data(description) => Ok(Some(HoroscopeData {
                    description: description.to_string(),
                    ..HoroscopeData::default()
                })),
                Reply::NoBody => Ok(None),
                Reply::Fail => Err(SourceError::Decode("stub failure".to_string())),
            }
        }
    }

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
        ))
    }

    #[tokio::test]
    async fn remote_data_wins_even_when_partial() {
        let service = HoroscopeService::new(StubSource::new(Reply::Data("remote")), clock());
        let data = service.fetch("aries").await;
        assert_eq!(data.description, "remote");
        assert_eq!(data.mood, "");
    }

    #[tokio::test]
    async fn remote_failure_falls_back_to_mock_entry() {
        let clock = clock();
        let service = HoroscopeService::new(StubSource::new(Reply::Fail), clock.clone());
        let data = service.fetch("taurus").await;
        assert_eq!(data, mock_horoscope(ZodiacSign::Taurus, clock.now().date_naive()));
    }

    #[tokio::test]
    async fn unknown_sign_without_body_gets_generic_reading() {
        let clock = clock();
        let service = HoroscopeService::new(StubSource::new(Reply::NoBody), clock.clone());
        let data = service.fetch("ophiuchus").await;
        assert_eq!(data, generic_horoscope(clock.now().date_naive()));
    }

    #[tokio::test]
    async fn request_respects_freshness_window() {
        let clock = clock();
        let source = StubSource::new(Reply::Data("fresh"));
        let service = HoroscopeService::new(source.clone(), clock.clone());
        let store = Store::new(clock.clone());

        assert_eq!(
            service.request(&store, ZodiacSign::Leo).await,
            FetchOutcome::Fetched
        );
        clock.advance(Duration::milliseconds(3_599_999));
        assert_eq!(
            service.request(&store, ZodiacSign::Leo).await,
            FetchOutcome::Cached
        );
        assert_eq!(source.calls(), 1);

        clock.advance(Duration::milliseconds(2));
        assert_eq!(
            service.request(&store, ZodiacSign::Leo).await,
            FetchOutcome::Fetched
        );
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn configured_freshness_window_shortens_cache() {
        let clock = clock();
        let source = StubSource::new(Reply::Data("fresh"));
        let service = HoroscopeService::new(source.clone(), clock.clone())
            .with_freshness(std::time::Duration::from_secs(60));
        let store = Store::new(clock.clone());

        service.request(&store, ZodiacSign::Leo).await;
        clock.advance(Duration::seconds(59));
        assert_eq!(
            service.request(&store, ZodiacSign::Leo).await,
            FetchOutcome::Cached
        );
        clock.advance(Duration::minutes(5));
        assert_eq!(
            service.request(&store, ZodiacSign::Leo).await,
            FetchOutcome::Fetched
        );
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn strict_mode_reports_failed_status() {
        let clock = clock();
        let service =
            HoroscopeService::new(StubSource::new(Reply::Fail), clock.clone()).with_fallback(false);
        let store = Store::new(clock);

        assert_eq!(
            service.request(&store, ZodiacSign::Virgo).await,
            FetchOutcome::Failed
        );
        store.with_state(|state| {
            assert_eq!(state.horoscope.status(ZodiacSign::Virgo), FetchStatus::Failed);
            assert!(state
                .horoscope
                .error(ZodiacSign::Virgo)
                .unwrap()
                .contains("stub failure"));
            assert!(state.horoscope.record(ZodiacSign::Virgo).is_none());
        });
    }

    #[tokio::test]
    async fn fallback_mode_stores_mock_data_as_success() {
        let clock = clock();
        let service = HoroscopeService::new(StubSource::new(Reply::Fail), clock.clone());
        let store = Store::new(clock);

        service.request(&store, ZodiacSign::Pisces).await;
        store.with_state(|state| {
            assert_eq!(
                state.horoscope.status(ZodiacSign::Pisces),
                FetchStatus::Succeeded
            );
            assert_eq!(
                state.horoscope.record(ZodiacSign::Pisces).unwrap().data.mood,
                "Dreamy"
            );
        });
    }
}
