//! Startup hydration from durable storage.
//!
//! # Responsibility
//! - Read stored entries and selected sign (two independent reads).
//! - Replay them into the store exactly once per process.
//!
//! # Invariants
//! - Read failures count as "no data"; hydration itself never fails.
//! - The entries replay always runs, so the lifecycle flag is set even on a
//!   fresh install.
//! - A stored sign is replayed after entries.

use super::journal::JournalAction;
use super::{Store, Transition};
use crate::model::zodiac::ZodiacSign;
use crate::storage::StorageService;
use log::{error, info};
use std::time::Instant;

/// What a hydration run found and applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HydrationReport {
    /// Number of stored entries, `None` when nothing was stored.
    pub entries_loaded: Option<usize>,
    pub sign_loaded: Option<ZodiacSign>,
    /// `Refused` when the store was already hydrated.
    pub transition: Transition,
}

/// Loads durable journal data and replays it into `store`.
pub async fn hydrate_store(store: &Store, storage: &StorageService) -> HydrationReport {
    let started_at = Instant::now();
    info!("event=hydrate module=hydration status=start");

    let entries_storage = storage.clone();
    let sign_storage = storage.clone();
    let (entries, sign) = tokio::join!(
        tokio::task::spawn_blocking(move || entries_storage.load_journal_entries()),
        tokio::task::spawn_blocking(move || sign_storage.load_selected_sign()),
    );
    let entries = entries.unwrap_or_else(|err| {
        error!(
            "event=hydrate module=hydration status=error record=entries error={}",
            err
        );
        None
    });
    let sign = sign.unwrap_or_else(|err| {
        error!(
            "event=hydrate module=hydration status=error record=sign error={}",
            err
        );
        None
    });

    let entries_loaded = entries.as_ref().map(|map| map.len());
    let transition = store.dispatch(JournalAction::Hydrate(entries));
    if transition == Transition::Applied {
        if let Some(sign) = sign {
            store.dispatch(JournalAction::SetSelectedSign(sign));
        }
    }

    info!(
        "event=hydrate module=hydration status={} duration_ms={} entries={} sign={}",
        if transition == Transition::Applied {
            "ok"
        } else {
            "skip"
        },
        started_at.elapsed().as_millis(),
        entries_loaded.map_or_else(|| "none".to_string(), |n| n.to_string()),
        sign.map_or("none", ZodiacSign::as_str)
    );

    HydrationReport {
        entries_loaded,
        sign_loaded: sign,
        transition,
    }
}
