//! Core domain logic for Astro Journal.
//! This crate is the single source of truth for journal and horoscope
//! invariants; the FFI and CLI crates are thin surfaces over it.

pub mod app;
pub mod clock;
pub mod config;
pub mod db;
pub mod editor;
pub mod logging;
pub mod model;
pub mod service;
pub mod storage;
pub mod store;

pub use app::{AppError, AstroJournal, HoroscopeLookup};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, CoreConfig};
pub use editor::{EntryEditor, AUTOSAVE_DEBOUNCE};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::horoscope::{HoroscopeData, HoroscopeRecord};
pub use model::journal::{EntryKey, EntryKeyError, JournalEntry, DEFAULT_ENTRY_TITLE};
pub use model::zodiac::{ParseZodiacSignError, ZodiacSign};
pub use service::horoscope_client::{AztroClient, HoroscopeSource, SourceError};
pub use service::horoscope_service::{FetchOutcome, HoroscopeService};
pub use storage::{
    KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore, StorageError, StorageService,
};
pub use store::horoscope::{FetchStatus, RequestState};
pub use store::journal::JournalAction;
pub use store::{Action, AppState, Store, StoreObserver, Transition};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
