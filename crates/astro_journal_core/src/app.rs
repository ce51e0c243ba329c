//! Application wiring: one store, its persistence writer and the horoscope
//! service, started and hydrated together.
//!
//! # Responsibility
//! - Open the durable backend and hydrate the store before first use.
//! - Route writes through the store so persistence observes them.
//! - Expose the use cases the FFI and CLI surfaces need.
//!
//! # Invariants
//! - `start*` returns only after hydration has run.
//! - `shutdown` drains queued writes; later writes are not persisted.

use crate::clock::{Clock, SystemClock};
use crate::config::CoreConfig;
use crate::editor::EntryEditor;
use crate::model::horoscope::HoroscopeRecord;
use crate::model::journal::{EntryKey, JournalEntry};
use crate::model::zodiac::ZodiacSign;
use crate::service::horoscope_client::{AztroClient, HoroscopeSource};
use crate::service::horoscope_service::{FetchOutcome, HoroscopeService};
use crate::storage::{KeyValueStore, SqliteKeyValueStore, StorageError, StorageService};
use crate::store::horoscope::RequestState;
use crate::store::hydration::{hydrate_store, HydrationReport};
use crate::store::journal::JournalAction;
use crate::store::persistence::{PersistenceStats, PersistenceSync};
use crate::store::{Store, Transition};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tokio::runtime::Handle;

#[derive(Debug)]
pub enum AppError {
    Storage(StorageError),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "failed to open journal storage: {err}"),
        }
    }
}

impl Error for AppError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<StorageError> for AppError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Horoscope lookup result handed to presentation layers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoroscopeLookup {
    pub sign: ZodiacSign,
    pub outcome: FetchOutcome,
    pub record: Option<HoroscopeRecord>,
    pub request: RequestState,
}

pub struct AstroJournal {
    config: CoreConfig,
    store: Arc<Store>,
    storage: StorageService,
    persistence: Arc<PersistenceSync>,
    horoscopes: HoroscopeService,
    hydration: HydrationReport,
    runtime: Handle,
}

impl AstroJournal {
    /// Opens the SQLite database named by `config` and starts the app on the
    /// current tokio runtime.
    pub async fn start(config: CoreConfig) -> Result<Self, AppError> {
        let backend = SqliteKeyValueStore::open(&config.db_path)?;
        let source = AztroClient::new(config.horoscope_endpoint.clone());
        let clock = Arc::new(SystemClock);
        Ok(Self::start_with(config, Arc::new(backend), Arc::new(source), clock).await)
    }

    /// Starts the app over explicit collaborators.
    pub async fn start_with(
        config: CoreConfig,
        backend: Arc<dyn KeyValueStore>,
        source: Arc<dyn HoroscopeSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let runtime = Handle::current();
        let storage = StorageService::new(backend);
        let persistence = PersistenceSync::spawn(&runtime, storage.clone());
        let store = Arc::new(Store::new(clock.clone()).with_observer(persistence.clone()));
        let horoscopes = HoroscopeService::new(source, clock)
            .with_fallback(config.fallback_enabled)
            .with_freshness(config.freshness_window);

        let hydration = hydrate_store(&store, &storage).await;
        info!(
            "event=app_ready module=app status=ok fallback={} db_path={}",
            config.fallback_enabled,
            config.db_path.display()
        );

        Self {
            config,
            store,
            storage,
            persistence,
            horoscopes,
            hydration,
            runtime,
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn hydration(&self) -> &HydrationReport {
        &self.hydration
    }

    pub fn save_entry(
        &self,
        key: EntryKey,
        text: impl Into<String>,
        title: Option<String>,
    ) -> Transition {
        self.store.dispatch(JournalAction::UpsertEntry {
            key,
            text: text.into(),
            title,
        })
    }

    pub fn delete_entry(&self, key: EntryKey) -> Transition {
        self.store.dispatch(JournalAction::DeleteEntry { key })
    }

    pub fn entry(&self, key: &EntryKey) -> Option<JournalEntry> {
        self.store.journal_entry_full(key)
    }

    pub fn set_selected_sign(&self, sign: ZodiacSign) -> Transition {
        self.store.dispatch(JournalAction::SetSelectedSign(sign))
    }

    /// Opens a debounced editor on `key`.
    ///
    /// Save timers run on the runtime the app was started on, so this may be
    /// called from threads outside it.
    pub fn open_editor(&self, key: EntryKey, title: Option<String>) -> EntryEditor {
        let editor = EntryEditor::open(self.store.clone(), key, self.runtime.clone())
            .with_debounce(self.config.autosave_debounce);
        match title {
            Some(title) => editor.with_title(title),
            None => editor,
        }
    }

    /// Returns the cached reading for `sign`, fetching it first when stale.
    pub async fn horoscope(&self, sign: ZodiacSign) -> HoroscopeLookup {
        let outcome = self.horoscopes.request(&self.store, sign).await;
        let (record, request) = self.store.with_state(|state| {
            (
                state.horoscope.record(sign).cloned(),
                RequestState {
                    status: state.horoscope.status(sign),
                    error: state.horoscope.error(sign).map(str::to_string),
                },
            )
        });
        HoroscopeLookup {
            sign,
            outcome,
            record,
            request,
        }
    }

    /// Waits for queued writes, then removes every stored record.
    ///
    /// In-memory state is left as is; it is gone from storage on the next
    /// start.
    pub async fn clear_all_data(&self) -> bool {
        self.persistence.flush().await;
        let storage = self.storage.clone();
        tokio::task::spawn_blocking(move || storage.clear_all_data())
            .await
            .unwrap_or(false)
    }

    pub async fn flush(&self) {
        self.persistence.flush().await;
    }

    pub fn persistence_stats(&self) -> PersistenceStats {
        self.persistence.stats()
    }

    pub async fn shutdown(&self) {
        self.persistence.shutdown().await;
    }
}
