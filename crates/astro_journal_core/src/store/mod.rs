//! Reducer-style application store.
//!
//! # Responsibility
//! - Own the journal, horoscope and lifecycle state for one process.
//! - Apply actions atomically and notify observers of applied transitions.
//! - Gate hydration so it can happen at most once.
//!
//! # Invariants
//! - State is only mutated through `Store::dispatch`.
//! - Observers run inside the dispatch critical section, so they see
//!   transitions in order. They must not dispatch.
//! - A second `Hydrate` is refused and leaves state untouched.

use crate::clock::Clock;
use crate::model::journal::{EntryKey, JournalEntry};
use crate::model::zodiac::ZodiacSign;
use log::{debug, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub mod horoscope;
pub mod hydration;
pub mod journal;
pub mod persistence;

use horoscope::{HoroscopeAction, HoroscopeState};
use journal::{JournalAction, JournalState};

/// Any transition the store accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Journal(JournalAction),
    Horoscope(HoroscopeAction),
}

impl Action {
    /// Stable `domain/name` label used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Journal(JournalAction::UpsertEntry { .. }) => "journal/upsert_entry",
            Self::Journal(JournalAction::DeleteEntry { .. }) => "journal/delete_entry",
            Self::Journal(JournalAction::SetSelectedSign(_)) => "journal/set_selected_sign",
            Self::Journal(JournalAction::Hydrate(_)) => "journal/hydrate",
            Self::Horoscope(HoroscopeAction::FetchPending(_)) => "horoscope/fetch_pending",
            Self::Horoscope(HoroscopeAction::FetchFulfilled { .. }) => "horoscope/fetch_fulfilled",
            Self::Horoscope(HoroscopeAction::FetchRejected { .. }) => "horoscope/fetch_rejected",
            Self::Horoscope(HoroscopeAction::ClearError(_)) => "horoscope/clear_error",
        }
    }
}

impl From<JournalAction> for Action {
    fn from(value: JournalAction) -> Self {
        Self::Journal(value)
    }
}

impl From<HoroscopeAction> for Action {
    fn from(value: HoroscopeAction) -> Self {
        Self::Horoscope(value)
    }
}

/// Process-wide lifecycle flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleState {
    pub hydrated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub journal: JournalState,
    pub horoscope: HoroscopeState,
    pub lifecycle: LifecycleState,
}

/// Result of one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    /// The action was rejected by a lifecycle gate; state is unchanged.
    Refused,
}

/// Hook invoked after every applied transition.
pub trait StoreObserver: Send + Sync {
    fn on_transition(&self, action: &Action, state: &AppState);
}

pub struct Store {
    state: Mutex<AppState>,
    clock: Arc<dyn Clock>,
    observers: Vec<Arc<dyn StoreObserver>>,
}

impl Store {
    /// Creates an empty, not yet hydrated store.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(AppState::default()),
            clock,
            observers: Vec::new(),
        }
    }

    /// Registers an observer. Observers are fixed once the store is shared.
    pub fn with_observer(mut self, observer: Arc<dyn StoreObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Applies one action synchronously.
    pub fn dispatch(&self, action: impl Into<Action>) -> Transition {
        let action = action.into();
        let now = self.clock.now();
        let mut state = self.lock();

        if let Action::Journal(JournalAction::Hydrate(_)) = &action {
            if state.lifecycle.hydrated {
                warn!(
                    "event=dispatch module=store status=skip action={} reason=already_hydrated",
                    action.name()
                );
                return Transition::Refused;
            }
            state.lifecycle.hydrated = true;
        }

        match action.clone() {
            Action::Journal(journal_action) => state.journal.reduce(journal_action, now),
            Action::Horoscope(horoscope_action) => state.horoscope.reduce(horoscope_action, now),
        }
        debug!(
            "event=dispatch module=store status=ok action={}",
            action.name()
        );

        for observer in &self.observers {
            observer.on_transition(&action, &*state);
        }
        Transition::Applied
    }

    /// Runs a read-only closure against the current state.
    pub fn with_state<T>(&self, read: impl FnOnce(&AppState) -> T) -> T {
        let state = self.lock();
        read(&*state)
    }

    pub fn snapshot(&self) -> AppState {
        self.lock().clone()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn is_hydrated(&self) -> bool {
        self.with_state(|state| state.lifecycle.hydrated)
    }

    /// Text stored under `key`, or `""`.
    pub fn journal_entry(&self, key: &EntryKey) -> String {
        self.with_state(|state| journal::select_journal_entry(&state.journal, key).to_string())
    }

    pub fn journal_entry_full(&self, key: &EntryKey) -> Option<JournalEntry> {
        self.with_state(|state| journal::select_journal_entry_full(&state.journal, key).cloned())
    }

    /// Text of today's primary entry; "today" is read from the clock on
    /// every call.
    pub fn today_journal_entry(&self) -> String {
        let today = self.clock.today();
        self.with_state(|state| {
            journal::select_today_journal_entry(&state.journal, today).to_string()
        })
    }

    pub fn selected_sign(&self) -> ZodiacSign {
        self.with_state(|state| journal::select_selected_sign(&state.journal))
    }

    /// Owned copy of the list view (non-empty entries, newest first).
    pub fn listed_entries(&self) -> Vec<(EntryKey, JournalEntry)> {
        self.with_state(|state| {
            journal::select_listed_entries(&state.journal)
                .into_iter()
                .map(|(key, entry)| (key.clone(), entry.clone()))
                .collect()
        })
    }

    /// Key for a new entry written now.
    pub fn next_entry_key(&self) -> EntryKey {
        let today = self.clock.today();
        let now = self.clock.now();
        self.with_state(|state| journal::next_entry_key(&state.journal, today, now))
    }

    fn lock(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
