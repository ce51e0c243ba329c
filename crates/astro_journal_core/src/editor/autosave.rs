//! Debounced auto-save for one journal entry.
//!
//! # Responsibility
//! - Hold the draft text of the entry being edited.
//! - Save the draft once typing has paused for the debounce window.
//!
//! # Invariants
//! - At most one save timer is pending; every text change restarts it.
//! - A fired timer saves the draft as it was at the last change.
//! - Closing (or dropping) the editor cancels the timer without saving;
//!   callers that want a final save call `save_now` first.

use crate::model::journal::EntryKey;
use crate::store::journal::JournalAction;
use crate::store::Store;
use log::debug;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Idle time after the last change before the draft is saved.
pub const AUTOSAVE_DEBOUNCE: Duration = Duration::from_millis(1000);

#[derive(Default)]
struct EditorState {
    draft: String,
    pending: Option<JoinHandle<()>>,
}

pub struct EntryEditor {
    store: Arc<Store>,
    key: EntryKey,
    title: Option<String>,
    debounce: Duration,
    runtime: Handle,
    state: Mutex<EditorState>,
}

impl EntryEditor {
    /// Opens an editor on `key`, seeded with the stored text.
    pub fn open(store: Arc<Store>, key: EntryKey, runtime: Handle) -> Self {
        let draft = store.journal_entry(&key);
        Self {
            store,
            key,
            title: None,
            debounce: AUTOSAVE_DEBOUNCE,
            runtime,
            state: Mutex::new(EditorState {
                draft,
                pending: None,
            }),
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Title written with every save from this editor.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn key(&self) -> &EntryKey {
        &self.key
    }

    pub fn draft(&self) -> String {
        self.state().draft.clone()
    }

    /// Whether the draft differs from what the store holds.
    pub fn has_unsaved_changes(&self) -> bool {
        self.state().draft != self.store.journal_entry(&self.key)
    }

    /// Replaces the draft and restarts the save timer.
    pub fn set_text(&self, text: impl Into<String>) {
        let text = text.into();
        let mut state = self.state();
        if let Some(previous) = state.pending.take() {
            previous.abort();
        }
        state.draft = text.clone();

        let store = self.store.clone();
        let action = self.save_action(text);
        let debounce = self.debounce;
        state.pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(debounce).await;
            debug!("event=autosave module=editor status=fire");
            store.dispatch(action);
        }));
    }

    /// Cancels any pending timer and saves the draft immediately.
    pub fn save_now(&self) {
        let action = {
            let mut state = self.state();
            cancel_pending(&mut state);
            self.save_action(state.draft.clone())
        };
        self.store.dispatch(action);
    }

    /// Cancels any pending timer without saving.
    pub fn close(self) {
        drop(self);
    }

    fn save_action(&self, text: String) -> JournalAction {
        JournalAction::UpsertEntry {
            key: self.key.clone(),
            text,
            title: self.title.clone(),
        }
    }

    fn state(&self) -> MutexGuard<'_, EditorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for EntryEditor {
    fn drop(&mut self) {
        cancel_pending(&mut self.state());
    }
}

fn cancel_pending(state: &mut EditorState) {
    if let Some(pending) = state.pending.take() {
        pending.abort();
    }
}
