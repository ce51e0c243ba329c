//! Editing helpers that sit between a presentation layer and the store.

pub mod autosave;

pub use autosave::{EntryEditor, AUTOSAVE_DEBOUNCE};
