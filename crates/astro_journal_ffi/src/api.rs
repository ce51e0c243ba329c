//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose journal, sign and horoscope use cases to Dart via FRB.
//! - Own the process-wide app instance and its tokio runtime.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call before `init_app` succeeds degrades to an empty value or a
//!   failure envelope.
//! - Raw strings become `EntryKey` / `ZodiacSign` here and nowhere later.

use astro_journal_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AstroJournal, CoreConfig, EntryEditor, EntryKey, FetchOutcome, FetchStatus, HoroscopeLookup,
    JournalEntry, ZodiacSign,
};
use log::{error, info};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};
use tokio::runtime::Runtime;

static APP: OnceLock<FfiApp> = OnceLock::new();
/// Serializes first-time initialization so only one app is ever started.
static INIT_LOCK: Mutex<()> = Mutex::new(());

struct FfiApp {
    runtime: Runtime,
    journal: AstroJournal,
    editors: Mutex<HashMap<EntryKey, EntryEditor>>,
}

impl FfiApp {
    fn editors(&self) -> MutexGuard<'_, HashMap<EntryKey, EntryEditor>> {
        self.editors.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Sync call; may perform small file-system setup work.
/// - Idempotent for the same `level + log_dir`.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Opens the journal database and hydrates state.
///
/// Input semantics:
/// - `db_path`: database file path; empty means `ASTRO_JOURNAL_DB_PATH` or
///   the temp-dir default.
///
/// # FFI contract
/// - Sync call; blocks until hydration finishes.
/// - Repeating the call with the same resolved path is a no-op.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_app(db_path: String) -> String {
    let config = match resolve_config(&db_path) {
        Ok(config) => config,
        Err(err) => return err,
    };
    if let Some(app) = APP.get() {
        return same_db_or_error(app, &config.db_path);
    }
    let _init = INIT_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(app) = APP.get() {
        return same_db_or_error(app, &config.db_path);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("astro-journal")
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            error!(
                "event=init_app module=ffi status=error reason=runtime error={}",
                err
            );
            return format!("init_app failed: {err}");
        }
    };
    let journal = match runtime.block_on(AstroJournal::start(config)) {
        Ok(journal) => journal,
        Err(err) => {
            error!("event=init_app module=ffi status=error error={}", err);
            return format!("init_app failed: {err}");
        }
    };

    let app = FfiApp {
        runtime,
        journal,
        editors: Mutex::new(HashMap::new()),
    };
    if APP.set(app).is_err() {
        error!("event=init_app module=ffi status=error reason=already_set");
        return "init_app failed: app was initialized concurrently".to_string();
    }
    info!("event=init_app module=ffi status=ok");
    String::new()
}

/// One journal entry as seen by Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntryItem {
    /// Entry key (`YYYY-MM-DD` or `YYYY-MM-DD-<epoch ms>`).
    pub key: String,
    pub title: String,
    pub text: String,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

/// Generic action response envelope for journal commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Entry key the action applied to, when there is one.
    pub key: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl EntryActionResponse {
    fn success(message: impl Into<String>, key: Option<String>) -> Self {
        Self {
            ok: true,
            key,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            key: None,
            message: message.into(),
        }
    }
}

/// Horoscope reading plus the sign's fetch status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoroscopeView {
    pub ok: bool,
    pub sign: String,
    /// `idle|loading|succeeded|failed`.
    pub status: String,
    pub error: Option<String>,
    pub description: String,
    pub compatibility: String,
    pub mood: String,
    pub color: String,
    pub lucky_number: String,
    pub lucky_time: String,
    pub date_range: String,
    pub current_date: String,
    pub fetched_at_ms: Option<i64>,
    pub message: String,
}

impl HoroscopeView {
    fn failure(sign: String, message: impl Into<String>) -> Self {
        Self {
            ok: false,
            sign,
            status: FetchStatus::Idle.as_str().to_string(),
            error: None,
            description: String::new(),
            compatibility: String::new(),
            mood: String::new(),
            color: String::new(),
            lucky_number: String::new(),
            lucky_time: String::new(),
            date_range: String::new(),
            current_date: String::new(),
            fetched_at_ms: None,
            message: message.into(),
        }
    }
}

/// Creates or updates the entry under `key`.
///
/// # FFI contract
/// - Sync call; the durable write happens in the background.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn journal_save_entry(
    key: String,
    text: String,
    title: Option<String>,
) -> EntryActionResponse {
    let app = match app() {
        Ok(app) => app,
        Err(err) => return EntryActionResponse::failure(err),
    };
    let key = match parse_key(&key) {
        Ok(key) => key,
        Err(err) => return EntryActionResponse::failure(err),
    };
    let title = title
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    app.journal.save_entry(key.clone(), text, title);
    EntryActionResponse::success("Entry saved.", Some(key.to_string()))
}

/// Removes the entry under `key`; absent keys succeed.
#[flutter_rust_bridge::frb(sync)]
pub fn journal_delete_entry(key: String) -> EntryActionResponse {
    let app = match app() {
        Ok(app) => app,
        Err(err) => return EntryActionResponse::failure(err),
    };
    let key = match parse_key(&key) {
        Ok(key) => key,
        Err(err) => return EntryActionResponse::failure(err),
    };
    app.journal.delete_entry(key.clone());
    EntryActionResponse::success("Entry deleted.", Some(key.to_string()))
}

/// Returns the entry under `key`, or `None` when absent or invalid.
#[flutter_rust_bridge::frb(sync)]
pub fn journal_get_entry(key: String) -> Option<JournalEntryItem> {
    let app = app().ok()?;
    let key = parse_key(&key).ok()?;
    app.journal
        .entry(&key)
        .map(|entry| to_entry_item(&key, &entry))
}

/// Text of today's entry, or empty.
#[flutter_rust_bridge::frb(sync)]
pub fn journal_today_entry() -> String {
    app()
        .map(|app| app.journal.store().today_journal_entry())
        .unwrap_or_default()
}

/// Non-empty entries, newest first.
#[flutter_rust_bridge::frb(sync)]
pub fn journal_list_entries() -> Vec<JournalEntryItem> {
    match app() {
        Ok(app) => app
            .journal
            .store()
            .listed_entries()
            .iter()
            .map(|(key, entry)| to_entry_item(key, entry))
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Key a new entry written now should use; empty before `init_app`.
#[flutter_rust_bridge::frb(sync)]
pub fn journal_next_entry_key() -> String {
    app()
        .map(|app| app.journal.store().next_entry_key().to_string())
        .unwrap_or_default()
}

/// Stores the user's sign (`aries` .. `pisces`, case-insensitive).
#[flutter_rust_bridge::frb(sync)]
pub fn set_selected_sign(sign: String) -> EntryActionResponse {
    let app = match app() {
        Ok(app) => app,
        Err(err) => return EntryActionResponse::failure(err),
    };
    match sign.parse::<ZodiacSign>() {
        Ok(sign) => {
            app.journal.set_selected_sign(sign);
            EntryActionResponse::success(format!("Sign set to {}.", sign.label()), None)
        }
        Err(err) => EntryActionResponse::failure(err.to_string()),
    }
}

/// Selected sign identifier (`aries` until one is chosen).
#[flutter_rust_bridge::frb(sync)]
pub fn selected_sign() -> String {
    app()
        .map(|app| app.journal.store().selected_sign())
        .unwrap_or_default()
        .as_str()
        .to_string()
}

/// Today's reading for `sign`, fetched when the cached one is stale.
///
/// # FFI contract
/// - Async from Dart's side: runs on the FRB worker pool, never the UI
///   thread, and blocks that worker on the remote call.
/// - Never panics.
pub fn horoscope_for_sign(sign: String) -> HoroscopeView {
    let app = match app() {
        Ok(app) => app,
        Err(err) => return HoroscopeView::failure(sign, err),
    };
    match sign.parse::<ZodiacSign>() {
        Ok(parsed) => {
            let lookup = app.runtime.block_on(app.journal.horoscope(parsed));
            to_horoscope_view(lookup)
        }
        Err(err) => HoroscopeView::failure(sign, err.to_string()),
    }
}

/// Waits for pending writes, then deletes all stored journal data.
///
/// In-memory entries stay visible until the next launch.
pub fn clear_all_data() -> EntryActionResponse {
    let app = match app() {
        Ok(app) => app,
        Err(err) => return EntryActionResponse::failure(err),
    };
    if app.runtime.block_on(app.journal.clear_all_data()) {
        EntryActionResponse::success("All data cleared.", None)
    } else {
        EntryActionResponse::failure("clear_all_data failed: storage unavailable")
    }
}

/// Waits until every queued write has reached storage.
///
/// Call from the host's pause/detach lifecycle hook; writes are otherwise
/// asynchronous and may be lost if the process exits first.
pub fn flush_pending_writes() -> EntryActionResponse {
    let app = match app() {
        Ok(app) => app,
        Err(err) => return EntryActionResponse::failure(err),
    };
    app.runtime.block_on(app.journal.flush());
    let stats = app.journal.persistence_stats();
    info!(
        "event=flush module=ffi status=ok written={} failed={}",
        stats.written, stats.failed
    );
    EntryActionResponse::success("Pending writes flushed.", None)
}

/// Opens a debounced auto-save editor on `key`.
///
/// # FFI contract
/// - Sync call; text changes are saved one debounce window after the last
///   `editor_set_text`.
/// - Reopening an open key keeps the existing draft.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_open(key: String, title: Option<String>) -> EntryActionResponse {
    let (app, key) = match app_and_key(&key) {
        Ok(pair) => pair,
        Err(err) => return EntryActionResponse::failure(err),
    };
    let title = title
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    let mut editors = app.editors();
    if !editors.contains_key(&key) {
        let editor = app.journal.open_editor(key.clone(), title);
        editors.insert(key.clone(), editor);
    }
    EntryActionResponse::success("Editor opened.", Some(key.to_string()))
}

/// Replaces the draft of an open editor and restarts its save timer.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_set_text(key: String, text: String) -> EntryActionResponse {
    with_editor(&key, |editor| {
        editor.set_text(text);
        "Draft updated."
    })
}

/// Saves an open editor's draft immediately.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_save_now(key: String) -> EntryActionResponse {
    with_editor(&key, |editor| {
        editor.save_now();
        "Draft saved."
    })
}

/// Current draft of an open editor; empty when not open.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_draft(key: String) -> String {
    let Ok((app, key)) = app_and_key(&key) else {
        return String::new();
    };
    app.editors()
        .get(&key)
        .map(EntryEditor::draft)
        .unwrap_or_default()
}

/// Whether an open editor holds text the store has not saved yet.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_has_unsaved_changes(key: String) -> bool {
    let Ok((app, key)) = app_and_key(&key) else {
        return false;
    };
    app.editors()
        .get(&key)
        .is_some_and(EntryEditor::has_unsaved_changes)
}

/// Closes an editor, saving the draft first when `save` is set.
///
/// Closing without saving drops any pending timer.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_close(key: String, save: bool) -> EntryActionResponse {
    let (app, key) = match app_and_key(&key) {
        Ok(pair) => pair,
        Err(err) => return EntryActionResponse::failure(err),
    };
    let Some(editor) = app.editors().remove(&key) else {
        return EntryActionResponse::failure(format!("no editor open for {key}"));
    };
    if save {
        editor.save_now();
    }
    editor.close();
    EntryActionResponse::success("Editor closed.", Some(key.to_string()))
}

fn with_editor(
    raw_key: &str,
    op: impl FnOnce(&EntryEditor) -> &'static str,
) -> EntryActionResponse {
    let (app, key) = match app_and_key(raw_key) {
        Ok(pair) => pair,
        Err(err) => return EntryActionResponse::failure(err),
    };
    let editors = app.editors();
    match editors.get(&key) {
        Some(editor) => EntryActionResponse::success(op(editor), Some(key.to_string())),
        None => EntryActionResponse::failure(format!("no editor open for {key}")),
    }
}

fn app_and_key(raw_key: &str) -> Result<(&'static FfiApp, EntryKey), String> {
    Ok((app()?, parse_key(raw_key)?))
}

fn app() -> Result<&'static FfiApp, String> {
    APP.get()
        .ok_or_else(|| "app is not initialized; call init_app first".to_string())
}

fn resolve_config(db_path: &str) -> Result<CoreConfig, String> {
    let config = CoreConfig::from_env().map_err(|err| format!("init_app failed: {err}"))?;
    let trimmed = db_path.trim();
    if trimmed.is_empty() {
        return Ok(config);
    }
    Ok(config.with_db_path(PathBuf::from(trimmed)))
}

fn same_db_or_error(app: &FfiApp, requested: &Path) -> String {
    let active = &app.journal.config().db_path;
    if active.as_path() == requested {
        String::new()
    } else {
        format!(
            "app already initialized at `{}`; refusing to switch to `{}`",
            active.display(),
            requested.display()
        )
    }
}

fn parse_key(raw: &str) -> Result<EntryKey, String> {
    EntryKey::parse(raw.trim()).map_err(|err| err.to_string())
}

fn to_entry_item(key: &EntryKey, entry: &JournalEntry) -> JournalEntryItem {
    JournalEntryItem {
        key: key.to_string(),
        title: entry.title.clone(),
        text: entry.text.clone(),
        created_at_ms: entry.created_at.timestamp_millis(),
        updated_at_ms: entry.updated_at.timestamp_millis(),
    }
}

fn to_horoscope_view(lookup: HoroscopeLookup) -> HoroscopeView {
    let sign = lookup.sign.as_str().to_string();
    let status = lookup.request.status.as_str().to_string();
    let Some(record) = lookup.record else {
        let message = lookup
            .request
            .error
            .clone()
            .unwrap_or_else(|| "No reading available.".to_string());
        let mut view = HoroscopeView::failure(sign, message);
        view.status = status;
        view.error = lookup.request.error;
        return view;
    };

    let data = record.data;
    HoroscopeView {
        ok: true,
        sign,
        status,
        error: lookup.request.error,
        description: data.description,
        compatibility: data.compatibility,
        mood: data.mood,
        color: data.color,
        lucky_number: data.lucky_number,
        lucky_time: data.lucky_time,
        date_range: data.date_range,
        current_date: data.current_date,
        fetched_at_ms: Some(record.fetched_at.timestamp_millis()),
        message: match lookup.outcome {
            FetchOutcome::Cached => "Served from cache.".to_string(),
            FetchOutcome::Fetched => "Fetched.".to_string(),
            FetchOutcome::Failed => "Fetch failed.".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, editor_close, editor_draft, editor_has_unsaved_changes, editor_open,
        editor_save_now, editor_set_text, flush_pending_writes, horoscope_for_sign, init_app,
        init_logging, journal_delete_entry, journal_get_entry, journal_list_entries,
        journal_next_entry_key, journal_save_entry, ping, selected_sign, set_selected_sign,
    };
    use std::path::PathBuf;
    use std::sync::OnceLock;
    use std::thread;
    use std::time::Duration;

    static DB_PATH: OnceLock<PathBuf> = OnceLock::new();

    /// Initializes the shared app once for every test in this binary.
    fn ensure_app() -> &'static PathBuf {
        let path = DB_PATH.get_or_init(|| {
            // Connection refused immediately, so lookups take the offline path.
            std::env::set_var("ASTRO_JOURNAL_HOROSCOPE_URL", "http://127.0.0.1:9/");
            std::env::remove_var("ASTRO_JOURNAL_STRICT_FETCH");
            tempfile::tempdir().unwrap().into_path().join("ffi.db")
        });
        let error = init_app(path.to_str().unwrap().to_string());
        assert!(error.is_empty(), "{error}");
        path
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn init_app_is_idempotent_and_rejects_other_paths() {
        let path = ensure_app();
        assert!(init_app(path.to_str().unwrap().to_string()).is_empty());

        let other = init_app("/tmp/some-other-astro-journal.db".to_string());
        assert!(other.contains("refusing to switch"));
    }

    #[test]
    fn concurrent_init_calls_share_one_app() {
        let path = ensure_app().to_str().unwrap().to_string();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let path = path.clone();
                thread::spawn(move || init_app(path))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), "");
        }
    }

    #[test]
    fn editor_saves_on_demand_and_on_close() {
        ensure_app();
        let key = "2024-03-10".to_string();
        assert!(editor_open(key.clone(), Some("Sunday".to_string())).ok);
        assert!(editor_set_text(key.clone(), "first draft".to_string()).ok);
        assert_eq!(editor_draft(key.clone()), "first draft");
        assert!(editor_has_unsaved_changes(key.clone()));

        assert!(editor_save_now(key.clone()).ok);
        assert!(!editor_has_unsaved_changes(key.clone()));
        let entry = journal_get_entry(key.clone()).unwrap();
        assert_eq!(entry.text, "first draft");
        assert_eq!(entry.title, "Sunday");

        assert!(editor_set_text(key.clone(), "final".to_string()).ok);
        assert!(editor_close(key.clone(), true).ok);
        assert_eq!(journal_get_entry(key.clone()).unwrap().text, "final");
        assert!(!editor_close(key.clone(), false).ok);
        assert!(!editor_set_text(key, "closed".to_string()).ok);
    }

    #[test]
    fn editor_autosaves_after_debounce() {
        ensure_app();
        let key = "2024-03-11".to_string();
        assert!(editor_open(key.clone(), None).ok);
        assert!(editor_set_text(key.clone(), "typed".to_string()).ok);
        assert!(journal_get_entry(key.clone()).is_none());

        thread::sleep(Duration::from_millis(1500));
        assert_eq!(journal_get_entry(key.clone()).unwrap().text, "typed");
        assert!(editor_close(key, false).ok);
    }

    #[test]
    fn closing_without_save_discards_pending_draft() {
        ensure_app();
        let key = "2024-03-12".to_string();
        assert!(editor_open(key.clone(), None).ok);
        assert!(editor_set_text(key.clone(), "discard me".to_string()).ok);
        assert!(editor_close(key.clone(), false).ok);

        thread::sleep(Duration::from_millis(1500));
        assert!(journal_get_entry(key).is_none());
    }

    #[test]
    fn flush_pending_writes_succeeds_after_save() {
        ensure_app();
        assert!(journal_save_entry("2024-03-13".to_string(), "kept".to_string(), None).ok);
        let response = flush_pending_writes();
        assert!(response.ok, "{}", response.message);
    }

    #[test]
    fn save_get_list_delete_roundtrip() {
        ensure_app();
        let saved = journal_save_entry(
            "2024-02-29".to_string(),
            "leap day".to_string(),
            Some("  Leap  ".to_string()),
        );
        assert!(saved.ok, "{}", saved.message);
        assert_eq!(saved.key.as_deref(), Some("2024-02-29"));

        let entry = journal_get_entry("2024-02-29".to_string()).unwrap();
        assert_eq!(entry.text, "leap day");
        assert_eq!(entry.title, "Leap");
        assert!(journal_list_entries()
            .iter()
            .any(|item| item.key == "2024-02-29"));

        assert!(journal_delete_entry("2024-02-29".to_string()).ok);
        assert!(journal_get_entry("2024-02-29".to_string()).is_none());
    }

    #[test]
    fn invalid_keys_are_rejected() {
        ensure_app();
        let response = journal_save_entry("yesterday".to_string(), "x".to_string(), None);
        assert!(!response.ok);
        assert!(journal_get_entry("2024-13-01".to_string()).is_none());
    }

    #[test]
    fn next_entry_key_is_a_valid_key() {
        ensure_app();
        let key = journal_next_entry_key();
        assert!(key.len() >= 10, "{key}");
    }

    #[test]
    fn sign_selection_validates_input() {
        ensure_app();
        assert!(!set_selected_sign("ophiuchus".to_string()).ok);
        assert!(set_selected_sign("Sagittarius".to_string()).ok);
        assert_eq!(selected_sign(), "sagittarius");
    }

    #[test]
    fn horoscope_lookup_falls_back_offline() {
        ensure_app();
        let view = horoscope_for_sign("virgo".to_string());
        assert!(view.ok, "{}", view.message);
        assert_eq!(view.status, "succeeded");
        assert!(!view.description.is_empty());
        assert!(view.fetched_at_ms.is_some());

        let invalid = horoscope_for_sign("nope".to_string());
        assert!(!invalid.ok);
    }
}
