use astro_journal_core::service::horoscope_client::{HoroscopeSource, SourceError};
use astro_journal_core::storage::{KeyValueStore, SqliteKeyValueStore, JOURNAL_STORAGE_KEY};
use astro_journal_core::{
    AstroJournal, CoreConfig, EntryKey, HoroscopeData, ManualClock, Transition, ZodiacSign,
    DEFAULT_ENTRY_TITLE,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::path::Path;
use std::sync::Arc;

struct Unreachable;

#[async_trait]
impl HoroscopeSource for Unreachable {
    async fn fetch_today(&self, _sign: &str) -> Result<Option<HoroscopeData>, SourceError> {
        Err(SourceError::Decode("offline".to_string()))
    }
}

async fn start(path: &Path) -> AstroJournal {
    start_at(path, Utc.with_ymd_and_hms(2024, 1, 15, 18, 30, 0).unwrap()).await
}

async fn start_at(path: &Path, now: DateTime<Utc>) -> AstroJournal {
    let backend = Arc::new(SqliteKeyValueStore::open(path).unwrap());
    let clock = Arc::new(ManualClock::new(now));
    let config = CoreConfig::default().with_db_path(path);
    AstroJournal::start_with(config, backend, Arc::new(Unreachable), clock).await
}

fn key(value: &str) -> EntryKey {
    EntryKey::parse(value).unwrap()
}

#[tokio::test]
async fn save_read_delete_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let app = start(&dir.path().join("journal.db")).await;

    app.save_entry(key("2024-01-15"), "Hello", None);
    assert_eq!(app.store().journal_entry(&key("2024-01-15")), "Hello");
    assert_eq!(app.store().today_journal_entry(), "Hello");

    app.delete_entry(key("2024-01-15"));
    assert_eq!(app.store().journal_entry(&key("2024-01-15")), "");

    // Deleting again is a no-op.
    assert_eq!(app.delete_entry(key("2024-01-15")), Transition::Applied);
    app.shutdown().await;
}

#[tokio::test]
async fn entries_and_sign_survive_restart_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.db");

    let first = start(&path).await;
    first.save_entry(key("2024-01-14"), "Sunday notes", Some("Weekend".into()));
    first.save_entry(key("2024-01-15"), "Monday notes", None);
    first.set_selected_sign(ZodiacSign::Capricorn);
    first.shutdown().await;
    drop(first);

    let second = start(&path).await;
    assert_eq!(second.hydration().entries_loaded, Some(2));
    assert_eq!(second.hydration().sign_loaded, Some(ZodiacSign::Capricorn));

    let sunday = second.entry(&key("2024-01-14")).unwrap();
    assert_eq!(sunday.text, "Sunday notes");
    assert_eq!(sunday.title, "Weekend");
    assert_eq!(
        second.entry(&key("2024-01-15")).unwrap().title,
        DEFAULT_ENTRY_TITLE
    );

    let listed: Vec<String> = second
        .store()
        .listed_entries()
        .into_iter()
        .map(|(key, _)| key.to_string())
        .collect();
    assert_eq!(listed, vec!["2024-01-15", "2024-01-14"]);
    second.shutdown().await;
}

#[tokio::test]
async fn legacy_plain_text_entries_are_upgraded_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");
    {
        let backend = SqliteKeyValueStore::open(&path).unwrap();
        backend
            .set_item(
                JOURNAL_STORAGE_KEY,
                r#"{"2023-12-31":"old style","not-a-key":"ignored"}"#,
            )
            .unwrap();
    }

    let app = start(&path).await;
    assert_eq!(app.hydration().entries_loaded, Some(1));
    let entry = app.entry(&key("2023-12-31")).unwrap();
    assert_eq!(entry.text, "old style");
    assert_eq!(entry.title, DEFAULT_ENTRY_TITLE);
    assert_eq!(entry.created_at, entry.updated_at);
    app.shutdown().await;
}

#[tokio::test]
async fn legacy_entry_keeps_created_at_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");
    {
        let backend = SqliteKeyValueStore::open(&path).unwrap();
        backend
            .set_item(JOURNAL_STORAGE_KEY, r#"{"2023-12-31":"old"}"#)
            .unwrap();
    }

    let mut created = Vec::new();
    for day in [1, 2] {
        let now = Utc.with_ymd_and_hms(2024, 1, day, 8, 0, 0).unwrap();
        let app = start_at(&path, now).await;
        created.push(app.entry(&key("2023-12-31")).unwrap().created_at);
        app.shutdown().await;
    }
    let midnight = Utc.with_ymd_and_hms(2023, 12, 31, 0, 0, 0).unwrap();
    assert_eq!(created, vec![midnight, midnight]);
}

#[tokio::test]
async fn clear_all_data_leaves_nothing_to_hydrate() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.db");

    let first = start(&path).await;
    first.save_entry(key("2024-01-15"), "temporary", None);
    first.set_selected_sign(ZodiacSign::Aquarius);
    assert!(first.clear_all_data().await);
    first.shutdown().await;
    drop(first);

    let second = start(&path).await;
    assert_eq!(second.hydration().entries_loaded, None);
    assert_eq!(second.hydration().sign_loaded, None);
    assert_eq!(second.store().selected_sign(), ZodiacSign::Aries);
    second.shutdown().await;
}
