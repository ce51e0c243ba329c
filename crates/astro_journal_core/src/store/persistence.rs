//! Write-behind synchronization from store to durable storage.
//!
//! # Responsibility
//! - Observe journal transitions and snapshot the affected record.
//! - Write snapshots through a single background writer, off the
//!   dispatching thread.
//!
//! # Invariants
//! - At most one durable write is in flight at any time.
//! - Per record, a newer snapshot replaces a queued (not yet started) one,
//!   so the last transition's state is the last one written.
//! - Write failures are logged and dropped; they never reach the store.

use super::journal::JournalAction;
use super::{Action, AppState, StoreObserver};
use crate::model::journal::{EntryKey, JournalEntry};
use crate::model::zodiac::ZodiacSign;
use crate::storage::StorageService;
use log::{debug, error, info, warn};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

/// Durable record a snapshot targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum RecordKind {
    Entries,
    SelectedSign,
}

#[derive(Debug, Clone)]
enum Snapshot {
    Entries(BTreeMap<EntryKey, JournalEntry>),
    SelectedSign(ZodiacSign),
}

impl Snapshot {
    fn kind(&self) -> RecordKind {
        match self {
            Self::Entries(_) => RecordKind::Entries,
            Self::SelectedSign(_) => RecordKind::SelectedSign,
        }
    }

    fn write(&self, storage: &StorageService) -> bool {
        match self {
            Self::Entries(entries) => storage.save_journal_entries(entries),
            Self::SelectedSign(sign) => storage.save_selected_sign(*sign),
        }
    }
}

/// Counters exposed for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistenceStats {
    /// Writes that reached storage.
    pub written: u64,
    /// Writes the storage layer rejected.
    pub failed: u64,
    /// Queued snapshots replaced before they started.
    pub superseded: u64,
}

#[derive(Default)]
struct WriteQueue {
    pending: BTreeMap<RecordKind, (u64, Snapshot)>,
    in_flight: Option<u64>,
    last_seq: u64,
    closed: bool,
}

impl WriteQueue {
    /// Highest sequence number at or below which every write has landed or
    /// been superseded.
    fn settled(&self) -> u64 {
        let oldest_open = self
            .pending
            .values()
            .map(|(seq, _)| *seq)
            .chain(self.in_flight)
            .min();
        match oldest_open {
            Some(seq) => seq - 1,
            None => self.last_seq,
        }
    }
}

struct Shared {
    queue: Mutex<WriteQueue>,
    wake: Notify,
    settled: watch::Sender<u64>,
    storage: StorageService,
    written: AtomicU64,
    failed: AtomicU64,
    superseded: AtomicU64,
}

impl Shared {
    fn queue(&self) -> MutexGuard<'_, WriteQueue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish_settled(&self, queue: &WriteQueue) {
        self.settled.send_replace(queue.settled());
    }
}

/// Store observer that mirrors journal state into `StorageService`.
pub struct PersistenceSync {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl PersistenceSync {
    /// Starts the writer task on `runtime`.
    pub fn spawn(runtime: &Handle, storage: StorageService) -> Arc<Self> {
        let (settled, _) = watch::channel(0);
        let shared = Arc::new(Shared {
            queue: Mutex::new(WriteQueue::default()),
            wake: Notify::new(),
            settled,
            storage,
            written: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            superseded: AtomicU64::new(0),
        });
        let worker = runtime.spawn(run_writer(shared.clone()));
        info!("event=persistence_start module=persistence status=ok");

        Arc::new(Self {
            shared,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Waits until every snapshot enqueued before this call has landed or
    /// been superseded.
    pub async fn flush(&self) {
        let target = self.shared.queue().last_seq;
        let mut settled = self.shared.settled.subscribe();
        if settled.wait_for(|value| *value >= target).await.is_err() {
            warn!("event=persistence_flush module=persistence status=error reason=writer_gone");
        }
    }

    /// Drains queued writes and stops the writer. Later snapshots are
    /// dropped.
    pub async fn shutdown(&self) {
        {
            let mut queue = self.shared.queue();
            queue.closed = true;
        }
        self.shared.wake.notify_one();

        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            if let Err(err) = worker.await {
                error!(
                    "event=persistence_stop module=persistence status=error error={}",
                    err
                );
                return;
            }
        }
        info!("event=persistence_stop module=persistence status=ok");
    }

    pub fn stats(&self) -> PersistenceStats {
        PersistenceStats {
            written: self.shared.written.load(Ordering::SeqCst),
            failed: self.shared.failed.load(Ordering::SeqCst),
            superseded: self.shared.superseded.load(Ordering::SeqCst),
        }
    }

    fn enqueue(&self, snapshot: Snapshot) {
        let mut queue = self.shared.queue();
        if queue.closed {
            warn!(
                "event=persistence_enqueue module=persistence status=skip reason=closed record={:?}",
                snapshot.kind()
            );
            return;
        }

        queue.last_seq += 1;
        let seq = queue.last_seq;
        let kind = snapshot.kind();
        if queue.pending.insert(kind, (seq, snapshot)).is_some() {
            self.shared.superseded.fetch_add(1, Ordering::SeqCst);
            debug!(
                "event=persistence_enqueue module=persistence status=superseded record={:?} seq={}",
                kind, seq
            );
        }
        self.shared.publish_settled(&queue);
        drop(queue);
        self.shared.wake.notify_one();
    }
}

impl StoreObserver for PersistenceSync {
    fn on_transition(&self, action: &Action, state: &AppState) {
        let snapshot = match action {
            Action::Journal(JournalAction::UpsertEntry { .. })
            | Action::Journal(JournalAction::DeleteEntry { .. }) => {
                Snapshot::Entries(state.journal.entries.clone())
            }
            Action::Journal(JournalAction::SetSelectedSign(sign)) => Snapshot::SelectedSign(*sign),
            _ => return,
        };
        self.enqueue(snapshot);
    }
}

async fn run_writer(shared: Arc<Shared>) {
    loop {
        let next = {
            let mut queue = shared.queue();
            let first = queue.pending.keys().next().copied();
            match first.and_then(|kind| queue.pending.remove(&kind)) {
                Some((seq, snapshot)) => {
                    queue.in_flight = Some(seq);
                    Some((seq, snapshot))
                }
                None if queue.closed => break,
                None => None,
            }
        };

        let Some((seq, snapshot)) = next else {
            shared.wake.notified().await;
            continue;
        };

        let kind = snapshot.kind();
        let storage = shared.storage.clone();
        let landed = tokio::task::spawn_blocking(move || snapshot.write(&storage)).await;
        match landed {
            Ok(true) => {
                shared.written.fetch_add(1, Ordering::SeqCst);
                debug!(
                    "event=persistence_write module=persistence status=ok record={:?} seq={}",
                    kind, seq
                );
            }
            Ok(false) => {
                shared.failed.fetch_add(1, Ordering::SeqCst);
            }
            Err(err) => {
                shared.failed.fetch_add(1, Ordering::SeqCst);
                error!(
                    "event=persistence_write module=persistence status=error record={:?} seq={} error={}",
                    kind, seq, err
                );
            }
        }

        let mut queue = shared.queue();
        queue.in_flight = None;
        shared.publish_settled(&queue);
    }

    let queue = shared.queue();
    shared.publish_settled(&queue);
}

#[cfg(test)]
mod tests {
    use super::PersistenceSync;
    use crate::clock::ManualClock;
    use crate::model::journal::EntryKey;
    use crate::model::zodiac::ZodiacSign;
    use crate::storage::{MemoryKeyValueStore, StorageService};
    use crate::store::horoscope::HoroscopeAction;
    use crate::store::journal::JournalAction;
    use crate::store::Store;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;
    use tokio::runtime::Handle;

    fn store_with_sync() -> (Arc<MemoryKeyValueStore>, Arc<PersistenceSync>, Store) {
        let backend = Arc::new(MemoryKeyValueStore::new());
        let storage = StorageService::new(backend.clone());
        let sync = PersistenceSync::spawn(&Handle::current(), storage);
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap(),
        ));
        let store = Store::new(clock).with_observer(sync.clone());
        (backend, sync, store)
    }

    #[tokio::test]
    async fn entry_and_sign_transitions_reach_storage() {
        let (backend, sync, store) = store_with_sync();
        store.dispatch(JournalAction::UpsertEntry {
            key: EntryKey::parse("2024-01-15").unwrap(),
            text: "Hello".into(),
            title: None,
        });
        store.dispatch(JournalAction::SetSelectedSign(ZodiacSign::Leo));
        sync.flush().await;

        let storage = StorageService::new(backend);
        let entries = storage.load_journal_entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(storage.load_selected_sign(), Some(ZodiacSign::Leo));
    }

    #[tokio::test]
    async fn hydration_and_horoscope_transitions_are_not_persisted() {
        let (backend, sync, store) = store_with_sync();
        store.dispatch(JournalAction::Hydrate(None));
        store.dispatch(HoroscopeAction::FetchPending(ZodiacSign::Leo));
        sync.flush().await;

        assert!(backend.is_empty());
        assert_eq!(sync.stats().written, 0);
    }

    #[tokio::test]
    async fn write_failures_are_counted_not_raised() {
        let (backend, sync, store) = store_with_sync();
        backend.set_unavailable(true);
        store.dispatch(JournalAction::SetSelectedSign(ZodiacSign::Pisces));
        sync.flush().await;

        assert_eq!(sync.stats().failed, 1);
        assert_eq!(store.selected_sign(), ZodiacSign::Pisces);
    }

    #[tokio::test]
    async fn snapshots_after_shutdown_are_dropped() {
        let (backend, sync, store) = store_with_sync();
        sync.shutdown().await;
        store.dispatch(JournalAction::SetSelectedSign(ZodiacSign::Leo));

        assert!(backend.is_empty());
    }
}
