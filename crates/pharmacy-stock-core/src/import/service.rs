//! Single-slot import service.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::observer::{ImportObserver, StateHub};
use super::runner::{ImportRequest, Importer};
use super::{ImportConfig, ImportError, ImportResult};
use crate::models::{ImportOutcome, ImportState};
use crate::store::RecordStore;

/// Handle to a running import.
pub struct ImportHandle {
    task: JoinHandle<ImportOutcome>,
    cancel: CancellationToken,
}

impl ImportHandle {
    /// Wait for the run to finish.
    pub async fn wait(self) -> ImportResult<ImportOutcome> {
        self.task
            .await
            .map_err(|e| ImportError::Task(e.to_string()))
    }

    /// Request cancellation at the next batch boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Frees the import slot when the task ends, however it ends.
///
/// Slot and state are reset together under the slot lock; cancel and
/// minimize only write state while holding it.
struct SlotRelease {
    hub: Arc<StateHub>,
    active: Arc<Mutex<Option<CancellationToken>>>,
}

impl Drop for SlotRelease {
    fn drop(&mut self) {
        {
            let mut slot = self.active.lock().unwrap_or_else(PoisonError::into_inner);
            self.hub.modify(|s| *s = ImportState::default());
            *slot = None;
        }

        // No observer calls while unwinding
        if std::thread::panicking() {
            warn!("stock import task panicked, import slot released");
        } else {
            self.hub.notify();
        }
    }
}

/// Owns the process-wide import slot: at most one import runs at a time.
#[derive(Clone)]
pub struct ImportService {
    importer: Importer,
    hub: Arc<StateHub>,
    active: Arc<Mutex<Option<CancellationToken>>>,
}

impl ImportService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            importer: Importer::with_defaults(store),
            hub: Arc::new(StateHub::new()),
            active: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_config(store: Arc<dyn RecordStore>, config: ImportConfig) -> ImportResult<Self> {
        Ok(Self {
            importer: Importer::new(store, config)?,
            hub: Arc::new(StateHub::new()),
            active: Arc::new(Mutex::new(None)),
        })
    }

    fn slot(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start an import on the current tokio runtime.
    ///
    /// Rejected with [`ImportError::AlreadyRunning`] while another import
    /// holds the slot; the rejected request performs no store calls.
    pub fn start_import(&self, request: ImportRequest) -> ImportResult<ImportHandle> {
        let cancel = {
            let mut slot = self.slot();
            if slot.is_some() {
                return Err(ImportError::AlreadyRunning);
            }
            let token = CancellationToken::new();
            *slot = Some(token.clone());
            token
        };

        let importer = self.importer.clone();
        let hub = Arc::clone(&self.hub);
        let active = Arc::clone(&self.active);
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let _release = SlotRelease {
                hub: Arc::clone(&hub),
                active,
            };
            importer.run(request, &token, &hub).await
        });

        Ok(ImportHandle { task, cancel })
    }

    /// Request cancellation of the active import. Returns false when idle.
    pub fn cancel_import(&self) -> bool {
        {
            let slot = self.slot();
            let Some(token) = slot.as_ref() else {
                return false;
            };
            token.cancel();
            self.hub.modify(|s| s.cancelled = true);
        }
        info!("stock import cancellation requested");
        self.hub.notify();
        true
    }

    /// Collapse the progress UI. No effect on processing.
    pub fn minimize_import(&self) -> bool {
        self.set_minimized(true)
    }

    /// Restore the progress UI. No effect on processing.
    pub fn maximize_import(&self) -> bool {
        self.set_minimized(false)
    }

    fn set_minimized(&self, minimized: bool) -> bool {
        {
            let slot = self.slot();
            if slot.is_none() {
                return false;
            }
            self.hub.modify(|s| s.minimized = minimized);
        }
        self.hub.notify();
        true
    }

    pub fn is_active(&self) -> bool {
        self.slot().is_some()
    }

    pub fn state(&self) -> ImportState {
        self.hub.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<ImportState> {
        self.hub.subscribe()
    }

    pub fn add_observer(&self, observer: Arc<dyn ImportObserver>) {
        self.hub.add_observer(observer);
    }

    pub fn config(&self) -> &ImportConfig {
        self.importer.config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ImportPhase, ParsedRecord};
    use crate::store::MemoryRecordStore;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Panics on the first progress update it sees.
    #[derive(Default)]
    struct PanicOnProgress {
        fired: AtomicBool,
    }

    impl ImportObserver for PanicOnProgress {
        fn on_state(&self, state: &ImportState) {
            if state.processed_count > 0 && !self.fired.swap(true, Ordering::SeqCst) {
                panic!("observer failed during progress update");
            }
        }
    }

    fn records(n: usize) -> Vec<ParsedRecord> {
        (0..n)
            .map(|i| ParsedRecord::new(format!("Med {}", i), 1.0, "General", true))
            .collect()
    }

    #[tokio::test]
    async fn test_start_and_wait() {
        let store = Arc::new(MemoryRecordStore::new());
        let service = ImportService::new(store.clone());

        let handle = service
            .start_import(ImportRequest::new("ph-1", records(3)))
            .unwrap();
        let outcome = handle.wait().await.unwrap();

        assert_eq!(outcome.summary().unwrap().success_count, 3);
        assert!(!service.is_active());
        assert_eq!(service.state(), ImportState::default());
    }

    #[tokio::test]
    async fn test_second_start_rejected() {
        let store = Arc::new(MemoryRecordStore::new());
        let service = ImportService::new(store.clone());

        // current_thread runtime: the first task cannot run until we await
        let first = service
            .start_import(ImportRequest::new("ph-1", records(3)))
            .unwrap();
        let second = service.start_import(ImportRequest::new("ph-2", records(3)));
        assert!(matches!(second, Err(ImportError::AlreadyRunning)));

        first.wait().await.unwrap();
        assert!(store.stock_for("ph-2").is_empty());

        // Slot is free again
        let third = service
            .start_import(ImportRequest::new("ph-2", records(1)))
            .unwrap();
        third.wait().await.unwrap();
        assert_eq!(store.stock_for("ph-2").len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_before_first_batch() {
        let store = Arc::new(MemoryRecordStore::new());
        let service = ImportService::new(store.clone());

        let handle = service
            .start_import(ImportRequest::new("ph-1", records(3)))
            .unwrap();
        assert!(service.cancel_import());
        assert!(service.state().cancelled);

        let outcome = handle.wait().await.unwrap();
        assert!(matches!(outcome, ImportOutcome::Completed(_)));
        assert_eq!(outcome.summary().unwrap().success_count, 0);
        assert_eq!(store.calls().total(), 0);
    }

    #[tokio::test]
    async fn test_panicking_task_releases_slot() {
        let store = Arc::new(MemoryRecordStore::new());
        let service = ImportService::new(store.clone());
        service.add_observer(Arc::new(PanicOnProgress::default()));

        let result = service
            .start_import(ImportRequest::new("ph-1", records(3)))
            .unwrap()
            .wait()
            .await;
        assert!(matches!(result, Err(ImportError::Task(_))));

        assert!(!service.is_active());
        assert_eq!(service.state(), ImportState::default());
        assert!(!service.cancel_import());

        let outcome = service
            .start_import(ImportRequest::new("ph-2", records(2)))
            .unwrap()
            .wait()
            .await
            .unwrap();
        assert_eq!(outcome.summary().unwrap().success_count, 2);
        assert_eq!(store.stock_for("ph-2").len(), 2);
    }

    #[tokio::test]
    async fn test_cancel_after_finish_leaves_state_clean() {
        let service = ImportService::new(Arc::new(MemoryRecordStore::new()));
        service
            .start_import(ImportRequest::new("ph-1", records(2)))
            .unwrap()
            .wait()
            .await
            .unwrap();

        assert!(!service.cancel_import());
        assert!(!service.minimize_import());
        assert_eq!(service.state(), ImportState::default());
    }

    #[tokio::test]
    async fn test_cancel_when_idle() {
        let service = ImportService::new(Arc::new(MemoryRecordStore::new()));
        assert!(!service.cancel_import());
    }

    #[tokio::test]
    async fn test_minimize_toggles_only_flag() {
        let store = Arc::new(MemoryRecordStore::new());
        let service = ImportService::new(store.clone());
        assert!(!service.minimize_import());

        let handle = service
            .start_import(ImportRequest::new("ph-1", records(2)))
            .unwrap();
        assert!(service.minimize_import());
        assert!(service.state().minimized);
        assert!(service.maximize_import());
        assert!(!service.state().minimized);
        assert!(service.minimize_import());

        let outcome = handle.wait().await.unwrap();
        assert_eq!(outcome.summary().unwrap().success_count, 2);
    }

    #[tokio::test]
    async fn test_subscriber_sees_reset() {
        let store = Arc::new(MemoryRecordStore::new());
        let service = ImportService::new(store);
        let rx = service.subscribe();

        service
            .start_import(ImportRequest::new("ph-1", records(1)))
            .unwrap()
            .wait()
            .await
            .unwrap();

        assert_eq!(rx.borrow().phase, ImportPhase::Idle);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ImportConfig {
            batch_size: 0,
            ..Default::default()
        };
        let result = ImportService::with_config(Arc::new(MemoryRecordStore::new()), config);
        assert!(matches!(result, Err(ImportError::InvalidConfig(_))));
    }
}
