//! Import state publication.
//!
//! The latest [`ImportState`] lives in a `tokio::sync::watch` channel so a UI
//! can always read the current value; [`ImportObserver`]s additionally get a
//! call for every change and one for the final outcome.

use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::watch;

use crate::models::{ImportOutcome, ImportState};

/// Receives import state changes.
///
/// Implementations must be `Send + Sync`; calls come from the task running
/// the import.
pub trait ImportObserver: Send + Sync {
    /// Called after every state change with the new snapshot.
    fn on_state(&self, state: &ImportState);

    /// Called once when a run stops, before the state returns to idle.
    fn on_finished(&self, _outcome: &ImportOutcome) {}
}

/// Observer that ignores everything.
pub struct NullObserver;

impl ImportObserver for NullObserver {
    fn on_state(&self, _state: &ImportState) {}
}

/// Owner of the single import state slot.
pub struct StateHub {
    tx: watch::Sender<ImportState>,
    observers: RwLock<Vec<Arc<dyn ImportObserver>>>,
}

impl Default for StateHub {
    fn default() -> Self {
        Self::new()
    }
}

impl StateHub {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ImportState::default());
        Self {
            tx,
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Receiver that always holds the latest state.
    pub fn subscribe(&self) -> watch::Receiver<ImportState> {
        self.tx.subscribe()
    }

    pub fn add_observer(&self, observer: Arc<dyn ImportObserver>) {
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    /// Current state.
    pub fn snapshot(&self) -> ImportState {
        self.tx.borrow().clone()
    }

    /// Mutate the state and notify observers.
    pub fn update(&self, f: impl FnOnce(&mut ImportState)) {
        self.modify(f);
        self.notify();
    }

    /// Mutate the state without calling observers.
    ///
    /// Watch receivers still see the change. Pair with [`notify`](Self::notify)
    /// once any locks held around the change are released.
    pub fn modify(&self, f: impl FnOnce(&mut ImportState)) {
        self.tx.send_modify(f);
    }

    /// Call every observer with the current state.
    pub fn notify(&self) {
        let snapshot = self.snapshot();
        for observer in self.observers() {
            observer.on_state(&snapshot);
        }
    }

    /// Report the end of a run.
    pub fn finish(&self, outcome: &ImportOutcome) {
        for observer in self.observers() {
            observer.on_finished(outcome);
        }
    }

    fn observers(&self) -> Vec<Arc<dyn ImportObserver>> {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
