//! Pharmacy Stock Core Library
//!
//! Local store and bulk import engine behind the pharmacy stock dashboard.
//!
//! # Architecture
//!
//! ```text
//! File / text parser (host) ──► Vec<ParsedRecord>
//!                                     │
//!                              ImportService (one slot)
//!                                     │
//!                   ┌─────────────────▼─────────────────┐
//!                   │             Importer              │
//!                   │  [clear stock] → catalog preload  │
//!                   │  → batches of 100:                │
//!                   │      create missing catalog rows  │
//!                   │      insert stock rows            │
//!                   └─────────────────┬─────────────────┘
//!                                     │
//!                               RecordStore
//!                         (SQLite, memory, remote)
//!                                     │
//!              ImportState ──► watch channel / observers ──► progress UI
//! ```
//!
//! # Core Principle
//!
//! **Imports never roll back.** Cancellation stops at the next batch
//! boundary and everything already inserted stays.
//!
//! # Modules
//!
//! - [`db`]: SQLite database layer (catalog + stock tables)
//! - [`models`]: Domain types (ParsedRecord, CatalogEntry, StockEntry, ImportState)
//! - [`store`]: Async record store interface and implementations
//! - [`resolver`]: Name normalization and the per-run catalog index
//! - [`import`]: Batch import engine and single-slot service

pub mod db;
pub mod import;
pub mod models;
pub mod resolver;
pub mod store;

// Re-export commonly used types
pub use db::Database;
pub use import::{ImportConfig, ImportHandle, ImportObserver, ImportRequest, ImportService, Importer};
pub use models::{
    CatalogEntry, ImportOutcome, ImportPhase, ImportState, ImportSummary, NewCatalogEntry,
    ParsedRecord, StockEntry, StockListing,
};
pub use resolver::{normalize_name, CatalogIndex};
pub use store::{MemoryRecordStore, RecordStore, SqliteRecordStore};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum PharmacyStockError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Import error: {0}")]
    ImportError(String),

    #[error("Runtime error: {0}")]
    RuntimeError(String),
}

impl From<db::DbError> for PharmacyStockError {
    fn from(e: db::DbError) -> Self {
        PharmacyStockError::DatabaseError(e.to_string())
    }
}

impl From<store::StoreError> for PharmacyStockError {
    fn from(e: store::StoreError) -> Self {
        PharmacyStockError::DatabaseError(e.to_string())
    }
}

impl From<import::ImportError> for PharmacyStockError {
    fn from(e: import::ImportError) -> Self {
        PharmacyStockError::ImportError(e.to_string())
    }
}

impl From<std::io::Error> for PharmacyStockError {
    fn from(e: std::io::Error) -> Self {
        PharmacyStockError::RuntimeError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for PharmacyStockError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        PharmacyStockError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<PharmacyStockCore>, PharmacyStockError> {
    let db = Database::open(&path)?;
    PharmacyStockCore::with_database(db).map(Arc::new)
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<PharmacyStockCore>, PharmacyStockError> {
    let db = Database::open_in_memory()?;
    PharmacyStockCore::with_database(db).map(Arc::new)
}

// =========================================================================
// Callback Interface
// =========================================================================

/// Implemented by the host UI to follow import progress.
#[uniffi::export(callback_interface)]
pub trait ImportListener: Send + Sync {
    fn on_state_changed(&self, state: FfiImportState);
    fn on_import_finished(&self, outcome: FfiImportOutcome);
}

struct ListenerObserver {
    listener: Box<dyn ImportListener>,
}

impl ImportObserver for ListenerObserver {
    fn on_state(&self, state: &ImportState) {
        self.listener.on_state_changed(state.clone().into());
    }

    fn on_finished(&self, outcome: &ImportOutcome) {
        self.listener.on_import_finished(outcome.clone().into());
    }
}

// =========================================================================
// Main API Object
// =========================================================================

/// Database plus import service, with its own async runtime.
#[derive(uniffi::Object)]
pub struct PharmacyStockCore {
    db: Arc<Mutex<Database>>,
    service: ImportService,
    runtime: tokio::runtime::Runtime,
}

impl PharmacyStockCore {
    fn with_database(db: Database) -> Result<Self, PharmacyStockError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let store = SqliteRecordStore::new(db);
        let db = store.database();
        Ok(Self {
            db,
            service: ImportService::new(Arc::new(store)),
            runtime,
        })
    }
}

#[uniffi::export]
impl PharmacyStockCore {
    // =========================================================================
    // Import Operations
    // =========================================================================

    /// Start a bulk import in the background.
    ///
    /// Fails if another import is already running. Progress and the final
    /// outcome are delivered to registered listeners.
    pub fn start_import(
        &self,
        pharmacy_id: String,
        records: Vec<FfiParsedRecord>,
        clear_existing: bool,
    ) -> Result<(), PharmacyStockError> {
        if pharmacy_id.trim().is_empty() {
            return Err(PharmacyStockError::InvalidInput("pharmacy_id is empty".into()));
        }

        let request = ImportRequest {
            pharmacy_id,
            records: records.into_iter().map(|r| r.into()).collect(),
            clear_existing,
        };

        let _guard = self.runtime.enter();
        self.service.start_import(request)?;
        Ok(())
    }

    /// Request cancellation of the running import.
    pub fn cancel_import(&self) -> bool {
        self.service.cancel_import()
    }

    /// Send the import progress UI to the background.
    pub fn minimize_import(&self) -> bool {
        self.service.minimize_import()
    }

    /// Bring the import progress UI back.
    pub fn maximize_import(&self) -> bool {
        self.service.maximize_import()
    }

    /// Current import state.
    pub fn import_state(&self) -> FfiImportState {
        self.service.state().into()
    }

    /// Register a listener for import state changes and outcomes.
    pub fn add_import_listener(&self, listener: Box<dyn ImportListener>) {
        self.service
            .add_observer(Arc::new(ListenerObserver { listener }));
    }

    // =========================================================================
    // Stock View
    // =========================================================================

    /// List a pharmacy's current stock.
    pub fn list_stock(&self, pharmacy_id: String) -> Result<Vec<FfiStockListing>, PharmacyStockError> {
        let db = self.db.lock()?;
        let listings = db.list_stock(&pharmacy_id)?;
        Ok(listings.into_iter().map(|l| l.into()).collect())
    }

    /// Look up a catalog entry by name (case/whitespace-insensitive).
    pub fn find_catalog_entry(
        &self,
        name: String,
    ) -> Result<Option<FfiCatalogEntry>, PharmacyStockError> {
        let db = self.db.lock()?;
        let entry = db.find_catalog_entry_by_name(&name)?;
        Ok(entry.map(|e| e.into()))
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe parsed record.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiParsedRecord {
    pub name: String,
    pub price: f64,
    pub category: String,
    pub available: bool,
}

impl From<FfiParsedRecord> for ParsedRecord {
    fn from(record: FfiParsedRecord) -> Self {
        ParsedRecord {
            name: record.name,
            price: record.price,
            category: record.category,
            available: record.available,
        }
    }
}

/// FFI-safe catalog entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCatalogEntry {
    pub id: String,
    pub name: String,
    pub category: String,
}

impl From<CatalogEntry> for FfiCatalogEntry {
    fn from(entry: CatalogEntry) -> Self {
        Self {
            id: entry.id,
            name: entry.name,
            category: entry.category,
        }
    }
}

/// FFI-safe stock listing.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStockListing {
    pub catalog_entry_id: String,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub available: bool,
}

impl From<StockListing> for FfiStockListing {
    fn from(listing: StockListing) -> Self {
        Self {
            catalog_entry_id: listing.catalog_entry_id,
            name: listing.name,
            category: listing.category,
            price: listing.price,
            available: listing.available,
        }
    }
}

/// FFI-safe import state.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiImportState {
    pub phase: String,
    pub processed_count: u64,
    pub total_count: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub percent: u8,
    pub eta_seconds: u64,
    pub minimized: bool,
    pub cancelled: bool,
}

impl From<ImportState> for FfiImportState {
    fn from(state: ImportState) -> Self {
        Self {
            phase: format!("{:?}", state.phase),
            percent: state.percent(),
            processed_count: state.processed_count as u64,
            total_count: state.total_count as u64,
            success_count: state.success_count as u64,
            error_count: state.error_count as u64,
            eta_seconds: state.eta_seconds,
            minimized: state.minimized,
            cancelled: state.cancelled,
        }
    }
}

/// FFI-safe import outcome.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiImportOutcome {
    /// "completed", "cancelled" or "failed"
    pub kind: String,
    pub total_count: u64,
    pub processed_count: u64,
    pub success_count: u64,
    pub error_count: u64,
    /// Notification text for the user
    pub message: String,
}

impl From<ImportOutcome> for FfiImportOutcome {
    fn from(outcome: ImportOutcome) -> Self {
        let kind = match &outcome {
            ImportOutcome::Completed(_) => "completed",
            ImportOutcome::Cancelled(_) => "cancelled",
            ImportOutcome::Failed { .. } => "failed",
        };
        let (total, processed, success, errors) = outcome
            .summary()
            .map(|s| (s.total_count, s.processed_count, s.success_count, s.error_count))
            .unwrap_or_default();

        Self {
            kind: kind.to_string(),
            total_count: total as u64,
            processed_count: processed as u64,
            success_count: success as u64,
            error_count: errors as u64,
            message: outcome.message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    struct ChannelListener {
        tx: Mutex<mpsc::Sender<FfiImportOutcome>>,
    }

    impl ImportListener for ChannelListener {
        fn on_state_changed(&self, _state: FfiImportState) {}

        fn on_import_finished(&self, outcome: FfiImportOutcome) {
            let _ = self.tx.lock().unwrap().send(outcome);
        }
    }

    fn record(name: &str, price: f64) -> FfiParsedRecord {
        FfiParsedRecord {
            name: name.into(),
            price,
            category: "Analgésico".into(),
            available: true,
        }
    }

    #[test]
    fn test_ffi_import_roundtrip() {
        let core = open_database_in_memory().unwrap();
        let (tx, rx) = mpsc::channel();
        core.add_import_listener(Box::new(ChannelListener { tx: Mutex::new(tx) }));

        core.start_import(
            "ph-1".into(),
            vec![record("Paracetamol", 15.0), record("Ibuprofeno", 20.0)],
            false,
        )
        .unwrap();

        let outcome = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert_eq!(outcome.kind, "completed");
        assert_eq!(outcome.success_count, 2);
        assert_eq!(outcome.message, "2 imported");

        let stock = core.list_stock("ph-1".into()).unwrap();
        assert_eq!(stock.len(), 2);
        assert_eq!(stock[0].name, "Ibuprofeno");

        let entry = core.find_catalog_entry(" paracetamol".into()).unwrap();
        assert!(entry.is_some());
    }

    #[test]
    fn test_empty_pharmacy_rejected() {
        let core = open_database_in_memory().unwrap();
        let result = core.start_import("  ".into(), vec![record("A", 1.0)], false);
        assert!(matches!(result, Err(PharmacyStockError::InvalidInput(_))));
    }

    #[test]
    fn test_idle_state() {
        let core = open_database_in_memory().unwrap();
        let state = core.import_state();
        assert_eq!(state.phase, "Idle");
        assert_eq!(state.percent, 0);
        assert!(!core.cancel_import());
    }

    #[test]
    fn test_failed_outcome_conversion() {
        let outcome: FfiImportOutcome = ImportOutcome::Failed {
            reason: "could not clear existing stock".into(),
        }
        .into();
        assert_eq!(outcome.kind, "failed");
        assert_eq!(outcome.success_count, 0);
        assert!(outcome.message.contains("could not clear"));
    }
}
