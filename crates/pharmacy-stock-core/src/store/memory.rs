//! In-memory record store with call accounting and switchable failures.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{RecordStore, StoreError, StoreResult};
use crate::models::{CatalogEntry, NewCatalogEntry, StockEntry};
use crate::resolver::normalize_name;

/// The four record store operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    DeleteStock,
    ListCatalogPage,
    CreateCatalogEntries,
    InsertStock,
}

/// How many times each operation has been called.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreCalls {
    pub delete_stock: usize,
    pub list_catalog_page: usize,
    pub create_catalog_entries: usize,
    pub insert_stock: usize,
    /// Every name passed to `create_catalog_entries`, in call order
    pub requested_names: Vec<String>,
}

impl StoreCalls {
    fn bump(&mut self, op: StoreOperation) -> usize {
        let counter = match op {
            StoreOperation::DeleteStock => &mut self.delete_stock,
            StoreOperation::ListCatalogPage => &mut self.list_catalog_page,
            StoreOperation::CreateCatalogEntries => &mut self.create_catalog_entries,
            StoreOperation::InsertStock => &mut self.insert_stock,
        };
        *counter += 1;
        *counter
    }

    /// Total number of calls across all operations.
    pub fn total(&self) -> usize {
        self.delete_stock + self.list_catalog_page + self.create_catalog_entries + self.insert_stock
    }
}

#[derive(Default)]
struct MemoryState {
    catalog: Vec<CatalogEntry>,
    stock: Vec<StockEntry>,
    calls: StoreCalls,
    failing: HashSet<StoreOperation>,
    /// (operation, 1-based call number)
    failing_calls: HashSet<(StoreOperation, usize)>,
}

impl MemoryState {
    fn record(&mut self, op: StoreOperation) -> StoreResult<()> {
        let call = self.calls.bump(op);
        if self.failing.contains(&op) || self.failing_calls.contains(&(op, call)) {
            return Err(StoreError::Unavailable(format!("{:?} call {} failed", op, call)));
        }
        Ok(())
    }
}

/// Record store kept entirely in memory.
///
/// Catalog creation is insert-if-missing by normalized name, matching the
/// SQLite store.
#[derive(Default)]
pub struct MemoryRecordStore {
    state: Mutex<MemoryState>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pre-populate the catalog without counting a call.
    pub fn seed_catalog(&self, entries: impl IntoIterator<Item = CatalogEntry>) {
        self.lock().catalog.extend(entries);
    }

    /// Pre-populate stock rows without counting a call.
    pub fn seed_stock(&self, rows: impl IntoIterator<Item = StockEntry>) {
        self.lock().stock.extend(rows);
    }

    /// Make every call to `op` fail.
    pub fn fail(&self, op: StoreOperation) {
        self.lock().failing.insert(op);
    }

    /// Make only the `call`-th (1-based) call to `op` fail.
    pub fn fail_call(&self, op: StoreOperation, call: usize) {
        self.lock().failing_calls.insert((op, call));
    }

    /// Clear every configured failure.
    pub fn recover(&self) {
        let mut state = self.lock();
        state.failing.clear();
        state.failing_calls.clear();
    }

    pub fn calls(&self) -> StoreCalls {
        self.lock().calls.clone()
    }

    pub fn catalog(&self) -> Vec<CatalogEntry> {
        self.lock().catalog.clone()
    }

    pub fn stock(&self) -> Vec<StockEntry> {
        self.lock().stock.clone()
    }

    pub fn stock_for(&self, pharmacy_id: &str) -> Vec<StockEntry> {
        self.lock()
            .stock
            .iter()
            .filter(|s| s.pharmacy_id == pharmacy_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn delete_stock(&self, pharmacy_id: &str) -> StoreResult<()> {
        let mut state = self.lock();
        state.record(StoreOperation::DeleteStock)?;
        state.stock.retain(|s| s.pharmacy_id != pharmacy_id);
        Ok(())
    }

    async fn list_catalog_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> StoreResult<Vec<CatalogEntry>> {
        let mut state = self.lock();
        state.record(StoreOperation::ListCatalogPage)?;
        Ok(state.catalog.iter().skip(offset).take(limit).cloned().collect())
    }

    async fn create_catalog_entries(
        &self,
        entries: Vec<NewCatalogEntry>,
    ) -> StoreResult<Vec<CatalogEntry>> {
        let mut state = self.lock();
        state
            .calls
            .requested_names
            .extend(entries.iter().map(|e| e.name.clone()));
        state.record(StoreOperation::CreateCatalogEntries)?;

        let mut stored = Vec::with_capacity(entries.len());
        for entry in entries {
            let key = normalize_name(&entry.name);
            let existing = state
                .catalog
                .iter()
                .find(|c| normalize_name(&c.name) == key)
                .cloned();
            let row = match existing {
                Some(row) => row,
                None => {
                    let row = NewCatalogEntry::new(entry.name.trim(), entry.category).into_entry();
                    state.catalog.push(row.clone());
                    row
                }
            };
            stored.push(row);
        }
        Ok(stored)
    }

    async fn insert_stock(&self, rows: Vec<StockEntry>) -> StoreResult<()> {
        let mut state = self.lock();
        state.record(StoreOperation::InsertStock)?;
        state.stock.extend(rows);
        Ok(())
    }
}
