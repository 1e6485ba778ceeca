//! SQLite-backed record store.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{RecordStore, StoreError, StoreResult};
use crate::db::{Database, DbResult};
use crate::models::{CatalogEntry, NewCatalogEntry, StockEntry};

/// Record store over the local SQLite database.
///
/// rusqlite is blocking, so each call runs on tokio's blocking pool while
/// holding the connection lock.
#[derive(Clone)]
pub struct SqliteRecordStore {
    db: Arc<Mutex<Database>>,
}

impl SqliteRecordStore {
    pub fn new(db: Database) -> Self {
        Self::from_shared(Arc::new(Mutex::new(db)))
    }

    /// Wrap a database that other components also use.
    pub fn from_shared(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }

    /// Shared handle to the underlying database.
    pub fn database(&self) -> Arc<Mutex<Database>> {
        Arc::clone(&self.db)
    }

    async fn with_db<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Database) -> DbResult<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || -> StoreResult<T> {
            let mut guard = db
                .lock()
                .map_err(|e| StoreError::Poisoned(e.to_string()))?;
            Ok(f(&mut *guard)?)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn delete_stock(&self, pharmacy_id: &str) -> StoreResult<()> {
        let pharmacy_id = pharmacy_id.to_string();
        self.with_db(move |db| db.delete_stock(&pharmacy_id).map(|_| ()))
            .await
    }

    async fn list_catalog_page(
        &self,
        offset: usize,
        limit: usize,
    ) -> StoreResult<Vec<CatalogEntry>> {
        self.with_db(move |db| db.list_catalog_page(offset, limit)).await
    }

    async fn create_catalog_entries(
        &self,
        entries: Vec<NewCatalogEntry>,
    ) -> StoreResult<Vec<CatalogEntry>> {
        self.with_db(move |db| db.insert_catalog_entries(&entries))
            .await
    }

    async fn insert_stock(&self, rows: Vec<StockEntry>) -> StoreResult<()> {
        self.with_db(move |db| db.insert_stock(&rows).map(|_| ()))
            .await
    }
}
