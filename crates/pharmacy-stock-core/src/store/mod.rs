//! Record store interface consumed by the import engine.
//!
//! The engine only needs four bulk operations. Every call is an async
//! suspension point; implementations decide how the work is actually done.

mod memory;
mod sqlite;

pub use memory::*;
pub use sqlite::*;

use async_trait::async_trait;
use thiserror::Error;

use crate::db::DbError;
use crate::models::{CatalogEntry, NewCatalogEntry, StockEntry};

/// Record store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("Lock poisoned: {0}")]
    Poisoned(String),

    #[error("Record store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Delete every stock row of a pharmacy in one operation.
    async fn delete_stock(&self, pharmacy_id: &str) -> StoreResult<()>;

    /// Read one catalog page. Pages are complete and non-overlapping across
    /// increasing offsets.
    async fn list_catalog_page(&self, offset: usize, limit: usize)
        -> StoreResult<Vec<CatalogEntry>>;

    /// Bulk-create catalog entries, returning the stored rows with their ids.
    async fn create_catalog_entries(
        &self,
        entries: Vec<NewCatalogEntry>,
    ) -> StoreResult<Vec<CatalogEntry>>;

    /// Bulk-insert stock rows.
    async fn insert_stock(&self, rows: Vec<StockEntry>) -> StoreResult<()>;
}
