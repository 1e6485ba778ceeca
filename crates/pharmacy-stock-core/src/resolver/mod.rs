//! Catalog name resolution for imports.
//!
//! Pipeline: Catalog Preload (paged) → Name Normalization → Lookup / Append

mod normalizer;

pub use normalizer::*;

use std::collections::HashMap;

use tracing::debug;

use crate::models::CatalogEntry;
use crate::store::{RecordStore, StoreResult};

/// Name → catalog id map used during one import run.
///
/// Entries are only ever added: once a name resolves it keeps resolving to
/// the same id for the rest of the run.
#[derive(Debug, Default, Clone)]
pub struct CatalogIndex {
    ids: HashMap<String, String>,
}

impl CatalogIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from existing catalog entries.
    pub fn from_entries<'e>(entries: impl IntoIterator<Item = &'e CatalogEntry>) -> Self {
        let mut index = Self::new();
        for entry in entries {
            index.insert(entry);
        }
        index
    }

    /// Load the whole catalog, one page at a time, until a short page.
    pub async fn load<S: RecordStore + ?Sized>(store: &S, page_size: usize) -> StoreResult<Self> {
        let mut index = Self::new();
        let mut offset = 0;
        let mut pages = 0;

        loop {
            let page = store.list_catalog_page(offset, page_size).await?;
            pages += 1;
            let fetched = page.len();
            for entry in &page {
                index.insert(entry);
            }
            if fetched == 0 || fetched < page_size {
                break;
            }
            offset += fetched;
        }

        debug!(entries = index.len(), pages, "catalog loaded");
        Ok(index)
    }

    /// Look up the catalog id for a medication name.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.ids.get(&normalize_name(name)).map(String::as_str)
    }

    /// Record a catalog entry. An already-known name keeps its first id.
    pub fn insert(&mut self, entry: &CatalogEntry) {
        let key = normalize_name(&entry.name);
        if key.is_empty() {
            return;
        }
        self.ids.entry(key).or_insert_with(|| entry.id.clone());
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewCatalogEntry;
    use crate::store::{MemoryRecordStore, StoreOperation};

    fn entry(id: &str, name: &str) -> CatalogEntry {
        CatalogEntry {
            id: id.into(),
            name: name.into(),
            category: String::new(),
        }
    }

    #[test]
    fn test_resolve_normalized() {
        let index = CatalogIndex::from_entries(&[entry("1", "Paracetamol")]);
        assert_eq!(index.resolve(" PARACETAMOL "), Some("1"));
        assert_eq!(index.resolve("ibuprofeno"), None);
    }

    #[test]
    fn test_append_only() {
        let mut index = CatalogIndex::new();
        index.insert(&entry("1", "Paracetamol"));
        index.insert(&entry("2", "paracetamol"));
        assert_eq!(index.resolve("Paracetamol"), Some("1"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_blank_names_ignored() {
        let mut index = CatalogIndex::new();
        index.insert(&entry("1", "  "));
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn test_load_pages_until_short_page() {
        let store = MemoryRecordStore::new();
        let entries: Vec<_> = (0..25)
            .map(|i| NewCatalogEntry::new(format!("Med {}", i), "x").into_entry())
            .collect();
        store.seed_catalog(entries);

        let index = CatalogIndex::load(&store, 10).await.unwrap();
        assert_eq!(index.len(), 25);
        // 10 + 10 + 5
        assert_eq!(store.calls().list_catalog_page, 3);
    }

    #[tokio::test]
    async fn test_load_exact_multiple_reads_empty_page() {
        let store = MemoryRecordStore::new();
        let entries: Vec<_> = (0..20)
            .map(|i| NewCatalogEntry::new(format!("Med {}", i), "x").into_entry())
            .collect();
        store.seed_catalog(entries);

        let index = CatalogIndex::load(&store, 10).await.unwrap();
        assert_eq!(index.len(), 20);
        assert_eq!(store.calls().list_catalog_page, 3);
    }

    #[tokio::test]
    async fn test_load_empty_catalog() {
        let store = MemoryRecordStore::new();
        let index = CatalogIndex::load(&store, 1000).await.unwrap();
        assert!(index.is_empty());
        assert_eq!(store.calls().list_catalog_page, 1);
    }

    #[tokio::test]
    async fn test_load_propagates_failure() {
        let store = MemoryRecordStore::new();
        store.fail(StoreOperation::ListCatalogPage);
        assert!(CatalogIndex::load(&store, 10).await.is_err());
    }
}
