//! Shared medication catalog models.

use serde::{Deserialize, Serialize};

/// A medication known to the shared, cross-pharmacy catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogEntry {
    /// Opaque identifier assigned by the record store
    pub id: String,
    /// Display name as first imported (matching is case/whitespace-insensitive)
    pub name: String,
    /// Category supplied when the entry was created
    pub category: String,
}

/// A catalog entry that does not exist yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewCatalogEntry {
    pub name: String,
    pub category: String,
}

impl CatalogEntry {
    /// Create a catalog entry with a fresh UUID.
    pub fn new(name: String, category: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            category,
        }
    }
}

impl NewCatalogEntry {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
        }
    }

    /// Assign an identifier, producing the stored entry.
    pub fn into_entry(self) -> CatalogEntry {
        CatalogEntry::new(self.name, self.category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry_has_uuid() {
        let entry = CatalogEntry::new("Paracetamol".into(), "Analgésico".into());
        assert_eq!(entry.id.len(), 36);
        assert_eq!(entry.name, "Paracetamol");
    }

    #[test]
    fn test_into_entry_keeps_fields() {
        let entry = NewCatalogEntry::new("Ibuprofeno", "Antiinflamatorio").into_entry();
        assert_eq!(entry.name, "Ibuprofeno");
        assert_eq!(entry.category, "Antiinflamatorio");
    }

    #[test]
    fn test_distinct_ids() {
        let a = NewCatalogEntry::new("A", "x").into_entry();
        let b = NewCatalogEntry::new("A", "x").into_entry();
        assert_ne!(a.id, b.id);
    }
}
