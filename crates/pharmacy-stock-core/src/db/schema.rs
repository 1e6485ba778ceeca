//! SQLite schema definition.

/// Complete database schema for the pharmacy stock store.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Medication Catalog (shared across pharmacies)
-- ============================================================================

CREATE TABLE IF NOT EXISTS medication_catalog (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    normalized_name TEXT NOT NULL UNIQUE,         -- lower(trim(name))
    category TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- ============================================================================
-- Pharmacy Stock (scoped per pharmacy, rebuilt by imports)
-- ============================================================================

CREATE TABLE IF NOT EXISTS pharmacy_stock (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    pharmacy_id TEXT NOT NULL,
    catalog_entry_id TEXT NOT NULL REFERENCES medication_catalog(id),
    price REAL NOT NULL CHECK (price >= 0),
    available INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_stock_pharmacy ON pharmacy_stock(pharmacy_id);
CREATE INDEX IF NOT EXISTS idx_stock_catalog ON pharmacy_stock(catalog_entry_id);
"#;
