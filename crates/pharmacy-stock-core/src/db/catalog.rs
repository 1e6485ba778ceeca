//! Catalog database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{CatalogEntry, NewCatalogEntry};
use crate::resolver::normalize_name;

impl Database {
    /// Insert catalog entries that are missing, in one transaction.
    ///
    /// Names already present (by normalized name) are left untouched and
    /// their existing row is returned instead. Output order follows input
    /// order.
    pub fn insert_catalog_entries(
        &mut self,
        entries: &[NewCatalogEntry],
    ) -> DbResult<Vec<CatalogEntry>> {
        let tx = self.transaction()?;
        let mut stored = Vec::with_capacity(entries.len());
        {
            let mut insert = tx.prepare(
                r#"
                INSERT INTO medication_catalog (id, name, normalized_name, category)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(normalized_name) DO NOTHING
                "#,
            )?;
            let mut select = tx.prepare(
                r#"
                SELECT id, name, category
                FROM medication_catalog
                WHERE normalized_name = ?
                "#,
            )?;

            for entry in entries {
                let normalized = normalize_name(&entry.name);
                let candidate = entry.clone().into_entry();
                insert.execute(params![
                    candidate.id,
                    entry.name.trim(),
                    normalized,
                    entry.category,
                ])?;
                stored.push(select.query_row([&normalized], catalog_entry_from_row)?);
            }
        }
        tx.commit()?;
        Ok(stored)
    }

    /// Read one page of the catalog in insertion order.
    pub fn list_catalog_page(&self, offset: usize, limit: usize) -> DbResult<Vec<CatalogEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, category
            FROM medication_catalog
            ORDER BY rowid
            LIMIT ?1 OFFSET ?2
            "#,
        )?;

        let rows = stmt.query_map(params![limit as i64, offset as i64], catalog_entry_from_row)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Look up a catalog entry by name (case/whitespace-insensitive).
    pub fn find_catalog_entry_by_name(&self, name: &str) -> DbResult<Option<CatalogEntry>> {
        let entry = self
            .conn
            .query_row(
                r#"
                SELECT id, name, category
                FROM medication_catalog
                WHERE normalized_name = ?
                "#,
                [normalize_name(name)],
                catalog_entry_from_row,
            )
            .optional()?;
        Ok(entry)
    }

    /// Total number of catalog entries.
    pub fn count_catalog_entries(&self) -> DbResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM medication_catalog", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn catalog_entry_from_row(row: &Row<'_>) -> rusqlite::Result<CatalogEntry> {
    Ok(CatalogEntry {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
    })
}
