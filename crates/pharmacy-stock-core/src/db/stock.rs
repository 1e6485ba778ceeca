//! Pharmacy stock database operations.

use rusqlite::params;

use super::{Database, DbError, DbResult};
use crate::models::{StockEntry, StockListing};

impl Database {
    /// Delete every stock row for a pharmacy. Returns the number removed.
    pub fn delete_stock(&self, pharmacy_id: &str) -> DbResult<usize> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM pharmacy_stock WHERE pharmacy_id = ?", [pharmacy_id])?;
        Ok(rows_affected)
    }

    /// Insert stock rows in one transaction; either all rows land or none do.
    pub fn insert_stock(&mut self, rows: &[StockEntry]) -> DbResult<usize> {
        if let Some(bad) = rows.iter().find(|r| !r.price.is_finite() || r.price < 0.0) {
            return Err(DbError::Constraint(format!(
                "invalid price {} for catalog entry {}",
                bad.price, bad.catalog_entry_id
            )));
        }

        let tx = self.transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO pharmacy_stock (pharmacy_id, catalog_entry_id, price, available)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )?;
            for row in rows {
                stmt.execute(params![
                    row.pharmacy_id,
                    row.catalog_entry_id,
                    row.price,
                    row.available,
                ])?;
            }
        }
        tx.commit()?;
        Ok(rows.len())
    }

    /// List a pharmacy's stock joined with catalog names, ordered by name.
    pub fn list_stock(&self, pharmacy_id: &str) -> DbResult<Vec<StockListing>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT s.catalog_entry_id, c.name, c.category, s.price, s.available
            FROM pharmacy_stock s
            JOIN medication_catalog c ON c.id = s.catalog_entry_id
            WHERE s.pharmacy_id = ?
            ORDER BY c.name, s.id
            "#,
        )?;

        let rows = stmt.query_map([pharmacy_id], |row| {
            Ok(StockListing {
                catalog_entry_id: row.get(0)?,
                name: row.get(1)?,
                category: row.get(2)?,
                price: row.get(3)?,
                available: row.get(4)?,
            })
        })?;

        let mut listings = Vec::new();
        for row in rows {
            listings.push(row?);
        }
        Ok(listings)
    }

    /// Number of stock rows for a pharmacy.
    pub fn count_stock(&self, pharmacy_id: &str) -> DbResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM pharmacy_stock WHERE pharmacy_id = ?",
            [pharmacy_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
