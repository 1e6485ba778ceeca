//! Per-pharmacy stock models.

use serde::{Deserialize, Serialize};

/// A pharmacy's price and availability for one catalog medication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockEntry {
    pub pharmacy_id: String,
    pub catalog_entry_id: String,
    pub price: f64,
    pub available: bool,
}

/// A stock row joined with its catalog name, as shown in the stock view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockListing {
    pub catalog_entry_id: String,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub available: bool,
}
