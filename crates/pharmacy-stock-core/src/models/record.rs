//! Parsed import records.

use serde::{Deserialize, Serialize};

/// A medication row produced by the upstream file/text parser.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParsedRecord {
    /// Medication name as written in the source file
    pub name: String,
    /// Unit price for this pharmacy
    pub price: f64,
    /// Free-form category (e.g., "Analgésico")
    pub category: String,
    /// Whether the pharmacy currently has it available
    pub available: bool,
}

impl ParsedRecord {
    pub fn new(name: impl Into<String>, price: f64, category: impl Into<String>, available: bool) -> Self {
        Self {
            name: name.into(),
            price,
            category: category.into(),
            available,
        }
    }

    /// Check whether this record can be imported at all.
    ///
    /// Blank names and negative or non-finite prices are dropped before the
    /// import counts anything.
    pub fn is_importable(&self) -> bool {
        !self.name.trim().is_empty() && self.price.is_finite() && self.price >= 0.0
    }
}
