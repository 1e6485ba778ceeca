//! Medication name normalization.
//!
//! Catalog matching ignores case and surrounding whitespace, so
//! " paracetamol " and "Paracetamol" resolve to the same entry. Interior
//! whitespace and accents are significant.

/// Normalize a medication name into its catalog lookup key.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
