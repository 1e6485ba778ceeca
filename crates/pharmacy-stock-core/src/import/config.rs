//! Import tuning knobs.

use serde::{Deserialize, Serialize};

use super::{ImportError, ImportResult};

/// Sizes and estimates used by the import engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ImportConfig {
    /// Records per batch (one catalog insert + one stock insert per batch)
    pub batch_size: usize,
    /// Rows per catalog page during preload
    pub catalog_page_size: usize,
    /// Assumed cost per record before any batch has finished
    pub fallback_ms_per_record: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            catalog_page_size: 1000,
            fallback_ms_per_record: 50,
        }
    }
}

impl ImportConfig {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> ImportResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ImportError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ImportResult<()> {
        if self.batch_size == 0 {
            return Err(ImportError::InvalidConfig("batch_size must be positive".into()));
        }
        if self.catalog_page_size == 0 {
            return Err(ImportError::InvalidConfig(
                "catalog_page_size must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ImportConfig::default();
        assert_eq!(config.batch_size, 100);
        assert_eq!(config.catalog_page_size, 1000);
        assert_eq!(config.fallback_ms_per_record, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json() {
        let config = ImportConfig::from_json(r#"{"batch_size": 25}"#).unwrap();
        assert_eq!(config.batch_size, 25);
        assert_eq!(config.catalog_page_size, 1000);
    }

    #[test]
    fn test_zero_sizes_rejected() {
        assert!(ImportConfig::from_json(r#"{"batch_size": 0}"#).is_err());
        assert!(ImportConfig::from_json(r#"{"catalog_page_size": 0}"#).is_err());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            ImportConfig::from_json("{not json"),
            Err(ImportError::InvalidConfig(_))
        ));
    }
}
