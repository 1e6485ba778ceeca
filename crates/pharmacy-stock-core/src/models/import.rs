//! Import run state and outcome models.

use serde::{Deserialize, Serialize};

/// Phase of the import state machine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImportPhase {
    /// No import running
    #[default]
    Idle,
    /// Deleting the pharmacy's existing stock
    Clearing,
    /// Paging the shared catalog into memory
    LoadingCatalog,
    /// Processing batches
    Importing,
    /// Finished; the summary is being reported
    Done,
}

/// Observable state of the (single) active import.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ImportState {
    pub phase: ImportPhase,
    /// Records covered by batches started so far (advances one batch at a time)
    pub processed_count: usize,
    /// Records accepted for import after filtering
    pub total_count: usize,
    pub success_count: usize,
    pub error_count: usize,
    /// Estimated seconds remaining
    pub eta_seconds: u64,
    /// Progress UI collapsed into the background
    pub minimized: bool,
    /// Cancellation requested
    pub cancelled: bool,
}

impl ImportState {
    /// Progress percentage, rounded to the nearest integer.
    pub fn percent(&self) -> u8 {
        if self.total_count == 0 {
            return 0;
        }
        let pct = (self.processed_count as f64 / self.total_count as f64 * 100.0).round();
        pct.clamp(0.0, 100.0) as u8
    }
}

/// Counts reported when a run stops.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImportSummary {
    pub total_count: usize,
    pub processed_count: usize,
    pub success_count: usize,
    pub error_count: usize,
    /// RFC 3339 timestamp
    pub finished_at: String,
}

impl ImportSummary {
    pub fn from_state(state: &ImportState) -> Self {
        Self {
            total_count: state.total_count,
            processed_count: state.processed_count,
            success_count: state.success_count,
            error_count: state.error_count,
            finished_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// How an import run ended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ImportOutcome {
    /// Every accepted record was attempted
    Completed(ImportSummary),
    /// Stopped at a batch boundary; later records were never attempted
    Cancelled(ImportSummary),
    /// Clearing existing stock failed; nothing was imported
    Failed { reason: String },
}

impl ImportOutcome {
    /// Summary counts, if the run got past the clear phase.
    pub fn summary(&self) -> Option<&ImportSummary> {
        match self {
            ImportOutcome::Completed(s) | ImportOutcome::Cancelled(s) => Some(s),
            ImportOutcome::Failed { .. } => None,
        }
    }

    /// User-facing notification text.
    pub fn message(&self) -> String {
        match self {
            ImportOutcome::Completed(s) => {
                if s.error_count == 0 {
                    format!("{} imported", s.success_count)
                } else {
                    format!("{} imported, {} errors", s.success_count, s.error_count)
                }
            }
            ImportOutcome::Cancelled(s) => format!(
                "Import cancelled: {} records were already imported and have not been rolled back",
                s.success_count
            ),
            ImportOutcome::Failed { reason } => format!("Import failed: {}", reason),
        }
    }
}
