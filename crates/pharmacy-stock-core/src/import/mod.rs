//! Bulk stock import.
//!
//! Pipeline: Filter → [Clear Stock] → Catalog Preload → Batches → Summary
//!
//! [`ImportService`] guards the single import slot and publishes state;
//! [`Importer`] does the actual work against a [`RecordStore`](crate::store::RecordStore).

mod config;
mod observer;
mod progress;
mod runner;
mod service;

pub use config::*;
pub use observer::*;
pub use progress::*;
pub use runner::*;
pub use service::*;

use thiserror::Error;

/// Import errors.
///
/// Store failures during a run are not errors here; they become the run's
/// outcome or part of its error count.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("An import is already running")]
    AlreadyRunning,

    #[error("Invalid import configuration: {0}")]
    InvalidConfig(String),

    #[error("Import task failed: {0}")]
    Task(String),
}

pub type ImportResult<T> = Result<T, ImportError>;
