//! The batch import engine.
//!
//! ```text
//! [clear stock] → catalog preload → for each batch of N records:
//!                                      cancelled? → stop
//!                                      progress + ETA
//!                                      create missing catalog entries (1 call)
//!                                      insert stock rows              (1 call)
//!                                   → summary
//! ```
//!
//! Only the clear step (and the catalog preload it depends on) can fail a
//! run. Batch failures are counted and the loop moves on.

use std::collections::HashSet;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::observer::StateHub;
use super::progress::ProgressTracker;
use super::{ImportConfig, ImportResult};
use crate::models::{
    ImportOutcome, ImportPhase, ImportState, ImportSummary, NewCatalogEntry, ParsedRecord,
    StockEntry,
};
use crate::resolver::{normalize_name, CatalogIndex};
use crate::store::RecordStore;

/// Everything needed to start one import.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub pharmacy_id: String,
    pub records: Vec<ParsedRecord>,
    /// Delete the pharmacy's existing stock first
    pub clear_existing: bool,
}

impl ImportRequest {
    pub fn new(pharmacy_id: impl Into<String>, records: Vec<ParsedRecord>) -> Self {
        Self {
            pharmacy_id: pharmacy_id.into(),
            records,
            clear_existing: false,
        }
    }

    pub fn clearing_existing(mut self) -> Self {
        self.clear_existing = true;
        self
    }
}

/// Per-batch tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchTally {
    pub success: usize,
    pub errors: usize,
}

/// Runs import requests against a record store.
#[derive(Clone)]
pub struct Importer {
    store: Arc<dyn RecordStore>,
    config: ImportConfig,
}

impl Importer {
    /// Create an importer, rejecting configs that could not make progress.
    pub fn new(store: Arc<dyn RecordStore>, config: ImportConfig) -> ImportResult<Self> {
        config.validate()?;
        Ok(Self { store, config })
    }

    pub(crate) fn with_defaults(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            config: ImportConfig::default(),
        }
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Run one import to completion, cancellation, or fatal failure.
    ///
    /// Never returns an error: every failure ends up in the outcome or the
    /// error count. The state is left in `Done` (or `Idle` after a fatal
    /// failure); resetting it is the caller's job.
    pub async fn run(
        &self,
        request: ImportRequest,
        cancel: &CancellationToken,
        hub: &StateHub,
    ) -> ImportOutcome {
        let ImportRequest {
            pharmacy_id,
            records,
            clear_existing,
        } = request;

        let submitted = records.len();
        let records: Vec<ParsedRecord> = records.into_iter().filter(|r| r.is_importable()).collect();
        let total = records.len();
        if total < submitted {
            debug!(dropped = submitted - total, "dropped unimportable records");
        }

        hub.update(|s| {
            *s = ImportState {
                phase: ImportPhase::Idle,
                total_count: total,
                minimized: s.minimized,
                cancelled: cancel.is_cancelled(),
                ..Default::default()
            }
        });

        info!(pharmacy_id = %pharmacy_id, total, clear_existing, "starting stock import");

        if clear_existing {
            hub.update(|s| s.phase = ImportPhase::Clearing);
            if let Err(e) = self.store.delete_stock(&pharmacy_id).await {
                warn!(pharmacy_id = %pharmacy_id, error = %e, "clearing existing stock failed");
                return self.fail(hub, format!("could not clear existing stock: {}", e));
            }
        }

        // Nothing attempted yet: a plain empty completion
        if cancel.is_cancelled() || total == 0 {
            return self.finalize(hub, false);
        }

        hub.update(|s| s.phase = ImportPhase::LoadingCatalog);
        let mut index = match CatalogIndex::load(self.store.as_ref(), self.config.catalog_page_size).await {
            Ok(index) => index,
            Err(e) => {
                warn!(error = %e, "loading catalog failed");
                return self.fail(hub, format!("could not load the medication catalog: {}", e));
            }
        };

        hub.update(|s| s.phase = ImportPhase::Importing);
        let tracker = ProgressTracker::new(total, self.config.fallback_ms_per_record);
        let mut cancelled = false;

        for (batch_no, batch) in records.chunks(self.config.batch_size).enumerate() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let start = batch_no * self.config.batch_size;
            let processed = tracker.batch_end(start, batch.len());
            let eta_seconds = tracker.eta_seconds(start, processed);
            hub.update(|s| {
                s.processed_count = processed;
                s.eta_seconds = eta_seconds;
            });
            debug!(batch = batch_no + 1, processed, total, eta_seconds, "processing batch");

            let tally = self.process_batch(batch, &pharmacy_id, &mut index).await;
            hub.update(|s| {
                s.success_count += tally.success;
                s.error_count += tally.errors;
            });
        }

        self.finalize(hub, cancelled)
    }

    /// Resolve, create missing catalog entries, and insert stock for one batch.
    pub async fn process_batch(
        &self,
        batch: &[ParsedRecord],
        pharmacy_id: &str,
        index: &mut CatalogIndex,
    ) -> BatchTally {
        let mut tally = BatchTally::default();

        let mut seen = HashSet::new();
        let missing: Vec<NewCatalogEntry> = batch
            .iter()
            .filter(|r| index.resolve(&r.name).is_none())
            .filter(|r| seen.insert(normalize_name(&r.name)))
            .map(|r| NewCatalogEntry::new(r.name.trim(), r.category.clone()))
            .collect();

        if !missing.is_empty() {
            let requested = missing.len();
            match self.store.create_catalog_entries(missing).await {
                Ok(created) => {
                    for entry in &created {
                        index.insert(entry);
                    }
                    debug!(requested, created = created.len(), "catalog entries created");
                }
                Err(e) => warn!(requested, error = %e, "creating catalog entries failed"),
            }
        }

        let mut rows = Vec::with_capacity(batch.len());
        for record in batch {
            match index.resolve(&record.name) {
                Some(id) => rows.push(StockEntry {
                    pharmacy_id: pharmacy_id.to_string(),
                    catalog_entry_id: id.to_string(),
                    price: record.price,
                    available: record.available,
                }),
                None => tally.errors += 1,
            }
        }

        if rows.is_empty() {
            return tally;
        }

        let attempted = rows.len();
        match self.store.insert_stock(rows).await {
            Ok(()) => tally.success += attempted,
            Err(e) => {
                warn!(attempted, error = %e, "inserting stock rows failed");
                tally.errors += attempted;
            }
        }
        tally
    }

    fn finalize(&self, hub: &StateHub, cancelled: bool) -> ImportOutcome {
        hub.update(|s| {
            s.phase = ImportPhase::Done;
            s.eta_seconds = 0;
        });
        let summary = ImportSummary::from_state(&hub.snapshot());
        let outcome = if cancelled {
            ImportOutcome::Cancelled(summary)
        } else {
            ImportOutcome::Completed(summary)
        };
        info!(summary = %outcome.message(), "stock import finished");
        hub.finish(&outcome);
        outcome
    }

    fn fail(&self, hub: &StateHub, reason: String) -> ImportOutcome {
        hub.update(|s| s.phase = ImportPhase::Idle);
        let outcome = ImportOutcome::Failed { reason };
        hub.finish(&outcome);
        outcome
    }
}
