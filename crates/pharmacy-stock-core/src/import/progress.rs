//! Progress and ETA estimation.

use std::time::{Duration, Instant};

/// Estimate remaining seconds from the observed cost per record.
///
/// `completed` is the number of records in batches that have finished. With
/// nothing completed yet the fallback per-record cost is used.
pub fn estimate_eta_seconds(
    elapsed: Duration,
    completed: usize,
    remaining: usize,
    fallback_ms_per_record: u64,
) -> u64 {
    if remaining == 0 {
        return 0;
    }
    let avg_ms = if completed == 0 {
        fallback_ms_per_record as f64
    } else {
        elapsed.as_secs_f64() * 1000.0 / completed as f64
    };
    (avg_ms * remaining as f64 / 1000.0).ceil() as u64
}

/// Tracks timing for one batch loop.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    started: Instant,
    total: usize,
    fallback_ms_per_record: u64,
}

impl ProgressTracker {
    pub fn new(total: usize, fallback_ms_per_record: u64) -> Self {
        Self {
            started: Instant::now(),
            total,
            fallback_ms_per_record,
        }
    }

    /// Records covered once the batch `[start, start + len)` is counted.
    pub fn batch_end(&self, start: usize, len: usize) -> usize {
        (start + len).min(self.total)
    }

    /// ETA before running the batch that ends at `processed`, with `completed`
    /// records already finished.
    pub fn eta_seconds(&self, completed: usize, processed: usize) -> u64 {
        estimate_eta_seconds(
            self.started.elapsed(),
            completed,
            self.total.saturating_sub(processed),
            self.fallback_ms_per_record,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_before_first_batch() {
        // 150 remaining * 50ms = 7.5s
        assert_eq!(estimate_eta_seconds(Duration::ZERO, 0, 150, 50), 8);
    }

    #[test]
    fn test_observed_average() {
        // 2s for 100 records = 20ms/record, 150 remaining = 3s
        assert_eq!(estimate_eta_seconds(Duration::from_secs(2), 100, 150, 50), 3);
    }

    #[test]
    fn test_nothing_remaining() {
        assert_eq!(estimate_eta_seconds(Duration::from_secs(9), 200, 0, 50), 0);
        assert_eq!(estimate_eta_seconds(Duration::ZERO, 0, 0, 50), 0);
    }

    #[test]
    fn test_batch_end_clamped() {
        let tracker = ProgressTracker::new(250, 50);
        assert_eq!(tracker.batch_end(0, 100), 100);
        assert_eq!(tracker.batch_end(200, 100), 250);
    }

    #[test]
    fn test_tracker_eta_uses_fallback() {
        let tracker = ProgressTracker::new(250, 50);
        // 150 remaining after the first batch, nothing completed
        assert_eq!(tracker.eta_seconds(0, 100), 8);
        assert_eq!(tracker.eta_seconds(200, 250), 0);
    }
}
