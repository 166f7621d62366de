//! Progress tracking for full reindex runs.

use instant::Instant;
use serde::{Deserialize, Serialize};

/// Progress of a reindex run, reported every few documents and once on
/// completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReindexProgress {
    /// Documents embedded and persisted so far
    pub indexed_count: usize,
    /// Documents in the batch
    pub total_count: usize,
}

impl ReindexProgress {
    pub fn new(indexed_count: usize, total_count: usize) -> Self {
        Self {
            indexed_count,
            total_count,
        }
    }

    /// Returns the completion percentage (0.0 to 100.0).
    ///
    /// An empty batch counts as fully complete.
    pub fn percent_complete(&self) -> f64 {
        if self.total_count == 0 {
            100.0
        } else {
            (self.indexed_count as f64 / self.total_count as f64) * 100.0
        }
    }

    /// Returns true once every document in the batch has been indexed.
    pub fn is_complete(&self) -> bool {
        self.indexed_count >= self.total_count
    }
}

/// Helper for tracking elapsed time during processing.
pub struct ProgressTimer {
    start: Instant,
}

impl ProgressTimer {
    /// Creates a new timer starting now.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Returns elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Returns elapsed time in fractional milliseconds, for metrics.
    pub fn elapsed_ms_f64(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for ProgressTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reindex_progress_percent() {
        let progress = ReindexProgress::new(5, 20);
        assert!((progress.percent_complete() - 25.0).abs() < 0.01);
        assert!(!progress.is_complete());

        let progress = ReindexProgress::new(20, 20);
        assert!((progress.percent_complete() - 100.0).abs() < 0.01);
        assert!(progress.is_complete());
    }

    #[test]
    fn test_reindex_progress_empty_batch() {
        let progress = ReindexProgress::new(0, 0);
        assert!(progress.is_complete());
        assert!((progress.percent_complete() - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_timer_monotonic() {
        let timer = ProgressTimer::new();
        let first = timer.elapsed_ms_f64();
        let second = timer.elapsed_ms_f64();
        assert!(second >= first);
    }
}
