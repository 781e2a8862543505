//! Cache Statistics Module
//!
//! Tracks engine activity: reads that found data, reads that did not, writes,
//! soft-failed operations and expiry timers that fired.

use serde::Serialize;

// == Cache Stats ==
/// Engine activity counters.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Reads that returned a value
    pub hits: u64,
    /// Reads that found nothing
    pub misses: u64,
    /// Records written to the backend
    pub writes: u64,
    /// Operations that failed and fell back to a default
    pub errors: u64,
    /// Expiry timers that fired
    pub expirations: u64,
    /// Keys currently held by the storage area
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_write(&mut self) {
        self.writes += 1;
    }

    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    pub fn record_expiration(&mut self) {
        self.expirations += 1;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
