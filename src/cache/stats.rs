//! Cache Statistics Module
//!
//! Tracks hits, misses, invalidations and prune activity.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Fresh entries returned
    pub hits: u64,
    /// Reads that returned nothing (absent, expired, invalid or medium error)
    pub misses: u64,
    /// Expired entries returned because the caller ignored expiry
    pub stale_hits: u64,
    /// Entries deleted on read for a version mismatch or corruption
    pub invalidations: u64,
    /// Entries removed by pruning
    pub evictions: u64,
    /// Number of prune passes run
    pub prune_runs: u64,
    /// Writes abandoned after every attempt failed
    pub dropped_writes: u64,
    /// Current number of entries in this store's namespace
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Stale hits count as hits. Returns 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let served = self.hits + self.stale_hits;
        let total = served + self.misses;
        if total == 0 {
            0.0
        } else {
            served as f64 / total as f64
        }
    }

    // == Record Events ==
    /// Counts one fresh read.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Counts one expired entry served on request.
    pub fn record_stale_hit(&mut self) {
        self.stale_hits += 1;
    }

    /// Counts one read that returned nothing.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Counts one entry deleted on read.
    pub fn record_invalidation(&mut self) {
        self.invalidations += 1;
    }

    // == Record Prune ==
    /// Counts one prune pass that removed `removed` entries.
    pub fn record_prune(&mut self, removed: usize) {
        self.prune_runs += 1;
        self.evictions += removed as u64;
    }

    /// Counts one abandoned write.
    pub fn record_dropped_write(&mut self) {
        self.dropped_writes += 1;
    }

    /// Sets the current namespace entry count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
