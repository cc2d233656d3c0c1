//! Cache Statistics Module
//!
//! Tracks proxy cache metrics including hits, misses, writes and fallbacks.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache and strategy counters.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct CacheStats {
    /// Lookups answered from some region
    pub hits: u64,
    /// Lookups that found nothing in any region
    pub misses: u64,
    /// Successful responses written into a region
    pub writes: u64,
    /// Network fetches that could not complete
    pub network_failures: u64,
    /// Navigations answered with the offline document
    pub offline_fallbacks: u64,
    /// Current number of entries across all regions
    pub total_entries: usize,
    /// Current approximate size of all entries in bytes
    pub total_bytes: usize,
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
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
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

    pub fn record_network_failure(&mut self) {
        self.network_failures += 1;
    }

    pub fn record_offline_fallback(&mut self) {
        self.offline_fallbacks += 1;
    }
}
