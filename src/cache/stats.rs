//! Cache Statistics Module
//!
//! Tier sizes and key listing for diagnostics, plus hit/miss/eviction counters.

use serde::Serialize;

// == Cache Stats ==
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Entries currently in the memory tier
    pub memory_size: usize,
    /// Entries currently in the disk tier (metadata keys excluded)
    pub disk_size: usize,
    /// Sorted union of both tiers' keys
    pub keys: Vec<String>,
    /// Reads answered from either tier
    pub hits: u64,
    /// Reads that found nothing valid
    pub misses: u64,
    /// Memory-tier entries dropped to make room
    pub evictions: u64,
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

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }
}
