//! Lookup Statistics Module
//!
//! Counts how each lookup was served. Counters are atomics so concurrent
//! request tasks can record without a lock.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Lookup Stats ==
/// Live counters for one cached provider.
#[derive(Debug, Default)]
pub struct LookupStats {
    hits: AtomicU64,
    misses: AtomicU64,
    decode_failures: AtomicU64,
    cache_errors: AtomicU64,
    write_failures: AtomicU64,
}

/// Point-in-time copy of [`LookupStats`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsSnapshot {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that went to the persistent store
    pub misses: u64,
    /// Cached payloads that failed to decode (also counted as misses)
    pub decode_failures: u64,
    /// Cache reads that failed or timed out (also counted as misses)
    pub cache_errors: u64,
    /// Write-backs that failed after a successful fetch
    pub write_failures: u64,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

impl LookupStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_error(&self) {
        self.cache_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write_failure(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    // == Snapshot ==
    pub fn snapshot(&self) -> StatsSnapshot {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        StatsSnapshot {
            hits,
            misses,
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            cache_errors: self.cache_errors.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let snapshot = LookupStats::new().snapshot();
        assert_eq!(snapshot, StatsSnapshot::default());
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(LookupStats::new().snapshot().hit_rate, 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let stats = LookupStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.snapshot().hit_rate, 0.75);
    }

    #[test]
    fn test_failure_counters() {
        let stats = LookupStats::new();
        stats.record_decode_failure();
        stats.record_cache_error();
        stats.record_cache_error();
        stats.record_write_failure();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.decode_failures, 1);
        assert_eq!(snapshot.cache_errors, 2);
        assert_eq!(snapshot.write_failures, 1);
        assert_eq!(snapshot.hits + snapshot.misses, 0);
    }
}
