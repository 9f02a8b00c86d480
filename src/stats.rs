//! Cached mining statistics
//!
//! The engine exposes no structured introspection, so the bridge keeps its own
//! snapshot. Every field is an independent atomic cell: readers never see a torn
//! value, but may see fields written at different times. Writers are the running
//! worker, the engine log parser and external callers of [`StatsCache::update`];
//! the last write wins.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Point-in-time view of the cached statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Hash rate over the last 10 seconds (H/s)
    pub hashrate_10s: f64,
    /// Hash rate over the last 60 seconds (H/s)
    pub hashrate_60s: f64,
    /// Hash rate over the last 15 minutes (H/s)
    pub hashrate_15m: f64,
    /// Total hashes reported by the worker
    pub total_hashes: u64,
    /// Shares accepted by the pool
    pub accepted_shares: u64,
    /// Shares rejected by the pool
    pub rejected_shares: u64,
    /// Whether a worker is active
    pub is_mining: bool,
    /// Thread count
    pub threads: u32,
}

impl StatsSnapshot {
    /// Percentage of submitted shares that were accepted
    pub fn success_rate(&self) -> f64 {
        let total = self.accepted_shares + self.rejected_shares;
        crate::utils::percentage(self.accepted_shares as f64, total as f64)
    }
}

/// `f64` stored as its bit pattern
#[derive(Debug, Default)]
struct AtomicF64(AtomicU64);

impl AtomicF64 {
    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Lock-free statistics cache shared between the controller, the worker and
/// external updaters
#[derive(Debug, Default)]
pub struct StatsCache {
    hashrate_10s: AtomicF64,
    hashrate_60s: AtomicF64,
    hashrate_15m: AtomicF64,
    total_hashes: AtomicU64,
    accepted_shares: AtomicU64,
    rejected_shares: AtomicU64,
    threads: AtomicU32,
    difficulty: AtomicU64,
}

impl StatsCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the hash rates, share counters and thread count
    pub fn update(
        &self,
        hashrate_10s: f64,
        hashrate_60s: f64,
        hashrate_15m: f64,
        accepted: u64,
        rejected: u64,
        threads: u32,
    ) {
        self.set_hashrate(hashrate_10s, hashrate_60s, hashrate_15m);
        self.set_shares(accepted, rejected);
        self.threads.store(threads, Ordering::Relaxed);
    }

    /// Overwrite the three hash rate windows
    pub fn set_hashrate(&self, hashrate_10s: f64, hashrate_60s: f64, hashrate_15m: f64) {
        self.hashrate_10s.store(sanitize(hashrate_10s));
        self.hashrate_60s.store(sanitize(hashrate_60s));
        self.hashrate_15m.store(sanitize(hashrate_15m));
    }

    /// Add to the total hash counter
    pub fn record_hashes(&self, hashes: u64) {
        self.total_hashes.fetch_add(hashes, Ordering::Relaxed);
    }

    /// Count one accepted share
    pub fn record_accepted(&self) {
        self.accepted_shares.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one rejected share
    pub fn record_rejected(&self) {
        self.rejected_shares.fetch_add(1, Ordering::Relaxed);
    }

    /// Overwrite both share counters
    pub fn set_shares(&self, accepted: u64, rejected: u64) {
        self.accepted_shares.store(accepted, Ordering::Relaxed);
        self.rejected_shares.store(rejected, Ordering::Relaxed);
    }

    /// Remember the latest pool difficulty
    pub fn set_difficulty(&self, difficulty: u64) {
        self.difficulty.store(difficulty, Ordering::Relaxed);
    }

    /// Latest pool difficulty seen in the engine output
    pub fn difficulty(&self) -> u64 {
        self.difficulty.load(Ordering::Relaxed)
    }

    /// Set the cached thread count
    pub fn set_threads(&self, threads: u32) {
        self.threads.store(threads, Ordering::Relaxed);
    }

    /// Cached thread count
    pub fn threads(&self) -> u32 {
        self.threads.load(Ordering::Relaxed)
    }

    /// 10-second hash rate
    pub fn hashrate_10s(&self) -> f64 {
        self.hashrate_10s.load()
    }

    /// Read every field; `is_mining` is supplied by the caller
    pub fn snapshot(&self, is_mining: bool) -> StatsSnapshot {
        StatsSnapshot {
            hashrate_10s: self.hashrate_10s.load(),
            hashrate_60s: self.hashrate_60s.load(),
            hashrate_15m: self.hashrate_15m.load(),
            total_hashes: self.total_hashes.load(Ordering::Relaxed),
            accepted_shares: self.accepted_shares.load(Ordering::Relaxed),
            rejected_shares: self.rejected_shares.load(Ordering::Relaxed),
            is_mining,
            threads: self.threads.load(Ordering::Relaxed),
        }
    }

    /// Zero every field
    pub fn reset(&self) {
        self.set_hashrate(0.0, 0.0, 0.0);
        self.total_hashes.store(0, Ordering::Relaxed);
        self.accepted_shares.store(0, Ordering::Relaxed);
        self.rejected_shares.store(0, Ordering::Relaxed);
        self.threads.store(0, Ordering::Relaxed);
        self.difficulty.store(0, Ordering::Relaxed);
    }
}

// NaN and negative rates come from garbled engine output; store zero instead.
fn sanitize(rate: f64) -> f64 {
    if rate.is_finite() && rate > 0.0 {
        rate
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_initial_stats_are_zero() {
        let cache = StatsCache::new();
        assert_eq!(cache.snapshot(false), StatsSnapshot::default());
    }

    #[test]
    fn test_update_overwrites_all_fields() {
        let cache = StatsCache::new();
        cache.record_accepted();
        cache.update(100.0, 150.0, 200.0, 7, 2, 4);

        let snapshot = cache.snapshot(true);
        assert_eq!(snapshot.hashrate_10s, 100.0);
        assert_eq!(snapshot.hashrate_60s, 150.0);
        assert_eq!(snapshot.hashrate_15m, 200.0);
        assert_eq!(snapshot.accepted_shares, 7);
        assert_eq!(snapshot.rejected_shares, 2);
        assert_eq!(snapshot.threads, 4);
        assert!(snapshot.is_mining);
    }

    #[test]
    fn test_counters_accumulate() {
        let cache = StatsCache::new();
        for _ in 0..5 {
            cache.record_accepted();
        }
        for _ in 0..3 {
            cache.record_rejected();
        }
        cache.record_hashes(1_000);
        cache.record_hashes(500);

        let snapshot = cache.snapshot(true);
        assert_eq!(snapshot.accepted_shares, 5);
        assert_eq!(snapshot.rejected_shares, 3);
        assert_eq!(snapshot.total_hashes, 1_500);
        assert_eq!(snapshot.success_rate(), 62.5);
    }

    #[test]
    fn test_invalid_rates_are_zeroed() {
        let cache = StatsCache::new();
        cache.set_hashrate(f64::NAN, -4.0, f64::INFINITY);
        let snapshot = cache.snapshot(false);
        assert_eq!(snapshot.hashrate_10s, 0.0);
        assert_eq!(snapshot.hashrate_60s, 0.0);
        assert_eq!(snapshot.hashrate_15m, 0.0);
    }

    #[test]
    fn test_reset_clears_everything() {
        let cache = StatsCache::new();
        cache.update(1.0, 2.0, 3.0, 4, 5, 6);
        cache.record_hashes(10);
        cache.set_difficulty(75_000);

        cache.reset();
        assert_eq!(cache.snapshot(false), StatsSnapshot::default());
        assert_eq!(cache.difficulty(), 0);
    }

    #[test]
    fn test_success_rate_without_shares() {
        assert_eq!(StatsSnapshot::default().success_rate(), 0.0);
    }

    #[test]
    fn test_concurrent_writers_last_write_wins() {
        let cache = Arc::new(StatsCache::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for _ in 0..1_000 {
                        cache.update(i as f64 + 1.0, 0.0, 0.0, i, 0, i as u32);
                        cache.record_hashes(1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = cache.snapshot(true);
        assert_eq!(snapshot.total_hashes, 4_000);
        assert!((1.0..=4.0).contains(&snapshot.hashrate_10s));
        assert!(snapshot.threads < 4);
    }
}
