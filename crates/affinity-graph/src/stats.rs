//! Graph statistics
//!
//! Lock-free counters shared between the store, the pruner and any
//! attached monitor.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Live counters for one affinity graph
#[derive(Debug)]
pub struct GraphStats {
    update_count: AtomicU64,
    prune_count: AtomicU64,
    fold_count: AtomicU64,
    /// Microseconds spent recording, pruning and folding
    processing_time_us: AtomicU64,
    period_count: usize,
    snapshot_interval: Duration,
}

/// Point-in-time copy of [`GraphStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphStatsSnapshot {
    pub update_count: u64,
    pub prune_count: u64,
    pub fold_count: u64,
    pub processing_time: Duration,
    pub period_count: usize,
    pub snapshot_interval: Duration,
}

impl GraphStats {
    pub fn new(period_count: usize, snapshot_interval: Duration) -> Self {
        Self {
            update_count: AtomicU64::new(0),
            prune_count: AtomicU64::new(0),
            fold_count: AtomicU64::new(0),
            processing_time_us: AtomicU64::new(0),
            period_count,
            snapshot_interval,
        }
    }

    fn add_time(&self, elapsed: Duration) {
        let us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.processing_time_us.fetch_add(us, Ordering::Relaxed);
    }

    /// Record one `record_accesses` call and the time it took
    pub fn record_update(&self, elapsed: Duration) {
        self.update_count.fetch_add(1, Ordering::Relaxed);
        self.add_time(elapsed);
    }

    /// Record one window rotation
    pub fn record_prune(&self, elapsed: Duration) {
        self.prune_count.fetch_add(1, Ordering::Relaxed);
        self.add_time(elapsed);
    }

    pub fn record_fold(&self, elapsed: Duration) {
        self.fold_count.fetch_add(1, Ordering::Relaxed);
        self.add_time(elapsed);
    }

    pub fn update_count(&self) -> u64 {
        self.update_count.load(Ordering::Relaxed)
    }

    pub fn prune_count(&self) -> u64 {
        self.prune_count.load(Ordering::Relaxed)
    }

    pub fn fold_count(&self) -> u64 {
        self.fold_count.load(Ordering::Relaxed)
    }

    pub fn processing_time(&self) -> Duration {
        Duration::from_micros(self.processing_time_us.load(Ordering::Relaxed))
    }

    pub fn period_count(&self) -> usize {
        self.period_count
    }

    pub fn snapshot_interval(&self) -> Duration {
        self.snapshot_interval
    }

    pub fn snapshot(&self) -> GraphStatsSnapshot {
        GraphStatsSnapshot {
            update_count: self.update_count(),
            prune_count: self.prune_count(),
            fold_count: self.fold_count(),
            processing_time: self.processing_time(),
            period_count: self.period_count,
            snapshot_interval: self.snapshot_interval,
        }
    }
}
