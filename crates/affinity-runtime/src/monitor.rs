//! Monitoring hooks
//!
//! Optional observers attached to a builder. A hook that fails to attach is
//! logged and dropped; it never stops the pipeline.

use std::sync::Arc;

use affinity_cluster::RunStatistics;
use affinity_core::AffinityResult;
use affinity_graph::GraphStats;
use tracing::info;

/// Observer for graph counters and clustering runs
pub trait MonitorHook: Send + Sync {
    /// Called once on registration with the live counters
    fn attach(&self, stats: &Arc<GraphStats>) -> AffinityResult<()>;

    /// Called after each clustering run that gathered statistics
    fn run_completed(&self, statistics: &RunStatistics);
}

/// Logs each clustering run at `info`
#[derive(Debug, Default)]
pub struct LoggingMonitor;

impl MonitorHook for LoggingMonitor {
    fn attach(&self, stats: &Arc<GraphStats>) -> AffinityResult<()> {
        info!(
            period_count = stats.period_count(),
            snapshot_interval_ms = stats.snapshot_interval().as_millis() as u64,
            "affinity monitor attached"
        );
        Ok(())
    }

    fn run_completed(&self, statistics: &RunStatistics) {
        info!(
            elapsed_us = statistics.elapsed.as_micros() as u64,
            iterations = statistics.iterations,
            converged = statistics.converged,
            modularity = statistics.modularity,
            "affinity groups computed"
        );
    }
}
