//! Background prune worker
//!
//! A tokio task that runs one window rotation per snapshot interval. The
//! first rotation happens one full interval after start. Rotations take
//! blocking locks, so each one runs on the blocking pool.

use std::time::Duration;

use affinity_core::{AffinityError, AffinityResult};
use affinity_graph::PruneTask;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Handle to a running prune loop
#[derive(Debug)]
pub struct PruneWorker {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl PruneWorker {
    /// Spawn the loop on the current tokio runtime
    pub fn start(task: PruneTask, interval: Duration) -> AffinityResult<Self> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| AffinityError::WorkerUnavailable)?;
        if interval.is_zero() {
            return Err(AffinityError::InvalidConfig(
                "prune interval must be non-zero".into(),
            ));
        }

        let (shutdown, mut stop) = watch::channel(false);
        let handle = runtime.spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let task = task.clone();
                        if let Err(e) = tokio::task::spawn_blocking(move || task.run()).await {
                            warn!("prune rotation failed: {}", e);
                        }
                    }
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("prune worker stopped");
        });

        debug!(interval_ms = interval.as_millis() as u64, "prune worker started");
        Ok(Self { shutdown, handle })
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop rotating and wait for the loop to exit
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            warn!("prune worker ended abnormally: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use affinity_core::{Identity, ObjectId};
    use affinity_graph::{AccessGraphStore, ConflictMap, GraphStats, PeriodAccumulator};
    use std::sync::Arc;

    fn task() -> (PruneTask, Arc<AccessGraphStore>) {
        let accumulator = Arc::new(PeriodAccumulator::new(1).unwrap());
        let stats = Arc::new(GraphStats::new(1, Duration::from_millis(10)));
        let store = Arc::new(AccessGraphStore::new(Arc::clone(&accumulator), stats));
        let conflicts = Arc::new(ConflictMap::new(accumulator));
        (PruneTask::new(Arc::clone(&store), conflicts), store)
    }

    #[test]
    fn test_start_requires_runtime() {
        let (task, _) = task();
        assert!(matches!(
            PruneWorker::start(task, Duration::from_millis(10)),
            Err(AffinityError::WorkerUnavailable)
        ));
    }

    #[tokio::test]
    async fn test_worker_rotates_and_stops() {
        let (task, store) = task();
        store
            .record_accesses(&Identity::new("a"), [ObjectId::new(1)])
            .unwrap();

        let worker = PruneWorker::start(task, Duration::from_millis(10)).unwrap();
        assert!(worker.is_running());
        time::sleep(Duration::from_millis(200)).await;
        worker.stop().await;

        let rotations = store.stats().prune_count();
        assert!(rotations >= 2);
        assert_eq!(store.edge_count(), 0);

        // No rotations after stop
        time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.stats().prune_count(), rotations);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_rotation_after_one_interval() {
        let (task, store) = task();
        let worker = PruneWorker::start(task, Duration::from_secs(60)).unwrap();

        time::sleep(Duration::from_secs(59)).await;
        assert_eq!(store.stats().prune_count(), 0);
        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(store.stats().prune_count(), 1);
        worker.stop().await;
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_rotation_does_not_block_runtime_thread() {
        let (task, store) = task();
        let worker = PruneWorker::start(task, Duration::from_millis(5)).unwrap();

        // Foreground work keeps running on the single runtime thread
        for i in 0..20u64 {
            store
                .record_accesses(&Identity::new("a"), [ObjectId::new(1 + i)])
                .unwrap();
            time::sleep(Duration::from_millis(2)).await;
        }
        time::sleep(Duration::from_millis(50)).await;
        worker.stop().await;

        assert!(store.stats().prune_count() >= 2);
        assert_eq!(store.stats().update_count(), 20);
    }
}
