//! Affinity graph builder - the embedding facade
//!
//! Owns the live access graph, the conflict map and their shared window,
//! and answers the placement layer's queries: the folded graph, affinity
//! groups, conflict summaries and run statistics.

use std::sync::Arc;

use affinity_cluster::{LabelPropagationEngine, RunStatistics};
use affinity_core::{AffinityGroup, AffinityResult, Identity, NodeId, ObjectId};
use affinity_graph::{
    AccessGraphStore, ConflictMap, ConflictSummary, FoldedGraph, FoldedVertex, GraphStats,
    GraphStatsSnapshot, ObjectUse, PeriodAccumulator, PruneReport, PruneTask,
};
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::{AffinityConfig, MonitorHook, PruneWorker};

/// Affinity graph builder
pub struct AffinityGraphBuilder {
    config: AffinityConfig,
    store: Arc<AccessGraphStore>,
    conflicts: Arc<ConflictMap>,
    prune: PruneTask,
    engine: LabelPropagationEngine,
    last_run: RwLock<Option<RunStatistics>>,
    hooks: RwLock<Vec<Box<dyn MonitorHook>>>,
    worker: Mutex<Option<PruneWorker>>,
}

impl AffinityGraphBuilder {
    pub fn new(config: AffinityConfig) -> AffinityResult<Self> {
        config.validate()?;
        let accumulator = Arc::new(PeriodAccumulator::new(config.period_count)?);
        let stats = Arc::new(GraphStats::new(
            config.period_count,
            config.snapshot_interval,
        ));
        let store = Arc::new(AccessGraphStore::new(Arc::clone(&accumulator), stats));
        let conflicts = Arc::new(ConflictMap::new(accumulator));
        let prune = PruneTask::new(Arc::clone(&store), Arc::clone(&conflicts));
        let engine = LabelPropagationEngine::new(config.propagation())?;

        Ok(Self {
            config,
            store,
            conflicts,
            prune,
            engine,
            last_run: RwLock::new(None),
            hooks: RwLock::new(Vec::new()),
            worker: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &AffinityConfig {
        &self.config
    }

    /// Record one unit of work by `identity` touching `objects`
    pub fn record_accesses<I>(&self, identity: &Identity, objects: I) -> AffinityResult<()>
    where
        I: IntoIterator<Item = ObjectId>,
    {
        self.store.record_accesses(identity, objects)
    }

    /// Record that `node` forced `object` out of the local cache.
    ///
    /// Reports for removed nodes are accepted and ignored.
    pub fn record_conflict(&self, object: ObjectId, node: NodeId) -> AffinityResult<()> {
        self.conflicts.record(object, node).map(|_| ())
    }

    /// Forget all conflicts with a node that went down
    pub fn remove_node(&self, node: NodeId) {
        self.conflicts.remove_node(node);
    }

    /// Fold the current access graph
    pub fn folded_graph(&self) -> FoldedGraph {
        self.store.fold()
    }

    /// Fold and cluster, returning groups sorted by id
    pub fn find_affinity_groups(&self) -> Vec<AffinityGroup> {
        let graph = self.store.fold();
        let outcome = self.engine.cluster(&graph);

        if let Some(statistics) = outcome.statistics {
            for hook in self.hooks.read().iter() {
                hook.run_completed(&statistics);
            }
            *self.last_run.write() = Some(statistics);
        }
        outcome.groups
    }

    pub fn conflict_summary(&self) -> ConflictSummary {
        self.conflicts.summary()
    }

    /// Statistics of the latest clustering run, when gathering is enabled
    pub fn last_run_statistics(&self) -> Option<RunStatistics> {
        self.last_run.read().clone()
    }

    /// Handle for `identity` as of the latest fold
    pub fn vertex_for(&self, identity: &Identity) -> Option<FoldedVertex> {
        self.store.vertex_for(identity)
    }

    pub fn object_use(&self) -> ObjectUse {
        self.store.object_use()
    }

    pub fn identity_count(&self) -> usize {
        self.store.identity_count()
    }

    pub fn object_count(&self) -> usize {
        self.store.object_count()
    }

    pub fn edge_count(&self) -> usize {
        self.store.edge_count()
    }

    pub fn stats(&self) -> GraphStatsSnapshot {
        self.store.stats().snapshot()
    }

    /// Run one window rotation now
    pub fn prune_now(&self) -> PruneReport {
        self.prune.run()
    }

    /// Start rotating the window every snapshot interval.
    ///
    /// Requires a tokio runtime. Starting twice is a no-op.
    pub fn start_pruner(&self) -> AffinityResult<()> {
        let mut worker = self.worker.lock();
        if worker.as_ref().is_some_and(|w| w.is_running()) {
            debug!("prune worker already running");
            return Ok(());
        }
        *worker = Some(PruneWorker::start(
            self.prune.clone(),
            self.config.snapshot_interval,
        )?);
        Ok(())
    }

    pub fn pruner_running(&self) -> bool {
        self.worker.lock().as_ref().is_some_and(|w| w.is_running())
    }

    /// Attach a monitor. Returns false if the hook refused to attach; the
    /// failure is logged and the hook dropped.
    pub fn register_hook(&self, hook: Box<dyn MonitorHook>) -> bool {
        match hook.attach(self.store.stats()) {
            Ok(()) => {
                self.hooks.write().push(hook);
                true
            }
            Err(e) => {
                warn!("ignoring monitor hook: {}", e);
                false
            }
        }
    }

    /// Stop the prune worker, if any, and wait for it
    pub async fn shutdown(&self) {
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            worker.stop().await;
            info!("affinity graph builder shut down");
        }
    }
}
