//! Access graph store - the live bipartite graph
//!
//! Foreground writers record accesses under one short mutation lock. Heavy
//! readers (folding, object-use reports) copy the graph under that lock and
//! do their work on the copy.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use affinity_core::{AffinityError, AffinityResult, Identity, ObjectId};
use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::{
    BipartiteGraph, EdgeDecay, FoldedGraph, FoldedVertex, GraphFolder, GraphStats, Period,
    PeriodAccumulator,
};

/// Object -> identity -> access weight
pub type ObjectUse = BTreeMap<ObjectId, BTreeMap<Identity, u64>>;

/// Edge changes from subtracting one expired period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphDecay {
    pub edges_decremented: usize,
    pub edges_removed: usize,
    pub vertices_removed: usize,
}

#[derive(Debug, Default)]
struct IdentityIndex {
    seq: u64,
    vertices: HashMap<Identity, FoldedVertex>,
}

/// Live bipartite access graph
#[derive(Debug)]
pub struct AccessGraphStore {
    graph: Mutex<BipartiteGraph>,
    accumulator: Arc<PeriodAccumulator>,
    /// Identity handles from the most recent fold, tagged with its sequence
    identity_index: RwLock<IdentityIndex>,
    /// Issued under the graph lock, so sequence order is snapshot order
    fold_seq: AtomicU64,
    folder: GraphFolder,
    stats: Arc<GraphStats>,
}

impl AccessGraphStore {
    pub fn new(accumulator: Arc<PeriodAccumulator>, stats: Arc<GraphStats>) -> Self {
        Self {
            graph: Mutex::new(BipartiteGraph::new()),
            accumulator,
            identity_index: RwLock::new(IdentityIndex::default()),
            fold_seq: AtomicU64::new(0),
            folder: GraphFolder::new(),
            stats,
        }
    }

    /// Record that `identity` touched each of `objects` once.
    ///
    /// Repeated object ids in one call count once. Absent ids are rejected
    /// before anything is applied.
    pub fn record_accesses<I>(&self, identity: &Identity, objects: I) -> AffinityResult<()>
    where
        I: IntoIterator<Item = ObjectId>,
    {
        let start = Instant::now();
        if identity.is_absent() {
            return Err(AffinityError::InvalidArgument(
                "identity must not be absent".into(),
            ));
        }
        let objects: BTreeSet<ObjectId> = objects.into_iter().collect();
        if objects.iter().any(|o| o.is_absent()) {
            return Err(AffinityError::InvalidArgument(format!(
                "access set for {} contains an absent object id",
                identity
            )));
        }

        let keys: Vec<_> = {
            let mut graph = self.graph.lock();
            objects
                .iter()
                .map(|object| graph.increment_edge(identity, *object))
                .collect()
        };
        self.accumulator.record_edges(&keys);

        self.stats.record_update(start.elapsed());
        Ok(())
    }

    /// Point-in-time copy of the live graph
    pub fn snapshot(&self) -> BipartiteGraph {
        self.graph.lock().clone()
    }

    /// Fold a fresh snapshot and refresh the identity index.
    ///
    /// When folds overlap, the index keeps the one from the newest snapshot.
    pub fn fold(&self) -> FoldedGraph {
        let start = Instant::now();
        let (seq, snapshot) = {
            let graph = self.graph.lock();
            (self.fold_seq.fetch_add(1, Ordering::Relaxed) + 1, graph.clone())
        };
        let folded = self.folder.fold(&snapshot);
        self.install_index(seq, &folded);

        self.stats.record_fold(start.elapsed());
        folded
    }

    /// Replace the identity index unless a newer fold already did
    fn install_index(&self, seq: u64, folded: &FoldedGraph) -> bool {
        let vertices = folded
            .identities()
            .iter()
            .enumerate()
            .map(|(i, identity)| {
                (
                    identity.clone(),
                    FoldedVertex {
                        identity: identity.clone(),
                        index: i,
                    },
                )
            })
            .collect();

        let mut index = self.identity_index.write();
        if seq < index.seq {
            debug!(seq, current = index.seq, "dropping index from an older fold");
            return false;
        }
        *index = IdentityIndex { seq, vertices };
        true
    }

    /// Handle for `identity` as of the most recent fold.
    ///
    /// May lag the live graph until the next fold.
    pub fn vertex_for(&self, identity: &Identity) -> Option<FoldedVertex> {
        self.identity_index.read().vertices.get(identity).cloned()
    }

    /// Identities and weights per object, from a snapshot
    pub fn object_use(&self) -> ObjectUse {
        let snapshot = self.snapshot();
        snapshot
            .objects()
            .map(|object| {
                let users = snapshot
                    .object_edges(object)
                    .map(|(identity, weight)| (identity.clone(), weight))
                    .collect();
                (object, users)
            })
            .collect()
    }

    /// Current weight of the (`identity`, `object`) edge
    pub fn edge_weight(&self, identity: &Identity, object: ObjectId) -> Option<u64> {
        self.graph.lock().edge_weight(identity, object)
    }

    pub fn identity_count(&self) -> usize {
        self.graph.lock().identity_count()
    }

    pub fn object_count(&self) -> usize {
        self.graph.lock().object_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.lock().edge_count()
    }

    pub fn stats(&self) -> &Arc<GraphStats> {
        &self.stats
    }

    pub fn accumulator(&self) -> &Arc<PeriodAccumulator> {
        &self.accumulator
    }

    /// Subtract an expired period's edge deltas from the live graph
    pub(crate) fn apply_expired(&self, period: &Period) -> GraphDecay {
        let mut decay = GraphDecay::default();
        let mut graph = self.graph.lock();
        for (key, n) in period.edge_deltas() {
            match graph.decay_edge(key, n) {
                EdgeDecay::Missing => {
                    debug!(?key, "expired delta for an edge that no longer exists");
                }
                EdgeDecay::Decremented(_) => decay.edges_decremented += 1,
                EdgeDecay::Removed { vertices_removed } => {
                    decay.edges_removed += 1;
                    decay.vertices_removed += vertices_removed;
                }
            }
        }
        decay
    }
}
