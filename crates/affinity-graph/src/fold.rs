//! Graph folding - project the bipartite graph onto its identities
//!
//! Two identities are linked when they touched a common object. Each shared
//! object contributes `min(w1, w2)` of the two access edges, and the
//! contributions over all shared objects are summed into a single edge.

use std::cmp::min;
use std::collections::{HashMap, HashSet};

use affinity_core::{Identity, ObjectId};
use tracing::debug;

use crate::{BipartiteGraph, FoldedGraph, FoldedGraphBuilder};

/// Folds bipartite snapshots into identity graphs
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphFolder;

impl GraphFolder {
    pub fn new() -> Self {
        GraphFolder
    }

    /// Fold `graph` into a unipartite identity graph.
    ///
    /// Every identity appears as a vertex, including those sharing no object
    /// with anyone else.
    pub fn fold(&self, graph: &BipartiteGraph) -> FoldedGraph {
        let mut builder = FoldedGraphBuilder::new();
        for identity in graph.identities() {
            builder.add_vertex(identity.clone());
        }

        // Pair contributions per object dominate the cost: size for
        // sum(deg * (deg - 1) / 2) over objects.
        let paths: usize = graph
            .objects()
            .map(|o| {
                let d = graph.object_edges(o).count();
                d * d.saturating_sub(1) / 2
            })
            .sum();

        // (v1, v2, object) triples already counted, v1 < v2
        let mut seen: HashSet<(&Identity, &Identity, ObjectId)> = HashSet::with_capacity(paths);
        let mut weights: HashMap<(&Identity, &Identity), u64> = HashMap::new();

        for v1 in graph.identities() {
            for (object, w1) in graph.identity_edges(v1) {
                for (v2, w2) in graph.object_edges(object) {
                    if v2 == v1 {
                        continue;
                    }
                    let pair = if v1 < v2 { (v1, v2) } else { (v2, v1) };
                    if !seen.insert((pair.0, pair.1, object)) {
                        // Reached this path from the other end already
                        continue;
                    }
                    *weights.entry(pair).or_insert(0) += min(w1, w2);
                }
            }
        }

        for ((a, b), weight) in &weights {
            builder.add_edge(a, b, *weight);
        }
        let folded = builder.build();

        debug!(
            identities = folded.vertex_count(),
            edges = folded.edge_count(),
            paths = seen.len(),
            "folded access graph"
        );
        folded
    }
}
