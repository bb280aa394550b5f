//! Label propagation
//!
//! Every vertex starts with its own label. Each pass visits the vertices
//! and moves each one to the label carrying the most edge weight among its
//! neighbours; a vertex whose label is already among the heaviest stays put,
//! otherwise one of the heaviest is picked at random. Passes repeat until
//! one makes no change or the iteration cap is reached.
//!
//! The first pass visits vertices in identity order; later passes use a
//! fresh random permutation so that symmetric neighbourhoods do not move in
//! lock-step.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use affinity_core::{AffinityError, AffinityGroup, AffinityResult};
use affinity_graph::FoldedGraph;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{info, trace, warn};

use crate::{group_by_label, modularity, LabelNode};

/// Label propagation configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropagationConfig {
    /// Upper bound on passes; reaching it returns the current labelling
    pub max_iterations: usize,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
    /// Collect elapsed time, iterations and modularity per run
    pub gather_statistics: bool,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            seed: None,
            gather_statistics: false,
        }
    }
}

/// How a propagation run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropagationOutcome {
    /// Passes executed
    pub iterations: usize,
    /// Whether the last pass made no change
    pub converged: bool,
    /// Label changes during the first pass
    pub changes_first_pass: usize,
}

/// Statistics for one clustering run
#[derive(Debug, Clone, PartialEq)]
pub struct RunStatistics {
    pub elapsed: Duration,
    /// Equals the configured cap when the run did not converge
    pub iterations: usize,
    pub converged: bool,
    pub modularity: f64,
}

/// Result of [`LabelPropagationEngine::cluster`]
#[derive(Debug, Clone)]
pub struct ClusterOutcome {
    /// Sorted by group id
    pub groups: Vec<AffinityGroup>,
    /// Final labels in vertex order
    pub labels: Vec<LabelNode>,
    pub propagation: PropagationOutcome,
    /// Present only when statistics gathering is enabled
    pub statistics: Option<RunStatistics>,
}

/// Label propagation engine
#[derive(Debug, Clone)]
pub struct LabelPropagationEngine {
    config: PropagationConfig,
}

impl LabelPropagationEngine {
    pub fn new(config: PropagationConfig) -> AffinityResult<Self> {
        if config.max_iterations == 0 {
            return Err(AffinityError::InvalidConfig(
                "max iterations must be at least 1".into(),
            ));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &PropagationConfig {
        &self.config
    }

    fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Partition `graph` into affinity groups
    pub fn cluster(&self, graph: &FoldedGraph) -> ClusterOutcome {
        let start = Instant::now();
        let mut labels = LabelNode::initial(graph);
        let mut rng = self.rng();
        let propagation = self.propagate_with(graph, &mut labels, &mut rng);
        let groups = group_by_label(&labels);

        info!(
            identities = graph.vertex_count(),
            groups = groups.len(),
            iterations = propagation.iterations,
            converged = propagation.converged,
            "label propagation finished"
        );

        let statistics = self.config.gather_statistics.then(|| RunStatistics {
            elapsed: start.elapsed(),
            iterations: propagation.iterations,
            converged: propagation.converged,
            modularity: modularity(graph, &groups),
        });

        ClusterOutcome {
            groups,
            labels,
            propagation,
            statistics,
        }
    }

    /// Continue propagation from caller-supplied labels.
    ///
    /// `nodes` must hold one entry per vertex, in vertex order.
    pub fn propagate(
        &self,
        graph: &FoldedGraph,
        nodes: &mut [LabelNode],
    ) -> AffinityResult<PropagationOutcome> {
        check_nodes(graph, nodes)?;
        let mut rng = self.rng();
        Ok(self.propagate_with(graph, nodes, &mut rng))
    }

    fn propagate_with<R: Rng>(
        &self,
        graph: &FoldedGraph,
        nodes: &mut [LabelNode],
        rng: &mut R,
    ) -> PropagationOutcome {
        let mut order: Vec<usize> = (0..nodes.len()).collect();
        let mut outcome = PropagationOutcome {
            iterations: 0,
            converged: false,
            changes_first_pass: 0,
        };

        for iteration in 1..=self.config.max_iterations {
            if iteration > 1 {
                order.shuffle(rng);
            }
            let changes = Self::run_pass(graph, nodes, &order, rng);
            outcome.iterations = iteration;
            if iteration == 1 {
                outcome.changes_first_pass = changes;
            }
            if changes == 0 {
                outcome.converged = true;
                break;
            }
        }

        if !outcome.converged {
            warn!(
                max_iterations = self.config.max_iterations,
                "label propagation stopped at the iteration cap without converging"
            );
        }
        outcome
    }

    /// Run one pass over `order`, returning the number of label changes.
    ///
    /// `nodes` is indexed by vertex; `order` lists the vertices to visit.
    /// Entries of `order` with no matching node are skipped.
    pub fn run_pass<R: Rng>(
        graph: &FoldedGraph,
        nodes: &mut [LabelNode],
        order: &[usize],
        rng: &mut R,
    ) -> usize {
        let mut changes = 0;
        for &v in order {
            let Some(current) = nodes.get(v).map(|node| node.label) else {
                continue;
            };
            let mut weights: BTreeMap<u64, u64> = BTreeMap::new();
            for &(neighbor, weight) in graph.neighbors(v) {
                if let Some(node) = nodes.get(neighbor) {
                    *weights.entry(node.label).or_insert(0) += weight;
                }
            }
            let Some(&max) = weights.values().max() else {
                continue;
            };
            // Ascending label order keeps seeded runs reproducible
            let heaviest: Vec<u64> = weights
                .iter()
                .filter(|(_, w)| **w == max)
                .map(|(label, _)| *label)
                .collect();

            if heaviest.contains(&current) {
                continue;
            }
            if let Some(&label) = heaviest.choose(rng) {
                trace!(vertex = v, from = current, to = label, "label changed");
                nodes[v].label = label;
                changes += 1;
            }
        }
        changes
    }
}

fn check_nodes(graph: &FoldedGraph, nodes: &[LabelNode]) -> AffinityResult<()> {
    if nodes.len() != graph.vertex_count() {
        return Err(AffinityError::InvalidArgument(format!(
            "expected {} label nodes, got {}",
            graph.vertex_count(),
            nodes.len()
        )));
    }
    for (i, node) in nodes.iter().enumerate() {
        if graph.identity(i) != Some(&node.identity) {
            return Err(AffinityError::InvalidArgument(format!(
                "label node {} ({}) does not match the vertex order",
                i, node.identity
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use affinity_core::Identity;
    use affinity_graph::FoldedGraphBuilder;
    use proptest::prelude::*;

    fn id(name: &str) -> Identity {
        Identity::new(name)
    }

    fn engine(max_iterations: usize, seed: u64) -> LabelPropagationEngine {
        LabelPropagationEngine::new(PropagationConfig {
            max_iterations,
            seed: Some(seed),
            gather_statistics: true,
        })
        .unwrap()
    }

    fn two_and_one() -> FoldedGraph {
        let mut builder = FoldedGraphBuilder::new();
        builder
            .add_edge(&id("a"), &id("b"), 2)
            .add_vertex(id("c"));
        builder.build()
    }

    fn two_triangles() -> FoldedGraph {
        let mut builder = FoldedGraphBuilder::new();
        for (x, y) in [("a", "b"), ("b", "c"), ("a", "c"), ("d", "e"), ("e", "f"), ("d", "f")] {
            builder.add_edge(&id(x), &id(y), 5);
        }
        builder.add_edge(&id("c"), &id("d"), 1);
        builder.build()
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let result = LabelPropagationEngine::new(PropagationConfig {
            max_iterations: 0,
            ..Default::default()
        });
        assert!(matches!(result, Err(AffinityError::InvalidConfig(_))));
    }

    #[test]
    fn test_pair_and_singleton() {
        let outcome = engine(10, 1).cluster(&two_and_one());

        assert_eq!(outcome.groups.len(), 2);
        let pair = &outcome.groups[0];
        assert!(pair.contains(&id("a")) && pair.contains(&id("b")));
        assert_eq!(outcome.groups[1].len(), 1);
        assert!(outcome.groups[1].contains(&id("c")));
        assert!(outcome.propagation.converged);
        assert_eq!(outcome.propagation.iterations, 2);

        let stats = outcome.statistics.unwrap();
        assert_eq!(stats.iterations, 2);
        assert!(stats.converged);
    }

    #[test]
    fn test_dense_communities_found() {
        for seed in 0..20 {
            let outcome = engine(100, seed).cluster(&two_triangles());
            assert!(outcome.propagation.converged);
            let left = outcome.groups.iter().find(|g| g.contains(&id("a"))).unwrap();
            assert!(left.contains(&id("b")));
            assert!(left.contains(&id("c")));
            assert!(!left.contains(&id("f")));
        }
    }

    #[test]
    fn test_cap_returns_current_labelling() {
        let outcome = engine(1, 3).cluster(&two_and_one());

        assert!(!outcome.propagation.converged);
        assert_eq!(outcome.propagation.iterations, 1);
        assert_eq!(outcome.statistics.unwrap().iterations, 1);
        // The first pass already merged a into b's label
        assert_eq!(outcome.groups.len(), 2);
    }

    #[test]
    fn test_statistics_off_by_default() {
        let engine = LabelPropagationEngine::new(PropagationConfig::default()).unwrap();
        assert!(engine.cluster(&two_and_one()).statistics.is_none());
    }

    #[test]
    fn test_empty_graph() {
        let outcome = engine(5, 0).cluster(&FoldedGraph::new());
        assert!(outcome.groups.is_empty());
        assert!(outcome.propagation.converged);
        assert_eq!(outcome.statistics.unwrap().modularity, 0.0);
    }

    #[test]
    fn test_seeded_runs_reproduce() {
        let graph = two_triangles();
        let first = engine(100, 42).cluster(&graph);
        let second = engine(100, 42).cluster(&graph);
        assert_eq!(first.groups, second.groups);
        assert_eq!(first.labels, second.labels);
    }

    #[test]
    fn test_stability_bias_under_tie() {
        // a is tied between b's label and c's label and already holds one
        let mut builder = FoldedGraphBuilder::new();
        builder
            .add_edge(&id("a"), &id("b"), 1)
            .add_edge(&id("a"), &id("c"), 1);
        let graph = builder.build();

        for seed in 0..50 {
            let mut nodes = vec![
                LabelNode::new(id("a"), 7),
                LabelNode::new(id("b"), 7),
                LabelNode::new(id("c"), 9),
            ];
            let mut rng = StdRng::seed_from_u64(seed);
            let changes = LabelPropagationEngine::run_pass(&graph, &mut nodes, &[0], &mut rng);
            assert_eq!(changes, 0);
            assert_eq!(nodes[0].label, 7);
        }
    }

    #[test]
    fn test_tie_without_current_label_picks_a_heaviest() {
        let mut builder = FoldedGraphBuilder::new();
        builder
            .add_edge(&id("a"), &id("b"), 1)
            .add_edge(&id("a"), &id("c"), 1);
        let graph = builder.build();

        let mut nodes = vec![
            LabelNode::new(id("a"), 1),
            LabelNode::new(id("b"), 7),
            LabelNode::new(id("c"), 9),
        ];
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(
            LabelPropagationEngine::run_pass(&graph, &mut nodes, &[0], &mut rng),
            1
        );
        assert!(nodes[0].label == 7 || nodes[0].label == 9);
    }

    #[test]
    fn test_pass_skips_unknown_vertices() {
        let graph = two_and_one();
        let mut nodes = LabelNode::initial(&graph);
        let mut rng = StdRng::seed_from_u64(3);

        // Indices past the node slice are ignored, known ones still move
        let changes =
            LabelPropagationEngine::run_pass(&graph, &mut nodes, &[5, 1, usize::MAX], &mut rng);
        assert_eq!(changes, 1);
        assert_eq!(nodes[1].label, nodes[0].label);
        assert_eq!(nodes[2].label, 2);
    }

    #[test]
    fn test_propagate_rejects_mismatched_nodes() {
        let graph = two_and_one();
        let mut nodes = vec![LabelNode::new(id("a"), 0)];
        assert!(matches!(
            engine(5, 0).propagate(&graph, &mut nodes),
            Err(AffinityError::InvalidArgument(_))
        ));

        let mut nodes = vec![
            LabelNode::new(id("b"), 0),
            LabelNode::new(id("a"), 1),
            LabelNode::new(id("c"), 2),
        ];
        assert!(engine(5, 0).propagate(&graph, &mut nodes).is_err());
    }

    fn random_graph() -> impl Strategy<Value = FoldedGraph> {
        prop::collection::vec((0u8..12, 0u8..12, 1u64..5), 0..40).prop_map(|edges| {
            let mut builder = FoldedGraphBuilder::new();
            for (a, b, w) in edges {
                builder.add_edge(&id(&format!("v{}", a)), &id(&format!("v{}", b)), w);
            }
            builder.build()
        })
    }

    proptest! {
        #[test]
        fn prop_converged_labelling_is_idempotent(graph in random_graph(), seed in any::<u64>()) {
            let engine = engine(1000, seed);
            let outcome = engine.cluster(&graph);
            prop_assume!(outcome.propagation.converged);

            let mut labels = outcome.labels.clone();
            let again = engine.propagate(&graph, &mut labels).unwrap();
            prop_assert_eq!(again.changes_first_pass, 0);
            prop_assert_eq!(again.iterations, 1);
            prop_assert_eq!(labels, outcome.labels);
        }

        #[test]
        fn prop_groups_partition_vertices(graph in random_graph(), seed in any::<u64>()) {
            let outcome = engine(200, seed).cluster(&graph);
            let members: usize = outcome.groups.iter().map(|g| g.len()).sum();
            prop_assert_eq!(members, graph.vertex_count());
            for window in outcome.groups.windows(2) {
                prop_assert!(window[0].id() < window[1].id());
            }
        }
    }
}
