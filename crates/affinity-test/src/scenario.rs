//! End-to-end scenarios
//!
//! Feeds a generated workload through an `AffinityGraphBuilder`, clusters
//! it, and scores the found groups against the planted communities.

use std::time::{Duration, Instant};

use affinity_cluster::{jaccard, modularity};
use affinity_core::{AffinityGroup, AffinityResult};
use affinity_runtime::{AffinityConfig, AffinityGraphBuilder};
use tracing::info;

use crate::{WorkloadConfig, WorkloadGenerator};

/// Outcome of one scenario
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub groups: Vec<AffinityGroup>,
    pub planted: Vec<AffinityGroup>,
    /// Similarity of found groups to the planted partition
    pub jaccard: f64,
    /// Modularity of the found groups
    pub modularity: f64,
    pub events: usize,
    pub folded_edges: usize,
    pub elapsed: Duration,
}

impl ScenarioResult {
    /// Check the found groups against a Jaccard threshold
    pub fn passed(&self, min_jaccard: f64) -> bool {
        self.jaccard >= min_jaccard
    }
}

/// Run `workload` through a builder configured by `affinity`
pub fn run_scenario(
    workload: WorkloadConfig,
    affinity: AffinityConfig,
) -> AffinityResult<ScenarioResult> {
    let start = Instant::now();
    let builder = AffinityGraphBuilder::new(affinity)?;
    let mut generator = WorkloadGenerator::new(workload);
    let planted = generator.planted();
    let events = generator.events();

    for event in &events {
        builder.record_accesses(&event.identity, event.objects.iter().copied())?;
    }

    let graph = builder.folded_graph();
    let groups = builder.find_affinity_groups();
    let result = ScenarioResult {
        jaccard: jaccard(&groups, &planted),
        modularity: modularity(&graph, &groups),
        events: events.len(),
        folded_edges: graph.edge_count(),
        elapsed: start.elapsed(),
        groups,
        planted,
    };

    info!(
        events = result.events,
        groups = result.groups.len(),
        planted = result.planted.len(),
        jaccard = result.jaccard,
        modularity = result.modularity,
        "scenario finished"
    );
    Ok(result)
}
