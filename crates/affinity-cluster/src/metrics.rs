//! Partition quality metrics
//!
//! ## Modularity
//!
//! Q = Σ_g [ internal(g) / 2m - (incident(g) / 2m)² ]
//!
//! Where:
//! - m = total edge weight of the graph
//! - internal(g) = weight of edges inside g, counted once per direction
//! - incident(g) = weighted degree summed over the members of g
//!
//! ## Jaccard similarity
//!
//! With a = pairs co-grouped in both partitions, b = pairs co-grouped only in
//! the first, c = pairs co-grouped only in the second: J = a / (a + b + c).

use std::collections::HashMap;

use affinity_core::{AffinityGroup, Identity};
use affinity_graph::FoldedGraph;

/// Modularity of `groups` over `graph`.
///
/// Members missing from the graph are ignored. A graph without edge weight
/// scores 0.0.
pub fn modularity(graph: &FoldedGraph, groups: &[AffinityGroup]) -> f64 {
    let m = graph.total_weight() as f64;
    if m == 0.0 {
        return 0.0;
    }
    let two_m = 2.0 * m;

    // vertex -> position in `groups`
    let mut membership: HashMap<usize, usize> = HashMap::new();
    for (g, group) in groups.iter().enumerate() {
        for identity in group.members() {
            if let Some(v) = graph.index_of(identity) {
                membership.insert(v, g);
            }
        }
    }

    let mut internal = vec![0u64; groups.len()];
    for edge in graph.edges() {
        match (membership.get(&edge.a), membership.get(&edge.b)) {
            (Some(ga), Some(gb)) if ga == gb => internal[*ga] += 2 * edge.weight,
            _ => {}
        }
    }

    let mut incident = vec![0u64; groups.len()];
    for (v, g) in &membership {
        incident[*g] += graph.weighted_degree(*v);
    }

    internal
        .iter()
        .zip(&incident)
        .map(|(&inner, &total)| {
            let share = total as f64 / two_m;
            inner as f64 / two_m - share * share
        })
        .sum()
}

fn pair_count(n: u64) -> u64 {
    n * n.saturating_sub(1) / 2
}

/// Jaccard similarity between two partitions of identities.
///
/// Returns 1.0 when neither partition groups any pair together.
pub fn jaccard(first: &[AffinityGroup], second: &[AffinityGroup]) -> f64 {
    let second_group: HashMap<&Identity, u64> = second
        .iter()
        .flat_map(|g| g.members().iter().map(move |m| (m, g.id())))
        .collect();

    // Pairs co-grouped in both: within each first-partition group, members
    // sharing a second-partition group
    let mut both = 0;
    for group in first {
        let mut by_second: HashMap<u64, u64> = HashMap::new();
        for member in group.members() {
            if let Some(g) = second_group.get(member) {
                *by_second.entry(*g).or_insert(0) += 1;
            }
        }
        both += by_second.values().map(|n| pair_count(*n)).sum::<u64>();
    }

    let first_pairs: u64 = first.iter().map(|g| pair_count(g.len() as u64)).sum();
    let second_pairs: u64 = second.iter().map(|g| pair_count(g.len() as u64)).sum();
    let only_first = first_pairs.saturating_sub(both);
    let only_second = second_pairs.saturating_sub(both);

    let total = both + only_first + only_second;
    if total == 0 {
        return 1.0;
    }
    both as f64 / total as f64
}
