//! Label bookkeeping for a single propagation run

use std::collections::{BTreeMap, BTreeSet};

use affinity_core::{AffinityGroup, Identity};
use affinity_graph::FoldedGraph;

/// An identity and its current label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelNode {
    pub identity: Identity,
    pub label: u64,
}

impl LabelNode {
    pub fn new(identity: Identity, label: u64) -> Self {
        Self { identity, label }
    }

    /// One node per vertex of `graph`, in vertex order, labelled with the
    /// vertex index. Distinct vertices never share an initial label.
    pub fn initial(graph: &FoldedGraph) -> Vec<LabelNode> {
        graph
            .identities()
            .iter()
            .enumerate()
            .map(|(i, identity)| LabelNode::new(identity.clone(), i as u64))
            .collect()
    }
}

/// Group nodes by label. Groups come back sorted by id.
pub fn group_by_label(nodes: &[LabelNode]) -> Vec<AffinityGroup> {
    let mut groups: BTreeMap<u64, BTreeSet<Identity>> = BTreeMap::new();
    for node in nodes {
        groups
            .entry(node.label)
            .or_default()
            .insert(node.identity.clone());
    }
    groups
        .into_iter()
        .map(|(id, members)| AffinityGroup::new(id, members))
        .collect()
}
