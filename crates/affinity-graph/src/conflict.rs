//! Conflict map - cross-node data cache conflicts
//!
//! The distributed cache reports each time a remote node forced an object
//! out of the local cache. Counts age out through the same window as graph
//! edges. Entries are guarded per remote node so reports against different
//! nodes do not contend.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use affinity_core::{AffinityError, AffinityResult, NodeId, ObjectId};
use dashmap::{DashMap, DashSet};
use tracing::debug;

use crate::{Period, PeriodAccumulator};

/// Read-only copy of the conflict map: node -> object -> count
pub type ConflictSummary = BTreeMap<NodeId, BTreeMap<ObjectId, u64>>;

/// Accumulated conflict counts per remote node
#[derive(Debug)]
pub struct ConflictMap {
    nodes: DashMap<NodeId, HashMap<ObjectId, u64>>,
    /// Nodes declared down. Node ids are not reused, so this grows by one
    /// entry per node-down event for the lifetime of the map.
    removed: DashSet<NodeId>,
    accumulator: Arc<PeriodAccumulator>,
}

impl ConflictMap {
    pub fn new(accumulator: Arc<PeriodAccumulator>) -> Self {
        Self {
            nodes: DashMap::new(),
            removed: DashSet::new(),
            accumulator,
        }
    }

    /// Note a conflict with `node` over `object`.
    ///
    /// Returns `Ok(false)` when the node has been removed; such reports are
    /// dropped.
    pub fn record(&self, object: ObjectId, node: NodeId) -> AffinityResult<bool> {
        if object.is_absent() {
            return Err(AffinityError::InvalidArgument(
                "conflict object id must not be absent".into(),
            ));
        }

        {
            // remove_node tombstones before it takes this shard, so the check
            // under the entry guard cannot miss a concurrent removal
            let entry = self.nodes.entry(node);
            if self.removed.contains(&node) {
                debug!(%node, %object, "ignoring conflict for removed node");
                return Ok(false);
            }
            *entry.or_default().entry(object).or_insert(0) += 1;
        }
        self.accumulator.record_conflict(node, object);
        Ok(true)
    }

    /// Drop everything known about `node` immediately
    pub fn remove_node(&self, node: NodeId) {
        self.removed.insert(node);
        if self.nodes.remove(&node).is_some() {
            debug!(%node, "removed conflict history for node");
        }
    }

    /// Subtract an expired period's conflict deltas. Returns the number of
    /// object entries that reached zero.
    pub fn apply_expired(&self, period: &Period) -> usize {
        let mut cleared = 0;
        for (node, deltas) in period.conflict_deltas() {
            // The node may have gone down since
            let Some(mut objects) = self.nodes.get_mut(&node) else {
                continue;
            };
            for (object, n) in deltas {
                let remaining = objects
                    .get(object)
                    .map(|count| count.saturating_sub(*n))
                    .unwrap_or(0);
                if remaining == 0 {
                    if objects.remove(object).is_some() {
                        cleared += 1;
                    }
                } else {
                    objects.insert(*object, remaining);
                }
            }
            drop(objects);
            self.nodes.remove_if(&node, |_, objects| objects.is_empty());
        }
        cleared
    }

    /// Current count for (`node`, `object`)
    pub fn count(&self, node: NodeId, object: ObjectId) -> u64 {
        self.nodes
            .get(&node)
            .and_then(|m| m.get(&object).copied())
            .unwrap_or(0)
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.contains_key(&node)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of nodes declared down so far
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    /// Point-in-time copy of every count
    pub fn summary(&self) -> ConflictSummary {
        self.nodes
            .iter()
            .map(|entry| {
                let objects: BTreeMap<ObjectId, u64> =
                    entry.value().iter().map(|(o, n)| (*o, *n)).collect();
                (*entry.key(), objects)
            })
            .collect()
    }
}
