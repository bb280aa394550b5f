//! Prune task - one window rotation
//!
//! Closes the open period and, once the window is full, subtracts the
//! oldest period from the live graph and the conflict map. The background
//! worker and manual triggers both run this.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::{AccessGraphStore, ConflictMap, GraphDecay};

/// Outcome of one rotation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Whether a period expired (false while the window fills)
    pub consumed: bool,
    pub edges_decremented: usize,
    pub edges_removed: usize,
    pub vertices_removed: usize,
    pub conflicts_cleared: usize,
}

/// Rotates the window shared by a store and a conflict map
#[derive(Debug, Clone)]
pub struct PruneTask {
    store: Arc<AccessGraphStore>,
    conflicts: Arc<ConflictMap>,
}

impl PruneTask {
    pub fn new(store: Arc<AccessGraphStore>, conflicts: Arc<ConflictMap>) -> Self {
        Self { store, conflicts }
    }

    pub fn run(&self) -> PruneReport {
        let start = Instant::now();
        let expired = self.store.accumulator().rotate();

        let report = match expired {
            None => PruneReport::default(),
            Some(period) => {
                let GraphDecay {
                    edges_decremented,
                    edges_removed,
                    vertices_removed,
                } = self.store.apply_expired(&period);
                let conflicts_cleared = self.conflicts.apply_expired(&period);
                PruneReport {
                    consumed: true,
                    edges_decremented,
                    edges_removed,
                    vertices_removed,
                    conflicts_cleared,
                }
            }
        };

        self.store.stats().record_prune(start.elapsed());
        if report.consumed {
            debug!(
                edges_decremented = report.edges_decremented,
                edges_removed = report.edges_removed,
                vertices_removed = report.vertices_removed,
                conflicts_cleared = report.conflicts_cleared,
                "pruned expired period"
            );
        }
        report
    }
}
