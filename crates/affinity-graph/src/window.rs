//! Sliding window - per-period deltas for aging out stale data
//!
//! Every increment to the live graph or conflict map is also noted in the
//! open period. Each rotation closes the open period and queues it; once the
//! window holds more than `period_count` closed periods, the oldest is handed
//! back to be subtracted from live state.

use std::collections::{HashMap, VecDeque};

use affinity_core::{AffinityError, AffinityResult, NodeId, ObjectId};
use parking_lot::Mutex;
use tracing::debug;

use crate::EdgeKey;

/// Deltas observed during one period
///
/// Open while it sits at the back of the window; closed (and never written
/// again) once a rotation pushes a newer period behind it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Period {
    edge_increments: HashMap<EdgeKey, u64>,
    conflicts: HashMap<NodeId, HashMap<ObjectId, u64>>,
}

impl Period {
    /// Edge -> number of increments in this period
    pub fn edge_deltas(&self) -> impl Iterator<Item = (EdgeKey, u64)> + '_ {
        self.edge_increments.iter().map(|(k, n)| (*k, *n))
    }

    /// Remote node -> object -> number of conflicts in this period
    pub fn conflict_deltas(&self) -> impl Iterator<Item = (NodeId, &HashMap<ObjectId, u64>)> {
        self.conflicts.iter().map(|(n, m)| (*n, m))
    }

    pub fn edge_delta(&self, key: EdgeKey) -> u64 {
        self.edge_increments.get(&key).copied().unwrap_or(0)
    }

    pub fn conflict_delta(&self, node: NodeId, object: ObjectId) -> u64 {
        self.conflicts
            .get(&node)
            .and_then(|m| m.get(&object))
            .copied()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.edge_increments.is_empty() && self.conflicts.is_empty()
    }
}

#[derive(Debug)]
struct WindowState {
    /// Rotations seen while the window is still filling, starting at 1
    current: usize,
    /// Oldest at the front; the open period is always at the back
    queue: VecDeque<Period>,
}

impl WindowState {
    fn open(&mut self) -> &mut Period {
        if self.queue.is_empty() {
            self.queue.push_back(Period::default());
        }
        // Non-empty after the push above
        let last = self.queue.len() - 1;
        &mut self.queue[last]
    }
}

/// Period accumulator
///
/// Guarded by its own lock, separate from the graph mutation lock, so that
/// recording an access and recording its delta are two short critical
/// sections.
#[derive(Debug)]
pub struct PeriodAccumulator {
    /// Number of full periods retained as live data
    count: usize,
    state: Mutex<WindowState>,
}

impl PeriodAccumulator {
    /// Create an accumulator retaining `period_count` full periods
    pub fn new(period_count: usize) -> AffinityResult<Self> {
        if period_count == 0 {
            return Err(AffinityError::InvalidConfig(
                "period count must be at least 1".into(),
            ));
        }
        let mut queue = VecDeque::with_capacity(period_count + 2);
        queue.push_back(Period::default());
        Ok(Self {
            count: period_count,
            state: Mutex::new(WindowState { current: 1, queue }),
        })
    }

    pub fn period_count(&self) -> usize {
        self.count
    }

    /// Note one increment of each edge in the open period
    pub fn record_edges(&self, keys: &[EdgeKey]) {
        if keys.is_empty() {
            return;
        }
        let mut state = self.state.lock();
        let open = state.open();
        for key in keys {
            *open.edge_increments.entry(*key).or_insert(0) += 1;
        }
    }

    /// Note one conflict with `node` over `object` in the open period
    pub fn record_conflict(&self, node: NodeId, object: ObjectId) {
        let mut state = self.state.lock();
        *state
            .open()
            .conflicts
            .entry(node)
            .or_default()
            .entry(object)
            .or_insert(0) += 1;
    }

    /// Close the open period and start a new one.
    ///
    /// Returns the expired period once the window is full. During the first
    /// `period_count` rotations nothing expires.
    pub fn rotate(&self) -> Option<Period> {
        let mut state = self.state.lock();
        state.queue.push_back(Period::default());
        if state.current <= self.count {
            debug!(
                rotation = state.current,
                period_count = self.count,
                "window still filling"
            );
            state.current += 1;
            return None;
        }
        state.queue.pop_front()
    }

    /// Number of periods in the window, including the open one
    pub fn queued_periods(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Increments recorded for `key` in the open period
    pub fn open_edge_delta(&self, key: EdgeKey) -> u64 {
        self.state
            .lock()
            .queue
            .back()
            .map(|p| p.edge_delta(key))
            .unwrap_or(0)
    }
}
