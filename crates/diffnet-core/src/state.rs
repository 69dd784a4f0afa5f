//! Write-once adoption times.
//!
//! [`AdoptionState`] records, for every node, the step at which it adopted.
//! A node that has adopted stays adopted: the only mutation is
//! [`AdoptionState::adopt`], and it refuses to overwrite an existing time.

use serde::{Deserialize, Serialize};

use diffnet_types::NodeId;
use diffnet_types::ids::all_nodes;

use crate::error::SimError;

/// Per-node adoption time (`None` = never adopted).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdoptionState {
    times: Vec<Option<u32>>,
}

impl AdoptionState {
    /// Create a state where no node has adopted.
    pub fn new(n: usize) -> Self {
        Self {
            times: vec![None; n],
        }
    }

    /// Number of nodes tracked.
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Whether the state tracks no nodes.
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Adoption time of `node`, if it has adopted.
    pub fn time_of(&self, node: NodeId) -> Option<u32> {
        self.times.get(node.index()).copied().flatten()
    }

    /// Whether `node` had adopted by the end of step `t`.
    pub fn adopted_by(&self, node: NodeId, t: u32) -> bool {
        self.time_of(node).is_some_and(|time| time <= t)
    }

    /// Record that `node` adopted at step `t`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AlreadyAdopted`] if the node already has a time,
    /// or [`SimError::InvalidGraph`] if the node is outside the arena.
    pub fn adopt(&mut self, node: NodeId, t: u32) -> Result<(), SimError> {
        let node_count = self.times.len();
        let slot = self.times.get_mut(node.index()).ok_or(SimError::InvalidGraph {
            source: diffnet_graph::GraphError::NodeOutOfRange { node, node_count },
        })?;
        if let Some(time) = *slot {
            return Err(SimError::AlreadyAdopted { node, time });
        }
        *slot = Some(t);
        Ok(())
    }

    /// How many nodes had adopted by the end of step `t`.
    pub fn count_adopted_by(&self, t: u32) -> usize {
        self.times
            .iter()
            .filter(|time| time.is_some_and(|time| time <= t))
            .count()
    }

    /// Raw per-node times, indexed by node.
    pub fn times(&self) -> &[Option<u32>] {
        &self.times
    }

    /// Nodes that adopted exactly at step `t`, in id order.
    pub fn adopters_at(&self, t: u32) -> Vec<NodeId> {
        all_nodes(self.times.len())
            .filter(|&node| self.time_of(node) == Some(t))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
