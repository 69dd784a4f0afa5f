//! Exposure of a node to adopting neighbors.
//!
//! Exposure at step `t` is computed on the slice current at `t` and counts
//! neighbors that adopted at or before `t - 1`. With `normalized` set it is
//! the adopting share of the node's tie weight; otherwise it is the raw
//! adopting weight. A node with no eligible ties has exposure 0.
//!
//! | Direction  | Eligible ties                                      |
//! |------------|----------------------------------------------------|
//! | `outgoing` | node -> others (row of the adjacency matrix)       |
//! | `incoming` | others -> node (column of the adjacency matrix)    |
//! | `both`     | union of neighbors, weight = out-weight + in-weight |

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use diffnet_graph::{Adjacency, GraphStore};
use diffnet_types::ids::all_nodes;
use diffnet_types::{ExposureDirection, NodeId};

use crate::error::SimError;
use crate::state::AdoptionState;

/// Exposure parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExposureArgs {
    /// Divide by the total eligible tie weight.
    #[serde(default = "default_normalized")]
    pub normalized: bool,
    /// Which ties count.
    #[serde(default)]
    pub direction: ExposureDirection,
}

const fn default_normalized() -> bool {
    true
}

impl Default for ExposureArgs {
    fn default() -> Self {
        Self {
            normalized: default_normalized(),
            direction: ExposureDirection::default(),
        }
    }
}

/// Exposure of `node` at step `t` on `adjacency`, the slice current at `t`.
pub fn exposure(
    adjacency: &Adjacency,
    state: &AdoptionState,
    node: NodeId,
    t: u32,
    args: ExposureArgs,
) -> f64 {
    let prior = t.saturating_sub(1);
    let mut adopting = 0.0;
    let mut total = 0.0;
    let mut tally = |neighbor: NodeId, weight: f64| {
        total += weight;
        if state.adopted_by(neighbor, prior) {
            adopting += weight;
        }
    };

    match args.direction {
        ExposureDirection::Outgoing => adjacency
            .out_neighbors(node)
            .for_each(|(neighbor, weight)| tally(neighbor, weight)),
        ExposureDirection::Incoming => adjacency
            .in_neighbors(node)
            .for_each(|(neighbor, weight)| tally(neighbor, weight)),
        ExposureDirection::Both => {
            let mut merged: BTreeMap<NodeId, f64> = BTreeMap::new();
            for (neighbor, weight) in adjacency.out_neighbors(node).chain(adjacency.in_neighbors(node)) {
                *merged.entry(neighbor).or_insert(0.0) += weight;
            }
            merged
                .into_iter()
                .for_each(|(neighbor, weight)| tally(neighbor, weight));
        }
    }

    if !args.normalized {
        return adopting;
    }
    if total > 0.0 { adopting / total } else { 0.0 }
}

/// Exposure of every node at every step, stored by time column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposureMatrix {
    /// Vertex count `N`.
    node_count: usize,
    /// Horizon `T`.
    horizon: u32,
    /// `values[(t - 1) * N + node]`.
    values: Vec<f64>,
}

impl ExposureMatrix {
    /// All-zero `N x T` matrix.
    pub fn zeros(n: usize, horizon: u32) -> Self {
        let columns = usize::try_from(horizon).unwrap_or(0);
        Self {
            node_count: n,
            horizon,
            values: vec![0.0; n.saturating_mul(columns)],
        }
    }

    /// Vertex count.
    pub const fn node_count(&self) -> usize {
        self.node_count
    }

    /// Horizon.
    pub const fn horizon(&self) -> u32 {
        self.horizon
    }

    fn offset(&self, node: NodeId, t: u32) -> Option<usize> {
        if node.index() >= self.node_count || t == 0 || t > self.horizon {
            return None;
        }
        let column = usize::try_from(t).ok()?.checked_sub(1)?;
        column.checked_mul(self.node_count)?.checked_add(node.index())
    }

    /// Exposure of `node` at step `t`.
    pub fn get(&self, node: NodeId, t: u32) -> Option<f64> {
        self.offset(node, t).and_then(|idx| self.values.get(idx).copied())
    }

    pub(crate) fn set(&mut self, node: NodeId, t: u32, value: f64) {
        if let Some(slot) = self.offset(node, t).and_then(|idx| self.values.get_mut(idx)) {
            *slot = value;
        }
    }

    /// Exposures of all nodes at step `t`.
    pub fn column(&self, t: u32) -> Option<&[f64]> {
        let start = self.offset(NodeId(0), t)?;
        self.values.get(start..start.checked_add(self.node_count)?)
    }

    /// Exposures of `node` across all steps.
    pub fn row(&self, node: NodeId) -> Vec<f64> {
        (1..=self.horizon)
            .filter_map(|t| self.get(node, t))
            .collect()
    }
}

/// Recompute the full exposure matrix of a finished history.
///
/// Column 1 is always zero: nothing precedes the seeds.
///
/// # Errors
///
/// Returns [`SimError::InvalidGraph`] if the state does not cover the
/// network's vertex set.
pub fn exposure_matrix(
    store: &GraphStore,
    state: &AdoptionState,
    args: ExposureArgs,
) -> Result<ExposureMatrix, SimError> {
    let n = store.node_count();
    if state.len() != n {
        return Err(SimError::InvalidGraph {
            source: diffnet_graph::GraphError::VertexCountMismatch {
                expected: n,
                actual: state.len(),
                slice: 0,
            },
        });
    }
    let mut matrix = ExposureMatrix::zeros(n, store.horizon());
    for t in 2..=store.horizon() {
        let slice = store.get_slice(t)?;
        for node in all_nodes(n) {
            matrix.set(node, t, exposure(slice, state, node, t, args));
        }
    }
    Ok(matrix)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// 0 -> 1 (w 2), 0 -> 2 (w 1), 3 -> 0 (w 4). Node 1 and 3 adopted at 1.
    fn fixture() -> (Adjacency, AdoptionState) {
        let adj = Adjacency::from_edges(
            5,
            [
                (NodeId(0), NodeId(1), 2.0),
                (NodeId(0), NodeId(2), 1.0),
                (NodeId(3), NodeId(0), 4.0),
            ],
            true,
        )
        .unwrap();
        let mut state = AdoptionState::new(5);
        assert!(state.adopt(NodeId(1), 1).is_ok());
        assert!(state.adopt(NodeId(3), 1).is_ok());
        (adj, state)
    }

    fn args(normalized: bool, direction: ExposureDirection) -> ExposureArgs {
        ExposureArgs {
            normalized,
            direction,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn outgoing_uses_row_weights() {
        let (adj, state) = fixture();
        let e = exposure(&adj, &state, NodeId(0), 2, args(true, ExposureDirection::Outgoing));
        assert!(close(e, 2.0 / 3.0));
        let raw = exposure(&adj, &state, NodeId(0), 2, args(false, ExposureDirection::Outgoing));
        assert!(close(raw, 2.0));
    }

    #[test]
    fn incoming_uses_column_weights() {
        let (adj, state) = fixture();
        let e = exposure(&adj, &state, NodeId(0), 2, args(true, ExposureDirection::Incoming));
        assert!(close(e, 1.0));
    }

    #[test]
    fn both_merges_neighbors() {
        let (adj, state) = fixture();
        let e = exposure(&adj, &state, NodeId(0), 2, args(true, ExposureDirection::Both));
        // Adopting weight 2 + 4 out of 2 + 1 + 4.
        assert!(close(e, 6.0 / 7.0));
    }

    #[test]
    fn only_prior_adoptions_count() {
        let (adj, state) = fixture();
        // At t = 1 nobody had adopted by t - 1 = 0.
        let e = exposure(&adj, &state, NodeId(0), 1, args(false, ExposureDirection::Outgoing));
        assert!(close(e, 0.0));
    }

    #[test]
    fn isolated_node_has_zero_exposure() {
        let (adj, state) = fixture();
        let e = exposure(&adj, &state, NodeId(4), 3, args(true, ExposureDirection::Both));
        assert!(close(e, 0.0));
    }

    #[test]
    fn matrix_accessors_agree() {
        let (adj, state) = fixture();
        let store = GraphStore::replicated(adj, 3).unwrap();
        let matrix = exposure_matrix(&store, &state, ExposureArgs::default()).unwrap();
        assert_eq!(matrix.column(1).map(<[f64]>::len), Some(5));
        assert_eq!(matrix.get(NodeId(0), 1), Some(0.0));
        assert!(matrix.get(NodeId(0), 2).is_some_and(|e| close(e, 2.0 / 3.0)));
        assert_eq!(matrix.row(NodeId(0)).len(), 3);
        assert_eq!(matrix.get(NodeId(0), 4), None);
        assert_eq!(matrix.get(NodeId(5), 1), None);
    }
}
