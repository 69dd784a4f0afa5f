//! Sparse weighted adjacency snapshot.
//!
//! An [`Adjacency`] holds the arcs of one time slice over a fixed vertex
//! arena. Each vertex keeps an outbound map `to -> weight` and an inbound map
//! `from -> weight`; both are updated together so neighbor queries in either
//! direction are cheap. Undirected networks are stored as symmetric pairs of
//! arcs.
//!
//! Absent arcs have weight zero. Setting an arc to weight zero removes it,
//! which keeps the maps sparse and makes `has_edge` agree with `weight > 0`.

use std::collections::BTreeMap;

use diffnet_types::{ExposureDirection, NodeId};
use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// One weighted, directed snapshot of the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjacency {
    /// Outbound arcs per vertex: `to -> weight`.
    outbound: Vec<BTreeMap<NodeId, f64>>,
    /// Inbound arcs per vertex: `from -> weight`.
    inbound: Vec<BTreeMap<NodeId, f64>>,
    /// Number of stored arcs.
    arc_count: usize,
}

impl Adjacency {
    /// Create an empty snapshot over `n` vertices.
    pub fn new(n: usize) -> Self {
        Self {
            outbound: vec![BTreeMap::new(); n],
            inbound: vec![BTreeMap::new(); n],
            arc_count: 0,
        }
    }

    /// Build a snapshot from `(from, to, weight)` triples.
    ///
    /// When `directed` is false each triple inserts both arcs.
    ///
    /// # Errors
    ///
    /// Returns the first [`GraphError`] raised by [`Adjacency::set_edge`].
    pub fn from_edges<I>(n: usize, edges: I, directed: bool) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = (NodeId, NodeId, f64)>,
    {
        let mut adjacency = Self::new(n);
        for (from, to, weight) in edges {
            adjacency.set_edge(from, to, weight)?;
            if !directed {
                adjacency.set_edge(to, from, weight)?;
            }
        }
        Ok(adjacency)
    }

    /// Return the number of vertices.
    pub fn node_count(&self) -> usize {
        self.outbound.len()
    }

    /// Return the number of stored arcs. An undirected tie counts twice.
    pub const fn edge_count(&self) -> usize {
        self.arc_count
    }

    fn check_node(&self, node: NodeId) -> Result<(), GraphError> {
        if node.index() < self.node_count() {
            Ok(())
        } else {
            Err(GraphError::NodeOutOfRange {
                node,
                node_count: self.node_count(),
            })
        }
    }

    /// Set the weight of the arc `from -> to`. A weight of zero removes it.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeOutOfRange`] for unknown endpoints,
    /// [`GraphError::SelfLoop`] when `from == to`, and
    /// [`GraphError::InvalidWeight`] for negative or non-finite weights.
    pub fn set_edge(&mut self, from: NodeId, to: NodeId, weight: f64) -> Result<(), GraphError> {
        self.check_node(from)?;
        self.check_node(to)?;
        if from == to {
            return Err(GraphError::SelfLoop(from));
        }
        if !weight.is_finite() || weight < 0.0 {
            return Err(GraphError::InvalidWeight { from, to, weight });
        }
        if weight <= 0.0 {
            self.remove_edge(from, to)?;
            return Ok(());
        }

        let previous = self
            .outbound
            .get_mut(from.index())
            .and_then(|arcs| arcs.insert(to, weight));
        if let Some(arcs) = self.inbound.get_mut(to.index()) {
            arcs.insert(from, weight);
        }
        if previous.is_none() {
            self.arc_count = self.arc_count.saturating_add(1);
        }
        Ok(())
    }

    /// Remove the arc `from -> to`. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NodeOutOfRange`] for unknown endpoints.
    pub fn remove_edge(&mut self, from: NodeId, to: NodeId) -> Result<bool, GraphError> {
        self.check_node(from)?;
        self.check_node(to)?;
        let removed = self
            .outbound
            .get_mut(from.index())
            .and_then(|arcs| arcs.remove(&to))
            .is_some();
        if let Some(arcs) = self.inbound.get_mut(to.index()) {
            arcs.remove(&from);
        }
        if removed {
            self.arc_count = self.arc_count.saturating_sub(1);
        }
        Ok(removed)
    }

    /// Whether the arc `from -> to` exists.
    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.outbound
            .get(from.index())
            .is_some_and(|arcs| arcs.contains_key(&to))
    }

    /// Weight of the arc `from -> to`, zero when absent.
    pub fn weight(&self, from: NodeId, to: NodeId) -> f64 {
        self.outbound
            .get(from.index())
            .and_then(|arcs| arcs.get(&to))
            .copied()
            .unwrap_or(0.0)
    }

    /// Iterate over `(neighbor, weight)` for arcs leaving `node`.
    pub fn out_neighbors(&self, node: NodeId) -> impl Iterator<Item = (NodeId, f64)> + '_ {
        self.outbound
            .get(node.index())
            .into_iter()
            .flat_map(|arcs| arcs.iter().map(|(&to, &w)| (to, w)))
    }

    /// Iterate over `(neighbor, weight)` for arcs entering `node`.
    pub fn in_neighbors(&self, node: NodeId) -> impl Iterator<Item = (NodeId, f64)> + '_ {
        self.inbound
            .get(node.index())
            .into_iter()
            .flat_map(|arcs| arcs.iter().map(|(&from, &w)| (from, w)))
    }

    /// Raw outbound map of `node`, if the node exists.
    pub fn out_arcs(&self, node: NodeId) -> Option<&BTreeMap<NodeId, f64>> {
        self.outbound.get(node.index())
    }

    /// Raw inbound map of `node`, if the node exists.
    pub fn in_arcs(&self, node: NodeId) -> Option<&BTreeMap<NodeId, f64>> {
        self.inbound.get(node.index())
    }

    /// Number of arcs leaving `node`.
    pub fn out_degree(&self, node: NodeId) -> usize {
        self.outbound.get(node.index()).map_or(0, BTreeMap::len)
    }

    /// Number of arcs entering `node`.
    pub fn in_degree(&self, node: NodeId) -> usize {
        self.inbound.get(node.index()).map_or(0, BTreeMap::len)
    }

    /// Degree of `node` along `direction`. `Both` sums in- and out-degree.
    pub fn degree(&self, node: NodeId, direction: ExposureDirection) -> usize {
        match direction {
            ExposureDirection::Outgoing => self.out_degree(node),
            ExposureDirection::Incoming => self.in_degree(node),
            ExposureDirection::Both => self.out_degree(node).saturating_add(self.in_degree(node)),
        }
    }

    /// Iterate over every arc as `(from, to, weight)` in id order.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId, f64)> + '_ {
        self.outbound.iter().enumerate().flat_map(|(idx, arcs)| {
            let from = NodeId::from_index(idx).unwrap_or(NodeId(u32::MAX));
            arcs.iter().map(move |(&to, &w)| (from, to, w))
        })
    }

    /// Whether every arc has a reverse arc of the same weight.
    pub fn is_symmetric(&self) -> bool {
        self.edges().all(|(from, to, w)| {
            self.outbound
                .get(to.index())
                .and_then(|arcs| arcs.get(&from))
                .is_some_and(|&back| (back - w).abs() < f64::EPSILON)
        })
    }

    /// Fraction of the `N (N - 1)` possible arcs that are present.
    pub fn density(&self) -> f64 {
        let n = self.node_count();
        let possible = n.saturating_mul(n.saturating_sub(1));
        if possible == 0 {
            return 0.0;
        }
        // Counts are far below 2^52; the conversion is exact.
        #[allow(clippy::cast_precision_loss)]
        let density = self.arc_count as f64 / possible as f64;
        density
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn triangle(directed: bool) -> Adjacency {
        let edges = vec![
            (NodeId(0), NodeId(1), 1.0),
            (NodeId(1), NodeId(2), 2.0),
            (NodeId(2), NodeId(0), 1.0),
        ];
        Adjacency::from_edges(3, edges, directed).unwrap()
    }

    #[test]
    fn undirected_edges_store_both_arcs() {
        let adj = triangle(false);
        assert_eq!(adj.edge_count(), 6);
        assert!(adj.has_edge(NodeId(1), NodeId(0)));
        assert!(adj.is_symmetric());
    }

    #[test]
    fn directed_edges_keep_in_and_out_maps_in_sync() {
        let adj = triangle(true);
        assert_eq!(adj.edge_count(), 3);
        assert_eq!(adj.out_degree(NodeId(1)), 1);
        assert_eq!(adj.in_degree(NodeId(1)), 1);
        let inbound: Vec<(NodeId, f64)> = adj.in_neighbors(NodeId(2)).collect();
        assert_eq!(inbound.len(), 1);
        assert!(!adj.is_symmetric());
    }

    #[test]
    fn zero_weight_removes_arc() {
        let mut adj = triangle(true);
        assert!(adj.set_edge(NodeId(0), NodeId(1), 0.0).is_ok());
        assert!(!adj.has_edge(NodeId(0), NodeId(1)));
        assert_eq!(adj.in_degree(NodeId(1)), 0);
        assert_eq!(adj.edge_count(), 2);
    }

    #[test]
    fn overwriting_weight_does_not_double_count() {
        let mut adj = triangle(true);
        assert!(adj.set_edge(NodeId(1), NodeId(2), 5.0).is_ok());
        assert_eq!(adj.edge_count(), 3);
        assert!((adj.weight(NodeId(1), NodeId(2)) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_self_loops_and_bad_weights() {
        let mut adj = Adjacency::new(3);
        assert_eq!(
            adj.set_edge(NodeId(1), NodeId(1), 1.0),
            Err(GraphError::SelfLoop(NodeId(1)))
        );
        assert!(matches!(
            adj.set_edge(NodeId(0), NodeId(1), -1.0),
            Err(GraphError::InvalidWeight { .. })
        ));
        assert!(matches!(
            adj.set_edge(NodeId(0), NodeId(1), f64::NAN),
            Err(GraphError::InvalidWeight { .. })
        ));
        assert!(matches!(
            adj.set_edge(NodeId(0), NodeId(9), 1.0),
            Err(GraphError::NodeOutOfRange { .. })
        ));
    }

    #[test]
    fn density_of_complete_graph_is_one() {
        let mut edges = Vec::new();
        for i in 0..4_u32 {
            for j in 0..4_u32 {
                if i != j {
                    edges.push((NodeId(i), NodeId(j), 1.0));
                }
            }
        }
        let adj = Adjacency::from_edges(4, edges, true).unwrap();
        assert!((adj.density() - 1.0).abs() < f64::EPSILON);
        assert_eq!(adj.degree(NodeId(0), ExposureDirection::Both), 6);
    }
}
