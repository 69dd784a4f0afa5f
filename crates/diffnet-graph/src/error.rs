//! Error types for the `diffnet-graph` crate.
//!
//! All fallible operations in this crate return [`GraphError`] through the
//! standard [`Result`] type.

use diffnet_types::NodeId;

/// Errors that can occur while building or mutating a network.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// A per-slice sequence does not have one snapshot per time step.
    #[error("expected {expected} slices, got {actual}")]
    SliceCountMismatch {
        /// The time horizon `T`.
        expected: usize,
        /// Number of slices supplied.
        actual: usize,
    },

    /// A snapshot disagrees with the network's vertex count.
    #[error("slice {slice} has {actual} vertices, expected {expected}")]
    VertexCountMismatch {
        /// The network's vertex count `N`.
        expected: usize,
        /// Vertex count of the offending snapshot.
        actual: usize,
        /// 1-based slice index of the offending snapshot.
        slice: usize,
    },

    /// A time slice outside `[1, T]` was requested.
    #[error("slice {slice} is outside the horizon 1..={horizon}")]
    SliceOutOfRange {
        /// The requested slice.
        slice: u32,
        /// The time horizon `T`.
        horizon: u32,
    },

    /// A node id outside `[0, N)` was referenced.
    #[error("node {node} is outside the vertex set of size {node_count}")]
    NodeOutOfRange {
        /// The offending node.
        node: NodeId,
        /// The vertex count `N`.
        node_count: usize,
    },

    /// An edge from a node to itself was requested.
    #[error("self-loop on node {0} is not allowed")]
    SelfLoop(NodeId),

    /// An edge weight was negative or not finite.
    #[error("invalid weight {weight} on edge {from} -> {to}")]
    InvalidWeight {
        /// Tail of the edge.
        from: NodeId,
        /// Head of the edge.
        to: NodeId,
        /// The rejected weight.
        weight: f64,
    },

    /// A generator, rewiring, or clustering parameter is out of range.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}
