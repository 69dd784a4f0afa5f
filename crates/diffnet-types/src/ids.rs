//! Vertex identifiers.
//!
//! Vertices live in a fixed arena of size `N`. A [`NodeId`] is a stable index
//! into that arena and into every per-node vector (thresholds, adoption
//! times, attributes). Vertices are never added or removed after a network
//! is created, so an id stays valid for the lifetime of a run.

use serde::{Deserialize, Serialize};

/// Stable integer index of a vertex in the network arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a node id from a raw index.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Return the id as a `usize` suitable for vector indexing.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Build a node id from a vector index.
    ///
    /// Returns `None` if the index does not fit in a `u32`.
    pub fn from_index(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(Self)
    }

    /// Return the inner raw value.
    pub const fn into_inner(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl From<NodeId> for u32 {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// Iterate over every node id of an arena of size `n`.
///
/// Arenas larger than `u32::MAX` are truncated; graph construction rejects
/// them earlier.
pub fn all_nodes(n: usize) -> impl Iterator<Item = NodeId> {
    let upper = u32::try_from(n).unwrap_or(u32::MAX);
    (0..upper).map(NodeId)
}
