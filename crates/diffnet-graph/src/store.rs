//! Per-slice network store.
//!
//! A [`GraphStore`] holds exactly one [`Adjacency`] per time slice `1..=T`
//! over a fixed vertex set. Static networks are replicated across every
//! slice; dynamic networks supply (or generate) one snapshot per slice.
//! Slices are addressed with the same 1-based time index the cascade uses.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::debug;

use diffnet_types::NodeId;

use crate::adjacency::Adjacency;
use crate::error::GraphError;
use crate::generator::NetworkGenerator;

/// The network as an ordered sequence of `T` snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStore {
    /// One snapshot per time slice; `slices[t - 1]` is slice `t`.
    slices: Vec<Adjacency>,
    /// Shared vertex count of every slice.
    node_count: usize,
}

impl GraphStore {
    /// Replicate a single static snapshot across `horizon` slices.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidParameter`] when `horizon` is zero or the
    /// snapshot has no vertices.
    pub fn replicated(adjacency: Adjacency, horizon: u32) -> Result<Self, GraphError> {
        let slots = horizon_slots(horizon)?;
        let node_count = adjacency.node_count();
        check_arena(node_count)?;
        Ok(Self {
            slices: vec![adjacency; slots],
            node_count,
        })
    }

    /// Wrap a pre-built per-slice sequence.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::SliceCountMismatch`] when the sequence length is
    /// not `horizon`, and [`GraphError::VertexCountMismatch`] when a slice
    /// disagrees with the first slice's vertex count.
    pub fn from_slices(slices: Vec<Adjacency>, horizon: u32) -> Result<Self, GraphError> {
        let slots = horizon_slots(horizon)?;
        if slices.len() != slots {
            return Err(GraphError::SliceCountMismatch {
                expected: slots,
                actual: slices.len(),
            });
        }
        let node_count = slices.first().map_or(0, Adjacency::node_count);
        check_arena(node_count)?;
        for (idx, slice) in slices.iter().enumerate() {
            if slice.node_count() != node_count {
                return Err(GraphError::VertexCountMismatch {
                    expected: node_count,
                    actual: slice.node_count(),
                    slice: idx.saturating_add(1),
                });
            }
        }
        Ok(Self { slices, node_count })
    }

    /// Draw one snapshot from `generator` and replicate it across the horizon.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::VertexCountMismatch`] when the generator returns
    /// a graph whose vertex count differs from `n`, or any error raised by the
    /// generator itself.
    pub fn generate(
        generator: &dyn NetworkGenerator,
        n: usize,
        horizon: u32,
        rng: &mut dyn RngCore,
    ) -> Result<Self, GraphError> {
        let adjacency = generator.generate(n, rng)?;
        check_generated(&adjacency, n, 1)?;
        debug!(n, horizon, arcs = adjacency.edge_count(), "Static network generated");
        Self::replicated(adjacency, horizon)
    }

    /// Draw an independent snapshot from `generator` for every slice.
    ///
    /// # Errors
    ///
    /// Same as [`GraphStore::generate`], reported for the first bad slice.
    pub fn generate_dynamic(
        generator: &dyn NetworkGenerator,
        n: usize,
        horizon: u32,
        rng: &mut dyn RngCore,
    ) -> Result<Self, GraphError> {
        let slots = horizon_slots(horizon)?;
        let mut slices = Vec::with_capacity(slots);
        for slot in 0..slots {
            let adjacency = generator.generate(n, rng)?;
            check_generated(&adjacency, n, slot.saturating_add(1))?;
            slices.push(adjacency);
        }
        debug!(n, horizon, "Dynamic network generated");
        Self::from_slices(slices, horizon)
    }

    /// Return the time horizon `T`.
    pub fn horizon(&self) -> u32 {
        u32::try_from(self.slices.len()).unwrap_or(u32::MAX)
    }

    /// Return the vertex count `N`.
    pub const fn node_count(&self) -> usize {
        self.node_count
    }

    /// Whether `t` addresses a slice in `[1, T]`.
    pub fn is_valid_slice(&self, t: u32) -> bool {
        self.slot(t).is_some()
    }

    /// Return the snapshot for slice `t`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::SliceOutOfRange`] when `t` is outside `[1, T]`.
    pub fn get_slice(&self, t: u32) -> Result<&Adjacency, GraphError> {
        let horizon = self.horizon();
        self.slot(t)
            .and_then(|slot| self.slices.get(slot))
            .ok_or(GraphError::SliceOutOfRange { slice: t, horizon })
    }

    fn get_slice_mut(&mut self, t: u32) -> Result<&mut Adjacency, GraphError> {
        let horizon = self.horizon();
        match self.slot(t) {
            Some(slot) => self
                .slices
                .get_mut(slot)
                .ok_or(GraphError::SliceOutOfRange { slice: t, horizon }),
            None => Err(GraphError::SliceOutOfRange { slice: t, horizon }),
        }
    }

    /// Add (with weight 1) or remove the arc `from -> to` in slice `t`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::SliceOutOfRange`] for a bad slice, or any
    /// endpoint error from [`Adjacency::set_edge`].
    pub fn set_edge(
        &mut self,
        t: u32,
        from: NodeId,
        to: NodeId,
        present: bool,
    ) -> Result<(), GraphError> {
        let weight = if present { 1.0 } else { 0.0 };
        self.set_weighted_edge(t, from, to, weight)
    }

    /// Set the weight of the arc `from -> to` in slice `t`.
    ///
    /// # Errors
    ///
    /// Same as [`GraphStore::set_edge`].
    pub fn set_weighted_edge(
        &mut self,
        t: u32,
        from: NodeId,
        to: NodeId,
        weight: f64,
    ) -> Result<(), GraphError> {
        self.get_slice_mut(t)?.set_edge(from, to, weight)
    }

    /// Replace slice `t` wholesale, as rewiring does between steps.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::VertexCountMismatch`] if `adjacency` has a
    /// different vertex count, or [`GraphError::SliceOutOfRange`].
    pub fn replace_slice(&mut self, t: u32, adjacency: Adjacency) -> Result<(), GraphError> {
        if adjacency.node_count() != self.node_count {
            return Err(GraphError::VertexCountMismatch {
                expected: self.node_count,
                actual: adjacency.node_count(),
                slice: usize::try_from(t).unwrap_or(usize::MAX),
            });
        }
        *self.get_slice_mut(t)? = adjacency;
        Ok(())
    }

    /// All snapshots in time order.
    pub fn slices(&self) -> &[Adjacency] {
        &self.slices
    }

    fn slot(&self, t: u32) -> Option<usize> {
        let slot = usize::try_from(t).ok()?.checked_sub(1)?;
        (slot < self.slices.len()).then_some(slot)
    }
}

fn horizon_slots(horizon: u32) -> Result<usize, GraphError> {
    if horizon == 0 {
        return Err(GraphError::InvalidParameter {
            name: "horizon",
            reason: "must be at least 1".to_owned(),
        });
    }
    usize::try_from(horizon).map_err(|e| GraphError::InvalidParameter {
        name: "horizon",
        reason: e.to_string(),
    })
}

fn check_arena(node_count: usize) -> Result<(), GraphError> {
    if node_count == 0 {
        return Err(GraphError::InvalidParameter {
            name: "n",
            reason: "network must have at least one vertex".to_owned(),
        });
    }
    if u32::try_from(node_count).is_err() {
        return Err(GraphError::InvalidParameter {
            name: "n",
            reason: format!("{node_count} vertices exceed the id space"),
        });
    }
    Ok(())
}

fn check_generated(adjacency: &Adjacency, n: usize, slice: usize) -> Result<(), GraphError> {
    if adjacency.node_count() == n {
        Ok(())
    } else {
        Err(GraphError::VertexCountMismatch {
            expected: n,
            actual: adjacency.node_count(),
            slice,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
