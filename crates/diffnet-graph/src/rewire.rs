//! Between-step structural rewiring.
//!
//! A [`Rewirer`] turns slice `t` into slice `t + 1`. Strategies never see
//! adoption state, never add or remove vertices, and draw all randomness from
//! the caller's stream so a run is reproducible under a fixed seed.
//!
//! Symmetric (undirected) snapshots are rewired tie by tie, so the result is
//! symmetric again. Directed snapshots are rewired arc by arc.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use diffnet_types::NodeId;

use crate::adjacency::Adjacency;
use crate::error::GraphError;
use crate::generator::{GeneratorKind, NetworkGenerator};

/// A policy producing the next slice from the current one.
pub trait Rewirer {
    /// Produce the next snapshot from `current`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidParameter`] for out-of-range strategy
    /// parameters, or any error raised while rebuilding the snapshot.
    fn rewire(&self, current: &Adjacency, rng: &mut dyn RngCore) -> Result<Adjacency, GraphError>;
}

/// Built-in rewiring strategies, selected by the `algorithm` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum RewireStrategy {
    /// Keep the network unchanged.
    Identity,
    /// Redraw the head of each tie with probability `p`.
    Endpoints {
        /// Per-tie rewiring probability.
        p: f64,
    },
    /// Double-edge swaps that keep every node's degree.
    DegreePreserving {
        /// Swap attempts as a multiple of the tie count.
        swaps: f64,
    },
    /// Replace the slice with a fresh draw from a generator.
    Regenerate {
        /// Generator producing the replacement.
        generator: GeneratorKind,
    },
}

impl Default for RewireStrategy {
    fn default() -> Self {
        Self::Endpoints { p: 0.1 }
    }
}

/// Largest accepted `swaps` multiplier.
pub const MAX_SWAPS: f64 = 1000.0;

impl RewireStrategy {
    /// Check the parameters for a network of `n` vertices without rewiring
    /// anything.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidParameter`] naming the first bad value.
    pub fn check(&self, n: usize) -> Result<(), GraphError> {
        match self {
            Self::Identity => Ok(()),
            Self::Endpoints { p } => check_probability(*p),
            Self::DegreePreserving { swaps } => check_swaps(*swaps),
            Self::Regenerate { generator } => generator.check(n),
        }
    }
}

impl Rewirer for RewireStrategy {
    fn rewire(&self, current: &Adjacency, rng: &mut dyn RngCore) -> Result<Adjacency, GraphError> {
        match self {
            Self::Identity => Ok(current.clone()),
            Self::Endpoints { p } => rewire_endpoints(current, *p, rng),
            Self::DegreePreserving { swaps } => swap_edges(current, *swaps, rng),
            Self::Regenerate { generator } => {
                let next = generator.generate(current.node_count(), rng)?;
                if next.node_count() == current.node_count() {
                    Ok(next)
                } else {
                    Err(GraphError::VertexCountMismatch {
                        expected: current.node_count(),
                        actual: next.node_count(),
                        slice: 0,
                    })
                }
            }
        }
    }
}

/// Ties of a snapshot: unordered pairs when symmetric, arcs otherwise.
fn ties(current: &Adjacency, undirected: bool) -> Vec<(NodeId, NodeId, f64)> {
    current
        .edges()
        .filter(|(from, to, _)| !undirected || from < to)
        .collect()
}

fn put_tie(
    adjacency: &mut Adjacency,
    from: NodeId,
    to: NodeId,
    weight: f64,
    undirected: bool,
) -> Result<(), GraphError> {
    adjacency.set_edge(from, to, weight)?;
    if undirected {
        adjacency.set_edge(to, from, weight)?;
    }
    Ok(())
}

fn drop_tie(
    adjacency: &mut Adjacency,
    from: NodeId,
    to: NodeId,
    undirected: bool,
) -> Result<(), GraphError> {
    adjacency.remove_edge(from, to)?;
    if undirected {
        adjacency.remove_edge(to, from)?;
    }
    Ok(())
}

fn check_probability(p: f64) -> Result<(), GraphError> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(GraphError::InvalidParameter {
            name: "p",
            reason: format!("{p} is not a probability"),
        })
    }
}

fn check_swaps(swaps: f64) -> Result<(), GraphError> {
    if (0.0..=MAX_SWAPS).contains(&swaps) {
        Ok(())
    } else {
        Err(GraphError::InvalidParameter {
            name: "swaps",
            reason: format!("{swaps} is not a multiple of the tie count in [0, {MAX_SWAPS}]"),
        })
    }
}

fn rewire_endpoints(current: &Adjacency, p: f64, rng: &mut dyn RngCore) -> Result<Adjacency, GraphError> {
    check_probability(p)?;
    let n = current.node_count();
    let undirected = current.is_symmetric();
    let mut next = current.clone();

    for (from, to, weight) in ties(current, undirected) {
        if !rng.random_bool(p) {
            continue;
        }
        for _ in 0..n {
            let Some(candidate) = NodeId::from_index(rng.random_range(0..n)) else {
                continue;
            };
            if candidate != from && candidate != to && !next.has_edge(from, candidate) {
                drop_tie(&mut next, from, to, undirected)?;
                put_tie(&mut next, from, candidate, weight, undirected)?;
                break;
            }
        }
    }
    Ok(next)
}

fn swap_edges(current: &Adjacency, swaps: f64, rng: &mut dyn RngCore) -> Result<Adjacency, GraphError> {
    check_swaps(swaps)?;
    let undirected = current.is_symmetric();
    let mut next = current.clone();
    let mut pool = ties(current, undirected);
    if pool.len() < 2 {
        return Ok(next);
    }

    // swaps is in [0, MAX_SWAPS], so the product fits a usize.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let target = ((swaps * pool.len() as f64).round() as usize)
        .min(pool.len().saturating_mul(MAX_SWAPS as usize));
    let max_attempts = target.saturating_mul(10);
    let mut done: usize = 0;
    let mut attempts: usize = 0;

    while done < target && attempts < max_attempts {
        attempts = attempts.saturating_add(1);
        let i = rng.random_range(0..pool.len());
        let j = rng.random_range(0..pool.len());
        if i == j {
            continue;
        }
        let (Some(&(a, b, w_ab)), Some(&(c, d, w_cd))) = (pool.get(i), pool.get(j)) else {
            continue;
        };
        // For undirected ties either pairing is a valid swap.
        let (c, d) = if undirected && rng.random_bool(0.5) { (d, c) } else { (c, d) };
        if a == d || c == b || a == c || b == d {
            continue;
        }
        if next.has_edge(a, d) || next.has_edge(c, b) {
            continue;
        }

        drop_tie(&mut next, a, b, undirected)?;
        drop_tie(&mut next, c, d, undirected)?;
        put_tie(&mut next, a, d, w_ab, undirected)?;
        put_tie(&mut next, c, b, w_cd, undirected)?;

        if let Some(slot) = pool.get_mut(i) {
            *slot = (a, d, w_ab);
        }
        if let Some(slot) = pool.get_mut(j) {
            *slot = (c, b, w_cd);
        }
        done = done.saturating_add(1);
    }
    Ok(next)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
