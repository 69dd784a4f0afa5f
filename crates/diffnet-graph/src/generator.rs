//! Random network generators.
//!
//! The engine treats graph generation as an opaque collaborator behind the
//! [`NetworkGenerator`] trait: anything that turns a vertex count and a
//! random stream into an [`Adjacency`] can seed a [`GraphStore`]. The
//! built-in [`GeneratorKind`] variants cover the usual benchmarks and can be
//! named by tag in configuration:
//!
//! | Tag           | Model                                             |
//! |---------------|---------------------------------------------------|
//! | `ring`        | Ring lattice, each node tied to its `k` nearest   |
//! | `small_world` | Watts-Strogatz: ring lattice with rewiring prob `p` |
//! | `bernoulli`   | Erdos-Renyi: every pair tied with probability `p` |
//! | `scale_free`  | Barabasi-Albert: `m` preferential ties per arrival |
//!
//! All built-in variants except a directed Bernoulli graph are undirected and
//! produce unit weights.
//!
//! [`GraphStore`]: crate::store::GraphStore

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use diffnet_types::NodeId;

use crate::adjacency::Adjacency;
use crate::error::GraphError;

/// Anything that can produce one network snapshot.
pub trait NetworkGenerator {
    /// Build a snapshot over `n` vertices, drawing from `rng`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidParameter`] when the generator's own
    /// parameters are incompatible with `n`.
    fn generate(&self, n: usize, rng: &mut dyn RngCore) -> Result<Adjacency, GraphError>;
}

/// Built-in generator variants, selected by the `kind` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratorKind {
    /// Ring lattice where every node is tied to its `k` nearest neighbors.
    Ring {
        /// Even number of neighbors per node.
        k: usize,
    },
    /// Watts-Strogatz small world.
    SmallWorld {
        /// Even number of lattice neighbors per node.
        k: usize,
        /// Probability of rewiring each lattice tie.
        p: f64,
    },
    /// Erdos-Renyi random graph.
    Bernoulli {
        /// Probability that any given pair is tied.
        p: f64,
        /// Draw ordered pairs instead of unordered ones.
        #[serde(default)]
        directed: bool,
    },
    /// Barabasi-Albert preferential attachment.
    ScaleFree {
        /// Ties created by each arriving node.
        m: usize,
    },
}

impl Default for GeneratorKind {
    fn default() -> Self {
        Self::SmallWorld { k: 8, p: 0.2 }
    }
}

impl GeneratorKind {
    /// Check the parameters against a vertex count without drawing anything.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidParameter`] naming the first bad value.
    pub fn check(&self, n: usize) -> Result<(), GraphError> {
        if n == 0 {
            return Err(GraphError::InvalidParameter {
                name: "n",
                reason: "network must have at least one vertex".to_owned(),
            });
        }
        match *self {
            Self::Ring { k } => check_lattice(n, k),
            Self::SmallWorld { k, p } => {
                check_lattice(n, k)?;
                check_probability("p", p)
            }
            Self::Bernoulli { p, .. } => check_probability("p", p),
            Self::ScaleFree { m } => {
                if m == 0 || m >= n {
                    Err(GraphError::InvalidParameter {
                        name: "m",
                        reason: format!("need 1 <= m < n, got m = {m} with n = {n}"),
                    })
                } else {
                    Ok(())
                }
            }
        }
    }
}

impl NetworkGenerator for GeneratorKind {
    fn generate(&self, n: usize, rng: &mut dyn RngCore) -> Result<Adjacency, GraphError> {
        self.check(n)?;
        match *self {
            Self::Ring { k } => ring_lattice(n, k),
            Self::SmallWorld { k, p } => small_world(n, k, p, rng),
            Self::Bernoulli { p, directed } => bernoulli(n, p, directed, rng),
            Self::ScaleFree { m } => scale_free(n, m, rng),
        }
    }
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

fn check_probability(name: &'static str, p: f64) -> Result<(), GraphError> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(GraphError::InvalidParameter {
            name,
            reason: format!("{p} is not a probability"),
        })
    }
}

fn node(index: usize) -> Result<NodeId, GraphError> {
    NodeId::from_index(index).ok_or_else(|| GraphError::InvalidParameter {
        name: "n",
        reason: format!("vertex index {index} exceeds the id space"),
    })
}

fn check_lattice(n: usize, k: usize) -> Result<(), GraphError> {
    if k < 2 || k >= n {
        return Err(GraphError::InvalidParameter {
            name: "k",
            reason: format!("need 2 <= k < n, got k = {k} with n = {n}"),
        });
    }
    Ok(())
}

fn ring_lattice(n: usize, k: usize) -> Result<Adjacency, GraphError> {
    check_lattice(n, k)?;
    let half = k / 2;
    let mut adjacency = Adjacency::new(n);
    for i in 0..n {
        for offset in 1..=half {
            let j = i.saturating_add(offset).checked_rem(n).unwrap_or(0);
            let (a, b) = (node(i)?, node(j)?);
            adjacency.set_edge(a, b, 1.0)?;
            adjacency.set_edge(b, a, 1.0)?;
        }
    }
    Ok(adjacency)
}

fn small_world(n: usize, k: usize, p: f64, rng: &mut dyn RngCore) -> Result<Adjacency, GraphError> {
    check_probability("p", p)?;
    let mut adjacency = ring_lattice(n, k)?;
    let lattice: Vec<(NodeId, NodeId)> = adjacency
        .edges()
        .filter(|(from, to, _)| from < to)
        .map(|(from, to, _)| (from, to))
        .collect();

    for (from, to) in lattice {
        if !rng.random_bool(p) {
            continue;
        }
        // Bounded number of attempts so saturated nodes keep their tie.
        for _ in 0..n {
            let candidate = node(rng.random_range(0..n))?;
            if candidate != from && !adjacency.has_edge(from, candidate) {
                adjacency.remove_edge(from, to)?;
                adjacency.remove_edge(to, from)?;
                adjacency.set_edge(from, candidate, 1.0)?;
                adjacency.set_edge(candidate, from, 1.0)?;
                break;
            }
        }
    }
    Ok(adjacency)
}

fn bernoulli(n: usize, p: f64, directed: bool, rng: &mut dyn RngCore) -> Result<Adjacency, GraphError> {
    check_probability("p", p)?;
    let mut adjacency = Adjacency::new(n);
    for i in 0..n {
        let start = if directed { 0 } else { i.saturating_add(1) };
        for j in start..n {
            if i == j || !rng.random_bool(p) {
                continue;
            }
            let (a, b) = (node(i)?, node(j)?);
            adjacency.set_edge(a, b, 1.0)?;
            if !directed {
                adjacency.set_edge(b, a, 1.0)?;
            }
        }
    }
    Ok(adjacency)
}

fn scale_free(n: usize, m: usize, rng: &mut dyn RngCore) -> Result<Adjacency, GraphError> {
    let mut adjacency = Adjacency::new(n);
    // Every tie endpoint is listed once, so a uniform pick from this list is
    // a degree-proportional pick of a node.
    let mut endpoints: Vec<usize> = Vec::new();

    // Seed core: a clique on the first m + 1 nodes.
    let core = m.saturating_add(1);
    for i in 0..core {
        for j in i.saturating_add(1)..core {
            adjacency.set_edge(node(i)?, node(j)?, 1.0)?;
            adjacency.set_edge(node(j)?, node(i)?, 1.0)?;
            endpoints.push(i);
            endpoints.push(j);
        }
    }

    for arrival in core..n {
        let mut targets: Vec<usize> = Vec::with_capacity(m);
        while targets.len() < m {
            let pick = rng.random_range(0..endpoints.len());
            if let Some(&target) = endpoints.get(pick)
                && !targets.contains(&target)
            {
                targets.push(target);
            }
        }
        for target in targets {
            adjacency.set_edge(node(arrival)?, node(target)?, 1.0)?;
            adjacency.set_edge(node(target)?, node(arrival)?, 1.0)?;
            endpoints.push(arrival);
            endpoints.push(target);
        }
    }
    Ok(adjacency)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
