//! Initial adopter selection.
//!
//! Seeds adopt at time 1. Every strategy returns a set of distinct, in-range
//! node ids or a [`SimError::InvalidSeed`] explaining why it could not.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use diffnet_graph::Adjacency;
use diffnet_types::NodeId;
use diffnet_types::ids::all_nodes;

use crate::attributes::AttributeTable;
use crate::error::SimError;

/// How the initial adopters are chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum SeedStrategy {
    /// `ceil(proportion * N)` nodes drawn uniformly without replacement.
    Random {
        /// Fraction of nodes to seed, in `(0, 1]`.
        proportion: f64,
    },
    /// Exactly these nodes.
    Explicit {
        /// Seed node ids.
        nodes: Vec<NodeId>,
    },
    /// The `top_k` nodes with the largest value of a static attribute.
    ByAttribute {
        /// Static attribute name.
        attribute: String,
        /// Number of seeds.
        top_k: usize,
    },
    /// The most connected nodes on the first slice.
    Central {
        /// Fraction of nodes to seed, in `(0, 1]`.
        proportion: f64,
    },
    /// The least connected nodes on the first slice.
    Marginal {
        /// Fraction of nodes to seed, in `(0, 1]`.
        proportion: f64,
    },
}

impl Default for SeedStrategy {
    fn default() -> Self {
        Self::Random { proportion: 0.05 }
    }
}

/// Number of seeds for proportion `p` of `n` nodes: `ceil(p * n)`.
///
/// Products within `1e-9` of an integer are treated as that integer so that
/// `0.1 * 1000` yields 100 rather than 101.
///
/// # Errors
///
/// Returns [`SimError::InvalidSeed`] unless `p` is in `(0, 1]`.
pub fn seed_count(p: f64, n: usize) -> Result<usize, SimError> {
    if !(p > 0.0 && p <= 1.0) {
        return Err(SimError::InvalidSeed {
            reason: format!("proportion {p} is not in (0, 1]"),
        });
    }
    // Arena sizes are far below 2^52; the float product is exact enough.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let count = {
        let product = p * n as f64;
        let nearest = product.round();
        let ceiled = if (product - nearest).abs() < 1e-9 {
            nearest
        } else {
            product.ceil()
        };
        ceiled as usize
    };
    Ok(count.clamp(1, n.max(1)))
}

/// Select the seed set for an arena of `n` nodes.
///
/// `attributes` is consulted only by [`SeedStrategy::ByAttribute`] and
/// `slice` (the first network slice) only by the degree-ranked strategies.
///
/// # Errors
///
/// Returns [`SimError::InvalidSeed`] for an empty, duplicated, out-of-range,
/// or otherwise unsatisfiable seed request.
pub fn select_seeds(
    n: usize,
    strategy: &SeedStrategy,
    attributes: &AttributeTable,
    slice: &Adjacency,
    rng: &mut dyn RngCore,
) -> Result<BTreeSet<NodeId>, SimError> {
    if n == 0 {
        return Err(SimError::InvalidSeed {
            reason: "network has no vertices".to_owned(),
        });
    }
    match strategy {
        SeedStrategy::Random { proportion } => {
            let amount = seed_count(*proportion, n)?;
            Ok(rand::seq::index::sample(rng, n, amount)
                .iter()
                .filter_map(NodeId::from_index)
                .collect())
        }
        SeedStrategy::Explicit { nodes } => explicit(n, nodes),
        SeedStrategy::ByAttribute { attribute, top_k } => {
            by_attribute(n, attributes, attribute, *top_k)
        }
        SeedStrategy::Central { proportion } => {
            let amount = seed_count(*proportion, n)?;
            Ok(ranked_by_degree(n, slice, amount, Ordering::Greater))
        }
        SeedStrategy::Marginal { proportion } => {
            let amount = seed_count(*proportion, n)?;
            Ok(ranked_by_degree(n, slice, amount, Ordering::Less))
        }
    }
}

fn explicit(n: usize, nodes: &[NodeId]) -> Result<BTreeSet<NodeId>, SimError> {
    if nodes.is_empty() {
        return Err(SimError::InvalidSeed {
            reason: "explicit seed list is empty".to_owned(),
        });
    }
    let mut seeds = BTreeSet::new();
    for &node in nodes {
        if node.index() >= n {
            return Err(SimError::InvalidSeed {
                reason: format!("node {node} is outside the {n}-node arena"),
            });
        }
        if !seeds.insert(node) {
            return Err(SimError::InvalidSeed {
                reason: format!("node {node} listed twice"),
            });
        }
    }
    Ok(seeds)
}

fn by_attribute(
    n: usize,
    attributes: &AttributeTable,
    name: &str,
    top_k: usize,
) -> Result<BTreeSet<NodeId>, SimError> {
    if top_k == 0 || top_k > n {
        return Err(SimError::InvalidSeed {
            reason: format!("top_k {top_k} is not in [1, {n}]"),
        });
    }
    let values = attributes.get_static(name).ok_or_else(|| SimError::InvalidSeed {
        reason: format!("unknown attribute {name}"),
    })?;
    if values.len() != n {
        return Err(SimError::InvalidSeed {
            reason: format!("attribute {name} has {} values for {n} nodes", values.len()),
        });
    }
    if values.iter().any(|v| v.is_nan()) {
        return Err(SimError::InvalidSeed {
            reason: format!("attribute {name} contains NaN"),
        });
    }
    let mut ranked: Vec<(NodeId, f64)> = all_nodes(n).zip(values.iter().copied()).collect();
    // Descending by value, ties by lower id.
    ranked.sort_by(|(a, va), (b, vb)| vb.total_cmp(va).then(a.cmp(b)));
    Ok(ranked.into_iter().take(top_k).map(|(node, _)| node).collect())
}

/// `Greater` keeps the highest-degree nodes, `Less` the lowest.
fn ranked_by_degree(
    n: usize,
    slice: &Adjacency,
    amount: usize,
    keep: Ordering,
) -> BTreeSet<NodeId> {
    let mut ranked: Vec<(NodeId, usize)> = all_nodes(n)
        .map(|node| {
            let degree = slice.out_degree(node).saturating_add(slice.in_degree(node));
            (node, degree)
        })
        .collect();
    ranked.sort_by(|(a, da), (b, db)| {
        let by_degree = if keep == Ordering::Greater {
            db.cmp(da)
        } else {
            da.cmp(db)
        };
        by_degree.then(a.cmp(b))
    });
    ranked.into_iter().take(amount).map(|(node, _)| node).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use diffnet_graph::{GeneratorKind, NetworkGenerator};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(17)
    }

    fn select(n: usize, strategy: &SeedStrategy) -> Result<BTreeSet<NodeId>, SimError> {
        select_seeds(n, strategy, &AttributeTable::new(n, 1), &Adjacency::new(n), &mut rng())
    }

    // -----------------------------------------------------------------------
    // Counts
    // -----------------------------------------------------------------------

    #[test]
    fn seed_count_is_ceiling_without_float_noise() {
        assert_eq!(seed_count(0.1, 1000).ok(), Some(100));
        assert_eq!(seed_count(0.3, 10).ok(), Some(3));
        assert_eq!(seed_count(0.15, 10).ok(), Some(2));
        assert_eq!(seed_count(0.001, 10).ok(), Some(1));
        assert_eq!(seed_count(1.0, 7).ok(), Some(7));
    }

    #[test]
    fn seed_count_rejects_bad_proportions() {
        assert!(seed_count(0.0, 10).is_err());
        assert!(seed_count(1.01, 10).is_err());
        assert!(seed_count(f64::NAN, 10).is_err());
    }

    // -----------------------------------------------------------------------
    // Strategies
    // -----------------------------------------------------------------------

    #[test]
    fn random_selects_exact_count() {
        let seeds = select(1000, &SeedStrategy::Random { proportion: 0.1 });
        assert_eq!(seeds.map(|s| s.len()).ok(), Some(100));
    }

    #[test]
    fn random_is_reproducible() {
        let strategy = SeedStrategy::Random { proportion: 0.2 };
        assert_eq!(select(50, &strategy).unwrap(), select(50, &strategy).unwrap());
    }

    #[test]
    fn explicit_validates_ids() {
        let ok = select(5, &SeedStrategy::Explicit { nodes: vec![NodeId(4), NodeId(0)] });
        assert_eq!(ok.ok(), Some(BTreeSet::from([NodeId(0), NodeId(4)])));
        assert!(select(5, &SeedStrategy::Explicit { nodes: vec![] }).is_err());
        assert!(select(5, &SeedStrategy::Explicit { nodes: vec![NodeId(5)] }).is_err());
        assert!(
            select(5, &SeedStrategy::Explicit { nodes: vec![NodeId(1), NodeId(1)] }).is_err()
        );
    }

    #[test]
    fn by_attribute_takes_top_values_ties_by_id() {
        let mut table = AttributeTable::new(5, 1);
        assert!(table.set_static("reach", vec![1.0, 9.0, 4.0, 9.0, 0.5]).is_ok());
        let strategy = SeedStrategy::ByAttribute {
            attribute: "reach".to_owned(),
            top_k: 3,
        };
        let seeds = select_seeds(5, &strategy, &table, &Adjacency::new(5), &mut rng());
        assert_eq!(seeds.ok(), Some(BTreeSet::from([NodeId(1), NodeId(2), NodeId(3)])));
    }

    #[test]
    fn by_attribute_rejects_bad_input() {
        let mut table = AttributeTable::new(3, 1);
        assert!(table.set_static("x", vec![1.0, f64::NAN, 2.0]).is_ok());
        let nan = SeedStrategy::ByAttribute {
            attribute: "x".to_owned(),
            top_k: 1,
        };
        let missing = SeedStrategy::ByAttribute {
            attribute: "y".to_owned(),
            top_k: 1,
        };
        let too_many = SeedStrategy::ByAttribute {
            attribute: "x".to_owned(),
            top_k: 4,
        };
        for strategy in [nan, missing, too_many] {
            assert!(select_seeds(3, &strategy, &table, &Adjacency::new(3), &mut rng()).is_err());
        }
    }

    #[test]
    fn central_and_marginal_rank_by_degree() {
        let star = Adjacency::from_edges(
            5,
            (1..5).map(|i| (NodeId(0), NodeId(i), 1.0)),
            false,
        )
        .unwrap();
        let table = AttributeTable::new(5, 1);
        let central = select_seeds(5, &SeedStrategy::Central { proportion: 0.2 }, &table, &star, &mut rng());
        let marginal = select_seeds(5, &SeedStrategy::Marginal { proportion: 0.2 }, &table, &star, &mut rng());
        assert_eq!(central.ok(), Some(BTreeSet::from([NodeId(0)])));
        assert_eq!(marginal.ok(), Some(BTreeSet::from([NodeId(1)])));
    }

    #[test]
    fn central_on_generated_graph_has_requested_size() {
        let slice = GeneratorKind::ScaleFree { m: 2 }
            .generate(100, &mut rng())
            .unwrap();
        let table = AttributeTable::new(100, 1);
        let seeds = select_seeds(100, &SeedStrategy::Central { proportion: 0.05 }, &table, &slice, &mut rng());
        assert_eq!(seeds.map(|s| s.len()).ok(), Some(5));
    }

    #[test]
    fn strategy_tag_deserializes() {
        let parsed: Result<SeedStrategy, _> =
            serde_json::from_str(r#"{"strategy":"explicit","nodes":[1,2]}"#);
        assert!(matches!(parsed, Ok(SeedStrategy::Explicit { .. })));
    }
}
