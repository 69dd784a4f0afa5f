//! Structural equivalence and cohort partitioning.
//!
//! Two nodes are structurally equivalent when they hold the same ties to the
//! same third parties. The distance between `i` and `j` compares their
//! outbound and inbound tie profiles, ignoring the ties between the pair:
//!
//! ```text
//! d(i, j) = sqrt( sum_{m != i, j} (w_im - w_jm)^2 + (w_mi - w_mj)^2 )
//! ```
//!
//! [`structural_cohorts`] groups nodes into `k` cohorts with a deterministic
//! k-medoids pass over that distance. [`Cohorts`] can also wrap an externally
//! supplied grouping.

use std::collections::BTreeMap;

use diffnet_types::{ExposureDirection, NodeId};
use tracing::debug;

use crate::adjacency::Adjacency;
use crate::error::GraphError;

/// Maximum assign/update rounds for the k-medoids pass.
const MAX_MEDOID_ROUNDS: usize = 50;

/// Dense symmetric `N x N` distance matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    /// Return the number of nodes covered.
    pub const fn len(&self) -> usize {
        self.n
    }

    /// Whether the matrix covers no nodes.
    pub const fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Distance between `i` and `j`; zero for out-of-range ids.
    pub fn get(&self, i: NodeId, j: NodeId) -> f64 {
        i.index()
            .checked_mul(self.n)
            .and_then(|row| row.checked_add(j.index()))
            .and_then(|cell| self.values.get(cell))
            .copied()
            .unwrap_or(0.0)
    }
}

/// Sum of squared differences between two tie profiles, skipping `skip`.
fn profile_gap(
    a: Option<&BTreeMap<NodeId, f64>>,
    b: Option<&BTreeMap<NodeId, f64>>,
    skip: (NodeId, NodeId),
) -> f64 {
    let empty = BTreeMap::new();
    let a = a.unwrap_or(&empty);
    let b = b.unwrap_or(&empty);
    let mut total = 0.0;
    for (m, &wa) in a {
        if *m == skip.0 || *m == skip.1 {
            continue;
        }
        let wb = b.get(m).copied().unwrap_or(0.0);
        total += (wa - wb).powi(2);
    }
    for (m, &wb) in b {
        if *m == skip.0 || *m == skip.1 || a.contains_key(m) {
            continue;
        }
        total += wb.powi(2);
    }
    total
}

/// Compute pairwise structural-equivalence distances for one snapshot.
pub fn structural_distance(adjacency: &Adjacency) -> DistanceMatrix {
    let n = adjacency.node_count();
    let mut values = vec![0.0; n.saturating_mul(n)];
    let ids: Vec<NodeId> = (0..n).filter_map(NodeId::from_index).collect();

    for (pos, &i) in ids.iter().enumerate() {
        for &j in ids.iter().skip(pos.saturating_add(1)) {
            let out_gap = profile_gap(adjacency.out_arcs(i), adjacency.out_arcs(j), (i, j));
            let in_gap = profile_gap(adjacency.in_arcs(i), adjacency.in_arcs(j), (i, j));
            let d = (out_gap + in_gap).sqrt();
            for (row, col) in [(i, j), (j, i)] {
                let cell = row.index().saturating_mul(n).saturating_add(col.index());
                if let Some(slot) = values.get_mut(cell) {
                    *slot = d;
                }
            }
        }
    }
    DistanceMatrix { n, values }
}

/// A partition of the vertex set into disjoint, non-empty-by-label cohorts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cohorts {
    labels: Vec<usize>,
    count: usize,
}

impl Cohorts {
    /// Wrap an external grouping: one cohort label per node.
    ///
    /// Labels need not be contiguous; the cohort count is `max label + 1`, so
    /// skipped labels show up as empty cohorts.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::VertexCountMismatch`] when `labels.len() != n`.
    pub fn from_labels(labels: Vec<usize>, n: usize) -> Result<Self, GraphError> {
        if labels.len() != n {
            return Err(GraphError::VertexCountMismatch {
                expected: n,
                actual: labels.len(),
                slice: 1,
            });
        }
        let count = labels.iter().max().map_or(0, |&max| max.saturating_add(1));
        Ok(Self { labels, count })
    }

    /// Number of cohorts.
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Cohort label of `node`.
    pub fn label_of(&self, node: NodeId) -> Option<usize> {
        self.labels.get(node.index()).copied()
    }

    /// Per-node cohort labels.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Members of each cohort in id order, indexed by label.
    pub fn groups(&self) -> Vec<Vec<NodeId>> {
        let mut groups = vec![Vec::new(); self.count];
        for (idx, &label) in self.labels.iter().enumerate() {
            if let (Some(group), Some(id)) = (groups.get_mut(label), NodeId::from_index(idx)) {
                group.push(id);
            }
        }
        groups
    }
}

/// Partition the nodes of `adjacency` into `k` structural-equivalence cohorts.
///
/// The first medoid is the highest-degree node, further medoids are chosen
/// farthest-first, then assignment and medoid update alternate until the
/// medoids stop moving. Every tie is broken by lower id, so the result is a
/// pure function of the snapshot.
///
/// # Errors
///
/// Returns [`GraphError::InvalidParameter`] when `k` is not in `[1, N]`.
pub fn structural_cohorts(adjacency: &Adjacency, k: usize) -> Result<Cohorts, GraphError> {
    let n = adjacency.node_count();
    if k == 0 || k > n {
        return Err(GraphError::InvalidParameter {
            name: "k",
            reason: format!("need 1 <= k <= {n}, got {k}"),
        });
    }
    let distance = structural_distance(adjacency);
    let ids: Vec<NodeId> = (0..n).filter_map(NodeId::from_index).collect();

    let mut medoids = initial_medoids(adjacency, &distance, &ids, k);
    let mut labels = assign(&distance, &ids, &medoids);

    for round in 0..MAX_MEDOID_ROUNDS {
        let updated = update_medoids(&distance, &ids, &labels, &medoids);
        if updated == medoids {
            debug!(k, rounds = round, "Cohort medoids converged");
            break;
        }
        medoids = updated;
        labels = assign(&distance, &ids, &medoids);
    }

    Ok(Cohorts { labels, count: k })
}

fn initial_medoids(
    adjacency: &Adjacency,
    distance: &DistanceMatrix,
    ids: &[NodeId],
    k: usize,
) -> Vec<NodeId> {
    let mut medoids: Vec<NodeId> = Vec::with_capacity(k);
    let hub = ids
        .iter()
        .copied()
        .max_by(|&a, &b| {
            let da = adjacency.degree(a, ExposureDirection::Both);
            let db = adjacency.degree(b, ExposureDirection::Both);
            da.cmp(&db).then_with(|| b.cmp(&a))
        })
        .unwrap_or(NodeId(0));
    medoids.push(hub);

    while medoids.len() < k {
        let next = ids
            .iter()
            .copied()
            .filter(|id| !medoids.contains(id))
            .max_by(|&a, &b| {
                let da = nearest(distance, a, &medoids).1;
                let db = nearest(distance, b, &medoids).1;
                da.total_cmp(&db).then_with(|| b.cmp(&a))
            });
        match next {
            Some(id) => medoids.push(id),
            None => break,
        }
    }
    medoids
}

/// Index of the nearest medoid and the distance to it.
fn nearest(distance: &DistanceMatrix, node: NodeId, medoids: &[NodeId]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (pos, &medoid) in medoids.iter().enumerate() {
        let d = distance.get(node, medoid);
        if d < best.1 {
            best = (pos, d);
        }
    }
    best
}

fn assign(distance: &DistanceMatrix, ids: &[NodeId], medoids: &[NodeId]) -> Vec<usize> {
    ids.iter()
        .map(|&id| {
            // A medoid always belongs to its own cohort, even when another
            // medoid sits at distance zero.
            medoids
                .iter()
                .position(|&m| m == id)
                .unwrap_or_else(|| nearest(distance, id, medoids).0)
        })
        .collect()
}

fn update_medoids(
    distance: &DistanceMatrix,
    ids: &[NodeId],
    labels: &[usize],
    medoids: &[NodeId],
) -> Vec<NodeId> {
    medoids
        .iter()
        .enumerate()
        .map(|(cohort, &current)| {
            let members: Vec<NodeId> = ids
                .iter()
                .zip(labels)
                .filter(|&(_, &label)| label == cohort)
                .map(|(&id, _)| id)
                .collect();
            let cost = |candidate: NodeId| -> f64 {
                members.iter().map(|&m| distance.get(candidate, m)).sum()
            };
            let mut best = current;
            let mut best_cost = cost(current);
            for &candidate in &members {
                let c = cost(candidate);
                if c < best_cost || (c <= best_cost && candidate < best) {
                    best = candidate;
                    best_cost = c;
                }
            }
            best
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Two stars: hubs 0 and 5, leaves 1-4 and 6-9.
    fn two_stars() -> Adjacency {
        let mut edges = Vec::new();
        for leaf in 1..5_u32 {
            edges.push((NodeId(0), NodeId(leaf), 1.0));
        }
        for leaf in 6..10_u32 {
            edges.push((NodeId(5), NodeId(leaf), 1.0));
        }
        Adjacency::from_edges(10, edges, false).unwrap()
    }

    #[test]
    fn leaves_of_same_hub_are_equivalent() {
        let d = structural_distance(&two_stars());
        assert!(d.get(NodeId(1), NodeId(2)).abs() < f64::EPSILON);
        assert!(d.get(NodeId(1), NodeId(6)) > 1.0);
        assert!((d.get(NodeId(3), NodeId(7)) - d.get(NodeId(7), NodeId(3))).abs() < f64::EPSILON);
    }

    #[test]
    fn distance_ignores_the_pair_own_tie() {
        // 0 and 1 are tied to each other and to nothing else.
        let adj = Adjacency::from_edges(3, vec![(NodeId(0), NodeId(1), 1.0)], false).unwrap();
        let d = structural_distance(&adj);
        assert!(d.get(NodeId(0), NodeId(1)).abs() < f64::EPSILON);
    }

    #[test]
    fn every_node_gets_exactly_one_of_k_cohorts() {
        let cohorts = structural_cohorts(&two_stars(), 3).unwrap();
        assert_eq!(cohorts.count(), 3);
        assert_eq!(cohorts.labels().len(), 10);
        let groups = cohorts.groups();
        assert_eq!(groups.iter().map(Vec::len).sum::<usize>(), 10);
        assert!(groups.iter().all(|g| !g.is_empty()));
    }

    #[test]
    fn leaves_of_one_star_share_a_cohort() {
        let cohorts = structural_cohorts(&two_stars(), 2).unwrap();
        let label = |n: u32| cohorts.label_of(NodeId(n)).unwrap();
        assert_eq!(label(1), label(2));
        assert_eq!(label(2), label(4));
        assert_eq!(label(6), label(9));
        assert_ne!(label(1), label(6));
    }

    #[test]
    fn clustering_is_deterministic() {
        let a = structural_cohorts(&two_stars(), 4).unwrap();
        let b = structural_cohorts(&two_stars(), 4).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn k_out_of_range_is_rejected() {
        assert!(structural_cohorts(&two_stars(), 0).is_err());
        assert!(structural_cohorts(&two_stars(), 11).is_err());
    }

    #[test]
    fn external_labels_must_cover_every_node() {
        assert!(Cohorts::from_labels(vec![0, 1, 1], 4).is_err());
        let cohorts = Cohorts::from_labels(vec![0, 2, 2, 0], 4).unwrap();
        assert_eq!(cohorts.count(), 3);
        assert!(cohorts.groups().get(1).is_some_and(Vec::is_empty));
    }
}
