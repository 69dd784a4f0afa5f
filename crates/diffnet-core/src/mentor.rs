//! Mentor matching.
//!
//! Partitions the vertex set into cohorts and names one leader per cohort:
//! the cohort member that adopted earliest in a finished run. The leaders
//! are then typically used as explicit seeds of a dependent run.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;

use diffnet_graph::{Adjacency, Cohorts, structural_cohorts};
use diffnet_types::{NodeId, TieBreak};

use crate::error::SimError;
use crate::result::SimulationResult;
use crate::seed::SeedStrategy;

/// Where cohort membership comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum CohortSource {
    /// `k` cohorts of structurally equivalent nodes on slice 1.
    StructuralEquivalence {
        /// Number of cohorts.
        k: usize,
    },
    /// Caller-supplied cohort label per node.
    Assigned {
        /// Label of node `i` at index `i`.
        labels: Vec<usize>,
    },
}

/// One cohort and its leader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cohort {
    /// Cohort label.
    pub label: usize,
    /// Members in id order.
    pub members: Vec<NodeId>,
    /// The chosen leader.
    pub leader: NodeId,
    /// Adoption time of the leader.
    pub leader_adoption: u32,
}

/// Cohorts with exactly one leader each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MentorAssignment {
    node_count: usize,
    cohorts: Vec<Cohort>,
    membership: Vec<usize>,
}

impl MentorAssignment {
    /// Cohorts in label order.
    pub fn cohorts(&self) -> &[Cohort] {
        &self.cohorts
    }

    /// Leaders in cohort-label order.
    pub fn leaders(&self) -> Vec<NodeId> {
        self.cohorts.iter().map(|c| c.leader).collect()
    }

    /// Length-N flags, `true` at every leader.
    pub fn leader_flags(&self) -> Vec<bool> {
        let mut flags = vec![false; self.node_count];
        for cohort in &self.cohorts {
            if let Some(flag) = flags.get_mut(cohort.leader.index()) {
                *flag = true;
            }
        }
        flags
    }

    /// Cohort label of `node`.
    pub fn cohort_of(&self, node: NodeId) -> Option<usize> {
        self.membership.get(node.index()).copied()
    }

    /// Seed a dependent run with the leaders.
    pub fn seed_strategy(&self) -> SeedStrategy {
        SeedStrategy::Explicit {
            nodes: self.leaders(),
        }
    }
}

/// Choose one leader per cohort from a finished run.
///
/// The leader is the earliest adopter; ties go to `tie_break`. `rng` is only
/// drawn from under [`TieBreak::Random`].
///
/// # Errors
///
/// Returns [`SimError::InsufficientCohort`] when `k` is not in `[1, N]`, the
/// labels do not cover the vertex set, or a cohort has no adopter.
pub fn match_mentors(
    result: &SimulationResult,
    source: &CohortSource,
    tie_break: TieBreak,
    rng: &mut dyn RngCore,
) -> Result<MentorAssignment, SimError> {
    let n = result.node_count();
    let first = result.graph.get_slice(1)?;
    let cohorts = match source {
        CohortSource::StructuralEquivalence { k } => {
            if *k == 0 || *k > n {
                return Err(SimError::InsufficientCohort {
                    cohort: *k,
                    reason: format!("cannot form {k} cohorts from {n} nodes"),
                });
            }
            structural_cohorts(first, *k)?
        }
        CohortSource::Assigned { labels } => {
            Cohorts::from_labels(labels.clone(), n).map_err(|err| SimError::InsufficientCohort {
                cohort: 0,
                reason: err.to_string(),
            })?
        }
    };

    let groups = cohorts.groups();
    let mut chosen = Vec::with_capacity(groups.len());
    for (label, members) in groups.into_iter().enumerate() {
        if members.is_empty() {
            return Err(SimError::InsufficientCohort {
                cohort: label,
                reason: "cohort is empty".to_owned(),
            });
        }
        let earliest = members
            .iter()
            .filter_map(|&node| result.adoption.time_of(node))
            .min()
            .ok_or_else(|| SimError::InsufficientCohort {
                cohort: label,
                reason: "no member adopted".to_owned(),
            })?;
        let tied: Vec<NodeId> = members
            .iter()
            .copied()
            .filter(|&node| result.adoption.time_of(node) == Some(earliest))
            .collect();
        let leader = break_tie(&tied, tie_break, first, rng).ok_or_else(|| {
            SimError::InsufficientCohort {
                cohort: label,
                reason: "no candidate leader".to_owned(),
            }
        })?;
        debug!(cohort = label, leader = %leader, adopted = earliest, "Leader chosen");
        chosen.push(Cohort {
            label,
            members,
            leader,
            leader_adoption: earliest,
        });
    }

    Ok(MentorAssignment {
        node_count: n,
        cohorts: chosen,
        membership: cohorts.labels().to_vec(),
    })
}

/// `tied` is non-empty and in id order.
fn break_tie(
    tied: &[NodeId],
    tie_break: TieBreak,
    first: &Adjacency,
    rng: &mut dyn RngCore,
) -> Option<NodeId> {
    match tie_break {
        TieBreak::FirstId => tied.first().copied(),
        TieBreak::Random => {
            if tied.is_empty() {
                return None;
            }
            tied.get(rng.random_range(0..tied.len())).copied()
        }
        TieBreak::HighestDegree => tied.iter().copied().max_by(|&a, &b| {
            let degree = |node: NodeId| first.out_degree(node).saturating_add(first.in_degree(node));
            // Higher degree wins; among equals the lower id is "greater".
            degree(a).cmp(&degree(b)).then(b.cmp(&a))
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
