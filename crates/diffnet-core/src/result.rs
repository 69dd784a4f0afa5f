//! Finished runs and the statistics read from them.

use std::collections::BTreeSet;

use serde::Serialize;

use diffnet_graph::GraphStore;
use diffnet_types::NodeId;

use crate::attributes::AttributeTable;
use crate::exposure::{ExposureArgs, ExposureMatrix};
use crate::state::AdoptionState;
use crate::threshold::ThresholdVector;

/// What happened during one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepSummary {
    /// Step index.
    pub time: u32,
    /// Nodes that adopted at this step.
    pub new_adopters: usize,
    /// Nodes that had adopted by the end of this step.
    pub cumulative_adopters: usize,
    /// Whether the next slice was rewired after this step.
    pub rewired: bool,
}

/// Descriptive facts about a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMetadata {
    /// Vertex count `N`.
    pub node_count: usize,
    /// Horizon `T`.
    pub horizon: u32,
    /// Initial adopters.
    pub seeds: BTreeSet<NodeId>,
    /// Exposure parameters used.
    pub exposure: ExposureArgs,
    /// Whether a rewire strategy was active.
    pub rewired: bool,
}

/// Cumulative adoption per step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CumulativeAdoption {
    /// Adopters by the end of step `t`, at index `t - 1`.
    pub counts: Vec<usize>,
    /// `counts` divided by `N`.
    pub proportions: Vec<f64>,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    /// Network slices as they were during the run, rewiring applied.
    pub graph: GraphStore,
    /// Adoption time per node.
    pub adoption: AdoptionState,
    /// Exposure of every node at every step.
    pub exposure: ExposureMatrix,
    /// Realized thresholds.
    pub thresholds: ThresholdVector,
    /// Node covariates.
    pub attributes: AttributeTable,
    /// One summary per step, starting with the seeding step.
    pub steps: Vec<StepSummary>,
    /// Run facts.
    pub metadata: RunMetadata,
}

impl SimulationResult {
    /// Vertex count `N`.
    pub const fn node_count(&self) -> usize {
        self.metadata.node_count
    }

    /// Horizon `T`.
    pub const fn horizon(&self) -> u32 {
        self.metadata.horizon
    }

    /// Initial adopters.
    pub const fn seeds(&self) -> &BTreeSet<NodeId> {
        &self.metadata.seeds
    }

    /// Adoption time per node (`None` = never).
    pub fn adoption_times(&self) -> &[Option<u32>] {
        self.adoption.times()
    }

    /// Realized thresholds.
    pub const fn thresholds(&self) -> &ThresholdVector {
        &self.thresholds
    }

    /// Copy of the realized thresholds for a dependent run.
    pub fn reuse_thresholds(&self) -> ThresholdVector {
        self.thresholds.clone()
    }

    /// Nodes that adopted exactly at step `t`.
    pub fn adopters_at(&self, t: u32) -> Vec<NodeId> {
        self.adoption.adopters_at(t)
    }

    /// Adopter counts and proportions by step.
    pub fn cumulative_adoption(&self) -> CumulativeAdoption {
        let counts: Vec<usize> = (1..=self.horizon())
            .map(|t| self.adoption.count_adopted_by(t))
            .collect();
        let proportions = counts.iter().map(|&c| self.share(c)).collect();
        CumulativeAdoption {
            counts,
            proportions,
        }
    }

    /// Hazard rate per step: `new(t) / (N - cum(t - 1))`.
    ///
    /// Zero when no node remains at risk.
    pub fn hazard_rate(&self) -> Vec<f64> {
        let n = self.node_count();
        let mut previous: usize = 0;
        (1..=self.horizon())
            .map(|t| {
                let cumulative = self.adoption.count_adopted_by(t);
                let fresh = cumulative.saturating_sub(previous);
                let at_risk = n.saturating_sub(previous);
                previous = cumulative;
                if at_risk == 0 {
                    0.0
                } else {
                    ratio(fresh, at_risk)
                }
            })
            .collect()
    }

    /// Share of nodes that had adopted by step `T`.
    pub fn final_proportion(&self) -> f64 {
        self.share(self.adoption.count_adopted_by(self.horizon()))
    }

    fn share(&self, count: usize) -> f64 {
        if self.node_count() == 0 {
            0.0
        } else {
            ratio(count, self.node_count())
        }
    }
}

// Counts are far below 2^52; the conversion is exact.
#[allow(clippy::cast_precision_loss)]
fn ratio(numerator: usize, denominator: usize) -> f64 {
    numerator as f64 / denominator as f64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use diffnet_graph::Adjacency;

    use super::*;

    /// Four nodes, horizon 3: node 0 seeds, 1 and 2 adopt at 2, 3 never.
    fn result() -> Option<SimulationResult> {
        let graph = GraphStore::replicated(Adjacency::new(4), 3).ok()?;
        let mut adoption = AdoptionState::new(4);
        adoption.adopt(NodeId(0), 1).ok()?;
        adoption.adopt(NodeId(1), 2).ok()?;
        adoption.adopt(NodeId(2), 2).ok()?;
        Some(SimulationResult {
            graph,
            adoption,
            exposure: ExposureMatrix::zeros(4, 3),
            thresholds: ThresholdVector::from_values(vec![0.5; 4]).ok()?,
            attributes: AttributeTable::new(4, 3),
            steps: Vec::new(),
            metadata: RunMetadata {
                node_count: 4,
                horizon: 3,
                seeds: BTreeSet::from([NodeId(0)]),
                exposure: ExposureArgs::default(),
                rewired: false,
            },
        })
    }

    #[test]
    fn cumulative_adoption_by_step() {
        let cumulative = result().map(|r| r.cumulative_adoption());
        assert_eq!(cumulative.as_ref().map(|c| c.counts.clone()), Some(vec![1, 3, 3]));
        assert_eq!(
            cumulative.map(|c| c.proportions),
            Some(vec![0.25, 0.75, 0.75])
        );
    }

    #[test]
    fn hazard_rate_uses_population_at_risk() {
        let hazard = result().map(|r| r.hazard_rate()).unwrap_or_default();
        // 1/4, then 2 of the remaining 3, then 0 of the remaining 1.
        assert_eq!(hazard.len(), 3);
        assert!((hazard.first().copied().unwrap_or(-1.0) - 0.25).abs() < 1e-12);
        assert!((hazard.get(1).copied().unwrap_or(-1.0) - 2.0 / 3.0).abs() < 1e-12);
        assert!(hazard.get(2).copied().unwrap_or(-1.0).abs() < 1e-12);
    }

    #[test]
    fn final_proportion_and_adopters() {
        let r = result();
        assert_eq!(r.as_ref().map(SimulationResult::final_proportion), Some(0.75));
        assert_eq!(
            r.map(|r| r.adopters_at(2)),
            Some(vec![NodeId(1), NodeId(2)])
        );
    }

    #[test]
    fn reused_thresholds_are_identical() {
        let r = result();
        let reused = r.as_ref().map(SimulationResult::reuse_thresholds);
        assert_eq!(reused.as_ref(), r.as_ref().map(SimulationResult::thresholds));
    }
}
