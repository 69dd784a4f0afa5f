//! The cascade state machine.
//!
//! A [`CascadeSimulator`] moves through four phases:
//!
//! ```text
//! Uninitialized --seed--> Seeded --step--> Running(3) --step--> ... --> Terminal
//! ```
//!
//! Seeds adopt at step 1. Each later step `t` computes every node's exposure
//! on slice `t` against the adoptions of steps `1..t`, then applies all new
//! adoptions together. When a rewire strategy is set and `t < T`, slice
//! `t + 1` is replaced by the rewired slice `t` before the next step.

use std::collections::BTreeSet;
use std::fmt;

use rand::RngCore;
use tracing::{debug, info};

use diffnet_graph::{GraphStore, RewireStrategy, Rewirer};
use diffnet_types::NodeId;
use diffnet_types::ids::all_nodes;

use crate::attributes::AttributeTable;
use crate::error::SimError;
use crate::exposure::{ExposureArgs, ExposureMatrix, exposure};
use crate::result::{RunMetadata, SimulationResult, StepSummary};
use crate::seed::{SeedStrategy, select_seeds};
use crate::state::AdoptionState;
use crate::threshold::ThresholdVector;

/// Lifecycle phase of a [`CascadeSimulator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulatorPhase {
    /// Built, not yet seeded.
    Uninitialized,
    /// Seeds adopted at step 1; the next `step` evaluates step 2.
    Seeded,
    /// The next call to `step` evaluates this time index.
    Running(u32),
    /// All steps done.
    Terminal,
}

impl fmt::Display for SimulatorPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Seeded => write!(f, "seeded"),
            Self::Running(t) => write!(f, "running at step {t}"),
            Self::Terminal => write!(f, "terminal"),
        }
    }
}

/// Time-stepped threshold cascade over a [`GraphStore`].
#[derive(Debug, Clone)]
pub struct CascadeSimulator {
    graph: GraphStore,
    thresholds: ThresholdVector,
    args: ExposureArgs,
    rewire: Option<RewireStrategy>,
    attributes: AttributeTable,
    state: AdoptionState,
    exposure: ExposureMatrix,
    steps: Vec<StepSummary>,
    seeds: BTreeSet<NodeId>,
    phase: SimulatorPhase,
}

impl CascadeSimulator {
    /// Build a simulator in the `Uninitialized` phase.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ThresholdCount`] if `thresholds` does not have
    /// one entry per node.
    pub fn new(
        graph: GraphStore,
        thresholds: ThresholdVector,
        args: ExposureArgs,
    ) -> Result<Self, SimError> {
        let n = graph.node_count();
        if thresholds.len() != n {
            return Err(SimError::ThresholdCount {
                expected: n,
                actual: thresholds.len(),
            });
        }
        let horizon = graph.horizon();
        Ok(Self {
            graph,
            thresholds,
            args,
            rewire: None,
            attributes: AttributeTable::new(n, horizon),
            state: AdoptionState::new(n),
            exposure: ExposureMatrix::zeros(n, horizon),
            steps: Vec::new(),
            seeds: BTreeSet::new(),
            phase: SimulatorPhase::Uninitialized,
        })
    }

    /// Rewire the network between steps with `strategy`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidGraph`] if the strategy's parameters are
    /// out of range for this network.
    pub fn with_rewire(mut self, strategy: RewireStrategy) -> Result<Self, SimError> {
        strategy.check(self.graph.node_count())?;
        self.rewire = Some(strategy);
        Ok(self)
    }

    /// Attach node covariates.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidAttribute`] if the table was built for a
    /// different vertex count.
    pub fn with_attributes(mut self, attributes: AttributeTable) -> Result<Self, SimError> {
        if attributes.node_count() != self.graph.node_count() {
            return Err(SimError::InvalidAttribute {
                name: "*".to_owned(),
                reason: format!(
                    "table covers {} nodes, network has {}",
                    attributes.node_count(),
                    self.graph.node_count()
                ),
            });
        }
        self.attributes = attributes;
        Ok(self)
    }

    /// Current phase.
    pub const fn phase(&self) -> SimulatorPhase {
        self.phase
    }

    /// Adoption state so far.
    pub const fn state(&self) -> &AdoptionState {
        &self.state
    }

    /// Network as it stands, rewiring applied so far.
    pub const fn graph(&self) -> &GraphStore {
        &self.graph
    }

    /// Choose and adopt the seeds at step 1.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidPhase`] unless `Uninitialized`, or any
    /// seed selection error.
    pub fn seed(&mut self, strategy: &SeedStrategy, rng: &mut dyn RngCore) -> Result<(), SimError> {
        self.expect_phase(matches!(self.phase, SimulatorPhase::Uninitialized), "uninitialized")?;
        let first = self.graph.get_slice(1)?;
        let seeds = select_seeds(self.graph.node_count(), strategy, &self.attributes, first, rng)?;
        for &node in &seeds {
            self.state.adopt(node, 1)?;
        }
        self.steps.push(StepSummary {
            time: 1,
            new_adopters: seeds.len(),
            cumulative_adopters: seeds.len(),
            rewired: false,
        });
        info!(
            nodes = self.graph.node_count(),
            horizon = self.graph.horizon(),
            seeds = seeds.len(),
            "Cascade seeded"
        );
        self.seeds = seeds;
        self.phase = if self.graph.horizon() <= 1 {
            SimulatorPhase::Terminal
        } else {
            SimulatorPhase::Seeded
        };
        Ok(())
    }

    /// Evaluate one step.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidPhase`] unless seeded and not terminal, or
    /// a [`SimError::Rewire`] if rewiring the next slice fails.
    pub fn step(&mut self, rng: &mut dyn RngCore) -> Result<StepSummary, SimError> {
        let t = match self.phase {
            SimulatorPhase::Running(t) => t,
            SimulatorPhase::Seeded => 2,
            other => {
                return Err(SimError::InvalidPhase {
                    expected: "running",
                    found: other.to_string(),
                });
            }
        };

        let slice = self.graph.get_slice(t)?;
        let mut fresh = Vec::new();
        for node in all_nodes(self.graph.node_count()) {
            let value = exposure(slice, &self.state, node, t, self.args);
            self.exposure.set(node, t, value);
            if self.state.time_of(node).is_none()
                && self.thresholds.get(node).is_some_and(|threshold| value >= threshold)
            {
                fresh.push(node);
            }
        }
        for &node in &fresh {
            self.state.adopt(node, t)?;
        }

        let rewired = self.rewire_after(t, rng)?;
        let summary = StepSummary {
            time: t,
            new_adopters: fresh.len(),
            cumulative_adopters: self.state.count_adopted_by(t),
            rewired,
        };
        debug!(
            time = t,
            new_adopters = summary.new_adopters,
            cumulative = summary.cumulative_adopters,
            rewired,
            "Step evaluated"
        );
        self.steps.push(summary);
        self.phase = if t >= self.graph.horizon() {
            SimulatorPhase::Terminal
        } else {
            SimulatorPhase::Running(t.saturating_add(1))
        };
        Ok(summary)
    }

    /// Step a seeded simulator until terminal and return the result.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidPhase`] if called before seeding, or any
    /// error raised by a step.
    pub fn run(mut self, rng: &mut dyn RngCore) -> Result<SimulationResult, SimError> {
        if matches!(self.phase, SimulatorPhase::Uninitialized) {
            return Err(SimError::InvalidPhase {
                expected: "seeded",
                found: self.phase.to_string(),
            });
        }
        while !matches!(self.phase, SimulatorPhase::Terminal) {
            self.step(rng)?;
        }
        self.into_result()
    }

    /// Consume a terminal simulator into its result.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidPhase`] unless `Terminal`.
    pub fn into_result(self) -> Result<SimulationResult, SimError> {
        self.expect_phase(matches!(self.phase, SimulatorPhase::Terminal), "terminal")?;
        let final_count = self.state.count_adopted_by(self.graph.horizon());
        info!(
            adopters = final_count,
            nodes = self.graph.node_count(),
            "Cascade finished"
        );
        Ok(SimulationResult {
            metadata: RunMetadata {
                node_count: self.graph.node_count(),
                horizon: self.graph.horizon(),
                seeds: self.seeds,
                exposure: self.args,
                rewired: self.rewire.is_some(),
            },
            graph: self.graph,
            adoption: self.state,
            exposure: self.exposure,
            thresholds: self.thresholds,
            attributes: self.attributes,
            steps: self.steps,
        })
    }

    /// Replace slice `t + 1` with the rewired slice `t` when a strategy is
    /// set and `t < T`. Returns whether rewiring ran.
    fn rewire_after(&mut self, t: u32, rng: &mut dyn RngCore) -> Result<bool, SimError> {
        let Some(strategy) = &self.rewire else {
            return Ok(false);
        };
        if t >= self.graph.horizon() {
            return Ok(false);
        }
        let next = strategy
            .rewire(self.graph.get_slice(t)?, rng)
            .map_err(|source| SimError::Rewire { time: t, source })?;
        self.graph
            .replace_slice(t.saturating_add(1), next)
            .map_err(|source| SimError::Rewire { time: t, source })?;
        Ok(true)
    }

    fn expect_phase(&self, ok: bool, expected: &'static str) -> Result<(), SimError> {
        if ok {
            Ok(())
        } else {
            Err(SimError::InvalidPhase {
                expected,
                found: self.phase.to_string(),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
