//! Config-driven entry points.
//!
//! These wire a [`DiffusionConfig`] into the lower-level pieces: generate the
//! network, sample thresholds, seed, and run. Every draw comes from the one
//! stream passed in, in that order, so a config plus a seed fixes the run.

use rand::RngCore;

use diffnet_graph::GraphStore;

use crate::config::DiffusionConfig;
use crate::error::SimError;
use crate::replication::{ReplicationBatch, ReplicationRunner, StatisticFailure};
use crate::result::SimulationResult;
use crate::seed::SeedStrategy;
use crate::simulator::CascadeSimulator;
use crate::threshold::ThresholdVector;

/// Build an unseeded simulator from `config`.
///
/// # Errors
///
/// Returns [`SimError::InvalidGraph`] if the generator or rewire strategy
/// rejects its parameters, or [`SimError::InvalidThreshold`] for a bad
/// threshold draw. Nothing has been seeded or stepped when this fails.
pub fn build_simulator(
    config: &DiffusionConfig,
    rng: &mut dyn RngCore,
) -> Result<CascadeSimulator, SimError> {
    let graph = if config.dynamic_graph {
        GraphStore::generate_dynamic(&config.graph, config.n, config.t, rng)?
    } else {
        GraphStore::generate(&config.graph, config.n, config.t, rng)?
    };
    let thresholds = ThresholdVector::sample(config.n, &config.threshold, rng)?;
    let simulator = CascadeSimulator::new(graph, thresholds, config.exposure_args())?;
    if config.rewire {
        simulator.with_rewire(config.rewire_args.clone())
    } else {
        Ok(simulator)
    }
}

/// Run one simulation described by `config` to completion.
///
/// # Errors
///
/// Any error from [`build_simulator`], seeding, or stepping.
pub fn simulate(
    config: &DiffusionConfig,
    rng: &mut dyn RngCore,
) -> Result<SimulationResult, SimError> {
    let mut simulator = build_simulator(config, rng)?;
    simulator.seed(&config.seed_strategy(), rng)?;
    simulator.run(rng)
}

/// Run a follow-up simulation on a prior run's network and thresholds.
///
/// The prior's slices, realized thresholds and attributes are copied, never
/// resampled, so a time-varying prior keeps every snapshot. Only `seeds`, the
/// exposure settings, and rewiring come from the caller.
///
/// # Errors
///
/// Any seeding or stepping error.
pub fn simulate_dependent(
    prior: &SimulationResult,
    config: &DiffusionConfig,
    seeds: &SeedStrategy,
    rng: &mut dyn RngCore,
) -> Result<SimulationResult, SimError> {
    let graph = GraphStore::from_slices(prior.graph.slices().to_vec(), prior.horizon())?;
    let mut simulator = CascadeSimulator::new(graph, prior.reuse_thresholds(), config.exposure_args())?
        .with_attributes(prior.attributes.clone())?;
    if config.rewire {
        simulator = simulator.with_rewire(config.rewire_args.clone())?;
    }
    simulator.seed(seeds, rng)?;
    simulator.run(rng)
}

/// Run `replication.runs` independent simulations of `config`.
///
/// Run `r` uses stream `r` of `random_seed`, so outputs match across worker
/// counts.
///
/// # Errors
///
/// Under the abort policy, the failure with the lowest run index.
pub fn replicate<S>(config: &DiffusionConfig, statistic: S) -> Result<ReplicationBatch, SimError>
where
    S: Fn(&SimulationResult) -> Result<Vec<f64>, StatisticFailure> + Sync,
{
    ReplicationRunner::new(config.random_seed)
        .with_workers(config.replication.workers)
        .with_failure_policy(config.replication.failure_policy)
        .run(config.replication.runs, statistic, |_, rng| simulate(config, rng))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
