//! Cascade simulation for the diffnet diffusion engine.
//!
//! This crate owns the time-stepped threshold cascade: seeding, per-step
//! exposure, simultaneous adoption, optional rewiring between steps, and the
//! analyses that run on the finished history.
//!
//! # Modules
//!
//! - [`attributes`] -- Per-node static and per-time dynamic covariates.
//! - [`config`] -- YAML configuration loaded into strongly-typed structs.
//! - [`error`] -- The [`SimError`] taxonomy.
//! - [`exposure`] -- Exposure of a node to adopting neighbors.
//! - [`mentor`] -- Leader selection per cohort for dependent runs.
//! - [`replication`] -- Worker pool running many independent simulations.
//! - [`result`] -- [`SimulationResult`] and post-hoc statistics.
//! - [`seed`] -- Initial adopter selection.
//! - [`simulate`] -- Config-driven entry points.
//! - [`simulator`] -- The [`CascadeSimulator`] state machine.
//! - [`state`] -- Write-once adoption times.
//! - [`threshold`] -- Threshold samplers and the realized threshold vector.

pub mod attributes;
pub mod config;
pub mod error;
pub mod exposure;
pub mod mentor;
pub mod replication;
pub mod result;
pub mod seed;
pub mod simulate;
pub mod simulator;
pub mod state;
pub mod threshold;

// Re-export primary types at crate root.
pub use attributes::AttributeTable;
pub use config::{ConfigError, DiffusionConfig};
pub use error::SimError;
pub use exposure::{ExposureArgs, ExposureMatrix, exposure, exposure_matrix};
pub use mentor::{CohortSource, MentorAssignment, match_mentors};
pub use replication::{ReplicationBatch, ReplicationRunner, RunRecord, StatisticFailure};
pub use result::{CumulativeAdoption, RunMetadata, SimulationResult, StepSummary};
pub use seed::{SeedStrategy, select_seeds};
pub use simulate::{build_simulator, replicate, simulate, simulate_dependent};
pub use simulator::{CascadeSimulator, SimulatorPhase};
pub use state::AdoptionState;
pub use threshold::{ThresholdDist, ThresholdSampler, ThresholdVector};
