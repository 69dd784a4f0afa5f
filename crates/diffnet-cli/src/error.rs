//! Error types for the command-line runner.

use diffnet_core::{ConfigError, SimError};

/// Errors that can stop the runner.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The configuration file could not be loaded.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The simulation or replication batch failed.
    #[error("simulation error: {0}")]
    Simulation(#[from] SimError),

    /// The report could not be serialized.
    #[error("report serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
