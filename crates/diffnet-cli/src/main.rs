//! Command-line runner for the diffnet diffusion engine.
//!
//! Loads a YAML configuration (first argument, default
//! `diffnet-config.yaml`), initializes logging, and either runs one cascade
//! or, when `replication.runs > 1`, a replication batch on the configured
//! worker pool. The result is printed to stdout as a JSON report.
//!
//! ```text
//! config.yaml --> DiffusionConfig --> simulate / replicate --> JSON report
//! ```

mod error;
mod report;

use std::path::{Path, PathBuf};

use tracing::info;
use tracing_subscriber::EnvFilter;

use diffnet_core::config::LOG_ENV;
use diffnet_core::{DiffusionConfig, ReplicationRunner, StatisticFailure, replicate, simulate};

use crate::error::CliError;
use crate::report::{BatchReport, RunReport};

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG: &str = "diffnet-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the simulation fails,
/// or the report cannot be serialized.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG), PathBuf::from);
    let (config, loaded) = load_config(&path)?;

    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env(LOG_ENV)
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    if loaded {
        info!(path = %path.display(), "Configuration loaded");
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
    }
    info!(
        experiment_id = config.experiment_id,
        n = config.n,
        t = config.t,
        runs = config.replication.runs,
        rewire = config.rewire,
        "diffnet starting"
    );

    let report = run(&config)?;
    println!("{report}");
    Ok(())
}

/// Load the config file, or defaults when it does not exist.
fn load_config(path: &Path) -> Result<(DiffusionConfig, bool), CliError> {
    if path.exists() {
        Ok((DiffusionConfig::from_file(path)?, true))
    } else {
        let mut config = DiffusionConfig::default();
        config.apply_env_overrides();
        Ok((config, false))
    }
}

/// Run the configured experiment and render its report.
fn run(config: &DiffusionConfig) -> Result<String, CliError> {
    if config.replication.runs > 1 {
        let batch = replicate(config, |result| {
            Ok::<_, StatisticFailure>(result.cumulative_adoption().proportions)
        })?;
        let report = BatchReport::new(config, &batch);
        Ok(serde_json::to_string_pretty(&report)?)
    } else {
        // Same stream as run 0 of a batch with this seed.
        let mut rng = ReplicationRunner::stream(config.random_seed, 0);
        let result = simulate(config, &mut rng)?;
        let report = RunReport::new(config, &result);
        Ok(serde_json::to_string_pretty(&report)?)
    }
}
