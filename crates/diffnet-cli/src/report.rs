//! JSON reports printed by the runner.

use chrono::{DateTime, Utc};
use serde::Serialize;

use diffnet_core::{DiffusionConfig, ReplicationBatch, ReplicationRunner, SimulationResult};
use diffnet_types::NodeId;

/// Report of a single simulation.
#[derive(Debug, Serialize)]
pub struct RunReport {
    /// Experiment identifier from the config.
    pub experiment_id: String,
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
    /// Vertex count.
    pub node_count: usize,
    /// Horizon.
    pub horizon: u32,
    /// Density of the first slice.
    pub density: f64,
    /// Initial adopters.
    pub seeds: Vec<NodeId>,
    /// Cumulative adoption share per step.
    pub cumulative_proportions: Vec<f64>,
    /// Hazard rate per step.
    pub hazard_rates: Vec<f64>,
    /// Share adopted by the last step.
    pub final_proportion: f64,
}

impl RunReport {
    /// Summarize a finished run.
    pub fn new(config: &DiffusionConfig, result: &SimulationResult) -> Self {
        Self {
            experiment_id: config.experiment_id.clone(),
            generated_at: Utc::now(),
            node_count: result.node_count(),
            horizon: result.horizon(),
            density: result.graph.get_slice(1).map_or(0.0, |slice| slice.density()),
            seeds: result.seeds().iter().copied().collect(),
            cumulative_proportions: result.cumulative_adoption().proportions,
            hazard_rates: result.hazard_rate(),
            final_proportion: result.final_proportion(),
        }
    }
}

/// One failed run in a batch.
#[derive(Debug, Serialize)]
pub struct FailedRun {
    /// Run index.
    pub run: usize,
    /// Error message.
    pub error: String,
}

/// Report of a replication batch whose statistic is the cumulative curve.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    /// Experiment identifier from the config.
    pub experiment_id: String,
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
    /// Vertex count.
    pub node_count: usize,
    /// Horizon.
    pub horizon: u32,
    /// Runs requested.
    pub runs: usize,
    /// Worker threads used, after resolving `0` to the core count.
    pub workers: usize,
    /// Final adoption share of each successful run, in run order.
    pub final_proportions: Vec<f64>,
    /// Mean cumulative adoption share per step over successful runs.
    pub mean_cumulative_proportions: Vec<f64>,
    /// Runs that failed.
    pub failures: Vec<FailedRun>,
}

impl BatchReport {
    /// Summarize a batch of cumulative-proportion curves.
    pub fn new(config: &DiffusionConfig, batch: &ReplicationBatch) -> Self {
        Self {
            experiment_id: config.experiment_id.clone(),
            generated_at: Utc::now(),
            node_count: config.n,
            horizon: config.t,
            runs: config.replication.runs,
            workers: ReplicationRunner::new(config.random_seed)
                .with_workers(config.replication.workers)
                .workers(),
            final_proportions: batch
                .successes()
                .map(|(_, curve)| curve.last().copied().unwrap_or(0.0))
                .collect(),
            mean_cumulative_proportions: batch.column_means(),
            failures: batch
                .failures()
                .map(|(run, err)| FailedRun {
                    run,
                    error: err.to_string(),
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use diffnet_core::simulate;

    use super::*;

    fn config() -> DiffusionConfig {
        DiffusionConfig::parse("n: 50\nt: 4\ngraph:\n  kind: ring\n  k: 4\n").unwrap()
    }

    #[test]
    fn run_report_has_one_entry_per_step() {
        let config = config();
        let result = simulate(&config, &mut ReplicationRunner::stream(config.random_seed, 0)).unwrap();
        let report = RunReport::new(&config, &result);
        assert_eq!(report.cumulative_proportions.len(), 4);
        assert_eq!(report.hazard_rates.len(), 4);
        assert_eq!(report.seeds.len(), 3);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["node_count"], 50);
        assert!(json["generated_at"].is_string());
    }

    #[test]
    fn batch_report_lists_final_proportions_per_run() {
        let mut config = config();
        config.replication.runs = 3;
        let batch = diffnet_core::replicate(&config, |result| {
            Ok(result.cumulative_adoption().proportions)
        })
        .unwrap();
        let report = BatchReport::new(&config, &batch);
        assert_eq!(report.final_proportions.len(), 3);
        assert_eq!(report.mean_cumulative_proportions.len(), 4);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn batch_report_resolves_automatic_worker_count() {
        let mut config = config();
        config.replication.runs = 2;
        config.replication.workers = 0;
        let batch = diffnet_core::replicate(&config, |result| Ok(vec![result.final_proportion()])).unwrap();
        let report = BatchReport::new(&config, &batch);
        assert!(report.workers >= 1);
    }
}
