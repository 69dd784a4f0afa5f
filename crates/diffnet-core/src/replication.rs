//! Replicated runs on a fixed worker pool.
//!
//! Run `r` draws from `ChaCha8Rng::seed_from_u64(base_seed)` on stream `r`,
//! so its randomness depends only on the base seed and its index, never on
//! which worker picked it up or when. Workers claim run indices from a shared
//! counter and send `(run, outcome)` back over a channel; outcomes are slotted
//! by index, so the batch is in run order regardless of completion order.
//!
//! Under [`FailurePolicy::Abort`] workers stop claiming runs once any run
//! fails. Every run with a lower index than the first observed failure has
//! already been claimed and is allowed to finish, so the failure reported
//! (the lowest failing index) is the same one a sequential pass would hit.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use diffnet_types::FailurePolicy;

use crate::error::SimError;
use crate::result::SimulationResult;

/// A statistic that could not be computed for one run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct StatisticFailure(pub String);

impl From<&str> for StatisticFailure {
    fn from(reason: &str) -> Self {
        Self(reason.to_owned())
    }
}

impl From<String> for StatisticFailure {
    fn from(reason: String) -> Self {
        Self(reason)
    }
}

/// Outcome of one replicated run.
#[derive(Debug)]
pub struct RunRecord {
    /// Run index.
    pub run: usize,
    /// Statistic output, or why the run has none.
    pub outcome: Result<Vec<f64>, SimError>,
}

/// Per-run outcomes in run order.
#[derive(Debug, Default)]
pub struct ReplicationBatch {
    records: Vec<RunRecord>,
}

impl ReplicationBatch {
    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the batch holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record of run `run`.
    pub fn get(&self, run: usize) -> Option<&RunRecord> {
        self.records.get(run)
    }

    /// All records in run order.
    pub fn records(&self) -> &[RunRecord] {
        &self.records
    }

    /// Successful outputs with their run index.
    pub fn successes(&self) -> impl Iterator<Item = (usize, &[f64])> {
        self.records
            .iter()
            .filter_map(|r| r.outcome.as_ref().ok().map(|v| (r.run, v.as_slice())))
    }

    /// Failures with their run index.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &SimError)> {
        self.records
            .iter()
            .filter_map(|r| r.outcome.as_ref().err().map(|e| (r.run, e)))
    }

    /// Whether every run succeeded.
    pub fn is_complete(&self) -> bool {
        self.records.iter().all(|r| r.outcome.is_ok())
    }

    /// Successful outputs as rows, in run order.
    pub fn to_matrix(&self) -> Vec<Vec<f64>> {
        self.successes().map(|(_, row)| row.to_vec()).collect()
    }

    /// Column-wise mean over successful runs. Empty if none succeeded.
    pub fn column_means(&self) -> Vec<f64> {
        let rows = self.to_matrix();
        let Some(width) = rows.first().map(Vec::len) else {
            return Vec::new();
        };
        let mut sums = vec![0.0; width];
        for row in &rows {
            for (sum, value) in sums.iter_mut().zip(row) {
                *sum += value;
            }
        }
        // Run counts are far below 2^52; the conversion is exact.
        #[allow(clippy::cast_precision_loss)]
        let count = rows.len() as f64;
        sums.into_iter().map(|s| s / count).collect()
    }
}

/// Runs many independent simulations on a fixed number of workers.
#[derive(Debug, Clone, Copy)]
pub struct ReplicationRunner {
    base_seed: u64,
    workers: usize,
    policy: FailurePolicy,
}

impl ReplicationRunner {
    /// Single-worker runner with the default failure policy.
    pub fn new(base_seed: u64) -> Self {
        Self {
            base_seed,
            workers: 1,
            policy: FailurePolicy::default(),
        }
    }

    /// Use `workers` threads. Zero means one per available core.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = if workers == 0 {
            thread::available_parallelism().map_or(1, std::num::NonZero::get)
        } else {
            workers
        };
        self
    }

    /// Choose what happens when a run fails.
    #[must_use]
    pub const fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Worker count.
    pub const fn workers(&self) -> usize {
        self.workers
    }

    /// The random stream of run `run`.
    pub fn stream(base_seed: u64, run: usize) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(base_seed);
        rng.set_stream(u64::try_from(run).unwrap_or(u64::MAX));
        rng
    }

    /// Execute `runs` replications.
    ///
    /// `build` produces the finished simulation of run `r` from its stream;
    /// `statistic` reduces it to a vector whose length must be the same for
    /// every successful run.
    ///
    /// # Errors
    ///
    /// Under [`FailurePolicy::Abort`], returns the failure with the lowest
    /// run index. Under [`FailurePolicy::Continue`] failures are recorded in
    /// the batch and this never fails.
    pub fn run<S, B>(&self, runs: usize, statistic: S, build: B) -> Result<ReplicationBatch, SimError>
    where
        S: Fn(&SimulationResult) -> Result<Vec<f64>, StatisticFailure> + Sync,
        B: Fn(usize, &mut ChaCha8Rng) -> Result<SimulationResult, SimError> + Sync,
    {
        info!(
            runs,
            workers = self.workers,
            policy = ?self.policy,
            base_seed = self.base_seed,
            "Replication started"
        );
        let execute = |run: usize| self.execute(run, &statistic, &build);
        let mut slots = if self.workers <= 1 || runs <= 1 {
            self.run_inline(runs, execute)
        } else {
            self.run_pool(runs, execute)?
        };

        check_shapes(&mut slots);
        let mut records: Vec<RunRecord> = slots
            .into_iter()
            .enumerate()
            .filter_map(|(run, outcome)| outcome.map(|outcome| RunRecord { run, outcome }))
            .collect();

        for record in &records {
            if let Err(err) = &record.outcome {
                warn!(run = record.run, error = %err, "Replicated run failed");
            }
        }

        if self.policy == FailurePolicy::Abort
            && let Some(pos) = records.iter().position(|r| r.outcome.is_err())
            && let Err(err) = records.swap_remove(pos).outcome
        {
            return Err(err);
        }

        let batch = ReplicationBatch { records };
        info!(
            runs = batch.len(),
            failures = batch.failures().count(),
            "Replication finished"
        );
        Ok(batch)
    }

    fn execute<S, B>(&self, run: usize, statistic: &S, build: &B) -> Result<Vec<f64>, SimError>
    where
        S: Fn(&SimulationResult) -> Result<Vec<f64>, StatisticFailure>,
        B: Fn(usize, &mut ChaCha8Rng) -> Result<SimulationResult, SimError>,
    {
        let attempt = catch_unwind(AssertUnwindSafe(|| {
            let mut rng = Self::stream(self.base_seed, run);
            let result = build(run, &mut rng).map_err(|source| SimError::Worker {
                run,
                source: Box::new(source),
            })?;
            statistic(&result).map_err(|failure| SimError::Statistic {
                run,
                reason: failure.0,
            })
        }));
        attempt.unwrap_or_else(|payload| {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic payload".to_owned());
            Err(SimError::Worker {
                run,
                source: Box::new(SimError::Panicked { reason }),
            })
        })
    }

    fn run_inline<E>(&self, runs: usize, execute: E) -> Vec<Option<Result<Vec<f64>, SimError>>>
    where
        E: Fn(usize) -> Result<Vec<f64>, SimError>,
    {
        let mut slots: Vec<Option<Result<Vec<f64>, SimError>>> = Vec::with_capacity(runs);
        for run in 0..runs {
            let outcome = execute(run);
            let failed = outcome.is_err();
            slots.push(Some(outcome));
            if failed && self.policy == FailurePolicy::Abort {
                break;
            }
        }
        slots.resize_with(runs, || None);
        slots
    }

    fn run_pool<E>(
        &self,
        runs: usize,
        execute: E,
    ) -> Result<Vec<Option<Result<Vec<f64>, SimError>>>, SimError>
    where
        E: Fn(usize) -> Result<Vec<f64>, SimError> + Sync,
    {
        let next = AtomicUsize::new(0);
        let stop = AtomicBool::new(false);
        let abort = self.policy == FailurePolicy::Abort;
        let (tx, rx) = mpsc::channel::<(usize, Result<Vec<f64>, SimError>)>();
        let pool = self.workers.min(runs);

        thread::scope(|scope| -> Result<(), SimError> {
            for worker in 0..pool {
                let tx = tx.clone();
                let (next, stop, execute) = (&next, &stop, &execute);
                let spawned = thread::Builder::new()
                    .name(format!("diffnet-worker-{worker}"))
                    .spawn_scoped(scope, move || {
                        while !stop.load(Ordering::Acquire) {
                            let run = next.fetch_add(1, Ordering::AcqRel);
                            if run >= runs {
                                break;
                            }
                            let outcome = execute(run);
                            if abort && outcome.is_err() {
                                stop.store(true, Ordering::Release);
                            }
                            if tx.send((run, outcome)).is_err() {
                                break;
                            }
                        }
                    });
                if let Err(err) = spawned {
                    stop.store(true, Ordering::Release);
                    return Err(SimError::Panicked {
                        reason: format!("failed to spawn worker {worker}: {err}"),
                    });
                }
            }
            Ok(())
        })?;
        drop(tx);

        let mut slots: Vec<Option<Result<Vec<f64>, SimError>>> = Vec::with_capacity(runs);
        slots.resize_with(runs, || None);
        for (run, outcome) in rx {
            if let Some(slot) = slots.get_mut(run) {
                *slot = Some(outcome);
            }
        }
        Ok(slots)
    }
}

/// Turn successes whose length differs from the first success into
/// statistic failures.
fn check_shapes(slots: &mut [Option<Result<Vec<f64>, SimError>>]) {
    let mut width: Option<usize> = None;
    for (run, slot) in slots.iter_mut().enumerate() {
        let Some(Ok(values)) = slot else {
            continue;
        };
        match width {
            None => width = Some(values.len()),
            Some(expected) if expected != values.len() => {
                let actual = values.len();
                *slot = Some(Err(SimError::Statistic {
                    run,
                    reason: format!("output has {actual} values, earlier runs have {expected}"),
                }));
            }
            Some(_) => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
