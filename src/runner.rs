//! Worker-pool driver that drains a plan with a batch handler.
//!
//! The [`Runner`] spawns a fixed number of logical workers, gives each one a
//! fresh [`WorkerId`], and lets every worker pull batches until the plan has
//! nothing left for it. Two execution modes are available:
//!
//! - [`ExecMode::Parallel`] runs one worker per thread of a dedicated rayon
//!   pool.
//! - [`ExecMode::Sequential`] polls all workers round-robin on the calling
//!   thread, which makes the schedule fully deterministic.
//!
//! ```
//! use grouplane::*;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! # fn main() -> anyhow::Result<()> {
//! let plan = Orchestrator::new(|n: &u64| n % 3).create_plan((0..90u64).collect::<Vec<_>>());
//! let seen = AtomicUsize::new(0);
//!
//! let runner = Runner::new(RunnerConfig { workers: 3, batch_size: 8, ..RunnerConfig::default() })?;
//! let report = runner.run(&plan, |_worker, batch| {
//!     seen.fetch_add(batch.len(), Ordering::Relaxed);
//!     Ok(())
//! })?;
//!
//! assert_eq!(report.elements(), 90);
//! assert_eq!(seen.load(Ordering::Relaxed), 90);
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use crate::plan::OrchestrationPlan;
use crate::source::SequentialSource;
use crate::worker::{WorkerId, WorkerIds};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// How the runner schedules its workers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecMode {
    /// Round-robin on the calling thread.
    Sequential,
    /// One worker per thread of a dedicated rayon pool.
    #[default]
    Parallel,
}

/// Runner settings, loadable from JSON.
///
/// Missing fields take their defaults:
///
/// ```
/// use grouplane::{ExecMode, RunnerConfig};
///
/// let config = RunnerConfig::from_json_str(r#"{ "mode": "sequential", "batch_size": 10 }"#)?;
/// assert_eq!(config.mode, ExecMode::Sequential);
/// assert_eq!(config.batch_size, 10);
/// assert!(config.workers >= 2);
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Execution mode.
    pub mode: ExecMode,
    /// Number of logical workers.
    pub workers: usize,
    /// Maximum elements per batch.
    pub batch_size: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            mode: ExecMode::Parallel,
            workers: num_cpus::get().max(2),
            batch_size: 64,
        }
    }
}

impl RunnerConfig {
    /// Check that the settings can drive a run.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `workers` or `batch_size` is 0.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::invalid_argument("workers", "must be greater than 0"));
        }
        if self.batch_size == 0 {
            return Err(Error::invalid_argument(
                "batch_size",
                "must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON config.
    ///
    /// # Errors
    ///
    /// Malformed JSON or settings rejected by [`validate`](Self::validate).
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(json).context("parsing runner config")?;
        config.validate()?;
        Ok(config)
    }
}

/// What one worker did during a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WorkerReport {
    /// The worker's identity for this run.
    pub worker: WorkerId,
    /// Non-empty batches handled.
    pub batches: usize,
    /// Elements handled.
    pub elements: usize,
}

impl WorkerReport {
    fn new(worker: WorkerId) -> Self {
        Self {
            worker,
            batches: 0,
            elements: 0,
        }
    }
}

/// Outcome of a completed run.
#[derive(Clone, Debug, Serialize)]
pub struct RunReport {
    /// One entry per worker, ordered by worker id.
    pub workers: Vec<WorkerReport>,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

impl RunReport {
    /// Total elements handled across all workers.
    #[must_use]
    pub fn elements(&self) -> usize {
        self.workers.iter().map(|w| w.elements).sum()
    }

    /// Workers that handled at least one batch.
    #[must_use]
    pub fn active_workers(&self) -> usize {
        self.workers.iter().filter(|w| w.batches > 0).count()
    }
}

/// Drives a plan to completion with a pool of workers.
#[derive(Debug)]
pub struct Runner {
    config: RunnerConfig,
    ids: WorkerIds,
}

impl Default for Runner {
    fn default() -> Self {
        Self {
            config: RunnerConfig::default(),
            ids: WorkerIds::default(),
        }
    }
}

impl Runner {
    /// Create a runner from validated settings.
    ///
    /// # Errors
    ///
    /// See [`RunnerConfig::validate`].
    pub fn new(config: RunnerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ids: WorkerIds::default(),
        })
    }

    /// The runner's settings.
    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Drain `plan`, passing every batch to `handler`.
    ///
    /// Workers get ids this runner has never used before, so a second run
    /// over the same plan never inherits groups from the first.
    ///
    /// # Errors
    ///
    /// The first handler or poll error. A failing worker stops; the others
    /// finish their loops before the error is returned. Groups owned by the
    /// failed worker are left partially consumed.
    pub fn run<S, K, F>(&self, plan: &OrchestrationPlan<S, K>, handler: F) -> anyhow::Result<RunReport>
    where
        S: SequentialSource + Sync,
        S::Item: Clone + Send,
        K: Eq + Hash + Clone + Send + Sync,
        F: Fn(WorkerId, Vec<S::Item>) -> anyhow::Result<()> + Sync,
    {
        let started = Instant::now();
        info!(
            target: "grouplane::runner",
            mode = ?self.config.mode,
            workers = self.config.workers,
            batch_size = self.config.batch_size,
            elements = plan.len(),
            "run started"
        );

        let outcomes = match self.config.mode {
            ExecMode::Sequential => self.run_sequential(plan, &handler),
            ExecMode::Parallel => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(self.config.workers)
                    .thread_name(|i| format!("grouplane-worker-{i}"))
                    .build()
                    .context("building worker pool")?;
                pool.broadcast(|_| self.drain_worker(plan, self.ids.next_id(), &handler))
            }
        };

        let mut workers = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            workers.push(outcome?);
        }
        workers.sort_by_key(|w| w.worker);

        let report = RunReport {
            workers,
            elapsed: started.elapsed(),
        };
        info!(
            target: "grouplane::runner",
            elements = report.elements(),
            active_workers = report.active_workers(),
            elapsed_ms = report.elapsed.as_millis(),
            "run finished"
        );
        Ok(report)
    }

    fn drain_worker<S, K, F>(
        &self,
        plan: &OrchestrationPlan<S, K>,
        worker: WorkerId,
        handler: &F,
    ) -> anyhow::Result<WorkerReport>
    where
        S: SequentialSource,
        S::Item: Clone,
        K: Eq + Hash + Clone,
        F: Fn(WorkerId, Vec<S::Item>) -> anyhow::Result<()>,
    {
        let mut report = WorkerReport::new(worker);
        while self.pull_once(plan, &mut report, handler)? {}
        debug!(
            target: "grouplane::runner",
            %worker,
            batches = report.batches,
            elements = report.elements,
            "worker finished"
        );
        Ok(report)
    }

    fn run_sequential<S, K, F>(
        &self,
        plan: &OrchestrationPlan<S, K>,
        handler: &F,
    ) -> Vec<anyhow::Result<WorkerReport>>
    where
        S: SequentialSource,
        S::Item: Clone,
        K: Eq + Hash + Clone,
        F: Fn(WorkerId, Vec<S::Item>) -> anyhow::Result<()>,
    {
        let mut reports: Vec<WorkerReport> = (0..self.config.workers)
            .map(|_| WorkerReport::new(self.ids.next_id()))
            .collect();
        let mut failures: Vec<Option<anyhow::Error>> = reports.iter().map(|_| None).collect();
        let mut finished = vec![false; reports.len()];

        while finished.contains(&false) {
            for (i, report) in reports.iter_mut().enumerate() {
                if finished[i] {
                    continue;
                }
                match self.pull_once(plan, report, handler) {
                    Ok(true) => {}
                    Ok(false) => finished[i] = true,
                    Err(err) => {
                        failures[i] = Some(err);
                        finished[i] = true;
                    }
                }
            }
        }

        reports
            .into_iter()
            .zip(failures)
            .map(|(report, failure)| match failure {
                Some(err) => Err(err),
                None => Ok(report),
            })
            .collect()
    }

    /// Pull and handle one batch; `false` once the worker got an empty batch.
    fn pull_once<S, K, F>(
        &self,
        plan: &OrchestrationPlan<S, K>,
        report: &mut WorkerReport,
        handler: &F,
    ) -> anyhow::Result<bool>
    where
        S: SequentialSource,
        S::Item: Clone,
        K: Eq + Hash + Clone,
        F: Fn(WorkerId, Vec<S::Item>) -> anyhow::Result<()>,
    {
        let worker = report.worker;
        let batch = plan.poll_next_batch(worker, self.config.batch_size)?;
        if batch.is_empty() {
            return Ok(false);
        }
        report.batches += 1;
        report.elements += batch.len();
        handler(worker, batch).with_context(|| format!("batch handler failed on {worker}"))?;
        Ok(true)
    }
}
