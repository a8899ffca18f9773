//! Drive a plan to exhaustion with a fixed set of workers.
//!
//! Both helpers return every non-empty batch as `(worker, batch)`. The batches
//! of one worker appear in the order that worker received them.

use crate::error::Result;
use crate::plan::OrchestrationPlan;
use crate::source::SequentialSource;
use crate::worker::WorkerId;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Barrier;
use std::thread;

/// Batches received by one worker.
pub type WorkerBatch<T> = (WorkerId, Vec<T>);

/// Poll `workers` in turn on the current thread until all of them get an
/// empty batch.
///
/// # Errors
///
/// The first error returned by a poll.
pub fn drain_round_robin<S, K>(
    plan: &OrchestrationPlan<S, K>,
    workers: &[WorkerId],
    batch_size: usize,
) -> Result<Vec<WorkerBatch<S::Item>>>
where
    S: SequentialSource,
    S::Item: Clone,
    K: Eq + Hash + Clone,
{
    let mut batches = Vec::new();
    let mut active: Vec<WorkerId> = workers.to_vec();
    while !active.is_empty() {
        let mut still_active = Vec::with_capacity(active.len());
        for worker in active {
            let batch = plan.poll_next_batch(worker, batch_size)?;
            if !batch.is_empty() {
                batches.push((worker, batch));
                still_active.push(worker);
            }
        }
        active = still_active;
    }
    Ok(batches)
}

/// Run every worker on its own thread, released together by a barrier, each
/// polling until it gets an empty batch.
///
/// # Errors
///
/// The first error returned by a poll, in worker order.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn drain_concurrently<S, K>(
    plan: &OrchestrationPlan<S, K>,
    workers: &[WorkerId],
    batch_size: usize,
) -> Result<Vec<WorkerBatch<S::Item>>>
where
    S: SequentialSource + Sync,
    S::Item: Clone + Send,
    K: Eq + Hash + Clone + Send + Sync,
{
    let start = Barrier::new(workers.len());
    let per_worker: Vec<Result<Vec<WorkerBatch<S::Item>>>> = thread::scope(|scope| {
        let handles: Vec<_> = workers
            .iter()
            .map(|&worker| {
                let start = &start;
                scope.spawn(move || -> Result<Vec<WorkerBatch<S::Item>>> {
                    start.wait();
                    let mut received = Vec::new();
                    loop {
                        let batch = plan.poll_next_batch(worker, batch_size)?;
                        if batch.is_empty() {
                            return Ok(received);
                        }
                        received.push((worker, batch));
                    }
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("worker thread panicked"))
            .collect()
    });

    let mut batches = Vec::new();
    for received in per_worker {
        batches.extend(received?);
    }
    Ok(batches)
}

/// Concatenate each worker's batches into one sequence per worker.
#[must_use]
pub fn collect_by_worker<T: Clone>(batches: &[WorkerBatch<T>]) -> HashMap<WorkerId, Vec<T>> {
    let mut by_worker: HashMap<WorkerId, Vec<T>> = HashMap::new();
    for (worker, batch) in batches {
        by_worker
            .entry(*worker)
            .or_default()
            .extend(batch.iter().cloned());
    }
    by_worker
}
