//! Orchestration plans: the built, queryable schedule over one dataset.
//!
//! A [`PlanBuilder`] records the group key of every position in a single
//! forward pass and ranks the groups largest-first. The resulting
//! [`OrchestrationPlan`] is then consumed by any number of workers through
//! [`OrchestrationPlan::poll_next_batch`], each call guarded by the plan's
//! own mutex.
//!
//! ```
//! use grouplane::{OrchestrationPlan, WorkerId};
//!
//! # fn main() -> grouplane::Result<()> {
//! let mut builder = OrchestrationPlan::builder(vec!["1", "2", "3"]);
//! builder.assign(0, "G1")?.assign(1, "G2")?.assign(2, "G1")?;
//! let plan = builder.build();
//!
//! // G1 ranks first with two members, then G2 is claimed to fill the batch.
//! assert_eq!(plan.poll_next_batch(WorkerId::new(0), 3)?, vec!["1", "3", "2"]);
//! assert!(plan.is_drained());
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use crate::extractor::GroupKeyExtractor;
use crate::group_index::GroupIndex;
use crate::ranking::rank_groups_by_size;
use crate::retrieval::elements_in_order;
use crate::scheduler::{GroupState, PlanStats, ScheduleState};
use crate::source::SequentialSource;
use crate::worker::WorkerId;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, trace};

#[cfg(feature = "metrics")]
use crate::metrics::MetricsCollector;

/// Accumulates `(position, group key)` pairs for one dataset.
#[derive(Debug)]
pub struct PlanBuilder<S, K> {
    source: S,
    index: GroupIndex<K>,
}

impl<S, K> PlanBuilder<S, K>
where
    S: SequentialSource,
    K: Eq + Hash + Clone,
{
    /// Start an empty builder over `source`.
    #[must_use]
    pub fn new(source: S) -> Self {
        Self {
            source,
            index: GroupIndex::new(),
        }
    }

    /// Index every element of `source` with `extractor` in one forward pass.
    pub fn with_extractor<E>(source: S, extractor: &E) -> Self
    where
        E: GroupKeyExtractor<S::Item, K> + ?Sized,
    {
        let mut index = GroupIndex::new();
        source.scan(|items| {
            for (position, item) in items.enumerate() {
                index.push(position, extractor.extract_group_key(item));
            }
        });
        Self { source, index }
    }

    /// The position the next [`assign`](Self::assign) call must use.
    #[must_use]
    pub fn next_position(&self) -> usize {
        self.index.element_count()
    }

    /// Record that the element at `position` belongs to group `key`.
    ///
    /// Positions must be assigned in traversal order, starting at 0.
    ///
    /// # Errors
    ///
    /// [`Error::IndexOutOfRange`] if `position` is past the end of the
    /// dataset, [`Error::InvalidArgument`] if it is not the next position in
    /// sequence (a duplicate or a gap).
    pub fn assign(&mut self, position: usize, key: K) -> Result<&mut Self> {
        let len = self.source.len();
        if position >= len {
            return Err(Error::IndexOutOfRange {
                index: position,
                len,
            });
        }
        let expected = self.next_position();
        if position != expected {
            return Err(Error::invalid_argument(
                "position",
                format!("expected position {expected}, got {position}"),
            ));
        }
        self.index.push(position, key);
        Ok(self)
    }

    /// Rank the groups and produce the plan.
    ///
    /// Positions that were never assigned are not scheduled.
    pub fn build(self) -> OrchestrationPlan<S, K> {
        let free = rank_groups_by_size(self.index.as_map());
        debug!(
            target: "grouplane::plan",
            elements = self.index.element_count(),
            groups = self.index.group_count(),
            largest_group = self.index.largest_group(),
            "orchestration plan built"
        );
        OrchestrationPlan {
            source: self.source,
            index: self.index,
            state: Mutex::new(ScheduleState::new(free)),
            drain_reported: AtomicBool::new(false),
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }
}

/// A dataset partitioned into groups, handed out to workers in batches.
///
/// Every group is consumed by exactly one worker, in ascending position
/// order. Ownership is permanent: once claimed, a group is never offered to
/// anyone else.
///
/// The plan is `Sync` whenever its dataset and keys are, so it can be shared
/// by reference (or through an `Arc`) across worker threads.
#[derive(Debug)]
pub struct OrchestrationPlan<S, K> {
    source: S,
    index: GroupIndex<K>,
    state: Mutex<ScheduleState<K>>,
    drain_reported: AtomicBool,
    #[cfg(feature = "metrics")]
    metrics: Option<MetricsCollector>,
}

impl<S, K> OrchestrationPlan<S, K>
where
    S: SequentialSource,
    K: Eq + Hash + Clone,
{
    /// Start building a plan over `source`.
    #[must_use]
    pub fn builder(source: S) -> PlanBuilder<S, K> {
        PlanBuilder::new(source)
    }

    /// Attach a metrics collector updated on every poll.
    #[cfg(feature = "metrics")]
    #[must_use]
    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// The attached metrics collector, if any.
    #[cfg(feature = "metrics")]
    #[must_use]
    pub fn metrics(&self) -> Option<&MetricsCollector> {
        self.metrics.as_ref()
    }

    fn lock_state(&self) -> MutexGuard<'_, ScheduleState<K>> {
        self.state.lock().expect("orchestration plan lock poisoned")
    }

    /// Hand `worker` up to `batch_size` elements.
    ///
    /// Groups the worker already owns are drained first, in the order they
    /// were claimed; remaining room is filled by claiming groups from the
    /// free queue, largest first. Each group's elements come out contiguous
    /// and in ascending position order.
    ///
    /// An empty batch means there is nothing left for this worker: its own
    /// groups are exhausted and no unclaimed group remains.
    ///
    /// The whole call is atomic with respect to other polls on this plan.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `batch_size` is 0.
    /// [`Error::IndexOutOfRange`] if the dataset shrank after the plan was
    /// built. Neither error changes the plan's state.
    ///
    /// # Panics
    ///
    /// Panics if a previous poll panicked while holding the plan's lock.
    pub fn poll_next_batch(&self, worker: WorkerId, batch_size: usize) -> Result<Vec<S::Item>>
    where
        S::Item: Clone,
    {
        if batch_size == 0 {
            return Err(Error::invalid_argument(
                "batch_size",
                "must be greater than 0, got 0",
            ));
        }

        let mut state = self.lock_state();
        let pull = state.prepare(&self.index, worker, batch_size);
        let batch = elements_in_order(&self.source, &pull.positions)?;
        let claimed = state.commit(&self.index, worker, pull).len();
        let drained = state.is_drained(&self.index);
        drop(state);

        if claimed > 0 {
            debug!(target: "grouplane::plan", %worker, claimed, "groups claimed");
        }
        trace!(
            target: "grouplane::plan",
            %worker,
            requested = batch_size,
            delivered = batch.len(),
            "batch polled"
        );
        let first_drain = drained && !self.drain_reported.swap(true, Ordering::AcqRel);
        #[cfg(feature = "metrics")]
        self.record_poll(batch.len(), claimed, first_drain);

        if first_drain {
            info!(
                target: "grouplane::plan",
                elements = self.index.element_count(),
                groups = self.index.group_count(),
                "orchestration plan drained"
            );
        }
        Ok(batch)
    }

    #[cfg(feature = "metrics")]
    #[allow(clippy::cast_precision_loss)]
    fn record_poll(&self, delivered: usize, claimed: usize, first_drain: bool) {
        let Some(metrics) = &self.metrics else {
            return;
        };
        metrics.record_start_once();
        metrics.increment_counter("polls", 1);
        if first_drain {
            metrics.record_end();
        }
        // Empty polls are counted, never sampled.
        if delivered == 0 {
            metrics.increment_counter("empty_polls", 1);
            return;
        }
        metrics.increment_counter("elements_delivered", delivered as u64);
        metrics.increment_counter("groups_claimed", claimed as u64);
        metrics.record_histogram("batch_len", delivered as f64);
    }

    /// Progress summary.
    ///
    /// # Panics
    ///
    /// Panics if the plan's lock is poisoned.
    #[must_use]
    pub fn stats(&self) -> PlanStats {
        self.lock_state().stats(&self.index)
    }

    /// Lifecycle state of `key`'s group, `None` for an unknown key.
    ///
    /// # Panics
    ///
    /// Panics if the plan's lock is poisoned.
    #[must_use]
    pub fn group_state(&self, key: &K) -> Option<GroupState> {
        self.lock_state().group_state(&self.index, key)
    }

    /// Last position already delivered from `key`'s group, `None` if nothing
    /// was delivered yet.
    ///
    /// # Panics
    ///
    /// Panics if the plan's lock is poisoned.
    #[must_use]
    pub fn cursor(&self, key: &K) -> Option<usize> {
        self.lock_state().cursor(&self.index, key)
    }

    /// Groups currently on `worker`'s ownership list, in claim order.
    ///
    /// Groups exhausted by the latest poll stay listed until the worker
    /// polls again.
    ///
    /// # Panics
    ///
    /// Panics if the plan's lock is poisoned.
    #[must_use]
    pub fn owned_groups(&self, worker: WorkerId) -> Vec<K> {
        self.lock_state().owned_groups(worker)
    }

    /// Whether every scheduled element has been delivered.
    ///
    /// # Panics
    ///
    /// Panics if the plan's lock is poisoned.
    #[must_use]
    pub fn is_drained(&self) -> bool {
        self.lock_state().is_drained(&self.index)
    }

    /// Number of scheduled elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.element_count()
    }

    /// Whether the plan schedules no elements at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The group index the plan was built from.
    #[must_use]
    pub fn groups(&self) -> &GroupIndex<K> {
        &self.index
    }

    /// The dataset the plan serves.
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }
}
