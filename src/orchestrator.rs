//! Facade tying a group key extractor to plan creation and batch retrieval.
//!
//! ```
//! use grouplane::{Orchestrator, WorkerId};
//!
//! # fn main() -> grouplane::Result<()> {
//! #[derive(Clone, Debug, PartialEq)]
//! struct Event { customer: u32, seq: u32 }
//!
//! let events = vec![
//!     Event { customer: 1, seq: 0 },
//!     Event { customer: 2, seq: 0 },
//!     Event { customer: 1, seq: 1 },
//! ];
//! let orchestrator = Orchestrator::new(|e: &Event| e.customer);
//! let plan = orchestrator.create_plan(events);
//!
//! let batch = orchestrator.next_batch(&plan, WorkerId::new(1), 2)?;
//! assert_eq!(batch.iter().map(|e| (e.customer, e.seq)).collect::<Vec<_>>(), vec![(1, 0), (1, 1)]);
//! # Ok(())
//! # }
//! ```

use crate::error::Result;
use crate::extractor::GroupKeyExtractor;
use crate::lockable::Lockable;
use crate::plan::{OrchestrationPlan, PlanBuilder};
use crate::source::SequentialSource;
use crate::worker::WorkerId;
use std::fmt::{Debug, Formatter, Result as FormatResult};
use std::hash::Hash;
use std::marker::PhantomData;

/// Builds plans over datasets of `T` grouped by key `K`, and serves batches from them.
pub struct Orchestrator<T, K, E> {
    extractor: E,
    _marker: PhantomData<fn(&T) -> K>,
}

impl<T, K, E> Orchestrator<T, K, E>
where
    K: Eq + Hash + Clone,
    E: GroupKeyExtractor<T, K>,
{
    /// Create an orchestrator around `extractor`.
    pub fn new(extractor: E) -> Self {
        Self {
            extractor,
            _marker: PhantomData,
        }
    }

    /// The extractor used to group elements.
    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// Index `data` in one forward pass and return its plan.
    ///
    /// `data` must not change while the plan is alive. Use
    /// [`create_plan_frozen`](Self::create_plan_frozen) when other code
    /// could still modify it.
    pub fn create_plan<S>(&self, data: S) -> OrchestrationPlan<S, K>
    where
        S: SequentialSource<Item = T>,
    {
        PlanBuilder::with_extractor(data, &self.extractor).build()
    }

    /// Freeze `data` against modification, then create its plan.
    pub fn create_plan_frozen<S>(&self, data: S) -> OrchestrationPlan<S, K>
    where
        S: SequentialSource<Item = T> + Lockable,
    {
        data.freeze();
        self.create_plan(data)
    }

    /// Pull the next batch of up to `batch_size` elements for `worker`.
    ///
    /// See [`OrchestrationPlan::poll_next_batch`].
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`](crate::Error::InvalidArgument) if
    /// `batch_size` is 0.
    pub fn next_batch<S>(
        &self,
        plan: &OrchestrationPlan<S, K>,
        worker: WorkerId,
        batch_size: usize,
    ) -> Result<Vec<T>>
    where
        S: SequentialSource<Item = T>,
        T: Clone,
    {
        plan.poll_next_batch(worker, batch_size)
    }
}

impl<T, K, E: Debug> Debug for Orchestrator<T, K, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        f.debug_struct("Orchestrator")
            .field("extractor", &self.extractor)
            .finish()
    }
}
