//! # Grouplane
//!
//! A **group-affinity batch scheduler**. Grouplane splits a dataset into
//! groups by a caller-supplied key and hands it out to concurrent workers in
//! bounded batches, with three guarantees:
//!
//! - **Exactly once**: every element reaches exactly one worker, once
//! - **Affinity**: all elements of a group go to the same worker
//! - **Order**: within a group, elements arrive in dataset order
//!
//! Larger groups are handed out first. A worker finishes the groups it
//! already owns before it claims new ones.
//!
//! ## Quick Start
//!
//! ```
//! use grouplane::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! // (customer, order number)
//! let orders = vec![(7, 1), (3, 2), (7, 3), (9, 4), (7, 5)];
//! let orchestrator = Orchestrator::new(|order: &(u32, u32)| order.0);
//! let plan = orchestrator.create_plan(orders);
//!
//! // Customer 7 is the largest group, so the first worker gets it whole.
//! let first = orchestrator.next_batch(&plan, WorkerId::new(1), 3)?;
//! assert_eq!(first, vec![(7, 1), (7, 3), (7, 5)]);
//!
//! // The second worker claims the next group.
//! let second = orchestrator.next_batch(&plan, WorkerId::new(2), 3)?;
//! assert_eq!(second.len(), 2);
//! assert!(plan.is_drained());
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Datasets
//!
//! Anything implementing [`SequentialSource`] can be scheduled: a length and
//! a forward traversal are all that is required, so linked lists and ordered
//! sets work as well as vectors. [`LockableVec`] is a shared vector that can
//! be frozen against modification for the lifetime of a plan.
//!
//! ### Plans
//!
//! An [`OrchestrationPlan`] is built once per dataset, either through
//! [`Orchestrator::create_plan`] with a [`GroupKeyExtractor`] or by hand with
//! a [`PlanBuilder`]. Workers identify themselves with a [`WorkerId`] on
//! every [`poll_next_batch`](OrchestrationPlan::poll_next_batch) call; an
//! empty batch means the worker is done.
//!
//! ### Running
//!
//! [`Runner`] drains a plan with a pool of workers and a batch handler,
//! either in parallel on a rayon pool or round-robin on the calling thread
//! (see [`ExecMode`]).
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events under the `grouplane::plan`,
//! `grouplane::runner` and `grouplane::lockable` targets. Install any
//! subscriber to see them.
//!
//! ## Feature Flags
//!
//! - `metrics` (default): [`metrics::MetricsCollector`] and
//!   [`OrchestrationPlan::with_metrics`]

pub mod error;
pub mod extractor;
pub mod group_index;
pub mod lockable;
pub mod orchestrator;
pub mod plan;
pub mod ranking;
pub mod retrieval;
pub mod runner;
pub mod scheduler;
pub mod source;
pub mod testing;
pub mod worker;

#[cfg(feature = "metrics")]
pub mod metrics;

// General re-exports
pub use error::{Error, Result};
pub use extractor::GroupKeyExtractor;
pub use group_index::GroupIndex;
pub use lockable::{Lockable, LockableVec};
pub use orchestrator::Orchestrator;
pub use plan::{OrchestrationPlan, PlanBuilder};
pub use ranking::rank_groups_by_size;
pub use retrieval::elements_at;
pub use runner::{ExecMode, RunReport, Runner, RunnerConfig, WorkerReport};
pub use scheduler::{GroupState, PlanStats};
pub use source::SequentialSource;
pub use worker::{WorkerId, WorkerIds};

// Gated re-exports
#[cfg(feature = "metrics")]
pub use metrics::MetricsCollector;
