//! Testing utilities for code that consumes orchestration plans.
//!
//! This module provides:
//!
//! - **Harness**: drain a plan with several workers, either round-robin on
//!   one thread or concurrently with all workers released at the same time
//! - **Assertions**: check the scheduling guarantees on the collected batches
//! - **Fixtures**: small datasets with known group structure
//!
//! # Quick Start
//!
//! ```
//! use grouplane::*;
//! use grouplane::testing::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let data = three_group_dataset();
//! let plan = Orchestrator::new(three_group_key).create_plan(data.clone());
//!
//! let workers = [WorkerId::new(1), WorkerId::new(2), WorkerId::new(3)];
//! let batches = drain_round_robin(&plan, &workers, 9)?;
//!
//! assert_each_element_once(&batches, &data);
//! assert_group_affinity(&batches, three_group_key);
//! assert_group_order(&batches, &data, three_group_key);
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod harness;

pub use assertions::*;
pub use fixtures::*;
pub use harness::*;
