//! Explicit identities for the workers pulling batches from a plan.
//!
//! Group ownership is keyed by [`WorkerId`], never by the OS thread that
//! happens to make the call. A pooled thread may run many unrelated tasks;
//! each logical worker should carry its own id for the whole lifetime of
//! the plan it consumes.
//!
//! Ids are small, `Copy`, and hashable, so they double as map keys in the
//! scheduler's ownership bookkeeping.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FormatResult};
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque identity of one logical worker.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct WorkerId(u64);

impl WorkerId {
    /// Wrap a caller-chosen token.
    ///
    /// Two logical workers must never share a token while consuming the same plan.
    #[must_use]
    pub const fn new(v: u64) -> Self {
        Self(v)
    }

    /// Return the underlying numeric value.
    #[must_use]
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Display for WorkerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        write!(f, "worker-{}", self.0)
    }
}

impl From<u64> for WorkerId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Thread-safe source of fresh [`WorkerId`]s.
///
/// Every call to [`next_id`](Self::next_id) returns an id this allocator has
/// never returned before.
///
/// ```
/// use grouplane::WorkerIds;
///
/// let ids = WorkerIds::default();
/// let a = ids.next_id();
/// let b = ids.next_id();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Default)]
pub struct WorkerIds {
    next: AtomicU64,
}

impl WorkerIds {
    /// Start allocating at `first`.
    #[must_use]
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Allocate the next unused id.
    pub fn next_id(&self) -> WorkerId {
        WorkerId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}
