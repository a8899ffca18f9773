//! Error type shared by the scheduler, the retrieval helper and the lockable collection.

use thiserror::Error;

/// Errors raised by plan construction, batch pulls and lockable collections.
///
/// Running out of work is never an error: an exhausted plan answers with an
/// empty batch instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    /// A caller-supplied argument was rejected before any state changed.
    #[error("invalid argument `{argument}`: {problem}")]
    InvalidArgument {
        /// Name of the offending parameter.
        argument: &'static str,
        /// Human-readable description of the problem.
        problem: String,
    },

    /// A position outside `0..len` was requested from a dataset.
    ///
    /// Seeing this from a plan means the dataset changed underneath it.
    #[error("position {index} is out of range for a dataset of {len} elements")]
    IndexOutOfRange {
        /// The first offending position (in ascending order).
        index: usize,
        /// Size of the dataset at the time of the check.
        len: usize,
    },

    /// A frozen [`LockableVec`](crate::lockable::LockableVec) refused a mutation.
    #[error("`{operation}` is not allowed while the collection is frozen")]
    CollectionLocked {
        /// The rejected operation.
        operation: &'static str,
    },
}

impl Error {
    pub(crate) fn invalid_argument(argument: &'static str, problem: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument,
            problem: problem.into(),
        }
    }
}

/// Result alias for fallible library calls.
pub type Result<T> = std::result::Result<T, Error>;
