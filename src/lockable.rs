//! A vector that can be frozen against modification.
//!
//! Plans assume their dataset does not change while it is being indexed or
//! consumed. When the data lives in a shared collection that other code can
//! still reach, wrap it in a [`LockableVec`] and let
//! [`Orchestrator::create_plan_frozen`](crate::orchestrator::Orchestrator::create_plan_frozen)
//! freeze it before the plan is built.
//!
//! ```
//! use grouplane::{Error, Lockable, LockableVec};
//!
//! let data = LockableVec::from(vec![1, 2, 3]);
//! data.push(4)?;
//! data.freeze();
//! assert_eq!(data.push(5), Err(Error::CollectionLocked { operation: "push" }));
//! data.thaw();
//! data.push(5)?;
//! assert_eq!(data.to_vec(), vec![1, 2, 3, 4, 5]);
//! # Ok::<(), grouplane::Error>(())
//! ```

use crate::error::{Error, Result};
use crate::source::SequentialSource;
use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// A collection whose mutability can be toggled at runtime.
pub trait Lockable {
    /// Reject all further mutations until [`thaw`](Self::thaw) is called.
    ///
    /// Once this returns, no mutation is in progress.
    fn freeze(&self);

    /// Allow mutations again.
    fn thaw(&self);

    /// Whether mutations are currently rejected.
    fn is_frozen(&self) -> bool;
}

impl<L: Lockable + ?Sized> Lockable for Arc<L> {
    fn freeze(&self) {
        (**self).freeze();
    }

    fn thaw(&self) {
        (**self).thaw();
    }

    fn is_frozen(&self) -> bool {
        (**self).is_frozen()
    }
}

impl<L: Lockable + ?Sized> Lockable for &L {
    fn freeze(&self) {
        (**self).freeze();
    }

    fn thaw(&self) {
        (**self).thaw();
    }

    fn is_frozen(&self) -> bool {
        (**self).is_frozen()
    }
}

/// Thread-safe `Vec` with a freeze switch.
///
/// Every mutator takes `&self` and fails with [`Error::CollectionLocked`]
/// while frozen, leaving the contents untouched. Reads always succeed.
#[derive(Debug)]
pub struct LockableVec<T> {
    items: RwLock<Vec<T>>,
    frozen: AtomicBool,
}

impl<T> LockableVec<T> {
    /// Create an empty, mutable collection.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            frozen: AtomicBool::new(false),
        }
    }

    // Every mutator leaves the Vec valid, so a poisoned lock is still usable.
    fn read(&self) -> RwLockReadGuard<'_, Vec<T>> {
        self.items.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<T>> {
        self.items.write().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Run `op` under the write lock unless frozen.
    fn mutate<R>(&self, operation: &'static str, op: impl FnOnce(&mut Vec<T>) -> R) -> Result<R> {
        let mut items = self.write();
        if self.frozen.load(Ordering::Acquire) {
            return Err(Error::CollectionLocked { operation });
        }
        Ok(op(&mut *items))
    }

    /// Append an element.
    ///
    /// # Errors
    ///
    /// [`Error::CollectionLocked`] while frozen.
    pub fn push(&self, value: T) -> Result<()> {
        self.mutate("push", |items| items.push(value))
    }

    /// Insert an element at `index`.
    ///
    /// # Errors
    ///
    /// [`Error::CollectionLocked`] while frozen, [`Error::IndexOutOfRange`]
    /// if `index > len`.
    pub fn insert(&self, index: usize, value: T) -> Result<()> {
        self.mutate("insert", |items| {
            if index > items.len() {
                return Err(Error::IndexOutOfRange {
                    index,
                    len: items.len(),
                });
            }
            items.insert(index, value);
            Ok(())
        })?
    }

    /// Remove and return the element at `index`.
    ///
    /// # Errors
    ///
    /// [`Error::CollectionLocked`] while frozen, [`Error::IndexOutOfRange`]
    /// if `index >= len`.
    pub fn remove(&self, index: usize) -> Result<T> {
        self.mutate("remove", |items| {
            if index >= items.len() {
                return Err(Error::IndexOutOfRange {
                    index,
                    len: items.len(),
                });
            }
            Ok(items.remove(index))
        })?
    }

    /// Replace the element at `index`, returning the previous one.
    ///
    /// # Errors
    ///
    /// [`Error::CollectionLocked`] while frozen, [`Error::IndexOutOfRange`]
    /// if `index >= len`.
    pub fn set(&self, index: usize, value: T) -> Result<T> {
        self.mutate("set", |items| {
            let len = items.len();
            items
                .get_mut(index)
                .map(|slot| std::mem::replace(slot, value))
                .ok_or(Error::IndexOutOfRange { index, len })
        })?
    }

    /// Remove every element.
    ///
    /// # Errors
    ///
    /// [`Error::CollectionLocked`] while frozen.
    pub fn clear(&self) -> Result<()> {
        self.mutate("clear", Vec::clear)
    }

    /// Append every element of `values`.
    ///
    /// # Errors
    ///
    /// [`Error::CollectionLocked`] while frozen.
    pub fn extend_from(&self, values: impl IntoIterator<Item = T>) -> Result<()> {
        self.mutate("extend", |items| items.extend(values))
    }

    /// Keep only the elements matching `keep`.
    ///
    /// # Errors
    ///
    /// [`Error::CollectionLocked`] while frozen.
    pub fn retain(&self, keep: impl FnMut(&T) -> bool) -> Result<()> {
        self.mutate("retain", |items| items.retain(keep))
    }

    /// Sort in place with `compare` (stable).
    ///
    /// # Errors
    ///
    /// [`Error::CollectionLocked`] while frozen.
    pub fn sort_by(&self, compare: impl FnMut(&T, &T) -> CmpOrdering) -> Result<()> {
        self.mutate("sort", |items| items.sort_by(compare))
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Clone of the element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T>
    where
        T: Clone,
    {
        self.read().get(index).cloned()
    }

    /// Snapshot of the contents.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.read().clone()
    }
}

impl<T> Lockable for LockableVec<T> {
    fn freeze(&self) {
        // Taking the write lock waits out any mutation already running.
        let _items = self.write();
        self.frozen.store(true, Ordering::Release);
        debug!(target: "grouplane::lockable", "collection frozen");
    }

    fn thaw(&self) {
        let _items = self.write();
        self.frozen.store(false, Ordering::Release);
        debug!(target: "grouplane::lockable", "collection thawed");
    }

    fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }
}

impl<T> SequentialSource for LockableVec<T> {
    type Item = T;

    fn len(&self) -> usize {
        self.read().len()
    }

    fn scan<R>(&self, f: impl FnOnce(&mut dyn Iterator<Item = &Self::Item>) -> R) -> R {
        f(&mut self.read().iter())
    }
}

impl<T> Default for LockableVec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Vec<T>> for LockableVec<T> {
    fn from(items: Vec<T>) -> Self {
        Self {
            items: RwLock::new(items),
            frozen: AtomicBool::new(false),
        }
    }
}

impl<T> FromIterator<T> for LockableVec<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<_>>())
    }
}
