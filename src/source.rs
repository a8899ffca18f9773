//! Read-only, order-stable datasets that a plan can be built over.
//!
//! A plan never assumes random access into its dataset. All it needs is the
//! element count and the ability to walk the elements front to back, which
//! is what [`SequentialSource`] captures. Linked lists, ordered sets and
//! lock-guarded collections qualify just as well as vectors.

use std::collections::{BTreeSet, LinkedList, VecDeque};
use std::sync::Arc;

/// Capability interface of a dataset: a size query plus one forward scan.
///
/// The scan hands the closure an iterator over borrowed elements and
/// returns whatever the closure returns. Implementations that guard their
/// storage (e.g. behind a lock) hold the guard for exactly the duration of
/// the closure.
///
/// Iteration order must be identical on every scan; positions are assigned
/// from it.
pub trait SequentialSource {
    /// Element type.
    type Item;

    /// Number of elements a scan will yield.
    fn len(&self) -> usize;

    /// Whether the dataset holds no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Walk all elements in order, handing the iterator to `f`.
    fn scan<R>(&self, f: impl FnOnce(&mut dyn Iterator<Item = &Self::Item>) -> R) -> R;
}

impl<T> SequentialSource for [T] {
    type Item = T;

    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn scan<R>(&self, f: impl FnOnce(&mut dyn Iterator<Item = &Self::Item>) -> R) -> R {
        f(&mut self.iter())
    }
}

impl<T> SequentialSource for Vec<T> {
    type Item = T;

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn scan<R>(&self, f: impl FnOnce(&mut dyn Iterator<Item = &Self::Item>) -> R) -> R {
        f(&mut self.iter())
    }
}

impl<T> SequentialSource for VecDeque<T> {
    type Item = T;

    fn len(&self) -> usize {
        VecDeque::len(self)
    }

    fn scan<R>(&self, f: impl FnOnce(&mut dyn Iterator<Item = &Self::Item>) -> R) -> R {
        f(&mut self.iter())
    }
}

impl<T> SequentialSource for LinkedList<T> {
    type Item = T;

    fn len(&self) -> usize {
        LinkedList::len(self)
    }

    fn scan<R>(&self, f: impl FnOnce(&mut dyn Iterator<Item = &Self::Item>) -> R) -> R {
        f(&mut self.iter())
    }
}

impl<T: Ord> SequentialSource for BTreeSet<T> {
    type Item = T;

    fn len(&self) -> usize {
        BTreeSet::len(self)
    }

    fn scan<R>(&self, f: impl FnOnce(&mut dyn Iterator<Item = &Self::Item>) -> R) -> R {
        f(&mut self.iter())
    }
}

impl<S: SequentialSource + ?Sized> SequentialSource for &S {
    type Item = S::Item;

    fn len(&self) -> usize {
        (**self).len()
    }

    fn scan<R>(&self, f: impl FnOnce(&mut dyn Iterator<Item = &Self::Item>) -> R) -> R {
        (**self).scan(f)
    }
}

impl<S: SequentialSource + ?Sized> SequentialSource for Arc<S> {
    type Item = S::Item;

    fn len(&self) -> usize {
        (**self).len()
    }

    fn scan<R>(&self, f: impl FnOnce(&mut dyn Iterator<Item = &Self::Item>) -> R) -> R {
        (**self).scan(f)
    }
}
