//! Assertions over the batches a plan handed out.
//!
//! Each function takes the batches as `(worker, batch)` pairs, exactly as the
//! [`harness`](super::harness) helpers return them, and panics with a
//! detailed message when a scheduling guarantee is broken.

use super::harness::WorkerBatch;
use crate::worker::WorkerId;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Assert that every element of `dataset` was delivered exactly once, and
/// nothing else was.
///
/// Elements of `dataset` must be distinct.
///
/// # Panics
///
/// Panics on a missing, duplicated, or unexpected element.
///
/// # Example
///
/// ```
/// use grouplane::WorkerId;
/// use grouplane::testing::assert_each_element_once;
///
/// let batches = vec![(WorkerId::new(1), vec![0, 2]), (WorkerId::new(2), vec![1])];
/// assert_each_element_once(&batches, &[0, 1, 2]);
/// ```
pub fn assert_each_element_once<T: Debug + Eq + Hash>(batches: &[WorkerBatch<T>], dataset: &[T]) {
    let mut seen: HashMap<&T, usize> = HashMap::new();
    for (_, batch) in batches {
        for item in batch {
            *seen.entry(item).or_insert(0) += 1;
        }
    }

    let missing: Vec<&T> = dataset.iter().filter(|e| !seen.contains_key(e)).collect();
    let duplicated: Vec<(&T, usize)> = seen
        .iter()
        .filter(|(_, n)| **n > 1)
        .map(|(e, n)| (*e, *n))
        .collect();
    let unexpected: Vec<&T> = seen
        .keys()
        .filter(|e| !dataset.contains(e))
        .copied()
        .collect();

    assert!(
        missing.is_empty() && duplicated.is_empty() && unexpected.is_empty(),
        "Delivery mismatch:\n  Missing: {missing:?}\n  Duplicated (element, times): {duplicated:?}\n  Unexpected: {unexpected:?}"
    );
}

/// Assert that no group was delivered to more than one worker.
///
/// # Panics
///
/// Panics naming the first group seen under two workers.
///
/// # Example
///
/// ```
/// use grouplane::WorkerId;
/// use grouplane::testing::assert_group_affinity;
///
/// let batches = vec![(WorkerId::new(1), vec![0, 2, 4]), (WorkerId::new(2), vec![1, 3])];
/// assert_group_affinity(&batches, |n: &u32| n % 2);
/// ```
pub fn assert_group_affinity<T, K>(batches: &[WorkerBatch<T>], key_of: impl Fn(&T) -> K)
where
    T: Debug,
    K: Debug + Eq + Hash,
{
    let mut owner_of: HashMap<K, WorkerId> = HashMap::new();
    for (worker, batch) in batches {
        for item in batch {
            let key = key_of(item);
            match owner_of.get(&key) {
                Some(owner) if owner != worker => panic!(
                    "Group {key:?} delivered to both {owner} and {worker} (element {item:?})"
                ),
                Some(_) => {}
                None => {
                    owner_of.insert(key, *worker);
                }
            }
        }
    }
}

/// Assert that each group's elements reached their worker in dataset order.
///
/// Elements of `dataset` must be distinct.
///
/// # Panics
///
/// Panics if a group's elements arrive out of order, or an element is not
/// part of `dataset`.
///
/// # Example
///
/// ```
/// use grouplane::WorkerId;
/// use grouplane::testing::assert_group_order;
///
/// let dataset = [10, 11, 12, 13];
/// let batches = vec![(WorkerId::new(1), vec![10, 12]), (WorkerId::new(1), vec![11, 13])];
/// assert_group_order(&batches, &dataset, |n: &u32| n % 2);
/// ```
pub fn assert_group_order<T, K>(batches: &[WorkerBatch<T>], dataset: &[T], key_of: impl Fn(&T) -> K)
where
    T: Debug + Eq + Hash,
    K: Debug + Eq + Hash,
{
    let position_of: HashMap<&T, usize> = dataset.iter().enumerate().map(|(i, e)| (e, i)).collect();
    let mut last_seen: HashMap<K, usize> = HashMap::new();
    for (_, batch) in batches {
        for item in batch {
            let Some(&position) = position_of.get(item) else {
                panic!("Element {item:?} is not part of the dataset");
            };
            let key = key_of(item);
            if let Some(&previous) = last_seen.get(&key) {
                assert!(
                    previous < position,
                    "Group {key:?} out of order: position {position} ({item:?}) arrived after position {previous}"
                );
            }
            last_seen.insert(key, position);
        }
    }
}

/// Assert that every batch is non-empty and holds at most `batch_size` elements.
///
/// # Panics
///
/// Panics on the first offending batch.
pub fn assert_batch_bounds<T: Debug>(batches: &[WorkerBatch<T>], batch_size: usize) {
    for (i, (worker, batch)) in batches.iter().enumerate() {
        assert!(
            !batch.is_empty() && batch.len() <= batch_size,
            "Batch {i} for {worker} has {} elements, expected 1..={batch_size}: {batch:?}",
            batch.len()
        );
    }
}
