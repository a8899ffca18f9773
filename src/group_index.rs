//! Immutable mapping from group key to the positions of its members.

use std::collections::HashMap;
use std::hash::Hash;

/// Positions of every group's members, ascending within each group.
///
/// Built once by [`PlanBuilder`](crate::plan::PlanBuilder) and never mutated
/// afterwards.
#[derive(Debug, Clone)]
pub struct GroupIndex<K> {
    groups: HashMap<K, Vec<usize>>,
    elements: usize,
}

impl<K: Eq + Hash> GroupIndex<K> {
    pub(crate) fn new() -> Self {
        Self {
            groups: HashMap::new(),
            elements: 0,
        }
    }

    /// Append `position` to `key`'s group. Callers feed positions in
    /// ascending order, which keeps every group sorted.
    pub(crate) fn push(&mut self, position: usize, key: K) {
        self.groups.entry(key).or_default().push(position);
        self.elements += 1;
    }

    pub(crate) fn as_map(&self) -> &HashMap<K, Vec<usize>> {
        &self.groups
    }

    /// Positions of `key`'s members, or `None` for an unknown key.
    #[must_use]
    pub fn positions(&self, key: &K) -> Option<&[usize]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    /// Last (highest) position of `key`'s group.
    #[must_use]
    pub fn last_position(&self, key: &K) -> Option<usize> {
        self.groups.get(key).and_then(|p| p.last().copied())
    }

    /// Number of distinct groups.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of indexed elements across all groups.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements
    }

    /// Size of the largest group, 0 when empty.
    #[must_use]
    pub fn largest_group(&self) -> usize {
        self.groups.values().map(Vec::len).max().unwrap_or(0)
    }

    /// Iterate over `(key, positions)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &[usize])> {
        self.groups.iter().map(|(k, p)| (k, p.as_slice()))
    }
}
