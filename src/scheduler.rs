//! Batch-pull state machine behind an [`OrchestrationPlan`](crate::plan::OrchestrationPlan).
//!
//! Every group moves through `unclaimed -> owned (partial) -> exhausted` and
//! never back. A pull first drains the groups the calling worker already
//! owns, in claim order, then claims groups from the head of the free queue
//! (largest first) until the batch is full or the queue is empty.
//!
//! Pulls are two-phase. [`ScheduleState::prepare`] computes the positions to
//! hand out without touching any state, and [`ScheduleState::commit`] applies
//! the result once the caller has successfully materialized the elements.

use crate::group_index::GroupIndex;
use crate::worker::WorkerId;
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::Hash;

/// Lifecycle state of one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GroupState {
    /// Still waiting in the free-group queue.
    Unclaimed,
    /// Claimed by `worker` and not yet fully delivered.
    Owned {
        /// The owning worker.
        worker: WorkerId,
        /// Members already handed out.
        delivered: usize,
        /// Members still to be handed out.
        remaining: usize,
    },
    /// Every member was delivered to `worker`.
    Exhausted {
        /// The worker that consumed the group.
        worker: WorkerId,
    },
}

/// Point-in-time summary of a plan's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PlanStats {
    /// Elements covered by the plan.
    pub elements: usize,
    /// Distinct groups.
    pub groups: usize,
    /// Groups still in the free queue.
    pub unclaimed_groups: usize,
    /// Claimed groups with members left to deliver.
    pub owned_groups: usize,
    /// Claimed groups that were fully delivered.
    pub exhausted_groups: usize,
    /// Elements handed out so far.
    pub delivered: usize,
    /// Distinct workers that claimed at least one group.
    pub workers: usize,
    /// Whether every element was delivered.
    pub drained: bool,
}

/// Outcome of [`ScheduleState::prepare`], applied by [`ScheduleState::commit`].
#[derive(Debug)]
pub(crate) struct Pull<K> {
    /// Positions in delivery order: owned groups first, then new claims.
    pub(crate) positions: Vec<usize>,
    /// New delivered-count per touched group.
    advances: Vec<(K, usize)>,
    /// How many keys to pop from the front of the free queue.
    claims: usize,
}

#[derive(Debug)]
pub(crate) struct ScheduleState<K> {
    free: VecDeque<K>,
    /// Members delivered per group; absent means not started.
    delivered_in: HashMap<K, usize>,
    owned: HashMap<WorkerId, Vec<K>>,
    owner_of: HashMap<K, WorkerId>,
    delivered: usize,
}

impl<K: Eq + Hash + Clone> ScheduleState<K> {
    pub(crate) fn new(free: Vec<K>) -> Self {
        Self {
            free: free.into(),
            delivered_in: HashMap::new(),
            owned: HashMap::new(),
            owner_of: HashMap::new(),
            delivered: 0,
        }
    }

    fn delivered_of(&self, key: &K) -> usize {
        self.delivered_in.get(key).copied().unwrap_or(0)
    }

    /// Compute the next batch for `worker` without mutating anything.
    pub(crate) fn prepare(&self, index: &GroupIndex<K>, worker: WorkerId, batch_size: usize) -> Pull<K> {
        let mut pull = Pull {
            positions: Vec::with_capacity(batch_size.min(index.element_count() - self.delivered)),
            advances: Vec::new(),
            claims: 0,
        };

        if let Some(owned) = self.owned.get(&worker) {
            for key in owned {
                if pull.positions.len() == batch_size {
                    break;
                }
                self.take(index, key, batch_size, &mut pull);
            }
        }

        for key in &self.free {
            if pull.positions.len() == batch_size {
                break;
            }
            self.take(index, key, batch_size, &mut pull);
            pull.claims += 1;
        }

        pull
    }

    fn take(&self, index: &GroupIndex<K>, key: &K, batch_size: usize, pull: &mut Pull<K>) {
        let Some(positions) = index.positions(key) else {
            return;
        };
        let start = self.delivered_of(key);
        let room = batch_size - pull.positions.len();
        let end = positions.len().min(start.saturating_add(room));
        if end > start {
            pull.positions.extend_from_slice(&positions[start..end]);
            pull.advances.push((key.clone(), end));
        }
    }

    /// Apply a prepared pull on behalf of `worker`, returning the newly claimed keys.
    ///
    /// Groups the worker had already exhausted before this pull are dropped
    /// from its ownership list first; they stay recorded as exhausted.
    pub(crate) fn commit(&mut self, index: &GroupIndex<K>, worker: WorkerId, pull: Pull<K>) -> Vec<K> {
        let delivered_in = &self.delivered_in;
        if let Some(owned) = self.owned.get_mut(&worker) {
            owned.retain(|key| {
                let total = index.positions(key).map_or(0, <[usize]>::len);
                delivered_in.get(key).copied().unwrap_or(0) < total
            });
        }

        self.delivered += pull.positions.len();
        self.delivered_in.extend(pull.advances);

        let claimed: Vec<K> = self.free.drain(..pull.claims).collect();
        if !claimed.is_empty() {
            for key in &claimed {
                self.owner_of.insert(key.clone(), worker);
            }
            self.owned
                .entry(worker)
                .or_default()
                .extend(claimed.iter().cloned());
        }
        claimed
    }

    pub(crate) fn group_state(&self, index: &GroupIndex<K>, key: &K) -> Option<GroupState> {
        let total = index.positions(key)?.len();
        let state = match self.owner_of.get(key) {
            None => GroupState::Unclaimed,
            Some(&worker) => {
                let delivered = self.delivered_of(key);
                if delivered >= total {
                    GroupState::Exhausted { worker }
                } else {
                    GroupState::Owned {
                        worker,
                        delivered,
                        remaining: total - delivered,
                    }
                }
            }
        };
        Some(state)
    }

    /// Last position delivered from `key`'s group.
    pub(crate) fn cursor(&self, index: &GroupIndex<K>, key: &K) -> Option<usize> {
        let delivered = self.delivered_of(key);
        let positions = index.positions(key)?;
        delivered.checked_sub(1).map(|i| positions[i])
    }

    pub(crate) fn owned_groups(&self, worker: WorkerId) -> Vec<K> {
        self.owned.get(&worker).cloned().unwrap_or_default()
    }

    pub(crate) fn is_drained(&self, index: &GroupIndex<K>) -> bool {
        self.delivered >= index.element_count()
    }

    pub(crate) fn stats(&self, index: &GroupIndex<K>) -> PlanStats {
        let exhausted_groups = self
            .owner_of
            .keys()
            .filter(|key| self.delivered_of(key) >= index.positions(key).map_or(0, <[usize]>::len))
            .count();
        PlanStats {
            elements: index.element_count(),
            groups: index.group_count(),
            unclaimed_groups: self.free.len(),
            owned_groups: self.owner_of.len() - exhausted_groups,
            exhausted_groups,
            delivered: self.delivered,
            workers: self.owner_of.values().collect::<HashSet<_>>().len(),
            drained: self.is_drained(index),
        }
    }
}
