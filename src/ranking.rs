//! Longest-group-first ordering of the free-group queue.
//!
//! Handing out the biggest groups first keeps a worker from finishing early
//! and idling while another one is still chewing through a huge group. This
//! is the greedy longest-job-first heuristic, not an optimal packing.

use std::collections::HashMap;
use std::hash::BuildHasher;

/// Order group keys by descending member count.
///
/// Groups without members are left out. Ties keep the map's iteration
/// order, so the result is stable for one map but unspecified across maps.
///
/// ```
/// use grouplane::rank_groups_by_size;
/// use std::collections::HashMap;
///
/// let groups = HashMap::from([("small", vec![4]), ("big", vec![0, 1, 2]), ("none", vec![])]);
/// assert_eq!(rank_groups_by_size(&groups), vec!["big", "small"]);
/// ```
pub fn rank_groups_by_size<K: Clone, H: BuildHasher>(groups: &HashMap<K, Vec<usize>, H>) -> Vec<K> {
    let mut sized: Vec<(&K, usize)> = groups
        .iter()
        .filter(|(_, positions)| !positions.is_empty())
        .map(|(key, positions)| (key, positions.len()))
        .collect();
    // stable: equal sizes stay in iteration order
    sized.sort_by(|a, b| b.1.cmp(&a.1));
    sized.into_iter().map(|(key, _)| key.clone()).collect()
}
