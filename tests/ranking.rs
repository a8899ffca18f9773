//! Tests for group ranking.

use grouplane::rank_groups_by_size;
use std::collections::HashMap;

#[test]
fn largest_group_ranks_first() {
    let groups = HashMap::from([
        ("small", vec![3]),
        ("large", vec![0, 1, 4, 6]),
        ("medium", vec![2, 5]),
    ]);
    assert_eq!(rank_groups_by_size(&groups), vec!["large", "medium", "small"]);
}

#[test]
fn empty_groups_are_skipped() {
    let groups = HashMap::from([("empty", vec![]), ("one", vec![0])]);
    assert_eq!(rank_groups_by_size(&groups), vec!["one"]);
    assert!(rank_groups_by_size(&HashMap::<u8, Vec<usize>>::new()).is_empty());
}

#[test]
fn ties_keep_every_group_exactly_once() {
    let groups: HashMap<u32, Vec<usize>> = (0..20).map(|k| (k, vec![k as usize])).collect();
    let mut ranked = rank_groups_by_size(&groups);
    assert_eq!(ranked.len(), 20);
    ranked.sort_unstable();
    assert_eq!(ranked, (0..20).collect::<Vec<_>>());
}

#[test]
fn ranking_is_non_increasing_in_size() {
    let groups: HashMap<u32, Vec<usize>> = (1..30).map(|k| (k, (0..(k % 7) as usize).collect())).collect();
    let ranked = rank_groups_by_size(&groups);
    let sizes: Vec<usize> = ranked.iter().map(|k| groups[k].len()).collect();
    assert!(sizes.windows(2).all(|w| w[0] >= w[1]), "sizes not ordered: {sizes:?}");
    assert!(!ranked.contains(&7));
}
