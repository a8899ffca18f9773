//! Concurrent workers sharing one plan.

use anyhow::Result;
use grouplane::testing::*;
use grouplane::*;
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

fn workers(n: u64) -> Vec<WorkerId> {
    (1..=n).map(WorkerId::new).collect()
}

fn groups_of(batch: &[u32]) -> HashSet<String> {
    batch.iter().map(three_group_key).collect()
}

#[test]
fn three_workers_round_robin_split_the_groups() -> Result<()> {
    let data = three_group_dataset();
    let plan = Orchestrator::new(three_group_key).create_plan(data.clone());

    let batches = drain_round_robin(&plan, &workers(3), 9)?;
    let by_worker = collect_by_worker(&batches);

    // The first poll takes GROUP-1 whole plus the head of GROUP-2; the
    // second worker gets GROUP-3; the third finds nothing left to claim.
    assert_eq!(by_worker.len(), 2);
    let first = &by_worker[&WorkerId::new(1)];
    let second = &by_worker[&WorkerId::new(2)];
    assert_eq!(first.len(), 15);
    assert_eq!(second.len(), 6);
    assert_eq!(groups_of(first), HashSet::from(["GROUP-1".to_string(), "GROUP-2".to_string()]));
    assert_eq!(groups_of(second), HashSet::from(["GROUP-3".to_string()]));

    assert_batch_bounds(&batches, 9);
    assert_each_element_once(&batches, &data);
    assert_group_affinity(&batches, three_group_key);
    assert_group_order(&batches, &data, three_group_key);
    Ok(())
}

#[test]
fn three_workers_claiming_at_once_leave_one_idle() -> Result<()> {
    for _ in 0..20 {
        let data = three_group_dataset();
        let plan = Orchestrator::new(three_group_key).create_plan(data.clone());
        let first_round = Barrier::new(3);

        // Every worker makes its first claim before anyone polls again.
        let received: Vec<Vec<u32>> = thread::scope(|scope| {
            let handles: Vec<_> = workers(3)
                .into_iter()
                .map(|worker| {
                    let (plan, first_round) = (&plan, &first_round);
                    scope.spawn(move || -> grouplane::Result<Vec<u32>> {
                        let mut all = plan.poll_next_batch(worker, 9)?;
                        first_round.wait();
                        loop {
                            let batch = plan.poll_next_batch(worker, 9)?;
                            if batch.is_empty() {
                                return Ok(all);
                            }
                            all.extend(batch);
                        }
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| -> Result<Vec<u32>> {
                    Ok(h.join().map_err(|_| anyhow::anyhow!("worker panicked"))??)
                })
                .collect::<Result<Vec<_>>>()
        })?;

        let mut sizes: Vec<usize> = received.iter().map(Vec::len).collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![0, 6, 15]);

        let big = received.iter().find(|r| r.len() == 15).expect("one worker got 15");
        let small = received.iter().find(|r| r.len() == 6).expect("one worker got 6");
        assert_eq!(groups_of(big), HashSet::from(["GROUP-1".to_string(), "GROUP-2".to_string()]));
        assert_eq!(groups_of(small), HashSet::from(["GROUP-3".to_string()]));
    }
    Ok(())
}

#[test]
fn three_concurrent_workers_keep_every_guarantee() -> Result<()> {
    for _ in 0..50 {
        let data = three_group_dataset();
        let plan = Orchestrator::new(three_group_key).create_plan(data.clone());

        let batches = drain_concurrently(&plan, &workers(3), 9)?;

        assert_batch_bounds(&batches, 9);
        assert_each_element_once(&batches, &data);
        assert_group_affinity(&batches, three_group_key);
        assert_group_order(&batches, &data, three_group_key);
        assert!(plan.is_drained());

        // Whoever polls first claims GROUP-1 and GROUP-2 together.
        let by_worker = collect_by_worker(&batches);
        let holder = by_worker
            .values()
            .find(|elements| groups_of(elements).contains("GROUP-1"))
            .expect("GROUP-1 was delivered");
        assert!(groups_of(holder).contains("GROUP-2"));
        assert!(by_worker.len() <= 2);
    }
    Ok(())
}

#[test]
fn many_workers_many_groups() -> Result<()> {
    let data: Vec<u32> = (0..5_000).collect();
    let key = |n: &u32| n % 97;
    let plan = Orchestrator::new(key).create_plan(data.clone());

    let batches = drain_concurrently(&plan, &workers(8), 13)?;

    assert_batch_bounds(&batches, 13);
    assert_each_element_once(&batches, &data);
    assert_group_affinity(&batches, key);
    assert_group_order(&batches, &data, key);

    let stats = plan.stats();
    assert!(stats.drained);
    assert_eq!(stats.exhausted_groups, 97);
    assert_eq!(stats.unclaimed_groups, 0);
    Ok(())
}

#[test]
fn frozen_lockable_source_serves_concurrent_workers() -> Result<()> {
    let data = three_group_dataset();
    let shared = Arc::new(data.iter().copied().collect::<LockableVec<u32>>());
    let plan = Orchestrator::new(three_group_key).create_plan_frozen(Arc::clone(&shared));

    assert!(shared.is_frozen());
    assert!(shared.push(99).is_err());

    let batches = drain_concurrently(&plan, &workers(4), 5)?;
    assert_each_element_once(&batches, &data);
    assert_group_affinity(&batches, three_group_key);
    assert_group_order(&batches, &data, three_group_key);
    Ok(())
}
