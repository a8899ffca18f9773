//! End-to-end use of the orchestrator facade.

use anyhow::Result;
use grouplane::testing::*;
use grouplane::*;

struct ByCustomer;

impl GroupKeyExtractor<CustomerEvent, String> for ByCustomer {
    fn extract_group_key(&self, event: &CustomerEvent) -> String {
        event.customer.clone()
    }
}

#[test]
fn custom_extractor_type() -> Result<()> {
    let events = customer_events();
    let orchestrator = Orchestrator::new(ByCustomer);
    let plan = orchestrator.create_plan(events.clone());

    assert_eq!(plan.groups().group_count(), 4);
    let first = orchestrator.next_batch(&plan, WorkerId::new(1), 4)?;
    assert!(first.iter().all(|e| e.customer == "alice"));
    assert_eq!(first.iter().map(|e| e.seq).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    Ok(())
}

#[test]
fn customers_never_split_across_workers() -> Result<()> {
    let events = customer_events();
    let key = |e: &CustomerEvent| e.customer.clone();
    let plan = Orchestrator::new(key).create_plan(events.clone());

    let workers = [WorkerId::new(10), WorkerId::new(20)];
    let batches = drain_round_robin(&plan, &workers, 2)?;

    assert_each_element_once(&batches, &events);
    assert_group_affinity(&batches, key);
    assert_group_order(&batches, &events, key);

    // Per customer, seq still counts up from 0 in delivery order.
    for (_, received) in collect_by_worker(&batches) {
        for customer in ["alice", "bob", "carol", "dave"] {
            let seqs: Vec<u32> = received.iter().filter(|e| e.customer == customer).map(|e| e.seq).collect();
            assert!(seqs.iter().enumerate().all(|(i, s)| *s as usize == i) || seqs.is_empty());
        }
    }
    Ok(())
}

#[test]
fn batch_of_one_walks_groups_in_rank_order() -> Result<()> {
    let events = customer_events();
    let orchestrator = Orchestrator::new(|e: &CustomerEvent| e.customer.clone());
    let plan = orchestrator.create_plan(events);
    let worker = WorkerId::new(1);

    let mut customers = Vec::new();
    loop {
        let batch = orchestrator.next_batch(&plan, worker, 1)?;
        let Some(event) = batch.into_iter().next() else {
            break;
        };
        customers.push(event.customer);
    }

    let expected: Vec<&str> = ["alice"; 4]
        .into_iter()
        .chain(["bob"; 3])
        .chain(["carol"; 2])
        .chain(["dave"])
        .collect();
    assert_eq!(customers, expected);
    Ok(())
}

#[test]
fn extractor_is_reachable() {
    let orchestrator = Orchestrator::new(|n: &i64| n.signum());
    assert_eq!(orchestrator.extractor().extract_group_key(&-5), -1);
}

#[test]
fn plan_over_a_borrowed_dataset() -> Result<()> {
    let data = vec![3u8, 1, 4, 1, 5, 9, 2, 6];
    let plan = Orchestrator::new(|n: &u8| n % 2).create_plan(data.as_slice());

    let batch = plan.poll_next_batch(WorkerId::new(1), 8)?;
    assert_eq!(batch.len(), 8);
    // Odd values form the larger group.
    assert_eq!(&batch[..5], &[3, 1, 1, 5, 9]);
    assert_eq!(&batch[5..], &[4, 2, 6]);
    assert!(std::ptr::eq(plan.source().as_ptr(), data.as_ptr()));
    Ok(())
}
