//! Tests for the freezable shared vector.

use anyhow::Result;
use grouplane::*;
use std::sync::Arc;
use std::thread;

#[test]
fn mutators_work_while_thawed() -> Result<()> {
    let data = LockableVec::new();
    data.push(3)?;
    data.extend_from([1, 2])?;
    data.insert(0, 9)?;
    assert_eq!(data.to_vec(), vec![9, 3, 1, 2]);

    assert_eq!(data.set(1, 4)?, 3);
    assert_eq!(data.remove(0)?, 9);
    data.sort_by(|a, b| a.cmp(b))?;
    assert_eq!(data.to_vec(), vec![1, 2, 4]);

    data.retain(|n| n % 2 == 0)?;
    assert_eq!(data.to_vec(), vec![2, 4]);
    assert_eq!(data.get(1), Some(4));
    assert_eq!(data.get(5), None);

    data.clear()?;
    assert!(data.is_empty());
    Ok(())
}

fn locked<T>(operation: &'static str) -> grouplane::Result<T> {
    Err(Error::CollectionLocked { operation })
}

#[test]
fn every_mutator_is_rejected_while_frozen() {
    let data = LockableVec::from(vec![5, 1, 3]);
    data.freeze();
    assert!(data.is_frozen());

    assert_eq!(data.push(0), locked("push"));
    assert_eq!(data.insert(0, 0), locked("insert"));
    assert_eq!(data.remove(0), locked("remove"));
    assert_eq!(data.set(0, 0), locked("set"));
    assert_eq!(data.clear(), locked("clear"));
    assert_eq!(data.extend_from([7]), locked("extend"));
    assert_eq!(data.retain(|_| false), locked("retain"));
    assert_eq!(data.sort_by(|a, b| a.cmp(b)), locked("sort"));

    // Contents are untouched and still readable.
    assert_eq!(data.to_vec(), vec![5, 1, 3]);
    assert_eq!(data.len(), 3);
}

#[test]
fn thaw_restores_mutability() -> Result<()> {
    let data = LockableVec::from(vec!["a"]);
    data.freeze();
    data.thaw();
    assert!(!data.is_frozen());
    data.push("b")?;
    assert_eq!(data.len(), 2);
    Ok(())
}

#[test]
fn index_errors_leave_contents_alone() {
    let data = LockableVec::from(vec![1, 2]);
    assert_eq!(data.insert(3, 0), Err(Error::IndexOutOfRange { index: 3, len: 2 }));
    assert_eq!(data.remove(2), Err(Error::IndexOutOfRange { index: 2, len: 2 }));
    assert_eq!(data.set(9, 0), Err(Error::IndexOutOfRange { index: 9, len: 2 }));
    assert_eq!(data.to_vec(), vec![1, 2]);
}

#[test]
fn freezing_through_an_arc_is_visible_to_every_holder() {
    let data = Arc::new(LockableVec::from(vec![1]));
    let other = Arc::clone(&data);
    data.freeze();
    assert!(other.is_frozen());
    assert!(other.push(2).is_err());
}

#[test]
fn freeze_waits_for_concurrent_writers() -> Result<()> {
    let data = Arc::new(LockableVec::new());

    let writers: Vec<_> = (0..4)
        .map(|t| {
            let data = Arc::clone(&data);
            thread::spawn(move || {
                let mut accepted = 0usize;
                for i in 0..1_000 {
                    if data.push(t * 1_000 + i).is_ok() {
                        accepted += 1;
                    }
                }
                accepted
            })
        })
        .collect();

    data.freeze();
    let len_at_freeze = data.len();

    let mut accepted = 0;
    for writer in writers {
        accepted += writer.join().map_err(|_| anyhow::anyhow!("writer panicked"))?;
    }

    // Nothing lands after freeze() returns.
    assert_eq!(data.len(), len_at_freeze);
    assert_eq!(accepted, len_at_freeze);
    Ok(())
}

#[test]
fn plan_over_a_frozen_collection() -> Result<()> {
    let data: LockableVec<(char, u32)> = [('a', 1), ('b', 2), ('a', 3)].into_iter().collect();
    let orchestrator = Orchestrator::new(|e: &(char, u32)| e.0);
    let plan = orchestrator.create_plan_frozen(&data);

    assert!(data.is_frozen());
    assert_eq!(
        orchestrator.next_batch(&plan, WorkerId::new(1), 10)?,
        vec![('a', 1), ('a', 3), ('b', 2)]
    );
    Ok(())
}
