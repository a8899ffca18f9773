use anyhow::{Result, bail};
use grouplane::testing::*;
use grouplane::*;
use std::collections::HashMap;
use std::sync::Mutex;

fn config(mode: ExecMode, workers: usize, batch_size: usize) -> RunnerConfig {
    RunnerConfig {
        mode,
        workers,
        batch_size,
    }
}

/// Run `plan` and return what every worker saw, batch by batch.
fn run_and_collect(runner: &Runner, plan: &OrchestrationPlan<Vec<u32>, String>) -> Result<(RunReport, Vec<WorkerBatch<u32>>)> {
    let seen = Mutex::new(Vec::new());
    let report = runner.run(plan, |worker, batch| {
        seen.lock().map_err(|_| anyhow::anyhow!("poisoned"))?.push((worker, batch));
        Ok(())
    })?;
    let batches = seen.into_inner().map_err(|_| anyhow::anyhow!("poisoned"))?;
    Ok((report, batches))
}

#[test]
fn sequential_mode_is_deterministic() -> Result<()> {
    let data = three_group_dataset();
    let runner = Runner::new(config(ExecMode::Sequential, 3, 9))?;

    let plan = Orchestrator::new(three_group_key).create_plan(data.clone());
    let (report, batches) = run_and_collect(&runner, &plan)?;

    assert_eq!(report.elements(), 21);
    assert_eq!(report.active_workers(), 2);
    let per_worker: Vec<usize> = report.workers.iter().map(|w| w.elements).collect();
    assert_eq!(per_worker, vec![15, 6, 0]);
    assert_eq!(report.workers[0].batches, 2);

    assert_each_element_once(&batches, &data);
    assert_group_affinity(&batches, three_group_key);
    assert_group_order(&batches, &data, three_group_key);
    Ok(())
}

#[test]
fn parallel_mode_keeps_every_guarantee() -> Result<()> {
    let data: Vec<u32> = (0..2_000).collect();
    let plan = Orchestrator::new(|n: &u32| format!("k{}", n % 37)).create_plan(data.clone());
    let runner = Runner::new(config(ExecMode::Parallel, 4, 16))?;

    let (report, batches) = run_and_collect(&runner, &plan)?;

    assert_eq!(report.workers.len(), 4);
    assert_eq!(report.elements(), 2_000);
    assert!(plan.is_drained());
    assert_batch_bounds(&batches, 16);
    assert_each_element_once(&batches, &data);
    assert_group_affinity(&batches, |n: &u32| n % 37);
    assert_group_order(&batches, &data, |n: &u32| n % 37);
    Ok(())
}

#[test]
fn handler_error_is_returned() -> Result<()> {
    let data: Vec<u32> = (0..10).collect();
    let plan = Orchestrator::new(|n: &u32| (n % 2).to_string()).create_plan(data);
    let runner = Runner::new(config(ExecMode::Sequential, 2, 2))?;

    let err = runner
        .run(&plan, |_, batch| {
            if batch.contains(&4) {
                bail!("cannot handle 4");
            }
            Ok(())
        })
        .unwrap_err();

    assert!(format!("{err:#}").contains("cannot handle 4"));
    // The other worker still drained its group.
    assert!(plan.stats().exhausted_groups >= 1);
    Ok(())
}

#[test]
fn second_run_uses_fresh_workers() -> Result<()> {
    let runner = Runner::new(config(ExecMode::Sequential, 2, 4))?;

    let first = Orchestrator::new(|n: &u32| n % 3).create_plan((0..12).collect::<Vec<u32>>());
    let a = runner.run(&first, |_, _| Ok(()))?;
    let second = Orchestrator::new(|n: &u32| n % 3).create_plan((0..12).collect::<Vec<u32>>());
    let b = runner.run(&second, |_, _| Ok(()))?;

    let ids_a: Vec<WorkerId> = a.workers.iter().map(|w| w.worker).collect();
    let ids_b: Vec<WorkerId> = b.workers.iter().map(|w| w.worker).collect();
    assert!(ids_a.iter().all(|id| !ids_b.contains(id)));
    Ok(())
}

#[test]
fn handler_sees_only_its_own_groups() -> Result<()> {
    let plan = Orchestrator::new(|n: &u32| n % 5).create_plan((0..100).collect::<Vec<u32>>());
    let runner = Runner::new(config(ExecMode::Parallel, 3, 7))?;
    let owners: Mutex<HashMap<u32, WorkerId>> = Mutex::new(HashMap::new());

    runner.run(&plan, |worker, batch| {
        let mut owners = owners.lock().map_err(|_| anyhow::anyhow!("poisoned"))?;
        for n in batch {
            let owner = *owners.entry(n % 5).or_insert(worker);
            if owner != worker {
                bail!("group {} seen by {owner} and {worker}", n % 5);
            }
        }
        Ok(())
    })?;
    Ok(())
}

#[test]
fn invalid_config_is_rejected() {
    let err = Runner::new(config(ExecMode::Parallel, 0, 8)).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { argument: "workers", .. }));

    let err = Runner::new(config(ExecMode::Parallel, 2, 0)).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { argument: "batch_size", .. }));
}

#[test]
fn config_loads_from_json() -> Result<()> {
    let config = RunnerConfig::from_json_str(r#"{ "mode": "sequential", "workers": 5, "batch_size": 32 }"#)?;
    assert_eq!(config, self::config(ExecMode::Sequential, 5, 32));

    let defaults = RunnerConfig::from_json_str("{}")?;
    assert_eq!(defaults, RunnerConfig::default());
    assert_eq!(defaults.mode, ExecMode::Parallel);
    assert_eq!(defaults.batch_size, 64);

    assert!(RunnerConfig::from_json_str(r#"{ "batch_size": 0 }"#).is_err());
    assert!(RunnerConfig::from_json_str(r#"{ "mode": "sideways" }"#).is_err());
    assert!(RunnerConfig::from_json_str("not json").is_err());
    Ok(())
}

#[test]
fn report_serializes() -> Result<()> {
    let runner = Runner::new(config(ExecMode::Sequential, 1, 10))?;
    let plan = Orchestrator::new(|n: &u32| *n).create_plan(vec![1u32, 2, 3]);
    let report = runner.run(&plan, |_, _| Ok(()))?;

    let json = serde_json::to_value(&report)?;
    assert_eq!(json["workers"][0]["elements"], 3);
    Ok(())
}
