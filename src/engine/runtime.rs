// src/engine/runtime.rs

//! Scheduling and execution of an assembled build plan.

use std::sync::Arc;

use tracing::info;

use crate::dag::{ProbeTable, Scheduler};
use crate::engine::BuildPlan;
use crate::errors::Result;
use crate::exec::{ActionRunner, RunReport, run_workers};

/// Construct the scheduler for `plan` and activate every goal.
///
/// Staleness is decided here, once; the returned scheduler already knows
/// exactly which vertices need work.
pub fn schedule(plan: BuildPlan, probes: ProbeTable) -> Result<Scheduler> {
    let BuildPlan { graph, goals } = plan;
    let scheduler = Scheduler::new(graph, probes)?;
    for goal in &goals {
        scheduler.activate(goal)?;
    }

    let updated = scheduler.get_updated();
    info!(goals = goals.len(), stale = updated.len(), "build plan scheduled");
    Ok(scheduler)
}

/// Run `jobs` workers over `scheduler` on a blocking thread.
pub async fn execute(
    scheduler: Scheduler,
    runner: Arc<dyn ActionRunner>,
    jobs: usize,
) -> Result<RunReport> {
    if scheduler.done() {
        info!("everything is up to date");
        return Ok(RunReport {
            executed: 0,
            failed: scheduler.has_error(),
        });
    }

    let report = tokio::task::spawn_blocking(move || run_workers(&scheduler, runner.as_ref(), jobs))
        .await
        .map_err(anyhow::Error::from)?;
    Ok(report)
}
