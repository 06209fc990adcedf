// src/exec/worker.rs

//! Worker threads pulling vertices from the scheduler.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use anyhow::anyhow;
use tracing::{debug, error, info};

use crate::dag::Scheduler;
use crate::exec::action::ActionRunner;

/// Outcome of a worker pool run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Actions that completed successfully.
    pub executed: usize,
    /// Whether the scheduler's error flag was raised during the run.
    pub failed: bool,
}

impl RunReport {
    pub fn success(&self) -> bool {
        !self.failed
    }
}

/// Take vertices from `scheduler` until it has nothing more to give.
///
/// Returns the number of actions this worker completed. A failed or
/// panicking action fails the run and ends this worker; other workers
/// finish what they hold and then find the queue closed.
pub fn worker_loop(worker: usize, scheduler: &Scheduler, runner: &dyn ActionRunner) -> usize {
    let mut executed = 0;

    while let Some(item) = scheduler.get_item(true) {
        debug!(worker, vertex = %item.id, "picked up");

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            runner.run(&item, scheduler.graph())
        }))
        .unwrap_or_else(|payload| Err(anyhow!("action panicked: {}", panic_message(&*payload))));

        if let Err(err) = outcome {
            error!(worker, vertex = %item.id, error = %format!("{err:#}"), "action failed");
            if let Err(e) = scheduler.mark_failed(&item.id) {
                error!(worker, vertex = %item.id, error = %e, "could not record failure");
            }
            return executed;
        }

        if let Err(e) = scheduler.mark_done(&item.id) {
            error!(worker, vertex = %item.id, error = %e, "could not record completion");
            scheduler.mark_error();
            return executed;
        }
        executed += 1;
    }

    debug!(worker, executed, "worker finished");
    executed
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Run `jobs` workers against `scheduler` and wait for all of them.
pub fn run_workers(scheduler: &Scheduler, runner: &dyn ActionRunner, jobs: usize) -> RunReport {
    let jobs = jobs.max(1);
    let executed = AtomicUsize::new(0);
    info!(jobs, "starting workers");

    thread::scope(|s| {
        for worker in 0..jobs {
            let executed = &executed;
            let spawned = thread::Builder::new()
                .name(format!("worker-{worker}"))
                .spawn_scoped(s, move || {
                    let n = worker_loop(worker, scheduler, runner);
                    executed.fetch_add(n, Ordering::Relaxed);
                });
            if let Err(e) = spawned {
                error!(worker, error = %e, "failed to spawn worker thread");
                scheduler.mark_error();
            }
        }
    });

    let report = RunReport {
        executed: executed.into_inner(),
        failed: scheduler.has_error(),
    };
    info!(executed = report.executed, failed = report.failed, "workers finished");
    report
}
