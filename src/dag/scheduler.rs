// src/dag/scheduler.rs

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use tracing::{debug, info, warn};

use crate::dag::graph::Graph;
use crate::dag::probe::ProbeTable;
use crate::dag::state::RunState;
use crate::dag::vertex::{VertexId, VertexState, WorkItem};
use crate::errors::{BuildError, Result};

/// Scheduler holds the immutable build graph plus the mutable run state.
///
/// It is responsible for:
/// - deciding, once per vertex, whether it is stale
/// - handing ready vertices to workers, one worker per vertex
/// - promoting dependents when a vertex finishes
/// - stopping all dispatch once anything fails
///
/// All run state sits behind one mutex; `get_item` parks on a condition
/// variable tied to that mutex until work shows up or the run ends.
#[derive(Debug)]
pub struct Scheduler {
    graph: Graph,
    probes: ProbeTable,
    state: Mutex<RunState>,
    wakeup: Condvar,
}

impl Scheduler {
    /// Build a scheduler over `graph`.
    ///
    /// Every vertex kind present in the graph must have a probe, so that
    /// activation can never run into a vertex it does not know how to check.
    pub fn new(graph: Graph, probes: ProbeTable) -> Result<Self> {
        for (_, kind) in graph.vertices() {
            if !probes.contains(kind.tag()) {
                return Err(BuildError::MissingProbe(kind.tag()));
            }
        }

        Ok(Self {
            graph,
            probes,
            state: Mutex::new(RunState::default()),
            wakeup: Condvar::new(),
        })
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    fn lock(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add `goal` to the goal set and evaluate everything it needs.
    ///
    /// Vertices already evaluated for an earlier goal are not probed again.
    pub fn activate(&self, goal: &str) -> Result<()> {
        if !self.graph.contains(goal) {
            return Err(BuildError::UnknownVertex(goal.to_string()));
        }
        if let Some(cycle) = self.graph.find_cycle_from(goal) {
            return Err(BuildError::GraphCycle(cycle.join(" -> ")));
        }

        let mut st = self.lock();
        if st.goals.iter().any(|g| g == goal) {
            debug!(goal, "goal already active");
            return Ok(());
        }

        let evaluated = st.evaluate_from(&self.graph, &self.probes, goal)?;
        st.goals.push(goal.to_string());
        info!(
            goal,
            evaluated,
            stale = st.updated.len(),
            ready = st.ready.len(),
            "activated goal"
        );

        if st.finished() {
            self.wakeup.notify_all();
        } else {
            for _ in 0..st.ready.len() {
                self.wakeup.notify_one();
            }
        }
        Ok(())
    }

    /// Hand out one ready vertex, marking it `Running`.
    ///
    /// With `blocking = true` this waits until a vertex is ready or the run
    /// is over. `None` means there is nothing (more) to do for this caller:
    /// either every goal is built, an error was raised, or, in non-blocking
    /// mode, nothing is ready right now.
    pub fn get_item(&self, blocking: bool) -> Option<WorkItem> {
        let mut st = self.lock();
        loop {
            if st.finished() {
                return None;
            }
            if let Some((id, kind)) = st.dispense() {
                debug!(vertex = %id, kind = %kind, "dispensing");
                return Some(WorkItem { id, kind });
            }
            if !blocking {
                return None;
            }
            st = self.wakeup.wait(st).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Report that the action for `id` succeeded.
    pub fn mark_done(&self, id: &str) -> Result<()> {
        let mut st = self.lock();
        let promoted = st.complete(&self.graph, id, SystemTime::now())?;
        debug!(vertex = %id, promoted = promoted.len(), "done");

        for vertex in &promoted {
            debug!(vertex = %vertex, "dependencies satisfied; ready");
            self.wakeup.notify_one();
        }

        if st.finished() {
            info!("all goals built");
            self.wakeup.notify_all();
        }
        Ok(())
    }

    /// Report that the action for `id` failed.
    ///
    /// Equivalent to [`Scheduler::mark_error`], plus the vertex is recorded as
    /// `Failed` so its dependents can never become ready.
    pub fn mark_failed(&self, id: &str) -> Result<()> {
        let mut st = self.lock();
        let res = st.fail(id);
        warn!(vertex = %id, "action failed; no further work will be dispatched");
        self.wakeup.notify_all();
        res
    }

    /// Raise the run-wide error flag.
    ///
    /// Running vertices may still finish and report, but nothing new is
    /// dispensed and every blocked `get_item` returns `None`.
    pub fn mark_error(&self) {
        let mut st = self.lock();
        if !st.error {
            warn!("error flag raised; stopping dispatch");
        }
        st.error = true;
        self.wakeup.notify_all();
    }

    /// `true` once every goal is built or the error flag is set.
    pub fn done(&self) -> bool {
        self.lock().finished()
    }

    pub fn has_error(&self) -> bool {
        self.lock().error
    }

    /// Stale vertices, dependencies first, without running anything.
    pub fn get_updated(&self) -> Vec<VertexId> {
        self.lock().updated.clone()
    }

    /// Current state of `id`; `None` for ids the graph does not know.
    pub fn state_of(&self, id: &str) -> Option<VertexState> {
        if !self.graph.contains(id) {
            return None;
        }
        Some(self.lock().state_of(id))
    }

    /// Timestamp dependents of `id` compare against, if it was evaluated.
    pub fn effective_time(&self, id: &str) -> Option<SystemTime> {
        self.lock().vertices.get(id).and_then(|v| v.effective)
    }

    /// Ids of every vertex reachable from the active goals.
    pub fn evaluated(&self) -> Vec<VertexId> {
        self.lock().vertices.keys().cloned().collect()
    }

    pub fn goals(&self) -> Vec<VertexId> {
        self.lock().goals.clone()
    }
}
