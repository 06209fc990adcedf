// src/dag/state.rs

//! Per-run vertex bookkeeping behind the scheduler's lock.
//!
//! Everything here is plain data plus the transition rules. The scheduler
//! wraps a single [`RunState`] in a mutex and is the only thing that touches
//! it, so none of these functions need to worry about concurrency.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::SystemTime;

use tracing::{debug, trace};

use crate::dag::graph::Graph;
use crate::dag::probe::ProbeTable;
use crate::dag::vertex::{VertexId, VertexKind, VertexState};
use crate::errors::{BuildError, Result};

/// What the scheduler knows about one evaluated vertex.
#[derive(Debug, Clone)]
pub(crate) struct VertexInfo {
    pub kind: VertexKind,
    pub state: VertexState,
    /// Timestamp reported by the probe when the vertex was evaluated.
    pub probed: Option<SystemTime>,
    /// Timestamp dependents compare against: the probe value, replaced by
    /// the completion time once a stale vertex has been rebuilt.
    pub effective: Option<SystemTime>,
    pub stale: bool,
    /// Stale predecessors that have not reached `Done` yet.
    pub unmet: usize,
}

/// Mutable state of one scheduling run.
#[derive(Debug, Default)]
pub(crate) struct RunState {
    /// Only vertices reachable from an active goal ever get an entry.
    pub vertices: HashMap<VertexId, VertexInfo>,
    pub goals: Vec<VertexId>,
    pub ready: VecDeque<VertexId>,
    /// Stale vertices in the order they were evaluated (dependencies first).
    pub updated: Vec<VertexId>,
    pub error: bool,
}

impl RunState {
    pub fn state_of(&self, id: &str) -> VertexState {
        self.vertices
            .get(id)
            .map(|v| v.state)
            .unwrap_or(VertexState::Unevaluated)
    }

    /// The run is over once every goal is built, or as soon as anything failed.
    pub fn finished(&self) -> bool {
        self.error
            || self
                .goals
                .iter()
                .all(|g| self.state_of(g) == VertexState::Done)
    }

    /// Evaluate every not-yet-evaluated vertex reachable from `goal`.
    ///
    /// Vertices are visited in dependency order so that each predecessor is
    /// settled before anything that depends on it, and each vertex is probed
    /// exactly once no matter how many goals reach it.
    pub fn evaluate_from(&mut self, graph: &Graph, probes: &ProbeTable, goal: &str) -> Result<usize> {
        let order = self.unevaluated_postorder(graph, goal)?;
        let count = order.len();

        for id in order {
            self.evaluate_vertex(graph, probes, id)?;
        }

        Ok(count)
    }

    fn unevaluated_postorder<'g>(&self, graph: &'g Graph, goal: &'g str) -> Result<Vec<&'g str>> {
        let mut order = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut stack: Vec<(&str, bool)> = vec![(goal, false)];

        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            if self.vertices.contains_key(id) || !seen.insert(id) {
                continue;
            }

            stack.push((id, true));
            let preds: Vec<&str> = graph.get_direct_predecessors(id)?.collect();
            // Reverse so the first-added dependency is visited first.
            for pred in preds.into_iter().rev() {
                if !seen.contains(pred) && !self.vertices.contains_key(pred) {
                    stack.push((pred, false));
                }
            }
        }

        Ok(order)
    }

    fn evaluate_vertex(&mut self, graph: &Graph, probes: &ProbeTable, id: &str) -> Result<()> {
        let kind = graph.kind_of(id)?.clone();
        let probe = probes
            .get(kind.tag())
            .ok_or(BuildError::MissingProbe(kind.tag()))?;
        let probed = probe.probe(id, &kind)?;

        let mut stale = probed.is_none();
        let mut newest_dep: Option<SystemTime> = None;
        let mut unmet = 0usize;

        for pred in graph.get_direct_predecessors(id)? {
            let info = self
                .vertices
                .get(pred)
                .ok_or_else(|| BuildError::UnknownVertex(pred.to_string()))?;
            if info.stale {
                stale = true;
            }
            if info.state != VertexState::Done {
                unmet += 1;
            }
            if info.effective > newest_dep {
                newest_dep = info.effective;
            }
        }

        if let (Some(own), Some(newest)) = (probed, newest_dep) {
            if own < newest {
                stale = true;
            }
        }

        let state = if !stale {
            trace!(vertex = %id, "up to date");
            VertexState::Fresh
        } else if unmet == 0 && !self.error {
            debug!(vertex = %id, kind = %kind, "stale; ready immediately");
            VertexState::Ready
        } else {
            debug!(vertex = %id, kind = %kind, unmet, "stale; waiting on dependencies");
            VertexState::Pending
        };

        if stale {
            self.updated.push(id.to_string());
        }
        if state == VertexState::Ready {
            self.ready.push_back(id.to_string());
        }

        self.vertices.insert(
            id.to_string(),
            VertexInfo {
                kind,
                // Fresh vertices are settled on the spot and never dispensed.
                state: if state == VertexState::Fresh {
                    VertexState::Done
                } else {
                    state
                },
                probed,
                effective: probed,
                stale,
                unmet,
            },
        );
        Ok(())
    }

    /// Take the next ready vertex and mark it `Running`.
    pub fn dispense(&mut self) -> Option<(VertexId, VertexKind)> {
        if self.finished() {
            return None;
        }
        let id = self.ready.pop_front()?;
        let info = self.vertices.get_mut(&id)?;
        info.state = VertexState::Running;
        Some((id, info.kind.clone()))
    }

    /// `Running -> Done`; returns the dependents that just became ready.
    pub fn complete(&mut self, graph: &Graph, id: &str, now: SystemTime) -> Result<Vec<VertexId>> {
        let info = self
            .vertices
            .get_mut(id)
            .ok_or_else(|| BuildError::UnknownVertex(id.to_string()))?;
        if info.state != VertexState::Running {
            return Err(BuildError::InvalidTransition {
                id: id.to_string(),
                from: info.state.name(),
                to: VertexState::Done.name(),
            });
        }
        info.state = VertexState::Done;
        info.effective = Some(now);

        if self.error {
            return Ok(Vec::new());
        }

        let mut promoted = Vec::new();
        for dependent in graph.dependents_of(id) {
            let Some(dep) = self.vertices.get_mut(dependent) else {
                // Not reachable from any active goal.
                continue;
            };
            if dep.state != VertexState::Pending {
                continue;
            }
            dep.unmet = dep.unmet.saturating_sub(1);
            if dep.unmet == 0 {
                dep.state = VertexState::Ready;
                self.ready.push_back(dependent.clone());
                promoted.push(dependent.clone());
            }
        }
        Ok(promoted)
    }

    /// `Running -> Failed`, raising the run-wide error flag.
    pub fn fail(&mut self, id: &str) -> Result<()> {
        self.error = true;
        let info = self
            .vertices
            .get_mut(id)
            .ok_or_else(|| BuildError::UnknownVertex(id.to_string()))?;
        if info.state != VertexState::Running {
            return Err(BuildError::InvalidTransition {
                id: id.to_string(),
                from: info.state.name(),
                to: VertexState::Failed.name(),
            });
        }
        info.state = VertexState::Failed;
        Ok(())
    }
}
