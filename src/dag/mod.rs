// src/dag/mod.rs

//! Build graph representation and scheduling.
//!
//! - [`graph`] holds the directed acyclic dependency graph.
//! - [`vertex`] defines vertex ids, kinds and per-run states.
//! - [`probe`] maps vertex kinds to timestamp probes.
//! - [`scheduler`] decides what is stale and hands work to workers.
//! - [`state`] holds the per-run bookkeeping the scheduler guards.

pub mod graph;
pub mod probe;
pub mod scheduler;
mod state;
pub mod vertex;

pub use graph::{Graph, Predecessors};
pub use probe::{ConfigProbe, DirectoryProbe, FileProbe, Probe, ProbeTable};
pub use scheduler::Scheduler;
pub use vertex::{KindTag, VertexId, VertexKind, VertexState, WorkItem};
