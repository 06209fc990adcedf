// src/engine/mod.rs

//! Orchestration engine for buildo.
//!
//! A build runs in two phases:
//! - [`setup`]: single-threaded. Persist configuration values, discover
//!   sources and headers, and turn dependency extraction results into a
//!   [`BuildPlan`].
//! - [`runtime`]: decide staleness once, then let the worker pool drain the
//!   scheduler.

use crate::dag::{Graph, VertexId};

pub mod runtime;
pub mod setup;

pub use runtime::{execute, schedule};
pub use setup::{build_graph, discover_files, record_configuration};

/// A fully built graph plus the vertices the user asked for.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub graph: Graph,
    pub goals: Vec<VertexId>,
}
