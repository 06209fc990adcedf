// src/exec/action.rs

//! Pluggable action abstraction.
//!
//! Workers talk to an `ActionRunner` instead of spawning processes
//! themselves. Production code uses [`crate::exec::ToolchainRunner`]; tests
//! plug in a fake that records what ran and when.

use anyhow::Result;

use crate::dag::{Graph, WorkItem};

/// Performs the build action for one vertex.
///
/// Implementations must be safe to call from several worker threads at once;
/// the scheduler guarantees that no two calls share a vertex.
pub trait ActionRunner: Send + Sync {
    fn run(&self, item: &WorkItem, graph: &Graph) -> Result<()>;
}
