// src/exec/mod.rs

//! Action execution layer.
//!
//! - [`action`] defines the `ActionRunner` trait workers call into.
//! - [`toolchain`] is the production runner: it creates directories and
//!   invokes the compiler to compile and link.
//! - [`worker`] holds the worker loop and the thread pool that drives it.

pub mod action;
pub mod toolchain;
pub mod worker;

pub use action::ActionRunner;
pub use toolchain::{ToolchainRunner, ToolchainSettings, clean};
pub use worker::{RunReport, run_workers, worker_loop};
