// src/store/mod.rs

//! State that survives between runs.
//!
//! Build artifacts persist on disk by themselves; the only other thing a run
//! remembers is the set of configuration values in [`TimestampDict`].

pub mod timestamp_dict;

pub use timestamp_dict::{CONFIG_VERTEX_PREFIX, TimestampDict};
