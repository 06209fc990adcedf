// src/config/mod.rs

//! Project configuration for buildo.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a project file from disk (`loader.rs`).
//! - Validate names, paths and glob patterns (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{DEFAULT_CONFIG_FILE, load_and_validate, load_from_path};
pub use model::{
    BuildSection, ConfigFile, DEFAULT_VARIANT, RawConfigFile, ToolchainSection, VariantConfig,
};
