// src/config/loader.rs

use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// File name looked for when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "Buildo.toml";

/// Read and deserialize a project file without semantic checks.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    Ok(toml::from_str(&text)?)
}

/// Read a project file and turn it into a validated [`ConfigFile`].
///
/// A project without a file builds with the defaults (sources `**/*.c`,
/// headers in `inc/`, output `out/collect`).
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    if !path.exists() {
        debug!(path = ?path, "no project file; using defaults");
        return ConfigFile::try_from(RawConfigFile::default());
    }
    ConfigFile::try_from(load_from_path(path)?)
}
