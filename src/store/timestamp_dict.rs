// src/store/timestamp_dict.rs

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::Context;
use tracing::{debug, info};

use crate::dag::VertexId;
use crate::errors::{BuildError, Result};

/// Prefix of the pseudo-vertex ids handed out by [`TimestampDict::name`].
pub const CONFIG_VERTEX_PREFIX: &str = "config:";

#[derive(Debug, Clone)]
struct Record {
    value: String,
    changed: SystemTime,
}

/// Persisted configuration values that take part in staleness like files do.
///
/// Each key is stored as one file in the backing directory: the file content
/// is the value and the file's modification time is the moment the value last
/// changed. Setting a key to the value it already has does not touch the
/// file, so an unchanged configuration never forces a rebuild.
#[derive(Debug, Clone)]
pub struct TimestampDict {
    dir: PathBuf,
    records: BTreeMap<String, Record>,
}

impl TimestampDict {
    /// Load every record from `dir`, creating the directory if needed.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating configuration store at {:?}", dir))?;

        let mut records = BTreeMap::new();
        for entry in fs::read_dir(&dir).with_context(|| format!("reading dir {:?}", dir))? {
            let entry = entry?;
            let meta = entry.metadata()?;
            if !meta.is_file() {
                continue;
            }
            let Some(key) = entry.file_name().to_str().map(str::to_string) else {
                debug!(path = ?entry.path(), "skipping non-UTF-8 record name");
                continue;
            };

            let mut value = fs::read_to_string(entry.path())
                .with_context(|| format!("reading record {:?}", entry.path()))?;
            if value.ends_with('\n') {
                value.pop();
            }
            records.insert(
                key,
                Record {
                    value,
                    changed: meta.modified()?,
                },
            );
        }

        debug!(dir = ?dir, records = records.len(), "loaded configuration store");
        Ok(Self { dir, records })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.records.get(key).map(|r| r.value.as_str())
    }

    /// Store `value` under `key`.
    ///
    /// Returns `true` if the value changed (and the record was rewritten),
    /// `false` if it was already stored.
    pub fn set(&mut self, key: &str, value: &str) -> Result<bool> {
        validate_key(key)?;
        if self.get(key) == Some(value) {
            return Ok(false);
        }

        let path = self.dir.join(key);
        // One trailing newline is the record terminator `load` strips.
        fs::write(&path, format!("{value}\n"))
            .with_context(|| format!("writing record {:?}", path))?;
        let changed = fs::metadata(&path)?.modified()?;

        info!(key, value, "configuration value changed");
        self.records.insert(
            key.to_string(),
            Record {
                value: value.to_string(),
                changed,
            },
        );
        Ok(true)
    }

    /// Stable graph vertex id standing for `key`.
    pub fn name(&self, key: &str) -> VertexId {
        format!("{CONFIG_VERTEX_PREFIX}{key}")
    }

    /// When the value of `key` last changed, or `None` if it was never set.
    pub fn time(&self, key: &str) -> Option<SystemTime> {
        self.records.get(key).map(|r| r.changed)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(|k| k.as_str())
    }
}

fn validate_key(key: &str) -> Result<()> {
    let bad = key.is_empty()
        || key == "."
        || key == ".."
        || key.contains('/')
        || key.contains('\\')
        || key.contains('\0');
    if bad {
        return Err(BuildError::ConfigError(format!(
            "'{key}' cannot be used as a configuration key"
        )));
    }
    Ok(())
}
