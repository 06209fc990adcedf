// src/dag/probe.rs

//! Per-kind timestamp probes.
//!
//! The scheduler never looks at the filesystem itself. It asks the
//! [`ProbeTable`] for the probe registered for a vertex's [`KindTag`] and uses
//! whatever timestamp (or "missing") that probe reports.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::dag::vertex::{KindTag, VertexKind};
use crate::errors::{BuildError, Result};
use crate::store::TimestampDict;

/// Reports the current timestamp of a vertex, or `None` when it is missing.
///
/// A probe may also fail, e.g. when a path exists but is the wrong kind of
/// filesystem object. Such failures are fatal for the run.
pub trait Probe: Send + Sync {
    fn probe(&self, id: &str, kind: &VertexKind) -> Result<Option<SystemTime>>;
}

impl<F> Probe for F
where
    F: Fn(&str, &VertexKind) -> Result<Option<SystemTime>> + Send + Sync,
{
    fn probe(&self, id: &str, kind: &VertexKind) -> Result<Option<SystemTime>> {
        self(id, kind)
    }
}

/// Capability table mapping each vertex kind to its probe.
#[derive(Default)]
pub struct ProbeTable {
    probes: BTreeMap<KindTag, Box<dyn Probe>>,
}

impl fmt::Debug for ProbeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeTable")
            .field("kinds", &self.probes.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ProbeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the probe for `tag`.
    pub fn with(mut self, tag: KindTag, probe: impl Probe + 'static) -> Self {
        self.probes.insert(tag, Box::new(probe));
        self
    }

    pub fn get(&self, tag: KindTag) -> Option<&dyn Probe> {
        self.probes.get(&tag).map(|p| p.as_ref())
    }

    pub fn contains(&self, tag: KindTag) -> bool {
        self.probes.contains_key(&tag)
    }

    /// The table used for real builds: files and outputs by mtime,
    /// directories by existence, configuration entries by their recorded
    /// change time.
    pub fn standard(root: impl Into<PathBuf>, dict: Arc<TimestampDict>) -> Self {
        let root = root.into();
        Self::new()
            .with(KindTag::Source, FileProbe::new(root.clone()))
            .with(KindTag::Header, FileProbe::new(root.clone()))
            .with(KindTag::Object, FileProbe::new(root.clone()))
            .with(KindTag::MainOutput, FileProbe::new(root.clone()))
            .with(KindTag::Directory, DirectoryProbe::new(root))
            .with(KindTag::ConfigEntry, ConfigProbe::new(dict))
    }
}

/// Modification time of a regular file under `root`.
#[derive(Debug, Clone)]
pub struct FileProbe {
    root: PathBuf,
}

impl FileProbe {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl Probe for FileProbe {
    fn probe(&self, id: &str, _kind: &VertexKind) -> Result<Option<SystemTime>> {
        let path = self.root.join(id);
        let meta = match fs::metadata(&path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if !meta.is_file() {
            return Err(BuildError::WrongKind {
                path,
                expected: "regular file",
            });
        }
        Ok(Some(meta.modified()?))
    }
}

/// Directories only matter by existence, so an existing one reports the
/// epoch and never makes its dependents stale.
#[derive(Debug, Clone)]
pub struct DirectoryProbe {
    root: PathBuf,
}

impl DirectoryProbe {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl Probe for DirectoryProbe {
    fn probe(&self, id: &str, _kind: &VertexKind) -> Result<Option<SystemTime>> {
        let path = self.root.join(id);
        let meta = match fs::metadata(&path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if !meta.is_dir() {
            return Err(BuildError::WrongKind {
                path,
                expected: "directory",
            });
        }
        Ok(Some(UNIX_EPOCH))
    }
}

/// Last-change time of a persisted configuration value.
#[derive(Debug, Clone)]
pub struct ConfigProbe {
    dict: Arc<TimestampDict>,
}

impl ConfigProbe {
    pub fn new(dict: Arc<TimestampDict>) -> Self {
        Self { dict }
    }
}

impl Probe for ConfigProbe {
    fn probe(&self, id: &str, kind: &VertexKind) -> Result<Option<SystemTime>> {
        match kind {
            VertexKind::ConfigEntry { key } => Ok(self.dict.time(key)),
            other => Err(BuildError::ConfigError(format!(
                "configuration probe asked about '{id}', which is a {other}"
            ))),
        }
    }
}
