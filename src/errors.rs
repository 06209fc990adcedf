// src/errors.rs

//! Crate-wide error type and helpers.

use std::path::PathBuf;

use thiserror::Error;

use crate::dag::KindTag;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A path exists on disk but is not the filesystem kind its vertex expects.
    #[error("{path:?} exists and is not a {expected}")]
    WrongKind {
        path: PathBuf,
        expected: &'static str,
    },

    #[error("Dependency extraction failed for {path:?}: {reason}")]
    Extraction { path: PathBuf, reason: String },

    #[error("Unknown vertex: {0}")]
    UnknownVertex(String),

    #[error("Vertex '{id}' is already registered as {existing}, cannot add it as {requested}")]
    VertexConflict {
        id: String,
        existing: String,
        requested: String,
    },

    #[error("Cycle detected in build graph: {0}")]
    GraphCycle(String),

    #[error("No probe registered for vertex kind {0:?}")]
    MissingProbe(KindTag),

    #[error("Vertex '{id}' cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: &'static str,
        to: &'static str,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Broad classes of failure, used by the driver to pick messages and exit
/// behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Something on disk or in the project file is not what the build expects.
    Configuration,
    /// The toolchain could not produce a dependency listing for a source.
    Extraction,
    /// A build action failed while running.
    Execution,
    /// The driver misused the graph or scheduler.
    Contract,
}

impl BuildError {
    pub fn fault_kind(&self) -> FaultKind {
        match self {
            BuildError::ConfigError(_)
            | BuildError::WrongKind { .. }
            | BuildError::TomlError(_) => FaultKind::Configuration,
            BuildError::Extraction { .. } => FaultKind::Extraction,
            BuildError::UnknownVertex(_)
            | BuildError::VertexConflict { .. }
            | BuildError::GraphCycle(_)
            | BuildError::MissingProbe(_)
            | BuildError::InvalidTransition { .. } => FaultKind::Contract,
            BuildError::IoError(_) | BuildError::Other(_) => FaultKind::Execution,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BuildError>;
