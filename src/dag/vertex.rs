// src/dag/vertex.rs

//! Vertex identity, kind and per-run state.

use std::fmt;

/// Canonical vertex identifier: a path relative to the project root, or a
/// logical name for configuration entries (see `TimestampDict::name`).
pub type VertexId = String;

/// What a vertex stands for.
///
/// Each variant carries exactly the data its probe and its build action
/// need, so neither side has to guess from the id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VertexKind {
    /// A hand-written translation unit.
    Source,
    /// A header discovered by dependency extraction or by globbing.
    Header,
    /// An output directory that must exist before anything is written into it.
    Directory,
    /// An object file compiled for one build variant.
    Object { variant: String },
    /// The final linked artifact of one build variant.
    MainOutput { variant: String },
    /// A persisted configuration value (see `store::TimestampDict`).
    ConfigEntry { key: String },
}

impl VertexKind {
    pub fn tag(&self) -> KindTag {
        match self {
            VertexKind::Source => KindTag::Source,
            VertexKind::Header => KindTag::Header,
            VertexKind::Directory => KindTag::Directory,
            VertexKind::Object { .. } => KindTag::Object,
            VertexKind::MainOutput { .. } => KindTag::MainOutput,
            VertexKind::ConfigEntry { .. } => KindTag::ConfigEntry,
        }
    }

    /// Variant name for per-variant vertices.
    pub fn variant(&self) -> Option<&str> {
        match self {
            VertexKind::Object { variant } | VertexKind::MainOutput { variant } => Some(variant),
            _ => None,
        }
    }
}

impl fmt::Display for VertexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VertexKind::Source => write!(f, "source"),
            VertexKind::Header => write!(f, "header"),
            VertexKind::Directory => write!(f, "directory"),
            VertexKind::Object { variant } => write!(f, "object[{variant}]"),
            VertexKind::MainOutput { variant } => write!(f, "main output[{variant}]"),
            VertexKind::ConfigEntry { key } => write!(f, "config entry[{key}]"),
        }
    }
}

/// Fieldless discriminant of [`VertexKind`], used as the probe-table key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KindTag {
    Source,
    Header,
    Directory,
    Object,
    MainOutput,
    ConfigEntry,
}

impl KindTag {
    pub const ALL: [KindTag; 6] = [
        KindTag::Source,
        KindTag::Header,
        KindTag::Directory,
        KindTag::Object,
        KindTag::MainOutput,
        KindTag::ConfigEntry,
    ];
}

/// Per-run state of a vertex.
///
/// Transitions only move forward:
/// `Unevaluated -> Fresh -> Done` for vertices that are already up to date,
/// `Unevaluated -> Pending -> Ready -> Running -> Done | Failed` for stale ones
/// (`Ready` is entered directly when no predecessor is stale).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexState {
    Unevaluated,
    Fresh,
    /// Stale, waiting on at least one stale predecessor.
    Pending,
    Ready,
    Running,
    Done,
    Failed,
}

impl VertexState {
    pub fn name(self) -> &'static str {
        match self {
            VertexState::Unevaluated => "Unevaluated",
            VertexState::Fresh => "Fresh",
            VertexState::Pending => "Pending",
            VertexState::Ready => "Ready",
            VertexState::Running => "Running",
            VertexState::Done => "Done",
            VertexState::Failed => "Failed",
        }
    }
}

/// A vertex handed to exactly one worker: the id plus the kind that selects
/// its action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub id: VertexId,
    pub kind: VertexKind,
}
