// src/deps/extractor.rs

//! Toolchain-driven dependency extraction.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use tokio::process::Command;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::deps::parse::parse_make_rule;
use crate::errors::{BuildError, Result};
use crate::types::DepMode;

/// What the toolchain reported for one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub source: PathBuf,
    /// Artifact name the toolchain derives for the source (e.g. `a.o`).
    pub output: String,
    /// Everything the object depends on: the source itself plus every header
    /// it includes, transitively, without duplicates.
    pub dependencies: Vec<PathBuf>,
}

/// Ask `toolchain` for the dependency rule of `source`.
///
/// Paths are relative to `root`, which is also the working directory of the
/// toolchain process. Fails if the toolchain cannot run, exits non-zero
/// (e.g. an `#include` it cannot resolve), or reports a prerequisite that
/// does not exist.
pub async fn extract(
    root: &Path,
    source: &Path,
    include_dirs: &[PathBuf],
    mode: DepMode,
    toolchain: &str,
) -> Result<Extraction> {
    let fail = |reason: String| BuildError::Extraction {
        path: source.to_path_buf(),
        reason,
    };

    let mut cmd = Command::new(toolchain);
    cmd.arg(mode.flag());
    for dir in include_dirs {
        cmd.arg(format!("-I{}", dir.display()));
    }
    cmd.arg(source)
        .current_dir(root)
        .stdin(Stdio::null())
        .kill_on_drop(true);

    debug!(source = ?source, toolchain, flag = mode.flag(), "listing dependencies");
    let output = cmd
        .output()
        .await
        .map_err(|e| fail(format!("failed to run '{toolchain}': {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(fail(format!(
            "'{toolchain}' exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let rule = parse_make_rule(&stdout).map_err(|e| fail(e.to_string()))?;

    for dep in &rule.prerequisites {
        if !root.join(dep).exists() {
            return Err(fail(format!("unresolved dependency {:?}", dep)));
        }
    }

    debug!(
        source = ?source,
        output = %rule.target,
        deps = rule.prerequisites.len(),
        "dependencies listed"
    );

    Ok(Extraction {
        source: source.to_path_buf(),
        output: rule.target,
        dependencies: rule.prerequisites,
    })
}

/// Run [`extract`] over every source with at most `concurrency` toolchain
/// processes in flight.
///
/// The inputs are independent, so they complete in any order; the result is
/// sorted by source path. The first failure aborts the remaining work.
pub async fn extract_all(
    root: &Path,
    sources: Vec<PathBuf>,
    include_dirs: &[PathBuf],
    mode: DepMode,
    toolchain: &str,
    concurrency: usize,
) -> Result<Vec<Extraction>> {
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let root: Arc<Path> = Arc::from(root);
    let include_dirs: Arc<[PathBuf]> = Arc::from(include_dirs);
    let toolchain: Arc<str> = Arc::from(toolchain);
    let total = sources.len();

    let mut set = JoinSet::new();
    for source in sources {
        let permits = Arc::clone(&permits);
        let root = Arc::clone(&root);
        let include_dirs = Arc::clone(&include_dirs);
        let toolchain = Arc::clone(&toolchain);
        set.spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(anyhow::Error::from)?;
            extract(&root, &source, &include_dirs, mode, &toolchain).await
        });
    }

    let mut results = Vec::with_capacity(total);
    while let Some(joined) = set.join_next().await {
        let extraction = joined.map_err(anyhow::Error::from)??;
        results.push(extraction);
    }
    results.sort_by(|a, b| a.source.cmp(&b.source));

    info!(sources = total, "dependency extraction complete");
    Ok(results)
}
