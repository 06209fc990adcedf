// src/exec/toolchain.rs

//! Compile and link commands for C toolchains.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result, anyhow, bail};
use tracing::{debug, info};

use crate::config::ConfigFile;
use crate::dag::{Graph, VertexKind, WorkItem};
use crate::exec::action::ActionRunner;

/// Compiler and per-variant flags resolved for one run.
///
/// Link flags already carry the `-L<dir>` and `-l<lib>` arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolchainSettings {
    pub cc: String,
    pub cflags: BTreeMap<String, Vec<String>>,
    pub ldflags: BTreeMap<String, Vec<String>>,
}

/// Runs real toolchain processes for object, output and directory vertices.
#[derive(Debug, Clone)]
pub struct ToolchainRunner {
    root: PathBuf,
    include_dirs: Vec<PathBuf>,
    settings: ToolchainSettings,
}

impl ToolchainRunner {
    pub fn new(root: impl Into<PathBuf>, settings: ToolchainSettings, cfg: &ConfigFile) -> Self {
        Self {
            root: root.into(),
            include_dirs: cfg.toolchain.include_dirs.clone(),
            settings,
        }
    }

    fn flags<'a>(table: &'a BTreeMap<String, Vec<String>>, variant: &str) -> Result<&'a [String]> {
        table
            .get(variant)
            .map(Vec::as_slice)
            .ok_or_else(|| anyhow!("unknown build variant '{variant}'"))
    }

    /// `cc -c -o <obj> <src> <cflags...> -I<dir>...`
    pub fn compile_command(&self, object: &str, source: &str, variant: &str) -> Result<Command> {
        let cflags = Self::flags(&self.settings.cflags, variant)?;
        let mut cmd = Command::new(&self.settings.cc);
        cmd.arg("-c").arg("-o").arg(object).arg(source);
        cmd.args(cflags);
        for dir in &self.include_dirs {
            cmd.arg(format!("-I{}", dir.display()));
        }
        Ok(cmd)
    }

    /// `cc <objects...> -o <out> <ldflags...> -L<dir>... -l<lib>...`
    pub fn link_command(&self, output: &str, objects: &[&str], variant: &str) -> Result<Command> {
        let ldflags = Self::flags(&self.settings.ldflags, variant)?;
        let mut cmd = Command::new(&self.settings.cc);
        cmd.args(objects).arg("-o").arg(output);
        cmd.args(ldflags);
        Ok(cmd)
    }

    fn execute(&self, id: &str, mut cmd: Command) -> Result<()> {
        cmd.current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        info!(vertex = %id, cmd = ?cmd, "running");

        let output = cmd
            .output()
            .with_context(|| format!("spawning toolchain for '{id}'"))?;

        for line in String::from_utf8_lossy(&output.stderr).lines() {
            debug!(vertex = %id, "stderr: {}", line);
        }
        if !output.status.success() {
            bail!("building '{id}' failed ({})", output.status);
        }
        Ok(())
    }
}

impl ActionRunner for ToolchainRunner {
    fn run(&self, item: &WorkItem, graph: &Graph) -> Result<()> {
        let id = item.id.as_str();
        match &item.kind {
            VertexKind::Directory => {
                let path = self.root.join(id);
                info!(vertex = %id, "creating directory");
                fs::create_dir_all(&path).with_context(|| format!("creating {:?}", path))
            }
            VertexKind::Object { variant } => {
                let mut sources = graph
                    .get_direct_predecessors(id)?
                    .filter(|p| matches!(graph.kind_of(p), Ok(VertexKind::Source)));
                let source = sources
                    .next()
                    .ok_or_else(|| anyhow!("object '{id}' has no source file"))?;
                if let Some(extra) = sources.next() {
                    bail!("object '{id}' has more than one source ('{source}', '{extra}')");
                }
                let cmd = self.compile_command(id, source, variant)?;
                self.execute(id, cmd)
            }
            VertexKind::MainOutput { variant } => {
                let objects: Vec<&str> = graph
                    .get_direct_predecessors(id)?
                    .filter(|p| matches!(graph.kind_of(p), Ok(VertexKind::Object { .. })))
                    .collect();
                let cmd = self.link_command(id, &objects, variant)?;
                self.execute(id, cmd)
            }
            VertexKind::Source | VertexKind::Header => {
                bail!("no rule to make '{id}' (file is missing)")
            }
            VertexKind::ConfigEntry { key } => {
                bail!("configuration key '{key}' is not set")
            }
        }
    }
}

/// Remove a build output directory, ignoring one that is already gone.
pub fn clean(root: &Path, out_dir: &Path) -> Result<()> {
    let path = root.join(out_dir);
    match fs::remove_dir_all(&path) {
        Ok(()) => {
            info!(path = ?path, "removed build output");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("removing {:?}", path)),
    }
}
