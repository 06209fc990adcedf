// src/engine/setup.rs

//! Single-threaded setup phase: persist configuration, discover files and
//! assemble the build graph.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::ConfigFile;
use crate::dag::{Graph, VertexId, VertexKind};
use crate::deps::Extraction;
use crate::engine::BuildPlan;
use crate::errors::{BuildError, Result};
use crate::exec::ToolchainSettings;
use crate::store::TimestampDict;

/// Compiler used when neither the project file nor the store names one.
pub const DEFAULT_CC: &str = "gcc";

/// Store key holding the compiler driver.
pub const CC_KEY: &str = "cc";

pub fn cflags_key(variant: &str) -> String {
    format!("cflags.{variant}")
}

pub fn ldflags_key(variant: &str) -> String {
    format!("ldflags.{variant}")
}

/// Write every configuration value that affects build outputs into `dict`.
///
/// Each key is written at most once per run, so values that did not change
/// keep their old timestamps. `overrides` win over the project file. Returns
/// the compiler and flags to build with.
pub fn record_configuration(
    dict: &mut TimestampDict,
    cfg: &ConfigFile,
    overrides: &[(String, String)],
) -> Result<ToolchainSettings> {
    let mut desired: BTreeMap<String, String> = BTreeMap::new();
    match &cfg.toolchain.cc {
        Some(cc) => {
            desired.insert(CC_KEY.to_string(), cc.clone());
        }
        None if !dict.contains(CC_KEY) => {
            desired.insert(CC_KEY.to_string(), DEFAULT_CC.to_string());
        }
        None => {}
    }

    let mut settings = ToolchainSettings::default();
    for (name, vc) in cfg.variant.iter() {
        let mut link: Vec<String> = vc.ldflags.clone();
        link.extend(vc.lib_dirs.iter().map(|d| format!("-L{}", d.display())));
        link.extend(vc.libs.iter().map(|l| format!("-l{l}")));

        desired.insert(cflags_key(name), vc.cflags.join(" "));
        desired.insert(ldflags_key(name), link.join(" "));
        settings.cflags.insert(name.clone(), vc.cflags.clone());
        settings.ldflags.insert(name.clone(), link);
    }

    for (key, value) in overrides {
        desired.insert(key.clone(), value.clone());
        for name in cfg.variant.keys() {
            if *key == cflags_key(name) {
                settings.cflags.insert(name.clone(), split_flags(value));
            } else if *key == ldflags_key(name) {
                settings.ldflags.insert(name.clone(), split_flags(value));
            }
        }
    }

    for (key, value) in &desired {
        dict.set(key, value)?;
    }

    settings.cc = dict.get(CC_KEY).unwrap_or(DEFAULT_CC).to_string();
    debug!(cc = %settings.cc, keys = dict.keys().count(), "configuration recorded");
    Ok(settings)
}

fn split_flags(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            BuildError::ConfigError(format!("invalid glob pattern '{pattern}': {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| BuildError::ConfigError(format!("building glob set: {e}")))
}

/// Files under `root` matching `patterns` and not `exclude`, as sorted paths
/// relative to `root`. Directories in `skip` (relative to `root`) are not
/// descended into.
pub fn discover_files(
    root: &Path,
    patterns: &[String],
    exclude: &[String],
    skip: &[&Path],
) -> Result<Vec<PathBuf>> {
    let include = build_globset(patterns)?;
    let exclude = build_globset(exclude)?;
    let skip: Vec<PathBuf> = skip.iter().map(|p| root.join(p)).collect();

    let mut found = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !skip.iter().any(|s| e.path() == s.as_path()));

    for entry in walker {
        let entry = entry.with_context(|| format!("walking {:?}", root))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(root) else {
            continue;
        };
        if include.is_match(rel) && !exclude.is_match(rel) {
            found.push(rel.to_path_buf());
        }
    }

    found.sort();
    Ok(found)
}

fn path_id(path: &Path) -> VertexId {
    path.to_string_lossy().into_owned()
}

/// Assemble the build graph for every variant and pick the goal vertices
/// for `targets` (all variants when empty).
///
/// For each variant the graph holds:
/// - the variant directory, depending on the output directory;
/// - one object per source, depending on the directory, the source, every
///   header it includes, the compiler and the variant's compile flags;
/// - the linked output, depending on every object, the compiler and the
///   variant's link flags.
pub fn build_graph(
    cfg: &ConfigFile,
    dict: &TimestampDict,
    headers: &[PathBuf],
    extractions: &[Extraction],
    targets: &[String],
) -> Result<BuildPlan> {
    if extractions.is_empty() {
        return Err(BuildError::ConfigError(format!(
            "no source files match {:?}",
            cfg.build.sources
        )));
    }

    let mut graph = Graph::new();

    let out_id = path_id(&cfg.build.out_dir);
    graph.add_vertex(out_id.clone(), VertexKind::Directory)?;

    let cc_id = dict.name(CC_KEY);
    graph.add_vertex(
        cc_id.clone(),
        VertexKind::ConfigEntry {
            key: CC_KEY.to_string(),
        },
    )?;

    for header in headers {
        graph.add_vertex(path_id(header), VertexKind::Header)?;
    }
    for ex in extractions {
        graph.add_vertex(path_id(&ex.source), VertexKind::Source)?;
    }

    let mut mains: HashMap<&str, VertexId> = HashMap::new();

    for name in cfg.variant_names() {
        let dir = cfg.variant_dir(name);
        let dir_id = path_id(&dir);
        if dir_id != out_id {
            graph.add_vertex(dir_id.clone(), VertexKind::Directory)?;
            graph.add_edge(&dir_id, &out_id)?;
        }

        let cflags_id = config_vertex(&mut graph, dict, &cflags_key(name))?;
        let ldflags_id = config_vertex(&mut graph, dict, &ldflags_key(name))?;

        let main_id = path_id(&dir.join(&cfg.build.output));
        graph.add_vertex(
            main_id.clone(),
            VertexKind::MainOutput {
                variant: name.to_string(),
            },
        )?;
        graph.add_edges(&main_id, [&cc_id, &ldflags_id])?;

        let mut produced_by: HashMap<VertexId, &Path> = HashMap::new();
        for ex in extractions {
            let obj_id = path_id(&dir.join(&ex.output));
            if let Some(other) = produced_by.insert(obj_id.clone(), &ex.source) {
                return Err(BuildError::ConfigError(format!(
                    "{:?} and {:?} both produce '{obj_id}'",
                    other, ex.source
                )));
            }

            graph.add_vertex(
                obj_id.clone(),
                VertexKind::Object {
                    variant: name.to_string(),
                },
            )?;
            graph.add_edge(&obj_id, &dir_id)?;
            graph.add_edge(&obj_id, &path_id(&ex.source))?;
            for dep in &ex.dependencies {
                let dep_id = path_id(dep);
                if !graph.contains(&dep_id) {
                    // Headers outside the glob patterns, e.g. system headers.
                    graph.add_vertex(dep_id.clone(), VertexKind::Header)?;
                }
                graph.add_edge(&obj_id, &dep_id)?;
            }
            graph.add_edges(&obj_id, [&cc_id, &cflags_id])?;
            graph.add_edge(&main_id, &obj_id)?;
        }

        mains.insert(name, main_id);
    }

    let goals = if targets.is_empty() {
        cfg.variant_names().filter_map(|n| mains.get(n).cloned()).collect()
    } else {
        targets
            .iter()
            .map(|t| {
                mains.get(t.as_str()).cloned().ok_or_else(|| {
                    BuildError::ConfigError(format!(
                        "unknown target '{t}' (variants: {})",
                        cfg.variant_names().collect::<Vec<_>>().join(", ")
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?
    };

    info!(
        vertices = graph.len(),
        sources = extractions.len(),
        goals = ?goals,
        "build graph assembled"
    );
    Ok(BuildPlan { graph, goals })
}

fn config_vertex(graph: &mut Graph, dict: &TimestampDict, key: &str) -> Result<VertexId> {
    let id = dict.name(key);
    graph.add_vertex(
        id.clone(),
        VertexKind::ConfigEntry {
            key: key.to_string(),
        },
    )?;
    Ok(id)
}
