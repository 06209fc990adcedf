// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod deps;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod store;
pub mod types;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::dag::ProbeTable;
use crate::deps::extract_all;
use crate::engine::{build_graph, discover_files, execute, record_configuration, schedule};
use crate::errors::Result;
use crate::exec::{RunReport, ToolchainRunner, clean};
use crate::store::TimestampDict;

/// One complete invocation: load the project, persist configuration,
/// extract dependencies, plan, and (unless `--dry-run`) build.
///
/// `-t clean` short-circuits everything after loading the project file.
pub async fn run(args: CliArgs) -> Result<RunReport> {
    let project_file = Path::new(&args.config);
    let root = project_root(project_file);
    let cfg = load_and_validate(project_file)?;

    if args.targets.iter().any(|t| t == "clean") {
        clean(&root, &cfg.build.out_dir)?;
        return Ok(RunReport {
            executed: 0,
            failed: false,
        });
    }

    let jobs = args.worker_count();
    info!(jobs, root = ?root, "running");

    let mut dict = TimestampDict::load(root.join(&cfg.build.state_dir))?;
    let toolchain = record_configuration(&mut dict, &cfg, &args.overrides)?;
    let dict = Arc::new(dict);

    let skip = [
        cfg.build.out_dir.as_path(),
        cfg.build.state_dir.as_path(),
        Path::new(".git"),
    ];
    let sources = discover_files(&root, &cfg.build.sources, &cfg.build.exclude, &skip)?;
    let headers = discover_files(&root, &cfg.build.headers, &cfg.build.exclude, &skip)?;
    debug!(sources = sources.len(), headers = headers.len(), "discovered files");

    let extraction_pool = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    let extractions = extract_all(
        &root,
        sources,
        &cfg.toolchain.include_dirs,
        cfg.toolchain.dep_mode,
        &toolchain.cc,
        extraction_pool,
    )
    .await?;

    let plan = build_graph(&cfg, &dict, &headers, &extractions, &args.targets)?;
    let scheduler = schedule(plan, ProbeTable::standard(&root, Arc::clone(&dict)))?;

    if args.dry_run {
        print_dry_run(&scheduler.get_updated());
        return Ok(RunReport {
            executed: 0,
            failed: false,
        });
    }

    let runner = Arc::new(ToolchainRunner::new(&root, toolchain, &cfg));
    execute(scheduler, runner, jobs).await
}

/// The project root is the directory holding the project file; a bare file
/// name means the working directory.
fn project_root(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Dry-run output: the vertices that would be rebuilt, dependencies first.
fn print_dry_run(updated: &[String]) {
    if updated.is_empty() {
        println!("buildo: nothing to do");
        return;
    }
    println!("buildo dry-run ({} to rebuild):", updated.len());
    for id in updated {
        println!("  {id}");
    }
}
