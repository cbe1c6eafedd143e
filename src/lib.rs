// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod types;

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::{default_config_path, load_and_validate};
use crate::dag::RequestGraph;
use crate::engine::{NodeResult, workflow_succeeded};
use crate::exec::{DriverRegistry, FileDriver, ShellDriver};
use crate::types::{ExecutionMode, OperationType};

/// High-level entry point used by `main.rs`.
///
/// Loads the workflow file, builds the request graph, and either prints it
/// (`--dry-run`) or executes it in the configured mode and prints one line
/// per step.
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = args
        .config
        .as_deref()
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);
    let cfg = load_and_validate(&config_path)?;

    let mut graph = RequestGraph::from_config(&cfg);
    let removed = graph.dedup_edges();
    if removed > 0 {
        debug!(removed, "dropped duplicate dependencies");
    }

    if args.dry_run {
        println!("{}", graph.visualize());
        debug!("dry-run complete (no execution)");
        return Ok(());
    }

    let mode = args.mode.map(ExecutionMode::from).unwrap_or(cfg.config().mode);
    let max_workers = args.max_workers.or(cfg.config().max_workers);
    let drivers = default_drivers(&config_root_dir(&config_path));

    info!(%mode, steps = graph.len(), "executing workflow");
    let results = match mode {
        ExecutionMode::Sequential => graph.execute_sequential(&drivers).await?,
        ExecutionMode::Parallel => graph.execute_parallel(&drivers, max_workers).await?,
    };

    print_report(&results);

    if !workflow_succeeded(&results) {
        bail!("workflow failed");
    }
    Ok(())
}

/// Drivers for the built-in step kinds.
///
/// Relative paths in shell and file steps resolve against the directory
/// holding the workflow file.
fn default_drivers(root: &Path) -> DriverRegistry {
    DriverRegistry::new()
        .register(OperationType::Shell, ShellDriver::new().with_default_cwd(root))
        .register(OperationType::File, FileDriver::real().with_root(root))
}

/// Directory holding the workflow file, or `.` for a bare file name.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn print_report(results: &[NodeResult]) {
    for r in results {
        match r.result.error_message.as_deref() {
            Some(err) if !r.result.success => {
                let first_line = err.lines().next().unwrap_or("");
                println!("{}: {} ({first_line})", r.node_id, r.status);
            }
            _ => println!("{}: {}", r.node_id, r.status),
        }
    }
}
