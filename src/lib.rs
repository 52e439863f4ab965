// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::{debug, info, info_span, warn};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::dag::Scheduler;
use crate::engine::Maker;
use crate::exec::Executor;
use crate::watch::WatchOutcome;
use crate::watch::path_utils::from_cwd;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (again on every reload)
/// - the shared executor
/// - one-shot builds (`--once`) or the watch / reload loop
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);

    if args.dry_run {
        let cfg = load_and_validate(&config_path)?;
        let root = project_root(&args, &cfg, &config_path);
        return print_dry_run(&cfg, &root);
    }

    if args.once {
        return run_once(&args, &config_path).await;
    }

    // Ctrl-C → stop watching. Installed only in watch mode so that `--once`
    // keeps the default signal behaviour.
    let (interrupt_tx, interrupt_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {e}");
            return;
        }
        let _ = interrupt_tx.send(true);
    });

    let mut cfg = load_and_validate(&config_path)?;
    let executor = new_executor(&args, &cfg)?;

    loop {
        let root = project_root(&args, &cfg, &config_path);
        let maker = Maker::new(cfg.build_tasks(&root)?, Arc::clone(&executor));
        let outcome = maker
            .watch(&cfg.watch_options(&root), interrupted(interrupt_rx.clone()))
            .await?;

        match outcome {
            WatchOutcome::Reload => {
                info!("reloading build configuration");
                cfg = load_and_validate(&config_path)?;
            }
            WatchOutcome::Exit => {
                info!("build configuration changed; exiting");
                maker.close().await?;
                return Ok(());
            }
            WatchOutcome::StopWatching => {
                maker.close().await?;
                return Ok(());
            }
        }
    }
}

async fn run_once(args: &CliArgs, config_path: &Path) -> Result<()> {
    let cfg = load_and_validate(config_path)?;
    let root = project_root(args, &cfg, config_path);
    let maker = Maker::new(cfg.build_tasks(&root)?, new_executor(args, &cfg)?);

    let result = maker.make_async().await;
    maker.close().await?;

    let (_, report) = result?;
    report.log();
    if !report.is_success() {
        bail!("build failed: {report}");
    }
    Ok(())
}

fn new_executor(args: &CliArgs, cfg: &ConfigFile) -> Result<Arc<Executor>> {
    let jobs = args.jobs.unwrap_or_else(|| cfg.jobs());
    debug!(jobs, "creating executor");
    Ok(Executor::with_span(jobs, info_span!("executor"))?)
}

/// `--directory` wins over `[config].directory`. The result is absolute;
/// relative paths are resolved against the working directory.
fn project_root(args: &CliArgs, cfg: &ConfigFile, config_path: &Path) -> PathBuf {
    let root = match &args.directory {
        Some(dir) => dir.clone(),
        None => cfg.root_dir(config_path),
    };
    from_cwd(&root)
}

/// Resolves once the interrupt flag is raised.
async fn interrupted(mut rx: tokio::sync::watch::Receiver<bool>) {
    if rx.wait_for(|stop| *stop).await.is_err() {
        // Sender gone without an interrupt: never resolve.
        std::future::pending::<()>().await;
    }
}

/// Print tasks in build order with their backend and sources.
fn print_dry_run(cfg: &ConfigFile, root: &Path) -> Result<()> {
    let scheduler = Scheduler::new().load(cfg.build_tasks(root)?);

    println!("flue dry-run");
    println!("  root = {}", root.display());
    println!("  jobs = {}", cfg.jobs());
    if let Some(ref patterns) = cfg.config().reload_patterns {
        println!("  reload_patterns = {patterns:?}");
    }
    if !cfg.config().restart_patterns.is_empty() {
        println!("  restart_patterns = {:?}", cfg.config().restart_patterns);
    }
    println!();

    println!("tasks ({}), in build order:", scheduler.graph().len());
    for task in scheduler.graph().toposort() {
        let task = task?;
        println!("  - {}", task.artifact());
        if let Some(spec) = cfg.tasks().get(task.artifact()) {
            println!("      compiler: {}", spec.compiler);
            if let Some(ref cmd) = spec.cmd {
                println!("      cmd: {cmd}");
            }
            if !spec.flags.is_empty() {
                println!("      flags: {:?}", spec.flags);
            }
        }
        if !task.sources().is_empty() {
            println!("      sources: {:?}", task.sources());
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}
