// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod health;
pub mod logging;
pub mod trigger;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{Config, Invocation};
use crate::engine::{CoreRuntime, LoopExit, Runtime, RuntimeOptions};
use crate::errors::Result;
use crate::exec::{process::become_subreaper, spawn_orphan_collector, RealExecutor};
use crate::fs::{FileSystem, RealFileSystem};
use crate::health::HealthReporter;
use crate::trigger::signal::listen_for_termination;
use crate::trigger::{spawn_sources, trigger_channel};

/// High-level entry point used by `main.rs`.
///
/// Returns the process exit status. Configuration problems come back as
/// `Err` and map to status 2 through [`errors::TickerdError::exit_code`].
pub async fn run(args: CliArgs) -> Result<i32> {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);

    match config::resolve(args)? {
        Invocation::Probe(mode) => {
            let status = health::probe(&mode, fs).await?;
            debug!(status, "health probe finished");
            Ok(i32::from(status))
        }
        Invocation::Supervise(cfg) => {
            let exit = supervise(cfg, fs).await?;
            Ok(exit.exit_code())
        }
    }
}

/// Supervise the configured command until there is nothing left to wait for
/// or a termination signal arrives.
///
/// This wires together:
/// - the health reporter (and its TCP listener, if any)
/// - SIGTERM / SIGINT handling
/// - every configured trigger source
/// - the scheduler loop with the real process executor
///
/// Fatal configuration errors (unbindable health address, unwatchable path)
/// are returned before the first run starts.
pub async fn supervise(cfg: Config, fs: Arc<dyn FileSystem>) -> Result<LoopExit> {
    let health = HealthReporter::start(&cfg.health, fs).await?;
    let terminate = listen_for_termination()?;

    let (trigger_tx, trigger_rx) = trigger_channel();
    let sources = spawn_sources(&cfg, trigger_tx)?;

    // Keeps reaping re-parented orphans until the process exits.
    let _orphans = match become_subreaper() {
        Ok(()) => Some(spawn_orphan_collector()?),
        Err(e) => {
            warn!(error = %e, "could not become child subreaper; orphaned descendants may escape reaping");
            None
        }
    };

    let options = RuntimeOptions {
        initial_run: cfg.runs_initially(),
        exit_when_idle: !sources.has_periodic_sources(),
    };
    info!(
        initial_run = options.initial_run,
        exit_when_idle = options.exit_when_idle,
        "supervisor configured"
    );

    let runtime = Runtime::new(
        CoreRuntime::new(options),
        trigger_rx,
        terminate,
        RealExecutor::default(),
        health,
        cfg.command,
        cfg.timeout,
    );
    let exit = runtime.run().await;

    drop(sources);
    Ok(exit)
}
