// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every flag can also be supplied through a `TICKERD_<FLAG>` environment
//! variable; an explicit flag wins over the environment. Values are kept as
//! raw strings here and resolved by [`crate::config::resolve`].

use clap::{Parser, ValueEnum};

/// Command-line arguments for `tickerd`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "tickerd",
    version,
    about = "Re-run a command on an interval, a cron schedule, file changes or SIGUSR1.",
    long_about = None
)]
pub struct CliArgs {
    /// Skip the run that normally happens at startup.
    #[arg(long, env = "TICKERD_SKIP_INITIAL")]
    pub skip_initial: bool,

    /// Scheduling interval, e.g. `30s`, `1h30m`.
    #[arg(long, env = "TICKERD_INTERVAL", value_name = "DURATION")]
    pub interval: Option<String>,

    /// Cron schedule (5 fields or a descriptor such as `@hourly`).
    ///
    /// Implies `--skip-initial`.
    #[arg(long, env = "TICKERD_CRON", value_name = "EXPR")]
    pub cron: Option<String>,

    /// Per-run timeout; the command gets SIGTERM, then SIGKILL 30s later.
    #[arg(long, env = "TICKERD_TIMEOUT", value_name = "DURATION")]
    pub timeout: Option<String>,

    /// Re-run whenever this path changes.
    #[arg(long, env = "TICKERD_WATCH", value_name = "PATH")]
    pub watch: Option<String>,

    /// File written with the last error, removed after a successful run.
    #[arg(long, env = "TICKERD_HEALTHCHECK_FILE", value_name = "PATH")]
    pub healthcheck_file: Option<String>,

    /// Address serving a one-byte health status (`host:port` or `:port`).
    #[arg(long, env = "TICKERD_HEALTHCHECK_ADDR", value_name = "ADDR")]
    pub healthcheck_addr: Option<String>,

    /// Probe a running instance and exit with its health status.
    #[arg(long, env = "TICKERD_HEALTHCHECK")]
    pub healthcheck: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TICKERD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Command to run, optionally preceded by `--`.
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
///
/// Parse errors print usage and exit with status 2.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
