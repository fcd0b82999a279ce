// src/logging.rs

//! Logging setup for `tickerd` using `tracing` + `tracing-subscriber`.
//!
//! The filter is taken from, in order:
//! 1. `--log-level` (applies to every target)
//! 2. `TICKERD_LOG`, in `EnvFilter` syntax (`debug`, `tickerd::exec=trace`)
//! 3. `info`
//!
//! Logs go to stderr. Stdout belongs to the supervised command and to the
//! `# <time>` / `+ <cmd>` invocation records.

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "TICKERD_LOG";

/// Install the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    fmt()
        .with_env_filter(resolve_filter(cli_level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))
}

/// Build the filter for `cli_level`, falling back to [`LOG_ENV`] and `info`.
pub fn resolve_filter(cli_level: Option<LogLevel>) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::new(level.as_directive());
    }
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

impl LogLevel {
    fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
