// src/exec/outcome.rs

use std::io;
use std::time::Duration;

use chrono::{DateTime, Local};
use thiserror::Error;

use crate::exec::process::Signal;

/// Why a run counts as failed.
///
/// These are expected outcomes of supervising an arbitrary command, not
/// supervisor faults: they are printed, published to the health reporter and
/// otherwise ignored.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to start {program:?}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("exit status {0}")]
    Exit(i32),

    #[error("signal: {0}")]
    Signaled(Signal),

    #[error("waiting for command: {0}")]
    Wait(#[source] io::Error),
}

/// Result of one invocation of the supervised command.
#[derive(Debug)]
pub struct RunOutcome {
    /// Wall-clock time the run started.
    pub started_at: DateTime<Local>,
    pub duration: Duration,
    /// The per-run timeout expired and the command was signalled.
    pub timed_out: bool,
    pub error: Option<RunError>,
}

impl RunOutcome {
    pub fn success(started_at: DateTime<Local>, duration: Duration) -> Self {
        Self {
            started_at,
            duration,
            timed_out: false,
            error: None,
        }
    }

    pub fn failure(started_at: DateTime<Local>, duration: Duration, error: RunError) -> Self {
        Self {
            started_at,
            duration,
            timed_out: false,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Error text as published to health checks, if the run failed.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }
}
