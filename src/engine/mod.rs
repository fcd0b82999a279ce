// src/engine/mod.rs

//! Scheduler loop for tickerd.
//!
//! This module ties together:
//! - the trigger channel fed by every trigger source
//! - the termination signal
//! - the command executor
//! - the health reporter
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`]. Exactly one run is in flight at any time:
//! the shell awaits each run before it looks at the next event, so triggers
//! that arrive meanwhile wait in their producers.

use crate::trigger::signal::TerminateReason;
use crate::trigger::TriggerSource;

/// Sequential number of a run, starting at 1.
pub type RunId = u64;

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeOptions {
    /// Run the command once as soon as the loop starts.
    pub initial_run: bool,
    /// Stop after the first run completes (or straight away when there is
    /// no initial run). Set when no interval, cron or watch source exists.
    pub exit_when_idle: bool,
}

/// Events consumed by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopEvent {
    /// The loop has just started.
    Started,
    /// A trigger source asked for a run.
    Triggered { source: TriggerSource },
    /// The in-flight run returned.
    RunCompleted { success: bool },
    /// SIGTERM / SIGINT.
    TerminateRequested { reason: TerminateReason },
    /// Every event source has gone away.
    SourcesClosed,
}

/// Why the scheduler loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// Nothing left to do.
    Completed,
    /// A termination signal arrived.
    Terminated(TerminateReason),
}

impl LoopExit {
    /// Process exit status for this way of stopping.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoopExit::Completed => 0,
            LoopExit::Terminated(_) => 1,
        }
    }
}

pub mod core;
pub mod event_handlers;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use runtime::Runtime;
