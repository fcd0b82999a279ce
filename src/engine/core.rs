// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`LoopEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading triggers and termination requests from channels
//! - running the command through the executor
//! - publishing outcomes to the health reporter
//!
//! The core is intended to be unit tested without any Tokio, channels,
//! filesystem, or processes.

use crate::engine::event_handlers::{
    handle_completion, handle_sources_closed, handle_start, handle_terminate, handle_trigger,
    CoreStep, RunLedger,
};
use crate::engine::{LoopEvent, RunId, RuntimeOptions};

/// Pure core runtime state.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    options: RuntimeOptions,
    ledger: RunLedger,
}

impl CoreRuntime {
    pub fn new(options: RuntimeOptions) -> Self {
        Self {
            options,
            ledger: RunLedger::default(),
        }
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    /// Run currently executing, if any.
    pub fn in_flight(&self) -> Option<RunId> {
        self.ledger.in_flight
    }

    /// Number of runs started so far.
    pub fn runs_started(&self) -> u64 {
        self.ledger.started
    }

    /// Number of completed runs that failed.
    pub fn runs_failed(&self) -> u64 {
        self.ledger.failed
    }

    /// Handle a single loop event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: LoopEvent) -> CoreStep {
        match event {
            LoopEvent::Started => handle_start(&mut self.ledger, &self.options),
            LoopEvent::Triggered { source } => handle_trigger(&mut self.ledger, source),
            LoopEvent::RunCompleted { success } => {
                handle_completion(&mut self.ledger, &self.options, success)
            }
            LoopEvent::TerminateRequested { reason } => handle_terminate(&self.ledger, reason),
            LoopEvent::SourcesClosed => handle_sources_closed(),
        }
    }
}
