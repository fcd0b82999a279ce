// src/exec/backend.rs

//! Pluggable executor abstraction.
//!
//! The scheduler loop talks to a [`CommandExecutor`] instead of spawning
//! processes itself. Production code uses [`RealExecutor`]; tests swap in a
//! fake that records calls and never touches the OS.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use super::command::{run_command, ExecPolicy};
use super::outcome::RunOutcome;

/// Trait abstracting how one run of the command is carried out.
pub trait CommandExecutor: Send {
    /// Run `command` to completion.
    ///
    /// The returned future resolves once the top-level process has exited
    /// and its group has been handed off for reaping. A failing command is
    /// reported through [`RunOutcome::error`], never as a panic or `Err`.
    fn execute<'a>(
        &'a mut self,
        command: &'a [String],
        timeout: Option<Duration>,
    ) -> Pin<Box<dyn Future<Output = RunOutcome> + Send + 'a>>;
}

/// Executor that spawns real processes.
#[derive(Debug, Clone, Default)]
pub struct RealExecutor {
    policy: ExecPolicy,
}

impl RealExecutor {
    pub fn new(policy: ExecPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ExecPolicy {
        &self.policy
    }
}

impl CommandExecutor for RealExecutor {
    fn execute<'a>(
        &'a mut self,
        command: &'a [String],
        timeout: Option<Duration>,
    ) -> Pin<Box<dyn Future<Output = RunOutcome> + Send + 'a>> {
        Box::pin(run_command(command, timeout, &self.policy))
    }
}
