// src/engine/runtime.rs

use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::exec::CommandExecutor;
use crate::health::HealthReporter;
use crate::trigger::signal::TerminateReason;
use crate::trigger::Trigger;

use super::core::CoreRuntime;
use super::{CoreCommand, LoopEvent, LoopExit};

/// Drives the core in response to triggers and termination requests, and
/// delegates actual command execution to a `CommandExecutor`.
///
/// This is a pure IO shell around `CoreRuntime`, which contains all the
/// loop semantics.
pub struct Runtime<E: CommandExecutor> {
    core: CoreRuntime,
    triggers: mpsc::Receiver<Trigger>,
    terminate: mpsc::Receiver<TerminateReason>,
    executor: E,
    health: HealthReporter,
    command: Vec<String>,
    timeout: Option<Duration>,
}

impl<E: CommandExecutor> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("command", &self.command)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl<E: CommandExecutor> Runtime<E> {
    pub fn new(
        core: CoreRuntime,
        triggers: mpsc::Receiver<Trigger>,
        terminate: mpsc::Receiver<TerminateReason>,
        executor: E,
        health: HealthReporter,
        command: Vec<String>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            core,
            triggers,
            terminate,
            executor,
            health,
            command,
            timeout,
        }
    }

    /// Main loop.
    ///
    /// - Waits for the next trigger or termination request.
    /// - Feeds it into the core runtime.
    /// - Executes the commands returned by the core; a run is awaited to
    ///   completion before the next event is read.
    pub async fn run(mut self) -> LoopExit {
        info!(command = ?self.command, "tickerd scheduler started");

        // Events produced by the shell itself (start-up, run completion)
        // are handled before anything from the outside.
        let mut local: VecDeque<LoopEvent> = VecDeque::from([LoopEvent::Started]);

        loop {
            let event = match local.pop_front() {
                Some(event) => event,
                None => self.next_event().await,
            };

            debug!(?event, "scheduler received event");
            let step = self.core.step(event);

            for command in step.commands {
                match command {
                    CoreCommand::Execute { run_id, source } => {
                        debug!(run_id, ?source, "executing run");
                        let success = self.execute_once().await;
                        local.push_back(LoopEvent::RunCompleted { success });
                    }
                    CoreCommand::Exit(exit) => {
                        info!(?exit, "scheduler stopping");
                        return exit;
                    }
                }
            }

            if !step.keep_running {
                info!("core requested exit; stopping scheduler");
                return LoopExit::Completed;
            }
        }
    }

    async fn execute_once(&mut self) -> bool {
        let outcome = self.executor.execute(&self.command, self.timeout).await;
        self.health.record(&outcome);
        outcome.is_success()
    }

    /// Wait for whichever comes first: termination or a trigger.
    ///
    /// Termination is checked first so that a pending trigger cannot delay
    /// it by another run.
    async fn next_event(&mut self) -> LoopEvent {
        tokio::select! {
            biased;

            Some(reason) = self.terminate.recv() => LoopEvent::TerminateRequested { reason },

            Some(trigger) = self.triggers.recv() => LoopEvent::Triggered {
                source: trigger.accept(),
            },

            else => LoopEvent::SourcesClosed,
        }
    }

    pub fn core(&self) -> &CoreRuntime {
        &self.core
    }
}
