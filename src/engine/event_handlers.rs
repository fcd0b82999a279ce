// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use tracing::{debug, error, info};

use crate::engine::{LoopExit, RunId, RuntimeOptions};
use crate::trigger::TriggerSource;
use crate::trigger::signal::TerminateReason;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreCommand {
    /// Run the command once and report back with `RunCompleted`.
    Execute {
        run_id: RunId,
        /// `None` for the startup run.
        source: Option<TriggerSource>,
    },
    /// Stop the loop.
    Exit(LoopExit),
}

/// Decision returned by the core after handling a single `LoopEvent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    /// Commands the IO shell should execute, in order.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn idle() -> Self {
        Self {
            commands: Vec::new(),
            keep_running: true,
        }
    }

    fn execute(run_id: RunId, source: Option<TriggerSource>) -> Self {
        Self {
            commands: vec![CoreCommand::Execute { run_id, source }],
            keep_running: true,
        }
    }

    fn exit(exit: LoopExit) -> Self {
        Self {
            commands: vec![CoreCommand::Exit(exit)],
            keep_running: false,
        }
    }
}

/// Per-loop bookkeeping shared by the handlers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunLedger {
    /// Run currently executing, if any.
    pub in_flight: Option<RunId>,
    pub started: u64,
    pub failed: u64,
}

impl RunLedger {
    fn begin(&mut self) -> RunId {
        self.started += 1;
        self.in_flight = Some(self.started);
        self.started
    }
}

/// Handle loop start-up: the initial run, or an immediate exit when there
/// is nothing to wait for.
pub fn handle_start(ledger: &mut RunLedger, options: &RuntimeOptions) -> CoreStep {
    if options.initial_run {
        let run_id = ledger.begin();
        info!(run_id, "starting initial run");
        return CoreStep::execute(run_id, None);
    }

    if options.exit_when_idle {
        info!("initial run skipped and no trigger sources configured; nothing to do");
        return CoreStep::exit(LoopExit::Completed);
    }

    debug!("initial run skipped; waiting for triggers");
    CoreStep::idle()
}

/// Handle a trigger fire.
///
/// The shell only reads events between runs, so a trigger never arrives
/// while a run is in flight. Should it happen anyway, it is refused rather
/// than starting an overlapping run.
pub fn handle_trigger(ledger: &mut RunLedger, source: TriggerSource) -> CoreStep {
    if let Some(active) = ledger.in_flight {
        error!(%source, active_run = active, "trigger received while a run is in flight; ignoring");
        return CoreStep::idle();
    }

    let run_id = ledger.begin();
    info!(run_id, %source, "run triggered");
    CoreStep::execute(run_id, Some(source))
}

/// Handle the end of the in-flight run.
pub fn handle_completion(
    ledger: &mut RunLedger,
    options: &RuntimeOptions,
    success: bool,
) -> CoreStep {
    let Some(run_id) = ledger.in_flight.take() else {
        error!("run completion reported with no run in flight");
        return CoreStep::idle();
    };

    if !success {
        ledger.failed += 1;
    }
    debug!(run_id, success, failed_total = ledger.failed, "run completed");

    if options.exit_when_idle {
        info!("no trigger sources configured; exiting after single run");
        return CoreStep::exit(LoopExit::Completed);
    }

    CoreStep::idle()
}

/// Handle SIGTERM / SIGINT.
///
/// The loop stops at once; an in-flight run (there can be none here, since
/// events are read between runs) and pending reapers are not waited for.
pub fn handle_terminate(ledger: &RunLedger, reason: TerminateReason) -> CoreStep {
    info!(%reason, runs = ledger.started, "termination requested; exiting");
    CoreStep::exit(LoopExit::Terminated(reason))
}

/// Handle every source disappearing.
pub fn handle_sources_closed() -> CoreStep {
    info!("all trigger sources closed; exiting");
    CoreStep::exit(LoopExit::Completed)
}
