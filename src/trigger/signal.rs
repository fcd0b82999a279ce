// src/trigger/signal.rs

//! Process signals consumed by the supervisor.
//!
//! - SIGUSR1 requests an immediate run (manual trigger).
//! - SIGTERM / SIGINT request termination of the whole supervisor.

use std::fmt;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::errors::Result;
use crate::trigger::{TriggerSource, TriggerTx};

/// Why the supervisor was asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminateReason {
    Sigterm,
    Sigint,
}

impl fmt::Display for TerminateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminateReason::Sigterm => f.write_str("SIGTERM"),
            TerminateReason::Sigint => f.write_str("SIGINT"),
        }
    }
}

/// Install the SIGUSR1 handler and forward each delivery as a manual trigger.
///
/// Signals that arrive while a manual trigger is already pending are
/// coalesced by the OS-level signal stream.
pub fn spawn_manual_trigger(tx: TriggerTx) -> Result<JoinHandle<()>> {
    let mut usr1 = signal(SignalKind::user_defined1())?;

    Ok(tokio::spawn(async move {
        while usr1.recv().await.is_some() {
            info!("SIGUSR1 received; requesting run");
            if tx.fire(TriggerSource::Manual).await.is_err() {
                debug!("scheduler gone; stopping manual trigger");
                break;
            }
        }
    }))
}

/// Install SIGTERM and SIGINT handlers.
///
/// The returned receiver yields one [`TerminateReason`] per delivered signal.
/// Handlers are installed before this function returns, so a signal sent
/// right after start-up is not lost.
pub fn listen_for_termination() -> Result<mpsc::Receiver<TerminateReason>> {
    let mut term = signal(SignalKind::terminate())?;
    let mut int = signal(SignalKind::interrupt())?;
    let (tx, rx) = mpsc::channel(1);

    tokio::spawn(async move {
        loop {
            let reason = tokio::select! {
                Some(()) = term.recv() => TerminateReason::Sigterm,
                Some(()) = int.recv() => TerminateReason::Sigint,
                else => break,
            };
            debug!(%reason, "termination signal received");
            if tx.send(reason).await.is_err() {
                break;
            }
        }
    });

    Ok(rx)
}
