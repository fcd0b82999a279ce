// src/trigger/mod.rs

//! Trigger sources and the channel they share with the scheduler loop.
//!
//! Every source (interval, cron, filesystem watch, SIGUSR1) holds a
//! [`TriggerTx`] and calls [`TriggerTx::fire`]. Delivery is a rendezvous:
//! `fire` only returns once the scheduler loop has taken the trigger, so a
//! source has at most one notification outstanding and stalls while a run is
//! in progress. Nothing is dropped and nothing piles up.
//!
//! - [`interval`] fires on a fixed period.
//! - [`cron`] parses schedules and fires on their occurrences.
//! - [`watcher`] wraps `notify` and fires once per filesystem event.
//! - [`signal`] turns SIGUSR1 into manual triggers and SIGTERM/SIGINT into
//!   termination requests.

pub mod cron;
pub mod interval;
pub mod signal;
pub mod watcher;

use std::fmt;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::info;

use crate::config::Config;
use crate::errors::Result;

pub use self::cron::CronSchedule;
pub use watcher::WatcherHandle;

/// Which source produced a trigger. Used for logging only; the scheduler
/// treats every fire the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    /// SIGUSR1 from an operator.
    Manual,
    Interval,
    Cron,
    FileWatch,
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TriggerSource::Manual => "manual",
            TriggerSource::Interval => "interval",
            TriggerSource::Cron => "cron",
            TriggerSource::FileWatch => "watch",
        };
        f.write_str(name)
    }
}

/// A single "run now" request travelling to the scheduler loop.
#[derive(Debug)]
pub struct Trigger {
    source: TriggerSource,
    ack: oneshot::Sender<()>,
}

impl Trigger {
    pub fn source(&self) -> TriggerSource {
        self.source
    }

    /// Take the trigger, releasing the producer that sent it.
    pub fn accept(self) -> TriggerSource {
        // The producer may already be gone (e.g. its task was aborted).
        let _ = self.ack.send(());
        self.source
    }
}

/// Error returned by [`TriggerTx::fire`] once the scheduler loop is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerClosed;

impl fmt::Display for SchedulerClosed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("scheduler loop is no longer receiving triggers")
    }
}

impl std::error::Error for SchedulerClosed {}

/// Producer side of the trigger channel.
#[derive(Debug, Clone)]
pub struct TriggerTx {
    tx: mpsc::Sender<Trigger>,
}

impl TriggerTx {
    /// Deliver a trigger and wait until the scheduler loop has taken it.
    pub async fn fire(&self, source: TriggerSource) -> std::result::Result<(), SchedulerClosed> {
        let (ack, accepted) = oneshot::channel();
        self.tx
            .send(Trigger { source, ack })
            .await
            .map_err(|_| SchedulerClosed)?;
        accepted.await.map_err(|_| SchedulerClosed)
    }
}

/// Create the trigger channel.
///
/// The queue has a single slot; together with the acknowledgement in
/// [`TriggerTx::fire`] this behaves like an unbuffered channel.
pub fn trigger_channel() -> (TriggerTx, mpsc::Receiver<Trigger>) {
    let (tx, rx) = mpsc::channel(1);
    (TriggerTx { tx }, rx)
}

/// Running trigger sources.
///
/// Keeps the filesystem watcher alive and owns the source tasks; dropping
/// the set stops every source.
#[derive(Debug, Default)]
pub struct TriggerSet {
    tasks: Vec<JoinHandle<()>>,
    watcher: Option<WatcherHandle>,
    periodic: bool,
}

impl TriggerSet {
    /// Whether any interval, cron or watch source is running.
    ///
    /// Without one, the scheduler has nothing to wait for after the first run.
    pub fn has_periodic_sources(&self) -> bool {
        self.periodic
    }

    pub fn len(&self) -> usize {
        self.tasks.len() + usize::from(self.watcher.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for TriggerSet {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Start every source the configuration asks for.
///
/// The filesystem watch is registered first so that an unwatchable path is
/// reported before anything else is running. The manual trigger is always
/// installed.
pub fn spawn_sources(config: &Config, tx: TriggerTx) -> Result<TriggerSet> {
    let mut set = TriggerSet::default();

    if let Some(path) = &config.watch_path {
        set.watcher = Some(watcher::spawn_watcher(path, tx.clone())?);
        set.periodic = true;
    }

    if let Some(schedule) = &config.cron {
        set.tasks
            .push(self::cron::spawn_cron_source(schedule.clone(), tx.clone()));
        set.periodic = true;
    }

    if let Some(period) = config.interval {
        set.tasks.push(interval::spawn_interval_source(period, tx.clone()));
        set.periodic = true;
    }

    set.tasks.push(signal::spawn_manual_trigger(tx)?);

    info!(
        sources = set.len(),
        periodic = set.periodic,
        "trigger sources started"
    );
    Ok(set)
}
