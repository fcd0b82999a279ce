// src/health/mod.rs

//! Health reporting for the most recent run.
//!
//! The last outcome lives in a `tokio::sync::watch` cell. The scheduler loop
//! owns the only [`HealthWriter`]; probe connections hold [`HealthReader`]s.
//! On top of that cell sit the two external surfaces:
//!
//! - [`file`]: a sentinel file that exists iff the last run failed.
//! - [`probe`]: a TCP endpoint answering with a single status byte, and the
//!   client used by `tickerd --healthcheck`.

pub mod file;
pub mod probe;

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::HealthMode;
use crate::errors::Result;
use crate::exec::RunOutcome;
use crate::fs::FileSystem;

pub use file::HealthFile;
pub use probe::{probe, ProbeServer};

/// Status byte for "healthy or not yet run".
pub const STATUS_OK: u8 = 0;
/// Status byte for "last run failed".
pub const STATUS_FAILED: u8 = 1;

/// Summary of the last completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastRun {
    pub started_at: DateTime<Local>,
    /// Error text when the run failed.
    pub error: Option<String>,
}

/// The published "last known status".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthStatus {
    last: Option<LastRun>,
}

impl HealthStatus {
    pub fn last_run(&self) -> Option<&LastRun> {
        self.last.as_ref()
    }

    pub fn is_failing(&self) -> bool {
        self.last.as_ref().is_some_and(|run| run.error.is_some())
    }

    /// Byte served to probe connections.
    pub fn status_byte(&self) -> u8 {
        if self.is_failing() {
            STATUS_FAILED
        } else {
            STATUS_OK
        }
    }
}

/// Sole writer of the health cell.
#[derive(Debug)]
pub struct HealthWriter {
    tx: watch::Sender<HealthStatus>,
}

impl HealthWriter {
    /// Replace the published status with the result of `outcome`.
    pub fn publish(&self, outcome: &RunOutcome) {
        self.tx.send_replace(HealthStatus {
            last: Some(LastRun {
                started_at: outcome.started_at,
                error: outcome.error_message(),
            }),
        });
    }

    pub fn reader(&self) -> HealthReader {
        HealthReader {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read-only view of the health cell; cheap to clone.
#[derive(Debug, Clone)]
pub struct HealthReader {
    rx: watch::Receiver<HealthStatus>,
}

impl HealthReader {
    pub fn current(&self) -> HealthStatus {
        self.rx.borrow().clone()
    }

    pub fn status_byte(&self) -> u8 {
        self.rx.borrow().status_byte()
    }
}

/// Create an empty health cell (no run yet).
pub fn health_channel() -> (HealthWriter, HealthReader) {
    let (tx, rx) = watch::channel(HealthStatus::default());
    (HealthWriter { tx }, HealthReader { rx })
}

/// Everything that publishes run outcomes.
#[derive(Debug)]
pub struct HealthReporter {
    writer: HealthWriter,
    sentinel: Option<HealthFile>,
    server: Option<ProbeServer>,
}

impl HealthReporter {
    /// Reporter that only keeps the in-memory cell.
    pub fn in_memory() -> Self {
        let (writer, _reader) = health_channel();
        Self {
            writer,
            sentinel: None,
            server: None,
        }
    }

    /// Set up the configured surface.
    ///
    /// In TCP mode the listener is bound here; a bind failure is returned as
    /// a fatal configuration error.
    pub async fn start(mode: &HealthMode, fs: Arc<dyn FileSystem>) -> Result<Self> {
        let mut reporter = Self::in_memory();

        match mode {
            HealthMode::Disabled => debug!("health reporting disabled"),
            HealthMode::File(path) => {
                info!(path = %path.display(), "health file sentinel enabled");
                reporter.sentinel = Some(HealthFile::new(path.clone(), fs));
            }
            HealthMode::Tcp(addr) => {
                let server = ProbeServer::bind(addr.listen_addr(), reporter.reader()).await?;
                reporter.server = Some(server);
            }
        }

        Ok(reporter)
    }

    /// Publish the outcome of a finished run.
    pub fn record(&mut self, outcome: &RunOutcome) {
        self.writer.publish(outcome);

        if let Some(sentinel) = &self.sentinel {
            if let Err(e) = sentinel.record(outcome) {
                warn!(path = %sentinel.path().display(), error = %e, "failed to update health file");
            }
        }
    }

    pub fn reader(&self) -> HealthReader {
        self.writer.reader()
    }

    /// Address the probe listener is bound to, in TCP mode.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.as_ref().map(ProbeServer::local_addr)
    }
}
