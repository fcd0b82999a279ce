// src/trigger/watcher.rs

use std::path::{Path, PathBuf};

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::{Result, TickerdError};
use crate::trigger::{TriggerSource, TriggerTx};

/// Events buffered between the notify thread and the forwarding task.
pub const EVENT_QUEUE: usize = 1;

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive. Dropping this handle
/// stops file watching and the forwarding task.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
    path: PathBuf,
    forwarder: JoinHandle<()>,
}

impl WatcherHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("path", &self.path)
            .finish()
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}

/// Register a non-recursive watch on `path` and fire one trigger per
/// filesystem event.
///
/// Registration errors (missing path, permission denied) are returned as
/// [`TickerdError::Watch`]. Events are not debounced: a burst of N events
/// asks for up to N runs, each one waiting its turn at the scheduler. At
/// most [`EVENT_QUEUE`] events plus the one being delivered are held in
/// memory; the notify thread blocks behind them.
pub fn spawn_watcher(path: impl AsRef<Path>, tx: TriggerTx) -> Result<WatcherHandle> {
    let path = path.as_ref().to_path_buf();
    let watch_error = |source: notify::Error| TickerdError::Watch {
        path: path.display().to_string(),
        source,
    };

    // The notify thread blocks on a full queue, so a burst of events stalls
    // at the producer instead of piling up while a run is in progress.
    let (event_tx, mut event_rx) = mpsc::channel::<Event>(EVENT_QUEUE);

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                // Only fails once the forwarder is gone, i.e. during shutdown.
                let _ = event_tx.blocking_send(event);
            }
            Err(err) => warn!(error = %err, "file watch error"),
        },
        Config::default(),
    )
    .map_err(watch_error)?;

    watcher
        .watch(&path, RecursiveMode::NonRecursive)
        .map_err(watch_error)?;

    info!(path = %path.display(), "file watcher started");

    let forwarder = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!(kind = ?event.kind, paths = ?event.paths, "received notify event");
            if tx.fire(TriggerSource::FileWatch).await.is_err() {
                warn!("scheduler gone; dropping remaining file events");
                break;
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle {
        _inner: watcher,
        path,
        forwarder,
    })
}
