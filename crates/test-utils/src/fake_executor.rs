use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Local;
use tokio::sync::watch;
use tickerd::exec::{CommandExecutor, RunError, RunOutcome};

/// Shared record of what a [`FakeExecutor`] did.
#[derive(Clone)]
pub struct ExecutionLog {
    commands: Arc<Mutex<Vec<Vec<String>>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    completed_tx: Arc<watch::Sender<usize>>,
    completed_rx: watch::Receiver<usize>,
}

impl ExecutionLog {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(0);
        Self {
            commands: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            completed_tx: Arc::new(tx),
            completed_rx: rx,
        }
    }

    /// Number of `execute` calls started so far.
    pub fn runs(&self) -> usize {
        self.commands.lock().unwrap().len()
    }

    pub fn commands(&self) -> Vec<Vec<String>> {
        self.commands.lock().unwrap().clone()
    }

    /// Highest number of `execute` calls that were ever running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Wait until at least `n` runs have finished.
    pub async fn wait_for_completed(&self, n: usize) {
        let mut rx = self.completed_rx.clone();
        while *rx.borrow_and_update() < n {
            if rx.changed().await.is_err() {
                return;
            }
        }
    }

    fn enter(&self, command: &[String]) {
        self.commands.lock().unwrap().push(command.to_vec());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.completed_tx.send_modify(|n| *n += 1);
    }
}

impl Default for ExecutionLog {
    fn default() -> Self {
        Self::new()
    }
}

/// A fake executor that:
/// - records every `execute` call and how many overlap
/// - "runs" for a fixed delay without spawning anything
/// - reports success, or the next scripted result when one is queued.
pub struct FakeExecutor {
    log: ExecutionLog,
    delay: Duration,
    script: VecDeque<bool>,
    default_success: bool,
}

impl FakeExecutor {
    pub fn new(log: ExecutionLog) -> Self {
        Self {
            log,
            delay: Duration::from_millis(0),
            script: VecDeque::new(),
            default_success: true,
        }
    }

    /// How long each simulated run takes.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Results for the next runs, in order; afterwards `default_success`.
    pub fn with_script(mut self, results: &[bool]) -> Self {
        self.script = results.iter().copied().collect();
        self
    }

    /// Result of every run once the script is exhausted.
    pub fn always(mut self, success: bool) -> Self {
        self.default_success = success;
        self
    }
}

impl CommandExecutor for FakeExecutor {
    fn execute<'a>(
        &'a mut self,
        command: &'a [String],
        _timeout: Option<Duration>,
    ) -> Pin<Box<dyn Future<Output = RunOutcome> + Send + 'a>> {
        let success = self.script.pop_front().unwrap_or(self.default_success);
        let log = self.log.clone();
        let delay = self.delay;

        Box::pin(async move {
            let started_at = Local::now();
            log.enter(command);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            log.exit();

            if success {
                RunOutcome::success(started_at, delay)
            } else {
                RunOutcome::failure(started_at, delay, RunError::Exit(1))
            }
        })
    }
}
