// tests/reaper.rs

mod common;
use crate::common::{init_tracing, with_timeout, TestResult};

use std::io;
use std::os::unix::process::CommandExt;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use tickerd::exec::{reap, spawn_reaper, GroupHandle, ProcessGroup, ProcessHandle, ReapPolicy};

/// In-memory process group whose members react to signals as configured.
struct FakeGroup {
    state: Mutex<GroupState>,
    emptied: Condvar,
    survives_sigterm: bool,
    wait_error: bool,
}

#[derive(Default)]
struct GroupState {
    empty: bool,
    signals: Vec<&'static str>,
}

impl FakeGroup {
    fn new(survives_sigterm: bool) -> Self {
        Self {
            state: Mutex::new(GroupState::default()),
            emptied: Condvar::new(),
            survives_sigterm,
            wait_error: false,
        }
    }

    fn already_empty() -> Self {
        let group = Self::new(false);
        group.state.lock().unwrap().empty = true;
        group
    }

    fn failing_wait() -> Self {
        Self {
            wait_error: true,
            ..Self::new(false)
        }
    }

    fn signals(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().signals.clone()
    }

    fn record(&self, signal: &'static str, dies: bool) {
        let mut state = self.state.lock().unwrap();
        state.signals.push(signal);
        if dies {
            state.empty = true;
            self.emptied.notify_all();
        }
    }
}

impl ProcessHandle for FakeGroup {
    fn terminate(&self) -> io::Result<()> {
        self.record("TERM", !self.survives_sigterm);
        Ok(())
    }

    fn kill(&self) -> io::Result<()> {
        self.record("KILL", true);
        Ok(())
    }
}

impl GroupHandle for FakeGroup {
    fn id(&self) -> i32 {
        4242
    }

    fn wait_empty(&self) -> io::Result<()> {
        if self.wait_error {
            return Err(io::Error::other("waitpid failed"));
        }
        let mut state = self.state.lock().unwrap();
        while !state.empty {
            state = self.emptied.wait(state).unwrap();
        }
        Ok(())
    }
}

fn policy(terminate_ms: u64, kill_ms: u64) -> ReapPolicy {
    ReapPolicy {
        terminate_after: Duration::from_millis(terminate_ms),
        kill_after: Duration::from_millis(kill_ms),
    }
}

#[test]
fn default_policy_escalates_at_five_and_thirty_seconds() {
    let p = ReapPolicy::default();
    assert_eq!(p.terminate_after, Duration::from_secs(5));
    assert_eq!(p.kill_after, Duration::from_secs(30));
}

#[tokio::test]
async fn empty_group_needs_no_signals() -> TestResult {
    init_tracing();

    let group = Arc::new(FakeGroup::already_empty());
    let report = with_timeout(reap(Arc::clone(&group), policy(50, 100))).await;

    assert!(!report.terminated);
    assert!(!report.killed);
    assert!(group.signals().is_empty());
    Ok(())
}

#[tokio::test]
async fn lingering_group_gets_sigterm() -> TestResult {
    init_tracing();

    let group = Arc::new(FakeGroup::new(false));
    let report = with_timeout(reap(Arc::clone(&group), policy(50, 2_000))).await;

    assert!(report.terminated);
    assert!(!report.killed);
    assert_eq!(group.signals(), vec!["TERM"]);
    assert!(report.elapsed >= Duration::from_millis(50));
    assert!(report.elapsed < Duration::from_millis(2_000));
    Ok(())
}

#[tokio::test]
async fn group_ignoring_sigterm_gets_sigkill() -> TestResult {
    init_tracing();

    let group = Arc::new(FakeGroup::new(true));
    let report = with_timeout(reap(Arc::clone(&group), policy(50, 150))).await;

    assert!(report.terminated);
    assert!(report.killed);
    assert_eq!(group.signals(), vec!["TERM", "KILL"]);
    assert!(report.elapsed >= Duration::from_millis(150));
    Ok(())
}

#[tokio::test]
async fn wait_failure_ends_the_reap() -> TestResult {
    init_tracing();

    let group = Arc::new(FakeGroup::failing_wait());
    let report = with_timeout(reap(Arc::clone(&group), policy(1_000, 2_000))).await;

    assert!(!report.terminated);
    assert!(group.signals().is_empty());
    Ok(())
}

#[tokio::test]
async fn real_group_is_terminated_and_collected() -> TestResult {
    init_tracing();

    let child = std::process::Command::new("sleep")
        .arg("30")
        .process_group(0)
        .spawn()?;
    let pgid = child.id() as i32;

    let report = with_timeout(spawn_reaper(ProcessGroup::new(pgid), policy(100, 3_000))).await?;

    assert!(report.terminated);
    assert!(!report.killed);
    Ok(())
}

#[tokio::test]
async fn real_group_ignoring_sigterm_is_killed() -> TestResult {
    init_tracing();

    let child = std::process::Command::new("sh")
        .args(["-c", "trap '' TERM; sleep 30; sleep 30"])
        .process_group(0)
        .spawn()?;
    let pgid = child.id() as i32;

    let report = with_timeout(reap(Arc::new(ProcessGroup::new(pgid)), policy(100, 400))).await;

    assert!(report.terminated);
    assert!(report.killed);
    Ok(())
}
