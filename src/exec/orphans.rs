// src/exec/orphans.rs

//! Collection of re-parented orphans.
//!
//! Once the supervisor is a child subreaper, descendants that leave a run's
//! process group (`setsid`, double-forking daemons) are re-parented here when
//! their own parent dies. The group reaper never sees them, so a SIGCHLD
//! driven collector reaps every exited child except the leaders that are
//! still owned by a `tokio::process::Child`.
//!
//! Leaders are registered under the same lock the collector holds while it
//! reaps, so a leader that exits immediately after spawning can never be
//! collected from under its owner.

use std::collections::BTreeSet;
use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::process::{Child, Command};
use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::errors::Result;

/// Pids of run leaders whose exit status belongs to their `Child`.
static LEADERS: Mutex<BTreeSet<i32>> = Mutex::new(BTreeSet::new());

/// Retry delay while an owned leader is blocking the collection queue.
const BLOCKED_RETRY: Duration = Duration::from_millis(100);

fn leaders() -> MutexGuard<'static, BTreeSet<i32>> {
    LEADERS.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Registration of a spawned run leader. Dropping it releases the pid to
/// the orphan collector.
#[derive(Debug)]
pub struct LeaderGuard {
    pid: i32,
}

impl LeaderGuard {
    pub fn pid(&self) -> i32 {
        self.pid
    }
}

impl Drop for LeaderGuard {
    fn drop(&mut self) {
        leaders().remove(&self.pid);
    }
}

/// Spawn `cmd` and register the child as an owned leader.
pub fn spawn_leader(cmd: &mut Command) -> io::Result<(Child, LeaderGuard)> {
    let mut owned = leaders();
    let child = cmd.spawn()?;
    let pid = child
        .id()
        .map(|id| id as i32)
        .ok_or_else(|| io::Error::other("spawned child has no pid"))?;
    owned.insert(pid);
    Ok((child, LeaderGuard { pid }))
}

/// Result of one collection pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Collection {
    pub reaped: usize,
    /// An owned leader is the next exited child; others may wait behind it.
    pub blocked: bool,
}

/// Reap every exited child that is not an owned leader. Never blocks.
pub fn collect_orphans() -> Collection {
    let owned = leaders();
    let mut pass = Collection::default();

    while let Some(pid) = peek_exited_child() {
        if owned.contains(&pid) {
            pass.blocked = true;
            break;
        }
        reap_exact(pid);
        trace!(pid, "collected orphan");
        pass.reaped += 1;
    }
    pass
}

/// Collect orphans on every SIGCHLD for the life of the supervisor.
pub fn spawn_orphan_collector() -> Result<JoinHandle<()>> {
    let mut sigchld = signal(SignalKind::child())?;

    Ok(tokio::spawn(async move {
        loop {
            let pass = collect_orphans();
            if pass.reaped > 0 {
                debug!(reaped = pass.reaped, "collected re-parented orphans");
            }

            if pass.blocked {
                tokio::time::sleep(BLOCKED_RETRY).await;
                continue;
            }
            if sigchld.recv().await.is_none() {
                break;
            }
        }
    }))
}

/// Pid of some exited, not yet reaped child, leaving it reapable.
#[cfg(target_os = "linux")]
fn peek_exited_child() -> Option<i32> {
    let mut info: libc::siginfo_t = unsafe { std::mem::zeroed() };
    let rc = unsafe {
        libc::waitid(
            libc::P_ALL,
            0,
            &mut info,
            libc::WEXITED | libc::WNOHANG | libc::WNOWAIT,
        )
    };
    if rc == -1 {
        return None;
    }
    let pid = unsafe { info.si_pid() };
    (pid > 0).then_some(pid)
}

#[cfg(not(target_os = "linux"))]
fn peek_exited_child() -> Option<i32> {
    None
}

fn reap_exact(pid: i32) {
    let mut status: libc::c_int = 0;
    // Someone else may have collected it in the meantime; either way it is gone.
    unsafe { libc::waitpid(pid, &mut status, libc::WNOHANG) };
}
