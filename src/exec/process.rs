// src/exec/process.rs

//! Thin capability layer over the raw process-signalling syscalls.
//!
//! The executor and the reaper only talk to [`ProcessHandle`] and
//! [`GroupHandle`], so the escalation policy does not care how a platform
//! models processes and groups. The `libc` calls live here and nowhere else.

use std::fmt;
use std::io;

use tracing::trace;

/// Something that can be asked to stop.
pub trait ProcessHandle: Send + Sync {
    /// Send the graceful-termination signal (SIGTERM).
    fn terminate(&self) -> io::Result<()>;
    /// Send the forceful-kill signal (SIGKILL).
    fn kill(&self) -> io::Result<()>;
}

/// A process group whose members can be collected.
pub trait GroupHandle: ProcessHandle {
    /// Group identifier, for logging.
    fn id(&self) -> i32;

    /// Block until no child of the supervisor remains in the group.
    ///
    /// This is a blocking call; run it on a blocking thread.
    fn wait_empty(&self) -> io::Result<()>;
}

/// A single process, addressed by pid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Process {
    pid: i32,
}

impl Process {
    pub fn new(pid: i32) -> Self {
        Self { pid }
    }

    pub fn pid(&self) -> i32 {
        self.pid
    }
}

impl ProcessHandle for Process {
    fn terminate(&self) -> io::Result<()> {
        send_signal(self.pid, libc::SIGTERM)
    }

    fn kill(&self) -> io::Result<()> {
        send_signal(self.pid, libc::SIGKILL)
    }
}

/// A process group, addressed by its leader's pid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessGroup {
    pgid: i32,
}

impl ProcessGroup {
    pub fn new(pgid: i32) -> Self {
        Self { pgid }
    }
}

impl ProcessHandle for ProcessGroup {
    fn terminate(&self) -> io::Result<()> {
        send_signal(-self.pgid, libc::SIGTERM)
    }

    fn kill(&self) -> io::Result<()> {
        send_signal(-self.pgid, libc::SIGKILL)
    }
}

impl GroupHandle for ProcessGroup {
    fn id(&self) -> i32 {
        self.pgid
    }

    fn wait_empty(&self) -> io::Result<()> {
        loop {
            let mut status: libc::c_int = 0;
            let rc = unsafe { libc::waitpid(-self.pgid, &mut status, 0) };
            if rc == -1 {
                let err = io::Error::last_os_error();
                match err.raw_os_error() {
                    Some(libc::ECHILD) => return Ok(()),
                    Some(libc::EINTR) => continue,
                    _ => return Err(err),
                }
            }
            trace!(pgid = self.pgid, pid = rc, "collected group member");
        }
    }
}

/// `kill(2)` wrapper. A target that no longer exists counts as success.
fn send_signal(target: i32, sig: libc::c_int) -> io::Result<()> {
    if unsafe { libc::kill(target, sig) } == -1 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ESRCH) {
            return Ok(());
        }
        return Err(err);
    }
    Ok(())
}

/// Register the supervisor as a child subreaper so that descendants
/// orphaned by a command are re-parented here and can be collected by the
/// reaper. Only Linux supports this; elsewhere it is a no-op.
#[cfg(target_os = "linux")]
pub fn become_subreaper() -> io::Result<()> {
    let one: libc::c_ulong = 1;
    if unsafe { libc::prctl(libc::PR_SET_CHILD_SUBREAPER, one) } == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
pub fn become_subreaper() -> io::Result<()> {
    Ok(())
}

/// A signal number, displayed by name the way shells report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signal(pub i32);

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.0 {
            libc::SIGHUP => "hangup",
            libc::SIGINT => "interrupt",
            libc::SIGQUIT => "quit",
            libc::SIGILL => "illegal instruction",
            libc::SIGTRAP => "trace/breakpoint trap",
            libc::SIGABRT => "aborted",
            libc::SIGBUS => "bus error",
            libc::SIGFPE => "floating point exception",
            libc::SIGKILL => "killed",
            libc::SIGUSR1 => "user defined signal 1",
            libc::SIGSEGV => "segmentation fault",
            libc::SIGUSR2 => "user defined signal 2",
            libc::SIGPIPE => "broken pipe",
            libc::SIGALRM => "alarm clock",
            libc::SIGTERM => "terminated",
            other => return write!(f, "signal {other}"),
        };
        f.write_str(name)
    }
}
