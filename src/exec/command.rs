// src/exec/command.rs

//! Running one invocation of the supervised command.

use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::duration::format_duration;
use crate::exec::orphans::spawn_leader;
use crate::exec::outcome::{RunError, RunOutcome};
use crate::exec::process::{Process, ProcessGroup, ProcessHandle, Signal};
use crate::exec::reaper::{spawn_reaper, ReapPolicy};

/// Timing knobs for a run's escalation ladders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecPolicy {
    /// Delay between SIGTERM and SIGKILL once the run timeout expires.
    pub kill_grace: Duration,
    /// Escalation schedule for the process-group reaper.
    pub reap: ReapPolicy,
}

impl Default for ExecPolicy {
    fn default() -> Self {
        Self {
            kill_grace: Duration::from_secs(30),
            reap: ReapPolicy::default(),
        }
    }
}

/// Run `args` once and report how it went.
///
/// The command becomes the leader of a fresh process group and inherits the
/// supervisor's stdio. After the top-level process exits, the group is
/// handed to a detached reaper whatever the exit reason was.
pub async fn run_command(
    args: &[String],
    timeout: Option<Duration>,
    policy: &ExecPolicy,
) -> RunOutcome {
    let started_at = Local::now();
    let clock = Instant::now();

    print_invocation(started_at, args);

    let mut timed_out = false;
    let result = spawn_and_wait(args, timeout, policy, &mut timed_out).await;
    let duration = clock.elapsed();

    let mut outcome = match result {
        Ok(()) => RunOutcome::success(started_at, duration),
        Err(err) => {
            println!("{err}");
            RunOutcome::failure(started_at, duration, err)
        }
    };
    outcome.timed_out = timed_out;

    info!(
        success = outcome.is_success(),
        timed_out,
        duration = %format_duration(duration),
        "run finished"
    );
    outcome
}

/// Print the `# <time>` / `+ <command>` record that precedes every run.
fn print_invocation(started_at: DateTime<Local>, args: &[String]) {
    println!();
    println!("# {}", started_at.format("%a %b %e %H:%M:%S %Y"));
    println!("+ {}", args.join(" "));
}

async fn spawn_and_wait(
    args: &[String],
    timeout: Option<Duration>,
    policy: &ExecPolicy,
    timed_out: &mut bool,
) -> Result<(), RunError> {
    let Some((program, rest)) = args.split_first() else {
        return Err(RunError::Spawn {
            program: String::new(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"),
        });
    };

    let mut cmd = Command::new(program);
    cmd.args(rest)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .process_group(0);

    let (mut child, leader) = spawn_leader(&mut cmd).map_err(|source| RunError::Spawn {
        program: program.clone(),
        source,
    })?;
    let pid = leader.pid();
    debug!(pid, program = %program, "command started");

    let deadline = timeout.map(|t| Deadline::arm(Process::new(pid), t, policy.kill_grace));

    let status = child.wait().await;
    drop(leader);

    if let Some(deadline) = deadline {
        *timed_out = deadline.disarm();
    }

    // Descendants may outlive the leader; collect them in the background.
    spawn_reaper(ProcessGroup::new(pid), policy.reap);

    classify(status.map_err(RunError::Wait)?)
}

fn classify(status: ExitStatus) -> Result<(), RunError> {
    if status.success() {
        return Ok(());
    }
    match (status.code(), status.signal()) {
        (Some(code), _) => Err(RunError::Exit(code)),
        (None, Some(sig)) => Err(RunError::Signaled(Signal(sig))),
        (None, None) => Err(RunError::Exit(-1)),
    }
}

/// One-shot run timeout: SIGTERM at expiry, SIGKILL `grace` later.
struct Deadline {
    task: JoinHandle<()>,
    fired: Arc<AtomicBool>,
}

impl Deadline {
    fn arm<P>(process: P, timeout: Duration, grace: Duration) -> Self
    where
        P: ProcessHandle + 'static,
    {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);

        let task = tokio::spawn(async move {
            sleep(timeout).await;
            flag.store(true, Ordering::SeqCst);

            warn!(timeout = %format_duration(timeout), "run timed out; sending SIGTERM");
            if let Err(e) = process.terminate() {
                warn!(error = %e, "failed to send SIGTERM to command");
            }

            sleep(grace).await;

            warn!(grace = %format_duration(grace), "command ignored SIGTERM; sending SIGKILL");
            if let Err(e) = process.kill() {
                warn!(error = %e, "failed to send SIGKILL to command");
            }
        });

        Self { task, fired }
    }

    /// Cancel any pending escalation. Returns whether the timeout had expired.
    fn disarm(self) -> bool {
        self.task.abort();
        self.fired.load(Ordering::SeqCst)
    }
}
