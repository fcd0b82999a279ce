// src/exec/reaper.rs

//! Process-group reaper.
//!
//! Once a run's top-level process is gone, its group may still contain
//! descendants. The reaper collects them on a blocking thread and, if they
//! linger, escalates:
//!
//! ```text
//! WAITING --(group empty)--> DONE
//! WAITING --(terminate_after)--> SIGTERM to group, still WAITING
//! WAITING --(kill_after)-------> SIGKILL to group, still WAITING
//! ```
//!
//! There is no cap after SIGKILL; the reaper keeps waiting for the kernel to
//! confirm every member is gone.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::duration::format_duration;
use crate::exec::process::GroupHandle;

/// Escalation schedule for a reap, measured from the moment it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReapPolicy {
    pub terminate_after: Duration,
    pub kill_after: Duration,
}

impl Default for ReapPolicy {
    fn default() -> Self {
        Self {
            terminate_after: Duration::from_secs(5),
            kill_after: Duration::from_secs(30),
        }
    }
}

/// What a finished reap had to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReapReport {
    /// SIGTERM was sent to the group.
    pub terminated: bool,
    /// SIGKILL was sent to the group.
    pub killed: bool,
    pub elapsed: Duration,
}

/// Wait until `group` is empty, escalating per `policy`.
pub async fn reap<G>(group: Arc<G>, policy: ReapPolicy) -> ReapReport
where
    G: GroupHandle + 'static,
{
    let started = Instant::now();
    let pgid = group.id();
    let mut report = ReapReport::default();

    let mut collector = {
        let group = Arc::clone(&group);
        tokio::task::spawn_blocking(move || group.wait_empty())
    };

    let terminate_timer = sleep(policy.terminate_after);
    let kill_timer = sleep(policy.kill_after);
    tokio::pin!(terminate_timer, kill_timer);

    loop {
        tokio::select! {
            res = &mut collector => {
                match res {
                    Ok(Ok(())) => debug!(pgid, "process group empty"),
                    Ok(Err(e)) => warn!(pgid, error = %e, "waiting on process group failed; giving up"),
                    Err(e) => warn!(pgid, error = %e, "process group collector panicked"),
                }
                break;
            }

            _ = &mut terminate_timer, if !report.terminated => {
                report.terminated = true;
                info!(pgid, "process group still alive; sending SIGTERM");
                if let Err(e) = group.terminate() {
                    warn!(pgid, error = %e, "failed to send SIGTERM to process group");
                }
            }

            _ = &mut kill_timer, if !report.killed => {
                report.killed = true;
                warn!(pgid, "process group still alive; sending SIGKILL");
                if let Err(e) = group.kill() {
                    warn!(pgid, error = %e, "failed to send SIGKILL to process group");
                }
            }
        }
    }

    report.elapsed = started.elapsed();
    report
}

/// Detach a reap of `group`; the report is logged when it completes.
pub fn spawn_reaper<G>(group: G, policy: ReapPolicy) -> JoinHandle<ReapReport>
where
    G: GroupHandle + 'static,
{
    tokio::spawn(async move {
        let pgid = group.id();
        let report = reap(Arc::new(group), policy).await;
        debug!(
            pgid,
            terminated = report.terminated,
            killed = report.killed,
            elapsed = %format_duration(report.elapsed),
            "reap finished"
        );
        report
    })
}
