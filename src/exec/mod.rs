// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`command`] runs one invocation: process-group spawn, invocation record,
//!   timeout escalation, reaper hand-off.
//! - [`reaper`] collects whatever is left of a process group afterwards.
//! - [`orphans`] reaps descendants re-parented to the supervisor after
//!   leaving their run's group.
//! - [`process`] wraps the `libc` signalling and wait calls behind
//!   [`ProcessHandle`] / [`GroupHandle`].
//! - [`outcome`] defines [`RunOutcome`] and [`RunError`].
//! - [`backend`] provides the [`CommandExecutor`] trait and the production
//!   [`RealExecutor`]; tests replace it with a fake.

pub mod backend;
pub mod command;
pub mod orphans;
pub mod outcome;
pub mod process;
pub mod reaper;

pub use backend::{CommandExecutor, RealExecutor};
pub use command::{run_command, ExecPolicy};
pub use orphans::{collect_orphans, spawn_orphan_collector};
pub use outcome::{RunError, RunOutcome};
pub use process::{GroupHandle, Process, ProcessGroup, ProcessHandle, Signal};
pub use reaper::{reap, spawn_reaper, ReapPolicy, ReapReport};
