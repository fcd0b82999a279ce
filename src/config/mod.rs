// src/config/mod.rs

//! Configuration resolution for `tickerd`.
//!
//! - [`model`] holds the resolved [`Config`] and health settings.
//! - [`validate`] turns raw CLI arguments into an [`Invocation`].
//! - [`duration`] parses duration flags such as `--interval 1h30m`.

pub mod duration;
pub mod model;
pub mod validate;

pub use duration::{format_duration, parse_duration};
pub use model::{Config, HealthAddr, HealthMode, Invocation};

use crate::cli::CliArgs;
use crate::errors::Result;

/// Resolve and validate CLI arguments.
pub fn resolve(args: CliArgs) -> Result<Invocation> {
    Invocation::try_from(args)
}
