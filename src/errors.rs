// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::net::SocketAddr;

use thiserror::Error;

/// Exit status used for usage and configuration errors.
pub const EXIT_USAGE: i32 = 2;

#[derive(Error, Debug)]
pub enum TickerdError {
    #[error("{0}")]
    Usage(String),

    #[error("invalid duration {input:?}: {reason}")]
    InvalidDuration { input: String, reason: String },

    #[error("invalid cron expression {input:?}: {reason}")]
    InvalidCron { input: String, reason: String },

    #[error("cannot watch {path}: {source}")]
    Watch {
        path: String,
        #[source]
        source: notify::Error,
    },

    #[error("cannot listen on {addr}: {source}")]
    HealthBind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TickerdError {
    /// Process exit status for this error.
    ///
    /// Anything the operator can fix by changing flags exits with
    /// [`EXIT_USAGE`], everything else with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            TickerdError::Usage(_)
            | TickerdError::InvalidDuration { .. }
            | TickerdError::InvalidCron { .. }
            | TickerdError::Watch { .. }
            | TickerdError::HealthBind { .. } => EXIT_USAGE,
            TickerdError::IoError(_) | TickerdError::Other(_) => 1,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, TickerdError>;
