// src/health/file.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::exec::RunOutcome;
use crate::fs::FileSystem;

/// Health sentinel file.
///
/// Holds the error text of the last run while it is failing and is removed
/// once a run succeeds. An external check only needs "does the file exist".
#[derive(Debug, Clone)]
pub struct HealthFile {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl HealthFile {
    pub fn new(path: PathBuf, fs: Arc<dyn FileSystem>) -> Self {
        Self { path, fs }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self, outcome: &RunOutcome) -> Result<()> {
        match outcome.error_message() {
            Some(message) => {
                debug!(path = %self.path.display(), "writing health file");
                self.fs.write(&self.path, message.as_bytes())
            }
            None => {
                debug!(path = %self.path.display(), "clearing health file");
                self.fs.remove_file(&self.path)
            }
        }
    }

    /// Status byte a probe derives from the sentinel.
    pub fn status_byte(&self) -> u8 {
        if self.fs.exists(&self.path) {
            super::STATUS_FAILED
        } else {
            super::STATUS_OK
        }
    }
}
