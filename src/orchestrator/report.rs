// src/orchestrator/report.rs

use tracing::{error, info, warn};

use crate::errors::AssetwatchError;

/// One loader failure inside a pass.
#[derive(Debug)]
pub struct LoaderFailure {
    pub loader: String,
    pub error: AssetwatchError,
}

/// Outcome of one build or rebuild pass over the top-level loaders.
#[derive(Debug, Default)]
pub struct PassReport {
    /// Loaders that completed, in invocation order.
    pub loaded: Vec<String>,
    pub failures: Vec<LoaderFailure>,
    /// Loaders not invoked because an earlier one failed under `fail_fast`.
    pub skipped: Vec<String>,
}

impl PassReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_loaders(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.loader.as_str()).collect()
    }

    pub(crate) fn record_failure(&mut self, loader: &str, error: AssetwatchError) {
        error!(loader = %loader, error = %error, "loader failed");
        self.failures.push(LoaderFailure {
            loader: loader.to_string(),
            error,
        });
    }

    /// Emit the end-of-pass summary.
    pub(crate) fn log_summary(&self, label: &str) {
        if self.is_success() {
            info!(pass = label, loaded = self.loaded.len(), "pass complete");
            return;
        }
        if !self.skipped.is_empty() {
            warn!(pass = label, skipped = ?self.skipped, "pass aborted; remaining loaders skipped");
        }
        warn!(
            pass = label,
            loaded = self.loaded.len(),
            failed = ?self.failed_loaders(),
            "pass finished with failures"
        );
    }
}
