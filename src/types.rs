// src/types.rs

use std::str::FromStr;
use serde::Deserialize;

/// What a pass does with the remaining loaders after one of them fails.
///
/// - `FailFast`: stop the pass at the first failure; later loaders are skipped
///   for this pass (default behaviour).
/// - `Continue`: keep invoking the remaining loaders and report every failure
///   at the end of the pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchFailurePolicy {
    FailFast,
    Continue,
}

impl Default for BatchFailurePolicy {
    fn default() -> Self {
        BatchFailurePolicy::FailFast
    }
}

impl FromStr for BatchFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "fail_fast" => Ok(BatchFailurePolicy::FailFast),
            "continue" => Ok(BatchFailurePolicy::Continue),
            other => Err(format!(
                "invalid on_error: {other} (expected \"fail_fast\" or \"continue\")"
            )),
        }
    }
}

/// Kind of filesystem event delivered by the watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileEventKind {
    Added,
    Changed,
    Removed,
}

impl FileEventKind {
    pub fn from_notify(kind: &notify::EventKind) -> Option<Self> {
        match kind {
            notify::EventKind::Create(_) => Some(FileEventKind::Added),
            notify::EventKind::Modify(_) => Some(FileEventKind::Changed),
            notify::EventKind::Remove(_) => Some(FileEventKind::Removed),
            _ => None,
        }
    }
}
