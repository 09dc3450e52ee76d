// src/engine/batch.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::debug;

use crate::types::FileEventKind;

/// File events collected during one debounce window.
///
/// Events are coalesced per path; the last kind seen for a path wins, so an
/// add followed by a remove replays as a single remove. Draining yields one
/// entry per distinct path, sorted by path.
#[derive(Debug, Default)]
pub struct EventBatch {
    pending: BTreeMap<PathBuf, FileEventKind>,
}

impl EventBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn record(&mut self, kind: FileEventKind, path: PathBuf) {
        if let Some(previous) = self.pending.insert(path.clone(), kind) {
            debug!(path = ?path, ?previous, ?kind, "coalesced file event");
        }
    }

    pub fn drain(&mut self) -> Vec<(PathBuf, FileEventKind)> {
        std::mem::take(&mut self.pending).into_iter().collect()
    }
}
