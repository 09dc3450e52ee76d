// src/change/cache.rs

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::change::descriptor::ChangeDescriptor;
use crate::change::fingerprint::Fingerprint;
use crate::loader::Output;

/// Per-loader memo of the inputs behind the last computed output.
///
/// The check is targeted: only the file named by an incoming descriptor is
/// compared, the rest of the recorded inputs are trusted.
#[derive(Debug, Default)]
pub struct ResultCache {
    inputs: Vec<(PathBuf, Fingerprint)>,
    last_result: Option<Output>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        if !self.inputs.is_empty() {
            debug!(entries = self.inputs.len(), "resetting result cache");
        }
        self.inputs.clear();
        self.last_result = None;
    }

    /// Record one input file read during a recomputation.
    pub fn record(&mut self, path: impl Into<PathBuf>, fingerprint: Fingerprint) {
        self.inputs.push((path.into(), fingerprint));
    }

    pub fn store(&mut self, output: Output) {
        self.last_result = Some(output);
    }

    /// True if the descriptor's file is recorded with the same fingerprint.
    pub fn matches_prior(&self, descriptor: &ChangeDescriptor) -> bool {
        self.inputs.iter().any(|(path, fp)| {
            path.as_path() == descriptor.filepath() && fp == descriptor.fingerprint()
        })
    }

    pub fn inputs(&self) -> &[(PathBuf, Fingerprint)] {
        &self.inputs
    }

    pub fn fingerprint_of(&self, path: &Path) -> Option<&Fingerprint> {
        self.inputs
            .iter()
            .find(|(p, _)| p.as_path() == path)
            .map(|(_, fp)| fp)
    }

    pub fn last_result(&self) -> Option<&Output> {
        self.last_result.as_ref()
    }
}
