// src/orchestrator/mod.rs

//! Ordered top-level loaders and the passes that invoke them.
//!
//! A pass invokes every top-level loader in insertion order with the same
//! (optional) change descriptor. What happens after a failure is governed by
//! [`BatchFailurePolicy`].

pub mod report;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, info_span};

use crate::change::ChangeDescriptor;
use crate::errors::Result;
use crate::loader::{LoadContext, Loader, LoaderGraph, LoaderId};
use crate::types::{BatchFailurePolicy, FileEventKind};

pub use report::{LoaderFailure, PassReport};

#[derive(Debug)]
pub struct Orchestrator {
    ctx: LoadContext,
    graph: LoaderGraph,
    top_level: Vec<LoaderId>,
    policy: BatchFailurePolicy,
}

impl Orchestrator {
    pub fn new(ctx: LoadContext, graph: LoaderGraph, policy: BatchFailurePolicy) -> Self {
        Self {
            ctx,
            graph,
            top_level: Vec::new(),
            policy,
        }
    }

    /// Add a loader to the graph and append it to the top-level sequence.
    pub fn add(&mut self, loader: Loader) -> Result<LoaderId> {
        let id = self.graph.add(loader)?;
        self.top_level.push(id);
        Ok(id)
    }

    /// Append a loader already in the graph to the top-level sequence.
    pub fn add_top_level(&mut self, id: LoaderId) {
        if !self.top_level.contains(&id) {
            self.top_level.push(id);
        }
    }

    pub fn context(&self) -> &LoadContext {
        &self.ctx
    }

    pub fn graph(&self) -> &LoaderGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut LoaderGraph {
        &mut self.graph
    }

    pub fn top_level(&self) -> &[LoaderId] {
        &self.top_level
    }

    pub fn policy(&self) -> BatchFailurePolicy {
        self.policy
    }

    pub fn loader(&self, name: &str) -> Option<&Loader> {
        self.graph.id_of(name).and_then(|id| self.graph.get(id))
    }

    /// Full build: every top-level loader recomputes.
    pub fn build(&mut self) -> PassReport {
        let _span = info_span!("build").entered();
        info!(loaders = self.top_level.len(), "starting full build");
        let report = self.run_pass(None);
        report.log_summary("build");
        report
    }

    /// Incremental pass for one observed change.
    pub fn rebuild(&mut self, descriptor: &ChangeDescriptor) -> PassReport {
        let _span = info_span!("rebuild", path = ?descriptor.filepath()).entered();
        let report = self.run_pass(Some(descriptor));
        report.log_summary("rebuild");
        report
    }

    /// Turn a watcher event into a change descriptor.
    ///
    /// Relative paths are taken relative to the project root. Removed files
    /// get an absent fingerprint; anything else is read and hashed now.
    pub fn describe(&self, kind: FileEventKind, path: &Path) -> Result<ChangeDescriptor> {
        let path = self.absolute(path);
        match kind {
            FileEventKind::Removed => Ok(ChangeDescriptor::removed(path)),
            FileEventKind::Added | FileEventKind::Changed => {
                ChangeDescriptor::capture(self.ctx.fs(), self.ctx.hasher(), path, None)
            }
        }
    }

    /// Glob patterns every top-level loader depends on, transitively.
    pub fn input_paths(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.top_level
            .iter()
            .flat_map(|id| self.graph.input_paths(*id))
            .filter(|p| seen.insert(p.clone()))
            .collect()
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.ctx.resolve(path)
        }
    }

    fn run_pass(&mut self, descriptor: Option<&ChangeDescriptor>) -> PassReport {
        let mut report = PassReport::default();

        for (pos, id) in self.top_level.iter().enumerate() {
            let name = self
                .graph
                .get(*id)
                .map(|l| l.name().to_string())
                .unwrap_or_default();

            match self.graph.load(&self.ctx, *id, descriptor) {
                Ok(output) => {
                    debug!(loader = %name, empty = output.is_empty(), "loader done");
                    report.loaded.push(name);
                }
                Err(e) => {
                    report.record_failure(&name, e);
                    if self.policy == BatchFailurePolicy::FailFast {
                        report.skipped = self.top_level[pos + 1..]
                            .iter()
                            .filter_map(|id| self.graph.get(*id))
                            .map(|l| l.name().to_string())
                            .collect();
                        break;
                    }
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::change::Blake3Fingerprinter;
    use crate::errors::AssetwatchError;
    use crate::fs::mock::MockFileSystem;
    use crate::loader::{
        FontLoader, LoaderKind, PassthroughCompiler, SourcePattern, StyleLoader,
    };

    fn orchestrator(fs: &MockFileSystem, policy: BatchFailurePolicy) -> Orchestrator {
        let ctx = LoadContext::new("/proj", Arc::new(fs.clone()), Arc::new(Blake3Fingerprinter));
        Orchestrator::new(ctx, LoaderGraph::new(), policy)
    }

    fn broken_style() -> Loader {
        // partials present but no entry: FileAccess on recompute
        Loader::new(
            "styles",
            LoaderKind::Style(
                StyleLoader::new("css/main.css", &[], None, Arc::new(PassthroughCompiler)).unwrap(),
            ),
        )
    }

    fn fonts() -> Loader {
        Loader::new(
            "fonts",
            LoaderKind::Font(FontLoader::new(SourcePattern::new("fonts/*").unwrap(), None)),
        )
    }

    #[test]
    fn fail_fast_skips_the_rest_of_the_pass() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/css/_partial.css", "a{}");
        fs.add_file("/proj/fonts/A.woff", "w");

        let mut orch = orchestrator(&fs, BatchFailurePolicy::FailFast);
        orch.add(broken_style()).unwrap();
        orch.add(fonts()).unwrap();

        let report = orch.build();
        assert_eq!(report.failed_loaders(), vec!["styles"]);
        assert_eq!(report.skipped, vec!["fonts"]);
        assert!(report.loaded.is_empty());
        assert!(matches!(
            report.failures[0].error,
            AssetwatchError::FileAccess { .. }
        ));
        assert_eq!(fs.read_count("/proj/fonts/A.woff"), 0);
    }

    #[test]
    fn continue_runs_every_loader() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/css/_partial.css", "a{}");
        fs.add_file("/proj/fonts/A.woff", "w");

        let mut orch = orchestrator(&fs, BatchFailurePolicy::Continue);
        orch.add(broken_style()).unwrap();
        orch.add(fonts()).unwrap();

        let report = orch.build();
        assert_eq!(report.failed_loaders(), vec!["styles"]);
        assert_eq!(report.loaded, vec!["fonts"]);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn describe_resolves_relative_paths_and_removals() {
        let fs = MockFileSystem::new();
        fs.add_file("/proj/fonts/A.woff", "w");
        let orch = orchestrator(&fs, BatchFailurePolicy::FailFast);

        let changed = orch
            .describe(FileEventKind::Changed, Path::new("fonts/A.woff"))
            .unwrap();
        assert_eq!(changed.filepath(), Path::new("/proj/fonts/A.woff"));
        assert!(!changed.fingerprint().is_absent());

        let removed = orch
            .describe(FileEventKind::Removed, Path::new("/proj/fonts/gone.woff"))
            .unwrap();
        assert!(removed.fingerprint().is_absent());

        assert!(matches!(
            orch.describe(FileEventKind::Added, Path::new("fonts/missing.woff")),
            Err(AssetwatchError::FileAccess { .. })
        ));
    }

    #[test]
    fn input_paths_are_deduplicated_across_top_level_loaders() {
        let fs = MockFileSystem::new();
        let mut orch = orchestrator(&fs, BatchFailurePolicy::FailFast);
        orch.add(fonts()).unwrap();
        orch.add(broken_style()).unwrap();

        assert_eq!(
            orch.input_paths(),
            vec!["fonts/*", "css/main.css", "css/**/*.{scss,sass,css}"]
        );
    }
}
