// src/loader/mod.rs

//! Loaders: units of work that turn matched source files into one artifact.
//!
//! Every loader owns a [`ResultCache`] and follows the same protocol:
//!
//! - no descriptor (full build): always recompute;
//! - descriptor for a file outside the loader's inputs: serve the cache;
//! - descriptor whose file and fingerprint are already recorded: serve the cache;
//! - anything else: reset the cache, re-read every input, recompute, write.
//!
//! Template loaders are the exception: they always re-render, after their
//! composed slots have been resolved by the [`graph::LoaderGraph`].
//!
//! The variant set is closed ([`LoaderKind`]); each variant lives in its own
//! module.

pub mod font;
pub mod graph;
pub mod image;
pub mod inline;
pub mod naming;
pub mod pattern;
pub mod style;
pub mod template;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::change::{ChangeDescriptor, Fingerprinter, ResultCache};
use crate::errors::{AssetwatchError, Result};
use crate::fs::FileSystem;

pub use font::FontLoader;
pub use graph::{LoaderGraph, LoaderId, Slot};
pub use image::ImageLoader;
pub use pattern::SourcePattern;
pub use style::{CommandCompiler, PassthroughCompiler, StyleCompiler, StyleLoader};
pub use template::{PlaceholderEngine, TemplateEngine, TemplateLoader};

/// Value produced by a loader and handed to composing loaders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// No matching inputs.
    Empty,
    Text(String),
    /// Identifier → string mapping (e.g. image identifier → data URI).
    Map(BTreeMap<String, String>),
}

impl Output {
    pub fn is_empty(&self) -> bool {
        matches!(self, Output::Empty)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Output::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Output::Map(m) => Some(m),
            _ => None,
        }
    }
}

/// Shared collaborators for a build: project root, filesystem and hasher.
#[derive(Debug, Clone)]
pub struct LoadContext {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
    hasher: Arc<dyn Fingerprinter>,
}

impl LoadContext {
    pub fn new(
        root: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
        hasher: Arc<dyn Fingerprinter>,
    ) -> Self {
        Self {
            root: root.into(),
            fs,
            hasher,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    pub fn hasher(&self) -> &dyn Fingerprinter {
        self.hasher.as_ref()
    }

    /// Resolve a root-relative path. Absolute paths (output targets outside the
    /// project) are kept as they are.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    /// Root-relative, forward-slash form of `path`.
    pub fn relative(&self, path: &Path) -> Option<String> {
        pattern::relative_str(self.fs(), &self.root, path)
    }

    /// Read one input file, fingerprint it and record it in `cache`.
    pub fn read_input(&self, cache: &mut ResultCache, path: &Path) -> Result<Vec<u8>> {
        let bytes = self
            .fs
            .read(path)
            .map_err(|e| AssetwatchError::file_access(path, e))?;
        cache.record(path, self.hasher.fingerprint(&bytes));
        Ok(bytes)
    }

    /// Write an artifact to a root-relative target.
    pub fn write_output(&self, target: &Path, contents: &[u8]) -> Result<()> {
        let path = self.resolve(target);
        self.fs
            .write(&path, contents)
            .map_err(|source| AssetwatchError::Write {
                path: path.clone(),
                source,
            })?;
        info!(path = ?path, bytes = contents.len(), "wrote artifact");
        Ok(())
    }
}

/// Closed set of loader variants.
#[derive(Debug)]
pub enum LoaderKind {
    Font(FontLoader),
    Image(ImageLoader),
    Style(StyleLoader),
    Template(TemplateLoader),
}

impl LoaderKind {
    pub fn label(&self) -> &'static str {
        match self {
            LoaderKind::Font(_) => "font",
            LoaderKind::Image(_) => "image",
            LoaderKind::Style(_) => "style",
            LoaderKind::Template(_) => "template",
        }
    }

    /// Whether a root-relative path is one of this loader's own inputs.
    pub fn is_relevant(&self, rel_path: &str) -> bool {
        match self {
            LoaderKind::Font(l) => l.source().matches_rel(rel_path),
            LoaderKind::Image(l) => l.source().matches_rel(rel_path),
            LoaderKind::Style(l) => l.is_relevant(rel_path),
            LoaderKind::Template(l) => l.entry().matches_rel(rel_path),
        }
    }

    /// Patterns this loader reads directly (not counting composed loaders).
    pub fn own_input_paths(&self) -> Vec<String> {
        match self {
            LoaderKind::Font(l) => vec![l.source().as_str().to_string()],
            LoaderKind::Image(l) => vec![l.source().as_str().to_string()],
            LoaderKind::Style(l) => l.input_paths(),
            LoaderKind::Template(l) => vec![l.entry().as_str().to_string()],
        }
    }

    pub fn output_targets(&self) -> Vec<PathBuf> {
        match self {
            LoaderKind::Font(l) => l.output().into_iter().cloned().collect(),
            LoaderKind::Image(l) => l.outputs(),
            LoaderKind::Style(l) => l.output().into_iter().cloned().collect(),
            LoaderKind::Template(l) => l.output().into_iter().cloned().collect(),
        }
    }
}

/// A named loader plus the cache it exclusively owns.
#[derive(Debug)]
pub struct Loader {
    name: String,
    kind: LoaderKind,
    cache: ResultCache,
}

impl Loader {
    pub fn new(name: impl Into<String>, kind: LoaderKind) -> Self {
        Self {
            name: name.into(),
            kind,
            cache: ResultCache::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &LoaderKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut LoaderKind {
        &mut self.kind
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    /// Decide, before doing any work, whether this load must recompute.
    pub fn should_recompute(&self, ctx: &LoadContext, descriptor: Option<&ChangeDescriptor>) -> bool {
        let Some(descriptor) = descriptor else {
            return true;
        };
        if matches!(self.kind, LoaderKind::Template(_)) {
            return true;
        }

        let Some(rel) = ctx.relative(descriptor.filepath()) else {
            return false;
        };
        if !self.kind.is_relevant(&rel) {
            debug!(loader = %self.name, path = %rel, "path outside loader inputs; serving cache");
            return false;
        }
        if self.cache.matches_prior(descriptor) {
            debug!(loader = %self.name, path = %rel, "fingerprint unchanged; serving cache");
            return false;
        }
        true
    }

    /// Run the load protocol with already-resolved composition slots.
    ///
    /// Only template loaders look at `slots`.
    pub(crate) fn load_with(
        &mut self,
        ctx: &LoadContext,
        descriptor: Option<&ChangeDescriptor>,
        slots: &BTreeMap<String, Output>,
    ) -> Result<Output> {
        if !self.should_recompute(ctx, descriptor) {
            return Ok(self.cache.last_result().cloned().unwrap_or(Output::Empty));
        }

        info!(
            loader = %self.name,
            kind = self.kind.label(),
            trigger = ?descriptor.map(ChangeDescriptor::filepath),
            "recomputing"
        );

        self.cache.reset();
        let result = match &self.kind {
            LoaderKind::Font(l) => l.recompute(ctx, &mut self.cache),
            LoaderKind::Image(l) => l.recompute(ctx, &mut self.cache),
            LoaderKind::Style(l) => l.recompute(&self.name, ctx, &mut self.cache),
            LoaderKind::Template(l) => l.recompute(&self.name, ctx, &mut self.cache, slots),
        };
        match result {
            Ok(output) => {
                self.cache.store(output.clone());
                Ok(output)
            }
            Err(e) => {
                // half-recorded inputs would make the next event for the same
                // content look unchanged
                self.cache.reset();
                Err(e)
            }
        }
    }

    /// Load a loader that composes nothing.
    ///
    /// Template loaders with loader slots must go through
    /// [`LoaderGraph::load`] so their children are resolved first.
    pub fn load(&mut self, ctx: &LoadContext, descriptor: Option<&ChangeDescriptor>) -> Result<Output> {
        let slots = match &self.kind {
            LoaderKind::Template(t) => t.literal_slots().ok_or_else(|| {
                AssetwatchError::ConfigError(format!(
                    "template loader '{}' composes other loaders; load it through its graph",
                    self.name
                ))
            })?,
            _ => BTreeMap::new(),
        };
        self.load_with(ctx, descriptor, &slots)
    }
}
