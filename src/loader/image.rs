// src/loader/image.rs

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::PathBuf;

use tracing::debug;

use crate::change::ResultCache;
use crate::errors::{AssetwatchError, Result};
use crate::loader::inline::{data_uri, extension_of, image_mime};
use crate::loader::naming::{common_ancestor, normalize_name};
use crate::loader::pattern::SourcePattern;
use crate::loader::{LoadContext, Output};

/// Inlines every matched image as a data URI keyed by a normalized identifier.
///
/// Identifiers come from each file's path relative to the deepest directory
/// shared by all matched files, so `img/sub/b.png` under `img/` is `sub_b_png`.
/// The manifest is written as a stylesheet map and as JSON, and returned as
/// [`Output::Map`] for composing loaders.
#[derive(Debug)]
pub struct ImageLoader {
    source: SourcePattern,
    map_name: String,
    scss_output: Option<PathBuf>,
    json_output: Option<PathBuf>,
}

impl ImageLoader {
    pub fn new(source: SourcePattern, map_name: impl Into<String>) -> Self {
        Self {
            source,
            map_name: map_name.into(),
            scss_output: None,
            json_output: None,
        }
    }

    pub fn with_scss_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.scss_output = Some(path.into());
        self
    }

    pub fn with_json_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.json_output = Some(path.into());
        self
    }

    pub fn source(&self) -> &SourcePattern {
        &self.source
    }

    pub fn map_name(&self) -> &str {
        &self.map_name
    }

    pub fn outputs(&self) -> Vec<PathBuf> {
        self.scss_output
            .iter()
            .chain(self.json_output.iter())
            .cloned()
            .collect()
    }

    pub(crate) fn recompute(&self, ctx: &LoadContext, cache: &mut ResultCache) -> Result<Output> {
        let files = self.source.expand(ctx.fs(), ctx.root())?;
        if files.is_empty() {
            debug!(pattern = self.source.as_str(), "no images matched");
            return Ok(Output::Empty);
        }

        let ancestor = common_ancestor(&files);
        let mut manifest = BTreeMap::new();
        for path in &files {
            let bytes = ctx.read_input(cache, path)?;
            let Some(mime) = extension_of(path).and_then(|ext| image_mime(&ext)) else {
                debug!(path = ?path, "unrecognised image type; dropping");
                continue;
            };
            let rel = path.strip_prefix(&ancestor).unwrap_or(path.as_path());
            let id = normalize_name(&rel.to_string_lossy());
            manifest.insert(id, data_uri(mime, &bytes));
        }

        if let Some(target) = &self.scss_output {
            ctx.write_output(target, render_scss(&self.map_name, &manifest).as_bytes())?;
        }
        if let Some(target) = &self.json_output {
            let json = serde_json::to_string_pretty(&manifest)
                .map_err(|e| AssetwatchError::Other(e.into()))?;
            ctx.write_output(target, json.as_bytes())?;
        }

        Ok(Output::Map(manifest))
    }
}

/// Stylesheet syntax: one variable per image plus a map of all of them.
fn render_scss(map_name: &str, manifest: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (id, uri) in manifest {
        let _ = writeln!(out, "${id}: \"{uri}\";");
    }
    let _ = writeln!(out, "${map_name}: (");
    for id in manifest.keys() {
        let _ = writeln!(out, "  \"{id}\": ${id},");
    }
    let _ = writeln!(out, ");");
    out
}
