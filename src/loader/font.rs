// src/loader/font.rs

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::change::ResultCache;
use crate::errors::Result;
use crate::loader::inline::{data_uri, extension_of};
use crate::loader::naming::normalize_name;
use crate::loader::pattern::SourcePattern;
use crate::loader::{LoadContext, Output};

/// Font formats the family builder can embed.
///
/// Declaration order is the selection priority: the first format present for
/// a family wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FontFormat {
    Woff2,
    Woff,
    Ttf,
    Otf,
}

impl FontFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "woff2" => Some(FontFormat::Woff2),
            "woff" => Some(FontFormat::Woff),
            "ttf" => Some(FontFormat::Ttf),
            "otf" => Some(FontFormat::Otf),
            _ => None,
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            FontFormat::Woff2 => "font/woff2",
            FontFormat::Woff => "font/woff",
            FontFormat::Ttf => "font/ttf",
            FontFormat::Otf => "font/otf",
        }
    }

    /// Value of the CSS `format()` hint.
    pub fn css_format(self) -> &'static str {
        match self {
            FontFormat::Woff2 => "woff2",
            FontFormat::Woff => "woff",
            FontFormat::Ttf => "truetype",
            FontFormat::Otf => "opentype",
        }
    }
}

/// Builds one stylesheet mixin per font family found under `source`.
#[derive(Debug)]
pub struct FontLoader {
    source: SourcePattern,
    output: Option<PathBuf>,
}

impl FontLoader {
    pub fn new(source: SourcePattern, output: Option<PathBuf>) -> Self {
        Self { source, output }
    }

    pub fn source(&self) -> &SourcePattern {
        &self.source
    }

    pub fn output(&self) -> Option<&PathBuf> {
        self.output.as_ref()
    }

    pub(crate) fn recompute(&self, ctx: &LoadContext, cache: &mut ResultCache) -> Result<Output> {
        let files = self.source.expand(ctx.fs(), ctx.root())?;
        if files.is_empty() {
            debug!(pattern = self.source.as_str(), "no font files matched");
            return Ok(Output::Empty);
        }

        // family name -> best format seen so far and its bytes
        let mut families: BTreeMap<String, (FontFormat, Vec<u8>)> = BTreeMap::new();
        for path in &files {
            let bytes = ctx.read_input(cache, path)?;
            let Some(format) = extension_of(path).and_then(|ext| FontFormat::from_extension(&ext))
            else {
                debug!(path = ?path, "not a recognised font format; skipping");
                continue;
            };
            let name = family_name(path);

            let better = families
                .get(&name)
                .is_none_or(|(best, _)| format < *best);
            if better {
                families.insert(name, (format, bytes));
            }
        }

        let mut css = String::new();
        for (name, (format, bytes)) in &families {
            write_mixin(&mut css, name, *format, bytes);
        }

        if let Some(target) = &self.output {
            ctx.write_output(target, css.as_bytes())?;
        }
        Ok(Output::Text(css))
    }
}

fn family_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    normalize_name(&stem)
}

fn write_mixin(out: &mut String, name: &str, format: FontFormat, bytes: &[u8]) {
    let _ = writeln!(out, "@mixin font-{name} {{");
    let _ = writeln!(out, "  @font-face {{");
    let _ = writeln!(out, "    font-family: \"{name}\";");
    let _ = writeln!(
        out,
        "    src: url(\"{}\") format(\"{}\");",
        data_uri(format.mime(), bytes),
        format.css_format()
    );
    let _ = writeln!(out, "  }}");
    let _ = writeln!(out, "}}");
}
