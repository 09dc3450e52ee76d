// src/loader/style.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use tracing::debug;

use crate::change::ResultCache;
use crate::errors::{AssetwatchError, Result};
use crate::fs::FileSystem;
use crate::loader::pattern::SourcePattern;
use crate::loader::{LoadContext, Output};

/// File types that count as stylesheet sources when none are configured.
pub const DEFAULT_STYLE_EXTENSIONS: &[&str] = &["scss", "sass", "css"];

/// External stylesheet compiler.
///
/// Given the absolute path of an entry file, produce the compiled CSS. The
/// compiler is expected to follow imports itself.
pub trait StyleCompiler: Send + Sync + fmt::Debug {
    fn compile(&self, fs: &dyn FileSystem, entry: &Path) -> anyhow::Result<String>;
}

/// Returns the entry file unchanged (plain CSS projects).
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughCompiler;

impl StyleCompiler for PassthroughCompiler {
    fn compile(&self, fs: &dyn FileSystem, entry: &Path) -> anyhow::Result<String> {
        let bytes = fs
            .read(entry)
            .with_context(|| format!("reading stylesheet {:?}", entry))?;
        String::from_utf8(bytes).map_err(|e| anyhow!("stylesheet {:?} is not UTF-8: {e}", entry))
    }
}

/// Runs an external program and captures its stdout as the compiled CSS.
///
/// Any `{entry}` in the arguments is replaced with the entry path, e.g.
/// `["sass", "--no-source-map", "{entry}"]`.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    program: String,
    args: Vec<String>,
}

impl CommandCompiler {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl StyleCompiler for CommandCompiler {
    fn compile(&self, _fs: &dyn FileSystem, entry: &Path) -> anyhow::Result<String> {
        let entry_str = entry.to_string_lossy();
        let args: Vec<String> = self
            .args
            .iter()
            .map(|a| a.replace("{entry}", &entry_str))
            .collect();

        debug!(program = %self.program, ?args, "running stylesheet compiler");
        let output = Command::new(&self.program)
            .args(&args)
            .output()
            .with_context(|| format!("spawning {}", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("{} exited with {}: {}", self.program, output.status, stderr.trim());
        }

        String::from_utf8(output.stdout)
            .map_err(|e| anyhow!("{} produced non UTF-8 output: {e}", self.program))
    }
}

/// Compiles one entry stylesheet.
///
/// The entry usually imports many other files, so any stylesheet-like file
/// under the entry's directory is treated as an input: all of them are
/// fingerprinted on recompute, and an event for any of them can trigger one.
pub struct StyleLoader {
    entry: SourcePattern,
    related: SourcePattern,
    output: Option<PathBuf>,
    compiler: Arc<dyn StyleCompiler>,
}

impl fmt::Debug for StyleLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StyleLoader")
            .field("entry", &self.entry)
            .field("related", &self.related)
            .field("output", &self.output)
            .finish_non_exhaustive()
    }
}

impl StyleLoader {
    pub fn new(
        entry: &str,
        extensions: &[String],
        output: Option<PathBuf>,
        compiler: Arc<dyn StyleCompiler>,
    ) -> Result<Self> {
        let entry = SourcePattern::new(entry)?;
        let related = related_pattern(entry.as_str(), extensions);
        Ok(Self {
            entry,
            related: SourcePattern::new(related)?,
            output,
            compiler,
        })
    }

    pub fn entry(&self) -> &SourcePattern {
        &self.entry
    }

    pub fn output(&self) -> Option<&PathBuf> {
        self.output.as_ref()
    }

    pub fn is_relevant(&self, rel_path: &str) -> bool {
        if self.is_own_output(Path::new(rel_path)) {
            return false;
        }
        self.entry.matches_rel(rel_path) || self.related.matches_rel(rel_path)
    }

    /// The compiled artifact can sit under the related glob; it is never an input.
    fn is_own_output(&self, rel_path: &Path) -> bool {
        self.output
            .as_deref()
            .is_some_and(|target| target.strip_prefix(".").unwrap_or(target) == rel_path)
    }

    pub fn input_paths(&self) -> Vec<String> {
        vec![self.entry.as_str().to_string(), self.related.as_str().to_string()]
    }

    pub(crate) fn recompute(
        &self,
        loader: &str,
        ctx: &LoadContext,
        cache: &mut ResultCache,
    ) -> Result<Output> {
        let entry_path = ctx.resolve(Path::new(self.entry.as_str()));
        let mut inputs = self.related.expand(ctx.fs(), ctx.root())?;
        if let Some(target) = &self.output {
            let target = ctx.resolve(target);
            inputs.retain(|path| *path != target);
        }
        if ctx.fs().is_file(&entry_path) && !inputs.contains(&entry_path) {
            inputs.push(entry_path.clone());
            inputs.sort();
        }
        if inputs.is_empty() {
            debug!(entry = self.entry.as_str(), "no stylesheet sources found");
            return Ok(Output::Empty);
        }
        if !inputs.contains(&entry_path) {
            return Err(AssetwatchError::file_access(
                &entry_path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "entry stylesheet missing"),
            ));
        }

        for path in &inputs {
            ctx.read_input(cache, path)?;
        }

        let css = self
            .compiler
            .compile(ctx.fs(), &entry_path)
            .map_err(|e| AssetwatchError::compile(loader, format!("{e:#}")))?;

        if let Some(target) = &self.output {
            ctx.write_output(target, css.as_bytes())?;
        }
        Ok(Output::Text(css))
    }
}

/// `styles/main.scss` + `[scss, css]` -> `styles/**/*.{scss,css}`.
fn related_pattern(entry: &str, extensions: &[String]) -> String {
    let exts: Vec<&str> = if extensions.is_empty() {
        DEFAULT_STYLE_EXTENSIONS.to_vec()
    } else {
        extensions.iter().map(String::as_str).collect()
    };
    let ext_glob = match exts.as_slice() {
        [single] => (*single).to_string(),
        many => format!("{{{}}}", many.join(",")),
    };

    let dir = Path::new(entry)
        .parent()
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default();
    if dir.is_empty() {
        format!("**/*.{ext_glob}")
    } else {
        format!("{dir}/**/*.{ext_glob}")
    }
}
