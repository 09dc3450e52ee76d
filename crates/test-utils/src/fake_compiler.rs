use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::{anyhow, bail};
use assetwatch::fs::FileSystem;
use assetwatch::loader::StyleCompiler;

/// Prefix the fake puts in front of every compiled stylesheet.
pub const COMPILED_BANNER: &str = "/* compiled */\n";

/// `StyleCompiler` that counts invocations and can be switched to fail.
///
/// Clones share counters, so a test can keep one handle and give the other
/// to the loader.
#[derive(Debug, Clone, Default)]
pub struct CountingCompiler {
    calls: Arc<AtomicUsize>,
    failing: Arc<AtomicBool>,
}

impl CountingCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl StyleCompiler for CountingCompiler {
    fn compile(&self, fs: &dyn FileSystem, entry: &Path) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            bail!("syntax error in {:?}", entry);
        }
        let bytes = fs.read(entry)?;
        let css = String::from_utf8(bytes).map_err(|e| anyhow!("not UTF-8: {e}"))?;
        Ok(format!("{COMPILED_BANNER}{css}"))
    }
}
