#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use assetwatch::config::{build_orchestrator, Collaborators, ConfigFile};
use assetwatch::fs::mock::MockFileSystem;
use assetwatch::orchestrator::Orchestrator;
use assetwatch_test_utils::fake_compiler::CountingCompiler;

pub use assetwatch_test_utils::init_tracing;

/// Project root used by every mock-filesystem test.
pub const ROOT: &str = "/site";

/// `/site/<rel>`.
pub fn site(rel: &str) -> String {
    format!("{ROOT}/{rel}")
}

/// Orchestrator over a mock filesystem, with `compiler` for every style loader.
pub fn mock_orchestrator(
    cfg: &ConfigFile,
    fs: &MockFileSystem,
    compiler: &CountingCompiler,
) -> Orchestrator {
    let collab = Collaborators::default()
        .with_fs(Arc::new(fs.clone()))
        .with_style_compiler(Arc::new(compiler.clone()));
    build_orchestrator(cfg, Path::new(ROOT), &collab).expect("orchestrator from config")
}

pub fn read_string(fs: &MockFileSystem, rel: &str) -> String {
    String::from_utf8(fs.contents(site(rel)).expect("file exists")).expect("utf-8")
}
