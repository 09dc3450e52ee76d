// tests/cache_behaviour.rs

mod common;
use crate::common::{init_tracing, mock_orchestrator, read_string, site};

use std::collections::BTreeMap;
use std::path::Path;

use assetwatch::change::{Blake3Fingerprinter, Fingerprinter};
use assetwatch::config::ConfigFile;
use assetwatch::fs::mock::MockFileSystem;
use assetwatch::loader::Output;
use assetwatch::loader::inline::data_uri;
use assetwatch::types::FileEventKind;
use assetwatch_test_utils::builders::{ConfigFileBuilder, LoaderConfigBuilder};
use assetwatch_test_utils::fake_compiler::CountingCompiler;

fn three_loaders() -> ConfigFile {
    ConfigFileBuilder::new()
        .with_loader(
            LoaderConfigBuilder::font("fonts", "fonts/*")
                .output("build/_fonts.scss")
                .build(),
        )
        .with_loader(
            LoaderConfigBuilder::image("images", "img/**/*")
                .json_output("build/images.json")
                .build(),
        )
        .with_loader(
            LoaderConfigBuilder::style("styles", "styles/main.scss")
                .output("build/main.css")
                .build(),
        )
        .build()
}

fn project() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_file(site("fonts/A.woff"), "woff");
    fs.add_file(site("img/a.png"), "png-a");
    fs.add_file(site("img/sub/b.png"), "png-b");
    fs.add_file(site("styles/main.scss"), "body {}");
    fs.add_file(site("notes.txt"), "not an asset");
    fs
}

fn image_map(fs: &MockFileSystem) -> BTreeMap<String, String> {
    serde_json::from_str(&read_string(fs, "build/images.json")).unwrap()
}

#[test]
fn unrelated_change_serves_every_cache_without_reads() {
    init_tracing();
    let fs = project();
    let compiler = CountingCompiler::new();
    let mut orch = mock_orchestrator(&three_loaders(), &fs, &compiler);

    assert!(orch.build().is_success());
    let fonts_before = orch.loader("fonts").unwrap().cache().last_result().cloned();
    let reads_before = fs.total_reads();

    fs.add_file(site("notes.txt"), "edited");
    let desc = orch
        .describe(FileEventKind::Changed, Path::new("notes.txt"))
        .unwrap();
    assert!(orch.rebuild(&desc).is_success());

    // only the descriptor capture itself read a file
    assert_eq!(fs.total_reads(), reads_before + 1);
    assert_eq!(compiler.calls(), 1);
    assert_eq!(
        orch.loader("fonts").unwrap().cache().last_result().cloned(),
        fonts_before
    );
}

#[test]
fn changed_file_recomputes_only_its_loader() {
    init_tracing();
    let fs = project();
    let compiler = CountingCompiler::new();
    let mut orch = mock_orchestrator(&three_loaders(), &fs, &compiler);
    orch.build();

    fs.add_file(site("img/a.png"), "png-a-v2");
    let desc = orch
        .describe(FileEventKind::Changed, Path::new("img/a.png"))
        .unwrap();
    assert!(orch.rebuild(&desc).is_success());

    let expected = Blake3Fingerprinter.fingerprint(b"png-a-v2");
    let images = orch.loader("images").unwrap();
    assert_eq!(
        images.cache().fingerprint_of(Path::new(&site("img/a.png"))),
        Some(&expected)
    );
    // the whole matching set is re-read, not just the changed file
    assert_eq!(fs.read_count(site("img/sub/b.png")), 2);
    assert_eq!(fs.read_count(site("fonts/A.woff")), 1);
    assert_eq!(compiler.calls(), 1);

    assert_eq!(image_map(&fs)["a_png"], data_uri("image/png", b"png-a-v2"));
}

#[test]
fn touching_a_file_without_changing_it_is_a_cache_hit() {
    init_tracing();
    let fs = project();
    let compiler = CountingCompiler::new();
    let mut orch = mock_orchestrator(&three_loaders(), &fs, &compiler);
    orch.build();

    let desc = orch
        .describe(FileEventKind::Changed, Path::new("styles/main.scss"))
        .unwrap();
    orch.rebuild(&desc);
    assert_eq!(compiler.calls(), 1);

    fs.add_file(site("styles/main.scss"), "body { margin: 0 }");
    let desc = orch
        .describe(FileEventKind::Changed, Path::new("styles/main.scss"))
        .unwrap();
    orch.rebuild(&desc);
    assert_eq!(compiler.calls(), 2);
    assert_eq!(
        read_string(&fs, "build/main.css"),
        "/* compiled */\nbody { margin: 0 }"
    );
}

#[test]
fn new_and_removed_files_update_the_manifest() {
    init_tracing();
    let fs = project();
    let compiler = CountingCompiler::new();
    let mut orch = mock_orchestrator(&three_loaders(), &fs, &compiler);
    orch.build();

    fs.add_file(site("img/new.svg"), "<svg/>");
    let added = orch
        .describe(FileEventKind::Added, Path::new("img/new.svg"))
        .unwrap();
    orch.rebuild(&added);
    assert!(image_map(&fs).contains_key("new_svg"));

    fs.remove_file(site("img/a.png"));
    let removed = orch
        .describe(FileEventKind::Removed, Path::new("img/a.png"))
        .unwrap();
    orch.rebuild(&removed);
    let map = image_map(&fs);
    assert!(!map.contains_key("a_png"));
    assert!(map.contains_key("sub_b_png"));
}

#[test]
fn emptied_source_keeps_the_previous_artifact() {
    init_tracing();
    let fs = project();
    let compiler = CountingCompiler::new();
    let mut orch = mock_orchestrator(&three_loaders(), &fs, &compiler);
    orch.build();
    let before = read_string(&fs, "build/_fonts.scss");

    fs.remove_file(site("fonts/A.woff"));
    let removed = orch
        .describe(FileEventKind::Removed, Path::new("fonts/A.woff"))
        .unwrap();
    assert!(orch.rebuild(&removed).is_success());

    assert_eq!(
        orch.loader("fonts").unwrap().cache().last_result(),
        Some(&Output::Empty)
    );
    assert_eq!(read_string(&fs, "build/_fonts.scss"), before);
}
