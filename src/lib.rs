// src/lib.rs

pub mod change;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod loader;
pub mod logging;
pub mod orchestrator;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{build_orchestrator, load_and_validate, Collaborators, ConfigFile};
use crate::engine::RuntimeOptions;
use crate::loader::LoaderKind;
use crate::orchestrator::Orchestrator;
use crate::watch::WatchFilter;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - loader graph / orchestrator
/// - (optional) file watcher and runtime
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;
    let root = config_root_dir(&config_path);

    let mut orchestrator = build_orchestrator(&cfg, &root, &Collaborators::default())?;

    if args.dry_run {
        print_dry_run(&cfg, &orchestrator);
        return Ok(());
    }

    if args.once {
        let report = orchestrator.build();
        if !report.is_success() {
            bail!(
                "build failed: {} loader(s) failed ({}), {} skipped",
                report.failures.len(),
                report.failed_loaders().join(", "),
                report.skipped.len()
            );
        }
        return Ok(());
    }

    let filter = WatchFilter::from_config(&cfg, &orchestrator)?;
    let options = RuntimeOptions::from_debounce_ms(cfg.config.debounce_ms);
    info!(root = ?root, debounce = ?options.debounce, "entering watch mode");
    engine::watch(orchestrator, filter, options).await?;
    Ok(())
}

/// Project root: the directory holding the config file.
///
/// - If the config path has a non-empty parent (e.g. "site/Assetwatch.toml"),
///   that directory is used.
/// - A bare filename like "Assetwatch.toml" (parent = "") means the current
///   working directory.
///
/// The result is canonicalized when possible so watcher paths relativize.
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    let dir = match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    dir.canonicalize().unwrap_or(dir)
}

/// Dry-run output: loaders, their kinds, inputs, outputs and composition.
fn print_dry_run(cfg: &ConfigFile, orchestrator: &Orchestrator) {
    println!("assetwatch dry-run");
    println!("  root = {:?}", orchestrator.context().root());
    println!("  config.on_error = {:?}", cfg.config.on_error);
    println!("  config.debounce_ms = {}", cfg.config.debounce_ms);
    println!();

    let graph = orchestrator.graph();
    println!("loaders ({}):", graph.len());
    for (id, loader) in graph.iter() {
        let top = orchestrator.top_level().contains(&id);
        println!(
            "  - {} ({}){}",
            loader.name(),
            loader.kind().label(),
            if top { "" } else { " [composed only]" }
        );
        println!("      inputs: {:?}", graph.input_paths(id));
        let outputs = loader.kind().output_targets();
        if !outputs.is_empty() {
            println!("      outputs: {:?}", outputs);
        }
        if let LoaderKind::Template(t) = loader.kind() {
            for (key, slot) in t.slots() {
                match slot {
                    loader::Slot::Literal(value) => println!("      data.{key}: {value:?}"),
                    loader::Slot::Loader(child) => {
                        let name = graph.get(*child).map(|l| l.name()).unwrap_or("?");
                        println!("      data.{key}: -> {name}");
                    }
                }
            }
        }
    }

    println!();
    println!("watch:");
    match &cfg.watch.patterns {
        Some(patterns) => println!("  patterns: {patterns:?}"),
        None => println!("  patterns (from loaders): {:?}", orchestrator.input_paths()),
    }
    if let Some(ignore) = &cfg.watch.ignore {
        println!("  ignore: {ignore}");
    }

    debug!("dry-run complete (nothing built)");
}
