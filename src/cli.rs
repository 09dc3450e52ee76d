// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `assetwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetwatch",
    version,
    about = "Build fonts, images, stylesheets and templates into artifacts, and rebuild on change.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Assetwatch.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = crate::config::loader::DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Run one full build and exit, no watching.
    #[arg(long)]
    pub once: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the loader graph, but don't build anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
