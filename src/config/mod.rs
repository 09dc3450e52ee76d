// src/config/mod.rs

//! Configuration loading and validation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate names, references and composition (`validate.rs`).
//! - Turn a validated config into a ready [`Orchestrator`](crate::orchestrator::Orchestrator) (`build.rs`).

pub mod build;
pub mod loader;
pub mod model;
pub mod validate;

pub use build::{build_orchestrator, Collaborators};
pub use loader::{load_and_validate, load_from_path, load_from_str};
pub use model::{
    ConfigFile, ConfigSection, DataValue, LoaderConfig, LoaderKindConfig, LoaderRef,
    RawConfigFile, WatchSection,
};
