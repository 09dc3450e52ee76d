// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetwatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("cannot read {path:?}: {source}")]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("loader '{loader}' failed to compile: {message}")]
    Compile { loader: String, message: String },

    #[error("cannot write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Loader not found: {0}")]
    UnknownLoader(String),

    #[error("Cycle detected in loader composition: {0}")]
    CompositionCycle(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AssetwatchError {
    pub fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileAccess {
            path: path.into(),
            source,
        }
    }

    pub fn compile(loader: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Compile {
            loader: loader.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AssetwatchError>;
