// src/change/fingerprint.rs

use std::fmt;
use std::path::Path;

use blake3::Hasher;

use crate::errors::{AssetwatchError, Result};
use crate::fs::FileSystem;

/// Hex-encoded content digest of a file.
///
/// `Fingerprint::absent()` stands for "the file no longer exists"; it never
/// equals a digest of real content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn absent() -> Self {
        Self(String::new())
    }

    pub fn is_absent(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_absent() {
            f.write_str("<absent>")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Hashing capability injected into loaders and descriptors.
pub trait Fingerprinter: Send + Sync + fmt::Debug {
    fn fingerprint(&self, bytes: &[u8]) -> Fingerprint;
}

/// Default fingerprinter: blake3 over the full file contents.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Fingerprinter;

impl Fingerprinter for Blake3Fingerprinter {
    fn fingerprint(&self, bytes: &[u8]) -> Fingerprint {
        let mut hasher = Hasher::new();
        hasher.update(bytes);
        Fingerprint(hasher.finalize().to_hex().to_string())
    }
}

/// Read a file and compute its fingerprint.
pub fn fingerprint_file(
    fs: &dyn FileSystem,
    hasher: &dyn Fingerprinter,
    path: &Path,
) -> Result<Fingerprint> {
    let bytes = fs
        .read(path)
        .map_err(|e| AssetwatchError::file_access(path, e))?;
    Ok(hasher.fingerprint(&bytes))
}
