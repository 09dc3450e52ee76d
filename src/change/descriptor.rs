// src/change/descriptor.rs

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::change::fingerprint::{fingerprint_file, Fingerprint, Fingerprinter};
use crate::errors::Result;
use crate::fs::FileSystem;

/// One observed file plus the fingerprint of its content at observation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeDescriptor {
    filepath: PathBuf,
    fingerprint: Fingerprint,
}

impl ChangeDescriptor {
    /// Capture a descriptor for `filepath`.
    ///
    /// When `known` is `None` the file is read and hashed now; a file that
    /// cannot be read is reported as `FileAccess`.
    pub fn capture(
        fs: &dyn FileSystem,
        hasher: &dyn Fingerprinter,
        filepath: impl Into<PathBuf>,
        known: Option<Fingerprint>,
    ) -> Result<Self> {
        let filepath = filepath.into();
        let fingerprint = match known {
            Some(fp) => fp,
            None => fingerprint_file(fs, hasher, &filepath)?,
        };
        debug!(path = ?filepath, %fingerprint, "captured change descriptor");
        Ok(Self {
            filepath,
            fingerprint,
        })
    }

    /// Descriptor for a file that was removed from disk.
    pub fn removed(filepath: impl Into<PathBuf>) -> Self {
        Self {
            filepath: filepath.into(),
            fingerprint: Fingerprint::absent(),
        }
    }

    pub fn filepath(&self) -> &Path {
        &self.filepath
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }
}
