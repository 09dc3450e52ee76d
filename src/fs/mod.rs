// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub mod mock;

/// Abstract filesystem interface.
///
/// Loaders never touch `std::fs` directly; everything goes through this trait
/// so tests can count reads and run without a disk.
pub trait FileSystem: Send + Sync + Debug {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Overwrite `path`, creating missing parent directories.
    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;

    /// Return a list of entries in a directory.
    /// Returns full paths.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, contents)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        fs::canonicalize(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            entries.push(entry.path());
        }
        Ok(entries)
    }
}

/// Recursively collect every file below `dir`.
///
/// A missing directory yields an empty list rather than an error: a loader
/// whose source directory does not exist yet simply has no inputs.
pub fn walk_files(fs: &dyn FileSystem, dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    if !fs.is_dir(dir) {
        if fs.is_file(dir) {
            files.push(dir.to_path_buf());
        }
        return Ok(files);
    }

    let mut stack = vec![dir.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::mock::MockFileSystem;
    use super::*;

    #[test]
    fn walk_files_is_sorted_and_recursive() {
        let fs = MockFileSystem::new();
        fs.add_file("proj/b.txt", "b");
        fs.add_file("proj/a/z.txt", "z");
        fs.add_file("proj/a.txt", "a");

        let files = walk_files(&fs, Path::new("proj")).unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("proj/a/z.txt"),
                PathBuf::from("proj/a.txt"),
                PathBuf::from("proj/b.txt"),
            ]
        );
    }

    #[test]
    fn walk_files_on_missing_dir_is_empty() {
        let fs = MockFileSystem::new();
        assert!(walk_files(&fs, Path::new("nowhere")).unwrap().is_empty());
    }

    #[test]
    fn real_write_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("deep/er/out.txt");
        RealFileSystem.write(&target, b"ok").unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"ok");
    }
}
