// src/fs/mock.rs

use super::FileSystem;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir(Vec<String>), // List of child names
}

/// In-memory filesystem for tests.
///
/// Clones share the same underlying tree, so a test can keep a handle while
/// the orchestrator owns another. Every successful `read` is counted per path.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
    reads: Arc<Mutex<HashMap<PathBuf, usize>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut files = HashMap::new();
        // Ensure root exists
        files.insert(PathBuf::from("."), MockEntry::Dir(Vec::new()));

        Self {
            files: Arc::new(Mutex::new(files)),
            reads: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut files = self.files.lock().unwrap();
        files.insert(path.clone(), MockEntry::File(content.into()));

        if let Some(parent) = path.parent() {
            let parent = normalize_parent(parent);
            ensure_dir_entry(&mut files, parent);
            link_child(&mut files, parent, &path);
        }
    }

    pub fn remove_file(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut files = self.files.lock().unwrap();
        if files.remove(path).is_none() {
            return;
        }
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
            let parent = normalize_parent(parent);
            if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
                children.retain(|c| c.as_str() != name.to_string_lossy());
            }
        }
    }

    /// Raw contents of a file, if present. Does not count as a read.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        let files = self.files.lock().unwrap();
        match files.get(path.as_ref()) {
            Some(MockEntry::File(content)) => Some(content.clone()),
            _ => None,
        }
    }

    pub fn read_count(&self, path: impl AsRef<Path>) -> usize {
        let reads = self.reads.lock().unwrap();
        reads.get(path.as_ref()).copied().unwrap_or(0)
    }

    pub fn total_reads(&self) -> usize {
        self.reads.lock().unwrap().values().sum()
    }
}

fn normalize_parent(parent: &Path) -> &Path {
    if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    }
}

fn link_child(files: &mut HashMap<PathBuf, MockEntry>, parent: &Path, child: &Path) {
    if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
        if let Some(name) = child.file_name().and_then(|n| n.to_str()) {
            if !children.iter().any(|c| c == name) {
                children.push(name.to_string());
            }
        }
    }
}

fn ensure_dir_entry(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
    if files.contains_key(path) {
        return;
    }
    files.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
    if let Some(parent) = path.parent() {
        let parent = normalize_parent(parent);
        // Avoid infinite loop at root
        if parent != path {
            ensure_dir_entry(files, parent);
            link_child(files, parent, path);
        }
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("not found: {:?}", path))
}

impl FileSystem for MockFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        let files = self.files.lock().unwrap();
        match files.get(path) {
            Some(MockEntry::File(content)) => {
                *self
                    .reads
                    .lock()
                    .unwrap()
                    .entry(path.to_path_buf())
                    .or_insert(0) += 1;
                Ok(content.clone())
            }
            Some(MockEntry::Dir(_)) => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("is a directory: {:?}", path),
            )),
            None => Err(not_found(path)),
        }
    }

    fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        if matches!(self.files.lock().unwrap().get(path), Some(MockEntry::Dir(_))) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("is a directory: {:?}", path),
            ));
        }
        self.add_file(path, contents);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        files.contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        matches!(files.get(path), Some(MockEntry::File(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        let files = self.files.lock().unwrap();
        matches!(files.get(path), Some(MockEntry::Dir(_)))
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        // In mock, we just return the path as is, assuming tests use one
        // consistent spelling for every path.
        Ok(path.to_path_buf())
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let files = self.files.lock().unwrap();
        match files.get(path) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(not_found(path)),
        }
    }
}
