// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use crate::engine::RuntimeEvent;
use crate::fs::{FileSystem, RealFileSystem};
use crate::loader::pattern::relative_str;
use crate::types::FileEventKind;
use crate::watch::patterns::WatchFilter;

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive; dropping this handle
/// stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch `root` recursively and forward matching add/change/remove events.
///
/// Once the watch is registered, `RuntimeEvent::InitialScanComplete` is sent
/// before any file event, so the runtime can run its full build first.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    filter: WatchFilter,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    let root = root.canonicalize().unwrap_or_else(|_| root.clone());

    // notify calls back on its own thread; hop into async through this channel.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    eprintln!("assetwatch: failed to forward notify event: {err}");
                }
            }
            Err(err) => {
                eprintln!("assetwatch: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;
    info!(root = ?root, patterns = ?filter.patterns(), "file watcher started");

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    tokio::spawn(async move {
        if runtime_tx.send(RuntimeEvent::InitialScanComplete).await.is_err() {
            return;
        }

        while let Some(event) = event_rx.recv().await {
            trace!(?event, "received notify event");
            let Some(kind) = FileEventKind::from_notify(&event.kind) else {
                continue;
            };

            for path in event.paths {
                let Some(forward) = classify(fs.as_ref(), &root, &filter, kind, &path) else {
                    continue;
                };
                if runtime_tx
                    .send(RuntimeEvent::FileEvent { kind: forward, path })
                    .await
                    .is_err()
                {
                    warn!("runtime channel closed; stopping watcher forwarding");
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}

/// Filter one path of a notify event; returns the kind to forward.
///
/// Rename sources show up as modifications of a path that no longer exists,
/// so those are forwarded as removals.
pub(crate) fn classify(
    fs: &dyn FileSystem,
    root: &Path,
    filter: &WatchFilter,
    kind: FileEventKind,
    path: &Path,
) -> Option<FileEventKind> {
    if fs.is_dir(path) {
        return None;
    }
    let rel = relative_str(fs, root, path)?;
    if !filter.matches(&rel) {
        trace!(path = %rel, "event outside watch patterns");
        return None;
    }

    let kind = match kind {
        FileEventKind::Changed | FileEventKind::Added if !fs.exists(path) => {
            FileEventKind::Removed
        }
        other => other,
    };
    debug!(path = %rel, ?kind, "forwarding file event");
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn classify_filters_and_detects_renamed_away_files() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/img/a.png", "A");
        let filter = WatchFilter::new(vec!["img/*".into()], None).unwrap();
        let root = Path::new("/p");

        assert_eq!(
            classify(&fs, root, &filter, FileEventKind::Changed, Path::new("/p/img/a.png")),
            Some(FileEventKind::Changed)
        );
        assert_eq!(
            classify(&fs, root, &filter, FileEventKind::Changed, Path::new("/p/img/gone.png")),
            Some(FileEventKind::Removed)
        );
        assert_eq!(
            classify(&fs, root, &filter, FileEventKind::Added, Path::new("/p/other/a.png")),
            None
        );
        assert_eq!(
            classify(&fs, root, &filter, FileEventKind::Changed, Path::new("/p/img")),
            None
        );
    }
}
