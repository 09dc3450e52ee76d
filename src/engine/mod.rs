// src/engine/mod.rs

//! Watch-mode engine.
//!
//! This module ties together:
//! - the orchestrator (what a pass does)
//! - the event batch (what happens when events arrive in a burst)
//! - the main runtime event loop that reacts to:
//!   - the watcher's initial-scan signal
//!   - file add/change/remove events
//!   - debounce timer expiry
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::info;

use crate::orchestrator::Orchestrator;
use crate::types::FileEventKind;
use crate::watch::{spawn_watcher, WatchFilter};

pub mod batch;
pub mod core;
pub mod runtime;

pub use batch::EventBatch;
pub use core::{CoreRuntime, CoreStep};
pub use runtime::Runtime;

/// Capacity of the channel between the watcher and the runtime.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// Coalescing window for file events; `None` runs one pass per event.
    pub debounce: Option<Duration>,
}

impl RuntimeOptions {
    /// `0` disables debouncing.
    pub fn from_debounce_ms(ms: u64) -> Self {
        Self {
            debounce: (ms > 0).then(|| Duration::from_millis(ms)),
        }
    }
}

/// Events flowing into the runtime from the watcher and signal handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// The watcher is registered; run the initial full build.
    InitialScanComplete,
    /// A watched file was added, changed or removed.
    FileEvent { kind: FileEventKind, path: PathBuf },
    /// The debounce window closed without further events.
    DebounceElapsed,
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Work the shell should run against the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassRequest {
    /// `build()`: every loader recomputes.
    Full,
    /// `rebuild()` with a descriptor for this path.
    Changed { kind: FileEventKind, path: PathBuf },
}

/// Watch the orchestrator's project root until shutdown.
///
/// Runs one full build after the watcher is up, then one pass per event (or
/// per distinct path in a debounce window). Ctrl-C stops the loop. Returns the
/// orchestrator so callers can inspect its final state.
pub async fn watch(
    orchestrator: Orchestrator,
    filter: WatchFilter,
    options: RuntimeOptions,
) -> anyhow::Result<Orchestrator> {
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(EVENT_CHANNEL_CAPACITY);

    let root = orchestrator.context().root().to_path_buf();
    let _watcher_handle = spawn_watcher(root, filter, rt_tx.clone())?;

    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            info!("Ctrl-C received; shutting down");
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }
    drop(rt_tx);

    let runtime = Runtime::new(CoreRuntime::new(options), rt_rx, orchestrator);
    runtime.run().await
}
