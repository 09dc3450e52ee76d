// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of passes the IO shell should run
//!
//! The async shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - arming the debounce timer
//! - running passes against the orchestrator
//!
//! The core is unit tested without Tokio, channels, filesystem, or loaders.

use std::time::Duration;

use tracing::debug;

use crate::engine::batch::EventBatch;
use crate::engine::{PassRequest, RuntimeEvent, RuntimeOptions};

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    /// Passes to run, in order.
    pub passes: Vec<PassRequest>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn run(passes: Vec<PassRequest>) -> Self {
        Self {
            passes,
            keep_running: true,
        }
    }

    fn idle() -> Self {
        Self::run(Vec::new())
    }
}

/// Pure core runtime state.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    options: RuntimeOptions,
    batch: EventBatch,
    initial_build_done: bool,
}

impl CoreRuntime {
    pub fn new(options: RuntimeOptions) -> Self {
        Self {
            options,
            batch: EventBatch::new(),
            initial_build_done: false,
        }
    }

    /// How long the shell should wait for more events before sending
    /// `DebounceElapsed`; `None` when nothing is pending.
    pub fn pending_window(&self) -> Option<Duration> {
        if self.batch.is_empty() {
            None
        } else {
            self.options.debounce
        }
    }

    pub fn initial_build_done(&self) -> bool {
        self.initial_build_done
    }

    /// Handle a single runtime event.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::InitialScanComplete => {
                if self.initial_build_done {
                    return CoreStep::idle();
                }
                self.initial_build_done = true;
                CoreStep::run(vec![PassRequest::Full])
            }
            RuntimeEvent::FileEvent { kind, path } => {
                if !self.initial_build_done {
                    debug!(path = ?path, "event before initial build; covered by it");
                    return CoreStep::idle();
                }
                match self.options.debounce {
                    None => CoreStep::run(vec![PassRequest::Changed { kind, path }]),
                    Some(_) => {
                        self.batch.record(kind, path);
                        CoreStep::idle()
                    }
                }
            }
            RuntimeEvent::DebounceElapsed => CoreStep::run(
                self.batch
                    .drain()
                    .into_iter()
                    .map(|(path, kind)| PassRequest::Changed { kind, path })
                    .collect(),
            ),
            RuntimeEvent::ShutdownRequested => {
                if !self.batch.is_empty() {
                    debug!(dropped = self.batch.len(), "shutdown with pending events");
                }
                CoreStep {
                    passes: Vec::new(),
                    keep_running: false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::types::FileEventKind;

    fn changed(path: &str) -> RuntimeEvent {
        RuntimeEvent::FileEvent {
            kind: FileEventKind::Changed,
            path: PathBuf::from(path),
        }
    }

    #[test]
    fn initial_scan_triggers_exactly_one_full_build() {
        let mut core = CoreRuntime::new(RuntimeOptions::default());
        assert!(core.step(changed("a")).passes.is_empty());

        let step = core.step(RuntimeEvent::InitialScanComplete);
        assert_eq!(step.passes, vec![PassRequest::Full]);
        assert!(step.keep_running);
        assert!(core.step(RuntimeEvent::InitialScanComplete).passes.is_empty());
    }

    #[test]
    fn without_debounce_every_event_is_a_pass() {
        let mut core = CoreRuntime::new(RuntimeOptions::default());
        core.step(RuntimeEvent::InitialScanComplete);

        for _ in 0..3 {
            let step = core.step(changed("img/a.png"));
            assert_eq!(step.passes.len(), 1);
        }
        assert_eq!(core.pending_window(), None);
    }

    #[test]
    fn debounce_coalesces_until_elapsed() {
        let mut core = CoreRuntime::new(RuntimeOptions::from_debounce_ms(25));
        core.step(RuntimeEvent::InitialScanComplete);

        assert!(core.step(changed("b")).passes.is_empty());
        assert!(core.step(changed("a")).passes.is_empty());
        assert!(core.step(changed("b")).passes.is_empty());
        assert_eq!(core.pending_window(), Some(Duration::from_millis(25)));

        let step = core.step(RuntimeEvent::DebounceElapsed);
        assert_eq!(
            step.passes,
            vec![
                PassRequest::Changed {
                    kind: FileEventKind::Changed,
                    path: PathBuf::from("a")
                },
                PassRequest::Changed {
                    kind: FileEventKind::Changed,
                    path: PathBuf::from("b")
                },
            ]
        );
        assert_eq!(core.pending_window(), None);
    }

    #[test]
    fn shutdown_stops_the_loop() {
        let mut core = CoreRuntime::new(RuntimeOptions::default());
        let step = core.step(RuntimeEvent::ShutdownRequested);
        assert!(!step.keep_running);
        assert!(step.passes.is_empty());
    }
}
