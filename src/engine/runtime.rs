// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::orchestrator::{Orchestrator, PassReport};

use super::core::CoreRuntime;
use super::{PassRequest, RuntimeEvent};

/// Counters kept by the shell across the lifetime of a watch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    pub passes: usize,
    pub failed_passes: usize,
    /// Events whose change descriptor could not be captured.
    pub undescribed_events: usize,
}

/// Drives the orchestrator in response to `RuntimeEvent`s.
///
/// This is an IO shell around `CoreRuntime`, which decides *which* passes
/// to run. The shell reads events, arms the debounce timer while the core
/// has pending events, and runs each pass to completion before reading the
/// next event.
pub struct Runtime {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    orchestrator: Orchestrator,
    stats: RuntimeStats,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub fn new(
        core: CoreRuntime,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        orchestrator: Orchestrator,
    ) -> Self {
        Self {
            core,
            event_rx,
            orchestrator,
            stats: RuntimeStats::default(),
        }
    }

    pub fn stats(&self) -> RuntimeStats {
        self.stats
    }

    /// Main event loop. Returns the orchestrator once the core requests exit
    /// or every sender is gone.
    pub async fn run(self) -> anyhow::Result<Orchestrator> {
        let (orchestrator, stats) = self.run_with_stats().await?;
        debug!(?stats, "runtime stats");
        Ok(orchestrator)
    }

    /// Like [`Runtime::run`], also returning the pass counters.
    pub async fn run_with_stats(mut self) -> anyhow::Result<(Orchestrator, RuntimeStats)> {
        info!("assetwatch runtime started");

        loop {
            let event = match self.next_event().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    // run whatever the last window collected
                    let step = self.core.step(RuntimeEvent::DebounceElapsed);
                    self.execute(step.passes);
                    break;
                }
            };

            debug!(?event, "runtime received event");
            let step = self.core.step(event);
            self.execute(step.passes);

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        info!(passes = self.stats.passes, failed = self.stats.failed_passes, "runtime exiting");
        Ok((self.orchestrator, self.stats))
    }

    async fn next_event(&mut self) -> Option<RuntimeEvent> {
        match self.core.pending_window() {
            Some(window) => match timeout(window, self.event_rx.recv()).await {
                Ok(event) => event,
                Err(_elapsed) => Some(RuntimeEvent::DebounceElapsed),
            },
            None => self.event_rx.recv().await,
        }
    }

    fn execute(&mut self, passes: Vec<PassRequest>) {
        for pass in passes {
            let report = match pass {
                PassRequest::Full => self.orchestrator.build(),
                PassRequest::Changed { kind, path } => {
                    match self.orchestrator.describe(kind, &path) {
                        Ok(descriptor) => self.orchestrator.rebuild(&descriptor),
                        Err(e) => {
                            warn!(path = ?path, ?kind, error = %e, "cannot describe change; skipping event");
                            self.stats.undescribed_events += 1;
                            continue;
                        }
                    }
                }
            };
            self.record(&report);
        }
    }

    fn record(&mut self, report: &PassReport) {
        self.stats.passes += 1;
        if !report.is_success() {
            self.stats.failed_passes += 1;
        }
    }
}
