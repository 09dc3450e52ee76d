// src/watch/mod.rs

//! File watching.
//!
//! This module is responsible for:
//! - Compiling the watch / ignore globs ([`WatchFilter`]).
//! - Wiring up a cross-platform filesystem watcher (`notify`) that forwards
//!   matching events into the runtime channel.
//!
//! It does **not** know about loaders or caches; turning an event into a
//! change descriptor happens in the orchestrator.

pub mod patterns;
pub mod watcher;

pub use patterns::WatchFilter;
pub use watcher::{spawn_watcher, WatcherHandle};
