// src/change/mod.rs

//! Change detection.
//!
//! - [`fingerprint`] hashes file contents (blake3 by default).
//! - [`descriptor`] captures "this file now has this fingerprint".
//! - [`cache`] is the per-loader memo consulted before recomputing.

pub mod cache;
pub mod descriptor;
pub mod fingerprint;

pub use cache::ResultCache;
pub use descriptor::ChangeDescriptor;
pub use fingerprint::{Blake3Fingerprinter, Fingerprint, Fingerprinter};
