//! Shared helpers for assetwatch's unit and integration tests.
//!
//! - [`builders`]: fluent construction of config files and loader entries
//! - [`fake_compiler`]: a stylesheet compiler that counts its invocations

pub mod builders;
pub mod fake_compiler;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Upper bound for any single async test step.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Install a test-captured tracing subscriber once per test binary.
///
/// Output only shows up for failing tests unless run with `--nocapture`.
/// `RUST_LOG=assetwatch=debug cargo test` turns on cache-decision logs.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("assetwatch=info,warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Await `f`, panicking if it takes longer than [`TEST_TIMEOUT`].
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(TEST_TIMEOUT, f)
        .await
        .expect("test step timed out")
}
