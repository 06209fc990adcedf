//! Shared helpers for buildo's integration tests.

pub mod builders;
pub mod clock;
pub mod fake_runner;

use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::{EnvFilter, fmt};

static TRACING: Once = Once::new();

/// Install a test-writer subscriber once per test binary.
///
/// Captured output only shows up for failing tests. Narrow it with
/// `RUST_LOG`, e.g. `RUST_LOG=buildo::dag=trace cargo test scheduler`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,buildo=debug"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_thread_names(true)
            .init();
    });
}

/// Fail the test if `f` takes longer than ten seconds.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(10), f)
        .await
        .expect("test exceeded its 10s budget")
}
