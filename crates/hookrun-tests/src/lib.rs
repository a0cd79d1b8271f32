//! Integration test infrastructure for hookrun.
//!
//! In-process wiring of the whole pipeline (memory store, memory queue,
//! fake `git` and workflow tools) plus testcontainers-based PostgreSQL and
//! NATS for the tests behind the `integration` feature.

pub mod containers;
pub mod context;
pub mod fixtures;
pub mod helpers;

pub use context::TestContext;
pub use fixtures::*;
pub use helpers::*;

/// Initialize test logging (call once per test binary).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,hookrun_tests=debug")),
        )
        .with_test_writer()
        .try_init();
}
