//! # racing-logging
//!
//! Structured logging with `tracing`.
//!
//! - [`init_subscriber`] installs the process-wide stderr subscriber
//! - [`log_time`] wraps a unit of work in `started` / `finished` events
//! - [`capture_logs`] records events in memory for assertions in tests

#![deny(unsafe_code)]

pub mod test_utils;
pub mod timing;

pub use test_utils::{CapturedEvent, CapturedLogs, capture_logs};
pub use timing::log_time;

/// Initialize the global tracing subscriber with stderr output.
///
/// `RUST_LOG` takes precedence over `level` when set. Call once at
/// application startup; subsequent calls are no-ops.
pub fn init_subscriber(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .compact();

    // set_global_default is a no-op if already set
    let _ = subscriber.try_init();
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
