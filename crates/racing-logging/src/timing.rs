//! Timed execution of a unit of work.

use std::time::Instant;

use tracing::info;

/// Run `work`, logging `started` before and `finished` with the elapsed
/// milliseconds after. The outcome of `work` is returned unchanged.
pub fn log_time<T>(message: &str, work: impl FnOnce() -> T) -> T {
    info!(task = %message, "started");
    let start = Instant::now();
    let output = work();
    let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    info!(task = %message, elapsed_ms, "finished");
    output
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
