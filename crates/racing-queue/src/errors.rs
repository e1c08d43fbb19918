//! Queue error types.

use thiserror::Error;

/// Errors raised by the worker queue itself.
#[derive(Debug, Error)]
pub enum QueueError {
    /// A worker thread could not be started.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// A task panicked. Captured as the queue fault.
    #[error("task panicked: {0}")]
    Panicked(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panicked_display() {
        let err = QueueError::Panicked("index out of bounds".into());
        assert_eq!(err.to_string(), "task panicked: index out of bounds");
    }

    #[test]
    fn spawn_from_io() {
        let err: QueueError = std::io::Error::other("no threads").into();
        assert!(matches!(err, QueueError::Spawn(_)));
    }
}
