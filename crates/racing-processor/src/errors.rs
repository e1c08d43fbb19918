//! Processor error types.

use std::sync::Arc;

use chrono::NaiveDate;
use racing_queue::QueueError;
use racing_repository::RepositoryError;
use thiserror::Error;

/// Errors that can occur while traversing the racing hierarchy.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// A lookup failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// A hook returned an error.
    #[error("{level} hook failed: {cause}")]
    Hook {
        /// The hook point, e.g. `before_race`.
        level: &'static str,
        /// What the hook returned.
        cause: anyhow::Error,
    },

    /// A worker task failed, stopping the traversal of `date`.
    #[error("processing {date} aborted: {fault}")]
    Aborted {
        /// The date being processed.
        date: NaiveDate,
        /// The first task failure.
        fault: Arc<anyhow::Error>,
    },

    /// The worker pool could not be started.
    #[error(transparent)]
    Queue(#[from] QueueError),
}

/// Convenience result type for traversal operations.
pub type Result<T> = std::result::Result<T, ProcessError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use racing_core::EntityKind;

    #[test]
    fn hook_display_names_the_level() {
        let err = ProcessError::Hook {
            level: "before_race",
            cause: anyhow::anyhow!("bad race"),
        };
        assert_eq!(err.to_string(), "before_race hook failed: bad race");
    }

    #[test]
    fn aborted_display_carries_the_fault() {
        let err = ProcessError::Aborted {
            date: NaiveDate::from_ymd_opt(2016, 2, 1).unwrap(),
            fault: Arc::new(anyhow::anyhow!("runner scrape failed")),
        };
        assert_eq!(
            err.to_string(),
            "processing 2016-02-01 aborted: runner scrape failed"
        );
    }

    #[test]
    fn repository_errors_are_transparent() {
        let err: ProcessError = RepositoryError::MissingField {
            kind: EntityKind::Meet,
            field: "date",
        }
        .into();
        assert_eq!(err.to_string(), "meet has no `date`");
    }
}
