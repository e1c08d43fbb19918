//! Repository error types.

use racing_core::{EntityKind, EventError, RelationError, ScrapeError};
use racing_store::StoreError;
use thiserror::Error;

/// Errors that can occur in repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The document store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The scraper failed.
    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    /// A lifecycle handler failed (for example a cascading delete).
    #[error(transparent)]
    Event(#[from] EventError),

    /// A memoised relation holds a value of another type.
    #[error(transparent)]
    Relation(#[from] RelationError),

    /// A lookup needed a field the entity does not have.
    #[error("{kind} has no `{field}`")]
    MissingField {
        /// Kind of the entity.
        kind: EntityKind,
        /// The missing field.
        field: &'static str,
    },

    /// A field is present but cannot be interpreted.
    #[error("{kind} has an invalid `{field}`: {message}")]
    InvalidField {
        /// Kind of the entity.
        kind: EntityKind,
        /// The offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },
}

/// Convenience result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_display() {
        let err = RepositoryError::MissingField {
            kind: EntityKind::Race,
            field: "start_time",
        };
        assert_eq!(err.to_string(), "race has no `start_time`");
    }

    #[test]
    fn invalid_field_display() {
        let err = RepositoryError::InvalidField {
            kind: EntityKind::Meet,
            field: "date",
            message: "expected YYYY-MM-DD".into(),
        };
        assert_eq!(err.to_string(), "meet has an invalid `date`: expected YYYY-MM-DD");
    }

    #[test]
    fn wrapped_errors_are_transparent() {
        let err: RepositoryError = ScrapeError::Failed("timeout".into()).into();
        assert_eq!(err.to_string(), "scrape failed: timeout");
        let err: RepositoryError = StoreError::NotFound("meets-1".into()).into();
        assert!(matches!(err, RepositoryError::Store(StoreError::NotFound(_))));
        let err: RepositoryError = RelationError::TypeMismatch {
            relation: "performances",
            expected: "PerformanceList",
        }
        .into();
        assert_eq!(
            err.to_string(),
            "relation `performances` does not hold a PerformanceList"
        );
    }

    #[test]
    fn converts_into_anyhow() {
        let err: anyhow::Error = RepositoryError::MissingField {
            kind: EntityKind::Horse,
            field: "url",
        }
        .into();
        assert!(err.downcast_ref::<RepositoryError>().is_some());
    }
}
