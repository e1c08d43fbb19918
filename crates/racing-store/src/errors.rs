//! Store error types.

use thiserror::Error;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `SQLite` error from rusqlite.
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool: {0}")]
    Pool(#[from] r2d2::Error),

    /// A document body could not be encoded or decoded.
    #[error("serialization: {0}")]
    Serde(#[from] serde_json::Error),

    /// Schema migration failed.
    #[error("migration: {message}")]
    Migration {
        /// Description of what failed.
        message: String,
    },

    /// A collection or field name is not a plain identifier.
    #[error("invalid {what} name: {name:?}")]
    InvalidField {
        /// `"collection"` or `"field"`.
        what: &'static str,
        /// The offending name.
        name: String,
    },

    /// A filter condition cannot be expressed against the store.
    #[error("unsupported filter on `{field}`: {reason}")]
    UnsupportedFilter {
        /// Field the condition applies to.
        field: String,
        /// Why it is unsupported.
        reason: String,
    },

    /// The document was expected to exist but does not.
    #[error("not found: {0}")]
    NotFound(String),

    /// Filesystem error preparing the database location.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
