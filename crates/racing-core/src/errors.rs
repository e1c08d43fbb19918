//! Error types for scraping, event dispatch and relation caching.

use thiserror::Error;

/// Errors raised by a [`Scraper`](crate::Scraper).
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The remote source could not be reached or is not configured.
    #[error("source unavailable: {0}")]
    Unavailable(String),
    /// The remote source answered with something that could not be parsed.
    #[error("failed to parse {what}: {message}")]
    Parse {
        /// What was being parsed.
        what: String,
        /// Parser diagnostic.
        message: String,
    },
    /// Any other scrape failure.
    #[error("scrape failed: {0}")]
    Failed(String),
}

/// A lifecycle handler failed while an event was being published.
#[derive(Debug, Error)]
#[error("handler for `{event}` failed: {cause}")]
pub struct EventError {
    /// Name of the event being published.
    pub event: String,
    /// The handler's error.
    pub cause: anyhow::Error,
}

/// A memoised relation could not be read back.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RelationError {
    /// The relation already caches a value of a different type.
    #[error("relation `{relation}` does not hold a {expected}")]
    TypeMismatch {
        /// Name of the relation.
        relation: &'static str,
        /// Type the caller asked for.
        expected: &'static str,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
