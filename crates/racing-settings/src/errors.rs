//! Failures while assembling [`RacingSettings`](crate::RacingSettings).
//!
//! Environment overrides never fail: a bad `RACING_*` value is logged and
//! skipped. Only the settings file and the final range check can reject a
//! configuration.

use thiserror::Error;

/// Why `~/.racing/settings.json` could not produce usable settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file exists but could not be read.
    #[error("cannot read racing settings: {0}")]
    Io(#[from] std::io::Error),
    /// The settings file is not valid JSON or does not match the schema.
    #[error("malformed racing settings: {0}")]
    Json(#[from] serde_json::Error),
    /// A value falls outside its allowed range, such as
    /// `processor.threads` outside `1..=256` or a zero `store.poolSize`.
    #[error("racing setting out of range: {0}")]
    InvalidValue(String),
}

/// Result alias for settings loading.
pub type Result<T> = std::result::Result<T, SettingsError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
