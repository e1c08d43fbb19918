//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]`, so a
//! settings file may name any subset of fields and the rest keep their
//! compiled defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// The `db_path` value selecting an in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Upper bound on worker threads per traversal.
pub const MAX_THREADS: usize = 256;

/// Root settings type for the racing mirror.
///
/// ```json
/// {
///   "store": { "dbPath": "/var/lib/racing/racing.db", "poolSize": 4 },
///   "processor": { "threads": 8 },
///   "logging": { "level": "debug" }
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RacingSettings {
    /// Document store settings.
    pub store: StoreSettings,
    /// Traversal settings.
    pub processor: ProcessorSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl RacingSettings {
    /// Check value ranges the type system cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.store.db_path.trim().is_empty() {
            return Err(SettingsError::InvalidValue("store.dbPath is empty".into()));
        }
        if self.store.pool_size == 0 {
            return Err(SettingsError::InvalidValue(
                "store.poolSize must be at least 1".into(),
            ));
        }
        if !(1..=MAX_THREADS).contains(&self.processor.threads) {
            return Err(SettingsError::InvalidValue(format!(
                "processor.threads must be within 1..={MAX_THREADS}, got {}",
                self.processor.threads
            )));
        }
        Ok(())
    }
}

/// Where and how documents are stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSettings {
    /// SQLite database file, relative to the settings directory unless
    /// absolute. `":memory:"` selects an in-memory database.
    pub db_path: String,
    /// Maximum pooled connections for a file database.
    pub pool_size: u32,
    /// How long a connection waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u32,
}

impl StoreSettings {
    /// Whether the store lives in memory only.
    pub fn is_in_memory(&self) -> bool {
        self.db_path == IN_MEMORY
    }

    /// The database file, resolved against `base` when relative. `None`
    /// for an in-memory store.
    pub fn resolve_db_path(&self, base: &Path) -> Option<PathBuf> {
        if self.is_in_memory() {
            return None;
        }
        let path = Path::new(&self.db_path);
        Some(if path.is_absolute() {
            path.to_path_buf()
        } else {
            base.join(path)
        })
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            db_path: "racing.db".to_string(),
            pool_size: 8,
            busy_timeout_ms: 30_000,
        }
    }
}

/// Traversal settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessorSettings {
    /// Worker threads per traversal run.
    pub threads: usize,
    /// Prefix of the per-task timing log messages.
    pub message_prefix: String,
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        Self {
            threads: 1,
            message_prefix: "processing".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum level when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
