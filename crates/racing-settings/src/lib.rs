//! # racing-settings
//!
//! Layered configuration for the racing mirror.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`RacingSettings::default()`]
//! 2. **User file**: `~/.racing/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `RACING_*` overrides (highest priority)
//!
//! | Variable | Overrides |
//! |---|---|
//! | `RACING_DB_PATH` | `store.dbPath` |
//! | `RACING_POOL_SIZE` | `store.poolSize` |
//! | `RACING_THREADS` | `processor.threads` |
//! | `RACING_LOG_LEVEL` | `logging.level` |

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    apply_env_overrides, deep_merge, load_settings, load_settings_from_path, load_with,
    settings_dir, settings_path,
};
pub use types::{
    IN_MEMORY, LoggingSettings, MAX_THREADS, ProcessorSettings, RacingSettings, StoreSettings,
};

use std::sync::OnceLock;

/// Global settings singleton.
static SETTINGS: OnceLock<RacingSettings> = OnceLock::new();

/// Get the global settings instance.
///
/// On first call, loads settings from `~/.racing/settings.json` with env
/// var overrides. If loading fails, returns compiled defaults.
pub fn get_settings() -> &'static RacingSettings {
    SETTINGS.get_or_init(|| {
        load_settings().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "failed to load settings, using defaults");
            RacingSettings::default()
        })
    })
}

/// Initialize the global settings with a specific value.
///
/// Returns the settings back if the global was already initialized.
#[allow(clippy::result_large_err)]
pub fn init_settings(settings: RacingSettings) -> std::result::Result<(), RacingSettings> {
    SETTINGS.set(settings)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
