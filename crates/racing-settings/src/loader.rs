//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`RacingSettings::default()`]
//! 2. If `~/.racing/settings.json` exists, deep-merge user values over defaults
//! 3. Apply `RACING_*` environment variable overrides (highest priority)
//! 4. Validate the result
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::types::{MAX_THREADS, RacingSettings};

/// The directory holding the settings file and, by default, the database.
pub fn settings_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".racing")
}

/// Resolve the path to the settings file (`~/.racing/settings.json`).
pub fn settings_path() -> PathBuf {
    settings_dir().join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<RacingSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON or out-of-range values, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<RacingSettings> {
    load_with(path, |name| std::env::var(name).ok())
}

/// [`load_settings_from_path`] with an explicit environment lookup.
pub fn load_with(path: &Path, env: impl Fn(&str) -> Option<String>) -> Result<RacingSettings> {
    let defaults = serde_json::to_value(RacingSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: RacingSettings = serde_json::from_value(merged)?;
    apply_overrides(&mut settings, env);
    settings.validate()?;
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply `RACING_*` environment variable overrides to loaded settings.
pub fn apply_env_overrides(settings: &mut RacingSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `env`.
///
/// Empty values are ignored. Integers must parse and fall within range;
/// anything else is logged and ignored.
pub fn apply_overrides(settings: &mut RacingSettings, env: impl Fn(&str) -> Option<String>) {
    let reader = EnvReader { env };

    if let Some(v) = reader.string("RACING_DB_PATH") {
        settings.store.db_path = v;
    }
    if let Some(v) = reader.u32_in("RACING_POOL_SIZE", 1, 64) {
        settings.store.pool_size = v;
    }
    if let Some(v) = reader.usize_in("RACING_THREADS", 1, MAX_THREADS) {
        settings.processor.threads = v;
    }
    if let Some(v) = reader.string("RACING_LOG_LEVEL") {
        settings.logging.level = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a `u32` within a range.
pub fn parse_u32_range(val: &str, min: u32, max: u32) -> Option<u32> {
    let n: u32 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `usize` within a range.
pub fn parse_usize_range(val: &str, min: usize, max: usize) -> Option<usize> {
    let n: usize = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

struct EnvReader<F> {
    env: F,
}

impl<F: Fn(&str) -> Option<String>> EnvReader<F> {
    fn string(&self, name: &str) -> Option<String> {
        (self.env)(name).filter(|v| !v.is_empty())
    }

    fn u32_in(&self, name: &str, min: u32, max: u32) -> Option<u32> {
        let val = self.string(name)?;
        let result = parse_u32_range(&val, min, max);
        if result.is_none() {
            warn!(key = name, value = %val, "invalid u32 env var, ignoring");
        }
        result
    }

    fn usize_in(&self, name: &str, min: usize, max: usize) -> Option<usize> {
        let val = self.string(name)?;
        let result = parse_usize_range(&val, min, max);
        if result.is_none() {
            warn!(key = name, value = %val, "invalid usize env var, ignoring");
        }
        result
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
