//! Opening the configured document store.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use racing_core::{OfflineScraper, Scraper};
use racing_repository::Racing;
use racing_settings::StoreSettings;
use racing_store::{ConnectionConfig, DocumentStore, SqliteStore};
use tracing::info;

/// Open the store described by `settings`, resolving relative paths
/// against `base`.
pub fn open_store(settings: &StoreSettings, base: &Path) -> Result<Arc<SqliteStore>> {
    let Some(path) = settings.resolve_db_path(base) else {
        info!("using in-memory document store");
        return Ok(Arc::new(
            SqliteStore::in_memory().context("failed to create in-memory store")?,
        ));
    };
    let config = ConnectionConfig {
        pool_size: settings.pool_size,
        busy_timeout_ms: settings.busy_timeout_ms,
        ..ConnectionConfig::default()
    };
    let store = SqliteStore::open(&path, &config)
        .with_context(|| format!("failed to open database: {}", path.display()))?;
    info!(path = %path.display(), "opened document store");
    Ok(Arc::new(store))
}

/// A facade over `store` that never scrapes, for maintenance commands.
pub fn offline(store: &Arc<SqliteStore>) -> Arc<Racing> {
    let store: Arc<dyn DocumentStore> = Arc::clone(store) as Arc<dyn DocumentStore>;
    let scraper: Arc<dyn Scraper> = Arc::new(OfflineScraper);
    Racing::new(store, scraper)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_resolve_against_base() {
        let dir = tempfile::tempdir().unwrap();
        let settings = StoreSettings {
            db_path: "nested/racing.db".into(),
            ..StoreSettings::default()
        };
        let _store = open_store(&settings, dir.path()).unwrap();
        assert!(dir.path().join("nested/racing.db").exists());
    }

    #[test]
    fn memory_path_opens_in_memory() {
        let settings = StoreSettings {
            db_path: racing_settings::IN_MEMORY.into(),
            ..StoreSettings::default()
        };
        let store = open_store(&settings, Path::new("/nonexistent")).unwrap();
        assert_eq!(store.count("meets").unwrap(), 0);
    }
}
