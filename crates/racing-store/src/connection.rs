//! `SQLite` connection pools for the document store.
//!
//! Uses `r2d2` pooling with the `r2d2_sqlite` backend. The
//! [`PragmaCustomizer`] runs on every new connection so WAL mode, the busy
//! timeout and the cache size are always in effect.
//!
//! Every in-memory connection is its own database, so an in-memory pool is
//! pinned to a single long-lived connection.

use std::path::Path;
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::errors::{Result, StoreError};

/// Alias for the connection pool type.
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Alias for a pooled connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

const CHECKOUT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the connection pool.
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    /// Maximum pool size for file databases (default: 8).
    pub pool_size: u32,
    /// Busy timeout in milliseconds (default: 30000).
    pub busy_timeout_ms: u32,
    /// Cache size in KiB (default: 8192 = 8 MB).
    pub cache_size_kib: i64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            pool_size: 8,
            busy_timeout_ms: 30_000,
            cache_size_kib: 8192,
        }
    }
}

/// `SQLite` pragma customizer that runs on each new connection.
#[derive(Debug)]
struct PragmaCustomizer {
    busy_timeout_ms: u32,
    cache_size_kib: i64,
}

impl r2d2::CustomizeConnection<Connection, rusqlite::Error> for PragmaCustomizer {
    fn on_acquire(&self, conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = WAL;\
             PRAGMA busy_timeout = {};\
             PRAGMA cache_size = -{};\
             PRAGMA synchronous = NORMAL;",
            self.busy_timeout_ms, self.cache_size_kib
        ))?;
        Ok(())
    }
}

fn customizer(config: &ConnectionConfig) -> Box<PragmaCustomizer> {
    Box::new(PragmaCustomizer {
        busy_timeout_ms: config.busy_timeout_ms,
        cache_size_kib: config.cache_size_kib,
    })
}

/// Create an in-memory connection pool holding exactly one connection.
///
/// The connection never expires, so the database lives as long as the pool.
pub fn new_in_memory(config: &ConnectionConfig) -> Result<ConnectionPool> {
    let manager = SqliteConnectionManager::memory();
    let pool = Pool::builder()
        .max_size(1)
        .min_idle(Some(1))
        .idle_timeout(None)
        .max_lifetime(None)
        .connection_timeout(CHECKOUT_TIMEOUT)
        .connection_customizer(customizer(config))
        .build(manager)?;
    Ok(pool)
}

/// Create a file-backed connection pool, creating parent directories.
pub fn new_file(path: &Path, config: &ConnectionConfig) -> Result<ConnectionPool> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let manager = SqliteConnectionManager::file(path);
    let pool = Pool::builder()
        .max_size(config.pool_size.max(1))
        .connection_timeout(CHECKOUT_TIMEOUT)
        .connection_customizer(customizer(config))
        .build(manager)?;
    Ok(pool)
}

/// Read the journal mode of a connection.
pub fn journal_mode(conn: &Connection) -> Result<String> {
    conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))
        .map_err(StoreError::Sqlite)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
