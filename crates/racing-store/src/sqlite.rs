//! [`DocumentStore`] backed by `SQLite`.
//!
//! Every collection lives in the shared `documents` table. A row's `body`
//! column holds the document as JSON with `_id` removed; the id has its own
//! primary-key column and is put back into the document on read.

use std::fmt;
use std::path::Path;

use racing_core::document::ID_FIELD;
use racing_core::{Document, DocumentId, Filter, timestamp};
use rusqlite::{OptionalExtension, params, params_from_iter};
use tracing::{debug, trace};

use crate::connection::{self, ConnectionConfig, ConnectionPool, PooledConnection};
use crate::errors::Result;
use crate::migrations::run_migrations;
use crate::query::{create_index_sql, validate_name, where_clause};
use crate::store::DocumentStore;

/// A secondary index recorded by [`DocumentStore::create_index`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeclaredIndex {
    /// `SQLite` index name.
    pub name: String,
    /// Collection the index is scoped to.
    pub collection: String,
    /// Indexed fields in order.
    pub fields: Vec<String>,
}

/// `SQLite` implementation of [`DocumentStore`].
#[derive(Clone)]
pub struct SqliteStore {
    pool: ConnectionPool,
}

impl SqliteStore {
    /// Open (or create) a database file and bring its schema up to date.
    pub fn open(path: &Path, config: &ConnectionConfig) -> Result<Self> {
        debug!(path = %path.display(), pool_size = config.pool_size, "opening document store");
        Self::from_pool(connection::new_file(path, config)?)
    }

    /// A private in-memory database, gone when the store is dropped.
    pub fn in_memory() -> Result<Self> {
        Self::from_pool(connection::new_in_memory(&ConnectionConfig::default())?)
    }

    /// Wrap an existing pool, running pending migrations first.
    pub fn from_pool(pool: ConnectionPool) -> Result<Self> {
        {
            let conn = pool.get()?;
            let _ = run_migrations(&conn)?;
        }
        Ok(Self { pool })
    }

    /// The underlying connection pool.
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Number of documents in `collection`.
    pub fn count(&self, collection: &str) -> Result<usize> {
        validate_name("collection", collection)?;
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE collection = ?1",
            params![collection],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Every index declared so far, ordered by name.
    pub fn declared_indexes(&self) -> Result<Vec<DeclaredIndex>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT name, collection, fields FROM declared_indexes ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        let mut indexes = Vec::new();
        for row in rows {
            let (name, collection, fields) = row?;
            indexes.push(DeclaredIndex {
                name,
                collection,
                fields: serde_json::from_str(&fields)?,
            });
        }
        Ok(indexes)
    }

    fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }

    fn select(&self, collection: &str, filter: &Filter, limit: Option<u32>) -> Result<Vec<Document>> {
        let clause = where_clause(collection, filter)?;
        let mut sql = format!(
            "SELECT id, body FROM documents WHERE {} ORDER BY rowid",
            clause.sql
        );
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        let conn = self.conn()?;
        let mut stmt = conn.prepare_cached(&sql)?;
        let rows = stmt.query_map(params_from_iter(clause.params.iter()), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut documents = Vec::new();
        for row in rows {
            let (id, body) = row?;
            documents.push(decode(id, &body)?);
        }
        trace!(collection, matched = documents.len(), "find");
        Ok(documents)
    }
}

impl DocumentStore for SqliteStore {
    fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>> {
        self.select(collection, filter, None)
    }

    fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>> {
        Ok(self.select(collection, filter, Some(1))?.into_iter().next())
    }

    fn insert(&self, collection: &str, document: &Document) -> Result<DocumentId> {
        validate_name("collection", collection)?;
        let id = DocumentId::generate(collection);
        let body = encode(document)?;
        let now = timestamp::format(&timestamp::now());
        let conn = self.conn()?;
        let _ = conn.execute(
            "INSERT INTO documents (id, collection, body, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![id.as_str(), collection, body, now],
        )?;
        trace!(collection, id = %id, "insert");
        Ok(id)
    }

    fn replace(&self, collection: &str, id: &DocumentId, document: &Document) -> Result<bool> {
        let body = encode(document)?;
        let now = timestamp::format(&timestamp::now());
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE documents SET body = ?1, updated_at = ?2 WHERE id = ?3 AND collection = ?4",
            params![body, now, id.as_str(), collection],
        )?;
        trace!(collection, id = %id, changed, "replace");
        Ok(changed > 0)
    }

    fn delete(&self, collection: &str, id: &DocumentId) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn.execute(
            "DELETE FROM documents WHERE id = ?1 AND collection = ?2",
            params![id.as_str(), collection],
        )?;
        trace!(collection, id = %id, changed, "delete");
        Ok(changed > 0)
    }

    fn create_index(&self, collection: &str, fields: &[&str]) -> Result<()> {
        let (name, sql) = create_index_sql(collection, fields)?;
        let conn = self.conn()?;
        conn.execute_batch(&sql)?;
        let existing: Option<String> = conn
            .query_row(
                "SELECT name FROM declared_indexes WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_none() {
            let _ = conn.execute(
                "INSERT INTO declared_indexes (name, collection, fields, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    name,
                    collection,
                    serde_json::to_string(fields)?,
                    timestamp::format(&timestamp::now())
                ],
            )?;
            debug!(collection, index = %name, "index created");
        }
        Ok(())
    }
}

impl fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.pool.state();
        f.debug_struct("SqliteStore")
            .field("connections", &state.connections)
            .field("idle_connections", &state.idle_connections)
            .finish()
    }
}

fn encode(document: &Document) -> Result<String> {
    let mut body = document.clone();
    let _ = body.remove(ID_FIELD);
    Ok(serde_json::to_string(&body)?)
}

fn decode(id: String, body: &str) -> Result<Document> {
    let mut document: Document = serde_json::from_str(body)?;
    let _ = document.insert(ID_FIELD.to_owned(), serde_json::Value::String(id));
    Ok(document)
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
