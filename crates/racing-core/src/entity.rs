//! Keyed records of one kind, with a per-instance relation cache.
//!
//! An [`Entity`] wraps a [`Document`] and carries a [`RelationCache`] for
//! values derived from other collections (child lists, statistics). The
//! cache lives only as long as the instance: it is never persisted, never
//! invalidated, and a clone starts with an empty one.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::document::{Document, DocumentId, ID_FIELD, SCRAPED_AT_FIELD};
use crate::errors::RelationError;
use crate::fields;
use crate::kinds::Kind;
use crate::timestamp;

/// Memoised values keyed by relation name.
#[derive(Default)]
pub struct RelationCache {
    slots: HashMap<&'static str, Box<dyn Any + Send + Sync>>,
}

impl RelationCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached value for `relation`, if present and of type `T`.
    pub fn get<T: Any>(&self, relation: &str) -> Option<&T> {
        self.slots.get(relation)?.downcast_ref::<T>()
    }

    /// Store `value` under `relation`, replacing any previous value.
    pub fn insert<T: Any + Send + Sync>(&mut self, relation: &'static str, value: T) {
        let _ = self.slots.insert(relation, Box::new(value));
    }

    /// Whether any value is cached under `relation`.
    pub fn contains(&self, relation: &str) -> bool {
        self.slots.contains_key(relation)
    }

    /// Number of cached relations.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl fmt::Debug for RelationCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut relations: Vec<&str> = self.slots.keys().copied().collect();
        relations.sort_unstable();
        f.debug_struct("RelationCache")
            .field("relations", &relations)
            .finish()
    }
}

/// A mutable record of kind `K`.
pub struct Entity<K> {
    document: Document,
    cache: RelationCache,
    _kind: PhantomData<fn() -> K>,
}

impl<K: Kind> Entity<K> {
    /// Wrap a document. The relation cache starts empty.
    #[must_use]
    pub fn new(document: Document) -> Self {
        Self {
            document,
            cache: RelationCache::new(),
            _kind: PhantomData,
        }
    }

    /// The underlying document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Consume the entity, returning its document.
    pub fn into_document(self) -> Document {
        self.document
    }

    /// The store-assigned id, present only once persisted.
    pub fn id(&self) -> Option<DocumentId> {
        self.get_str(ID_FIELD).map(DocumentId::from)
    }

    /// Record the id assigned by the store.
    pub fn set_id(&mut self, id: &DocumentId) {
        self.set(ID_FIELD, id);
    }

    /// When the record was scraped, if it came from the remote source.
    pub fn scraped_at(&self) -> Option<DateTime<Utc>> {
        self.get_datetime(SCRAPED_AT_FIELD)
    }

    /// Raw field access.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.document.get(field)
    }

    /// Whether the field is present and not null.
    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some_and(|v| !v.is_null())
    }

    /// A string field.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field)?.as_str()
    }

    /// An integer field.
    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.get(field)?.as_i64()
    }

    /// A numeric field as a float.
    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.get(field)?.as_f64()
    }

    /// A calendar date field stored as `YYYY-MM-DD`.
    pub fn get_date(&self, field: &str) -> Option<NaiveDate> {
        timestamp::parse_date(self.get_str(field)?)
    }

    /// An instant field stored as RFC 3339.
    pub fn get_datetime(&self, field: &str) -> Option<DateTime<Utc>> {
        timestamp::parse(self.get_str(field)?)
    }

    /// Set a field, replacing any previous value.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        let _ = self.document.insert(field.to_owned(), value.into());
    }

    /// The relation cache of this instance.
    pub fn relations(&self) -> &RelationCache {
        &self.cache
    }

    /// Resolve `relation` once per instance.
    ///
    /// The first call runs `resolve` and caches its output; later calls
    /// return the cached value without running it. A failed resolution
    /// caches nothing. Asking for a relation under a type other than the
    /// one cached is a [`RelationError::TypeMismatch`].
    pub fn cached<T, E, F>(&mut self, relation: &'static str, resolve: F) -> Result<&T, E>
    where
        T: Any + Send + Sync,
        E: From<RelationError>,
        F: FnOnce(&Self) -> Result<T, E>,
    {
        if !self.cache.contains(relation) {
            let value = resolve(self)?;
            self.cache.insert(relation, value);
        }
        self.cache.get::<T>(relation).ok_or_else(|| {
            RelationError::TypeMismatch {
                relation,
                expected: std::any::type_name::<T>(),
            }
            .into()
        })
    }
}

impl<K: Kind> Clone for Entity<K> {
    fn clone(&self) -> Self {
        Self::new(self.document.clone())
    }
}

impl<K: Kind> PartialEq for Entity<K> {
    fn eq(&self, other: &Self) -> bool {
        self.document == other.document
    }
}

impl<K: Kind> From<Document> for Entity<K> {
    fn from(document: Document) -> Self {
        Self::new(document)
    }
}

impl<K: Kind> fmt::Debug for Entity<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("kind", &K::KIND)
            .field("document", &self.document)
            .field("cache", &self.cache)
            .finish()
    }
}

impl<K: Kind> fmt::Display for Entity<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(K::KIND.name())?;
        let mut labelled = false;
        for field in [fields::TRACK, fields::NAME, fields::NUMBER, fields::DATE] {
            match self.get(field) {
                Some(Value::String(s)) => write!(f, " {s}")?,
                Some(Value::Number(n)) => write!(f, " {n}")?,
                _ => continue,
            }
            labelled = true;
        }
        if !labelled {
            if let Some(url) = self.get_str(fields::URL) {
                write!(f, " {url}")?;
            }
        }
        if let Some(id) = self.id() {
            write!(f, " ({id})")?;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
