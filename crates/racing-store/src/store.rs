//! The document store contract.

use racing_core::{Document, DocumentId, Filter};

use crate::errors::Result;

/// Persistence for schemaless documents grouped in named collections.
///
/// Documents returned by reads carry their id under `_id`. Documents passed
/// to writes may carry `_id`; it is never stored in the body.
pub trait DocumentStore: Send + Sync {
    /// All documents of `collection` matching `filter`, in insertion order.
    fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Document>>;

    /// The first document of `collection` matching `filter`.
    fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>>;

    /// Insert a new document and return the id assigned to it.
    fn insert(&self, collection: &str, document: &Document) -> Result<DocumentId>;

    /// Replace the body of the document with `id`.
    ///
    /// Returns `false` if no such document exists; nothing is written then.
    fn replace(&self, collection: &str, id: &DocumentId, document: &Document) -> Result<bool>;

    /// Delete the document with `id`. Returns whether it existed.
    fn delete(&self, collection: &str, id: &DocumentId) -> Result<bool>;

    /// Declare a secondary index on `fields` of `collection`. Idempotent.
    fn create_index(&self, collection: &str, fields: &[&str]) -> Result<()>;
}
