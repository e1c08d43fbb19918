//! Schemaless documents, store-assigned ids, and query filters.
//!
//! A [`Document`] is a plain JSON object. The store assigns each persisted
//! document a [`DocumentId`] and exposes it under the [`ID_FIELD`] key.
//! A [`Filter`] is a conjunction of equality and less-than conditions on
//! top-level fields.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// A schemaless record: a JSON object with arbitrary top-level fields.
pub type Document = Map<String, Value>;

/// Field under which a persisted document exposes its id.
pub const ID_FIELD: &str = "_id";

/// Field holding the UTC time at which a document was scraped.
pub const SCRAPED_AT_FIELD: &str = "scraped_at";

/// Identifier assigned by the store when a document is first inserted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Generate a new id for the given collection (UUID v7, time-ordered).
    #[must_use]
    pub fn generate(collection: &str) -> Self {
        Self(format!("{collection}-{}", Uuid::now_v7()))
    }

    /// Create from an existing string value.
    #[must_use]
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    /// Return the inner string as a slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume self and return the inner `String`.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::ops::Deref for DocumentId {
    type Target = str;
    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<DocumentId> for Value {
    fn from(id: DocumentId) -> Self {
        Value::String(id.0)
    }
}

impl From<&DocumentId> for Value {
    fn from(id: &DocumentId) -> Self {
        Value::String(id.0.clone())
    }
}

/// A single predicate on one field.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    /// The field equals the value. `Null` matches a missing field.
    Eq(Value),
    /// The field is strictly less than the value.
    Lt(Value),
}

/// A conjunction of [`Condition`]s on top-level document fields.
///
/// Clauses keep their insertion order so stores can render stable queries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, Condition)>,
}

impl Filter {
    /// An empty filter matching every document in a collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A filter matching a single document by id.
    #[must_use]
    pub fn by_id(id: &DocumentId) -> Self {
        Self::new().eq(ID_FIELD, id)
    }

    /// Add an equality clause.
    #[must_use]
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((field.into(), Condition::Eq(value.into())));
        self
    }

    /// Add a strict less-than clause.
    #[must_use]
    pub fn lt(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((field.into(), Condition::Lt(value.into())));
        self
    }

    /// The clauses in insertion order.
    pub fn clauses(&self) -> &[(String, Condition)] {
        &self.clauses
    }

    /// Whether the filter has no clauses.
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Evaluate the filter against an in-memory document.
    ///
    /// Numbers compare numerically and strings lexically. Values of
    /// different JSON types never satisfy `Lt`.
    pub fn matches(&self, document: &Document) -> bool {
        self.clauses.iter().all(|(field, condition)| {
            let actual = document.get(field).unwrap_or(&Value::Null);
            match condition {
                Condition::Eq(expected) => values_equal(actual, expected),
                Condition::Lt(bound) => value_less_than(actual, bound),
            }
        })
    }
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => (a - b).abs() < f64::EPSILON,
        _ => actual == expected,
    }
}

fn value_less_than(actual: &Value, bound: &Value) -> bool {
    match (actual, bound) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        },
        (Value::String(a), Value::String(b)) => a < b,
        _ => false,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn generated_ids_carry_collection_prefix() {
        let id = DocumentId::generate("meets");
        assert!(id.as_str().starts_with("meets-"));
        assert_ne!(id, DocumentId::generate("meets"));
    }

    #[test]
    fn document_id_serde_transparent() {
        let id = DocumentId::from("races-1");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"races-1\"");
        let back: DocumentId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn document_id_into_value() {
        let id = DocumentId::from("runners-7");
        assert_eq!(Value::from(&id), json!("runners-7"));
    }

    #[test]
    fn filter_keeps_clause_order() {
        let filter = Filter::new().eq("date", "2016-02-01").lt("scraped_at", "2016-02-02");
        let fields: Vec<&str> = filter.clauses().iter().map(|(f, _)| f.as_str()).collect();
        assert_eq!(fields, ["date", "scraped_at"]);
        assert_eq!(filter.clauses()[1].1, Condition::Lt(json!("2016-02-02")));
    }

    #[test]
    fn by_id_targets_id_field() {
        let filter = Filter::by_id(&DocumentId::from("meets-1"));
        assert_eq!(filter.clauses(), [(ID_FIELD.to_owned(), Condition::Eq(json!("meets-1")))]);
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::new().is_empty());
        assert!(Filter::new().matches(&doc(json!({"a": 1}))));
    }

    #[test]
    fn matches_equality_and_missing_fields() {
        let d = doc(json!({"track": "Kilmore", "number": 3}));
        assert!(Filter::new().eq("track", "Kilmore").matches(&d));
        assert!(Filter::new().eq("number", 3.0).matches(&d));
        assert!(!Filter::new().eq("track", "Flemington").matches(&d));
        assert!(Filter::new().eq("meet_id", Value::Null).matches(&d));
    }

    #[test]
    fn matches_less_than() {
        let d = doc(json!({"scraped_at": "2016-02-01T00:00:00.000000Z", "number": 3}));
        assert!(Filter::new().lt("scraped_at", "2016-02-02T00:00:00.000000Z").matches(&d));
        assert!(!Filter::new().lt("scraped_at", "2016-01-31T00:00:00.000000Z").matches(&d));
        assert!(Filter::new().lt("number", 4).matches(&d));
        assert!(!Filter::new().lt("number", "4").matches(&d));
    }
}
