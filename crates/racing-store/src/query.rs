//! Rendering of [`Filter`]s and index declarations as `SQLite` SQL.
//!
//! Collection and field names are restricted to ASCII identifiers and
//! inlined as literals, so a query's `collection = '<name>'` term and its
//! `json_extract(body, '$.<field>')` expressions match the partial
//! expression indexes created by [`create_index_sql`] exactly. Values are
//! always bound as parameters.

use racing_core::document::ID_FIELD;
use racing_core::{Condition, Filter};
use rusqlite::types::Value as SqlValue;
use serde_json::Value;

use crate::errors::{Result, StoreError};

/// A rendered `WHERE` clause and its positional parameters.
#[derive(Debug, PartialEq)]
pub struct WhereClause {
    /// SQL without the `WHERE` keyword.
    pub sql: String,
    /// Values for each `?` in order.
    pub params: Vec<SqlValue>,
}

/// Reject names that are not plain ASCII identifiers.
pub fn validate_name(what: &'static str, name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidField {
            what,
            name: name.to_owned(),
        })
    }
}

/// SQL expression selecting `field` from a document row.
pub fn field_expr(field: &str) -> Result<String> {
    if field == ID_FIELD {
        return Ok("id".to_owned());
    }
    validate_name("field", field)?;
    Ok(format!("json_extract(body, '$.{field}')"))
}

/// Render the conditions of `filter`, scoped to `collection`.
pub fn where_clause(collection: &str, filter: &Filter) -> Result<WhereClause> {
    validate_name("collection", collection)?;
    let mut sql = format!("collection = '{collection}'");
    let mut params = Vec::new();

    for (field, condition) in filter.clauses() {
        let expr = field_expr(field)?;
        match condition {
            Condition::Eq(Value::Null) => {
                sql.push_str(&format!(" AND {expr} IS NULL"));
            }
            Condition::Eq(value) => {
                params.push(bind(field, value)?);
                sql.push_str(&format!(" AND {expr} = ?"));
            }
            Condition::Lt(Value::Null) => {
                return Err(StoreError::UnsupportedFilter {
                    field: field.clone(),
                    reason: "null has no ordering".into(),
                });
            }
            Condition::Lt(value) => {
                params.push(bind(field, value)?);
                sql.push_str(&format!(" AND {expr} < ?"));
            }
        }
    }

    Ok(WhereClause { sql, params })
}

/// Name and `CREATE INDEX` statement for a partial expression index on
/// `fields` within `collection`.
pub fn create_index_sql(collection: &str, fields: &[&str]) -> Result<(String, String)> {
    validate_name("collection", collection)?;
    if fields.is_empty() {
        return Err(StoreError::InvalidField {
            what: "field",
            name: String::new(),
        });
    }
    let exprs = fields
        .iter()
        .map(|f| field_expr(f))
        .collect::<Result<Vec<_>>>()?;
    let name = format!(
        "idx_{collection}_{}",
        fields
            .iter()
            .map(|f| f.trim_start_matches('_'))
            .collect::<Vec<_>>()
            .join("_")
    );
    let sql = format!(
        "CREATE INDEX IF NOT EXISTS {name} ON documents({}) WHERE collection = '{collection}'",
        exprs.join(", ")
    );
    Ok((name, sql))
}

fn bind(field: &str, value: &Value) -> Result<SqlValue> {
    match value {
        Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Ok(SqlValue::Integer(i)),
            (None, Some(f)) => Ok(SqlValue::Real(f)),
            (None, None) => Err(StoreError::UnsupportedFilter {
                field: field.to_owned(),
                reason: format!("number {n} is not representable"),
            }),
        },
        Value::String(s) => Ok(SqlValue::Text(s.clone())),
        Value::Null => Ok(SqlValue::Null),
        Value::Array(_) | Value::Object(_) => Err(StoreError::UnsupportedFilter {
            field: field.to_owned(),
            reason: "arrays and objects cannot be compared".into(),
        }),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
