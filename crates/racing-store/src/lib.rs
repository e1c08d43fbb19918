//! # racing-store
//!
//! Persistence for racing documents.
//!
//! [`DocumentStore`] is the object-safe contract the repositories program
//! against: filtered find, insert, replace and delete by id, plus secondary
//! index declaration. [`SqliteStore`] implements it on a single
//! `documents(id, collection, body)` table behind an `r2d2` pool, with
//! filters rendered as `json_extract` predicates.

#![deny(unsafe_code)]

pub mod connection;
pub mod errors;
pub mod migrations;
pub mod query;
pub mod sqlite;
pub mod store;

pub use connection::{ConnectionConfig, ConnectionPool};
pub use errors::{Result, StoreError};
pub use sqlite::SqliteStore;
pub use store::DocumentStore;
