//! # racing-repository
//!
//! Cache-aside access to racing data.
//!
//! A [`Repository`] serves one entity kind from the store and falls back to
//! the scraper when nothing is cached, deleting expired records first. The
//! [`Racing`] facade owns one repository per kind and provides the lookups
//! that navigate the hierarchy (meet → race → runner → horse/jockey/trainer,
//! horse → performances). Deleting a parent cascades to its children
//! through lifecycle event handlers registered by [`Racing::new`].
//!
//! [`PerformanceList`] is a read-only statistical view over performances.

#![deny(unsafe_code)]

pub mod cascade;
pub mod errors;
mod locks;
pub mod racing;
pub mod repository;
pub mod stats;

pub use errors::{RepositoryError, Result};
pub use racing::Racing;
pub use repository::Repository;
pub use stats::PerformanceList;
