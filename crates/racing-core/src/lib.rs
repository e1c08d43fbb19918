//! # racing-core
//!
//! Foundation types shared by every racing crate.
//!
//! - [`document`]: schemaless documents, store-assigned ids, and filters
//! - [`kinds`]: the seven entity kinds and their collections
//! - [`entity`]: the keyed [`Entity`] record with its per-instance relation cache
//! - [`events`]: the synchronous [`EventManager`] used for lifecycle events
//! - [`scraper`]: the [`Scraper`] contract for the remote source
//! - [`fixture`]: a deterministic in-process scraper for tests and demos

#![deny(unsafe_code)]

pub mod document;
pub mod entity;
pub mod errors;
pub mod events;
pub mod fields;
pub mod fixture;
pub mod kinds;
pub mod scraper;
pub mod timestamp;

pub use document::{Condition, Document, DocumentId, Filter};
pub use entity::{Entity, RelationCache};
pub use errors::{EventError, RelationError, ScrapeError};
pub use events::{EventHandler, EventManager, Lifecycle};
pub use kinds::{EntityKind, Horse, Jockey, Kind, Meet, Performance, Race, Runner, Trainer};
pub use scraper::{OfflineScraper, Scraper};
