//! # racing-processor
//!
//! Traverses the racing hierarchy over a range of dates and runs
//! user-supplied [`Hooks`] on every visited entity.
//!
//! - [`Processor`] fans each date out on a fixed pool of worker threads and
//!   aborts the date on the first failure.
//! - [`iterate`] walks the same hierarchy depth-first on the calling thread.
//!
//! Only levels that a hook observes, directly or through a descendant, are
//! fetched. See [`TraversalPlan`].

#![deny(unsafe_code)]

pub mod dates;
pub mod errors;
pub mod hooks;
pub mod processor;
pub mod sequential;

pub use dates::DateRange;
pub use errors::{ProcessError, Result};
pub use hooks::{Hook, Hooks, TraversalPlan};
pub use processor::{DEFAULT_MESSAGE_PREFIX, Processor};
pub use sequential::iterate;
