//! # racing-queue
//!
//! A fixed pool of worker threads draining a shared FIFO of fallible tasks.
//!
//! Tasks may enqueue further tasks through a [`QueueHandle`], and
//! [`WorkerQueue::join`] waits for the whole transitive fan-out: a task's
//! pending slot is released only after it finishes, by which time all of
//! its children are already counted.
//!
//! The first task error or panic becomes the queue's fault. The queue then
//! stops accepting work and discards everything not yet started.

#![deny(unsafe_code)]

pub mod errors;
pub mod queue;

pub use errors::QueueError;
pub use queue::{QueueHandle, WorkerQueue};
