//! Synchronous publish/subscribe for entity lifecycle events.
//!
//! Repositories publish `saving_<kind>`, `saved_<kind>`, `deleting_<kind>`
//! and `deleted_<kind>` around every write. Handlers run on the publishing
//! thread, in registration order. The first handler error stops dispatch
//! and is returned to the publisher.
//!
//! The subscriber list is snapshotted before dispatch, so handlers may
//! publish further events (cascading deletes do) or subscribe new handlers
//! without deadlocking.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::document::Document;
use crate::errors::EventError;
use crate::kinds::EntityKind;

/// A lifecycle event handler.
pub type EventHandler = Arc<dyn Fn(&Document) -> anyhow::Result<()> + Send + Sync>;

/// The four lifecycle points at which repositories publish.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    /// Before a document is inserted or replaced.
    Saving,
    /// After a document was inserted or replaced.
    Saved,
    /// Before a document is deleted.
    Deleting,
    /// After a document was deleted.
    Deleted,
}

impl Lifecycle {
    /// Event name for this point and kind, e.g. `deleting_meet`.
    pub fn event_name(self, kind: EntityKind) -> String {
        let prefix = match self {
            Lifecycle::Saving => "saving",
            Lifecycle::Saved => "saved",
            Lifecycle::Deleting => "deleting",
            Lifecycle::Deleted => "deleted",
        };
        format!("{prefix}_{}", kind.name())
    }
}

/// Registry of event handlers keyed by event name.
#[derive(Default)]
pub struct EventManager {
    subscribers: RwLock<HashMap<String, Vec<EventHandler>>>,
}

impl EventManager {
    /// Create an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `event`.
    ///
    /// Returns `false` if this exact handler (same `Arc` allocation) is
    /// already registered for the event.
    pub fn subscribe(&self, event: impl Into<String>, handler: EventHandler) -> bool {
        let event = event.into();
        let mut subscribers = self.subscribers.write();
        let handlers = subscribers.entry(event.clone()).or_default();
        if handlers.iter().any(|h| Arc::ptr_eq(h, &handler)) {
            trace!(event = %event, "handler already subscribed");
            return false;
        }
        handlers.push(handler);
        debug!(event = %event, count = handlers.len(), "handler subscribed");
        true
    }

    /// Call every handler of `event` with `document`.
    pub fn publish(&self, event: &str, document: &Document) -> Result<(), EventError> {
        let handlers = match self.subscribers.read().get(event) {
            Some(handlers) => handlers.clone(),
            None => return Ok(()),
        };
        trace!(event, handlers = handlers.len(), "publishing");
        for handler in &handlers {
            handler(document).map_err(|cause| EventError {
                event: event.to_owned(),
                cause,
            })?;
        }
        Ok(())
    }

    /// Number of handlers registered for `event`.
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.subscribers.read().get(event).map_or(0, Vec::len)
    }
}

impl fmt::Debug for EventManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subscribers = self.subscribers.read();
        let mut events: Vec<(&str, usize)> = subscribers
            .iter()
            .map(|(event, handlers)| (event.as_str(), handlers.len()))
            .collect();
        events.sort_unstable();
        f.debug_struct("EventManager")
            .field("events", &events)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recorder(log: &Arc<Mutex<Vec<String>>>, tag: &str) -> EventHandler {
        let log = Arc::clone(log);
        let tag = tag.to_owned();
        Arc::new(move |_doc: &Document| -> anyhow::Result<()> {
            log.lock().push(tag.clone());
            Ok(())
        })
    }

    #[test]
    fn event_names() {
        assert_eq!(Lifecycle::Deleting.event_name(EntityKind::Meet), "deleting_meet");
        assert_eq!(Lifecycle::Saved.event_name(EntityKind::Performance), "saved_performance");
    }

    #[test]
    fn publish_without_subscribers_is_ok() {
        let events = EventManager::new();
        assert!(events.publish("saved_meet", &Document::new()).is_ok());
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let events = EventManager::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        assert!(events.subscribe("saved_meet", recorder(&log, "a")));
        assert!(events.subscribe("saved_meet", recorder(&log, "b")));
        assert!(events.subscribe("saved_race", recorder(&log, "other")));

        events.publish("saved_meet", &Document::new()).unwrap();
        assert_eq!(*log.lock(), ["a", "b"]);
    }

    #[test]
    fn subscribe_is_idempotent_per_handler() {
        let events = EventManager::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let handler = recorder(&log, "once");
        assert!(events.subscribe("deleting_horse", Arc::clone(&handler)));
        assert!(!events.subscribe("deleting_horse", Arc::clone(&handler)));
        assert!(events.subscribe("deleted_horse", handler));
        assert_eq!(events.subscriber_count("deleting_horse"), 1);

        events.publish("deleting_horse", &Document::new()).unwrap();
        assert_eq!(log.lock().len(), 1);
    }

    #[test]
    fn first_error_stops_dispatch() {
        let events = EventManager::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let _ = events.subscribe("saving_race", recorder(&log, "before"));
        let _ = events.subscribe(
            "saving_race",
            Arc::new(|_doc: &Document| -> anyhow::Result<()> { anyhow::bail!("rejected") }),
        );
        let _ = events.subscribe("saving_race", recorder(&log, "after"));

        let err = events.publish("saving_race", &Document::new()).unwrap_err();
        assert_eq!(err.event, "saving_race");
        assert_eq!(err.cause.to_string(), "rejected");
        assert_eq!(*log.lock(), ["before"]);
    }

    #[test]
    fn handlers_may_publish_reentrantly() {
        let events = Arc::new(EventManager::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let _ = events.subscribe("deleting_race", recorder(&log, "race"));
        let inner = Arc::clone(&events);
        let _ = events.subscribe(
            "deleting_meet",
            Arc::new(move |doc: &Document| -> anyhow::Result<()> {
                inner.publish("deleting_race", doc)?;
                Ok(())
            }),
        );

        events.publish("deleting_meet", &Document::new()).unwrap();
        assert_eq!(*log.lock(), ["race"]);
    }
}
