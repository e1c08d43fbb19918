//! Generic cache-aside repository for one entity kind.
//!
//! Reads go to the store first. When nothing matches, the caller's scrape
//! closure fetches fresh records, which are stamped with `scraped_at` and
//! saved before being returned. Local and scraped results are never mixed.
//!
//! Expiry is explicit: a lookup passes the instant before which cached
//! records are stale, and those are deleted (with cascades) before the
//! store is queried.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use racing_core::document::SCRAPED_AT_FIELD;
use racing_core::{
    Document, DocumentId, Entity, EventManager, Filter, Kind, Lifecycle, ScrapeError, timestamp,
};
use racing_store::DocumentStore;
use tracing::debug;

use crate::errors::Result;

/// Lifecycle event names for one kind, computed once.
#[derive(Clone, Debug)]
struct EventNames {
    saving: String,
    saved: String,
    deleting: String,
    deleted: String,
}

/// Cache-aside access to the collection of kind `K`.
pub struct Repository<K> {
    store: Arc<dyn DocumentStore>,
    events: Arc<EventManager>,
    names: Arc<EventNames>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: Kind> Repository<K> {
    /// A repository over `store` publishing lifecycle events to `events`.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, events: Arc<EventManager>) -> Self {
        let names = EventNames {
            saving: Lifecycle::Saving.event_name(K::KIND),
            saved: Lifecycle::Saved.event_name(K::KIND),
            deleting: Lifecycle::Deleting.event_name(K::KIND),
            deleted: Lifecycle::Deleted.event_name(K::KIND),
        };
        Self {
            store,
            events,
            names: Arc::new(names),
            _kind: PhantomData,
        }
    }

    /// The store collection backing this repository.
    pub fn collection(&self) -> &'static str {
        K::KIND.collection()
    }

    /// Every cached entity matching `filter`.
    pub fn find(&self, filter: &Filter) -> Result<Vec<Entity<K>>> {
        Ok(self
            .store
            .find(self.collection(), filter)?
            .into_iter()
            .map(Entity::new)
            .collect())
    }

    /// The first cached entity matching `filter`.
    pub fn find_one(&self, filter: &Filter) -> Result<Option<Entity<K>>> {
        Ok(self.store.find_one(self.collection(), filter)?.map(Entity::new))
    }

    /// The cached entity with `id`.
    pub fn find_by_id(&self, id: &DocumentId) -> Result<Option<Entity<K>>> {
        self.find_one(&Filter::by_id(id))
    }

    /// Delete every entity matching `filter` that was scraped before
    /// `expiry`. Without an expiry nothing is deleted.
    ///
    /// Deletion goes through [`delete`](Self::delete), so cascades fire.
    pub fn delete_expired(&self, filter: &Filter, expiry: Option<DateTime<Utc>>) -> Result<usize> {
        let Some(expiry) = expiry else {
            return Ok(0);
        };
        let stale = self.find(
            &filter
                .clone()
                .lt(SCRAPED_AT_FIELD, timestamp::format(&expiry)),
        )?;
        for entity in &stale {
            let _ = self.delete(entity)?;
        }
        if !stale.is_empty() {
            debug!(
                collection = self.collection(),
                deleted = stale.len(),
                expiry = %timestamp::format(&expiry),
                "deleted expired"
            );
        }
        Ok(stale.len())
    }

    /// Cached entities matching `filter`, or freshly scraped ones when the
    /// cache has none.
    pub fn find_or_scrape<F>(
        &self,
        filter: &Filter,
        scrape: F,
        expiry: Option<DateTime<Utc>>,
    ) -> Result<Vec<Entity<K>>>
    where
        F: FnOnce() -> std::result::Result<Vec<Document>, ScrapeError>,
    {
        let _ = self.delete_expired(filter, expiry)?;
        let cached = self.find(filter)?;
        if !cached.is_empty() {
            return Ok(cached);
        }

        let scraped = scrape()?;
        let scraped_at = timestamp::format(&timestamp::now());
        let mut entities = Vec::with_capacity(scraped.len());
        for document in scraped {
            entities.push(self.save_scraped(document, &scraped_at)?);
        }
        debug!(collection = self.collection(), scraped = entities.len(), "scraped");
        Ok(entities)
    }

    /// The cached entity matching `filter`, or a freshly scraped one when
    /// the cache has none. `None` when the scrape yields nothing too.
    pub fn find_or_scrape_one<F>(
        &self,
        filter: &Filter,
        scrape: F,
        expiry: Option<DateTime<Utc>>,
    ) -> Result<Option<Entity<K>>>
    where
        F: FnOnce() -> std::result::Result<Option<Document>, ScrapeError>,
    {
        let _ = self.delete_expired(filter, expiry)?;
        if let Some(cached) = self.find_one(filter)? {
            return Ok(Some(cached));
        }

        let Some(document) = scrape()? else {
            debug!(collection = self.collection(), "scrape found nothing");
            return Ok(None);
        };
        let scraped_at = timestamp::format(&timestamp::now());
        let entity = self.save_scraped(document, &scraped_at)?;
        debug!(collection = self.collection(), scraped = 1, "scraped");
        Ok(Some(entity))
    }

    /// Persist `entity`: replace by id when it has one, insert otherwise.
    ///
    /// Publishes `saving_<kind>` before the write and `saved_<kind>` after.
    /// A newly inserted entity receives its id.
    pub fn save(&self, entity: &mut Entity<K>) -> Result<()> {
        self.events.publish(&self.names.saving, entity.document())?;
        match entity.id() {
            Some(id) => {
                if !self.store.replace(self.collection(), &id, entity.document())? {
                    debug!(collection = self.collection(), id = %id, "replace matched no document");
                }
            }
            None => {
                let id = self.store.insert(self.collection(), entity.document())?;
                entity.set_id(&id);
            }
        }
        self.events.publish(&self.names.saved, entity.document())?;
        Ok(())
    }

    /// Remove `entity` from the store. Entities without an id are ignored.
    ///
    /// Publishes `deleting_<kind>` before the delete (cascades run here)
    /// and `deleted_<kind>` after. Returns whether a delete was attempted.
    pub fn delete(&self, entity: &Entity<K>) -> Result<bool> {
        let Some(id) = entity.id() else {
            return Ok(false);
        };
        self.events.publish(&self.names.deleting, entity.document())?;
        let existed = self.store.delete(self.collection(), &id)?;
        self.events.publish(&self.names.deleted, entity.document())?;
        debug!(collection = self.collection(), id = %id, existed, "deleted");
        Ok(true)
    }

    /// Declare a secondary index on `fields`.
    pub fn create_index(&self, fields: &[&str]) -> Result<()> {
        self.store.create_index(self.collection(), fields)?;
        Ok(())
    }

    fn save_scraped(&self, document: Document, scraped_at: &str) -> Result<Entity<K>> {
        let mut entity = Entity::new(document);
        entity.set(SCRAPED_AT_FIELD, scraped_at);
        self.save(&mut entity)?;
        Ok(entity)
    }
}

impl<K> Clone for Repository<K> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            events: Arc::clone(&self.events),
            names: Arc::clone(&self.names),
            _kind: PhantomData,
        }
    }
}

impl<K: Kind> fmt::Debug for Repository<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Repository")
            .field("collection", &self.collection())
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
