//! The racing facade: one repository per kind plus the hierarchy lookups.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use racing_core::{
    Document, DocumentId, Entity, EntityKind, EventManager, Filter, Horse, Jockey, Kind, Meet,
    Performance, Race, Runner, Scraper, Trainer, fields, timestamp,
};
use racing_store::DocumentStore;
use tracing::{debug, info};

use crate::cascade;
use crate::errors::{RepositoryError, Result};
use crate::locks::KeyedLocks;
use crate::repository::Repository;
use crate::stats::PerformanceList;

/// Relation name under which an entity caches its performance list.
const PERFORMANCES: &str = "performances";

/// Secondary indexes declared by [`Racing::initialize`].
const INDEXES: &[(EntityKind, &[&str])] = &[
    (EntityKind::Meet, &[fields::DATE]),
    (EntityKind::Meet, &[fields::DATE, "scraped_at"]),
    (EntityKind::Race, &[fields::MEET_ID]),
    (EntityKind::Race, &[fields::MEET_ID, "scraped_at"]),
    (EntityKind::Runner, &[fields::RACE_ID]),
    (EntityKind::Runner, &[fields::RACE_ID, "scraped_at"]),
    (EntityKind::Horse, &[fields::URL]),
    (EntityKind::Horse, &[fields::URL, "scraped_at"]),
    (EntityKind::Jockey, &[fields::URL]),
    (EntityKind::Jockey, &[fields::URL, "scraped_at"]),
    (EntityKind::Trainer, &[fields::URL]),
    (EntityKind::Trainer, &[fields::URL, "scraped_at"]),
    (EntityKind::Performance, &[fields::HORSE_URL]),
    (EntityKind::Performance, &[fields::HORSE_URL, "scraped_at"]),
    (EntityKind::Performance, &[fields::JOCKEY_URL]),
];

/// Cache-aside access to the whole racing hierarchy.
///
/// Construct with [`Racing::new`], which also registers the cascading
/// delete handlers on the facade's own [`EventManager`].
///
/// Lookups keyed by URL (horses, jockeys, trainers and a horse's
/// performances) hold a per-URL lock from expiry to save, so concurrent
/// callers sharing a URL store one copy.
pub struct Racing {
    store: Arc<dyn DocumentStore>,
    scraper: Arc<dyn Scraper>,
    events: Arc<EventManager>,
    meets: Repository<Meet>,
    races: Repository<Race>,
    runners: Repository<Runner>,
    horses: Repository<Horse>,
    jockeys: Repository<Jockey>,
    trainers: Repository<Trainer>,
    performances: Repository<Performance>,
    by_url: KeyedLocks,
}

impl Racing {
    /// Build the facade over `store` and `scraper`.
    pub fn new(store: Arc<dyn DocumentStore>, scraper: Arc<dyn Scraper>) -> Arc<Self> {
        let events = Arc::new(EventManager::new());
        Arc::new_cyclic(|weak| {
            cascade::register(&events, weak);
            Self {
                meets: Repository::new(Arc::clone(&store), Arc::clone(&events)),
                races: Repository::new(Arc::clone(&store), Arc::clone(&events)),
                runners: Repository::new(Arc::clone(&store), Arc::clone(&events)),
                horses: Repository::new(Arc::clone(&store), Arc::clone(&events)),
                jockeys: Repository::new(Arc::clone(&store), Arc::clone(&events)),
                trainers: Repository::new(Arc::clone(&store), Arc::clone(&events)),
                performances: Repository::new(Arc::clone(&store), Arc::clone(&events)),
                by_url: KeyedLocks::new(),
                store,
                scraper,
                events,
            }
        })
    }

    /// Declare the secondary indexes the lookups rely on.
    pub fn initialize(&self) -> Result<()> {
        for (kind, index_fields) in INDEXES {
            self.store.create_index(kind.collection(), index_fields)?;
        }
        info!(indexes = INDEXES.len(), "racing store initialized");
        Ok(())
    }

    /// The lifecycle event manager shared by every repository.
    pub fn events(&self) -> &Arc<EventManager> {
        &self.events
    }

    /// The scraper used on cache misses.
    pub fn scraper(&self) -> &Arc<dyn Scraper> {
        &self.scraper
    }

    /// The underlying document store.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// The meet repository.
    pub fn meets(&self) -> &Repository<Meet> {
        &self.meets
    }

    /// The race repository.
    pub fn races(&self) -> &Repository<Race> {
        &self.races
    }

    /// The runner repository.
    pub fn runners(&self) -> &Repository<Runner> {
        &self.runners
    }

    /// The horse repository.
    pub fn horses(&self) -> &Repository<Horse> {
        &self.horses
    }

    /// The jockey repository.
    pub fn jockeys(&self) -> &Repository<Jockey> {
        &self.jockeys
    }

    /// The trainer repository.
    pub fn trainers(&self) -> &Repository<Trainer> {
        &self.trainers
    }

    /// The performance repository.
    pub fn performances(&self) -> &Repository<Performance> {
        &self.performances
    }

    // ── Hierarchy lookups ───────────────────────────────────────────────────

    /// Meets held on `date`. Records scraped before that day are stale.
    pub fn meets_by_date(&self, date: NaiveDate) -> Result<Vec<Entity<Meet>>> {
        self.meets.find_or_scrape(
            &Filter::new().eq(fields::DATE, timestamp::format_date(date)),
            || self.scraper.scrape_meets(date),
            Some(timestamp::start_of_day(date)),
        )
    }

    /// Races of `meet`, back-filling `meet_id` on freshly scraped races.
    pub fn races_by_meet(&self, meet: &Entity<Meet>) -> Result<Vec<Entity<Race>>> {
        let meet_id = require_id(meet)?;
        let date = require_date(meet, fields::DATE)?;
        let mut races = self.races.find_or_scrape(
            &Filter::new().eq(fields::MEET_ID, meet_id.as_str()),
            || self.scraper.scrape_races(meet),
            Some(timestamp::start_of_day(date)),
        )?;
        backfill(&self.races, &mut races, fields::MEET_ID, &meet_id)?;
        Ok(races)
    }

    /// Runners of `race`, back-filling `race_id` on freshly scraped runners.
    /// Records scraped before the race start are stale.
    pub fn runners_by_race(&self, race: &Entity<Race>) -> Result<Vec<Entity<Runner>>> {
        let race_id = require_id(race)?;
        let mut runners = self.runners.find_or_scrape(
            &Filter::new().eq(fields::RACE_ID, race_id.as_str()),
            || self.scraper.scrape_runners(race),
            start_time(race)?,
        )?;
        backfill(&self.runners, &mut runners, fields::RACE_ID, &race_id)?;
        Ok(runners)
    }

    /// The horse a runner rides, if the runner names one.
    pub fn horse_by_runner(&self, runner: &Entity<Runner>) -> Result<Option<Entity<Horse>>> {
        let Some(url) = runner.get_str(fields::HORSE_URL) else {
            return Ok(None);
        };
        let expiry = self.runner_expiry(runner)?;
        self.serialized(EntityKind::Horse, url, || {
            self.horses.find_or_scrape_one(
                &Filter::new().eq(fields::URL, url),
                || self.scraper.scrape_horse(url),
                expiry,
            )
        })
    }

    /// The jockey of a runner, if the runner names one.
    pub fn jockey_by_runner(&self, runner: &Entity<Runner>) -> Result<Option<Entity<Jockey>>> {
        let Some(url) = runner.get_str(fields::JOCKEY_URL) else {
            return Ok(None);
        };
        let expiry = self.runner_expiry(runner)?;
        self.jockey_by_url(url, expiry)
    }

    /// The trainer of a runner, if the runner names one.
    pub fn trainer_by_runner(&self, runner: &Entity<Runner>) -> Result<Option<Entity<Trainer>>> {
        let Some(url) = runner.get_str(fields::TRAINER_URL) else {
            return Ok(None);
        };
        let expiry = self.runner_expiry(runner)?;
        self.serialized(EntityKind::Trainer, url, || {
            self.trainers.find_or_scrape_one(
                &Filter::new().eq(fields::URL, url),
                || self.scraper.scrape_trainer(url),
                expiry,
            )
        })
    }

    /// The jockey profile at `url`.
    pub fn jockey_by_url(
        &self,
        url: &str,
        expiry: Option<DateTime<Utc>>,
    ) -> Result<Option<Entity<Jockey>>> {
        self.serialized(EntityKind::Jockey, url, || {
            self.jockeys.find_or_scrape_one(
                &Filter::new().eq(fields::URL, url),
                || self.scraper.scrape_jockey(url),
                expiry,
            )
        })
    }

    /// The jockey who rode in `performance`. Cached profiles never expire
    /// through this lookup.
    pub fn jockey_by_performance(
        &self,
        performance: &Entity<Performance>,
    ) -> Result<Option<Entity<Jockey>>> {
        match performance.get_str(fields::JOCKEY_URL) {
            Some(url) => self.jockey_by_url(url, None),
            None => Ok(None),
        }
    }

    /// Past performances of `horse`. Form is historical, so it never expires.
    pub fn performances_by_horse(&self, horse: &Entity<Horse>) -> Result<Vec<Entity<Performance>>> {
        let url = require_str(horse, fields::URL)?;
        self.serialized(EntityKind::Performance, url, || {
            self.performances.find_or_scrape(
                &Filter::new().eq(fields::HORSE_URL, url),
                || self.scraper.scrape_performances(url),
                None,
            )
        })
    }

    /// Statistics over the form of `horse`, resolved once per instance.
    pub fn horse_form<'h>(&self, horse: &'h mut Entity<Horse>) -> Result<&'h PerformanceList> {
        horse.cached(PERFORMANCES, |horse| {
            self.performances_by_horse(horse).map(PerformanceList::new)
        })
    }

    /// Statistics over the cached rides of `jockey`, resolved once per
    /// instance. Only performances already in the store are considered.
    pub fn performances_by_jockey<'j>(
        &self,
        jockey: &'j mut Entity<Jockey>,
    ) -> Result<&'j PerformanceList> {
        jockey.cached(PERFORMANCES, |jockey| -> Result<PerformanceList> {
            let url = require_str(jockey, fields::URL)?;
            let rides = self
                .performances
                .find(&Filter::new().eq(fields::JOCKEY_URL, url))?;
            Ok(PerformanceList::new(rides))
        })
    }

    // ── Back-references ─────────────────────────────────────────────────────

    /// The meet `race` belongs to.
    pub fn meet_of(&self, race: &Entity<Race>) -> Result<Option<Entity<Meet>>> {
        match race.get_str(fields::MEET_ID) {
            Some(id) => self.meets.find_by_id(&DocumentId::from(id)),
            None => Ok(None),
        }
    }

    /// The race `runner` belongs to.
    pub fn race_of(&self, runner: &Entity<Runner>) -> Result<Option<Entity<Race>>> {
        match runner.get_str(fields::RACE_ID) {
            Some(id) => self.races.find_by_id(&DocumentId::from(id)),
            None => Ok(None),
        }
    }

    /// Run a cache-aside lookup of `kind` keyed by `url` under that URL's lock.
    fn serialized<T>(&self, kind: EntityKind, url: &str, lookup: impl FnOnce() -> T) -> T {
        self.by_url.with(&format!("{}:{url}", kind.collection()), lookup)
    }

    /// Profiles of a runner are stale once its race has started. A runner
    /// whose race is gone has no expiry.
    fn runner_expiry(&self, runner: &Entity<Runner>) -> Result<Option<DateTime<Utc>>> {
        match self.race_of(runner)? {
            Some(race) => start_time(&race),
            None => Ok(None),
        }
    }
}

impl fmt::Debug for Racing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Racing")
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

/// Set `field` to `parent` on every entity lacking it and save the change.
fn backfill<K: Kind>(
    repository: &Repository<K>,
    entities: &mut [Entity<K>],
    field: &'static str,
    parent: &DocumentId,
) -> Result<()> {
    let mut filled = 0_usize;
    for entity in entities.iter_mut().filter(|e| !e.contains(field)) {
        entity.set(field, parent.as_str());
        repository.save(entity)?;
        filled += 1;
    }
    if filled > 0 {
        debug!(collection = repository.collection(), field, filled, "back-filled");
    }
    Ok(())
}

fn require_id<K: Kind>(entity: &Entity<K>) -> Result<DocumentId> {
    entity.id().ok_or(RepositoryError::MissingField {
        kind: K::KIND,
        field: racing_core::document::ID_FIELD,
    })
}

fn require_str<'e, K: Kind>(entity: &'e Entity<K>, field: &'static str) -> Result<&'e str> {
    entity.get_str(field).ok_or(RepositoryError::MissingField {
        kind: K::KIND,
        field,
    })
}

fn require_date<K: Kind>(entity: &Entity<K>, field: &'static str) -> Result<NaiveDate> {
    let raw = require_str(entity, field)?;
    timestamp::parse_date(raw).ok_or_else(|| RepositoryError::InvalidField {
        kind: K::KIND,
        field,
        message: format!("expected YYYY-MM-DD, got {raw:?}"),
    })
}

/// The start time of `race`, if it has one.
fn start_time(race: &Entity<Race>) -> Result<Option<DateTime<Utc>>> {
    let Some(raw) = race.get_str(fields::START_TIME) else {
        return Ok(None);
    };
    timestamp::parse(raw)
        .map(Some)
        .ok_or_else(|| RepositoryError::InvalidField {
            kind: EntityKind::Race,
            field: fields::START_TIME,
            message: format!("expected an RFC 3339 timestamp, got {raw:?}"),
        })
}

/// Wrap a raw document as an entity of kind `K`.
pub(crate) fn entity<K: Kind>(document: &Document) -> Entity<K> {
    Entity::new(document.clone())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
