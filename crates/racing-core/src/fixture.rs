//! A deterministic, in-process [`Scraper`] that fabricates a racing
//! hierarchy of configurable shape.
//!
//! Every call is counted per [`ScrapeTarget`], and any target can be made to
//! fail on demand. Horse URLs are unique per runner. Jockeys and trainers
//! come from a small pool per date, so one profile is shared by runners in
//! many races of the same day.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{Duration, NaiveDate, NaiveTime};
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::document::Document;
use crate::entity::Entity;
use crate::errors::ScrapeError;
use crate::fields;
use crate::kinds::{Meet, Race};
use crate::scraper::Scraper;
use crate::timestamp;

const TRACKS: &[&str] = &[
    "Flemington",
    "Randwick",
    "Eagle Farm",
    "Morphettville",
    "Ascot",
    "Kilmore",
];

/// The scraper entry points, for call counting and failure injection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScrapeTarget {
    /// [`Scraper::scrape_meets`].
    Meets,
    /// [`Scraper::scrape_races`].
    Races,
    /// [`Scraper::scrape_runners`].
    Runners,
    /// [`Scraper::scrape_horse`].
    Horse,
    /// [`Scraper::scrape_jockey`].
    Jockey,
    /// [`Scraper::scrape_trainer`].
    Trainer,
    /// [`Scraper::scrape_performances`].
    Performances,
}

impl ScrapeTarget {
    const ALL: [ScrapeTarget; 7] = [
        ScrapeTarget::Meets,
        ScrapeTarget::Races,
        ScrapeTarget::Runners,
        ScrapeTarget::Horse,
        ScrapeTarget::Jockey,
        ScrapeTarget::Trainer,
        ScrapeTarget::Performances,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// How many children each level of the fabricated hierarchy has.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixtureShape {
    /// Meets per date.
    pub meets_per_day: usize,
    /// Races per meet.
    pub races_per_meet: usize,
    /// Runners per race.
    pub runners_per_race: usize,
    /// Past performances per horse.
    pub performances_per_horse: usize,
    /// Distinct jockeys riding on one date.
    pub jockeys_per_day: usize,
    /// Distinct trainers with runners on one date.
    pub trainers_per_day: usize,
}

impl Default for FixtureShape {
    fn default() -> Self {
        Self {
            meets_per_day: 2,
            races_per_meet: 3,
            runners_per_race: 4,
            performances_per_horse: 3,
            jockeys_per_day: 5,
            trainers_per_day: 3,
        }
    }
}

impl FixtureShape {
    /// Visits per date at each level, in traversal order from meets to
    /// performances. Jockeys and trainers count once per runner even
    /// though runners share them.
    pub fn per_day(&self) -> [usize; 7] {
        let meets = self.meets_per_day;
        let races = meets * self.races_per_meet;
        let runners = races * self.runners_per_race;
        [
            meets,
            races,
            runners,
            runners,
            runners,
            runners,
            runners * self.performances_per_horse,
        ]
    }
}

/// Deterministic synthetic scraper.
#[derive(Debug)]
pub struct FixtureScraper {
    shape: FixtureShape,
    calls: [AtomicUsize; 7],
    failing: Mutex<HashSet<ScrapeTarget>>,
    failing_dates: Mutex<HashSet<NaiveDate>>,
}

impl Default for FixtureScraper {
    fn default() -> Self {
        Self::new(FixtureShape::default())
    }
}

impl FixtureScraper {
    /// A scraper producing hierarchies of the given shape.
    #[must_use]
    pub fn new(shape: FixtureShape) -> Self {
        Self {
            shape,
            calls: Default::default(),
            failing: Mutex::new(HashSet::new()),
            failing_dates: Mutex::new(HashSet::new()),
        }
    }

    /// The configured shape.
    pub fn shape(&self) -> FixtureShape {
        self.shape
    }

    /// Make every call to `target` fail until [`recover`](Self::recover).
    pub fn fail(&self, target: ScrapeTarget) {
        let _ = self.failing.lock().insert(target);
    }

    /// Make meet scrapes for `date` fail.
    pub fn fail_meets_on(&self, date: NaiveDate) {
        let _ = self.failing_dates.lock().insert(date);
    }

    /// Stop failing calls to `target`.
    pub fn recover(&self, target: ScrapeTarget) {
        let _ = self.failing.lock().remove(&target);
    }

    /// Number of calls made to `target` so far, failed ones included.
    pub fn calls(&self, target: ScrapeTarget) -> usize {
        self.calls[target.index()].load(Ordering::SeqCst)
    }

    /// Number of calls made to any target.
    pub fn total_calls(&self) -> usize {
        ScrapeTarget::ALL.iter().map(|t| self.calls(*t)).sum()
    }

    fn enter(&self, target: ScrapeTarget) -> Result<(), ScrapeError> {
        let _ = self.calls[target.index()].fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().contains(&target) {
            return Err(ScrapeError::Failed(format!("injected failure for {target:?}")));
        }
        Ok(())
    }
}

impl Scraper for FixtureScraper {
    fn scrape_meets(&self, date: NaiveDate) -> Result<Vec<Document>, ScrapeError> {
        self.enter(ScrapeTarget::Meets)?;
        if self.failing_dates.lock().contains(&date) {
            return Err(ScrapeError::Failed(format!("injected failure for meets on {date}")));
        }
        let day = timestamp::format_date(date);
        Ok((0..self.shape.meets_per_day)
            .map(|i| {
                let base = TRACKS[i % TRACKS.len()];
                let track = match i / TRACKS.len() {
                    0 => base.to_owned(),
                    lap => format!("{base} {}", lap + 1),
                };
                object(json!({
                    "date": day,
                    "track": track,
                    "url": format!("/meets/{day}/{}", i + 1),
                }))
            })
            .collect())
    }

    fn scrape_races(&self, meet: &Entity<Meet>) -> Result<Vec<Document>, ScrapeError> {
        self.enter(ScrapeTarget::Races)?;
        let date = meet.get_date(fields::DATE).ok_or_else(|| ScrapeError::Parse {
            what: "meet".into(),
            message: format!("{meet} has no date"),
        })?;
        let track = meet.get_str(fields::TRACK).unwrap_or("Unknown");
        let first_race = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN);
        let first = date.and_time(first_race).and_utc();
        Ok((1..=self.shape.races_per_meet)
            .map(|number| {
                let offset = Duration::minutes(35 * i64::try_from(number - 1).unwrap_or(0));
                object(json!({
                    "number": number,
                    "name": format!("{track} Race {number}"),
                    "start_time": timestamp::format(&(first + offset)),
                    "distance": 1000 + 200 * number,
                }))
            })
            .collect())
    }

    fn scrape_runners(&self, race: &Entity<Race>) -> Result<Vec<Document>, ScrapeError> {
        self.enter(ScrapeTarget::Runners)?;
        let race_number = race
            .get_i64(fields::NUMBER)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(1);
        let key = race
            .id()
            .map_or_else(|| format!("race-{race_number}"), crate::DocumentId::into_inner);
        let day = race
            .get_str(fields::START_TIME)
            .and_then(|start| start.get(..10))
            .unwrap_or("undated");
        let per_race = self.shape.runners_per_race;
        Ok((1..=per_race)
            .map(|number| {
                let slot = race_number.saturating_sub(1) * per_race + number - 1;
                let jockey = slot % self.shape.jockeys_per_day.max(1) + 1;
                let trainer = slot % self.shape.trainers_per_day.max(1) + 1;
                object(json!({
                    "number": number,
                    "barrier": per_race + 1 - number,
                    "horse_url": format!("/horses/{key}-{number}"),
                    "jockey_url": format!("/jockeys/{day}-{jockey}"),
                    "trainer_url": format!("/trainers/{day}-{trainer}"),
                }))
            })
            .collect())
    }

    fn scrape_horse(&self, url: &str) -> Result<Option<Document>, ScrapeError> {
        self.enter(ScrapeTarget::Horse)?;
        Ok(Some(profile(url, "Horse")))
    }

    fn scrape_jockey(&self, url: &str) -> Result<Option<Document>, ScrapeError> {
        self.enter(ScrapeTarget::Jockey)?;
        Ok(Some(profile(url, "Jockey")))
    }

    fn scrape_trainer(&self, url: &str) -> Result<Option<Document>, ScrapeError> {
        self.enter(ScrapeTarget::Trainer)?;
        Ok(Some(profile(url, "Trainer")))
    }

    fn scrape_performances(&self, horse_url: &str) -> Result<Vec<Document>, ScrapeError> {
        self.enter(ScrapeTarget::Performances)?;
        let seed: usize = horse_url.bytes().map(usize::from).sum();
        let suffix = slug(horse_url);
        let first = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap_or_default();
        Ok((1..=self.shape.performances_per_horse)
            .map(|k| {
                let result = (seed + k) % 6 + 1;
                let starting_price = 1.5 + 1.5 * f64::from(u32::try_from(k).unwrap_or(u32::MAX));
                let prize: u32 = match result {
                    1 => 60_000,
                    2 => 20_000,
                    3 => 10_000,
                    _ => 0,
                };
                let date = first + Duration::days(14 * i64::try_from(k).unwrap_or(0));
                object(json!({
                    "horse_url": horse_url,
                    "jockey_url": format!("/jockeys/form-{suffix}-{k}"),
                    "date": timestamp::format_date(date),
                    "result": result,
                    "starters": 12,
                    "starting_price": starting_price,
                    "runner_prize_money": prize,
                }))
            })
            .collect())
    }
}

fn slug(url: &str) -> &str {
    url.rsplit('/').find(|part| !part.is_empty()).unwrap_or(url)
}

fn profile(url: &str, role: &str) -> Document {
    object(json!({
        "url": url,
        "name": format!("{role} {}", slug(url)),
    }))
}

fn object(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
