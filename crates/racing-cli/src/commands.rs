//! Subcommand implementations. Each returns a printable report.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use racing_core::fixture::FixtureScraper;
use racing_core::{EntityKind, Filter, Scraper, fields, timestamp};
use racing_processor::{Hooks, Processor};
use racing_repository::{PerformanceList, Racing};
use racing_store::{DocumentStore, SqliteStore};

/// Declare the schema indexes on `racing`'s store.
pub fn init(racing: &Racing) -> Result<String> {
    racing.initialize().context("failed to create indexes")?;
    Ok("indexes created".to_owned())
}

/// Delete every meet scraped before the start of `before`, with its races
/// and runners.
pub fn purge(racing: &Racing, before: NaiveDate) -> Result<String> {
    let cutoff = timestamp::start_of_day(before);
    let deleted = racing
        .meets()
        .delete_expired(&Filter::new(), Some(cutoff))
        .with_context(|| format!("failed to purge meets scraped before {before}"))?;
    Ok(format!("purged {deleted} meets scraped before {before}"))
}

/// Form statistics over the cached performances of one horse.
pub fn stats(racing: &Racing, horse_url: &str) -> Result<StatsReport> {
    let performances = racing
        .performances()
        .find(&Filter::new().eq(fields::HORSE_URL, horse_url))
        .with_context(|| format!("failed to read performances of {horse_url}"))?;
    Ok(StatsReport {
        horse_url: horse_url.to_owned(),
        list: PerformanceList::new(performances),
    })
}

/// Traverse `from..=to` over synthetic data in a fresh in-memory store,
/// counting visits per kind.
pub fn demo(from: NaiveDate, to: NaiveDate, threads: usize, prefix: &str) -> Result<DemoReport> {
    let store: Arc<dyn DocumentStore> =
        Arc::new(SqliteStore::in_memory().context("failed to create in-memory store")?);
    let scraper = Arc::new(FixtureScraper::default());
    let racing = Racing::new(store, Arc::clone(&scraper) as Arc<dyn Scraper>);
    racing.initialize().context("failed to create indexes")?;

    let tally = Arc::new(Tally::default());
    let processor = Processor::new(racing, counting_hooks(&tally), threads)
        .with_message_prefix(prefix);
    processor
        .process_dates(from, to)
        .with_context(|| format!("demo traversal of {from}..={to} failed"))?;

    Ok(DemoReport {
        from,
        to,
        threads: processor.threads(),
        visits: EntityKind::ALL.map(|kind| (kind, tally.get(kind))),
        scrape_calls: scraper.total_calls(),
    })
}

/// Visit counters, one per entity kind.
#[derive(Default)]
struct Tally([AtomicUsize; 7]);

impl Tally {
    fn slot(kind: EntityKind) -> usize {
        EntityKind::ALL
            .iter()
            .position(|k| *k == kind)
            .unwrap_or_default()
    }

    fn record(&self, kind: EntityKind) {
        let _ = self.0[Self::slot(kind)].fetch_add(1, Ordering::Relaxed);
    }

    fn get(&self, kind: EntityKind) -> usize {
        self.0[Self::slot(kind)].load(Ordering::Relaxed)
    }
}

fn counting_hooks(tally: &Arc<Tally>) -> Hooks {
    let counter = |kind: EntityKind| {
        let tally = Arc::clone(tally);
        move || tally.record(kind)
    };
    let (meet, race, runner) = (
        counter(EntityKind::Meet),
        counter(EntityKind::Race),
        counter(EntityKind::Runner),
    );
    let (horse, jockey, trainer, performance) = (
        counter(EntityKind::Horse),
        counter(EntityKind::Jockey),
        counter(EntityKind::Trainer),
        counter(EntityKind::Performance),
    );
    Hooks::new()
        .before_meet(move |_| {
            meet();
            Ok(())
        })
        .before_race(move |_| {
            race();
            Ok(())
        })
        .before_runner(move |_| {
            runner();
            Ok(())
        })
        .before_horse(move |_| {
            horse();
            Ok(())
        })
        .jockey(move |_| {
            jockey();
            Ok(())
        })
        .trainer(move |_| {
            trainer();
            Ok(())
        })
        .performance(move |_| {
            performance();
            Ok(())
        })
}

/// Outcome of the `demo` command.
#[derive(Debug)]
pub struct DemoReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub threads: usize,
    pub visits: [(EntityKind, usize); 7],
    pub scrape_calls: usize,
}

impl fmt::Display for DemoReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "processed {} to {} on {} threads",
            self.from, self.to, self.threads
        )?;
        for (kind, count) in &self.visits {
            writeln!(f, "  {:<12} {count:>6}", kind.collection())?;
        }
        write!(f, "  {:<12} {:>6}", "scrapes", self.scrape_calls)
    }
}

/// Outcome of the `stats` command.
#[derive(Debug)]
pub struct StatsReport {
    pub horse_url: String,
    pub list: PerformanceList,
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = &self.list;
        if list.is_empty() {
            return write!(f, "no cached performances for {}", self.horse_url);
        }
        writeln!(f, "{}: {} starts", self.horse_url, list.starts())?;
        writeln!(
            f,
            "  record      {}-{}-{}-{}",
            list.wins(),
            list.seconds(),
            list.thirds(),
            list.fourths()
        )?;
        writeln!(f, "  win         {:.1}%", list.win_pct() * 100.0)?;
        writeln!(f, "  place       {:.1}%", list.place_pct() * 100.0)?;
        writeln!(f, "  prize money {:.0} ({:.0} per start)", list.total_prize_money(), list.average_prize_money())?;
        writeln!(f, "  average SP  {:.2}", list.average_starting_price())?;
        write!(f, "  roi         {:+.3}", list.roi())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use racing_core::{Entity, OfflineScraper, Performance};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2016, 2, 1).unwrap()
    }

    fn offline() -> Arc<Racing> {
        let store: Arc<dyn DocumentStore> = Arc::new(SqliteStore::in_memory().unwrap());
        Racing::new(store, Arc::new(OfflineScraper))
    }

    #[test]
    fn demo_visits_the_fixture_shape() {
        let report = demo(day(), day(), 3, "demo").unwrap();
        let expected = FixtureScraper::default().shape().per_day();
        for ((kind, count), want) in report.visits.iter().zip(expected) {
            assert_eq!(*count, want, "{kind}");
        }
        assert!(report.to_string().contains("performances"));
        assert_eq!(report.threads, 3);
    }

    #[test]
    fn purge_removes_meets_scraped_before_the_cutoff() {
        let racing = offline();
        let mut meet = Entity::<racing_core::Meet>::new(racing_core::Document::new());
        meet.set("scraped_at", "2016-01-01T00:00:00.000000Z");
        racing.meets().save(&mut meet).unwrap();
        let mut recent = Entity::<racing_core::Meet>::new(racing_core::Document::new());
        recent.set("scraped_at", "2016-03-01T00:00:00.000000Z");
        racing.meets().save(&mut recent).unwrap();

        let message = purge(&racing, day()).unwrap();
        assert_eq!(message, "purged 1 meets scraped before 2016-02-01");
        assert!(racing.meets().find_by_id(&recent.id().unwrap()).unwrap().is_some());
    }

    #[test]
    fn stats_reads_only_cached_performances() {
        let racing = offline();
        let report = stats(&racing, "/horses/none").unwrap();
        assert_eq!(report.to_string(), "no cached performances for /horses/none");

        let mut win = Entity::<Performance>::new(racing_core::Document::new());
        win.set(fields::HORSE_URL, "/horses/ace");
        win.set(fields::RESULT, 1);
        win.set(fields::STARTING_PRICE, 3.5);
        racing.performances().save(&mut win).unwrap();

        let report = stats(&racing, "/horses/ace").unwrap();
        assert_eq!(report.list.wins(), 1);
        let text = report.to_string();
        assert!(text.contains("1 starts"));
        assert!(text.contains("win         100.0%"));
    }

    #[test]
    fn init_is_repeatable() {
        let racing = offline();
        init(&racing).unwrap();
        assert_eq!(init(&racing).unwrap(), "indexes created");
    }
}
