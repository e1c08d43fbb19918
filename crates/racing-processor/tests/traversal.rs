//! Fan-out completeness, fail-fast and thread-count independence of the
//! concurrent traversal, checked against the fixture scraper's shape.

#![allow(unused_results)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use assert_matches::assert_matches;
use chrono::{Duration, NaiveDate};
use parking_lot::Mutex;
use racing_core::fixture::{FixtureScraper, ScrapeTarget};
use racing_core::{Filter, Scraper, fields};
use racing_processor::{Hooks, ProcessError, Processor, iterate};
use racing_repository::Racing;
use racing_store::{DocumentStore, SqliteStore};

const POINTS: [&str; 13] = [
    "before_date",
    "after_date",
    "before_meet",
    "after_meet",
    "before_race",
    "after_race",
    "before_runner",
    "after_runner",
    "before_horse",
    "after_horse",
    "jockey",
    "trainer",
    "performance",
];

/// Visit counters keyed by hook point.
#[derive(Clone, Default)]
struct Visits(Arc<Mutex<HashMap<&'static str, usize>>>);

impl Visits {
    fn record(&self, point: &'static str) {
        *self.0.lock().entry(point).or_default() += 1;
    }

    fn get(&self, point: &str) -> usize {
        self.0.lock().get(point).copied().unwrap_or(0)
    }

    fn snapshot(&self) -> Vec<usize> {
        POINTS.iter().map(|p| self.get(p)).collect()
    }
}

fn counting_hooks(visits: &Visits) -> Hooks {
    macro_rules! count {
        ($point:ident) => {{
            let visits = visits.clone();
            move |_: &_| {
                visits.record(stringify!($point));
                Ok(())
            }
        }};
    }
    Hooks::new()
        .before_date(count!(before_date))
        .after_date(count!(after_date))
        .before_meet(count!(before_meet))
        .after_meet(count!(after_meet))
        .before_race(count!(before_race))
        .after_race(count!(after_race))
        .before_runner(count!(before_runner))
        .after_runner(count!(after_runner))
        .before_horse(count!(before_horse))
        .after_horse(count!(after_horse))
        .jockey(count!(jockey))
        .trainer(count!(trainer))
        .performance(count!(performance))
}

fn racing_with(scraper: &Arc<FixtureScraper>) -> Arc<Racing> {
    let store: Arc<dyn DocumentStore> = Arc::new(SqliteStore::in_memory().unwrap());
    let racing = Racing::new(store, Arc::clone(scraper) as Arc<dyn Scraper>);
    racing.initialize().unwrap();
    racing
}

fn first_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2016, 2, 1).unwrap()
}

fn second_day() -> NaiveDate {
    first_day() + Duration::days(1)
}

fn run(threads: usize) -> Visits {
    let scraper = Arc::new(FixtureScraper::default());
    let visits = Visits::default();
    Processor::new(racing_with(&scraper), counting_hooks(&visits), threads)
        .process_dates(first_day(), second_day())
        .unwrap();
    visits
}

#[test]
fn two_days_visit_every_level() {
    let visits = run(4);
    let [meets, races, runners, horses, jockeys, trainers, performances] =
        FixtureScraper::default().shape().per_day().map(|n| n * 2);

    assert_eq!(visits.get("before_date"), 2);
    assert_eq!(visits.get("after_date"), 2);
    assert_eq!(visits.get("before_meet"), meets);
    assert_eq!(visits.get("after_meet"), meets);
    assert_eq!(visits.get("before_race"), races);
    assert_eq!(visits.get("after_race"), races);
    assert_eq!(visits.get("before_runner"), runners);
    assert_eq!(visits.get("after_runner"), runners);
    assert_eq!(visits.get("before_horse"), horses);
    assert_eq!(visits.get("after_horse"), horses);
    assert_eq!(visits.get("jockey"), jockeys);
    assert_eq!(visits.get("trainer"), trainers);
    assert_eq!(visits.get("performance"), performances);
}

#[test]
fn thread_count_does_not_change_visits() {
    let baseline = run(1).snapshot();
    for threads in [4, 16] {
        assert_eq!(run(threads).snapshot(), baseline, "{threads} threads");
    }
}

#[test]
fn sequential_iteration_matches_the_processor() {
    let scraper = Arc::new(FixtureScraper::default());
    let visits = Visits::default();
    iterate(
        &racing_with(&scraper),
        &counting_hooks(&visits),
        first_day(),
        second_day(),
    )
    .unwrap();
    assert_eq!(visits.snapshot(), run(2).snapshot());
}

#[test]
fn failing_hook_aborts_the_date_and_skips_queued_work() {
    let scraper = Arc::new(FixtureScraper::default());
    let visits = Visits::default();
    let hooks = {
        let before = visits.clone();
        let runners = visits.clone();
        let after = visits.clone();
        Hooks::new()
            .before_race(move |race| {
                before.record("before_race");
                anyhow::bail!("race {} is void", race.get_i64(fields::NUMBER).unwrap_or(0))
            })
            .before_runner(move |_| {
                runners.record("before_runner");
                Ok(())
            })
            .after_date(move |_| {
                after.record("after_date");
                Ok(())
            })
    };

    let err = Processor::new(racing_with(&scraper), hooks, 1)
        .process_dates(first_day(), second_day())
        .unwrap_err();

    assert_matches!(err, ProcessError::Aborted { date, .. } if date == first_day());
    assert!(err.to_string().contains("before_race hook failed: race 1 is void"));
    // One worker: the first race fails and everything queued behind it is
    // discarded.
    assert_eq!(visits.get("before_race"), 1);
    assert_eq!(visits.get("before_runner"), 0);
    assert_eq!(visits.get("after_date"), 0);
    assert_eq!(scraper.calls(ScrapeTarget::Meets), 1);
}

#[test]
fn scrape_failure_in_a_worker_aborts_the_range() {
    let scraper = Arc::new(FixtureScraper::default());
    scraper.fail(ScrapeTarget::Runners);
    let visits = Visits::default();

    let err = Processor::new(racing_with(&scraper), counting_hooks(&visits), 4)
        .process_dates(first_day(), second_day())
        .unwrap_err();

    assert_matches!(err, ProcessError::Aborted { ref fault, .. }
        if fault.to_string().contains("injected failure"));
    assert_eq!(visits.get("before_date"), 1);
    assert_eq!(visits.get("before_runner"), 0);
}

#[test]
fn failing_date_stops_later_dates() {
    let scraper = Arc::new(FixtureScraper::default());
    scraper.fail_meets_on(second_day());
    let visited = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&visited);
    let hooks = Hooks::new()
        .before_date(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .before_meet(|_| Ok(()));

    let third_day = second_day() + Duration::days(1);
    let err = Processor::new(racing_with(&scraper), hooks, 2)
        .process_dates(first_day(), third_day)
        .unwrap_err();

    assert_matches!(err, ProcessError::Repository(_));
    assert_eq!(visited.load(Ordering::SeqCst), 2);
}

#[test]
fn cached_range_is_not_rescraped() {
    let scraper = Arc::new(FixtureScraper::default());
    let racing = racing_with(&scraper);
    let visits = Visits::default();
    let processor = Processor::new(Arc::clone(&racing), counting_hooks(&visits), 4);

    processor.process_dates(second_day(), first_day()).unwrap();
    let calls = scraper.total_calls();
    processor.process_dates(first_day(), second_day()).unwrap();

    assert_eq!(scraper.total_calls(), calls);
    assert_eq!(visits.get("performance"), 2 * 2 * 72);
}

#[test]
fn shared_profiles_are_stored_once_at_any_thread_count() {
    let future = NaiveDate::from_ymd_opt(2099, 2, 1).unwrap();
    let per_day = FixtureScraper::default().shape().per_day();
    for day in [first_day(), future] {
        for threads in [1, 4, 16] {
            let scraper = Arc::new(FixtureScraper::default());
            let racing = racing_with(&scraper);
            let visits = Visits::default();
            Processor::new(Arc::clone(&racing), counting_hooks(&visits), threads)
                .process_date(day)
                .unwrap();

            assert_eq!(visits.get("jockey"), per_day[4], "{day} on {threads} threads");
            assert_eq!(visits.get("trainer"), per_day[5], "{day} on {threads} threads");

            let runners = racing.runners().find(&Filter::new()).unwrap();
            let mut jockey_urls: Vec<_> = runners
                .iter()
                .filter_map(|r| r.get_str(fields::JOCKEY_URL))
                .collect();
            jockey_urls.sort_unstable();
            jockey_urls.dedup();
            let mut trainer_urls: Vec<_> = runners
                .iter()
                .filter_map(|r| r.get_str(fields::TRAINER_URL))
                .collect();
            trainer_urls.sort_unstable();
            trainer_urls.dedup();
            assert!(jockey_urls.len() < runners.len());

            for url in jockey_urls {
                let stored = racing.jockeys().find(&Filter::new().eq(fields::URL, url)).unwrap();
                assert_eq!(stored.len(), 1, "{url} on {day} with {threads} threads");
            }
            for url in trainer_urls {
                let stored = racing.trainers().find(&Filter::new().eq(fields::URL, url)).unwrap();
                assert_eq!(stored.len(), 1, "{url} on {day} with {threads} threads");
            }
        }
    }
}
