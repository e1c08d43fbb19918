//! Concurrent traversal of the racing hierarchy on a worker queue.
//!
//! Dates run one after another on the calling thread. Within a date every
//! meet, race, runner, profile and performance is its own queue task, and
//! each task enqueues the tasks for its children before returning. The
//! date completes when the queue has drained, and the first failing task
//! aborts it.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use racing_core::{Entity, Horse, Jockey, Meet, Performance, Race, Runner, Trainer};
use racing_logging::log_time;
use racing_queue::{QueueHandle, WorkerQueue};
use racing_repository::Racing;
use tracing::{debug, info};

use crate::dates::DateRange;
use crate::errors::{ProcessError, Result};
use crate::hooks::{Hooks, TraversalPlan, fire};

/// Default prefix of the task messages passed to [`log_time`].
pub const DEFAULT_MESSAGE_PREFIX: &str = "processing";

/// Everything a queue task needs, shared by all tasks of a run.
struct Traversal {
    racing: Arc<Racing>,
    hooks: Hooks,
    plan: TraversalPlan,
    message_prefix: String,
}

/// Runs [`Hooks`] over every date in a range, fanning out on a fixed pool
/// of worker threads.
pub struct Processor {
    traversal: Arc<Traversal>,
    threads: usize,
}

impl Processor {
    /// A processor over `racing` running `hooks` on `threads` workers
    /// (at least one).
    #[must_use]
    pub fn new(racing: Arc<Racing>, hooks: Hooks, threads: usize) -> Self {
        let plan = TraversalPlan::from_hooks(&hooks);
        Self {
            traversal: Arc::new(Traversal {
                racing,
                hooks,
                plan,
                message_prefix: DEFAULT_MESSAGE_PREFIX.to_owned(),
            }),
            threads: threads.max(1),
        }
    }

    /// Replace the prefix of the task log messages.
    #[must_use]
    pub fn with_message_prefix(self, prefix: impl Into<String>) -> Self {
        let traversal = &self.traversal;
        Self {
            traversal: Arc::new(Traversal {
                racing: Arc::clone(&traversal.racing),
                hooks: traversal.hooks.clone(),
                plan: traversal.plan,
                message_prefix: prefix.into(),
            }),
            threads: self.threads,
        }
    }

    /// The levels this processor visits.
    pub fn plan(&self) -> TraversalPlan {
        self.traversal.plan
    }

    /// Number of worker threads per run.
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Process every date from `from` to `to` inclusive, in that direction.
    ///
    /// Stops at the first date that fails.
    pub fn process_dates(&self, from: NaiveDate, to: NaiveDate) -> Result<()> {
        if !self.traversal.plan.dates {
            debug!(%from, %to, "no hooks registered, nothing to process");
            return Ok(());
        }
        let queue = WorkerQueue::new(self.threads)?;
        for date in DateRange::new(from, to) {
            self.run_date(&queue, date)?;
        }
        info!(%from, %to, threads = self.threads, "processed date range");
        Ok(())
    }

    /// Process a single date on a fresh worker queue.
    pub fn process_date(&self, date: NaiveDate) -> Result<()> {
        self.process_dates(date, date)
    }

    fn run_date(&self, queue: &WorkerQueue, date: NaiveDate) -> Result<()> {
        let traversal = &self.traversal;
        log_time(&traversal.message(&date), || {
            fire(traversal.hooks.before_date.as_ref(), "before_date", &date)?;
            if traversal.plan.meets {
                let handle = queue.handle();
                for meet in traversal.racing.meets_by_date(date)? {
                    traversal.spawn(&handle, move |t, q| t.meet(q, meet));
                }
                queue.join();
                if let Some(fault) = queue.fault() {
                    return Err(ProcessError::Aborted { date, fault });
                }
            }
            fire(traversal.hooks.after_date.as_ref(), "after_date", &date)
        })
    }
}

impl fmt::Debug for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Processor")
            .field("plan", &self.traversal.plan)
            .field("threads", &self.threads)
            .field("message_prefix", &self.traversal.message_prefix)
            .finish_non_exhaustive()
    }
}

impl Traversal {
    fn message(&self, subject: &dyn fmt::Display) -> String {
        format!("{} {subject}", self.message_prefix)
    }

    /// Enqueue `step` as a task of this traversal. A stopped queue drops
    /// it; the fault that stopped the queue is reported by the date.
    fn spawn<F>(self: &Arc<Self>, queue: &QueueHandle, step: F)
    where
        F: FnOnce(&Arc<Traversal>, &QueueHandle) -> anyhow::Result<()> + Send + 'static,
    {
        let traversal = Arc::clone(self);
        let handle = queue.clone();
        let _ = queue.enqueue(move || step(&traversal, &handle));
    }

    fn meet(self: &Arc<Self>, queue: &QueueHandle, meet: Entity<Meet>) -> anyhow::Result<()> {
        log_time(&self.message(&meet), || {
            fire(self.hooks.before_meet.as_ref(), "before_meet", &meet)?;
            if self.plan.races {
                for race in self.racing.races_by_meet(&meet)? {
                    self.spawn(queue, move |t, q| t.race(q, race));
                }
            }
            fire(self.hooks.after_meet.as_ref(), "after_meet", &meet)?;
            Ok(())
        })
    }

    fn race(self: &Arc<Self>, queue: &QueueHandle, race: Entity<Race>) -> anyhow::Result<()> {
        log_time(&self.message(&race), || {
            fire(self.hooks.before_race.as_ref(), "before_race", &race)?;
            if self.plan.runners {
                for runner in self.racing.runners_by_race(&race)? {
                    self.spawn(queue, move |t, q| t.runner(q, runner));
                }
            }
            fire(self.hooks.after_race.as_ref(), "after_race", &race)?;
            Ok(())
        })
    }

    fn runner(self: &Arc<Self>, queue: &QueueHandle, runner: Entity<Runner>) -> anyhow::Result<()> {
        log_time(&self.message(&runner), || {
            fire(self.hooks.before_runner.as_ref(), "before_runner", &runner)?;
            if self.plan.horses {
                if let Some(horse) = self.racing.horse_by_runner(&runner)? {
                    self.spawn(queue, move |t, q| t.horse(q, horse));
                }
            }
            if self.plan.jockeys {
                if let Some(jockey) = self.racing.jockey_by_runner(&runner)? {
                    self.spawn(queue, move |t, _| t.jockey(&jockey));
                }
            }
            if self.plan.trainers {
                if let Some(trainer) = self.racing.trainer_by_runner(&runner)? {
                    self.spawn(queue, move |t, _| t.trainer(&trainer));
                }
            }
            fire(self.hooks.after_runner.as_ref(), "after_runner", &runner)?;
            Ok(())
        })
    }

    fn horse(self: &Arc<Self>, queue: &QueueHandle, horse: Entity<Horse>) -> anyhow::Result<()> {
        log_time(&self.message(&horse), || {
            fire(self.hooks.before_horse.as_ref(), "before_horse", &horse)?;
            if self.plan.performances {
                for performance in self.racing.performances_by_horse(&horse)? {
                    self.spawn(queue, move |t, _| t.performance(&performance));
                }
            }
            fire(self.hooks.after_horse.as_ref(), "after_horse", &horse)?;
            Ok(())
        })
    }

    fn jockey(&self, jockey: &Entity<Jockey>) -> anyhow::Result<()> {
        log_time(&self.message(jockey), || {
            Ok(fire(self.hooks.jockey.as_ref(), "jockey", jockey)?)
        })
    }

    fn trainer(&self, trainer: &Entity<Trainer>) -> anyhow::Result<()> {
        log_time(&self.message(trainer), || {
            Ok(fire(self.hooks.trainer.as_ref(), "trainer", trainer)?)
        })
    }

    fn performance(&self, performance: &Entity<Performance>) -> anyhow::Result<()> {
        log_time(&self.message(performance), || {
            Ok(fire(self.hooks.performance.as_ref(), "performance", performance)?)
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use racing_core::Scraper;
    use racing_core::fixture::FixtureScraper;
    use racing_store::{DocumentStore, SqliteStore};

    fn racing() -> Arc<Racing> {
        let store: Arc<dyn DocumentStore> = Arc::new(SqliteStore::in_memory().unwrap());
        let scraper: Arc<dyn Scraper> = Arc::new(FixtureScraper::default());
        Racing::new(store, scraper)
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2016, 2, 1).unwrap()
    }

    #[test]
    fn threads_are_clamped() {
        let processor = Processor::new(racing(), Hooks::new(), 0);
        assert_eq!(processor.threads(), 1);
    }

    #[test]
    fn message_prefix_is_configurable() {
        let processor = Processor::new(racing(), Hooks::new().before_meet(|_| Ok(())), 2)
            .with_message_prefix("replaying");
        assert_eq!(processor.traversal.message(&day()), "replaying 2016-02-01");
        assert!(processor.plan().meets);
        assert_eq!(processor.threads(), 2);
    }

    #[test]
    fn date_task_is_timed_on_the_calling_thread() {
        let (logs, _guard) = racing_logging::capture_logs();
        let processor = Processor::new(racing(), Hooks::new().after_date(|_| Ok(())), 1);
        processor.process_date(day()).unwrap();

        let finished = logs
            .events()
            .into_iter()
            .find(|e| e.message == "finished")
            .unwrap();
        assert_eq!(finished.field("task"), Some("processing 2016-02-01"));
    }

    #[test]
    fn without_hooks_nothing_is_fetched() {
        let store: Arc<dyn DocumentStore> = Arc::new(SqliteStore::in_memory().unwrap());
        let scraper = Arc::new(FixtureScraper::default());
        let racing = Racing::new(store, Arc::clone(&scraper) as Arc<dyn Scraper>);
        Processor::new(racing, Hooks::new(), 4)
            .process_dates(day(), day() + chrono::Duration::days(3))
            .unwrap();
        assert_eq!(scraper.total_calls(), 0);
    }
}
