//! Depth-first traversal on the calling thread.
//!
//! Visits the same levels as [`Processor`](crate::Processor) with the same
//! hooks, one entity at a time. After hooks run once every descendant has
//! been visited, and the first error returns immediately.

use chrono::NaiveDate;
use racing_core::{Entity, Horse, Meet, Race, Runner};
use racing_repository::Racing;

use crate::dates::DateRange;
use crate::errors::Result;
use crate::hooks::{Hooks, TraversalPlan, fire};

/// Walk every date from `from` to `to` inclusive, running `hooks`.
pub fn iterate(racing: &Racing, hooks: &Hooks, from: NaiveDate, to: NaiveDate) -> Result<()> {
    let walk = Walk {
        racing,
        hooks,
        plan: TraversalPlan::from_hooks(hooks),
    };
    if !walk.plan.dates {
        return Ok(());
    }
    DateRange::new(from, to).try_for_each(|date| walk.date(date))
}

struct Walk<'a> {
    racing: &'a Racing,
    hooks: &'a Hooks,
    plan: TraversalPlan,
}

impl Walk<'_> {
    fn date(&self, date: NaiveDate) -> Result<()> {
        fire(self.hooks.before_date.as_ref(), "before_date", &date)?;
        if self.plan.meets {
            for meet in self.racing.meets_by_date(date)? {
                self.meet(&meet)?;
            }
        }
        fire(self.hooks.after_date.as_ref(), "after_date", &date)
    }

    fn meet(&self, meet: &Entity<Meet>) -> Result<()> {
        fire(self.hooks.before_meet.as_ref(), "before_meet", meet)?;
        if self.plan.races {
            for race in self.racing.races_by_meet(meet)? {
                self.race(&race)?;
            }
        }
        fire(self.hooks.after_meet.as_ref(), "after_meet", meet)
    }

    fn race(&self, race: &Entity<Race>) -> Result<()> {
        fire(self.hooks.before_race.as_ref(), "before_race", race)?;
        if self.plan.runners {
            for runner in self.racing.runners_by_race(race)? {
                self.runner(&runner)?;
            }
        }
        fire(self.hooks.after_race.as_ref(), "after_race", race)
    }

    fn runner(&self, runner: &Entity<Runner>) -> Result<()> {
        fire(self.hooks.before_runner.as_ref(), "before_runner", runner)?;
        if self.plan.horses {
            if let Some(horse) = self.racing.horse_by_runner(runner)? {
                self.horse(&horse)?;
            }
        }
        if self.plan.jockeys {
            if let Some(jockey) = self.racing.jockey_by_runner(runner)? {
                fire(self.hooks.jockey.as_ref(), "jockey", &jockey)?;
            }
        }
        if self.plan.trainers {
            if let Some(trainer) = self.racing.trainer_by_runner(runner)? {
                fire(self.hooks.trainer.as_ref(), "trainer", &trainer)?;
            }
        }
        fire(self.hooks.after_runner.as_ref(), "after_runner", runner)
    }

    fn horse(&self, horse: &Entity<Horse>) -> Result<()> {
        fire(self.hooks.before_horse.as_ref(), "before_horse", horse)?;
        if self.plan.performances {
            for performance in self.racing.performances_by_horse(horse)? {
                fire(self.hooks.performance.as_ref(), "performance", &performance)?;
            }
        }
        fire(self.hooks.after_horse.as_ref(), "after_horse", horse)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
