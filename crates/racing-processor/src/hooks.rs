//! Per-level callbacks and the traversal plan derived from them.
//!
//! A level is visited only when a hook is registered on it or on anything
//! below it. [`TraversalPlan::from_hooks`] computes those flags once, so
//! the traversal never fetches a level nobody observes.

use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use racing_core::{Entity, Horse, Jockey, Meet, Performance, Race, Runner, Trainer};

use crate::errors::{ProcessError, Result};

/// A callback run on one visited value.
pub type Hook<T> = Arc<dyn Fn(&T) -> anyhow::Result<()> + Send + Sync>;

macro_rules! hook_setters {
    ($($field:ident: $ty:ty => $doc:literal;)*) => {
        $(
            #[doc = $doc]
            #[must_use]
            pub fn $field<F>(mut self, hook: F) -> Self
            where
                F: Fn(&$ty) -> anyhow::Result<()> + Send + Sync + 'static,
            {
                self.$field = Some(Arc::new(hook));
                self
            }
        )*
    };
}

/// The callbacks a traversal runs, built up with setters:
///
/// ```ignore
/// let hooks = Hooks::new()
///     .before_race(|race| { println!("{race}"); Ok(()) })
///     .performance(|p| record(p));
/// ```
///
/// Before hooks run before a level's children are fetched and after hooks
/// run once they have been handed off. On a worker queue the children may
/// still be in flight when the after hook runs.
#[derive(Clone, Default)]
pub struct Hooks {
    pub(crate) before_date: Option<Hook<NaiveDate>>,
    pub(crate) after_date: Option<Hook<NaiveDate>>,
    pub(crate) before_meet: Option<Hook<Entity<Meet>>>,
    pub(crate) after_meet: Option<Hook<Entity<Meet>>>,
    pub(crate) before_race: Option<Hook<Entity<Race>>>,
    pub(crate) after_race: Option<Hook<Entity<Race>>>,
    pub(crate) before_runner: Option<Hook<Entity<Runner>>>,
    pub(crate) after_runner: Option<Hook<Entity<Runner>>>,
    pub(crate) before_horse: Option<Hook<Entity<Horse>>>,
    pub(crate) after_horse: Option<Hook<Entity<Horse>>>,
    pub(crate) jockey: Option<Hook<Entity<Jockey>>>,
    pub(crate) trainer: Option<Hook<Entity<Trainer>>>,
    pub(crate) performance: Option<Hook<Entity<Performance>>>,
}

impl Hooks {
    /// No hooks at all. A traversal with these visits nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    hook_setters! {
        before_date: NaiveDate => "Run before a date's meets are fetched.";
        after_date: NaiveDate => "Run after every meet of a date has been processed.";
        before_meet: Entity<Meet> => "Run before a meet's races are fetched.";
        after_meet: Entity<Meet> => "Run after a meet's races were handed off.";
        before_race: Entity<Race> => "Run before a race's runners are fetched.";
        after_race: Entity<Race> => "Run after a race's runners were handed off.";
        before_runner: Entity<Runner> => "Run before a runner's profiles are fetched.";
        after_runner: Entity<Runner> => "Run after a runner's profiles were handed off.";
        before_horse: Entity<Horse> => "Run before a horse's performances are fetched.";
        after_horse: Entity<Horse> => "Run after a horse's performances were handed off.";
        jockey: Entity<Jockey> => "Run on the jockey of every runner.";
        trainer: Entity<Trainer> => "Run on the trainer of every runner.";
        performance: Entity<Performance> => "Run on every past performance of every horse.";
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("plan", &TraversalPlan::from_hooks(self))
            .finish_non_exhaustive()
    }
}

/// Run `hook` on `value` if it is set.
pub(crate) fn fire<T>(hook: Option<&Hook<T>>, level: &'static str, value: &T) -> Result<()> {
    match hook {
        Some(hook) => hook(value).map_err(|cause| ProcessError::Hook { level, cause }),
        None => Ok(()),
    }
}

/// Which levels a traversal must visit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct TraversalPlan {
    /// Iterate dates at all.
    pub dates: bool,
    /// Fetch the meets of each date.
    pub meets: bool,
    /// Fetch the races of each meet.
    pub races: bool,
    /// Fetch the runners of each race.
    pub runners: bool,
    /// Fetch the horse of each runner.
    pub horses: bool,
    /// Fetch the jockey of each runner.
    pub jockeys: bool,
    /// Fetch the trainer of each runner.
    pub trainers: bool,
    /// Fetch the performances of each horse.
    pub performances: bool,
}

impl TraversalPlan {
    /// Derive the plan bottom-up: a level is needed when it has a hook or
    /// when any level below it is needed.
    pub fn from_hooks(hooks: &Hooks) -> Self {
        let performances = hooks.performance.is_some();
        let horses = hooks.before_horse.is_some() || hooks.after_horse.is_some() || performances;
        let jockeys = hooks.jockey.is_some();
        let trainers = hooks.trainer.is_some();
        let runners = hooks.before_runner.is_some()
            || hooks.after_runner.is_some()
            || horses
            || jockeys
            || trainers;
        let races = hooks.before_race.is_some() || hooks.after_race.is_some() || runners;
        let meets = hooks.before_meet.is_some() || hooks.after_meet.is_some() || races;
        let dates = hooks.before_date.is_some() || hooks.after_date.is_some() || meets;
        Self {
            dates,
            meets,
            races,
            runners,
            horses,
            jockeys,
            trainers,
            performances,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn no_hooks_visit_nothing() {
        assert_eq!(TraversalPlan::from_hooks(&Hooks::new()), TraversalPlan::default());
    }

    #[test]
    fn performance_hook_pulls_in_every_ancestor() {
        let plan = TraversalPlan::from_hooks(&Hooks::new().performance(|_| Ok(())));
        assert_eq!(
            plan,
            TraversalPlan {
                dates: true,
                meets: true,
                races: true,
                runners: true,
                horses: true,
                jockeys: false,
                trainers: false,
                performances: true,
            }
        );
    }

    #[test]
    fn sibling_levels_stay_independent() {
        let plan = TraversalPlan::from_hooks(&Hooks::new().trainer(|_| Ok(())));
        assert!(plan.trainers && plan.runners && plan.meets);
        assert!(!plan.horses && !plan.jockeys && !plan.performances);
    }

    #[test]
    fn after_hooks_count_as_presence() {
        let plan = TraversalPlan::from_hooks(&Hooks::new().after_race(|_| Ok(())));
        assert!(plan.races && plan.meets && plan.dates);
        assert!(!plan.runners);

        let plan = TraversalPlan::from_hooks(&Hooks::new().after_date(|_| Ok(())));
        assert!(plan.dates);
        assert!(!plan.meets);
    }

    #[test]
    fn fire_wraps_hook_errors() {
        let hooks = Hooks::new().before_date(|date| anyhow::bail!("no racing on {date}"));
        let date = NaiveDate::from_ymd_opt(2016, 12, 25).unwrap();
        let err = fire(hooks.before_date.as_ref(), "before_date", &date).unwrap_err();
        assert_matches!(err, ProcessError::Hook { level: "before_date", .. });
        assert_eq!(err.to_string(), "before_date hook failed: no racing on 2016-12-25");
        assert!(fire(hooks.after_date.as_ref(), "after_date", &date).is_ok());
    }
}
