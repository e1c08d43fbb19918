//! Cascading deletes.
//!
//! Deleting a parent deletes the children a store-only lookup finds for it,
//! which in turn cascade further. Nothing is scraped while deleting.
//!
//! | Handler | Event |
//! |---|---|
//! | [`delete_races_of_meet`] | `deleting_meet` |
//! | [`delete_runners_of_race`] | `deleting_race` |
//! | [`delete_performances_of_horse`] | `deleting_horse` |
//!
//! A failing child delete aborts the parent delete with the children
//! deleted so far already gone.

use std::sync::{Arc, Weak};

use racing_core::{
    Document, Entity, EventManager, Filter, Horse, Kind, Lifecycle, Meet, Race, fields,
};
use tracing::debug;

use crate::errors::Result;
use crate::racing::{Racing, entity};
use crate::repository::Repository;

type Cascade<P> = fn(&Racing, &Entity<P>) -> Result<usize>;

/// Subscribe the cascade handlers on `events`.
///
/// Handlers hold `racing` weakly and do nothing once the facade is gone.
pub(crate) fn register(events: &EventManager, racing: &Weak<Racing>) {
    subscribe::<Meet>(events, racing, delete_races_of_meet);
    subscribe::<Race>(events, racing, delete_runners_of_race);
    subscribe::<Horse>(events, racing, delete_performances_of_horse);
}

fn subscribe<P: Kind>(events: &EventManager, racing: &Weak<Racing>, cascade: Cascade<P>) {
    let racing = Weak::clone(racing);
    let _ = events.subscribe(
        Lifecycle::Deleting.event_name(P::KIND),
        Arc::new(move |document: &Document| -> anyhow::Result<()> {
            let Some(racing) = racing.upgrade() else {
                return Ok(());
            };
            let _ = cascade(&racing, &entity::<P>(document))?;
            Ok(())
        }),
    );
}

/// Delete the races of `meet`.
pub fn delete_races_of_meet(racing: &Racing, meet: &Entity<Meet>) -> Result<usize> {
    delete_children(racing.races(), meet, fields::MEET_ID)
}

/// Delete the runners of `race`.
pub fn delete_runners_of_race(racing: &Racing, race: &Entity<Race>) -> Result<usize> {
    delete_children(racing.runners(), race, fields::RACE_ID)
}

/// Delete the past performances of `horse`.
pub fn delete_performances_of_horse(racing: &Racing, horse: &Entity<Horse>) -> Result<usize> {
    let Some(url) = horse.get_str(fields::URL) else {
        return Ok(0);
    };
    delete_matching(
        racing.performances(),
        &Filter::new().eq(fields::HORSE_URL, url),
    )
}

fn delete_children<P: Kind, C: Kind>(
    children: &Repository<C>,
    parent: &Entity<P>,
    back_reference: &'static str,
) -> Result<usize> {
    let Some(id) = parent.id() else {
        return Ok(0);
    };
    delete_matching(children, &Filter::new().eq(back_reference, id.as_str()))
}

fn delete_matching<C: Kind>(children: &Repository<C>, filter: &Filter) -> Result<usize> {
    let found = children.find(filter)?;
    for child in &found {
        let _ = children.delete(child)?;
    }
    if !found.is_empty() {
        debug!(collection = children.collection(), deleted = found.len(), "cascaded");
    }
    Ok(found.len())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
