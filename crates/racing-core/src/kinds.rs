//! The seven entity kinds of the racing hierarchy.
//!
//! [`EntityKind`] is the runtime tag. The zero-sized markers ([`Meet`],
//! [`Race`], ...) implement [`Kind`] so repositories and entities can be
//! typed by kind at compile time.

use std::fmt;

/// Runtime tag for an entity kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A race meeting on one date at one track.
    Meet,
    /// A race within a meet.
    Race,
    /// An entry in a race.
    Runner,
    /// The horse of a runner.
    Horse,
    /// The jockey of a runner or performance.
    Jockey,
    /// The trainer of a runner.
    Trainer,
    /// One past result of a horse.
    Performance,
}

impl EntityKind {
    /// Every kind, parents before children.
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Meet,
        EntityKind::Race,
        EntityKind::Runner,
        EntityKind::Horse,
        EntityKind::Jockey,
        EntityKind::Trainer,
        EntityKind::Performance,
    ];

    /// Singular lowercase name, used in event names.
    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Meet => "meet",
            EntityKind::Race => "race",
            EntityKind::Runner => "runner",
            EntityKind::Horse => "horse",
            EntityKind::Jockey => "jockey",
            EntityKind::Trainer => "trainer",
            EntityKind::Performance => "performance",
        }
    }

    /// Store collection holding documents of this kind.
    pub fn collection(self) -> &'static str {
        match self {
            EntityKind::Meet => "meets",
            EntityKind::Race => "races",
            EntityKind::Runner => "runners",
            EntityKind::Horse => "horses",
            EntityKind::Jockey => "jockeys",
            EntityKind::Trainer => "trainers",
            EntityKind::Performance => "performances",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compile-time marker for an entity kind.
pub trait Kind: Send + Sync + 'static {
    /// The runtime tag for this kind.
    const KIND: EntityKind;
}

macro_rules! kind_marker {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
        pub struct $name;

        impl Kind for $name {
            const KIND: EntityKind = EntityKind::$name;
        }
    };
}

kind_marker! {
    /// Marker for [`EntityKind::Meet`].
    Meet
}

kind_marker! {
    /// Marker for [`EntityKind::Race`].
    Race
}

kind_marker! {
    /// Marker for [`EntityKind::Runner`].
    Runner
}

kind_marker! {
    /// Marker for [`EntityKind::Horse`].
    Horse
}

kind_marker! {
    /// Marker for [`EntityKind::Jockey`].
    Jockey
}

kind_marker! {
    /// Marker for [`EntityKind::Trainer`].
    Trainer
}

kind_marker! {
    /// Marker for [`EntityKind::Performance`].
    Performance
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
