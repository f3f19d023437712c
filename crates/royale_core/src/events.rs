//! Random map events.
//!
//! Each round draws a fixed number of events by weighted lottery, without
//! replacement inside the round, and applies each one to a uniformly random
//! surviving team. Stat events fold into the team's [`EventBuffs`]
//! multiplicatively; pickup events add treasure or flag points.
//!
//! [`EventBuffs`]: crate::team::EventBuffs

use std::collections::BTreeMap;

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::IteratorRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{MatchError, Result};
use crate::team::{Team, TeamId};

/// Every event that can fire during a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    /// Squad sync: +1% agility.
    Meeting,
    /// Good ring read: +1% aim.
    Circle,
    /// Recon: +1% mental.
    Scout,
    /// Found a rare weapon: +2% aim.
    RareWeapon,
    /// Bad rotation call: -1% agility.
    Misjudgment,
    /// Comms breakdown: -1% mental.
    Argument,
    /// Perfect zone pull: +3% aim, +3% mental.
    Zone,
    /// Treasure pickup: +1 treasure point.
    Treasure,
    /// Flag pickup: +1 flag point.
    Flag,
}

impl EventKind {
    /// All event kinds.
    pub const ALL: [EventKind; 9] = [
        EventKind::Meeting,
        EventKind::Circle,
        EventKind::Scout,
        EventKind::RareWeapon,
        EventKind::Misjudgment,
        EventKind::Argument,
        EventKind::Zone,
        EventKind::Treasure,
        EventKind::Flag,
    ];

    /// What the event does to the team it lands on.
    #[must_use]
    pub fn effect(self) -> EventEffect {
        let stat = |aim_pct, mental_pct, agility_pct| EventEffect {
            aim_pct,
            mental_pct,
            agility_pct,
            treasure: 0,
            flag: 0,
        };
        match self {
            EventKind::Meeting => stat(0.0, 0.0, 1.0),
            EventKind::Circle => stat(1.0, 0.0, 0.0),
            EventKind::Scout => stat(0.0, 1.0, 0.0),
            EventKind::RareWeapon => stat(2.0, 0.0, 0.0),
            EventKind::Misjudgment => stat(0.0, 0.0, -1.0),
            EventKind::Argument => stat(0.0, -1.0, 0.0),
            EventKind::Zone => stat(3.0, 3.0, 0.0),
            EventKind::Treasure => EventEffect {
                treasure: 1,
                ..stat(0.0, 0.0, 0.0)
            },
            EventKind::Flag => EventEffect {
                flag: 1,
                ..stat(0.0, 0.0, 0.0)
            },
        }
    }

    /// Short label for logs.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            EventKind::Meeting => "meeting",
            EventKind::Circle => "circle",
            EventKind::Scout => "scout",
            EventKind::RareWeapon => "rareWeapon",
            EventKind::Misjudgment => "misjudgment",
            EventKind::Argument => "argument",
            EventKind::Zone => "zone",
            EventKind::Treasure => "treasure",
            EventKind::Flag => "flag",
        }
    }
}

/// Stat and pickup deltas applied by one event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventEffect {
    /// Aim nudge in percent.
    pub aim_pct: f64,
    /// Mental nudge in percent.
    pub mental_pct: f64,
    /// Agility nudge in percent.
    pub agility_pct: f64,
    /// Treasure points.
    pub treasure: u32,
    /// Flag points.
    pub flag: u32,
}

impl EventEffect {
    /// Apply to a team.
    pub fn apply(&self, team: &mut Team) {
        team.event_buffs
            .accumulate(self.aim_pct, self.mental_pct, self.agility_pct);
        team.points.treasure += self.treasure;
        team.points.flag += self.flag;
    }
}

/// Lottery weights per event kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTable {
    /// Weight per kind; missing kinds never fire.
    pub weights: BTreeMap<EventKind, u32>,
}

impl Default for EventTable {
    fn default() -> Self {
        let weights = [
            (EventKind::Meeting, 12),
            (EventKind::Circle, 12),
            (EventKind::Scout, 12),
            (EventKind::RareWeapon, 8),
            (EventKind::Misjudgment, 10),
            (EventKind::Argument, 10),
            (EventKind::Zone, 4),
            (EventKind::Treasure, 8),
            (EventKind::Flag, 6),
        ];
        Self {
            weights: weights.into_iter().collect(),
        }
    }
}

impl EventTable {
    /// Reject tables with nothing drawable.
    pub fn validate(&self) -> Result<()> {
        if self.weights.values().all(|&w| w == 0) {
            return Err(MatchError::InvalidConfig(
                "event table has no positive weights".to_string(),
            ));
        }
        Ok(())
    }
}

/// One event that landed on a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedEvent {
    /// Event drawn.
    pub kind: EventKind,
    /// Team it landed on.
    pub team: TeamId,
}

/// Draws and applies a round's events.
#[derive(Debug, Clone, Copy)]
pub struct EventSystem<'a> {
    table: &'a EventTable,
}

impl<'a> EventSystem<'a> {
    /// Create over a weight table.
    #[must_use]
    pub const fn new(table: &'a EventTable) -> Self {
        Self { table }
    }

    /// Draw up to `count` distinct events and apply each to a random
    /// surviving team. Stops early when the pool or the field runs dry.
    pub fn run_round<R: Rng + ?Sized>(
        &self,
        teams: &mut [Team],
        count: u32,
        rng: &mut R,
    ) -> Vec<AppliedEvent> {
        let mut pool: Vec<(EventKind, u32)> = self
            .table
            .weights
            .iter()
            .filter(|(_, w)| **w > 0)
            .map(|(&k, &w)| (k, w))
            .collect();
        let mut applied = Vec::new();

        for _ in 0..count {
            let Ok(dist) = WeightedIndex::new(pool.iter().map(|(_, w)| *w)) else {
                break;
            };
            let (kind, _) = pool.swap_remove(dist.sample(rng));

            let Some(team) = teams.iter_mut().filter(|t| t.is_active()).choose(rng) else {
                break;
            };
            kind.effect().apply(team);
            tracing::trace!(event = kind.label(), team = team.id, "Event applied");
            applied.push(AppliedEvent {
                kind,
                team: team.id,
            });
        }

        applied
    }
}
