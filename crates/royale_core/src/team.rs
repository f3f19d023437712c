//! Runtime team state.

use serde::{Deserialize, Serialize};

use crate::data::{Catalog, TeamData, TEAM_SIZE};
use crate::error::{MatchError, Result};
use crate::fighter::Fighter;

/// Unique team identifier.
pub type TeamId = u32;

/// Map zone identifier.
pub type AreaId = u16;

/// Most hits a team may negate in one match.
pub const TEAM_NEGATION_BUDGET: u8 = 2;

/// Point tallies accumulated during a match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamPoints {
    /// Kill points.
    pub kp: u32,
    /// Assist points.
    pub ap: u32,
    /// Treasure pickups.
    pub treasure: u32,
    /// Flag pickups.
    pub flag: u32,
}

/// Multiplicative stat nudges from random events (1.0 = neutral).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventBuffs {
    /// Aim multiplier.
    pub aim: f64,
    /// Mental multiplier.
    pub mental: f64,
    /// Agility multiplier.
    pub agility: f64,
}

impl Default for EventBuffs {
    fn default() -> Self {
        Self {
            aim: 1.0,
            mental: 1.0,
            agility: 1.0,
        }
    }
}

impl EventBuffs {
    /// Fold a set of percentage nudges in.
    pub fn accumulate(&mut self, aim_pct: f64, mental_pct: f64, agility_pct: f64) {
        self.aim *= 1.0 + aim_pct / 100.0;
        self.mental *= 1.0 + mental_pct / 100.0;
        self.agility *= 1.0 + agility_pct / 100.0;
    }

    /// Product of all three multipliers, used by macro power.
    #[must_use]
    pub fn product(&self) -> f64 {
        self.aim * self.mental * self.agility
    }
}

/// A team in the match, owning its fighters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    /// Unique identifier.
    pub id: TeamId,
    /// Display name.
    pub name: String,
    /// Exactly three fighters.
    pub fighters: Vec<Fighter>,
    /// Downed fighters that can still be recovered.
    pub death_boxes: u8,
    /// Out of the match.
    pub eliminated: bool,
    /// Round the team was eliminated in.
    pub eliminated_round: Option<u8>,
    /// Current zone.
    pub area: AreaId,
    /// Point tallies.
    pub points: TeamPoints,
    /// Accumulated event nudges.
    pub event_buffs: EventBuffs,
    /// Extra ability uses per fighter (coach bonus).
    pub ability_bonus_uses: u32,
    /// Hits negated team-wide this match.
    pub negations_used: u8,
    /// Final placement, set when the match finishes.
    pub placement: Option<u32>,
}

impl Team {
    /// Build a team at its match-start baseline.
    pub fn from_data(data: &TeamData, catalog: &Catalog) -> Result<Self> {
        if data.members.len() != TEAM_SIZE {
            return Err(MatchError::InvalidContent(format!(
                "team '{}' has {} members, expected {TEAM_SIZE}",
                data.name,
                data.members.len()
            )));
        }
        let fighters = data
            .members
            .iter()
            .map(|m| Fighter::from_data(m, catalog))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id: data.id,
            name: data.name.clone(),
            fighters,
            death_boxes: 0,
            eliminated: false,
            eliminated_round: None,
            area: 0,
            points: TeamPoints::default(),
            event_buffs: EventBuffs::default(),
            ability_bonus_uses: data.ability_bonus_uses,
            negations_used: 0,
            placement: None,
        })
    }

    /// Number of standing fighters.
    #[must_use]
    pub fn alive_count(&self) -> u8 {
        self.fighters.iter().filter(|f| f.is_alive()).count() as u8
    }

    /// Still in the match.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.eliminated
    }

    /// Sum of Armor over standing fighters.
    #[must_use]
    pub fn total_armor(&self) -> f64 {
        self.fighters
            .iter()
            .filter(|f| f.is_alive())
            .map(|f| f.armor)
            .sum()
    }

    /// Whether the team may still negate a hit this match.
    #[must_use]
    pub fn has_negation_budget(&self) -> bool {
        self.negations_used < TEAM_NEGATION_BUDGET
    }

    /// Knock one standing fighter (chosen by index among the living) and
    /// leave a death box. Refuses to knock the last standing fighter.
    pub fn add_death_box(&mut self, living_index: usize) -> bool {
        if self.alive_count() <= 1 {
            return false;
        }
        let Some(fighter) = self
            .fighters
            .iter_mut()
            .filter(|f| f.is_alive())
            .nth(living_index)
        else {
            return false;
        };
        fighter.knock();
        self.death_boxes += 1;
        true
    }

    /// Restore up to `count` downed fighters, returning how many came back.
    pub fn restore_fighters(&mut self, count: u8) -> u8 {
        let mut restored = 0;
        for fighter in self.fighters.iter_mut().filter(|f| !f.is_alive()) {
            if restored == count {
                break;
            }
            fighter.restore();
            restored += 1;
        }
        restored
    }

    /// Remove the team from the match.
    pub fn eliminate(&mut self, round: u8) {
        for fighter in &mut self.fighters {
            fighter.knock();
        }
        self.death_boxes = 0;
        self.eliminated = true;
        self.eliminated_round = Some(round);
    }

    /// Sum of personal kill points across the roster.
    #[must_use]
    pub fn member_kill_points(&self) -> u32 {
        self.fighters.iter().map(|f| f.kill_points).sum()
    }

    /// Sum of personal assist points across the roster.
    #[must_use]
    pub fn member_assist_points(&self) -> u32 {
        self.fighters.iter().map(|f| f.assist_points).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_buffs_multiply() {
        let mut buffs = EventBuffs::default();
        buffs.accumulate(3.0, 3.0, 0.0);
        buffs.accumulate(2.0, 0.0, -1.0);
        assert!((buffs.aim - 1.03 * 1.02).abs() < 1e-12);
        assert!((buffs.mental - 1.03).abs() < 1e-12);
        assert!((buffs.agility - 0.99).abs() < 1e-12);
        assert!((buffs.product() - 1.03 * 1.02 * 1.03 * 0.99).abs() < 1e-12);
    }
}
