//! Team and fighter roster definitions.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::catalog::{require_finite, Catalog, SkillSlot};
use crate::error::{MatchError, Result};
use crate::team::TeamId;

/// Fighter identifier, unique across the whole field.
pub type FighterId = u32;

/// Number of fighters on every team.
pub const TEAM_SIZE: usize = 3;

/// Highest legal Armor value.
pub const MAX_ARMOR: f64 = 100.0;

/// Flat power used when a fighter has no power range.
pub const DEFAULT_BASE_POWER: f64 = 50.0;

/// Squad role, used for credit lotteries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// In-game leader.
    #[serde(rename = "IGL")]
    Igl,
    /// Entry fragger.
    #[serde(rename = "ATTACKER")]
    Attacker,
    /// Support / medic.
    #[serde(rename = "SUPPORT")]
    Support,
}

impl Role {
    /// Lottery weight when distributing macro-level kill and assist credit.
    #[must_use]
    pub const fn credit_weight(self) -> u32 {
        match self {
            Role::Attacker => 50,
            Role::Igl => 30,
            Role::Support => 20,
        }
    }
}

/// Base fighter statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatBlock {
    /// Maximum hit points.
    pub hp: f64,
    /// Starting and maximum Armor (0-100).
    pub armor: f64,
    /// Composure.
    pub mental: f64,
    /// Rotation speed, weighs into turn order.
    pub movement: f64,
    /// Accuracy.
    pub aim: f64,
    /// Evasion, weighs into turn order.
    pub agility: f64,
    /// Mechanical skill: crits, weapon handling, target selection.
    pub technique: f64,
    /// Team play.
    pub support: f64,
    /// Tracking.
    pub hunt: f64,
}

impl StatBlock {
    fn fields(&self) -> [(&'static str, f64); 9] {
        [
            ("hp", self.hp),
            ("armor", self.armor),
            ("mental", self.mental),
            ("movement", self.movement),
            ("aim", self.aim),
            ("agility", self.agility),
            ("technique", self.technique),
            ("support", self.support),
            ("hunt", self.hunt),
        ]
    }

    /// Validate every stat is finite, non-negative and Armor within cap.
    pub fn validate(&self, owner: &str) -> Result<()> {
        for (stat, value) in self.fields() {
            require_finite(owner, stat, value)?;
            if value < 0.0 {
                return Err(MatchError::InvalidStat {
                    fighter: owner.to_string(),
                    stat,
                    value,
                });
            }
        }
        if self.hp <= 0.0 {
            return Err(MatchError::InvalidStat {
                fighter: owner.to_string(),
                stat: "hp",
                value: self.hp,
            });
        }
        if self.armor > MAX_ARMOR {
            return Err(MatchError::InvalidStat {
                fighter: owner.to_string(),
                stat: "armor",
                value: self.armor,
            });
        }
        Ok(())
    }
}

/// Inclusive range a fighter's macro power is rolled from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerRange {
    /// Lowest roll.
    pub min: f64,
    /// Highest roll.
    pub max: f64,
}

/// Data-driven fighter definition.
///
/// # Example RON
///
/// ```ron
/// FighterData(
///     id: 101,
///     name: "Vex",
///     role: ATTACKER,
///     stats: StatBlock(hp: 100.0, armor: 75.0, mental: 60.0, movement: 7.0,
///         aim: 72.0, agility: 55.0, technique: 64.0, support: 30.0, hunt: 58.0),
///     power: Some(PowerRange(min: 55.0, max: 75.0)),
///     weapon: "r301",
///     ability: Some("stim"),
///     inventory: { "medkit": 2 },
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FighterData {
    /// Unique identifier across the field.
    pub id: FighterId,
    /// Display name.
    pub name: String,
    /// Squad role.
    pub role: Role,
    /// Base statistics.
    pub stats: StatBlock,
    /// Macro power roll range.
    #[serde(default)]
    pub power: Option<PowerRange>,
    /// Flat macro power when no range is given.
    #[serde(default = "default_base_power")]
    pub base_power: f64,
    /// Equipped weapon id.
    pub weapon: String,
    /// Equipped passive skill id.
    #[serde(default)]
    pub passive: Option<String>,
    /// Equipped ability skill id.
    #[serde(default)]
    pub ability: Option<String>,
    /// Equipped ultimate skill id.
    #[serde(default)]
    pub ultimate: Option<String>,
    /// Starting items by id.
    #[serde(default)]
    pub inventory: BTreeMap<String, u32>,
}

const fn default_base_power() -> f64 {
    DEFAULT_BASE_POWER
}

impl FighterData {
    /// Validate stats, power and catalog references.
    pub fn validate(&self, catalog: &Catalog) -> Result<()> {
        let owner = self.name.as_str();
        self.stats.validate(owner)?;
        require_finite(owner, "base_power", self.base_power)?;
        if let Some(range) = self.power {
            require_finite(owner, "power.min", range.min)?;
            require_finite(owner, "power.max", range.max)?;
            if range.min > range.max {
                return Err(MatchError::InvalidContent(format!(
                    "fighter '{owner}' has power range {}..{}",
                    range.min, range.max
                )));
            }
        }

        catalog.weapon(&self.weapon, owner)?;
        if let Some(id) = &self.passive {
            catalog.skill(id, SkillSlot::Passive, owner)?;
        }
        if let Some(id) = &self.ability {
            catalog.skill(id, SkillSlot::Ability, owner)?;
        }
        if let Some(id) = &self.ultimate {
            catalog.skill(id, SkillSlot::Ultimate, owner)?;
        }
        for item in self.inventory.keys() {
            catalog.item(item, owner)?;
        }
        Ok(())
    }
}

/// Data-driven team definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamData {
    /// Unique team identifier.
    pub id: TeamId,
    /// Display name.
    pub name: String,
    /// Exactly three fighters.
    pub members: Vec<FighterData>,
    /// Extra ability uses per fighter per match (coach bonus).
    #[serde(default)]
    pub ability_bonus_uses: u32,
}

/// Full match content: every team plus the shared catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    /// Participating teams.
    pub teams: Vec<TeamData>,
    /// Weapons, items and skills referenced by the teams.
    pub catalog: Catalog,
}

impl Roster {
    /// Parse a roster from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        ron::from_str(ron).map_err(|e| MatchError::Parse {
            what: "roster",
            message: e.to_string(),
        })
    }

    /// Validate the catalog, every team and id uniqueness.
    pub fn validate(&self) -> Result<()> {
        self.catalog.validate()?;

        let mut team_ids = BTreeSet::new();
        let mut fighter_ids = BTreeSet::new();
        for team in &self.teams {
            if !team_ids.insert(team.id) {
                return Err(MatchError::InvalidContent(format!(
                    "duplicate team id {}",
                    team.id
                )));
            }
            if team.members.len() != TEAM_SIZE {
                return Err(MatchError::InvalidContent(format!(
                    "team '{}' has {} members, expected {TEAM_SIZE}",
                    team.name,
                    team.members.len()
                )));
            }
            for member in &team.members {
                if !fighter_ids.insert(member.id) {
                    return Err(MatchError::InvalidContent(format!(
                        "duplicate fighter id {}",
                        member.id
                    )));
                }
                member.validate(&self.catalog)?;
            }
        }
        Ok(())
    }

    /// Find a team definition by id.
    #[must_use]
    pub fn team(&self, id: TeamId) -> Option<&TeamData> {
        self.teams.iter().find(|t| t.id == id)
    }
}
