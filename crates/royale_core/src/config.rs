//! Match configuration.
//!
//! Every tunable the match loop reads lives here: the seed, the focus team,
//! which engagement resolver to use, the per-round schedule, forcing odds,
//! event weights and scoring. All of it is plain serde data and can be
//! loaded from RON.

use serde::{Deserialize, Serialize};

use crate::error::{MatchError, Result};
use crate::events::EventTable;
use crate::scoring::ScoringConfig;
use crate::team::TeamId;

/// Number of rounds in a match.
pub const ROUND_COUNT: u8 = 6;

/// Default combat-tick safety cap per engagement.
pub const DEFAULT_MAX_COMBAT_TICKS: u32 = 200;

/// Which engagement resolver decides fights.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResolverMode {
    /// Power-difference coin flip with drawn kill tables.
    #[default]
    Macro,
    /// Full per-fighter turn simulation.
    Fighter,
}

/// Fixed parameters of one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSpec {
    /// Teams left standing after this round's fights.
    pub target_alive: u32,
    /// Engagements this round; each eliminates exactly one team.
    pub fight_slots: u32,
    /// Random events drawn this round.
    pub event_count: u32,
    /// Zones teams relocate into after the fights (0 = no movement).
    pub move_pool: u16,
}

/// Per-round schedule for a whole match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundTable {
    /// Zones teams land in before round 1.
    pub landing_pool: u16,
    /// Rounds 1..=6 in order.
    pub rounds: Vec<RoundSpec>,
}

impl Default for RoundTable {
    fn default() -> Self {
        let round = |target_alive, fight_slots, event_count, move_pool| RoundSpec {
            target_alive,
            fight_slots,
            event_count,
            move_pool,
        };
        Self {
            landing_pool: 16,
            rounds: vec![
                round(16, 4, 1, 16),
                round(12, 4, 2, 4),
                round(8, 4, 2, 2),
                round(4, 4, 2, 2),
                round(2, 2, 2, 1),
                round(1, 1, 0, 0),
            ],
        }
    }
}

impl RoundTable {
    /// Settings for a 1-based round index.
    #[must_use]
    pub fn round(&self, index: u8) -> Option<&RoundSpec> {
        self.rounds.get(usize::from(index).checked_sub(1)?)
    }

    /// Check the table can run a match starting with `field_size` teams.
    ///
    /// Every round must eliminate exactly `alive - target` teams through its
    /// fight slots, and every slot must be pairable from distinct teams.
    pub fn validate(&self, field_size: u32) -> Result<()> {
        if self.rounds.len() != usize::from(ROUND_COUNT) {
            return Err(MatchError::InvalidRoundTable(format!(
                "expected {ROUND_COUNT} rounds, got {}",
                self.rounds.len()
            )));
        }
        if self.landing_pool == 0 {
            return Err(MatchError::InvalidRoundTable(
                "landing pool must have at least one zone".to_string(),
            ));
        }

        let mut alive = field_size;
        for (i, spec) in self.rounds.iter().enumerate() {
            let index = i + 1;
            let expected = alive.checked_sub(spec.target_alive).ok_or_else(|| {
                MatchError::InvalidRoundTable(format!(
                    "round {index} target {} exceeds {alive} alive teams",
                    spec.target_alive
                ))
            })?;
            if spec.fight_slots != expected {
                return Err(MatchError::InvalidRoundTable(format!(
                    "round {index} has {} fight slots but must eliminate {expected} teams",
                    spec.fight_slots
                )));
            }
            if spec.fight_slots * 2 > alive {
                return Err(MatchError::InvalidRoundTable(format!(
                    "round {index} cannot pair {} fights from {alive} teams",
                    spec.fight_slots
                )));
            }
            let last = index == usize::from(ROUND_COUNT);
            if !last && spec.move_pool == 0 {
                return Err(MatchError::InvalidRoundTable(format!(
                    "round {index} needs a non-empty move pool"
                )));
            }
            alive = spec.target_alive;
        }

        if alive != 1 {
            return Err(MatchError::InvalidRoundTable(format!(
                "final round leaves {alive} teams, expected a single champion"
            )));
        }
        Ok(())
    }
}

/// Probability the focus team is forced into a fight, per round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusOdds {
    /// Round 1 only forces when the focus team shares a zone.
    pub first_round_requires_colocation: bool,
    /// Forcing probability for rounds 1..=6.
    pub by_round: Vec<f64>,
}

impl Default for FocusOdds {
    fn default() -> Self {
        Self {
            first_round_requires_colocation: true,
            by_round: vec![1.00, 0.70, 0.75, 0.80, 0.85, 1.00],
        }
    }
}

impl FocusOdds {
    /// Forcing probability for a round.
    #[must_use]
    pub fn probability(&self, round: u8, colocated: bool) -> f64 {
        if round == 1 && self.first_round_requires_colocation && !colocated {
            return 0.0;
        }
        usize::from(round)
            .checked_sub(1)
            .and_then(|i| self.by_round.get(i))
            .copied()
            .unwrap_or(0.0)
            .clamp(0.0, 1.0)
    }
}

/// Complete configuration for one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Seed for the match RNG.
    pub seed: u64,
    /// Team the scheduler biases into fights.
    #[serde(default)]
    pub focus_team: Option<TeamId>,
    /// Engagement resolver strategy.
    #[serde(default)]
    pub resolver: ResolverMode,
    /// Per-round schedule.
    #[serde(default)]
    pub rounds: RoundTable,
    /// Focus forcing odds.
    #[serde(default)]
    pub focus_odds: FocusOdds,
    /// Event weights.
    #[serde(default)]
    pub events: EventTable,
    /// Placement and pickup scoring.
    #[serde(default)]
    pub scoring: ScoringConfig,
    /// Combat-tick safety cap per engagement.
    #[serde(default = "default_max_ticks")]
    pub max_combat_ticks: u32,
}

const fn default_max_ticks() -> u32 {
    DEFAULT_MAX_COMBAT_TICKS
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            focus_team: None,
            resolver: ResolverMode::default(),
            rounds: RoundTable::default(),
            focus_odds: FocusOdds::default(),
            events: EventTable::default(),
            scoring: ScoringConfig::default(),
            max_combat_ticks: DEFAULT_MAX_COMBAT_TICKS,
        }
    }
}

impl MatchConfig {
    /// Default configuration with a given seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Builder method to set the focus team.
    #[must_use]
    pub fn with_focus(mut self, team: TeamId) -> Self {
        self.focus_team = Some(team);
        self
    }

    /// Builder method to set the resolver.
    #[must_use]
    pub fn with_resolver(mut self, resolver: ResolverMode) -> Self {
        self.resolver = resolver;
        self
    }

    /// Parse a configuration from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        ron::from_str(ron).map_err(|e| MatchError::Parse {
            what: "match config",
            message: e.to_string(),
        })
    }

    /// Validate against a field of `field_size` teams.
    pub fn validate(&self, field_size: u32) -> Result<()> {
        self.rounds.validate(field_size)?;
        self.events.validate()?;
        self.scoring.validate()?;
        if self.max_combat_ticks == 0 {
            return Err(MatchError::InvalidConfig(
                "max_combat_ticks must be positive".to_string(),
            ));
        }
        if self.focus_odds.by_round.iter().any(|p| !p.is_finite()) {
            return Err(MatchError::InvalidConfig(
                "focus odds must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_is_valid_for_twenty() {
        assert!(RoundTable::default().validate(20).is_ok());
    }

    #[test]
    fn test_default_table_rejects_other_fields() {
        assert!(RoundTable::default().validate(24).is_err());
        assert!(RoundTable::default().validate(12).is_err());
    }

    #[test]
    fn test_slot_mismatch_rejected() {
        let mut table = RoundTable::default();
        table.rounds[1].fight_slots = 3;
        assert!(matches!(
            table.validate(20),
            Err(MatchError::InvalidRoundTable(_))
        ));
    }

    #[test]
    fn test_unpairable_round_rejected() {
        // 10 teams -> 4 in one round needs 6 fights from 10 teams
        let table = RoundTable {
            landing_pool: 4,
            rounds: vec![
                RoundSpec {
                    target_alive: 4,
                    fight_slots: 6,
                    event_count: 0,
                    move_pool: 2,
                },
                RoundSpec {
                    target_alive: 4,
                    fight_slots: 0,
                    event_count: 0,
                    move_pool: 2,
                },
                RoundSpec {
                    target_alive: 4,
                    fight_slots: 0,
                    event_count: 0,
                    move_pool: 2,
                },
                RoundSpec {
                    target_alive: 4,
                    fight_slots: 0,
                    event_count: 0,
                    move_pool: 2,
                },
                RoundSpec {
                    target_alive: 2,
                    fight_slots: 2,
                    event_count: 0,
                    move_pool: 1,
                },
                RoundSpec {
                    target_alive: 1,
                    fight_slots: 1,
                    event_count: 0,
                    move_pool: 0,
                },
            ],
        };
        assert!(table.validate(10).is_err());
    }

    #[test]
    fn test_focus_odds() {
        let odds = FocusOdds::default();
        assert_eq!(odds.probability(1, false), 0.0);
        assert_eq!(odds.probability(1, true), 1.0);
        assert_eq!(odds.probability(2, false), 0.70);
        assert_eq!(odds.probability(5, true), 0.85);
        assert_eq!(odds.probability(6, false), 1.0);
        assert_eq!(odds.probability(7, false), 0.0);
    }

    #[test]
    fn test_config_from_ron() {
        let config = MatchConfig::from_ron_str("MatchConfig(seed: 42, resolver: Fighter)")
            .expect("config should parse");
        assert_eq!(config.seed, 42);
        assert_eq!(config.resolver, ResolverMode::Fighter);
        assert_eq!(config.max_combat_ticks, DEFAULT_MAX_COMBAT_TICKS);
        assert_eq!(config.rounds, RoundTable::default());
        assert!(config.validate(20).is_ok());
    }

    #[test]
    fn test_bad_values_are_config_errors() {
        let config = MatchConfig {
            max_combat_ticks: 0,
            ..MatchConfig::default()
        };
        assert!(matches!(
            config.validate(20),
            Err(MatchError::InvalidConfig(_))
        ));

        let mut config = MatchConfig::default();
        config.events.weights.values_mut().for_each(|w| *w = 0);
        assert!(matches!(
            config.validate(20),
            Err(MatchError::InvalidConfig(_))
        ));

        let mut config = MatchConfig::default();
        config.scoring.placement_points.clear();
        assert!(matches!(
            config.validate(20),
            Err(MatchError::InvalidConfig(_))
        ));
    }
}
