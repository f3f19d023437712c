//! Scenario loading and configuration.
//!
//! A scenario pairs a roster (teams plus catalog) with a match config. They
//! load from RON files; the built-in `standard` scenario generates a seeded
//! 20-team field over the default catalog.

use std::collections::BTreeMap;
use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use royale_core::config::MatchConfig;
use royale_core::data::{
    Catalog, FighterData, PowerRange, Role, Roster, StatBlock, TeamData, DEFAULT_BASE_POWER,
};
use royale_core::error::MatchError;
use royale_core::team::TeamId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the built-in scenario.
pub const STANDARD_SCENARIO: &str = "standard";

/// Seed the built-in field is generated from.
pub const STANDARD_FIELD_SEED: u64 = 2024;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read or write a file.
    #[error("Failed to access scenario file: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// Failed to write RON.
    #[error("Failed to serialize scenario: {0}")]
    SerializeError(#[from] ron::Error),
    /// Content or config rejected by the simulation.
    #[error("Invalid scenario: {0}")]
    Invalid(#[from] MatchError),
}

/// Weapons, items and skills the built-in field draws from.
pub const DEFAULT_CATALOG_RON: &str = r#"(
    weapons: {
        "r301": (id: "r301", name: "R-301", base_damage: 18.0, tech_requirement: 40.0, aim_bonus: 3.0),
        "flatline": (id: "flatline", name: "Flatline", base_damage: 21.0, tech_requirement: 50.0, aim_bonus: 1.0),
        "wingman": (id: "wingman", name: "Wingman", base_damage: 28.0, tech_requirement: 70.0, aim_bonus: 0.0),
        "peacekeeper": (id: "peacekeeper", name: "Peacekeeper", base_damage: 32.0, tech_requirement: 60.0, aim_bonus: -4.0),
    },
    items: {
        "revive": (id: "revive", name: "Revive Kit", kind: Revive),
        "medkit": (id: "medkit", name: "Med Kit", kind: Heal(amount: 50.0)),
        "syringe": (id: "syringe", name: "Syringe", kind: Heal(amount: 25.0)),
        "battery": (id: "battery", name: "Shield Battery", kind: ArmorRepair(amount: 50.0)),
        "shield_cell": (id: "shield_cell", name: "Shield Cell", kind: ArmorRepair(amount: 25.0)),
        "flashbang": (id: "flashbang", name: "Flashbang", kind: AoeDebuff(aim_penalty: 10.0)),
        "frag": (id: "frag", name: "Frag Grenade", kind: AoeDamage(damage: 20.0)),
        "arc_snare": (id: "arc_snare", name: "Arc Snare", kind: Slow(speed_penalty: 8.0)),
    },
    skills: {
        "steady": (id: "steady", name: "Steady Hands", slot: Passive, effects: [CritBonus(3.0)]),
        "swift": (id: "swift", name: "Swift", slot: Passive, effects: [AgilityBuff(4.0)]),
        "stim": (id: "stim", name: "Stim", slot: Ability, effects: [AimBuff(6.0), AgilityBuff(5.0)]),
        "field_medic": (id: "field_medic", name: "Field Medic", slot: Ability, effects: [HealTeam(20.0)]),
        "scan": (id: "scan", name: "Recon Scan", slot: Ability, effects: [HitRateMultiplier(1.15)]),
        "aegis": (id: "aegis", name: "Aegis", slot: Ultimate, effects: [NegateNextHit, ArmorTeam(30.0)]),
        "barrage": (id: "barrage", name: "Barrage", slot: Ultimate, effects: [DamageMultiplier(1.25), StunEnemy]),
    },
)"#;

const TEAM_NAMES: [&str; 20] = [
    "Iron Vultures",
    "Night Owls",
    "Red Comets",
    "Glass Cannons",
    "Static Shock",
    "Paper Tigers",
    "Cold Front",
    "Ember Line",
    "Ghost Signal",
    "Hollow Point",
    "Low Orbit",
    "Last Light",
    "Salt Kings",
    "Quiet Storm",
    "Rust Belt",
    "Silver Fox",
    "Third Wave",
    "Undertow",
    "Wild Card",
    "Zero Hour",
];

/// A complete scenario configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Teams and catalog.
    pub roster: Roster,
    /// Match configuration. The seed is overridden per run by batches.
    pub config: MatchConfig,
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// Write the scenario as pretty RON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ScenarioError> {
        let ron = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        std::fs::write(path, ron)?;
        Ok(())
    }

    /// The built-in scenario by name, or a RON file by path.
    pub fn resolve(name_or_path: &str) -> Result<Self, ScenarioError> {
        if name_or_path == STANDARD_SCENARIO {
            Self::standard()
        } else {
            Self::load(name_or_path)
        }
    }

    /// The built-in 20-team scenario.
    pub fn standard() -> Result<Self, ScenarioError> {
        let catalog: Catalog = ron::from_str(DEFAULT_CATALOG_RON)?;
        let roster = generate_roster(20, STANDARD_FIELD_SEED, catalog);
        Ok(Self {
            name: STANDARD_SCENARIO.to_string(),
            description: "Generated 20-team field over the default catalog".to_string(),
            roster,
            config: MatchConfig::default(),
        })
    }

    /// Check that a match can start from this scenario.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        self.roster.validate()?;
        self.config.validate(self.roster.teams.len() as u32)?;
        if let Some(focus) = self.config.focus_team {
            if self.roster.team(focus).is_none() {
                return Err(MatchError::TeamNotFound(focus).into());
            }
        }
        Ok(())
    }

    /// This scenario's config with the seed replaced.
    #[must_use]
    pub fn config_for_seed(&self, seed: u64) -> MatchConfig {
        MatchConfig {
            seed,
            ..self.config.clone()
        }
    }
}

fn rolled_member(rng: &mut ChaCha8Rng, id: u32, role: Role) -> FighterData {
    let mut roll = |lo: f64, hi: f64| rng.gen_range(lo..hi).round();
    let stats = StatBlock {
        hp: 100.0,
        armor: roll(40.0, 76.0),
        mental: roll(40.0, 80.0),
        movement: roll(3.0, 9.0),
        aim: roll(45.0, 85.0),
        agility: roll(30.0, 70.0),
        technique: roll(35.0, 80.0),
        support: roll(20.0, 70.0),
        hunt: roll(20.0, 70.0),
    };
    let centre = (stats.aim + stats.technique) / 2.0;

    let (mut weapon, passive, ability, ultimate) = match role {
        Role::Attacker => ("flatline", "steady", "stim", "barrage"),
        Role::Igl => ("r301", "swift", "scan", "aegis"),
        Role::Support => ("r301", "swift", "field_medic", "aegis"),
    };
    if stats.technique >= 65.0 {
        weapon = if rng.gen_bool(0.5) { "wingman" } else { "peacekeeper" };
    }

    let mut inventory = BTreeMap::from([
        ("medkit".to_string(), 1),
        ("syringe".to_string(), 2),
        ("shield_cell".to_string(), 2),
    ]);
    if role == Role::Support {
        inventory.insert("revive".to_string(), 1);
        inventory.insert("battery".to_string(), 1);
    }
    let grenade = ["frag", "flashbang", "arc_snare"][rng.gen_range(0..3)];
    inventory.insert(grenade.to_string(), 1);

    FighterData {
        id,
        name: format!("P{id}"),
        role,
        stats,
        power: Some(PowerRange {
            min: (centre - 12.0).max(1.0),
            max: centre + 12.0,
        }),
        base_power: DEFAULT_BASE_POWER,
        weapon: weapon.to_string(),
        passive: Some(passive.to_string()),
        ability: Some(ability.to_string()),
        ultimate: Some(ultimate.to_string()),
        inventory,
    }
}

/// Generate `teams` equipped teams against `catalog`.
///
/// Team ids run `1..=teams`, fighter ids `team * 10 + 1..=3`.
#[must_use]
pub fn generate_roster(teams: u32, seed: u64, catalog: Catalog) -> Roster {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let teams = (1..=teams)
        .map(|id: TeamId| {
            let name = TEAM_NAMES
                .get(id as usize - 1)
                .map_or_else(|| format!("Squad {id}"), |n| (*n).to_string());
            TeamData {
                id,
                name,
                members: vec![
                    rolled_member(&mut rng, id * 10 + 1, Role::Igl),
                    rolled_member(&mut rng, id * 10 + 2, Role::Attacker),
                    rolled_member(&mut rng, id * 10 + 3, Role::Support),
                ],
                ability_bonus_uses: u32::from(rng.gen_bool(0.2)),
            }
        })
        .collect();
    Roster { teams, catalog }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_parses() {
        let catalog: Catalog = ron::from_str(DEFAULT_CATALOG_RON).unwrap();
        assert_eq!(catalog.weapons.len(), 4);
        assert_eq!(catalog.items.len(), 8);
        catalog.validate().unwrap();
    }

    #[test]
    fn test_standard_scenario_is_valid() {
        let scenario = Scenario::standard().unwrap();
        assert_eq!(scenario.roster.teams.len(), 20);
        assert_eq!(scenario.roster.teams[0].name, "Iron Vultures");
        scenario.validate().unwrap();
    }

    #[test]
    fn test_generation_is_seeded() {
        let catalog: Catalog = ron::from_str(DEFAULT_CATALOG_RON).unwrap();
        let a = generate_roster(4, 9, catalog.clone());
        let b = generate_roster(4, 9, catalog.clone());
        let c = generate_roster(4, 10, catalog);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_save_load_round_trip() {
        let scenario = Scenario::standard().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("standard.ron");
        scenario.save(&path).unwrap();
        assert_eq!(Scenario::load(&path).unwrap(), scenario);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Scenario::resolve("does/not/exist.ron"),
            Err(ScenarioError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_unknown_focus_rejected() {
        let mut scenario = Scenario::standard().unwrap();
        scenario.config.focus_team = Some(99);
        assert!(matches!(
            scenario.validate(),
            Err(ScenarioError::Invalid(MatchError::TeamNotFound(99)))
        ));
    }

    #[test]
    fn test_parse_minimal_config_from_ron() {
        let catalog = DEFAULT_CATALOG_RON;
        let ron = format!(
            r#"(
                name: "Empty",
                roster: (teams: [], catalog: {catalog}),
                config: (seed: 5, resolver: Fighter, focus_team: Some(3)),
            )"#
        );
        let scenario = Scenario::from_ron_str(&ron).unwrap();
        assert_eq!(scenario.config.seed, 5);
        assert_eq!(scenario.config.focus_team, Some(3));
        assert_eq!(scenario.config.max_combat_ticks, 200);
        assert!(scenario.roster.teams.is_empty());
    }
}
