//! Test fixtures and helpers.
//!
//! Pre-built content for consistent testing: a shared catalog, a generated
//! 20-team standard field and small builders for hand-tuned fighters.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use royale_core::data::{
    Catalog, FighterData, FighterId, ItemData, ItemKind, PowerRange, Role, Roster, SkillData,
    SkillEffect, SkillSlot, StatBlock, TeamData, WeaponData, DEFAULT_BASE_POWER,
};
use royale_core::error::Result;
use royale_core::team::{Team, TeamId};

/// Teams in a full field.
pub const STANDARD_FIELD_SIZE: u32 = 20;

/// Seed the standard field's stats are generated from.
pub const STANDARD_FIELD_SEED: u64 = 0x5eed_f1e1d;

/// Default seed for match fixtures.
pub const DEFAULT_TEST_SEED: u64 = 42;

fn weapon(id: &str, name: &str, base_damage: f64, tech_requirement: f64, aim_bonus: f64) -> WeaponData {
    WeaponData {
        id: id.to_string(),
        name: name.to_string(),
        base_damage,
        tech_requirement,
        aim_bonus,
    }
}

fn item(id: &str, name: &str, kind: ItemKind) -> ItemData {
    ItemData {
        id: id.to_string(),
        name: name.to_string(),
        kind,
    }
}

fn skill(id: &str, name: &str, slot: SkillSlot, effects: Vec<SkillEffect>) -> SkillData {
    SkillData {
        id: id.to_string(),
        name: name.to_string(),
        slot,
        effects,
    }
}

/// Catalog shared by every fixture roster.
#[must_use]
pub fn standard_catalog() -> Catalog {
    let mut catalog = Catalog::default();

    for w in [
        weapon("r301", "R-301", 18.0, 40.0, 3.0),
        weapon("flatline", "Flatline", 21.0, 50.0, 1.0),
        weapon("wingman", "Wingman", 28.0, 70.0, 0.0),
        weapon("peacekeeper", "Peacekeeper", 32.0, 60.0, -4.0),
    ] {
        catalog.weapons.insert(w.id.clone(), w);
    }

    for i in [
        item("revive", "Revive Kit", ItemKind::Revive),
        item("medkit", "Med Kit", ItemKind::Heal { amount: 50.0 }),
        item("syringe", "Syringe", ItemKind::Heal { amount: 25.0 }),
        item("battery", "Shield Battery", ItemKind::ArmorRepair { amount: 50.0 }),
        item("shield_cell", "Shield Cell", ItemKind::ArmorRepair { amount: 25.0 }),
        item("flashbang", "Flashbang", ItemKind::AoeDebuff { aim_penalty: 10.0 }),
        item("frag", "Frag Grenade", ItemKind::AoeDamage { damage: 20.0 }),
        item("arc_snare", "Arc Snare", ItemKind::Slow { speed_penalty: 8.0 }),
    ] {
        catalog.items.insert(i.id.clone(), i);
    }

    for s in [
        skill("steady", "Steady Hands", SkillSlot::Passive, vec![SkillEffect::CritBonus(3.0)]),
        skill("swift", "Swift", SkillSlot::Passive, vec![SkillEffect::AgilityBuff(4.0)]),
        skill(
            "stim",
            "Stim",
            SkillSlot::Ability,
            vec![SkillEffect::AimBuff(6.0), SkillEffect::AgilityBuff(5.0)],
        ),
        skill(
            "field_medic",
            "Field Medic",
            SkillSlot::Ability,
            vec![SkillEffect::HealTeam(20.0)],
        ),
        skill(
            "scan",
            "Recon Scan",
            SkillSlot::Ability,
            vec![SkillEffect::HitRateMultiplier(1.15)],
        ),
        skill(
            "aegis",
            "Aegis",
            SkillSlot::Ultimate,
            vec![SkillEffect::NegateNextHit, SkillEffect::ArmorTeam(30.0)],
        ),
        skill(
            "barrage",
            "Barrage",
            SkillSlot::Ultimate,
            vec![SkillEffect::DamageMultiplier(1.25), SkillEffect::StunEnemy],
        ),
    ] {
        catalog.skills.insert(s.id.clone(), s);
    }

    catalog
}

/// A stat block with fixed utility stats and the given combat stats.
#[must_use]
pub fn stats(aim: f64, agility: f64, technique: f64) -> StatBlock {
    StatBlock {
        hp: 100.0,
        armor: 50.0,
        mental: 50.0,
        movement: 5.0,
        aim,
        agility,
        technique,
        support: 40.0,
        hunt: 40.0,
    }
}

/// A bare fighter: R-301, no skills, empty inventory.
#[must_use]
pub fn fighter(id: FighterId, role: Role, stats: StatBlock) -> FighterData {
    FighterData {
        id,
        name: format!("fighter-{id}"),
        role,
        stats,
        power: None,
        base_power: DEFAULT_BASE_POWER,
        weapon: "r301".to_string(),
        passive: None,
        ability: None,
        ultimate: None,
        inventory: BTreeMap::new(),
    }
}

/// A team of three bare fighters with ids `id * 10 + 1..=3`.
#[must_use]
pub fn plain_team(id: TeamId, stats: StatBlock) -> TeamData {
    TeamData {
        id,
        name: format!("Team {id}"),
        members: vec![
            fighter(id * 10 + 1, Role::Igl, stats),
            fighter(id * 10 + 2, Role::Attacker, stats),
            fighter(id * 10 + 3, Role::Support, stats),
        ],
        ability_bonus_uses: 0,
    }
}

/// A team whose every member rolls exactly `power` in macro fights.
#[must_use]
pub fn power_team(id: TeamId, power: f64) -> TeamData {
    let mut team = plain_team(id, stats(60.0, 40.0, 40.0));
    for member in &mut team.members {
        member.power = Some(PowerRange {
            min: power,
            max: power,
        });
    }
    team
}

fn rolled_fighter(rng: &mut ChaCha8Rng, id: FighterId, role: Role) -> FighterData {
    let mut stat = |lo: f64, hi: f64| rng.gen_range(lo..hi).round();
    let stats = StatBlock {
        hp: 100.0,
        armor: stat(40.0, 76.0),
        mental: stat(40.0, 80.0),
        movement: stat(3.0, 9.0),
        aim: stat(45.0, 85.0),
        agility: stat(30.0, 70.0),
        technique: stat(35.0, 80.0),
        support: stat(20.0, 70.0),
        hunt: stat(20.0, 70.0),
    };
    let centre = (stats.aim + stats.technique) / 2.0;

    let (weapon, passive, ability, ultimate) = match role {
        Role::Attacker => ("flatline", "steady", "stim", "barrage"),
        Role::Igl => ("r301", "swift", "scan", "aegis"),
        Role::Support => ("r301", "swift", "field_medic", "aegis"),
    };
    let weapon = if rng.gen_bool(0.25) { "wingman" } else { weapon };

    let mut inventory = BTreeMap::from([
        ("medkit".to_string(), 1),
        ("syringe".to_string(), 2),
        ("shield_cell".to_string(), 2),
    ]);
    if role == Role::Support {
        inventory.insert("revive".to_string(), 1);
        inventory.insert("battery".to_string(), 1);
    }
    let grenade = match rng.gen_range(0..3) {
        0 => "frag",
        1 => "flashbang",
        _ => "arc_snare",
    };
    inventory.insert(grenade.to_string(), 1);

    FighterData {
        id,
        name: format!("fighter-{id}"),
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

/// A fully equipped generated team. Same id, same team.
#[must_use]
pub fn standard_team(id: TeamId) -> TeamData {
    let mut rng = ChaCha8Rng::seed_from_u64(STANDARD_FIELD_SEED ^ u64::from(id));
    TeamData {
        id,
        name: format!("Squad {id:02}"),
        members: vec![
            rolled_fighter(&mut rng, id * 10 + 1, Role::Igl),
            rolled_fighter(&mut rng, id * 10 + 2, Role::Attacker),
            rolled_fighter(&mut rng, id * 10 + 3, Role::Support),
        ],
        ability_bonus_uses: u32::from(id % 4 == 0),
    }
}

/// Generated roster of `count` teams with ids `1..=count`.
#[must_use]
pub fn roster_with(count: u32) -> Roster {
    Roster {
        teams: (1..=count).map(standard_team).collect(),
        catalog: standard_catalog(),
    }
}

/// The standard 20-team field.
#[must_use]
pub fn standard_roster() -> Roster {
    roster_with(STANDARD_FIELD_SIZE)
}

/// Roster built from explicit teams and the standard catalog.
#[must_use]
pub fn roster_of(teams: Vec<TeamData>) -> Roster {
    Roster {
        teams,
        catalog: standard_catalog(),
    }
}

/// The standard field as pretty RON.
pub fn standard_roster_ron() -> std::result::Result<String, ron::Error> {
    ron::ser::to_string_pretty(&standard_roster(), ron::ser::PrettyConfig::default())
}

/// Build a runtime team against the standard catalog.
pub fn build_team(data: &TeamData) -> Result<Team> {
    Team::from_data(data, &standard_catalog())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_roster_is_valid() {
        let roster = standard_roster();
        assert_eq!(roster.teams.len(), 20);
        roster.validate().expect("standard roster validates");
    }

    #[test]
    fn test_standard_team_is_stable() {
        assert_eq!(standard_team(7), standard_team(7));
        assert_ne!(standard_team(7).members[0].stats, standard_team(8).members[0].stats);
    }

    #[test]
    fn test_standard_roster_ron_parses_back() {
        let ron = standard_roster_ron().expect("serializes");
        let parsed = Roster::from_ron_str(&ron).expect("parses");
        assert_eq!(parsed, standard_roster());
    }

    #[test]
    fn test_power_team_rolls_fixed() {
        let team = build_team(&power_team(3, 80.0)).expect("valid");
        assert!(team
            .fighters
            .iter()
            .all(|f| f.power.map(|p| p.min == 80.0 && p.max == 80.0) == Some(true)));
    }
}
