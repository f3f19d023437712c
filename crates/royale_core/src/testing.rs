//! In-crate fixtures for unit tests.
//!
//! Integration tests and benches use `royale_test_utils` instead; this module
//! exists because unit tests cannot share types with that crate.

use std::collections::BTreeMap;

use crate::data::{
    Catalog, FighterData, ItemData, ItemKind, Role, Roster, SkillData, SkillEffect, SkillSlot,
    StatBlock, TeamData, WeaponData, DEFAULT_BASE_POWER,
};
use crate::team::{Team, TeamId};

pub(crate) fn stats(aim: f64, agility: f64, technique: f64) -> StatBlock {
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

pub(crate) fn catalog() -> Catalog {
    let mut catalog = Catalog::default();
    catalog.weapons.insert(
        "rifle".to_string(),
        WeaponData {
            id: "rifle".to_string(),
            name: "Rifle".to_string(),
            base_damage: 20.0,
            tech_requirement: 30.0,
            aim_bonus: 2.0,
        },
    );
    for (id, kind) in [
        ("revive", ItemKind::Revive),
        ("medkit", ItemKind::Heal { amount: 40.0 }),
        ("shield_cell", ItemKind::ArmorRepair { amount: 25.0 }),
        ("flash", ItemKind::AoeDebuff { aim_penalty: 8.0 }),
        ("frag", ItemKind::AoeDamage { damage: 15.0 }),
        ("arc_snare", ItemKind::Slow { speed_penalty: 6.0 }),
    ] {
        catalog.items.insert(
            id.to_string(),
            ItemData {
                id: id.to_string(),
                name: id.to_string(),
                kind,
            },
        );
    }
    for (id, slot, effects) in [
        (
            "steady",
            SkillSlot::Passive,
            vec![SkillEffect::CritBonus(1.0)],
        ),
        (
            "stim",
            SkillSlot::Ability,
            vec![SkillEffect::AimBuff(5.0), SkillEffect::AgilityBuff(4.0)],
        ),
        (
            "aegis",
            SkillSlot::Ultimate,
            vec![SkillEffect::NegateNextHit, SkillEffect::HealTeam(20.0)],
        ),
    ] {
        catalog.skills.insert(
            id.to_string(),
            SkillData {
                id: id.to_string(),
                name: id.to_string(),
                slot,
                effects,
            },
        );
    }
    catalog
}

pub(crate) fn fighter_data(id: u32, role: Role) -> FighterData {
    FighterData {
        id,
        name: format!("fighter-{id}"),
        role,
        stats: stats(60.0, 40.0, 40.0),
        power: None,
        base_power: DEFAULT_BASE_POWER,
        weapon: "rifle".to_string(),
        passive: None,
        ability: None,
        ultimate: None,
        inventory: BTreeMap::new(),
    }
}

pub(crate) fn team_data(id: TeamId) -> TeamData {
    TeamData {
        id,
        name: format!("Team {id}"),
        members: vec![
            fighter_data(id * 10 + 1, Role::Igl),
            fighter_data(id * 10 + 2, Role::Attacker),
            fighter_data(id * 10 + 3, Role::Support),
        ],
        ability_bonus_uses: 0,
    }
}

pub(crate) fn roster(count: u32) -> Roster {
    Roster {
        teams: (1..=count).map(team_data).collect(),
        catalog: catalog(),
    }
}

pub(crate) fn sample_team(id: TeamId) -> Team {
    Team::from_data(&team_data(id), &catalog()).expect("fixture team is valid")
}
