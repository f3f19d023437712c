//! Automatic item, ability and ultimate policies.
//!
//! Each policy is a pure function of an immutable [`BattlefieldSnapshot`]
//! taken from the acting fighter's point of view. The turn loop builds the
//! snapshot, asks for a decision and carries it out.

use crate::data::ItemKind;
use crate::fighter::{Fighter, Inventory};

/// Self-heal threshold as a fraction of max HP.
pub const HEAL_THRESHOLD: f64 = 0.35;

/// Self-repair threshold as a fraction of max Armor.
pub const REPAIR_THRESHOLD: f64 = 0.55;

/// Armor deficit that makes a team use abilities.
pub const ABILITY_ARMOR_GAP: f64 = 20.0;

/// Armor deficit that makes a team use ultimates.
pub const ULTIMATE_ARMOR_GAP: f64 = 30.0;

/// What the acting fighter can see.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BattlefieldSnapshot {
    /// Acting fighter's HP.
    pub hp: f64,
    /// Acting fighter's max HP.
    pub max_hp: f64,
    /// Acting fighter's Armor.
    pub armor: f64,
    /// Acting fighter's max Armor.
    pub max_armor: f64,
    /// Standing fighters on the acting team.
    pub own_alive: u8,
    /// Summed Armor on the acting team.
    pub own_armor: f64,
    /// Standing fighters on the strongest enemy team.
    pub enemy_alive: u8,
    /// Summed Armor on the strongest enemy team.
    pub enemy_armor: f64,
    /// Teams in the engagement, the acting team included.
    pub teams_in_fight: usize,
    /// Standing enemy fighters across all enemy teams.
    pub living_enemies: usize,
    /// An ally went down in this engagement and can be revived.
    pub ally_revivable: bool,
}

impl BattlefieldSnapshot {
    /// Snapshot for `actor`, who belongs to team `own` among `teams`.
    ///
    /// The strongest enemy is the one with the most standing fighters, then
    /// the most Armor.
    #[must_use]
    pub fn capture(actor: &Fighter, own: &TeamView, enemies: &[TeamView]) -> Self {
        let strongest = enemies.iter().max_by(|a, b| {
            a.alive
                .cmp(&b.alive)
                .then(a.armor.total_cmp(&b.armor))
        });

        Self {
            hp: actor.hp,
            max_hp: actor.max_hp(),
            armor: actor.armor,
            max_armor: actor.max_armor(),
            own_alive: own.alive,
            own_armor: own.armor,
            enemy_alive: strongest.map_or(0, |t| t.alive),
            enemy_armor: strongest.map_or(0.0, |t| t.armor),
            teams_in_fight: enemies.len() + 1,
            living_enemies: enemies.iter().map(|t| usize::from(t.alive)).sum(),
            ally_revivable: own.revivable,
        }
    }

    /// Enemy Armor lead over the acting team (negative when ahead).
    #[must_use]
    pub fn armor_deficit(&self) -> f64 {
        self.enemy_armor - self.own_armor
    }
}

/// Aggregate view of one team used to build snapshots.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TeamView {
    /// Standing fighters.
    pub alive: u8,
    /// Summed Armor over standing fighters.
    pub armor: f64,
    /// A fighter went down this engagement and can be revived.
    pub revivable: bool,
}

/// An item the acting fighter decided to use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemChoice<'a> {
    /// Item id to consume.
    pub id: &'a str,
    /// What it does.
    pub kind: ItemKind,
}

/// Pick at most one item to use this action.
///
/// Priority: revive, self-heal, self-repair, then offence shaped by the
/// number of standing enemies.
#[must_use]
pub fn choose_item<'a>(
    snapshot: &BattlefieldSnapshot,
    inventory: &'a Inventory,
) -> Option<ItemChoice<'a>> {
    let pick = |pred: fn(&ItemKind) -> bool| {
        inventory
            .find(pred)
            .map(|(id, kind)| ItemChoice { id, kind })
    };

    if snapshot.ally_revivable {
        if let Some(choice) = pick(|k| matches!(k, ItemKind::Revive)) {
            return Some(choice);
        }
    }
    if snapshot.hp <= snapshot.max_hp * HEAL_THRESHOLD {
        if let Some(choice) = pick(|k| matches!(k, ItemKind::Heal { .. })) {
            return Some(choice);
        }
    }
    if snapshot.max_armor > 0.0 && snapshot.armor <= snapshot.max_armor * REPAIR_THRESHOLD {
        if let Some(choice) = pick(|k| matches!(k, ItemKind::ArmorRepair { .. })) {
            return Some(choice);
        }
    }
    if snapshot.living_enemies == 0 {
        return None;
    }
    if snapshot.living_enemies >= 2 {
        if let Some(choice) = pick(|k| matches!(k, ItemKind::AoeDebuff { .. })) {
            return Some(choice);
        }
    }
    pick(|k| matches!(k, ItemKind::AoeDamage { .. }))
        .or_else(|| pick(|k| matches!(k, ItemKind::Slow { .. })))
}

/// Use an ability when the team is not clearly ahead.
#[must_use]
pub fn should_use_ability(snapshot: &BattlefieldSnapshot, uses_left: u32) -> bool {
    uses_left > 0
        && (snapshot.own_alive <= snapshot.enemy_alive
            || snapshot.armor_deficit() >= ABILITY_ARMOR_GAP)
}

/// Use the ultimate when the fight is critical or decisive.
#[must_use]
pub fn should_use_ultimate(snapshot: &BattlefieldSnapshot, already_used: bool) -> bool {
    !already_used
        && (snapshot.own_alive <= 2
            || snapshot.armor_deficit() >= ULTIMATE_ARMOR_GAP
            || snapshot.teams_in_fight >= 3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::catalog;
    use std::collections::BTreeMap;

    fn snapshot() -> BattlefieldSnapshot {
        BattlefieldSnapshot {
            hp: 100.0,
            max_hp: 100.0,
            armor: 50.0,
            max_armor: 50.0,
            own_alive: 3,
            own_armor: 150.0,
            enemy_alive: 2,
            enemy_armor: 100.0,
            teams_in_fight: 2,
            living_enemies: 2,
            ally_revivable: false,
        }
    }

    fn inventory(items: &[&str]) -> Inventory {
        let counts: BTreeMap<String, u32> = items.iter().map(|id| ((*id).to_string(), 1)).collect();
        Inventory::from_counts(&counts, &catalog(), "test").expect("fixture items exist")
    }

    #[test]
    fn test_revive_takes_priority() {
        let inv = inventory(&["revive", "medkit", "frag"]);
        let snap = BattlefieldSnapshot {
            hp: 10.0,
            ally_revivable: true,
            ..snapshot()
        };
        let choice = choose_item(&snap, &inv).expect("an item applies");
        assert_eq!(choice.kind, ItemKind::Revive);
    }

    #[test]
    fn test_heal_threshold() {
        let inv = inventory(&["medkit", "frag"]);
        let hurt = BattlefieldSnapshot {
            hp: 35.0,
            ..snapshot()
        };
        assert!(matches!(
            choose_item(&hurt, &inv).map(|c| c.kind),
            Some(ItemKind::Heal { .. })
        ));

        let healthy = BattlefieldSnapshot {
            hp: 36.0,
            ..snapshot()
        };
        assert!(matches!(
            choose_item(&healthy, &inv).map(|c| c.kind),
            Some(ItemKind::AoeDamage { .. })
        ));
    }

    #[test]
    fn test_repair_threshold() {
        let inv = inventory(&["shield_cell"]);
        let cracked = BattlefieldSnapshot {
            armor: 27.5,
            ..snapshot()
        };
        assert!(matches!(
            choose_item(&cracked, &inv).map(|c| c.kind),
            Some(ItemKind::ArmorRepair { .. })
        ));
        assert!(choose_item(&snapshot(), &inv).is_none());
    }

    #[test]
    fn test_offence_by_enemy_count() {
        let inv = inventory(&["flash", "frag", "arc_snare"]);
        assert!(matches!(
            choose_item(&snapshot(), &inv).map(|c| c.kind),
            Some(ItemKind::AoeDebuff { .. })
        ));

        let lone = BattlefieldSnapshot {
            living_enemies: 1,
            ..snapshot()
        };
        assert!(matches!(
            choose_item(&lone, &inv).map(|c| c.kind),
            Some(ItemKind::AoeDamage { .. })
        ));

        let slow_only = inventory(&["flash", "arc_snare"]);
        assert!(matches!(
            choose_item(&lone, &slow_only).map(|c| c.kind),
            Some(ItemKind::Slow { .. })
        ));
    }

    #[test]
    fn test_ability_trigger() {
        // 3 vs 2 with an Armor lead: clearly ahead
        assert!(!should_use_ability(&snapshot(), 2));

        let even = BattlefieldSnapshot {
            enemy_alive: 3,
            ..snapshot()
        };
        assert!(should_use_ability(&even, 2));
        assert!(!should_use_ability(&even, 0));

        let outarmored = BattlefieldSnapshot {
            enemy_armor: 170.0,
            ..snapshot()
        };
        assert!(should_use_ability(&outarmored, 1));
    }

    #[test]
    fn test_ultimate_trigger() {
        assert!(!should_use_ultimate(&snapshot(), false));

        let down_one = BattlefieldSnapshot {
            own_alive: 2,
            ..snapshot()
        };
        assert!(should_use_ultimate(&down_one, false));
        assert!(!should_use_ultimate(&down_one, true));

        let brawl = BattlefieldSnapshot {
            teams_in_fight: 3,
            ..snapshot()
        };
        assert!(should_use_ultimate(&brawl, false));

        let outarmored = BattlefieldSnapshot {
            enemy_armor: 180.0,
            ..snapshot()
        };
        assert!(should_use_ultimate(&outarmored, false));
    }
}
