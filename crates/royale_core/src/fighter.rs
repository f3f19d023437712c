//! Runtime fighter state.
//!
//! A [`Fighter`] is built from validated [`FighterData`] at match start and
//! carries every piece of mutable combat state for the rest of the match:
//! current HP/Armor, temporary buffs, one-shot charges, skill usage counters
//! and personal kill/assist credit. It is discarded when the match ends.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::data::{
    Catalog, FighterData, FighterId, ItemKind, PowerRange, Role, SkillData, SkillSlot, StatBlock,
    WeaponData,
};
use crate::error::Result;

/// Cap on the summed aim buff (items, abilities, weapon).
pub const AIM_BUFF_CAP: f64 = 15.0;

/// Cap on the summed agility buff.
pub const AGILITY_BUFF_CAP: f64 = 10.0;

/// Ability uses per fighter per match before coach bonuses.
pub const BASE_ABILITY_USES: u32 = 2;

// ============================================================================
// One-shot capabilities
// ============================================================================

/// A consumable capability with a remaining-uses count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Charge {
    remaining: u8,
}

impl Charge {
    /// Arm the charge for one use. Re-arming does not stack.
    pub fn arm(&mut self) {
        self.remaining = 1;
    }

    /// Whether a use is available.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.remaining > 0
    }

    /// Spend one use, returning whether one was available.
    pub fn consume(&mut self) -> bool {
        if self.remaining > 0 {
            self.remaining -= 1;
            true
        } else {
            false
        }
    }

    /// Drop any remaining uses.
    pub fn clear(&mut self) {
        self.remaining = 0;
    }
}

/// A temporary stat penalty taken on the next relevant roll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TempPenalty {
    amount: f64,
}

impl TempPenalty {
    /// Apply a penalty; overlapping penalties keep the larger one.
    pub fn apply(&mut self, amount: f64) {
        self.amount = self.amount.max(amount);
    }

    /// Pending penalty without consuming it.
    #[must_use]
    pub const fn pending(&self) -> f64 {
        self.amount
    }

    /// Consume the penalty, returning its amount.
    pub fn take(&mut self) -> f64 {
        std::mem::take(&mut self.amount)
    }
}

/// Every one-shot status effect a fighter can carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusCharges {
    /// Lose the next action.
    pub skip_next_action: Charge,
    /// Void the next incoming hit (subject to negation budgets).
    pub negate_next_hit: Charge,
    /// Aim removed from the next attack.
    pub aim_penalty: TempPenalty,
    /// Speed removed from the next turn-order roll.
    pub speed_penalty: TempPenalty,
}

// ============================================================================
// Buffs and usage
// ============================================================================

/// Temporary buffs accumulated during one engagement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombatBuffs {
    /// Raw aim buff sum; read through [`CombatBuffs::aim_buff`].
    pub aim: f64,
    /// Raw agility buff sum; read through [`CombatBuffs::agility_buff`].
    pub agility: f64,
    /// Outgoing damage multiplier.
    pub damage_mul: f64,
    /// Hit chance multiplier.
    pub hit_mul: f64,
    /// Extra crit chance in percentage points.
    pub crit_bonus: f64,
}

impl Default for CombatBuffs {
    fn default() -> Self {
        Self {
            aim: 0.0,
            agility: 0.0,
            damage_mul: 1.0,
            hit_mul: 1.0,
            crit_bonus: 0.0,
        }
    }
}

impl CombatBuffs {
    /// Aim buff after the cap.
    #[must_use]
    pub fn aim_buff(&self) -> f64 {
        self.aim.min(AIM_BUFF_CAP)
    }

    /// Agility buff after the cap.
    #[must_use]
    pub fn agility_buff(&self) -> f64 {
        self.agility.min(AGILITY_BUFF_CAP)
    }
}

/// Per-match skill usage and limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkillUsage {
    /// Abilities used this match.
    pub abilities_used: u32,
    /// Whether the ultimate has been used this match.
    pub ultimate_used: bool,
    /// Whether this fighter already had a hit negated this match.
    pub negated_once: bool,
}

// ============================================================================
// Inventory
// ============================================================================

/// A stack of one item kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InventorySlot {
    /// What the item does.
    pub kind: ItemKind,
    /// How many are left.
    pub count: u32,
}

/// Item stacks by item id, resolved against the catalog at match start.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    slots: BTreeMap<String, InventorySlot>,
}

impl Inventory {
    /// Build from starting counts; the catalog must already be validated.
    pub fn from_counts(
        counts: &BTreeMap<String, u32>,
        catalog: &Catalog,
        owner: &str,
    ) -> Result<Self> {
        let mut slots = BTreeMap::new();
        for (id, &count) in counts {
            let item = catalog.item(id, owner)?;
            if count > 0 {
                slots.insert(
                    id.clone(),
                    InventorySlot {
                        kind: item.kind,
                        count,
                    },
                );
            }
        }
        Ok(Self { slots })
    }

    /// First held item (in id order) matching the predicate.
    pub fn find(&self, mut pred: impl FnMut(&ItemKind) -> bool) -> Option<(&str, ItemKind)> {
        self.slots
            .iter()
            .find(|(_, slot)| slot.count > 0 && pred(&slot.kind))
            .map(|(id, slot)| (id.as_str(), slot.kind))
    }

    /// Remove one of the given item, returning whether it was held.
    pub fn consume(&mut self, id: &str) -> bool {
        match self.slots.get_mut(id) {
            Some(slot) if slot.count > 0 => {
                slot.count -= 1;
                true
            }
            _ => false,
        }
    }

    /// Remaining count of an item.
    #[must_use]
    pub fn count(&self, id: &str) -> u32 {
        self.slots.get(id).map_or(0, |s| s.count)
    }

    /// Total items held.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.slots.values().map(|s| s.count).sum()
    }
}

// ============================================================================
// Fighter
// ============================================================================

/// A team member with all per-match combat state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fighter {
    /// Unique identifier across the field.
    pub id: FighterId,
    /// Display name.
    pub name: String,
    /// Squad role.
    pub role: Role,
    /// Base statistics from content.
    pub base: StatBlock,
    /// Current HP (0 = down).
    pub hp: f64,
    /// Current Armor.
    pub armor: f64,
    /// Current mental.
    pub mental: f64,
    /// Macro power roll range.
    pub power: Option<PowerRange>,
    /// Flat macro power fallback.
    pub base_power: f64,
    /// Equipped weapon.
    pub weapon: WeaponData,
    /// Equipped passive.
    pub passive: Option<SkillData>,
    /// Equipped ability.
    pub ability: Option<SkillData>,
    /// Equipped ultimate.
    pub ultimate: Option<SkillData>,
    /// Consumables.
    pub inventory: Inventory,
    /// Temporary engagement buffs.
    pub buffs: CombatBuffs,
    /// One-shot status effects.
    pub status: StatusCharges,
    /// Per-match usage counters.
    pub usage: SkillUsage,
    /// Set when HP was lost in the current engagement.
    pub took_damage: bool,
    /// Personal kill points this match.
    pub kill_points: u32,
    /// Personal assist points this match.
    pub assist_points: u32,
}

impl Fighter {
    /// Build a fighter at its match-start baseline.
    pub fn from_data(data: &FighterData, catalog: &Catalog) -> Result<Self> {
        data.validate(catalog)?;
        let owner = data.name.as_str();
        let skill = |id: &Option<String>, slot| -> Result<Option<SkillData>> {
            id.as_ref()
                .map(|id| catalog.skill(id, slot, owner).cloned())
                .transpose()
        };

        Ok(Self {
            id: data.id,
            name: data.name.clone(),
            role: data.role,
            base: data.stats,
            hp: data.stats.hp,
            armor: data.stats.armor,
            mental: data.stats.mental,
            power: data.power,
            base_power: data.base_power,
            weapon: catalog.weapon(&data.weapon, owner)?.clone(),
            passive: skill(&data.passive, SkillSlot::Passive)?,
            ability: skill(&data.ability, SkillSlot::Ability)?,
            ultimate: skill(&data.ultimate, SkillSlot::Ultimate)?,
            inventory: Inventory::from_counts(&data.inventory, catalog, owner)?,
            buffs: CombatBuffs::default(),
            status: StatusCharges::default(),
            usage: SkillUsage::default(),
            took_damage: false,
            kill_points: 0,
            assist_points: 0,
        })
    }

    /// Whether the fighter is standing.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    /// Maximum HP.
    #[must_use]
    pub fn max_hp(&self) -> f64 {
        self.base.hp
    }

    /// Maximum Armor.
    #[must_use]
    pub fn max_armor(&self) -> f64 {
        self.base.armor
    }

    /// Armor depleted or HP below max.
    #[must_use]
    pub fn is_weak(&self) -> bool {
        self.armor <= 0.0 || self.hp < self.max_hp()
    }

    /// Restore HP, clamped to max. No effect on a downed fighter.
    pub fn heal(&mut self, amount: f64) {
        if self.is_alive() {
            self.hp = (self.hp + amount.max(0.0)).min(self.max_hp());
        }
    }

    /// Restore Armor, clamped to max. No effect on a downed fighter.
    pub fn repair(&mut self, amount: f64) {
        if self.is_alive() {
            self.armor = (self.armor + amount.max(0.0)).min(self.max_armor());
        }
    }

    /// Put the fighter down outside of combat (macro attrition).
    pub fn knock(&mut self) {
        self.hp = 0.0;
        self.armor = 0.0;
        self.status = StatusCharges::default();
    }

    /// Bring a downed fighter back at full HP and base Armor.
    pub fn restore(&mut self) {
        self.hp = self.max_hp();
        self.armor = self.max_armor();
        self.status = StatusCharges::default();
        self.took_damage = false;
    }

    /// Clear engagement-scoped state and apply the passive.
    ///
    /// Usage counters and per-match limits are left untouched.
    pub fn prepare_for_engagement(&mut self) {
        self.buffs = CombatBuffs::default();
        self.status = StatusCharges::default();
        self.took_damage = false;
        self.buffs.aim += self.weapon.aim_bonus;
        if let Some(passive) = self.passive.clone() {
            crate::combat::apply_buff_effects(&mut self.buffs, &passive.effects);
        }
    }

    /// Ability uses left given the team's coach bonus.
    #[must_use]
    pub fn abilities_remaining(&self, team_bonus: u32) -> u32 {
        (BASE_ABILITY_USES + team_bonus).saturating_sub(self.usage.abilities_used)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charge_consumes_once() {
        let mut charge = Charge::default();
        assert!(!charge.consume());
        charge.arm();
        charge.arm();
        assert!(charge.is_armed());
        assert!(charge.consume());
        assert!(!charge.consume());
    }

    #[test]
    fn test_penalty_keeps_larger_and_takes() {
        let mut penalty = TempPenalty::default();
        penalty.apply(4.0);
        penalty.apply(2.0);
        assert_eq!(penalty.pending(), 4.0);
        assert_eq!(penalty.take(), 4.0);
        assert_eq!(penalty.take(), 0.0);
    }

    #[test]
    fn test_buff_caps() {
        let buffs = CombatBuffs {
            aim: 22.0,
            agility: 14.0,
            ..CombatBuffs::default()
        };
        assert_eq!(buffs.aim_buff(), AIM_BUFF_CAP);
        assert_eq!(buffs.agility_buff(), AGILITY_BUFF_CAP);
    }

    #[test]
    fn test_inventory_consume() {
        let mut catalog = Catalog::default();
        catalog.items.insert(
            "medkit".to_string(),
            crate::data::ItemData {
                id: "medkit".to_string(),
                name: "Medkit".to_string(),
                kind: ItemKind::Heal { amount: 40.0 },
            },
        );
        let counts = BTreeMap::from([("medkit".to_string(), 2)]);
        let mut inventory = Inventory::from_counts(&counts, &catalog, "f1").expect("valid");

        assert!(inventory
            .find(|k| matches!(k, ItemKind::Heal { .. }))
            .is_some());
        assert!(inventory.consume("medkit"));
        assert!(inventory.consume("medkit"));
        assert!(!inventory.consume("medkit"));
        assert!(inventory
            .find(|k| matches!(k, ItemKind::Heal { .. }))
            .is_none());
        assert_eq!(inventory.total(), 0);
    }
}
