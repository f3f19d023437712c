//! Weapon, item and skill catalog definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{MatchError, Result};

/// Data-driven weapon definition.
///
/// # Example RON
///
/// ```ron
/// WeaponData(
///     id: "r301",
///     name: "R-301 Carbine",
///     base_damage: 14.0,
///     tech_requirement: 40.0,
///     aim_bonus: 3.0,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponData {
    /// Unique string identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Damage per hit before scaling.
    pub base_damage: f64,
    /// Technique below this value costs the wielder hit chance.
    #[serde(default)]
    pub tech_requirement: f64,
    /// Aim contribution counted against the aim buff cap.
    #[serde(default)]
    pub aim_bonus: f64,
}

/// What a consumable item does when used.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ItemKind {
    /// Brings back an ally knocked in the current engagement.
    Revive,
    /// Restores HP to the user.
    Heal {
        /// HP restored.
        amount: f64,
    },
    /// Restores Armor to the user.
    ArmorRepair {
        /// Armor restored.
        amount: f64,
    },
    /// Lowers the aim of every living enemy for their next attack.
    AoeDebuff {
        /// Aim removed.
        aim_penalty: f64,
    },
    /// Damages every living enemy.
    AoeDamage {
        /// Damage per enemy before the per-hit cap.
        damage: f64,
    },
    /// Lowers one enemy's speed for the next turn-order roll.
    Slow {
        /// Speed removed.
        speed_penalty: f64,
    },
}

impl ItemKind {
    fn magnitude(self) -> Option<(&'static str, f64)> {
        match self {
            ItemKind::Revive => None,
            ItemKind::Heal { amount } | ItemKind::ArmorRepair { amount } => Some(("amount", amount)),
            ItemKind::AoeDebuff { aim_penalty } => Some(("aim_penalty", aim_penalty)),
            ItemKind::AoeDamage { damage } => Some(("damage", damage)),
            ItemKind::Slow { speed_penalty } => Some(("speed_penalty", speed_penalty)),
        }
    }
}

/// Data-driven consumable item definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemData {
    /// Unique string identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Effect on use.
    pub kind: ItemKind,
}

/// Which slot a skill occupies on a fighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillSlot {
    /// Always on; applied at the start of every engagement.
    Passive,
    /// Used automatically a limited number of times per match.
    Ability,
    /// Used automatically at most once per match.
    Ultimate,
}

/// A single effect carried by a skill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SkillEffect {
    /// Adds to the aim buff (capped when read).
    AimBuff(f64),
    /// Adds to the agility buff (capped when read).
    AgilityBuff(f64),
    /// Multiplies outgoing damage.
    DamageMultiplier(f64),
    /// Multiplies hit chance before the final clamp.
    HitRateMultiplier(f64),
    /// Adds crit chance percentage points.
    CritBonus(f64),
    /// Restores HP to the user.
    HealSelf(f64),
    /// Restores HP to every living teammate, user included.
    HealTeam(f64),
    /// Restores Armor to every living teammate, user included.
    ArmorTeam(f64),
    /// A random living enemy loses its next action.
    StunEnemy,
    /// The user's next incoming hit is voided. Ultimates only.
    NegateNextHit,
}

impl SkillEffect {
    /// Whether a passive may carry this effect.
    #[must_use]
    pub const fn is_passive_compatible(self) -> bool {
        matches!(
            self,
            SkillEffect::AimBuff(_)
                | SkillEffect::AgilityBuff(_)
                | SkillEffect::DamageMultiplier(_)
                | SkillEffect::HitRateMultiplier(_)
                | SkillEffect::CritBonus(_)
        )
    }

    fn value(self) -> Option<f64> {
        match self {
            SkillEffect::AimBuff(v)
            | SkillEffect::AgilityBuff(v)
            | SkillEffect::DamageMultiplier(v)
            | SkillEffect::HitRateMultiplier(v)
            | SkillEffect::CritBonus(v)
            | SkillEffect::HealSelf(v)
            | SkillEffect::HealTeam(v)
            | SkillEffect::ArmorTeam(v) => Some(v),
            SkillEffect::StunEnemy | SkillEffect::NegateNextHit => None,
        }
    }
}

/// Data-driven passive, ability or ultimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillData {
    /// Unique string identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Slot this skill is equipped in.
    pub slot: SkillSlot,
    /// Effects applied on use.
    pub effects: Vec<SkillEffect>,
}

/// Read-only content catalog shared by every team in a match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Weapons by id.
    #[serde(default)]
    pub weapons: BTreeMap<String, WeaponData>,
    /// Items by id.
    #[serde(default)]
    pub items: BTreeMap<String, ItemData>,
    /// Skills by id.
    #[serde(default)]
    pub skills: BTreeMap<String, SkillData>,
}

impl Catalog {
    /// Look up a weapon.
    pub fn weapon(&self, id: &str, owner: &str) -> Result<&WeaponData> {
        self.weapons
            .get(id)
            .ok_or_else(|| MatchError::UnknownReference {
                kind: "weapon",
                id: id.to_string(),
                owner: owner.to_string(),
            })
    }

    /// Look up an item.
    pub fn item(&self, id: &str, owner: &str) -> Result<&ItemData> {
        self.items.get(id).ok_or_else(|| MatchError::UnknownReference {
            kind: "item",
            id: id.to_string(),
            owner: owner.to_string(),
        })
    }

    /// Look up a skill and check it fits the requested slot.
    pub fn skill(&self, id: &str, slot: SkillSlot, owner: &str) -> Result<&SkillData> {
        let skill = self
            .skills
            .get(id)
            .ok_or_else(|| MatchError::UnknownReference {
                kind: "skill",
                id: id.to_string(),
                owner: owner.to_string(),
            })?;
        if skill.slot != slot {
            return Err(MatchError::InvalidContent(format!(
                "'{owner}' equips skill '{id}' ({:?}) in the {slot:?} slot",
                skill.slot
            )));
        }
        Ok(skill)
    }

    /// Check every catalog entry for malformed values.
    pub fn validate(&self) -> Result<()> {
        for (key, weapon) in &self.weapons {
            check_key(key, &weapon.id)?;
            require_finite(&weapon.id, "base_damage", weapon.base_damage)?;
            require_finite(&weapon.id, "tech_requirement", weapon.tech_requirement)?;
            require_finite(&weapon.id, "aim_bonus", weapon.aim_bonus)?;
            if weapon.base_damage <= 0.0 {
                return Err(MatchError::InvalidStat {
                    fighter: weapon.id.clone(),
                    stat: "base_damage",
                    value: weapon.base_damage,
                });
            }
        }

        for (key, item) in &self.items {
            check_key(key, &item.id)?;
            if let Some((stat, value)) = item.kind.magnitude() {
                require_finite(&item.id, stat, value)?;
                require_non_negative(&item.id, stat, value)?;
            }
        }

        for (key, skill) in &self.skills {
            check_key(key, &skill.id)?;
            for effect in &skill.effects {
                if let Some(value) = effect.value() {
                    require_finite(&skill.id, "effect", value)?;
                }
                if let SkillEffect::HealSelf(v) | SkillEffect::HealTeam(v) | SkillEffect::ArmorTeam(v) =
                    *effect
                {
                    require_non_negative(&skill.id, "effect", v)?;
                }
                if *effect == SkillEffect::NegateNextHit && skill.slot != SkillSlot::Ultimate {
                    return Err(MatchError::InvalidContent(format!(
                        "skill '{}' carries NegateNextHit but is not an ultimate",
                        skill.id
                    )));
                }
                if skill.slot == SkillSlot::Passive && !effect.is_passive_compatible() {
                    return Err(MatchError::InvalidContent(format!(
                        "passive '{}' carries non-passive effect {effect:?}",
                        skill.id
                    )));
                }
            }
        }

        Ok(())
    }
}

fn check_key(key: &str, id: &str) -> Result<()> {
    if key == id {
        Ok(())
    } else {
        Err(MatchError::InvalidContent(format!(
            "catalog key '{key}' does not match entry id '{id}'"
        )))
    }
}

/// Reject NaN and infinities.
pub(crate) fn require_finite(owner: &str, stat: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(MatchError::InvalidStat {
            fighter: owner.to_string(),
            stat,
            value,
        })
    }
}

fn require_non_negative(owner: &str, stat: &'static str, value: f64) -> Result<()> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(MatchError::InvalidStat {
            fighter: owner.to_string(),
            stat,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn skill(id: &str, slot: SkillSlot, effects: Vec<SkillEffect>) -> SkillData {
        SkillData {
            id: id.to_string(),
            name: id.to_string(),
            slot,
            effects,
        }
    }

    #[test]
    fn test_negate_only_on_ultimates() {
        let mut catalog = Catalog::default();
        catalog.skills.insert(
            "shield".to_string(),
            skill("shield", SkillSlot::Ability, vec![SkillEffect::NegateNextHit]),
        );
        assert!(matches!(
            catalog.validate(),
            Err(MatchError::InvalidContent(_))
        ));

        catalog.skills.insert(
            "shield".to_string(),
            skill("shield", SkillSlot::Ultimate, vec![SkillEffect::NegateNextHit]),
        );
        assert!(catalog.validate().is_ok());
    }

    #[test]
    fn test_negative_item_magnitude_rejected() {
        let mut catalog = Catalog::default();
        catalog.items.insert(
            "grenade".to_string(),
            ItemData {
                id: "grenade".to_string(),
                name: "Grenade".to_string(),
                kind: ItemKind::AoeDamage { damage: -200.0 },
            },
        );
        assert!(matches!(
            catalog.validate(),
            Err(MatchError::InvalidStat { stat: "damage", .. })
        ));

        catalog.items.insert(
            "grenade".to_string(),
            ItemData {
                id: "grenade".to_string(),
                name: "Grenade".to_string(),
                kind: ItemKind::AoeDamage { damage: 20.0 },
            },
        );
        assert!(catalog.validate().is_ok());
    }

    #[test]
    fn test_negative_restore_effect_rejected() {
        for effect in [
            SkillEffect::HealSelf(-5.0),
            SkillEffect::HealTeam(-5.0),
            SkillEffect::ArmorTeam(-5.0),
        ] {
            let mut catalog = Catalog::default();
            catalog
                .skills
                .insert("drain".to_string(), skill("drain", SkillSlot::Ability, vec![effect]));
            assert!(catalog.validate().is_err(), "{effect:?}");
        }
    }

    #[test]
    fn test_passive_rejects_active_effects() {
        let mut catalog = Catalog::default();
        catalog.skills.insert(
            "medic".to_string(),
            skill("medic", SkillSlot::Passive, vec![SkillEffect::HealTeam(10.0)]),
        );
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn test_non_finite_weapon_rejected() {
        let mut catalog = Catalog::default();
        catalog.weapons.insert(
            "broken".to_string(),
            WeaponData {
                id: "broken".to_string(),
                name: "Broken".to_string(),
                base_damage: f64::NAN,
                tech_requirement: 0.0,
                aim_bonus: 0.0,
            },
        );
        assert!(matches!(
            catalog.validate(),
            Err(MatchError::InvalidStat {
                stat: "base_damage",
                ..
            })
        ));
    }

    #[test]
    fn test_skill_slot_mismatch() {
        let mut catalog = Catalog::default();
        catalog.skills.insert(
            "rally".to_string(),
            skill("rally", SkillSlot::Ability, vec![SkillEffect::AimBuff(5.0)]),
        );
        assert!(catalog.skill("rally", SkillSlot::Ability, "f1").is_ok());
        assert!(catalog.skill("rally", SkillSlot::Ultimate, "f1").is_err());
        assert!(matches!(
            catalog.skill("missing", SkillSlot::Ability, "f1"),
            Err(MatchError::UnknownReference { kind: "skill", .. })
        ));
    }
}
