//! Hit, crit, damage and turn-order formulas.
//!
//! Every function here is pure: random rolls are taken as arguments so the
//! clamps can be tested exhaustively without an RNG.

/// Base hit chance before aim/agility difference.
pub const BASE_HIT_CHANCE: f64 = 50.0;

/// Hit chance change per point of aim over agility.
pub const HIT_SLOPE: f64 = 0.7;

/// Pre-multiplier hit chance range.
pub const HIT_RANGE: (f64, f64) = (15.0, 85.0);

/// Final hit chance range after multipliers.
pub const HIT_FINAL_RANGE: (f64, f64) = (10.0, 90.0);

/// Hit chance lost when technique is below the weapon requirement.
pub const TECH_SHORTFALL_PENALTY: f64 = 8.0;

/// Nominal crit chance range from technique.
pub const CRIT_NOMINAL_RANGE: (f64, f64) = (2.0, 8.0);

/// Final crit chance range after bonuses.
pub const CRIT_FINAL_RANGE: (f64, f64) = (0.0, 25.0);

/// Damage multiplier on a crit.
pub const CRIT_MULTIPLIER: f64 = 1.4;

/// No single hit deals more than this.
pub const MAX_HIT_DAMAGE: f64 = 45.0;

/// Damage variance roll range.
pub const DAMAGE_VARIANCE: (f64, f64) = (0.9, 1.1);

/// Speed jitter roll range.
pub const SPEED_JITTER: (f64, f64) = (0.0, 10.0);

/// Cap on the weak-target bias.
pub const MAX_WEAK_BIAS: f64 = 80.0;

/// Hit chance in percent.
///
/// ```text
/// clamp(50 + (aim - agility) * 0.7, 15, 85)
///   - 8 if technique < weapon requirement
///   * hit multiplier
/// clamp to [10, 90]
/// ```
#[must_use]
pub fn hit_chance(
    attacker_aim: f64,
    defender_agility: f64,
    technique: f64,
    tech_requirement: f64,
    hit_multiplier: f64,
) -> f64 {
    let mut chance = (BASE_HIT_CHANCE + (attacker_aim - defender_agility) * HIT_SLOPE)
        .clamp(HIT_RANGE.0, HIT_RANGE.1);
    if technique < tech_requirement {
        chance -= TECH_SHORTFALL_PENALTY;
    }
    (chance * hit_multiplier).clamp(HIT_FINAL_RANGE.0, HIT_FINAL_RANGE.1)
}

/// Crit chance in percent: `clamp(2 + technique * 0.6, 2, 8) + bonus`,
/// clamped to [0, 25].
#[must_use]
pub fn crit_chance(technique: f64, crit_bonus: f64) -> f64 {
    let nominal = (2.0 + technique * 0.6).clamp(CRIT_NOMINAL_RANGE.0, CRIT_NOMINAL_RANGE.1);
    (nominal + crit_bonus).clamp(CRIT_FINAL_RANGE.0, CRIT_FINAL_RANGE.1)
}

/// Damage for one landed hit, capped at [`MAX_HIT_DAMAGE`].
///
/// `variance` is the uniform(0.9, 1.1) roll.
#[must_use]
pub fn hit_damage(
    base_damage: f64,
    aim: f64,
    technique: f64,
    variance: f64,
    damage_multiplier: f64,
    crit: bool,
) -> f64 {
    let scale = 0.85 + aim / 200.0 + technique / 250.0;
    let mut damage = base_damage * scale * variance * damage_multiplier;
    if crit {
        damage *= CRIT_MULTIPLIER;
    }
    damage.clamp(0.0, MAX_HIT_DAMAGE)
}

/// Turn-order speed: `agility + movement * 2 + jitter - penalty`.
#[must_use]
pub fn turn_speed(effective_agility: f64, movement: f64, jitter: f64, penalty: f64) -> f64 {
    effective_agility + movement * 2.0 + jitter - penalty
}

/// Percent chance an attacker picks from weak targets when any exist.
#[must_use]
pub fn weak_target_bias(technique: f64) -> f64 {
    (25.0 + technique * 4.0).clamp(0.0, MAX_WEAK_BIAS)
}

/// How a hit splits between Armor and HP.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageSplit {
    /// Armor removed.
    pub armor: f64,
    /// HP removed.
    pub hp: f64,
}

/// Split damage: Armor absorbs first, overflow goes to HP.
#[must_use]
pub fn split_damage(damage: f64, armor: f64, hp: f64) -> DamageSplit {
    let damage = damage.max(0.0);
    let to_armor = damage.min(armor.max(0.0));
    let to_hp = (damage - to_armor).min(hp.max(0.0));
    DamageSplit {
        armor: to_armor,
        hp: to_hp,
    }
}
