//! Engagement resolution.
//!
//! Two interchangeable strategies sit behind [`EngagementResolver`]:
//!
//! - [`FighterResolver`] - full turn-based simulation at fighter granularity
//! - [`MacroResolver`] - power-difference coin flip with drawn kill tables
//!
//! Both mutate the participating teams in place and return the same
//! [`EngagementOutcome`]. Neither touches team point tallies; credit flows
//! through the match's kill ledger.

pub mod ai;
mod engagement;
pub mod formulas;
mod macro_resolver;
mod resolver;

pub use engagement::{
    check_participants, sync_death_boxes, CreditEvent, CreditKind, EngagementOutcome,
    EngagementResolver, FighterRef, MAX_ENGAGEMENT_TEAMS,
};
pub use macro_resolver::{
    expected_power, favourite, team_power, win_probability, MacroResolver, LOSER_KILL_TABLE,
    WINNER_BOX_TABLE, WINNER_KILL_TABLE,
};
pub use resolver::{FighterResolver, ASSIST_POINTS, KILL_POINTS, REVIVE_HP_FRACTION};

use crate::data::SkillEffect;
use crate::fighter::CombatBuffs;

/// Fold the stat-buff effects of a skill into a fighter's buffs.
///
/// Non-buff effects (heals, stuns, negation) are ignored here; the turn loop
/// applies them.
pub fn apply_buff_effects(buffs: &mut CombatBuffs, effects: &[SkillEffect]) {
    for effect in effects {
        match *effect {
            SkillEffect::AimBuff(amount) => buffs.aim += amount,
            SkillEffect::AgilityBuff(amount) => buffs.agility += amount,
            SkillEffect::DamageMultiplier(factor) => buffs.damage_mul *= factor,
            SkillEffect::HitRateMultiplier(factor) => buffs.hit_mul *= factor,
            SkillEffect::CritBonus(amount) => buffs.crit_bonus += amount,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{catalog, team_data};
    use crate::team::Team;

    #[test]
    fn test_buff_effects_accumulate() {
        let mut buffs = CombatBuffs::default();
        apply_buff_effects(
            &mut buffs,
            &[
                SkillEffect::AimBuff(10.0),
                SkillEffect::AimBuff(10.0),
                SkillEffect::DamageMultiplier(1.2),
                SkillEffect::HealSelf(30.0),
            ],
        );
        assert_eq!(buffs.aim, 20.0);
        assert_eq!(buffs.aim_buff(), 15.0);
        assert!((buffs.damage_mul - 1.2).abs() < 1e-12);
        assert_eq!(buffs.hit_mul, 1.0);
    }

    #[test]
    fn test_passive_and_weapon_applied_at_engagement_start() {
        let mut data = team_data(1);
        data.members[0].passive = Some("steady".to_string());
        let mut team = Team::from_data(&data, &catalog()).expect("valid team");
        let fighter = &mut team.fighters[0];
        fighter.buffs.aim = 9.0;

        fighter.prepare_for_engagement();
        // rifle aim bonus only; stale buffs cleared
        assert_eq!(fighter.buffs.aim, 2.0);
        assert_eq!(fighter.buffs.crit_bonus, 1.0);
    }
}
