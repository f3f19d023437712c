//! Per-fighter turn-based engagement resolution.
//!
//! Each combat tick every standing fighter acts once, fastest first. An
//! action is: optionally one item, then any ability/ultimate the AI
//! triggers, then one attack. The fight ends when a single team has
//! standing fighters, or abnormally at the tick cap.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::Rng;

use super::ai::{
    choose_item, should_use_ability, should_use_ultimate, BattlefieldSnapshot, TeamView,
};
use super::engagement::{
    check_participants, sync_death_boxes, CreditEvent, EngagementOutcome, EngagementResolver,
    FighterRef,
};
use super::formulas::{
    crit_chance, hit_chance, hit_damage, split_damage, turn_speed, weak_target_bias,
    DAMAGE_VARIANCE, MAX_HIT_DAMAGE, SPEED_JITTER,
};
use super::apply_buff_effects;
use crate::config::DEFAULT_MAX_COMBAT_TICKS;
use crate::data::{ItemKind, SkillEffect};
use crate::error::{MatchError, Result};
use crate::fighter::{Fighter, StatusCharges};
use crate::team::Team;

/// Kill points for the finishing blow.
pub const KILL_POINTS: u32 = 2;

/// Assist points for every other damager that tick.
pub const ASSIST_POINTS: u32 = 1;

/// HP fraction a revived fighter comes back with.
pub const REVIVE_HP_FRACTION: f64 = 0.30;

/// Full fighter-level resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FighterResolver {
    /// Ticks before the fight is declared abnormal.
    pub max_ticks: u32,
}

impl Default for FighterResolver {
    fn default() -> Self {
        Self {
            max_ticks: DEFAULT_MAX_COMBAT_TICKS,
        }
    }
}

impl FighterResolver {
    /// Resolver with a custom tick cap.
    #[must_use]
    pub const fn new(max_ticks: u32) -> Self {
        Self { max_ticks }
    }
}

impl EngagementResolver for FighterResolver {
    fn resolve<R: Rng + ?Sized>(
        &self,
        teams: &mut [&mut Team],
        round: u8,
        rng: &mut R,
    ) -> Result<EngagementOutcome> {
        check_participants(teams)?;

        for team in teams.iter_mut() {
            for fighter in team.fighters.iter_mut().filter(|f| f.is_alive()) {
                fighter.prepare_for_engagement();
            }
        }

        let mut battle = Battle::new(teams, round);
        let names: Vec<&str> = battle.teams.iter().map(|t| t.name.as_str()).collect();
        let opening = format!("[R{round}] {}", names.join(" vs "));
        battle.log.push(opening);

        let mut abnormal = false;
        while battle.living_teams() > 1 {
            if battle.tick >= self.max_ticks {
                abnormal = true;
                break;
            }
            battle.tick += 1;
            battle.hits_this_tick.clear();

            for actor in battle.turn_order(rng) {
                if battle.living_teams() <= 1 {
                    break;
                }
                if battle.fighter(actor).is_alive() {
                    battle.act(actor, rng);
                }
            }
        }

        battle.finish(abnormal)
    }
}

/// Roster position: (team index, fighter index).
type Slot = (usize, usize);

/// Mutable state of one fighter-level engagement.
struct Battle<'t, 'a> {
    teams: &'t mut [&'a mut Team],
    round: u8,
    tick: u32,
    downed_here: Vec<Vec<bool>>,
    hits_this_tick: BTreeMap<Slot, Vec<Slot>>,
    credits: Vec<CreditEvent>,
    log: Vec<String>,
}

impl<'t, 'a> Battle<'t, 'a> {
    fn new(teams: &'t mut [&'a mut Team], round: u8) -> Self {
        let downed_here = teams
            .iter()
            .map(|t| vec![false; t.fighters.len()])
            .collect();
        Self {
            teams,
            round,
            tick: 0,
            downed_here,
            hits_this_tick: BTreeMap::new(),
            credits: Vec::new(),
            log: Vec::new(),
        }
    }

    fn fighter(&self, slot: Slot) -> &Fighter {
        &self.teams[slot.0].fighters[slot.1]
    }

    fn fighter_mut(&mut self, slot: Slot) -> &mut Fighter {
        &mut self.teams[slot.0].fighters[slot.1]
    }

    fn fighter_ref(&self, slot: Slot) -> FighterRef {
        FighterRef {
            team: self.teams[slot.0].id,
            fighter: self.fighter(slot).id,
        }
    }

    fn living_teams(&self) -> usize {
        self.teams.iter().filter(|t| t.alive_count() > 0).count()
    }

    fn living_enemies(&self, team: usize) -> Vec<Slot> {
        self.teams
            .iter()
            .enumerate()
            .filter(|&(ti, _)| ti != team)
            .flat_map(|(ti, t)| {
                t.fighters
                    .iter()
                    .enumerate()
                    .filter(|(_, f)| f.is_alive())
                    .map(move |(fi, _)| (ti, fi))
            })
            .collect()
    }

    fn team_view(&self, team: usize) -> TeamView {
        let t = &self.teams[team];
        TeamView {
            alive: t.alive_count(),
            armor: t.total_armor(),
            revivable: self.revive_target(team).is_some(),
        }
    }

    fn revive_target(&self, team: usize) -> Option<usize> {
        self.teams[team]
            .fighters
            .iter()
            .enumerate()
            .find(|&(fi, f)| self.downed_here[team][fi] && !f.is_alive())
            .map(|(fi, _)| fi)
    }

    fn snapshot(&self, actor: Slot) -> BattlefieldSnapshot {
        let own = self.team_view(actor.0);
        let enemies: Vec<TeamView> = (0..self.teams.len())
            .filter(|&ti| ti != actor.0 && self.teams[ti].alive_count() > 0)
            .map(|ti| self.team_view(ti))
            .collect();
        BattlefieldSnapshot::capture(self.fighter(actor), &own, &enemies)
    }

    /// Speed-sorted standing fighters; ties go to the lower fighter id.
    fn turn_order<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<Slot> {
        let mut order = Vec::new();
        for (ti, team) in self.teams.iter_mut().enumerate() {
            let agility_mul = team.event_buffs.agility;
            for (fi, fighter) in team.fighters.iter_mut().enumerate() {
                if !fighter.is_alive() {
                    continue;
                }
                let agility = fighter.base.agility * agility_mul + fighter.buffs.agility_buff();
                let jitter = rng.gen_range(SPEED_JITTER.0..SPEED_JITTER.1);
                let speed = turn_speed(
                    agility,
                    fighter.base.movement,
                    jitter,
                    fighter.status.speed_penalty.take(),
                );
                order.push((speed, fighter.id, (ti, fi)));
            }
        }
        order.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        order.into_iter().map(|(_, _, slot)| slot).collect()
    }

    fn act<R: Rng + ?Sized>(&mut self, actor: Slot, rng: &mut R) {
        if self.fighter_mut(actor).status.skip_next_action.consume() {
            let line = format!("[T{}] {} is stunned", self.tick, self.fighter(actor).name);
            self.log.push(line);
            return;
        }

        let snapshot = self.snapshot(actor);
        self.use_item(actor, &snapshot, rng);
        if self.living_teams() <= 1 {
            return;
        }
        self.use_skills(actor, &snapshot, rng);
        if self.living_teams() <= 1 {
            return;
        }
        self.attack(actor, rng);
    }

    fn use_item<R: Rng + ?Sized>(
        &mut self,
        actor: Slot,
        snapshot: &BattlefieldSnapshot,
        rng: &mut R,
    ) {
        let Some((id, kind)) = choose_item(snapshot, &self.fighter(actor).inventory)
            .map(|choice| (choice.id.to_string(), choice.kind))
        else {
            return;
        };
        self.fighter_mut(actor).inventory.consume(&id);
        let user = self.fighter(actor).name.clone();
        self.log
            .push(format!("[T{}] {user} uses {id}", self.tick));

        match kind {
            ItemKind::Revive => {
                if let Some(fi) = self.revive_target(actor.0) {
                    let ally = self.fighter_mut((actor.0, fi));
                    ally.hp = ally.max_hp() * REVIVE_HP_FRACTION;
                    ally.armor = 0.0;
                    self.downed_here[actor.0][fi] = false;
                }
            }
            ItemKind::Heal { amount } => self.fighter_mut(actor).heal(amount),
            ItemKind::ArmorRepair { amount } => self.fighter_mut(actor).repair(amount),
            ItemKind::AoeDebuff { aim_penalty } => {
                for enemy in self.living_enemies(actor.0) {
                    self.fighter_mut(enemy).status.aim_penalty.apply(aim_penalty);
                }
            }
            ItemKind::AoeDamage { damage } => {
                for enemy in self.living_enemies(actor.0) {
                    self.deliver(actor, enemy, damage.min(MAX_HIT_DAMAGE), false);
                }
            }
            ItemKind::Slow { speed_penalty } => {
                if let Some(&enemy) = self.living_enemies(actor.0).choose(rng) {
                    self.fighter_mut(enemy)
                        .status
                        .speed_penalty
                        .apply(speed_penalty);
                }
            }
        }
    }

    fn use_skills<R: Rng + ?Sized>(
        &mut self,
        actor: Slot,
        snapshot: &BattlefieldSnapshot,
        rng: &mut R,
    ) {
        let bonus = self.teams[actor.0].ability_bonus_uses;
        let fighter = self.fighter(actor);

        let ability = fighter
            .ability
            .as_ref()
            .filter(|_| should_use_ability(snapshot, fighter.abilities_remaining(bonus)))
            .map(|skill| (skill.name.clone(), skill.effects.clone()));
        if let Some((name, effects)) = ability {
            self.fighter_mut(actor).usage.abilities_used += 1;
            self.cast(actor, &name, &effects, rng);
        }

        let fighter = self.fighter(actor);
        let ultimate = fighter
            .ultimate
            .as_ref()
            .filter(|_| should_use_ultimate(snapshot, fighter.usage.ultimate_used))
            .map(|skill| (skill.name.clone(), skill.effects.clone()));
        if let Some((name, effects)) = ultimate {
            self.fighter_mut(actor).usage.ultimate_used = true;
            self.cast(actor, &name, &effects, rng);
        }
    }

    fn cast<R: Rng + ?Sized>(
        &mut self,
        actor: Slot,
        skill: &str,
        effects: &[SkillEffect],
        rng: &mut R,
    ) {
        let line = format!(
            "[T{}] {} activates {skill}",
            self.tick,
            self.fighter(actor).name
        );
        self.log.push(line);
        apply_buff_effects(&mut self.fighter_mut(actor).buffs, effects);

        for effect in effects {
            match *effect {
                SkillEffect::HealSelf(amount) => self.fighter_mut(actor).heal(amount),
                SkillEffect::HealTeam(amount) => {
                    for ally in &mut self.teams[actor.0].fighters {
                        ally.heal(amount);
                    }
                }
                SkillEffect::ArmorTeam(amount) => {
                    for ally in &mut self.teams[actor.0].fighters {
                        ally.repair(amount);
                    }
                }
                SkillEffect::StunEnemy => {
                    if let Some(&enemy) = self.living_enemies(actor.0).choose(rng) {
                        self.fighter_mut(enemy).status.skip_next_action.arm();
                    }
                }
                SkillEffect::NegateNextHit => self.fighter_mut(actor).status.negate_next_hit.arm(),
                SkillEffect::AimBuff(_)
                | SkillEffect::AgilityBuff(_)
                | SkillEffect::DamageMultiplier(_)
                | SkillEffect::HitRateMultiplier(_)
                | SkillEffect::CritBonus(_) => {}
            }
        }
    }

    fn attack<R: Rng + ?Sized>(&mut self, actor: Slot, rng: &mut R) {
        let enemies = self.living_enemies(actor.0);
        let bias = weak_target_bias(self.fighter(actor).base.technique);
        let weak: Vec<Slot> = enemies
            .iter()
            .copied()
            .filter(|&slot| self.fighter(slot).is_weak())
            .collect();
        let pool = if !weak.is_empty() && rng.gen_bool(bias / 100.0) {
            &weak
        } else {
            &enemies
        };
        let Some(&target) = pool.choose(rng) else {
            return;
        };

        let aim_mul = self.teams[actor.0].event_buffs.aim;
        let attacker = self.fighter_mut(actor);
        let aim = (attacker.base.aim * aim_mul + attacker.buffs.aim_buff()
            - attacker.status.aim_penalty.take())
        .max(0.0);
        let technique = attacker.base.technique;
        let buffs = attacker.buffs;
        let (base_damage, requirement) =
            (attacker.weapon.base_damage, attacker.weapon.tech_requirement);

        let defender_agility = {
            let team = &self.teams[target.0];
            let defender = &team.fighters[target.1];
            defender.base.agility * team.event_buffs.agility + defender.buffs.agility_buff()
        };

        let chance = hit_chance(aim, defender_agility, technique, requirement, buffs.hit_mul);
        if rng.gen_range(0.0..100.0) >= chance {
            tracing::trace!(tick = self.tick, chance, "Attack missed");
            let line = format!(
                "[T{}] {} misses {}",
                self.tick,
                self.fighter(actor).name,
                self.fighter(target).name
            );
            self.log.push(line);
            return;
        }

        let crit = rng.gen_range(0.0..100.0) < crit_chance(technique, buffs.crit_bonus);
        let variance = rng.gen_range(DAMAGE_VARIANCE.0..=DAMAGE_VARIANCE.1);
        let damage = hit_damage(base_damage, aim, technique, variance, buffs.damage_mul, crit);
        self.deliver(actor, target, damage, crit);
    }

    /// Apply one hit, honouring negation and recording credit.
    fn deliver(&mut self, attacker: Slot, victim: Slot, damage: f64, crit: bool) {
        let tick = self.tick;
        let team = &mut *self.teams[victim.0];
        let budget = team.has_negation_budget();
        let target = &mut team.fighters[victim.1];
        if !target.is_alive() {
            return;
        }

        if target.status.negate_next_hit.consume() && budget && !target.usage.negated_once {
            target.usage.negated_once = true;
            team.negations_used += 1;
            let line = format!("[T{tick}] {} negates the hit", target.name);
            self.log.push(line);
            return;
        }

        let split = split_damage(damage, target.armor, target.hp);
        target.armor -= split.armor;
        target.hp -= split.hp;
        if split.hp > 0.0 {
            target.took_damage = true;
        }
        let killed = !target.is_alive();
        if killed {
            target.hp = 0.0;
            target.status = StatusCharges::default();
        }

        let dealt = split.armor + split.hp;
        if dealt > 0.0 {
            self.hits_this_tick.entry(victim).or_default().push(attacker);
        }
        tracing::trace!(tick, dealt, crit, killed, "Hit applied");
        let line = format!(
            "[T{tick}] {} hits {} for {dealt:.1}{}",
            self.fighter(attacker).name,
            self.fighter(victim).name,
            if crit { " (crit)" } else { "" }
        );
        self.log.push(line);

        if killed {
            self.downed_here[victim.0][victim.1] = true;
            self.credit_kill(attacker, victim);
        }
    }

    fn credit_kill(&mut self, killer: Slot, victim: Slot) {
        self.credits
            .push(CreditEvent::kill(self.fighter_ref(killer), KILL_POINTS));

        let damagers = self.hits_this_tick.get(&victim).cloned().unwrap_or_default();
        let mut assisted: Vec<Slot> = Vec::new();
        for slot in damagers {
            if slot != killer && !assisted.contains(&slot) {
                assisted.push(slot);
                self.credits
                    .push(CreditEvent::assist(self.fighter_ref(slot), ASSIST_POINTS));
            }
        }

        let line = format!(
            "[T{}] {} knocks out {}",
            self.tick,
            self.fighter(killer).name,
            self.fighter(victim).name
        );
        self.log.push(line);
    }

    fn finish(self, abnormal: bool) -> Result<EngagementOutcome> {
        let mut eliminated = Vec::new();
        let mut survivors = Vec::new();
        for team in self.teams.iter_mut() {
            if team.alive_count() == 0 {
                eliminated.push(team.id);
            } else {
                sync_death_boxes(team);
                survivors.push(team.id);
            }
        }

        let winner = match (abnormal, survivors.as_slice()) {
            (true, _) => None,
            (false, [single]) => Some(*single),
            (false, _) => {
                return Err(MatchError::InvalidState(format!(
                    "engagement ended with {} surviving teams",
                    survivors.len()
                )))
            }
        };

        tracing::debug!(
            round = self.round,
            ticks = self.tick,
            winner = ?winner,
            abnormal,
            "Fighter engagement resolved"
        );

        Ok(EngagementOutcome {
            participants: self.teams.iter().map(|t| t.id).collect(),
            winner,
            eliminated,
            credits: self.credits,
            abnormal,
            ticks: self.tick,
            log: self.log,
        })
    }
}
