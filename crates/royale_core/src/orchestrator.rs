//! Match orchestration.
//!
//! A [`Match`] owns the field of teams and the [`MatchContext`] and drives
//! rounds 1-6, each as `Respawn -> Events -> Fights -> Move` (no move after
//! the last round). Before round 1 every team lands in a random zone. After
//! round 6 standings are fixed and the match can be scored.
//!
//! # Determinism
//!
//! Every random draw comes from the context's seeded RNG, teams are always
//! visited in field order, and ledgers are append-only, so the same roster,
//! config and seed always produce the same match.
//!
//! # Example
//!
//! ```no_run
//! use royale_core::prelude::*;
//!
//! # fn roster() -> Roster { unimplemented!() }
//! let config = MatchConfig::with_seed(7).with_resolver(ResolverMode::Fighter);
//! let report = Match::new(&roster(), config)?.run()?;
//! println!("champion: {}", report.champion);
//! # Ok::<(), royale_core::error::MatchError>(())
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combat::{
    CreditKind, EngagementOutcome, EngagementResolver, FighterResolver, MacroResolver,
};
use crate::config::{MatchConfig, ResolverMode, ROUND_COUNT};
use crate::context::{KillLedger, MatchContext, MatchLog};
use crate::data::Roster;
use crate::error::{MatchError, Result};
use crate::events::{AppliedEvent, EventSystem};
use crate::respawn::{respawn_phase, RespawnOutcome};
use crate::scheduler::{EngagementScheduler, Pairing};
use crate::scoring::{derive_standings, score_match, MatchResultRow};
use crate::team::{Team, TeamId};

/// What one engagement produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementRecord {
    /// Scheduled pairing.
    pub pairing: Pairing,
    /// Team left standing.
    pub winner: TeamId,
    /// Teams removed from the match.
    pub eliminated: Vec<TeamId>,
    /// The fighter simulation hit its tick cap and macro resolution decided.
    pub abnormal: bool,
    /// Combat ticks simulated.
    pub ticks: u32,
    /// Kill points awarded.
    pub kill_points: u32,
    /// Assist points awarded.
    pub assist_points: u32,
}

/// Everything that happened in one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSummary {
    /// Round index (1-6).
    pub round: u8,
    /// Death box recoveries.
    pub respawns: Vec<RespawnOutcome>,
    /// Events drawn.
    pub events: Vec<AppliedEvent>,
    /// Engagements fought.
    pub engagements: Vec<EngagementRecord>,
    /// Teams still in the match after the fights.
    pub alive_after: u32,
}

/// Final output of a finished match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReport {
    /// Seed the match ran with.
    pub seed: u64,
    /// Result rows, best placement first.
    pub rows: Vec<MatchResultRow>,
    /// Champion team.
    pub champion: TeamId,
    /// Engagements that hit the tick cap.
    pub abnormal_engagements: u32,
    /// Per-round summaries.
    pub rounds: Vec<RoundSummary>,
    /// Human-readable log, in order.
    pub log: Vec<String>,
    /// Hash of the final state.
    pub state_hash: u64,
}

impl MatchReport {
    /// Row for one team.
    #[must_use]
    pub fn row(&self, team: TeamId) -> Option<&MatchResultRow> {
        self.rows.iter().find(|r| r.team_id == team)
    }
}

/// One battle-royale match.
#[derive(Debug, Clone)]
pub struct Match {
    config: MatchConfig,
    teams: Vec<Team>,
    ctx: MatchContext,
    round: u8,
    rounds: Vec<RoundSummary>,
    abnormal_engagements: u32,
    finished: bool,
}

impl Match {
    /// Validate content and config, build the field and land every team.
    ///
    /// # Errors
    ///
    /// Invalid roster content, a round table that cannot run with this many
    /// teams, or a focus team that is not in the roster.
    pub fn new(roster: &Roster, config: MatchConfig) -> Result<Self> {
        roster.validate()?;
        config.validate(roster.teams.len() as u32)?;
        if let Some(focus) = config.focus_team {
            if roster.team(focus).is_none() {
                return Err(MatchError::TeamNotFound(focus));
            }
        }

        let teams = roster
            .teams
            .iter()
            .map(|data| Team::from_data(data, &roster.catalog))
            .collect::<Result<Vec<_>>>()?;

        let mut game = Self {
            ctx: MatchContext::new(config.seed),
            config,
            teams,
            round: 0,
            rounds: Vec::new(),
            abnormal_engagements: 0,
            finished: false,
        };
        game.land();
        Ok(game)
    }

    fn land(&mut self) {
        let pool = self.config.rounds.landing_pool;
        for team in &mut self.teams {
            team.area = self.ctx.rng.gen_range(0..pool);
            self.ctx
                .log
                .push(0, format!("{} lands in zone {}", team.name, team.area));
        }
        tracing::debug!(teams = self.teams.len(), zones = pool, "Teams landed");
    }

    /// The field, in roster order.
    #[must_use]
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// Give the mutated teams to the caller.
    #[must_use]
    pub fn into_teams(self) -> Vec<Team> {
        self.teams
    }

    /// Last completed round (0 before round 1).
    #[must_use]
    pub fn round(&self) -> u8 {
        self.round
    }

    /// Whether round 6 has been played.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Teams still in the match.
    #[must_use]
    pub fn alive_teams(&self) -> u32 {
        self.teams.iter().filter(|t| t.is_active()).count() as u32
    }

    /// Kill/assist ledger.
    #[must_use]
    pub fn ledger(&self) -> &KillLedger {
        &self.ctx.ledger
    }

    /// Match log so far.
    #[must_use]
    pub fn log(&self) -> &MatchLog {
        &self.ctx.log
    }

    /// Completed round summaries.
    #[must_use]
    pub fn summaries(&self) -> &[RoundSummary] {
        &self.rounds
    }

    /// Configuration the match runs with.
    #[must_use]
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Play the next round.
    ///
    /// # Errors
    ///
    /// The match is already finished, or an engagement could not be
    /// resolved.
    pub fn advance_round(&mut self) -> Result<&RoundSummary> {
        if self.finished {
            return Err(MatchError::InvalidState("match already finished".to_string()));
        }
        let round = self.round + 1;
        let spec = *self
            .config
            .rounds
            .round(round)
            .ok_or_else(|| MatchError::InvalidRoundTable(format!("no entry for round {round}")))?;

        // 1. Respawn
        let respawns = respawn_phase(&mut self.teams, round, &mut self.ctx.rng);
        for outcome in &respawns {
            let name = self.team_name(outcome.team);
            self.ctx
                .log
                .push(round, format!("{name} recovers {} fighter(s)", outcome.restored));
        }

        // 2. Events
        let events = EventSystem::new(&self.config.events).run_round(
            &mut self.teams,
            spec.event_count,
            &mut self.ctx.rng,
        );
        for event in &events {
            let name = self.team_name(event.team);
            self.ctx
                .log
                .push(round, format!("{name}: {} event", event.kind.label()));
        }

        // 3. Fights
        let scheduler = EngagementScheduler::new(&self.config.focus_odds, self.config.focus_team);
        let pairings = scheduler.plan(&self.teams, round, spec.fight_slots, &mut self.ctx.rng)?;
        let mut engagements = Vec::with_capacity(pairings.len());
        for pairing in pairings {
            engagements.push(self.fight(pairing, round)?);
        }

        let alive_after = self.alive_teams();
        if alive_after != spec.target_alive {
            return Err(MatchError::InvalidState(format!(
                "round {round} left {alive_after} teams, expected {}",
                spec.target_alive
            )));
        }

        // 4. Move
        if round < ROUND_COUNT && spec.move_pool > 0 {
            for team in self.teams.iter_mut().filter(|t| t.is_active()) {
                team.area = self.ctx.rng.gen_range(0..spec.move_pool);
            }
        }

        #[cfg(feature = "debug-validation")]
        self.validate_state()?;

        tracing::debug!(round, alive = alive_after, "Round complete");
        self.round = round;
        self.rounds.push(RoundSummary {
            round,
            respawns,
            events,
            engagements,
            alive_after,
        });

        if round == ROUND_COUNT {
            self.finish();
        }

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(round, state_hash = hash, "Match state hash");
        }

        self.rounds
            .last()
            .ok_or_else(|| MatchError::InvalidState("round summary missing".to_string()))
    }

    /// Resolve one scheduled engagement and settle its consequences.
    fn fight(&mut self, pairing: Pairing, round: u8) -> Result<EngagementRecord> {
        let primary = {
            let mut participants = participants_mut(&mut self.teams, &pairing.teams)?;
            match self.config.resolver {
                ResolverMode::Macro => {
                    MacroResolver.resolve(&mut participants, round, &mut self.ctx.rng)?
                }
                ResolverMode::Fighter => FighterResolver::new(self.config.max_combat_ticks)
                    .resolve(&mut participants, round, &mut self.ctx.rng)?,
            }
        };

        let abnormal = primary.abnormal;
        let ticks = primary.ticks;
        let mut outcomes = vec![primary];
        if abnormal {
            self.abnormal_engagements += 1;
            tracing::warn!(
                round,
                teams = ?pairing.teams,
                ticks,
                "Engagement hit the tick cap, falling back to macro resolution"
            );
            let survivors: Vec<TeamId> = pairing
                .teams
                .iter()
                .copied()
                .filter(|&id| self.teams.iter().any(|t| t.id == id && t.alive_count() > 0))
                .collect();
            if survivors.len() >= 2 {
                let mut participants = participants_mut(&mut self.teams, &survivors)?;
                outcomes.push(MacroResolver.resolve(&mut participants, round, &mut self.ctx.rng)?);
            }
        }

        let mut winner = None;
        let mut eliminated = Vec::new();
        let (mut kill_points, mut assist_points) = (0, 0);
        for outcome in outcomes {
            self.settle(&outcome, round)?;
            kill_points += outcome.total(CreditKind::Kill);
            assist_points += outcome.total(CreditKind::Assist);
            eliminated.extend(&outcome.eliminated);
            winner = outcome.winner.or(winner);
        }

        let winner = winner.ok_or_else(|| {
            MatchError::InvalidState(format!(
                "engagement {:?} produced no winner",
                pairing.teams
            ))
        })?;
        Ok(EngagementRecord {
            pairing,
            winner,
            eliminated,
            abnormal,
            ticks,
            kill_points,
            assist_points,
        })
    }

    fn settle(&mut self, outcome: &EngagementOutcome, round: u8) -> Result<()> {
        self.ctx
            .ledger
            .apply(&mut self.teams, round, &outcome.credits)?;
        self.ctx.log.extend(round, outcome.log.iter().cloned());
        for &id in &outcome.eliminated {
            let team = self
                .teams
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or(MatchError::TeamNotFound(id))?;
            team.eliminate(round);
            self.ctx
                .log
                .push(round, format!("{} is eliminated", team.name));
        }
        Ok(())
    }

    fn finish(&mut self) {
        let order = derive_standings(&mut self.teams, &mut self.ctx.rng);
        self.finished = true;
        if let Some(&champion) = order.first() {
            let name = self.team_name(champion);
            self.ctx.log.push(ROUND_COUNT, format!("{name} wins the match"));
            tracing::info!(
                champion,
                seed = self.config.seed,
                abnormal = self.abnormal_engagements,
                "Match finished"
            );
        }
    }

    fn team_name(&self, id: TeamId) -> String {
        self.teams
            .iter()
            .find(|t| t.id == id)
            .map_or_else(|| format!("team {id}"), |t| t.name.clone())
    }

    /// Play every remaining round and build the report.
    pub fn run(mut self) -> Result<MatchReport> {
        while !self.finished {
            self.advance_round()?;
        }
        self.report()
    }

    /// Score a finished match.
    ///
    /// # Errors
    ///
    /// The match has not finished yet.
    pub fn report(&self) -> Result<MatchReport> {
        if !self.finished {
            return Err(MatchError::InvalidState(format!(
                "match is only at round {}",
                self.round
            )));
        }
        let rows = score_match(&self.teams, &self.config.scoring)?;
        let champion = rows
            .first()
            .map(|r| r.team_id)
            .ok_or_else(|| MatchError::InvalidState("no teams scored".to_string()))?;

        Ok(MatchReport {
            seed: self.config.seed,
            rows,
            champion,
            abnormal_engagements: self.abnormal_engagements,
            rounds: self.rounds.clone(),
            log: self.ctx.log.to_strings(),
            state_hash: self.state_hash(),
        })
    }

    /// Check the invariants every round must leave intact.
    ///
    /// # Errors
    ///
    /// The first violated invariant.
    pub fn validate_state(&self) -> Result<()> {
        for team in &self.teams {
            let accounted = usize::from(team.death_boxes) + usize::from(team.alive_count());
            if team.is_active() && accounted != team.fighters.len() {
                return Err(MatchError::InvalidState(format!(
                    "team {} has {} boxes with {} standing",
                    team.id,
                    team.death_boxes,
                    team.alive_count()
                )));
            }
            for fighter in &team.fighters {
                let hp_ok = (0.0..=fighter.max_hp()).contains(&fighter.hp);
                let armor_ok = (0.0..=crate::data::MAX_ARMOR).contains(&fighter.armor);
                if !hp_ok || !armor_ok {
                    return Err(MatchError::InvalidStat {
                        fighter: fighter.name.clone(),
                        stat: if hp_ok { "armor" } else { "hp" },
                        value: if hp_ok { fighter.armor } else { fighter.hp },
                    });
                }
            }
        }
        self.ctx.ledger.audit(&self.teams)
    }

    /// Hash of the current match state, for determinism checks.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.round.hash(&mut hasher);
        self.teams.len().hash(&mut hasher);

        for team in &self.teams {
            team.id.hash(&mut hasher);
            team.eliminated.hash(&mut hasher);
            team.eliminated_round.hash(&mut hasher);
            team.area.hash(&mut hasher);
            team.death_boxes.hash(&mut hasher);
            team.points.hash(&mut hasher);
            team.placement.hash(&mut hasher);
            team.negations_used.hash(&mut hasher);
            team.event_buffs.aim.to_bits().hash(&mut hasher);
            team.event_buffs.mental.to_bits().hash(&mut hasher);
            team.event_buffs.agility.to_bits().hash(&mut hasher);

            for fighter in &team.fighters {
                fighter.id.hash(&mut hasher);
                fighter.hp.to_bits().hash(&mut hasher);
                fighter.armor.to_bits().hash(&mut hasher);
                fighter.kill_points.hash(&mut hasher);
                fighter.assist_points.hash(&mut hasher);
                fighter.usage.hash(&mut hasher);
                fighter.inventory.total().hash(&mut hasher);
            }
        }

        self.ctx.ledger.entries().len().hash(&mut hasher);
        hasher.finish()
    }
}

/// Mutable handles to the given teams, in field order.
fn participants_mut<'a>(teams: &'a mut [Team], ids: &[TeamId]) -> Result<Vec<&'a mut Team>> {
    if let Some(&missing) = ids.iter().find(|&&id| !teams.iter().any(|t| t.id == id)) {
        return Err(MatchError::TeamNotFound(missing));
    }
    Ok(teams.iter_mut().filter(|t| ids.contains(&t.id)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::roster;

    #[test]
    fn test_alive_targets_per_round() {
        for mode in [ResolverMode::Macro, ResolverMode::Fighter] {
            let config = MatchConfig::with_seed(11).with_focus(1).with_resolver(mode);
            let mut game = Match::new(&roster(20), config).expect("valid match");
            let targets = [16, 12, 8, 4, 2, 1];
            for target in targets {
                let summary = game.advance_round().expect("round plays");
                assert_eq!(summary.alive_after, target);
            }
            assert!(game.is_finished());
            assert!(game.advance_round().is_err());
        }
    }

    #[test]
    fn test_field_size_must_match_table() {
        let result = Match::new(&roster(18), MatchConfig::with_seed(1));
        assert!(matches!(result, Err(MatchError::InvalidRoundTable(_))));
    }

    #[test]
    fn test_unknown_focus_rejected() {
        let config = MatchConfig::with_seed(1).with_focus(99);
        assert!(matches!(
            Match::new(&roster(20), config),
            Err(MatchError::TeamNotFound(99))
        ));
    }

    #[test]
    fn test_landing_uses_pool() {
        let game = Match::new(&roster(20), MatchConfig::with_seed(3)).expect("valid match");
        assert!(game.teams().iter().all(|t| t.area < 16));
        assert_eq!(game.log().len(), 20);
    }

    #[test]
    fn test_report_requires_finish() {
        let mut game = Match::new(&roster(20), MatchConfig::with_seed(3)).expect("valid match");
        game.advance_round().expect("round plays");
        assert!(game.report().is_err());
    }

    #[test]
    fn test_credit_sums_hold() {
        for mode in [ResolverMode::Macro, ResolverMode::Fighter] {
            let config = MatchConfig::with_seed(21).with_resolver(mode);
            let mut game = Match::new(&roster(20), config).expect("valid match");
            while !game.is_finished() {
                game.advance_round().expect("round plays");
                game.validate_state().expect("invariants hold");
            }
            for team in game.teams() {
                assert_eq!(team.member_kill_points(), team.points.kp);
                assert_eq!(team.member_assist_points(), team.points.ap);
            }
        }
    }

    #[test]
    fn test_same_seed_same_hash() {
        let run = |seed| {
            Match::new(&roster(20), MatchConfig::with_seed(seed).with_resolver(ResolverMode::Fighter))
                .and_then(Match::run)
                .expect("match runs")
        };
        let a = run(5);
        let b = run(5);
        assert_eq!(a.state_hash, b.state_hash);
        assert_eq!(a.rows, b.rows);
        assert_eq!(a.log, b.log);
    }

    #[test]
    fn test_report_shape() {
        let report = Match::new(&roster(20), MatchConfig::with_seed(8))
            .and_then(Match::run)
            .expect("match runs");
        assert_eq!(report.rows.len(), 20);
        assert_eq!(report.rows[0].placement, 1);
        assert_eq!(report.rows[0].team_id, report.champion);
        assert_eq!(report.rounds.len(), 6);
        let placements: Vec<u32> = report.rows.iter().map(|r| r.placement).collect();
        assert_eq!(placements, (1..=20).collect::<Vec<_>>());
    }

    #[test]
    fn test_abnormal_fight_falls_back_to_macro() {
        let mut config = MatchConfig::with_seed(2).with_resolver(ResolverMode::Fighter);
        config.max_combat_ticks = 1;
        let report = Match::new(&roster(20), config)
            .and_then(Match::run)
            .expect("match still completes");
        assert!(report.abnormal_engagements > 0);
        let summary = &report.rounds[0];
        assert!(summary.engagements.iter().all(|e| e.abnormal));
        assert_eq!(summary.alive_after, 16);
    }
}
