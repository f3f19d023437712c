//! Power-difference engagement resolution.
//!
//! Each team rolls a power figure from its standing members; the favourite
//! wins with `clamp(50 + 1.8 * delta, 22, 78)` percent. The loser is wiped,
//! the winner may leave death boxes behind, and kill/assist counts are drawn
//! from fixed tables and handed to roster members by role lottery.

use rand::Rng;

use super::engagement::{
    check_participants, CreditEvent, CreditKind, EngagementOutcome, EngagementResolver,
    FighterRef,
};
use crate::error::{MatchError, Result};
use crate::lottery::{credit_recipient, draw_table};
use crate::team::{Team, TeamId};

/// Win chance gained per point of power lead, in percent.
pub const POWER_SLOPE: f64 = 1.8;

/// Win chance range in percent.
pub const WIN_RANGE: (f64, f64) = (22.0, 78.0);

/// Power multiplier for a team down to exactly two standing fighters.
pub const TWO_ALIVE_MULTIPLIER: f64 = 1.40;

/// New death boxes for the winner.
pub const WINNER_BOX_TABLE: [(u8, u32); 3] = [(0, 55), (1, 35), (2, 10)];

/// Kills credited to the winner.
pub const WINNER_KILL_TABLE: [(u32, u32); 4] = [(0, 10), (1, 25), (2, 35), (3, 30)];

/// Kills credited to the loser.
pub const LOSER_KILL_TABLE: [(u32, u32); 3] = [(0, 55), (1, 35), (2, 10)];

/// Win probability in percent for a team leading by `delta` power.
#[must_use]
pub fn win_probability(delta: f64) -> f64 {
    (50.0 + POWER_SLOPE * delta).clamp(WIN_RANGE.0, WIN_RANGE.1)
}

/// Roll a team's engagement power.
///
/// Each standing member rolls inside its power range (or uses its flat base
/// power); the rolls are averaged, boosted when exactly two stand, and
/// scaled by the team's accumulated event multipliers.
pub fn team_power<R: Rng + ?Sized>(team: &Team, rng: &mut R) -> f64 {
    let rolls: Vec<f64> = team
        .fighters
        .iter()
        .filter(|f| f.is_alive())
        .map(|f| match f.power {
            Some(range) if range.max > range.min => rng.gen_range(range.min..=range.max),
            Some(range) => range.min,
            None => f.base_power,
        })
        .collect();
    if rolls.is_empty() {
        return 0.0;
    }

    let mut power = rolls.iter().sum::<f64>() / rolls.len() as f64;
    if team.alive_count() == 2 {
        power *= TWO_ALIVE_MULTIPLIER;
    }
    power * team.event_buffs.product()
}

/// Macro-level resolver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MacroResolver;

impl MacroResolver {
    /// Decide a duel between two teams with known power.
    ///
    /// Returns `true` when the first team wins.
    pub fn first_wins<R: Rng + ?Sized>(power_a: f64, power_b: f64, rng: &mut R) -> bool {
        rng.gen_range(0.0..100.0) < win_probability(power_a - power_b)
    }

    fn duel<R: Rng + ?Sized>(
        winner_loser: (&mut Team, &mut Team),
        credits: &mut Vec<CreditEvent>,
        rng: &mut R,
    ) -> Result<u8> {
        let (winner, loser) = winner_loser;

        let boxes = draw_table(&WINNER_BOX_TABLE, rng).unwrap_or(0);
        let mut added = 0;
        for _ in 0..boxes {
            let alive = usize::from(winner.alive_count());
            if alive <= 1 {
                break;
            }
            if winner.add_death_box(rng.gen_range(0..alive)) {
                added += 1;
            }
        }

        for fighter in &mut loser.fighters {
            fighter.knock();
        }
        loser.death_boxes = 0;

        let winner_kills = draw_table(&WINNER_KILL_TABLE, rng).unwrap_or(0);
        let loser_kills = draw_table(&LOSER_KILL_TABLE, rng).unwrap_or(0);
        distribute(winner, CreditKind::Kill, winner_kills, credits, rng)?;
        distribute(loser, CreditKind::Kill, loser_kills, credits, rng)?;
        let winner_assists = rng.gen_range(0..=winner_kills);
        let loser_assists = rng.gen_range(0..=loser_kills);
        distribute(winner, CreditKind::Assist, winner_assists, credits, rng)?;
        distribute(loser, CreditKind::Assist, loser_assists, credits, rng)?;

        Ok(added)
    }
}

/// Hand `points` single points of one kind to roster members by role.
fn distribute<R: Rng + ?Sized>(
    team: &Team,
    kind: CreditKind,
    points: u32,
    credits: &mut Vec<CreditEvent>,
    rng: &mut R,
) -> Result<()> {
    for _ in 0..points {
        let index = credit_recipient(team, rng).ok_or_else(|| {
            MatchError::InvalidState(format!("team {} has no creditable members", team.id))
        })?;
        let by = FighterRef {
            team: team.id,
            fighter: team.fighters[index].id,
        };
        credits.push(match kind {
            CreditKind::Kill => CreditEvent::kill(by, 1),
            CreditKind::Assist => CreditEvent::assist(by, 1),
        });
    }
    Ok(())
}

impl EngagementResolver for MacroResolver {
    /// Two teams duel once; three teams resolve as the first pair's
    /// winner against the third.
    fn resolve<R: Rng + ?Sized>(
        &self,
        teams: &mut [&mut Team],
        round: u8,
        rng: &mut R,
    ) -> Result<EngagementOutcome> {
        check_participants(teams)?;

        let mut outcome = EngagementOutcome {
            participants: teams.iter().map(|t| t.id).collect(),
            ..EngagementOutcome::default()
        };

        let mut champion = 0;
        for challenger in 1..teams.len() {
            let power_champion = team_power(&teams[champion], rng);
            let power_challenger = team_power(&teams[challenger], rng);
            let champion_wins = Self::first_wins(power_champion, power_challenger, rng);
            let (win, lose) = if champion_wins {
                (champion, challenger)
            } else {
                (challenger, champion)
            };

            let (low, high) = teams.split_at_mut(win.max(lose));
            let pair = if win < lose {
                (&mut *low[win], &mut *high[0])
            } else {
                (&mut *high[0], &mut *low[lose])
            };
            let (winner_id, loser_id) = (pair.0.id, pair.1.id);
            let boxes = Self::duel(pair, &mut outcome.credits, rng)?;

            tracing::debug!(
                round,
                winner = winner_id,
                loser = loser_id,
                boxes,
                "Macro engagement resolved"
            );
            outcome.log.push(format!(
                "[R{round}] {} beats {} ({:.1} vs {:.1})",
                teams[win].name,
                teams[lose].name,
                if champion_wins { power_champion } else { power_challenger },
                if champion_wins { power_challenger } else { power_champion },
            ));
            outcome.eliminated.push(loser_id);
            champion = win;
        }

        outcome.winner = Some(teams[champion].id);
        Ok(outcome)
    }
}

/// Team id of the favourite by expected power, for logs and balance tools.
#[must_use]
pub fn favourite(teams: &[&Team]) -> Option<TeamId> {
    teams
        .iter()
        .max_by(|a, b| expected_power(a).total_cmp(&expected_power(b)))
        .map(|t| t.id)
}

/// Power with every roll at the middle of its range.
#[must_use]
pub fn expected_power(team: &Team) -> f64 {
    let standing: Vec<f64> = team
        .fighters
        .iter()
        .filter(|f| f.is_alive())
        .map(|f| f.power.map_or(f.base_power, |r| (r.min + r.max) / 2.0))
        .collect();
    if standing.is_empty() {
        return 0.0;
    }
    let mut power = standing.iter().sum::<f64>() / standing.len() as f64;
    if team.alive_count() == 2 {
        power *= TWO_ALIVE_MULTIPLIER;
    }
    power * team.event_buffs.product()
}
