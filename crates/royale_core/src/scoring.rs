//! Standings and point totals.
//!
//! Placement is fixed once, when the match finishes: later elimination
//! ranks higher, the undefeated team is champion, ties break on kill points,
//! then assist points, then a random draw. After that, [`score_match`] is a
//! pure function of final team state.

use std::cmp::Ordering;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{MatchError, Result};
use crate::team::{Team, TeamId};

/// Placement points by rank for a 20-team field.
pub const DEFAULT_PLACEMENT_POINTS: [u32; 20] =
    [12, 9, 7, 5, 4, 3, 3, 2, 2, 2, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0];

/// Default weight of one flag pickup.
pub const DEFAULT_FLAG_WEIGHT: u32 = 1;

/// How final state converts into points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Points per flag pickup.
    #[serde(default = "default_flag_weight")]
    pub flag_weight: u32,
    /// Points by rank, rank 1 first. Ranks past the end score 0.
    #[serde(default = "default_placement_points")]
    pub placement_points: Vec<u32>,
}

const fn default_flag_weight() -> u32 {
    DEFAULT_FLAG_WEIGHT
}

fn default_placement_points() -> Vec<u32> {
    DEFAULT_PLACEMENT_POINTS.to_vec()
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            flag_weight: DEFAULT_FLAG_WEIGHT,
            placement_points: default_placement_points(),
        }
    }
}

impl ScoringConfig {
    /// The curve must be non-empty and never reward a worse rank more.
    pub fn validate(&self) -> Result<()> {
        if self.placement_points.is_empty() {
            return Err(MatchError::InvalidConfig(
                "placement curve is empty".to_string(),
            ));
        }
        if self.placement_points.windows(2).any(|w| w[1] > w[0]) {
            return Err(MatchError::InvalidConfig(
                "placement curve must be non-increasing".to_string(),
            ));
        }
        Ok(())
    }

    /// Points for a 1-based placement.
    #[must_use]
    pub fn placement_points_for(&self, placement: u32) -> u32 {
        placement
            .checked_sub(1)
            .and_then(|i| self.placement_points.get(i as usize))
            .copied()
            .unwrap_or(0)
    }
}

/// One team's final line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchResultRow {
    /// Team.
    pub team_id: TeamId,
    /// Display name.
    pub team_name: String,
    /// Final rank, 1 = champion.
    pub placement: u32,
    /// Points from placement alone.
    pub placement_points: u32,
    /// Kill points.
    pub kp: u32,
    /// Assist points.
    pub ap: u32,
    /// Treasure pickups.
    pub treasure: u32,
    /// Flag pickups (unweighted).
    pub flag: u32,
    /// Everything summed, flags weighted.
    pub total: u32,
}

fn standing_order(a: &Team, b: &Team) -> Ordering {
    // None (never eliminated) sorts after every Some, so reverse puts it first
    let survived = |t: &Team| t.eliminated_round.map_or(u16::MAX, u16::from);
    survived(b)
        .cmp(&survived(a))
        .then(b.points.kp.cmp(&a.points.kp))
        .then(b.points.ap.cmp(&a.points.ap))
}

/// Rank every team and record the placement on it.
///
/// Returns team ids best first. Ties left after kill and assist points are
/// broken by one random key per team, drawn in field order.
pub fn derive_standings<R: Rng + ?Sized>(teams: &mut [Team], rng: &mut R) -> Vec<TeamId> {
    let mut keyed: Vec<(u64, usize)> = (0..teams.len()).map(|i| (rng.gen(), i)).collect();
    keyed.sort_by(|&(ka, a), &(kb, b)| standing_order(&teams[a], &teams[b]).then(ka.cmp(&kb)));

    let mut order = Vec::with_capacity(teams.len());
    for (rank, &(_, index)) in keyed.iter().enumerate() {
        let team = &mut teams[index];
        team.placement = Some(rank as u32 + 1);
        order.push(team.id);
    }
    order
}

/// Build result rows, best placement first.
///
/// # Errors
///
/// A team without a placement means standings were never derived.
pub fn score_match(teams: &[Team], config: &ScoringConfig) -> Result<Vec<MatchResultRow>> {
    let mut rows = teams
        .iter()
        .map(|team| {
            let placement = team.placement.ok_or_else(|| {
                MatchError::InvalidState(format!("team {} has no placement", team.id))
            })?;
            let placement_points = config.placement_points_for(placement);
            let p = team.points;
            Ok(MatchResultRow {
                team_id: team.id,
                team_name: team.name.clone(),
                placement,
                placement_points,
                kp: p.kp,
                ap: p.ap,
                treasure: p.treasure,
                flag: p.flag,
                total: placement_points + p.kp + p.ap + p.treasure + p.flag * config.flag_weight,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    rows.sort_by_key(|row| row.placement);
    Ok(rows)
}
