//! Death box recovery at the start of each round.
//!
//! Rounds 1-5: one box always brings one fighter back; two or more boxes
//! bring two back 70% of the time and one back otherwise. Round 6 restores
//! every team holding a box to full strength.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::ROUND_COUNT;
use crate::team::{Team, TeamId};

/// Chance a team with two or more boxes recovers two fighters.
pub const DOUBLE_RESPAWN_CHANCE: f64 = 0.70;

/// What happened to one team during the respawn phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespawnOutcome {
    /// Team that recovered.
    pub team: TeamId,
    /// Fighters brought back.
    pub restored: u8,
    /// Boxes left afterwards.
    pub boxes_left: u8,
}

/// Resolve one team's death boxes for a round.
///
/// Returns `None` when the team is eliminated or holds no boxes.
pub fn respawn_team<R: Rng + ?Sized>(
    team: &mut Team,
    round: u8,
    rng: &mut R,
) -> Option<RespawnOutcome> {
    if !team.is_active() || team.death_boxes == 0 {
        return None;
    }

    let restored = if round >= ROUND_COUNT {
        let restored = team.restore_fighters(u8::MAX);
        team.death_boxes = 0;
        restored
    } else {
        let wanted = match team.death_boxes {
            1 => 1,
            _ if rng.gen_bool(DOUBLE_RESPAWN_CHANCE) => 2,
            _ => 1,
        };
        let restored = team.restore_fighters(wanted);
        team.death_boxes = team.death_boxes.saturating_sub(wanted);
        restored
    };

    Some(RespawnOutcome {
        team: team.id,
        restored,
        boxes_left: team.death_boxes,
    })
}

/// Run the respawn phase for every surviving team.
pub fn respawn_phase<R: Rng + ?Sized>(
    teams: &mut [Team],
    round: u8,
    rng: &mut R,
) -> Vec<RespawnOutcome> {
    teams
        .iter_mut()
        .filter_map(|team| respawn_team(team, round, rng))
        .collect()
}
