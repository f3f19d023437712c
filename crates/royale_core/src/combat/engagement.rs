//! The engagement resolver seam and its shared outcome type.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::data::{FighterId, TEAM_SIZE};
use crate::error::{MatchError, Result};
use crate::team::{Team, TeamId};

/// Most teams one engagement may involve.
pub const MAX_ENGAGEMENT_TEAMS: usize = 3;

/// A fighter addressed by team and fighter id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FighterRef {
    /// Owning team.
    pub team: TeamId,
    /// Fighter on that team.
    pub fighter: FighterId,
}

/// Kind of individual credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CreditKind {
    /// Kill points.
    Kill,
    /// Assist points.
    Assist,
}

/// Points earned by one fighter in an engagement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreditEvent {
    /// Who earned it.
    pub by: FighterRef,
    /// Kill or assist.
    pub kind: CreditKind,
    /// Points awarded.
    pub points: u32,
}

impl CreditEvent {
    /// Kill credit.
    #[must_use]
    pub const fn kill(by: FighterRef, points: u32) -> Self {
        Self {
            by,
            kind: CreditKind::Kill,
            points,
        }
    }

    /// Assist credit.
    #[must_use]
    pub const fn assist(by: FighterRef, points: u32) -> Self {
        Self {
            by,
            kind: CreditKind::Assist,
            points,
        }
    }
}

/// Result of resolving one engagement.
///
/// Fighter and team state is mutated in place; the outcome describes what
/// happened. Teams listed in `eliminated` have no standing fighters and
/// must be removed from the match by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementOutcome {
    /// Teams that took part.
    pub participants: Vec<TeamId>,
    /// Last team standing; `None` when the fight did not converge.
    pub winner: Option<TeamId>,
    /// Teams wiped out.
    pub eliminated: Vec<TeamId>,
    /// Individual credit, in the order it was earned.
    pub credits: Vec<CreditEvent>,
    /// The tick cap was hit before a single team remained.
    pub abnormal: bool,
    /// Combat ticks simulated (0 for macro resolution).
    pub ticks: u32,
    /// Ordered human-readable account.
    pub log: Vec<String>,
}

impl EngagementOutcome {
    /// Total points of one credit kind.
    #[must_use]
    pub fn total(&self, kind: CreditKind) -> u32 {
        self.credits
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.points)
            .sum()
    }
}

/// Strategy that decides an engagement between 2-3 teams.
pub trait EngagementResolver {
    /// Resolve one engagement.
    ///
    /// # Errors
    ///
    /// Fewer than two or more than three teams, or a participant without a
    /// standing fighter.
    fn resolve<R: Rng + ?Sized>(
        &self,
        teams: &mut [&mut Team],
        round: u8,
        rng: &mut R,
    ) -> Result<EngagementOutcome>;
}

/// Reject engagements that cannot be fought.
pub fn check_participants(teams: &[&mut Team]) -> Result<()> {
    if teams.len() < 2 {
        return Err(MatchError::NotEnoughTeams(teams.len()));
    }
    if teams.len() > MAX_ENGAGEMENT_TEAMS {
        return Err(MatchError::TooManyTeams(teams.len()));
    }
    for team in teams {
        if !team.is_active() || team.alive_count() == 0 {
            return Err(MatchError::NoLivingFighters(team.id));
        }
    }
    Ok(())
}

/// Recount a surviving team's death boxes from its downed fighters.
pub fn sync_death_boxes(team: &mut Team) {
    team.death_boxes = TEAM_SIZE as u8 - team.alive_count();
}
