//! Engagement pairing for one round.
//!
//! The focus team is forced into a fight with a per-round probability,
//! against a co-located team when one exists. Remaining slots pair other
//! surviving teams, preferring pairs that share a zone. The focus team is
//! only drafted into an unforced slot when there are not enough other teams
//! to fill the round.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::FocusOdds;
use crate::error::{MatchError, Result};
use crate::team::{AreaId, Team, TeamId};

/// Two teams scheduled to fight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pairing {
    /// The two participants.
    pub teams: [TeamId; 2],
    /// Whether this is the focus team's forced fight.
    pub forced: bool,
}

impl Pairing {
    /// Whether a team takes part.
    #[must_use]
    pub fn involves(&self, team: TeamId) -> bool {
        self.teams.contains(&team)
    }
}

/// Plans a round's engagements.
#[derive(Debug, Clone, Copy)]
pub struct EngagementScheduler<'a> {
    odds: &'a FocusOdds,
    focus: Option<TeamId>,
}

impl<'a> EngagementScheduler<'a> {
    /// Scheduler biased toward `focus`.
    #[must_use]
    pub const fn new(odds: &'a FocusOdds, focus: Option<TeamId>) -> Self {
        Self { odds, focus }
    }

    /// Pair `slots` disjoint engagements from the surviving teams.
    ///
    /// # Errors
    ///
    /// More slots than surviving teams can fill.
    pub fn plan<R: Rng + ?Sized>(
        &self,
        teams: &[Team],
        round: u8,
        slots: u32,
        rng: &mut R,
    ) -> Result<Vec<Pairing>> {
        let mut pool: Vec<(TeamId, AreaId)> = teams
            .iter()
            .filter(|t| t.is_active())
            .map(|t| (t.id, t.area))
            .collect();
        let slots = slots as usize;
        if slots * 2 > pool.len() {
            return Err(MatchError::InvalidRoundTable(format!(
                "round {round} needs {slots} fights but only {} teams remain",
                pool.len()
            )));
        }

        let mut pairings = Vec::with_capacity(slots);
        let focus = self
            .focus
            .and_then(|id| pool.iter().position(|&(t, _)| t == id));

        if let (Some(index), true) = (focus, slots > 0) {
            let (focus_id, focus_area) = pool.remove(index);
            let colocated: Vec<usize> = (0..pool.len())
                .filter(|&i| pool[i].1 == focus_area)
                .collect();
            let chance = self.odds.probability(round, !colocated.is_empty());

            if rng.gen_bool(chance) {
                let opponent = match colocated.choose(rng) {
                    Some(&i) => i,
                    None => rng.gen_range(0..pool.len()),
                };
                let (opponent_id, _) = pool.remove(opponent);
                tracing::debug!(round, focus = focus_id, opponent = opponent_id, "Focus team forced");
                pairings.push(Pairing {
                    teams: [focus_id, opponent_id],
                    forced: true,
                });
            } else if pool.len() < (slots - pairings.len()) * 2 {
                pool.insert(index, (focus_id, focus_area));
            }
        }

        while pairings.len() < slots {
            let (a, b) = pick_pair(&pool, rng)?;
            let (high, low) = (a.max(b), a.min(b));
            let second = pool.remove(high);
            let first = pool.remove(low);
            pairings.push(Pairing {
                teams: [first.0, second.0],
                forced: false,
            });
        }

        Ok(pairings)
    }
}

/// Two distinct pool indices, co-located when any co-located pair exists.
fn pick_pair<R: Rng + ?Sized>(pool: &[(TeamId, AreaId)], rng: &mut R) -> Result<(usize, usize)> {
    if pool.len() < 2 {
        return Err(MatchError::InvalidState(
            "fewer than two teams left to pair".to_string(),
        ));
    }

    let shares_zone = |i: usize| {
        pool.iter()
            .enumerate()
            .any(|(j, other)| j != i && other.1 == pool[i].1)
    };
    let anchors: Vec<usize> = (0..pool.len()).filter(|&i| shares_zone(i)).collect();

    if let Some(&first) = anchors.choose(rng) {
        let partners: Vec<usize> = (0..pool.len())
            .filter(|&j| j != first && pool[j].1 == pool[first].1)
            .collect();
        if let Some(&second) = partners.choose(rng) {
            return Ok((first, second));
        }
    }

    let first = rng.gen_range(0..pool.len());
    let mut second = rng.gen_range(0..pool.len() - 1);
    if second >= first {
        second += 1;
    }
    Ok((first, second))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_team;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::BTreeSet;

    fn field(count: u32) -> Vec<Team> {
        let mut teams: Vec<Team> = (1..=count).map(sample_team).collect();
        for (i, team) in teams.iter_mut().enumerate() {
            team.area = i as AreaId;
        }
        teams
    }

    fn assert_disjoint(pairings: &[Pairing]) {
        let mut seen = BTreeSet::new();
        for pairing in pairings {
            assert_ne!(pairing.teams[0], pairing.teams[1]);
            for team in pairing.teams {
                assert!(seen.insert(team), "team {team} scheduled twice");
            }
        }
    }

    #[test]
    fn test_plans_requested_slots() {
        let odds = FocusOdds::default();
        let scheduler = EngagementScheduler::new(&odds, Some(1));
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for round in 1..=4 {
            let pairings = scheduler
                .plan(&field(20), round, 4, &mut rng)
                .expect("enough teams");
            assert_eq!(pairings.len(), 4);
            assert_disjoint(&pairings);
        }
    }

    #[test]
    fn test_eliminated_teams_never_paired() {
        let odds = FocusOdds::default();
        let scheduler = EngagementScheduler::new(&odds, None);
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut teams = field(10);
        for team in teams.iter_mut().take(4) {
            team.eliminate(1);
        }
        for _ in 0..100 {
            let pairings = scheduler.plan(&teams, 2, 3, &mut rng).expect("six left");
            assert_disjoint(&pairings);
            assert!(pairings.iter().all(|p| p.teams.iter().all(|&id| id > 4)));
        }
    }

    #[test]
    fn test_too_many_slots_rejected() {
        let odds = FocusOdds::default();
        let scheduler = EngagementScheduler::new(&odds, None);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(matches!(
            scheduler.plan(&field(5), 2, 3, &mut rng),
            Err(MatchError::InvalidRoundTable(_))
        ));
    }

    #[test]
    fn test_round_one_needs_colocation() {
        let odds = FocusOdds::default();
        let scheduler = EngagementScheduler::new(&odds, Some(1));
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        // every team alone in its zone: no forcing, focus sits out
        for _ in 0..200 {
            let pairings = scheduler.plan(&field(20), 1, 4, &mut rng).expect("plan");
            assert!(pairings.iter().all(|p| !p.involves(1)));
        }

        // share a zone with team 7: always forced, always against team 7
        let mut teams = field(20);
        teams[6].area = teams[0].area;
        for _ in 0..200 {
            let pairings = scheduler.plan(&teams, 1, 4, &mut rng).expect("plan");
            assert_eq!(pairings[0].teams, [1, 7]);
            assert!(pairings[0].forced);
        }
    }

    #[test]
    fn test_forcing_rate_round_two() {
        let odds = FocusOdds::default();
        let scheduler = EngagementScheduler::new(&odds, Some(3));
        let mut rng = ChaCha8Rng::seed_from_u64(31);
        let trials = 5_000u32;
        let mut forced = 0u32;
        for _ in 0..trials {
            let pairings = scheduler.plan(&field(16), 2, 4, &mut rng).expect("plan");
            if pairings.iter().any(|p| p.forced && p.involves(3)) {
                forced += 1;
            }
        }
        let rate = f64::from(forced) / f64::from(trials);
        assert!((0.67..=0.73).contains(&rate), "forcing rate {rate}");
    }

    #[test]
    fn test_focus_drafted_when_needed() {
        let odds = FocusOdds {
            first_round_requires_colocation: true,
            by_round: vec![0.0; 6],
        };
        let scheduler = EngagementScheduler::new(&odds, Some(2));
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let pairings = scheduler.plan(&field(8), 4, 4, &mut rng).expect("plan");
        assert_disjoint(&pairings);
        assert!(pairings.iter().any(|p| p.involves(2)));
        assert!(pairings.iter().all(|p| !p.forced));
    }

    #[test]
    fn test_prefers_colocated_pairs() {
        let odds = FocusOdds::default();
        let scheduler = EngagementScheduler::new(&odds, None);
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let mut teams = field(6);
        teams[1].area = 40;
        teams[4].area = 40;
        for _ in 0..100 {
            let pairings = scheduler.plan(&teams, 2, 1, &mut rng).expect("plan");
            let mut pair = pairings[0].teams;
            pair.sort_unstable();
            assert_eq!(pair, [2, 5]);
        }
    }
}
