//! Balance testing utilities.
//!
//! Run thousands of seeded engagements and matches to check win rates and
//! placement distributions against expected bands.

use rand::SeedableRng;
use royale_core::combat::EngagementResolver;
use royale_core::config::MatchConfig;
use royale_core::context::MatchRng;
use royale_core::data::Roster;
use royale_core::error::Result;
use royale_core::orchestrator::Match;
use royale_core::team::{Team, TeamId};

/// Statistics for a set of head-to-head engagements.
#[derive(Debug, Clone, Default)]
pub struct EngagementStats {
    /// Total engagements run.
    pub total: u32,
    /// Wins for team A.
    pub wins_a: u32,
    /// Wins for team B.
    pub wins_b: u32,
    /// Engagements that hit the tick cap.
    pub abnormal: u32,
    /// Sum of ticks over every engagement.
    pub total_ticks: u64,
}

impl EngagementStats {
    /// Win rate for team A (0.0 to 1.0).
    pub fn win_rate_a(&self) -> f64 {
        if self.total == 0 {
            return 0.5;
        }
        f64::from(self.wins_a) / f64::from(self.total)
    }

    /// Win rate for team B (0.0 to 1.0).
    pub fn win_rate_b(&self) -> f64 {
        if self.total == 0 {
            return 0.5;
        }
        f64::from(self.wins_b) / f64::from(self.total)
    }

    /// Average ticks per engagement.
    pub fn avg_ticks(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.total_ticks as f64 / f64::from(self.total)
    }

    /// Check if team A's win rate is within a band.
    pub fn is_balanced(&self, min_rate: f64, max_rate: f64) -> bool {
        let rate = self.win_rate_a();
        rate >= min_rate && rate <= max_rate
    }
}

/// Fight fresh copies of `a` and `b` `trials` times.
///
/// One RNG seeded from `seed` drives every trial, so the whole series is
/// reproducible.
pub fn run_duels<E: EngagementResolver>(
    resolver: &E,
    a: &Team,
    b: &Team,
    trials: u32,
    seed: u64,
) -> Result<EngagementStats> {
    let mut rng = MatchRng::seed_from_u64(seed);
    let mut stats = EngagementStats::default();

    for _ in 0..trials {
        let mut first = a.clone();
        let mut second = b.clone();
        let outcome = resolver.resolve(&mut [&mut first, &mut second], 1, &mut rng)?;

        stats.total += 1;
        stats.total_ticks += u64::from(outcome.ticks);
        if outcome.abnormal {
            stats.abnormal += 1;
        }
        match outcome.winner {
            Some(id) if id == a.id => stats.wins_a += 1,
            Some(id) if id == b.id => stats.wins_b += 1,
            _ => {}
        }
    }

    tracing::debug!(
        trials,
        a = a.id,
        b = b.id,
        win_rate_a = stats.win_rate_a(),
        "Duel series finished"
    );
    Ok(stats)
}

/// Fraction of `trials` Bernoulli draws that came up true.
pub fn observed_rate<F>(trials: u32, seed: u64, mut trial: F) -> f64
where
    F: FnMut(&mut MatchRng) -> bool,
{
    if trials == 0 {
        return 0.0;
    }
    let mut rng = MatchRng::seed_from_u64(seed);
    let hits = (0..trials).filter(|_| trial(&mut rng)).count();
    hits as f64 / f64::from(trials)
}

/// Whether `observed` lies within `tolerance` of `expected`.
pub fn within_tolerance(observed: f64, expected: f64, tolerance: f64) -> bool {
    (observed - expected).abs() <= tolerance
}

/// How often one team finished in each placement over a seed range.
#[derive(Debug, Clone, Default)]
pub struct PlacementHistogram {
    /// Count per placement, index 0 = first place.
    pub counts: Vec<u32>,
    /// Matches played.
    pub matches: u32,
}

impl PlacementHistogram {
    /// Fraction of matches the team won.
    pub fn win_rate(&self) -> f64 {
        if self.matches == 0 {
            return 0.0;
        }
        f64::from(self.counts.first().copied().unwrap_or(0)) / f64::from(self.matches)
    }

    /// Mean placement (1-based).
    pub fn mean_placement(&self) -> f64 {
        if self.matches == 0 {
            return 0.0;
        }
        let weighted: u64 = self
            .counts
            .iter()
            .enumerate()
            .map(|(i, &c)| (i as u64 + 1) * u64::from(c))
            .sum();
        weighted as f64 / f64::from(self.matches)
    }
}

/// Play `matches` matches with consecutive seeds and histogram `team`'s placement.
pub fn placement_histogram(
    roster: &Roster,
    base: &MatchConfig,
    team: TeamId,
    matches: u32,
) -> Result<PlacementHistogram> {
    let mut histogram = PlacementHistogram {
        counts: vec![0; roster.teams.len()],
        matches: 0,
    };
    for offset in 0..matches {
        let config = MatchConfig {
            seed: base.seed.wrapping_add(u64::from(offset)),
            ..base.clone()
        };
        let report = Match::new(roster, config)?.run()?;
        if let Some(row) = report.row(team) {
            let index = row.placement.saturating_sub(1) as usize;
            if let Some(slot) = histogram.counts.get_mut(index) {
                *slot += 1;
            }
        }
        histogram.matches += 1;
    }
    Ok(histogram)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{build_team, plain_team, power_team, standard_roster, stats};
    use rand::Rng;
    use royale_core::combat::{FighterResolver, MacroResolver};

    #[test]
    fn test_stats_win_rate() {
        let stats = EngagementStats {
            total: 100,
            wins_a: 55,
            wins_b: 45,
            abnormal: 0,
            total_ticks: 1000,
        };

        assert!((stats.win_rate_a() - 0.55).abs() < 0.001);
        assert!((stats.win_rate_b() - 0.45).abs() < 0.001);
        assert!((stats.avg_ticks() - 10.0).abs() < 0.001);
        assert!(stats.is_balanced(0.45, 0.60));
    }

    #[test]
    fn test_macro_power_gap_caps_near_78() {
        let strong = build_team(&power_team(1, 80.0)).unwrap();
        let weak = build_team(&power_team(2, 50.0)).unwrap();
        let stats = run_duels(&MacroResolver, &strong, &weak, 10_000, 11).unwrap();
        assert_eq!(stats.total, 10_000);
        assert!(
            (0.76..=0.80).contains(&stats.win_rate_a()),
            "win rate {}",
            stats.win_rate_a()
        );
    }

    #[test]
    fn test_mirror_fighter_duel_is_even() {
        let a = build_team(&plain_team(1, stats(60.0, 40.0, 40.0))).unwrap();
        let b = build_team(&plain_team(2, stats(60.0, 40.0, 40.0))).unwrap();
        let stats = run_duels(&FighterResolver::default(), &a, &b, 2_000, 5).unwrap();
        assert_eq!(stats.wins_a + stats.wins_b + stats.abnormal, 2_000);
        assert!(stats.is_balanced(0.40, 0.60), "win rate {}", stats.win_rate_a());
    }

    #[test]
    fn test_better_aim_wins_more() {
        let sharp = build_team(&plain_team(1, stats(85.0, 40.0, 60.0))).unwrap();
        let dull = build_team(&plain_team(2, stats(35.0, 40.0, 60.0))).unwrap();
        let stats = run_duels(&FighterResolver::default(), &sharp, &dull, 1_000, 9).unwrap();
        assert!(stats.win_rate_a() > 0.7, "win rate {}", stats.win_rate_a());
    }

    #[test]
    fn test_observed_rate() {
        let rate = observed_rate(10_000, 3, |rng| rng.gen_bool(0.7));
        assert!(within_tolerance(rate, 0.7, 0.02));
        assert_eq!(observed_rate(0, 3, |_| true), 0.0);
    }

    #[test]
    fn test_placement_histogram_counts_every_match() {
        let histogram =
            placement_histogram(&standard_roster(), &MatchConfig::with_seed(100), 4, 10).unwrap();
        assert_eq!(histogram.matches, 10);
        assert_eq!(histogram.counts.iter().sum::<u32>(), 10);
        assert!((1.0..=20.0).contains(&histogram.mean_placement()));
    }
}
