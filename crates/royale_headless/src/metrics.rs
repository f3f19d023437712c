//! Match metrics collection for balance analysis.
//!
//! One [`MatchMetrics`] per played match, folded into a [`BatchSummary`]
//! for champion counts, average points and the focus team's placement
//! distribution.

use std::collections::BTreeMap;

use royale_core::orchestrator::MatchReport;
use royale_core::scoring::MatchResultRow;
use royale_core::team::TeamId;
use serde::{Deserialize, Serialize};

/// Complete metrics for a single match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchMetrics {
    /// Unique match identifier.
    pub match_id: String,
    /// Scenario name.
    pub scenario: String,
    /// Random seed used.
    pub seed: u64,
    /// Champion team.
    pub champion: TeamId,
    /// Focus team, if any.
    pub focus_team: Option<TeamId>,
    /// Focus team's final placement.
    pub focus_placement: Option<u32>,
    /// Focus team's point total.
    pub focus_points: Option<u32>,
    /// Engagements fought.
    pub engagements: u32,
    /// Engagements that hit the tick cap.
    pub abnormal_engagements: u32,
    /// Final result rows, best placement first.
    pub rows: Vec<MatchResultRow>,
    /// Final state hash (for determinism validation).
    pub final_state_hash: u64,
}

impl MatchMetrics {
    /// Collect metrics from a finished match.
    #[must_use]
    pub fn from_report(
        report: &MatchReport,
        scenario: impl Into<String>,
        focus_team: Option<TeamId>,
    ) -> Self {
        let focus_row = focus_team.and_then(|id| report.row(id));
        Self {
            match_id: format!("match_{}", report.seed),
            scenario: scenario.into(),
            seed: report.seed,
            champion: report.champion,
            focus_team,
            focus_placement: focus_row.map(|r| r.placement),
            focus_points: focus_row.map(|r| r.total),
            engagements: report.rounds.iter().map(|r| r.engagements.len() as u32).sum(),
            abnormal_engagements: report.abnormal_engagements,
            rows: report.rows.clone(),
            final_state_hash: report.state_hash,
        }
    }
}

/// Summary statistics across multiple matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total matches played.
    pub total_matches: u32,
    /// Championships per team.
    pub champion_counts: BTreeMap<TeamId, u32>,
    /// Championship rate per team.
    pub champion_rates: BTreeMap<TeamId, f64>,
    /// Average point total per team.
    pub avg_points: BTreeMap<TeamId, f64>,
    /// Average kill points per team.
    pub avg_kill_points: BTreeMap<TeamId, f64>,
    /// Focus team tracked by this batch.
    pub focus_team: Option<TeamId>,
    /// How often the focus team finished in each placement.
    pub focus_placements: BTreeMap<u32, u32>,
    /// Focus team's mean placement.
    pub focus_avg_placement: Option<f64>,
    /// Engagements that hit the tick cap, over the whole batch.
    pub abnormal_engagements: u32,
    /// Average engagements per match.
    pub avg_engagements: f64,
}

impl BatchSummary {
    /// Calculate summary from a list of match metrics.
    #[must_use]
    pub fn from_matches(matches: &[MatchMetrics]) -> Self {
        if matches.is_empty() {
            return Self::default();
        }

        let total = matches.len() as u32;
        let mut summary = Self {
            total_matches: total,
            focus_team: matches[0].focus_team,
            ..Default::default()
        };

        let mut points: BTreeMap<TeamId, u64> = BTreeMap::new();
        let mut kills: BTreeMap<TeamId, u64> = BTreeMap::new();
        let mut engagements = 0u64;
        let mut placement_sum = 0u64;
        let mut placed = 0u32;

        for m in matches {
            *summary.champion_counts.entry(m.champion).or_default() += 1;
            summary.abnormal_engagements += m.abnormal_engagements;
            engagements += u64::from(m.engagements);

            for row in &m.rows {
                *points.entry(row.team_id).or_default() += u64::from(row.total);
                *kills.entry(row.team_id).or_default() += u64::from(row.kp);
            }

            if let Some(placement) = m.focus_placement {
                *summary.focus_placements.entry(placement).or_default() += 1;
                placement_sum += u64::from(placement);
                placed += 1;
            }
        }

        let n = f64::from(total);
        summary.champion_rates = summary
            .champion_counts
            .iter()
            .map(|(&team, &wins)| (team, f64::from(wins) / n))
            .collect();
        summary.avg_points = points.into_iter().map(|(t, p)| (t, p as f64 / n)).collect();
        summary.avg_kill_points = kills.into_iter().map(|(t, k)| (t, k as f64 / n)).collect();
        summary.avg_engagements = engagements as f64 / n;
        if placed > 0 {
            summary.focus_avg_placement = Some(placement_sum as f64 / f64::from(placed));
        }

        summary
    }

    /// Championship rate for one team.
    #[must_use]
    pub fn champion_rate(&self, team: TeamId) -> f64 {
        self.champion_rates.get(&team).copied().unwrap_or(0.0)
    }

    /// Team with the most championships, lowest id on ties.
    #[must_use]
    pub fn top_team(&self) -> Option<(TeamId, u32)> {
        self.champion_counts
            .iter()
            .map(|(&team, &wins)| (team, wins))
            .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(team_id: TeamId, placement: u32, kp: u32, total: u32) -> MatchResultRow {
        MatchResultRow {
            team_id,
            team_name: format!("Team {team_id}"),
            placement,
            placement_points: 0,
            kp,
            ap: 0,
            treasure: 0,
            flag: 0,
            total,
        }
    }

    fn metrics(seed: u64, champion: TeamId, focus_placement: u32) -> MatchMetrics {
        MatchMetrics {
            match_id: format!("match_{seed}"),
            scenario: "test".to_string(),
            seed,
            champion,
            focus_team: Some(2),
            focus_placement: Some(focus_placement),
            focus_points: None,
            engagements: 19,
            abnormal_engagements: u32::from(seed == 1),
            rows: vec![row(1, 1, 4, 16), row(2, 2, 2, 11)],
            final_state_hash: seed,
        }
    }

    #[test]
    fn test_empty_summary() {
        let summary = BatchSummary::from_matches(&[]);
        assert_eq!(summary.total_matches, 0);
        assert!(summary.top_team().is_none());
    }

    #[test]
    fn test_summary_aggregates() {
        let matches = vec![metrics(0, 1, 2), metrics(1, 1, 1), metrics(2, 2, 1)];
        let summary = BatchSummary::from_matches(&matches);

        assert_eq!(summary.total_matches, 3);
        assert_eq!(summary.champion_counts[&1], 2);
        assert!((summary.champion_rate(1) - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.champion_rate(7), 0.0);
        assert_eq!(summary.top_team(), Some((1, 2)));
        assert!((summary.avg_points[&1] - 16.0).abs() < 1e-9);
        assert!((summary.avg_kill_points[&2] - 2.0).abs() < 1e-9);
        assert_eq!(summary.focus_placements[&1], 2);
        assert_eq!(summary.focus_placements[&2], 1);
        assert!((summary.focus_avg_placement.unwrap() - 4.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.abnormal_engagements, 1);
        assert!((summary.avg_engagements - 19.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_json_round_trip() {
        let summary = BatchSummary::from_matches(&[metrics(0, 1, 2)]);
        let json = serde_json::to_string(&summary).unwrap();
        let back: BatchSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, summary);
    }
}
