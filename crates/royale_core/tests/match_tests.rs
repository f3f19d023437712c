//! Whole-match tests over the standard 20-team field.
//!
//! These drive matches through the public API only, using the shared
//! fixtures and determinism harness from `royale_test_utils`.

use rand::SeedableRng;
use royale_core::combat::{formulas, EngagementResolver, FighterResolver};
use royale_core::config::{MatchConfig, ResolverMode};
use royale_core::context::MatchRng;
use royale_core::orchestrator::Match;
use royale_core::replay::MatchReplay;
use royale_core::respawn::respawn_team;
use royale_core::scoring::score_match;
use royale_test_utils::balance::{observed_rate, within_tolerance};
use royale_test_utils::determinism::{run_parallel_matches_scoped, verify_match_determinism};
use royale_test_utils::fixtures::{build_team, standard_roster, standard_team};

const ALIVE_TARGETS: [u32; 6] = [16, 12, 8, 4, 2, 1];

fn config(seed: u64, mode: ResolverMode) -> MatchConfig {
    MatchConfig::with_seed(seed).with_resolver(mode).with_focus(1)
}

// =============================================================================
// Round schedule
// =============================================================================

#[test]
fn alive_targets_hold_in_both_modes() {
    let roster = standard_roster();
    for mode in [ResolverMode::Macro, ResolverMode::Fighter] {
        for seed in 0..8 {
            let report = Match::new(&roster, config(seed, mode))
                .and_then(Match::run)
                .expect("match runs");
            let alive: Vec<u32> = report.rounds.iter().map(|r| r.alive_after).collect();
            assert_eq!(alive, ALIVE_TARGETS, "{mode:?} seed {seed}");
        }
    }
}

#[test]
fn every_engagement_eliminates_exactly_one_team() {
    let report = Match::new(&standard_roster(), config(3, ResolverMode::Fighter))
        .and_then(Match::run)
        .expect("match runs");
    for round in &report.rounds {
        for engagement in &round.engagements {
            assert_eq!(engagement.eliminated.len(), 1);
            assert!(engagement.pairing.involves(engagement.winner));
            assert!(!engagement.eliminated.contains(&engagement.winner));
        }
    }
}

// =============================================================================
// Credit and scoring
// =============================================================================

#[test]
fn member_credit_sums_match_team_tallies() {
    for mode in [ResolverMode::Macro, ResolverMode::Fighter] {
        let mut game = Match::new(&standard_roster(), config(11, mode)).expect("valid");
        while !game.is_finished() {
            game.advance_round().expect("round runs");
            for team in game.teams() {
                assert_eq!(team.member_kill_points(), team.points.kp, "team {}", team.id);
                assert_eq!(team.member_assist_points(), team.points.ap, "team {}", team.id);
            }
        }
        game.ledger().audit(game.teams()).expect("ledger agrees");
    }
}

#[test]
fn eliminated_teams_have_no_standing_fighters() {
    let game = {
        let mut game =
            Match::new(&standard_roster(), config(5, ResolverMode::Fighter)).expect("valid");
        while !game.is_finished() {
            game.advance_round().expect("round runs");
        }
        game
    };
    for team in game.teams() {
        if team.eliminated {
            assert_eq!(team.alive_count(), 0);
            assert!(team.fighters.iter().all(|f| f.hp == 0.0));
        } else {
            assert!(team.alive_count() > 0);
        }
    }
}

#[test]
fn report_rows_are_a_full_ranking() {
    let config = config(21, ResolverMode::Macro);
    let flag_weight = config.scoring.flag_weight;
    let report = Match::new(&standard_roster(), config)
        .and_then(Match::run)
        .expect("match runs");
    assert_eq!(report.rows.len(), 20);
    let placements: Vec<u32> = report.rows.iter().map(|r| r.placement).collect();
    assert_eq!(placements, (1..=20).collect::<Vec<_>>());
    assert_eq!(report.rows[0].team_id, report.champion);
    for row in &report.rows {
        assert_eq!(
            row.total,
            row.placement_points + row.kp + row.ap + row.treasure + row.flag * flag_weight
        );
    }
}

#[test]
fn scoring_twice_gives_identical_rows() {
    let mut game = Match::new(&standard_roster(), config(8, ResolverMode::Macro)).expect("valid");
    while !game.is_finished() {
        game.advance_round().expect("round runs");
    }
    let scoring = &game.config().scoring;
    let first = score_match(game.teams(), scoring).expect("placed");
    let second = score_match(game.teams(), scoring).expect("placed");
    assert_eq!(first, second);
}

// =============================================================================
// Determinism and replay
// =============================================================================

#[test]
fn repeated_matches_are_identical() {
    let roster = standard_roster();
    for mode in [ResolverMode::Macro, ResolverMode::Fighter] {
        verify_match_determinism(&roster, &config(1234, mode), 3)
            .expect("matches run")
            .assert_deterministic();
    }
}

#[test]
fn parallel_matches_agree_with_each_other() {
    run_parallel_matches_scoped(&standard_roster(), &config(77, ResolverMode::Fighter), 4)
        .expect("matches run")
        .assert_deterministic();
}

#[test]
fn replay_file_reproduces_match() {
    let (replay, report) =
        MatchReplay::record("standard", standard_roster(), config(55, ResolverMode::Fighter))
            .expect("match runs");

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("standard.replay");
    replay.save(&path).expect("saved");

    let loaded = MatchReplay::load(&path).expect("loaded");
    assert!(loaded.verify().expect("re-runs"));
    assert_eq!(loaded.play().expect("re-runs"), report);
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn single_death_box_restores_deterministically() {
    let mut rng = MatchRng::seed_from_u64(0);
    for _ in 0..100 {
        let mut team = build_team(&standard_team(1)).expect("valid");
        assert!(team.add_death_box(0));
        assert_eq!((team.alive_count(), team.death_boxes), (2, 1));

        respawn_team(&mut team, 3, &mut rng).expect("team had a box");
        assert_eq!((team.alive_count(), team.death_boxes), (3, 0));
    }
}

#[test]
fn double_death_box_restores_both_seventy_percent_of_the_time() {
    let base = {
        let mut team = build_team(&standard_team(2)).expect("valid");
        assert!(team.add_death_box(0));
        assert!(team.add_death_box(0));
        team
    };
    assert_eq!((base.alive_count(), base.death_boxes), (1, 2));

    let rate = observed_rate(10_000, 17, |rng| {
        let mut team = base.clone();
        respawn_team(&mut team, 2, rng);
        assert!(matches!(team.alive_count(), 2 | 3));
        team.alive_count() == 3
    });
    assert!(within_tolerance(rate, 0.70, 0.02), "rate {rate}");
}

#[test]
fn hit_chance_scenario() {
    assert_eq!(formulas::hit_chance(80.0, 30.0, 50.0, 0.0, 1.0), 85.0);
    assert_eq!(formulas::hit_chance(80.0, 30.0, 50.0, 0.0, 1.3), 90.0);
}

#[test]
fn fighter_engagement_ends_decisively_or_flags_abnormal() {
    let resolver = FighterResolver::default();
    let mut rng = MatchRng::seed_from_u64(3);
    for pair in 0..20 {
        let mut a = build_team(&standard_team(pair * 2 + 1)).expect("valid");
        let mut b = build_team(&standard_team(pair * 2 + 2)).expect("valid");
        let outcome = resolver
            .resolve(&mut [&mut a, &mut b], 1, &mut rng)
            .expect("two living teams");
        if outcome.abnormal {
            assert!(outcome.winner.is_none());
        } else {
            let standing = [&a, &b].iter().filter(|t| t.alive_count() > 0).count();
            assert_eq!(standing, 1);
            assert_eq!(outcome.eliminated.len(), 1);
        }
    }
}
