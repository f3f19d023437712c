//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a match produces identical results
//! given identical roster, config and seed.
//!
//! # Testing Strategy
//!
//! Matches must be fully reproducible for replay verification and seeded
//! balance runs. Sources of non-determinism include:
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Content uses `BTreeMap` and teams are always visited in field order.
//!
//! - **System randomness**: every draw comes from the match's seeded
//!   `ChaCha8Rng`; nothing reads `thread_rng()`.
//!
//! - **Shared state across threads**: each match owns its context, so
//!   parallel batches must agree with serial runs.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: individual components with an injected seeded RNG
//! 2. **Property tests**: random content must still produce reproducible matches
//! 3. **Integration tests**: full matches are reproducible round by round
//! 4. **Parallel tests**: running N matches in parallel all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use royale_core::config::{MatchConfig, ROUND_COUNT};
use royale_core::data::Roster;
use royale_core::error::Result;
use royale_core::orchestrator::Match;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps simulated per run.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic match).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run agreed, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Match is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Result of parallel match runs.
#[derive(Debug, Clone)]
pub struct ParallelMatchResult {
    /// Final state hash from each match.
    pub hashes: Vec<u64>,
    /// Number of matches run.
    pub num_matches: usize,
}

impl ParallelMatchResult {
    /// Check if all matches produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all matches agreed.
    ///
    /// # Panics
    ///
    /// Panics if matches produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            let mut unique: Vec<u64> = self.hashes.clone();
            unique.sort_unstable();
            unique.dedup();
            panic!(
                "Parallel matches diverged!\n\
                 Matches: {}\n\
                 Unique hashes: {}\n\
                 All hashes: {:?}",
                self.num_matches,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a stepped process multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `steps` - Number of steps per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance state by one step
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```ignore
/// use royale_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(
///     5, // Run 5 times
///     6, // 6 rounds each
///     || Match::new(&roster, config.clone()).unwrap(),
///     |m| { m.advance_round().unwrap(); },
///     |m| m.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..steps {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

fn play(roster: &Roster, config: &MatchConfig) -> Result<u64> {
    Ok(Match::new(roster, config.clone())?.run()?.state_hash)
}

/// Play the same match `runs` times and compare final hashes.
///
/// # Errors
///
/// The match itself failed.
pub fn verify_match_determinism(
    roster: &Roster,
    config: &MatchConfig,
    runs: usize,
) -> Result<DeterminismResult> {
    let hashes = (0..runs)
        .map(|_| play(roster, config))
        .collect::<Result<Vec<_>>>()?;
    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    Ok(DeterminismResult {
        is_deterministic,
        hashes,
        steps: u64::from(ROUND_COUNT),
    })
}

/// Run N copies of a match on scoped threads and collect final hashes.
///
/// Catches non-determinism that only shows up under thread scheduling or
/// memory layout differences.
///
/// # Errors
///
/// Any of the matches failed.
pub fn run_parallel_matches_scoped(
    roster: &Roster,
    config: &MatchConfig,
    num_matches: usize,
) -> Result<ParallelMatchResult> {
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_matches)
            .map(|_| s.spawn(|| play(roster, config)))
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect::<Result<Vec<_>>>()
    })?;

    Ok(ParallelMatchResult {
        hashes,
        num_matches,
    })
}

/// Step two copies of a match round by round, finding the first divergence.
///
/// # Returns
///
/// `None` if both copies agree after every round, `Some(round)` for the
/// first round whose hashes differ (0 = after landing).
pub fn find_first_divergence(roster: &Roster, config: &MatchConfig) -> Result<Option<u8>> {
    let mut first = Match::new(roster, config.clone())?;
    let mut second = Match::new(roster, config.clone())?;

    if first.state_hash() != second.state_hash() {
        return Ok(Some(0));
    }

    while !first.is_finished() {
        let round = first.advance_round()?.round;
        second.advance_round()?;
        if first.state_hash() != second.state_hash() {
            return Ok(Some(round));
        }
    }

    Ok(None)
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for match testing.
///
/// These strategies generate random but reproducible content for
/// property-based testing of match invariants.
pub mod strategies {
    use proptest::prelude::*;
    use royale_core::config::ResolverMode;
    use royale_core::data::{Roster, StatBlock};

    use crate::fixtures::roster_with;

    /// A percentage-style stat.
    pub fn arb_stat() -> impl Strategy<Value = f64> {
        0.0f64..100.0
    }

    /// A legal stat block.
    pub fn arb_stat_block() -> impl Strategy<Value = StatBlock> {
        (
            40.0f64..150.0,
            0.0f64..=100.0,
            arb_stat(),
            0.0f64..10.0,
            arb_stat(),
            arb_stat(),
            arb_stat(),
            arb_stat(),
            arb_stat(),
        )
            .prop_map(
                |(hp, armor, mental, movement, aim, agility, technique, support, hunt)| {
                    StatBlock {
                        hp,
                        armor,
                        mental,
                        movement,
                        aim,
                        agility,
                        technique,
                        support,
                        hunt,
                    }
                },
            )
    }

    /// Either resolver.
    pub fn arb_resolver_mode() -> impl Strategy<Value = ResolverMode> {
        prop_oneof![Just(ResolverMode::Macro), Just(ResolverMode::Fighter)]
    }

    /// Any match seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }

    /// The generated field of `count` teams with every stat block replaced.
    pub fn arb_roster(count: u32) -> impl Strategy<Value = Roster> {
        proptest::collection::vec(arb_stat_block(), count as usize * 3).prop_map(move |blocks| {
            let mut roster = roster_with(count);
            let members = roster.teams.iter_mut().flat_map(|t| t.members.iter_mut());
            for (member, stats) in members.zip(blocks) {
                member.stats = stats;
            }
            roster
        })
    }
}
