//! Batch match runner for balance testing.
//!
//! Runs many seeded matches in parallel using rayon. Every match owns its
//! own context and RNG, so a parallel batch returns exactly what a serial
//! one would.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use royale_core::config::ResolverMode;
use royale_core::error::MatchError;
use royale_core::orchestrator::Match;
use royale_core::team::TeamId;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::metrics::{BatchSummary, MatchMetrics};
use crate::scenario::{Scenario, STANDARD_SCENARIO};

/// Configuration for a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Scenario name or path
    pub scenario: String,
    /// Number of matches to run
    pub match_count: u32,
    /// Maximum parallel matches (0 = use rayon default)
    pub parallel_matches: u32,
    /// Output directory for results
    pub output_dir: PathBuf,
    /// Starting seed; match `i` uses `seed_start + i`
    pub seed_start: u64,
    /// Resolver override
    pub resolver: Option<ResolverMode>,
    /// Focus team override
    pub focus_team: Option<TeamId>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            scenario: STANDARD_SCENARIO.to_string(),
            match_count: 100,
            parallel_matches: 0,
            output_dir: PathBuf::from("results"),
            seed_start: 0,
            resolver: None,
            focus_team: None,
        }
    }
}

impl BatchConfig {
    /// Create config for a specific scenario
    pub fn new(scenario: &str, match_count: u32) -> Self {
        Self {
            scenario: scenario.to_string(),
            match_count,
            ..Default::default()
        }
    }

    /// Set output directory
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set seed start
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set resolver
    pub fn with_resolver(mut self, resolver: ResolverMode) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Set focus team
    pub fn with_focus(mut self, team: TeamId) -> Self {
        self.focus_team = Some(team);
        self
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual match metrics, in seed order
    pub matches: Vec<MatchMetrics>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Error during batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Match index
    pub match_index: u32,
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

/// Progress tracking for batch runs
#[derive(Debug)]
pub struct BatchProgress {
    /// Total matches
    pub total: u32,
    completed: AtomicU32,
    start_time: Instant,
}

impl BatchProgress {
    /// Create new progress tracker
    pub fn new(total: u32) -> Self {
        Self {
            total,
            completed: AtomicU32::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a completed match, returning the new count
    pub fn record_completion(&self) -> u32 {
        self.completed.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Get current completion count
    pub fn current(&self) -> u32 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Get completion percentage
    pub fn percentage(&self) -> f64 {
        f64::from(self.current()) / f64::from(self.total.max(1)) * 100.0
    }

    /// Get estimated time remaining
    pub fn eta(&self) -> Duration {
        let completed = self.current();
        if completed == 0 {
            return Duration::from_secs(0);
        }

        let elapsed = self.start_time.elapsed();
        let per_match = elapsed.as_secs_f64() / f64::from(completed);
        let remaining = self.total.saturating_sub(completed);
        Duration::from_secs_f64(per_match * f64::from(remaining))
    }
}

/// Apply batch overrides to a scenario.
fn prepare(scenario: &Scenario, config: &BatchConfig) -> Scenario {
    let mut scenario = scenario.clone();
    if let Some(resolver) = config.resolver {
        scenario.config.resolver = resolver;
    }
    if config.focus_team.is_some() {
        scenario.config.focus_team = config.focus_team;
    }
    scenario
}

/// Play one match of a scenario with a given seed.
pub fn run_single_match(scenario: &Scenario, seed: u64) -> Result<MatchMetrics, MatchError> {
    let config = scenario.config_for_seed(seed);
    let focus = config.focus_team;
    let report = Match::new(&scenario.roster, config)?.run()?;
    Ok(MatchMetrics::from_report(&report, &scenario.name, focus))
}

/// Run a batch of matches
pub fn run_batch(config: BatchConfig, scenario: &Scenario) -> BatchResults {
    let start = Instant::now();
    let progress = BatchProgress::new(config.match_count);
    let scenario = prepare(scenario, &config);

    info!(
        scenario = %scenario.name,
        matches = config.match_count,
        seed_start = config.seed_start,
        resolver = ?scenario.config.resolver,
        "Starting batch run"
    );

    let play = |i: u32| {
        let seed = config.seed_start.wrapping_add(u64::from(i));
        match run_single_match(&scenario, seed) {
            Ok(metrics) => {
                let completed = progress.record_completion();
                if completed % 50 == 0 {
                    debug!(
                        completed,
                        total = config.match_count,
                        eta_secs = progress.eta().as_secs(),
                        "Batch progress"
                    );
                }
                Ok(metrics)
            }
            Err(e) => {
                warn!(index = i, seed, error = %e, "Match failed");
                Err(BatchError {
                    match_index: i,
                    seed,
                    message: e.to_string(),
                })
            }
        }
    };

    let run_all = || -> Vec<Result<MatchMetrics, BatchError>> {
        (0..config.match_count).into_par_iter().map(&play).collect()
    };

    let results = if config.parallel_matches > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_matches as usize)
            .build()
        {
            Ok(pool) => pool.install(run_all),
            Err(e) => {
                warn!(error = %e, "Failed to build thread pool, using global pool");
                run_all()
            }
        }
    } else {
        run_all()
    };

    let (matches, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let matches: Vec<MatchMetrics> = matches.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_matches(&matches);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} matches in {:.1}s ({:.1} matches/sec)",
        matches.len(),
        duration_seconds,
        matches.len() as f64 / duration_seconds.max(0.001)
    );

    BatchResults {
        config,
        matches,
        summary,
        duration_seconds,
        errors,
    }
}

/// Play the same seed `runs` times and check every run agrees.
pub fn verify_determinism(scenario: &Scenario, seed: u64, runs: u32) -> Result<bool, MatchError> {
    let results = (0..runs)
        .map(|_| run_single_match(scenario, seed))
        .collect::<Result<Vec<_>, _>>()?;

    let Some(first) = results.first() else {
        return Ok(true);
    };
    Ok(results.iter().all(|r| r == first))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standard() -> Scenario {
        Scenario::standard().unwrap()
    }

    #[test]
    fn test_batch_config_default() {
        let config = BatchConfig::default();
        assert_eq!(config.match_count, 100);
        assert_eq!(config.scenario, "standard");
    }

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new("custom.ron", 500)
            .with_output(PathBuf::from("/tmp/results"))
            .with_seed(12345)
            .with_resolver(ResolverMode::Fighter)
            .with_focus(3);

        assert_eq!(config.scenario, "custom.ron");
        assert_eq!(config.match_count, 500);
        assert_eq!(config.seed_start, 12345);
        assert_eq!(config.resolver, Some(ResolverMode::Fighter));
        assert_eq!(config.focus_team, Some(3));
    }

    #[test]
    fn test_progress_tracking() {
        let progress = BatchProgress::new(100);
        assert_eq!(progress.current(), 0);
        assert_eq!(progress.percentage(), 0.0);

        progress.record_completion();
        progress.record_completion();
        assert_eq!(progress.record_completion(), 3);
        assert!((progress.percentage() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_run_batch_small() {
        let config = BatchConfig::new("standard", 10).with_focus(1);
        let results = run_batch(config, &standard());

        assert_eq!(results.matches.len(), 10);
        assert!(results.errors.is_empty());
        assert_eq!(results.summary.total_matches, 10);
        assert_eq!(results.summary.focus_placements.values().sum::<u32>(), 10);
        let seeds: Vec<u64> = results.matches.iter().map(|m| m.seed).collect();
        assert_eq!(seeds, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_parallel_batch_matches_serial_run() {
        let scenario = standard();
        let config = BatchConfig::new("standard", 6)
            .with_seed(40)
            .with_resolver(ResolverMode::Fighter);
        let results = run_batch(config.clone(), &scenario);

        let prepared = prepare(&scenario, &config);
        for metrics in &results.matches {
            let serial = run_single_match(&prepared, metrics.seed).unwrap();
            assert_eq!(&serial, metrics);
        }
    }

    #[test]
    fn test_bounded_pool() {
        let config = BatchConfig {
            parallel_matches: 2,
            ..BatchConfig::new("standard", 4)
        };
        let results = run_batch(config, &standard());
        assert_eq!(results.matches.len(), 4);
    }

    #[test]
    fn test_failed_matches_reported() {
        let config = BatchConfig::new("standard", 3).with_focus(99);
        let results = run_batch(config, &standard());
        assert!(results.matches.is_empty());
        assert_eq!(results.errors.len(), 3);
        assert_eq!(results.errors[0].match_index, 0);
    }

    #[test]
    fn test_verify_determinism() {
        assert!(verify_determinism(&standard(), 12345, 3).unwrap());
    }

    #[test]
    fn test_batch_results_save_load() {
        let config = BatchConfig::new("standard", 5);
        let results = run_batch(config, &standard());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");

        results.save(&path).unwrap();
        assert!(path.exists());

        let loaded = BatchResults::load(&path).unwrap();
        assert_eq!(loaded.matches, results.matches);
        assert_eq!(loaded.config.scenario, "standard");
    }
}
