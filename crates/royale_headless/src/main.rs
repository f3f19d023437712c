//! Headless battle-royale match runner.
//!
//! # Usage
//!
//! ```bash
//! # Play one match and print the JSON report
//! cargo run -p royale_headless -- run --seed 7
//!
//! # Play one match and record a replay
//! cargo run -p royale_headless -- run --seed 7 --record match.replay
//!
//! # Run batch balance test
//! cargo run -p royale_headless -- batch --count 1000 --focus 3 --output results/
//!
//! # Verify a recorded replay
//! cargo run -p royale_headless -- replay --file match.replay
//!
//! # Write the built-in scenario out as an editable RON file
//! cargo run -p royale_headless -- export --output scenarios/standard.ron
//! ```
//!
//! Output (stdout): JSON
//! Logs (stderr): human-readable, `RUST_LOG` overrides `--verbose`

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use royale_core::config::ResolverMode;
use royale_core::orchestrator::Match;
use royale_core::replay::MatchReplay;
use royale_core::team::TeamId;
use royale_headless::{
    batch::{run_batch, verify_determinism, BatchConfig},
    scenario::{Scenario, STANDARD_SCENARIO},
};

#[derive(Parser)]
#[command(name = "royale_headless")]
#[command(about = "Headless battle-royale match runner for balance testing and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ResolverArg {
    /// Power-difference resolution
    Macro,
    /// Per-fighter turn simulation
    Fighter,
}

impl From<ResolverArg> for ResolverMode {
    fn from(arg: ResolverArg) -> Self {
        match arg {
            ResolverArg::Macro => ResolverMode::Macro,
            ResolverArg::Fighter => ResolverMode::Fighter,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single match and print its report
    Run {
        /// Scenario name or RON file
        #[arg(short, long, default_value = STANDARD_SCENARIO)]
        scenario: String,

        /// Match seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Resolver override
        #[arg(short, long, value_enum)]
        resolver: Option<ResolverArg>,

        /// Focus team override
        #[arg(short, long)]
        focus: Option<TeamId>,

        /// Save a replay of the match
        #[arg(long)]
        record: Option<PathBuf>,

        /// Print only the result rows
        #[arg(long)]
        brief: bool,
    },

    /// Run batch of matches for balance testing
    Batch {
        /// Scenario name or RON file
        #[arg(short, long, default_value = STANDARD_SCENARIO)]
        scenario: String,

        /// Number of matches to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel matches (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Starting random seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Resolver override
        #[arg(short, long, value_enum)]
        resolver: Option<ResolverArg>,

        /// Focus team override
        #[arg(short, long)]
        focus: Option<TeamId>,
    },

    /// Verify determinism by running same seed multiple times
    Verify {
        /// Scenario name or RON file
        #[arg(short, long, default_value = STANDARD_SCENARIO)]
        scenario: String,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,
    },

    /// Re-run a recorded match and check its hash
    Replay {
        /// Replay file path
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Write the built-in scenario as RON
    Export {
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr, stdout is for JSON
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    match cli.command {
        Commands::Run {
            scenario,
            seed,
            resolver,
            focus,
            record,
            brief,
        } => cmd_run(&scenario, seed, resolver, focus, record, brief),
        Commands::Batch {
            scenario,
            count,
            parallel,
            output,
            seed,
            resolver,
            focus,
        } => cmd_batch(&scenario, count, parallel, output, seed, resolver, focus),
        Commands::Verify {
            scenario,
            seed,
            runs,
        } => cmd_verify(&scenario, seed, runs),
        Commands::Replay { file } => cmd_replay(file),
        Commands::Export { output } => cmd_export(output),
    }
}

fn fail(context: &str, error: impl std::fmt::Display) -> ! {
    tracing::error!(error = %error, "{context}");
    eprintln!("FATAL: {context}: {error}");
    std::process::exit(1);
}

fn load_scenario(name: &str) -> Scenario {
    match Scenario::resolve(name) {
        Ok(s) => s,
        Err(e) => fail("Failed to load scenario", e),
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => fail("Failed to serialize output", e),
    }
}

/// Play a single match
fn cmd_run(
    scenario: &str,
    seed: u64,
    resolver: Option<ResolverArg>,
    focus: Option<TeamId>,
    record: Option<PathBuf>,
    brief: bool,
) {
    let scenario = load_scenario(scenario);
    let mut config = scenario.config_for_seed(seed);
    if let Some(resolver) = resolver {
        config.resolver = resolver.into();
    }
    if focus.is_some() {
        config.focus_team = focus;
    }

    tracing::info!(scenario = %scenario.name, seed, resolver = ?config.resolver, "Starting match");

    let report = if let Some(path) = record {
        let (replay, report) =
            match MatchReplay::record(scenario.name.clone(), scenario.roster, config) {
                Ok(r) => r,
                Err(e) => fail("Match failed", e),
            };
        if let Err(e) = replay.save(&path) {
            fail("Failed to save replay", e);
        }
        eprintln!("Replay saved to: {}", path.display());
        report
    } else {
        match Match::new(&scenario.roster, config).and_then(Match::run) {
            Ok(r) => r,
            Err(e) => fail("Match failed", e),
        }
    };

    if report.abnormal_engagements > 0 {
        tracing::warn!(
            count = report.abnormal_engagements,
            "Engagements hit the tick cap"
        );
    }

    if brief {
        print_json(&report.rows);
    } else {
        print_json(&report);
    }
}

/// Run batch of matches for balance testing
fn cmd_batch(
    scenario_name: &str,
    count: u32,
    parallel: u32,
    output: PathBuf,
    seed: u64,
    resolver: Option<ResolverArg>,
    focus: Option<TeamId>,
) {
    let scenario = load_scenario(scenario_name);

    if let Err(e) = std::fs::create_dir_all(&output) {
        fail("Cannot create output directory", e);
    }

    let config = BatchConfig {
        scenario: scenario_name.to_string(),
        match_count: count,
        parallel_matches: parallel,
        output_dir: output.clone(),
        seed_start: seed,
        resolver: resolver.map(Into::into),
        focus_team: focus,
    };

    let results = run_batch(config, &scenario);

    let results_path = output.join("batch_results.json");
    if let Err(e) = results.save(&results_path) {
        fail("Failed to save results", e);
    }

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Matches played: {}", results.matches.len());
    if !results.errors.is_empty() {
        eprintln!("Matches FAILED: {}", results.errors.len());
    }
    eprintln!("Duration: {:.1}s", results.duration_seconds);
    eprintln!("Abnormal engagements: {}", summary.abnormal_engagements);
    if let Some((team, wins)) = summary.top_team() {
        eprintln!("Most championships: team {team} ({wins})");
    }
    if let (Some(team), Some(avg)) = (summary.focus_team, summary.focus_avg_placement) {
        eprintln!("\nFocus team {team}: mean placement {avg:.2}");
        for (placement, n) in &summary.focus_placements {
            eprintln!("  #{placement:<2} {n}");
        }
    }

    for error in results.errors.iter().take(10) {
        eprintln!(
            "  Match {} (seed {}): {}",
            error.match_index, error.seed, error.message
        );
    }

    eprintln!("\nResults saved to: {}", results_path.display());
    print_json(summary);
}

/// Verify determinism
fn cmd_verify(scenario: &str, seed: u64, runs: u32) {
    let scenario = load_scenario(scenario);
    tracing::info!(scenario = %scenario.name, seed, runs, "Verifying determinism");

    match verify_determinism(&scenario, seed, runs) {
        Ok(true) => eprintln!("PASS: All {runs} runs produced identical results"),
        Ok(false) => {
            eprintln!("FAIL: Non-determinism detected!");
            std::process::exit(1);
        }
        Err(e) => fail("Match failed", e),
    }
}

/// Re-run a recorded match
fn cmd_replay(file: PathBuf) {
    tracing::info!("Verifying replay: {}", file.display());

    let replay = match MatchReplay::load(&file) {
        Ok(r) => r,
        Err(e) => fail("Failed to load replay", e),
    };

    eprintln!("Loaded replay:");
    eprintln!("  Scenario: {}", replay.scenario_id);
    eprintln!("  Seed: {}", replay.seed());
    eprintln!("  Teams: {}", replay.roster.teams.len());
    eprintln!("  Champion: {}", replay.champion);

    match replay.verify() {
        Ok(true) => {
            eprintln!("PASS: Replay verification successful");
            eprintln!("  Hash: {:016x}", replay.final_hash);
        }
        Ok(false) => {
            eprintln!("FAIL: Replay produced a different outcome!");
            eprintln!("  Expected: {:016x}", replay.final_hash);
            std::process::exit(1);
        }
        Err(e) => fail("Error during verification", e),
    }
}

/// Write the built-in scenario out
fn cmd_export(output: PathBuf) {
    let scenario = load_scenario(STANDARD_SCENARIO);
    if let Err(e) = scenario.save(&output) {
        fail("Failed to write scenario", e);
    }
    eprintln!("Scenario written to: {}", output.display());
}
