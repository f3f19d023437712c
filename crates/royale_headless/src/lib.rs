//! Headless match runner for balance testing and CI verification.
//!
//! Plays matches without any UI. Reports go to stdout as JSON, logs go to
//! stderr. This enables:
//!
//! - **Balance batches**: thousands of seeded matches in parallel
//! - **CI verification**: same seed, same result
//! - **Replay verification**: recorded matches re-run to the same hash
//!
//! # Example
//!
//! ```bash
//! # Play the built-in 20-team scenario once
//! cargo run -p royale_headless -- run --seed 7 --resolver fighter
//!
//! # Run a batch and summarise the focus team's placements
//! cargo run -p royale_headless -- batch --count 1000 --focus 3 --output results/
//!
//! # Verify determinism
//! cargo run -p royale_headless -- verify --seed 12345 --runs 5
//! ```

pub mod batch;
pub mod metrics;
pub mod scenario;

pub use batch::{run_batch, run_single_match, BatchConfig, BatchResults};
pub use metrics::{BatchSummary, MatchMetrics};
pub use scenario::{Scenario, ScenarioError};
