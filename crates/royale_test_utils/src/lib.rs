//! # Royale Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Determinism test harness
//! - Standard 20-team field and hand-built fighters
//! - Win-rate statistics for stochastic checks
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod balance;
pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
