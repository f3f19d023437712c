//! Error types for the match simulation.

use thiserror::Error;

use crate::team::TeamId;

/// Result type alias using [`MatchError`].
pub type Result<T> = std::result::Result<T, MatchError>;

/// Top-level error type for all match simulation errors.
#[derive(Debug, Error)]
pub enum MatchError {
    /// An engagement was requested with fewer than two teams.
    #[error("Engagement needs at least 2 teams, got {0}")]
    NotEnoughTeams(usize),

    /// An engagement was requested with more teams than the resolver supports.
    #[error("Engagement supports at most 3 teams, got {0}")]
    TooManyTeams(usize),

    /// A participant has no living fighter.
    #[error("Team {0} has no living fighters")]
    NoLivingFighters(TeamId),

    /// Referenced team does not exist in this match.
    #[error("Team not found: {0}")]
    TeamNotFound(TeamId),

    /// A numeric stat is non-finite or out of its legal range.
    #[error("Invalid stat '{stat}' on fighter '{fighter}': {value}")]
    InvalidStat {
        /// Fighter identifier.
        fighter: String,
        /// Stat name.
        stat: &'static str,
        /// Offending value.
        value: f64,
    },

    /// Content references a catalog entry that does not exist.
    #[error("Unknown {kind} '{id}' referenced by '{owner}'")]
    UnknownReference {
        /// Catalog section (weapon, item, skill).
        kind: &'static str,
        /// Missing identifier.
        id: String,
        /// Who referenced it.
        owner: String,
    },

    /// Content is structurally invalid.
    #[error("Invalid content: {0}")]
    InvalidContent(String),

    /// The round table cannot produce a legal match.
    #[error("Invalid round table: {0}")]
    InvalidRoundTable(String),

    /// A match configuration value is out of range.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Failed to parse a RON document.
    #[error("Failed to parse {what}: {message}")]
    Parse {
        /// What was being parsed.
        what: &'static str,
        /// Parser message.
        message: String,
    },

    /// Replay could not be written or read.
    #[error("Replay IO failed: {0}")]
    ReplayIo(String),

    /// Replay recorded with an incompatible format version.
    #[error("Replay version mismatch: expected {expected}, got {found}")]
    ReplayVersion {
        /// Version this build understands.
        expected: u32,
        /// Version found in the file.
        found: u32,
    },

    /// Invalid match state.
    #[error("Invalid match state: {0}")]
    InvalidState(String),
}
