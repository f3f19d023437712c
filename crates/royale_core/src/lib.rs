//! # Royale Core
//!
//! Seeded battle-royale match simulation.
//!
//! A match takes a roster of three-fighter teams through six rounds of
//! respawns, random events and engagements until one champion remains, then
//! derives standings and scores them.
//!
//! This crate contains **only** simulation logic:
//! - No rendering
//! - No IO beyond explicit replay files
//! - No system randomness (one seeded RNG per match)
//!
//! This separation enables:
//! - Headless batch runs
//! - Replay verification
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`data`] - Roster and catalog definitions (RON)
//! - [`combat`] - Engagement resolvers, formulas and fighter AI
//! - [`orchestrator`] - Round loop and match report
//! - [`scheduler`] - Engagement pairing
//! - [`scoring`] - Standings and points
//! - [`replay`] - Recorded matches

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod combat;
pub mod config;
pub mod context;
pub mod data;
pub mod error;
pub mod events;
pub mod fighter;
pub mod lottery;
pub mod orchestrator;
pub mod replay;
pub mod respawn;
pub mod scheduler;
pub mod scoring;
pub mod team;

#[cfg(test)]
mod testing;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::combat::{
        CreditEvent, CreditKind, EngagementOutcome, EngagementResolver, FighterRef,
        FighterResolver, MacroResolver,
    };
    pub use crate::config::{FocusOdds, MatchConfig, ResolverMode, RoundSpec, RoundTable};
    pub use crate::context::{KillLedger, MatchContext, MatchLog, MatchRng};
    pub use crate::data::{
        Catalog, FighterData, FighterId, ItemData, ItemKind, Role, Roster, SkillData,
        SkillEffect, SkillSlot, StatBlock, TeamData, WeaponData,
    };
    pub use crate::error::{MatchError, Result};
    pub use crate::events::{EventKind, EventTable};
    pub use crate::fighter::Fighter;
    pub use crate::orchestrator::{EngagementRecord, Match, MatchReport, RoundSummary};
    pub use crate::replay::MatchReplay;
    pub use crate::scheduler::Pairing;
    pub use crate::scoring::{MatchResultRow, ScoringConfig};
    pub use crate::team::{AreaId, Team, TeamId};
}
