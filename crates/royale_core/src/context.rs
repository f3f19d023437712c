//! Explicit per-match context threaded through every phase.
//!
//! Holds the only RNG a match draws from, the kill ledger (single writer of
//! kill/assist credit) and the human-readable match log.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::combat::{CreditEvent, CreditKind};
use crate::error::{MatchError, Result};
use crate::team::{Team, TeamId};

/// RNG used for whole matches.
pub type MatchRng = ChaCha8Rng;

/// One credit event as recorded by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Round it was earned in.
    pub round: u8,
    /// The credit.
    pub credit: CreditEvent,
}

/// Append-only record of every kill and assist point awarded.
///
/// Applying credit through the ledger updates the team tally and the
/// member tally together, so the two can never drift apart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillLedger {
    entries: Vec<LedgerEntry>,
}

impl KillLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record credits and apply them to the field.
    ///
    /// # Errors
    ///
    /// Credit for a team or fighter that is not in the field. Nothing is
    /// applied when any credit is invalid.
    pub fn apply(&mut self, teams: &mut [Team], round: u8, credits: &[CreditEvent]) -> Result<()> {
        let mut targets = Vec::with_capacity(credits.len());
        for credit in credits {
            let team = teams
                .iter()
                .position(|t| t.id == credit.by.team)
                .ok_or(MatchError::TeamNotFound(credit.by.team))?;
            let fighter = teams[team]
                .fighters
                .iter()
                .position(|f| f.id == credit.by.fighter)
                .ok_or_else(|| {
                    MatchError::InvalidState(format!(
                        "fighter {} is not on team {}",
                        credit.by.fighter, credit.by.team
                    ))
                })?;
            targets.push((team, fighter));
        }

        for (credit, (team, fighter)) in credits.iter().zip(targets) {
            let team = &mut teams[team];
            let member = &mut team.fighters[fighter];
            match credit.kind {
                CreditKind::Kill => {
                    team.points.kp += credit.points;
                    member.kill_points += credit.points;
                }
                CreditKind::Assist => {
                    team.points.ap += credit.points;
                    member.assist_points += credit.points;
                }
            }
            self.entries.push(LedgerEntry {
                round,
                credit: *credit,
            });
        }
        Ok(())
    }

    /// Every entry, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Points of one kind credited to a team.
    #[must_use]
    pub fn team_total(&self, team: TeamId, kind: CreditKind) -> u32 {
        self.entries
            .iter()
            .filter(|e| e.credit.by.team == team && e.credit.kind == kind)
            .map(|e| e.credit.points)
            .sum()
    }

    /// Check every team's tallies against its members and the ledger.
    pub fn audit(&self, teams: &[Team]) -> Result<()> {
        for team in teams {
            let kp = self.team_total(team.id, CreditKind::Kill);
            let ap = self.team_total(team.id, CreditKind::Assist);
            if team.points.kp != kp
                || team.points.ap != ap
                || team.member_kill_points() != kp
                || team.member_assist_points() != ap
            {
                return Err(MatchError::InvalidState(format!(
                    "credit mismatch on team {}: team {}/{}, members {}/{}, ledger {kp}/{ap}",
                    team.id,
                    team.points.kp,
                    team.points.ap,
                    team.member_kill_points(),
                    team.member_assist_points()
                )));
            }
        }
        Ok(())
    }
}

/// One line of the match log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    /// Round (0 = landing).
    pub round: u8,
    /// Text.
    pub text: String,
}

/// Ordered human-readable match log for UI playback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchLog {
    lines: Vec<LogLine>,
}

impl MatchLog {
    /// Append one line.
    pub fn push(&mut self, round: u8, text: impl Into<String>) {
        self.lines.push(LogLine {
            round,
            text: text.into(),
        });
    }

    /// Append many lines for the same round.
    pub fn extend<I>(&mut self, round: u8, lines: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.lines
            .extend(lines.into_iter().map(|text| LogLine { round, text }));
    }

    /// All lines in order.
    #[must_use]
    pub fn lines(&self) -> &[LogLine] {
        &self.lines
    }

    /// Number of lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Plain text lines, in order.
    #[must_use]
    pub fn to_strings(&self) -> Vec<String> {
        self.lines.iter().map(|l| l.text.clone()).collect()
    }
}

/// Mutable state shared by every phase of one match.
#[derive(Debug, Clone)]
pub struct MatchContext {
    /// The match RNG.
    pub rng: MatchRng,
    /// Kill/assist ledger.
    pub ledger: KillLedger,
    /// Human-readable log.
    pub log: MatchLog,
}

impl MatchContext {
    /// Fresh context seeded for a match.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: MatchRng::seed_from_u64(seed),
            ledger: KillLedger::new(),
            log: MatchLog::default(),
        }
    }
}
