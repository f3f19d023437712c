//! Replay records for finished matches.
//!
//! A match is a pure function of its roster, config and seed, so a replay
//! only stores those inputs plus the final state hash and champion. Playing
//! it back re-runs the match and compares hashes.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::MatchConfig;
use crate::data::Roster;
use crate::error::{MatchError, Result};
use crate::orchestrator::{Match, MatchReport};
use crate::team::TeamId;

/// Replay file format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// Everything needed to reproduce one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReplay {
    /// Replay format version.
    pub version: u32,
    /// Scenario identifier or name.
    pub scenario_id: String,
    /// Content the match was played with.
    pub roster: Roster,
    /// Configuration, seed included.
    pub config: MatchConfig,
    /// Champion of the recorded run.
    pub champion: TeamId,
    /// Final state hash of the recorded run.
    pub final_hash: u64,
}

impl MatchReplay {
    /// Play a match and record it.
    ///
    /// # Errors
    ///
    /// Whatever the match itself rejects.
    pub fn record(
        scenario_id: impl Into<String>,
        roster: Roster,
        config: MatchConfig,
    ) -> Result<(Self, MatchReport)> {
        let report = Match::new(&roster, config.clone())?.run()?;
        let replay = Self {
            version: REPLAY_VERSION,
            scenario_id: scenario_id.into(),
            roster,
            config,
            champion: report.champion,
            final_hash: report.state_hash,
        };
        Ok((replay, report))
    }

    /// Seed of the recorded match.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.config.seed
    }

    /// Re-run the recorded match.
    pub fn play(&self) -> Result<MatchReport> {
        Match::new(&self.roster, self.config.clone())?.run()
    }

    /// Re-run and check the outcome matches the recording.
    ///
    /// # Errors
    ///
    /// The match could not be re-run.
    pub fn verify(&self) -> Result<bool> {
        let report = self.play()?;
        let matches = report.state_hash == self.final_hash && report.champion == self.champion;
        if !matches {
            tracing::warn!(
                scenario = %self.scenario_id,
                seed = self.seed(),
                expected = self.final_hash,
                found = report.state_hash,
                "Replay diverged"
            );
        }
        Ok(matches)
    }

    /// Serialize with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| MatchError::ReplayIo(format!("Failed to serialize replay: {e}")))
    }

    /// Deserialize with bincode, checking the format version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let replay: Self = bincode::deserialize(bytes)
            .map_err(|e| MatchError::ReplayIo(format!("Failed to deserialize replay: {e}")))?;

        if replay.version != REPLAY_VERSION {
            return Err(MatchError::ReplayVersion {
                expected: REPLAY_VERSION,
                found: replay.version,
            });
        }
        Ok(replay)
    }

    /// Save the replay to a file.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), bytes)
            .map_err(|e| MatchError::ReplayIo(format!("Failed to write replay file: {e}")))
    }

    /// Load a replay from a file.
    ///
    /// # Errors
    /// Returns an error if file reading, deserialization or the version
    /// check fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| MatchError::ReplayIo(format!("Failed to read replay file: {e}")))?;
        Self::from_bytes(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolverMode;
    use crate::testing::roster;

    #[test]
    fn test_replay_record() {
        let (replay, report) =
            MatchReplay::record("unit", roster(20), MatchConfig::with_seed(12345)).unwrap();
        assert_eq!(replay.version, REPLAY_VERSION);
        assert_eq!(replay.seed(), 12345);
        assert_eq!(replay.final_hash, report.state_hash);
        assert_eq!(replay.champion, report.champion);
    }

    #[test]
    fn test_replay_save_load() {
        let config = MatchConfig::with_seed(9).with_resolver(ResolverMode::Fighter);
        let (replay, _) = MatchReplay::record("unit", roster(20), config).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("match.replay");
        replay.save(&path).unwrap();

        let loaded = MatchReplay::load(&path).unwrap();
        assert_eq!(loaded, replay);
        assert!(loaded.verify().unwrap());
    }

    #[test]
    fn test_replay_version_mismatch() {
        let (mut replay, _) =
            MatchReplay::record("unit", roster(20), MatchConfig::with_seed(1)).unwrap();
        replay.version = REPLAY_VERSION + 1;
        let bytes = replay.to_bytes().unwrap();
        assert!(matches!(
            MatchReplay::from_bytes(&bytes),
            Err(MatchError::ReplayVersion { found, .. }) if found == REPLAY_VERSION + 1
        ));
    }

    #[test]
    fn test_tampered_replay_fails_verification() {
        let (mut replay, _) =
            MatchReplay::record("unit", roster(20), MatchConfig::with_seed(4)).unwrap();
        replay.final_hash ^= 1;
        assert!(!replay.verify().unwrap());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            MatchReplay::load(dir.path().join("absent.replay")),
            Err(MatchError::ReplayIo(_))
        ));
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        assert!(MatchReplay::from_bytes(&[1, 2, 3]).is_err());
    }
}
