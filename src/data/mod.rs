pub mod error;
pub mod loader;
pub mod schema;
pub mod teams;
pub mod types;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

pub use error::IngestError;
pub use teams::TeamCodes;
pub use types::{
    GameId, GoalieRow, LinePairingRow, Matchup, PlayerGameRecord, RosterEntry, ScheduleError,
    TeamPaceRow,
};

/// Immutable snapshot of every table for one run.
///
/// Context tables are `None` when their source was absent or unusable; the
/// factor engine treats that as "neutral, degraded".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub roster: Vec<RosterEntry>,
    pub shots: Vec<PlayerGameRecord>,
    pub goalies: Option<Vec<GoalieRow>>,
    pub lines: Option<Vec<LinePairingRow>>,
    pub teams: Option<Vec<TeamPaceRow>>,
}

/// Content identifier of a [`Dataset`]: hex SHA-256 of its JSON form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DatasetVersion(String);

impl DatasetVersion {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for DatasetVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Dataset {
    pub fn version(&self) -> DatasetVersion {
        let mut hasher = Sha256::new();
        // Plain data; serialization cannot fail.
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hasher.update(&bytes);
        DatasetVersion(format!("{:x}", hasher.finalize()))
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty() || self.shots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset {
            roster: vec![RosterEntry {
                name: "Brad Marchand".into(),
                team: "BOS".into(),
            }],
            shots: vec![PlayerGameRecord {
                player: "Brad Marchand".into(),
                team: Some("BOS".into()),
                game_id: GameId::new("1"),
                shots_on_goal: 3,
                goals: Some(0),
            }],
            goalies: None,
            lines: None,
            teams: None,
        }
    }

    #[test]
    fn test_version_is_stable() {
        assert_eq!(sample().version(), sample().version());
        assert_eq!(sample().version().as_str().len(), 64);
    }

    #[test]
    fn test_version_changes_with_content() {
        let mut changed = sample();
        changed.shots[0].shots_on_goal = 4;
        assert_ne!(sample().version(), changed.version());
    }
}
