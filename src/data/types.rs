use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

// Normalized, provider-agnostic records handed to the engine.

/// Case-insensitive lookup key for a player name.
pub fn player_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Game identifier from the shot log.
///
/// Integer ids (NHL game ids are) order numerically and sort ahead of any
/// non-integer id; non-integer ids order as strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameId(String);

impl GameId {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw: String = raw.into();
        // Spreadsheet exports turn integer ids into "2025020001.0".
        let trimmed = raw.trim();
        let cleaned = trimmed.strip_suffix(".0").unwrap_or(trimmed);
        Self(cleaned.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl Ord for GameId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for GameId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of the shot log: a player's output in a single game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerGameRecord {
    pub player: String,
    pub team: Option<String>,
    pub game_id: GameId,
    pub shots_on_goal: u32,
    pub goals: Option<u32>,
}

/// A skater on a team's roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub name: String,
    pub team: String,
}

/// Per-goaltender workload row. Numeric cells that were missing or
/// non-numeric in the source are `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalieRow {
    pub goalie: Option<String>,
    pub team: String,
    pub situation: String,
    pub games: Option<f64>,
    pub unblocked_attempts: Option<f64>,
    pub rebounds: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinePairingRow {
    pub label: String,
    pub team: String,
    pub games: Option<f64>,
    pub sog_against: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamPaceRow {
    pub team: String,
    pub corsi_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("matchup `{0}` is not in AWAY@HOME form")]
pub struct ScheduleError(pub String);

/// One scheduled game between two canonical team codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Matchup {
    pub away: String,
    pub home: String,
}

impl Matchup {
    pub fn new(away: impl Into<String>, home: impl Into<String>) -> Self {
        Self {
            away: away.into(),
            home: home.into(),
        }
    }

    pub fn involves(&self, team: &str) -> bool {
        self.away == team || self.home == team
    }

    /// The other side of the matchup, or `None` if `team` isn't playing.
    pub fn opponent_of(&self, team: &str) -> Option<&str> {
        if team == self.away {
            Some(&self.home)
        } else if team == self.home {
            Some(&self.away)
        } else {
            None
        }
    }
}

impl fmt::Display for Matchup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.away, self.home)
    }
}

impl FromStr for Matchup {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (away, home) = s
            .split_once('@')
            .ok_or_else(|| ScheduleError(s.to_string()))?;
        let (away, home) = (away.trim(), home.trim());
        if away.is_empty() || home.is_empty() || away.eq_ignore_ascii_case(home) {
            return Err(ScheduleError(s.to_string()));
        }
        Ok(Self::new(away.to_uppercase(), home.to_uppercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_id_numeric_order() {
        let mut ids = vec![GameId::new("100"), GameId::new("9"), GameId::new("25")];
        ids.sort();
        let order: Vec<&str> = ids.iter().map(GameId::as_str).collect();
        assert_eq!(order, vec!["9", "25", "100"]);
    }

    #[test]
    fn test_game_id_strips_float_suffix() {
        assert_eq!(GameId::new(" 2025020001.0 "), GameId::new("2025020001"));
    }

    #[test]
    fn test_game_id_mixed_falls_back_to_string_order() {
        assert!(GameId::new("G10") < GameId::new("G2"));
        assert!(GameId::new("99") < GameId::new("G1"));
    }

    #[test]
    fn test_matchup_parse() {
        let m: Matchup = "bos@tor".parse().unwrap();
        assert_eq!(m, Matchup::new("BOS", "TOR"));
        assert_eq!(m.to_string(), "BOS@TOR");
        assert_eq!(m.opponent_of("BOS"), Some("TOR"));
        assert_eq!(m.opponent_of("TOR"), Some("BOS"));
        assert_eq!(m.opponent_of("MTL"), None);
    }

    #[test]
    fn test_matchup_parse_rejects_garbage() {
        assert!("BOS-TOR".parse::<Matchup>().is_err());
        assert!("@TOR".parse::<Matchup>().is_err());
        assert!("TOR@tor".parse::<Matchup>().is_err());
    }

    #[test]
    fn test_player_key_case_insensitive() {
        assert_eq!(player_key("  Auston Matthews "), player_key("auston matthews"));
    }
}
