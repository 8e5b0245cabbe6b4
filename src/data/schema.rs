//! Declared column mappings for each input table.
//!
//! Exports arrive with inconsistent headers ("Player Name", " TEAM ", "game_id").
//! Each table's required columns are resolved here, once, against the
//! normalized header row; loaders then read cells by index into typed records.

use super::error::IngestError;

/// Header row normalized to lowercase, whitespace-trimmed names.
#[derive(Debug, Clone)]
pub struct Headers {
    names: Vec<String>,
}

impl Headers {
    pub fn new<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: raw
                .into_iter()
                .map(|h| normalize_header(h.as_ref()))
                .collect(),
        }
    }

    pub fn from_record(record: &csv::StringRecord) -> Self {
        Self::new(record.iter())
    }

    /// Index of the column whose normalized name is exactly `name`.
    pub fn exact(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|h| h == name)
    }

    /// Index of the first column matching `pred`.
    pub fn find(&self, pred: impl Fn(&str) -> bool) -> Option<usize> {
        self.names.iter().position(|h| pred(h))
    }
}

pub fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_lowercase()
}

fn require(
    table: &'static str,
    column: &'static str,
    idx: Option<usize>,
) -> Result<usize, IngestError> {
    idx.ok_or(IngestError::MissingColumn { table, column })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterColumns {
    pub team: usize,
    pub name: usize,
}

impl RosterColumns {
    pub const TABLE: &'static str = "roster";

    pub fn resolve(h: &Headers) -> Result<Self, IngestError> {
        Ok(Self {
            team: require(Self::TABLE, "team", h.find(|c| c.contains("team")))?,
            name: require(Self::TABLE, "name", h.exact("name"))?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShotColumns {
    pub player: usize,
    pub game_id: usize,
    pub sog: usize,
    pub goal: Option<usize>,
    pub team: Option<usize>,
}

impl ShotColumns {
    pub const TABLE: &'static str = "shot log";

    pub fn resolve(h: &Headers) -> Result<Self, IngestError> {
        Ok(Self {
            player: require(
                Self::TABLE,
                "player",
                h.find(|c| c.contains("player") || c.contains("name")),
            )?,
            game_id: require(
                Self::TABLE,
                "game id",
                h.find(|c| c.contains("game") && c.contains("id")),
            )?,
            sog: require(Self::TABLE, "sog", h.exact("sog"))?,
            goal: h.exact("goal").or_else(|| h.exact("goals")),
            team: h.exact("team"),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GoalieColumns {
    pub team: usize,
    pub situation: usize,
    pub games: usize,
    pub unblocked_attempts: usize,
    pub rebounds: Option<usize>,
    pub name: Option<usize>,
}

impl GoalieColumns {
    pub const TABLE: &'static str = "goaltending";

    pub fn resolve(h: &Headers) -> Result<Self, IngestError> {
        Ok(Self {
            team: require(Self::TABLE, "team", h.exact("team"))?,
            situation: require(Self::TABLE, "situation", h.exact("situation"))?,
            games: require(Self::TABLE, "games", h.exact("games"))?,
            unblocked_attempts: require(
                Self::TABLE,
                "unblocked attempts",
                h.exact("unblocked attempts"),
            )?,
            rebounds: h.exact("rebounds"),
            name: h.exact("name"),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineColumns {
    pub label: usize,
    pub team: usize,
    pub games: usize,
    pub sog_against: usize,
}

impl LineColumns {
    pub const TABLE: &'static str = "line pairings";

    pub fn resolve(h: &Headers) -> Result<Self, IngestError> {
        Ok(Self {
            label: require(Self::TABLE, "line pairings", h.exact("line pairings"))?,
            team: require(Self::TABLE, "team", h.exact("team"))?,
            games: require(Self::TABLE, "games", h.exact("games"))?,
            sog_against: require(Self::TABLE, "sog against", h.exact("sog against"))?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaceColumns {
    pub team: usize,
    pub possession: usize,
}

impl PaceColumns {
    pub const TABLE: &'static str = "team pace";

    pub fn resolve(h: &Headers) -> Result<Self, IngestError> {
        let possession = h
            .exact("corsi%")
            .or_else(|| h.exact("cf%"))
            .or_else(|| h.find(|c| c.contains("corsi")));
        Ok(Self {
            team: require(Self::TABLE, "team", h.exact("team"))?,
            possession: require(Self::TABLE, "corsi%", possession)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_normalized() {
        let h = Headers::new(["\u{feff}Name", "  TEAM Abbrev "]);
        assert_eq!(h.exact("name"), Some(0));
        assert_eq!(h.exact("team abbrev"), Some(1));
    }

    #[test]
    fn test_roster_team_column_by_substring() {
        let h = Headers::new(["Name", "Position", "Current Team"]);
        let cols = RosterColumns::resolve(&h).unwrap();
        assert_eq!(cols, RosterColumns { team: 2, name: 0 });
    }

    #[test]
    fn test_roster_requires_exact_name() {
        let h = Headers::new(["Player Name", "Team"]);
        let err = RosterColumns::resolve(&h).unwrap_err();
        assert!(matches!(
            err,
            IngestError::MissingColumn { table: "roster", column: "name" }
        ));
    }

    #[test]
    fn test_shot_columns_discovery() {
        let h = Headers::new(["Player", "Game ID", "SOG", "Goal", "Date"]);
        let cols = ShotColumns::resolve(&h).unwrap();
        assert_eq!(cols.player, 0);
        assert_eq!(cols.game_id, 1);
        assert_eq!(cols.sog, 2);
        assert_eq!(cols.goal, Some(3));
        assert_eq!(cols.team, None);
    }

    #[test]
    fn test_shot_columns_missing_game_id() {
        let h = Headers::new(["player", "game", "sog"]);
        assert!(matches!(
            ShotColumns::resolve(&h),
            Err(IngestError::MissingColumn { column: "game id", .. })
        ));
    }

    #[test]
    fn test_pace_accepts_equivalent_metric() {
        let h = Headers::new(["Team", "CF%"]);
        assert_eq!(PaceColumns::resolve(&h).unwrap().possession, 1);
    }
}
