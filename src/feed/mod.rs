pub mod espn;

use crate::data::{Matchup, ScheduleError, TeamCodes};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

/// Source of the slate of games to project.
#[async_trait]
pub trait ScheduleFeed: Send + Sync {
    async fn fetch_matchups(&self, date: Option<NaiveDate>) -> Result<Vec<Matchup>>;
    fn name(&self) -> &'static str;
}

/// Fixed list of matchups, from config or the command line.
#[derive(Debug, Clone, Default)]
pub struct StaticSchedule {
    matchups: Vec<Matchup>,
}

impl StaticSchedule {
    pub fn new(matchups: Vec<Matchup>) -> Self {
        Self { matchups }
    }

    /// Parse `AWAY@HOME` strings, normalizing both sides.
    pub fn parse<S: AsRef<str>>(raw: &[S], codes: &TeamCodes) -> Result<Self, ScheduleError> {
        let matchups = raw
            .iter()
            .map(|s| {
                let m: Matchup = s.as_ref().parse()?;
                let (away, home) = (codes.normalize(&m.away), codes.normalize(&m.home));
                if away == home {
                    return Err(ScheduleError(s.as_ref().to_string()));
                }
                Ok(Matchup::new(away, home))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { matchups })
    }
}

#[async_trait]
impl ScheduleFeed for StaticSchedule {
    async fn fetch_matchups(&self, _date: Option<NaiveDate>) -> Result<Vec<Matchup>> {
        Ok(self.matchups.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_static_schedule_normalizes() {
        let codes = TeamCodes::new(HashMap::from([("LA".to_string(), "LAK".to_string())]));
        let s = StaticSchedule::parse(&["la@vgk", "BOS@TOR"], &codes).unwrap();
        assert_eq!(
            s.matchups,
            vec![Matchup::new("LAK", "VGK"), Matchup::new("BOS", "TOR")]
        );
    }

    #[test]
    fn test_static_schedule_rejects_alias_collision() {
        let codes = TeamCodes::new(HashMap::from([("LA".to_string(), "LAK".to_string())]));
        assert!(StaticSchedule::parse(&["LA@LAK"], &codes).is_err());
    }

    #[tokio::test]
    async fn test_static_feed_returns_list() {
        let feed = StaticSchedule::new(vec![Matchup::new("EDM", "CGY")]);
        let games = feed.fetch_matchups(None).await.unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(feed.name(), "static");
    }
}
