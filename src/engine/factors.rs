//! Bounded multiplicative context factors.
//!
//! Every factor is a ratio against the league mean of the current tables,
//! clipped to its band afterwards. Absent or unusable inputs yield a neutral
//! 1.0 tagged [`FactorSource::Degraded`].

use super::lines::LineIndex;
use crate::data::types::{GoalieRow, TeamPaceRow};
use crate::data::Dataset;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

pub const NEUTRAL: f64 = 1.0;
pub const TEAM_FACTOR_BAND: (f64, f64) = (0.7, 1.3);
pub const PACE_FACTOR_BAND: (f64, f64) = (0.92, 1.08);

const GOALIE_SITUATION: &str = "all";

/// `numer / denom` clipped to `band`. `None` if the ratio is undefined.
pub fn bounded_ratio(numer: f64, denom: f64, band: (f64, f64)) -> Option<f64> {
    if !numer.is_finite() || !denom.is_finite() || denom <= 0.0 || numer < 0.0 {
        return None;
    }
    Some((numer / denom).clamp(band.0, band.1))
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FactorSource {
    Computed,
    /// Valid inputs, but nothing applied to this player (no line match).
    Unmatched,
    Degraded,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FactorValue {
    pub value: f64,
    pub source: FactorSource,
}

impl FactorValue {
    pub fn computed(value: f64) -> Self {
        Self {
            value,
            source: FactorSource::Computed,
        }
    }

    pub fn unmatched() -> Self {
        Self {
            value: NEUTRAL,
            source: FactorSource::Unmatched,
        }
    }

    pub fn degraded() -> Self {
        Self {
            value: NEUTRAL,
            source: FactorSource::Degraded,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.source == FactorSource::Degraded
    }

    fn from_option(value: Option<f64>) -> Self {
        value.map_or_else(Self::degraded, Self::computed)
    }
}

/// Per-team metric averaged from unit-level values, plus the league mean of
/// those team averages.
#[derive(Debug, Clone)]
pub struct TeamMetricTable {
    per_team: HashMap<String, f64>,
    league_mean: f64,
}

impl TeamMetricTable {
    pub fn from_units(units: HashMap<String, Vec<f64>>) -> Option<Self> {
        let per_team: HashMap<String, f64> = units
            .into_iter()
            .filter_map(|(team, values)| mean(&values).map(|m| (team, m)))
            .collect();
        let team_means: Vec<f64> = per_team.values().copied().collect();
        let league_mean = mean(&team_means)?;
        if !league_mean.is_finite() || league_mean <= 0.0 {
            return None;
        }
        Some(Self {
            per_team,
            league_mean,
        })
    }

    pub fn get(&self, team: &str) -> Option<f64> {
        self.per_team.get(team).copied()
    }

    pub fn league_mean(&self) -> f64 {
        self.league_mean
    }
}

/// Shots-allowed pressure of each team's goaltending.
#[derive(Debug, Clone)]
pub struct GoalieFactors {
    table: TeamMetricTable,
}

impl GoalieFactors {
    pub fn from_rows(rows: &[GoalieRow]) -> Option<Self> {
        let mut units: HashMap<String, Vec<f64>> = HashMap::new();
        for row in rows {
            if row.situation != GOALIE_SITUATION {
                continue;
            }
            let (Some(games), Some(attempts)) = (row.games, row.unblocked_attempts) else {
                continue;
            };
            if games <= 0.0 || attempts < 0.0 {
                continue;
            }
            units
                .entry(row.team.clone())
                .or_default()
                .push(attempts / games);
        }
        TeamMetricTable::from_units(units).map(|table| Self { table })
    }

    /// Team's unblocked attempts allowed per game over the league mean:
    /// stingier goaltending gives a factor below 1.
    pub fn factor(&self, team: &str) -> Option<f64> {
        let value = self.table.get(team)?;
        bounded_ratio(value, self.table.league_mean(), TEAM_FACTOR_BAND)
    }
}

#[derive(Debug, Clone)]
pub struct PaceFactors {
    table: TeamMetricTable,
}

impl PaceFactors {
    pub fn from_rows(rows: &[TeamPaceRow]) -> Option<Self> {
        let mut units: HashMap<String, Vec<f64>> = HashMap::new();
        for row in rows {
            if let Some(cp) = row.corsi_pct.filter(|v| *v >= 0.0) {
                units.entry(row.team.clone()).or_default().push(cp);
            }
        }
        TeamMetricTable::from_units(units).map(|table| Self { table })
    }

    /// Mean possession of both sides relative to the league mean.
    pub fn matchup_factor(&self, team: &str, opponent: &str) -> Option<f64> {
        let combined = (self.table.get(team)? + self.table.get(opponent)?) / 2.0;
        bounded_ratio(combined, self.table.league_mean(), PACE_FACTOR_BAND)
    }

    pub fn team_factor(&self, team: &str) -> Option<f64> {
        bounded_ratio(self.table.get(team)?, self.table.league_mean(), PACE_FACTOR_BAND)
    }
}

/// Team-level factor bundle, for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TeamContextFactors {
    pub goalie_factor: FactorValue,
    pub line_factor: FactorValue,
    pub pace_factor: FactorValue,
}

/// All context factors derived from one dataset.
#[derive(Debug, Clone, Default)]
pub struct ContextFactors {
    goalies: Option<GoalieFactors>,
    lines: Option<LineIndex>,
    pace: Option<PaceFactors>,
}

impl ContextFactors {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let goalies = dataset.goalies.as_deref().and_then(|rows| {
            let built = GoalieFactors::from_rows(rows);
            if built.is_none() {
                warn!(rows = rows.len(), "no usable all-situation goalie rows; goalie factor neutral");
            }
            built
        });
        let lines = dataset.lines.as_deref().and_then(|rows| {
            let built = LineIndex::from_rows(rows);
            if built.is_none() {
                warn!(rows = rows.len(), "no usable line pairing rows; line factor neutral");
            }
            built
        });
        let pace = dataset.teams.as_deref().and_then(|rows| {
            let built = PaceFactors::from_rows(rows);
            if built.is_none() {
                warn!(rows = rows.len(), "no usable possession rows; pace factor neutral");
            }
            built
        });
        debug!(
            goalie = goalies.is_some(),
            line = lines.is_some(),
            pace = pace.is_some(),
            "context factors built"
        );
        Self {
            goalies,
            lines,
            pace,
        }
    }

    pub fn goalie(&self, opponent: &str) -> FactorValue {
        FactorValue::from_option(self.goalies.as_ref().and_then(|g| g.factor(opponent)))
    }

    pub fn line(&self, player: &str, team: &str) -> FactorValue {
        match &self.lines {
            None => FactorValue::degraded(),
            Some(idx) => match idx.resolve(player, team).factor {
                Some(f) => FactorValue::computed(f),
                None => FactorValue::unmatched(),
            },
        }
    }

    pub fn pace(&self, team: &str, opponent: &str) -> FactorValue {
        FactorValue::from_option(
            self.pace
                .as_ref()
                .and_then(|p| p.matchup_factor(team, opponent)),
        )
    }

    pub fn team(&self, team: &str) -> TeamContextFactors {
        TeamContextFactors {
            goalie_factor: self.goalie(team),
            line_factor: FactorValue::from_option(
                self.lines.as_ref().and_then(|l| l.team_factor(team)),
            ),
            pace_factor: FactorValue::from_option(
                self.pace.as_ref().and_then(|p| p.team_factor(team)),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goalie(team: &str, situation: &str, games: f64, attempts: f64) -> GoalieRow {
        GoalieRow {
            goalie: None,
            team: team.to_string(),
            situation: situation.to_string(),
            games: Some(games),
            unblocked_attempts: Some(attempts),
            rebounds: Some(0.0),
        }
    }

    fn pace(team: &str, cp: f64) -> TeamPaceRow {
        TeamPaceRow {
            team: team.to_string(),
            corsi_pct: Some(cp),
        }
    }

    #[test]
    fn test_bounded_ratio_clips_after_division() {
        assert_eq!(bounded_ratio(50.0, 100.0, TEAM_FACTOR_BAND), Some(0.7));
        assert_eq!(bounded_ratio(300.0, 100.0, TEAM_FACTOR_BAND), Some(1.3));
        assert_eq!(bounded_ratio(1.1, 1.0, TEAM_FACTOR_BAND), Some(1.1));
        assert_eq!(bounded_ratio(1.0, 0.0, TEAM_FACTOR_BAND), None);
        assert_eq!(bounded_ratio(f64::NAN, 1.0, TEAM_FACTOR_BAND), None);
    }

    #[test]
    fn test_goalie_factor_at_league_mean_is_one() {
        // Team means: BOS 30, TOR (20+40)/2 = 30 -> league mean 30.
        let g = GoalieFactors::from_rows(&[
            goalie("BOS", "all", 10.0, 300.0),
            goalie("TOR", "all", 10.0, 200.0),
            goalie("TOR", "all", 5.0, 200.0),
            goalie("TOR", "5on5", 1.0, 9999.0),
        ])
        .unwrap();
        assert_eq!(g.factor("BOS"), Some(1.0));
        assert_eq!(g.factor("TOR"), Some(1.0));
        assert_eq!(g.factor("MTL"), None);
    }

    #[test]
    fn test_goalie_stingy_team_below_one() {
        // BOS 24/gp, TOR 36/gp, league 30.
        let g = GoalieFactors::from_rows(&[
            goalie("BOS", "all", 10.0, 240.0),
            goalie("TOR", "all", 10.0, 360.0),
        ])
        .unwrap();
        assert!((g.factor("BOS").unwrap() - 0.8).abs() < 1e-12);
        assert!((g.factor("TOR").unwrap() - 1.2).abs() < 1e-12);
    }

    #[test]
    fn test_goalie_zero_games_skipped() {
        assert!(GoalieFactors::from_rows(&[goalie("BOS", "all", 0.0, 100.0)]).is_none());
    }

    #[test]
    fn test_pace_matchup_factor() {
        let p = PaceFactors::from_rows(&[pace("BOS", 55.0), pace("TOR", 50.0), pace("MTL", 45.0)])
            .unwrap();
        // (55 + 50) / 2 / 50 = 1.05
        assert!((p.matchup_factor("BOS", "TOR").unwrap() - 1.05).abs() < 1e-12);
        // 55 / 50 = 1.1 -> clipped
        assert_eq!(p.team_factor("BOS"), Some(1.08));
        assert_eq!(p.matchup_factor("BOS", "SEA"), None);
    }

    #[test]
    fn test_missing_tables_degrade_to_neutral() {
        let ctx = ContextFactors::from_dataset(&Dataset::default());
        for f in [ctx.goalie("BOS"), ctx.line("Brad Marchand", "BOS"), ctx.pace("BOS", "TOR")] {
            assert_eq!(f.value, NEUTRAL);
            assert!(f.is_degraded());
        }
    }

    #[test]
    fn test_unknown_team_degrades() {
        let ds = Dataset {
            goalies: Some(vec![goalie("BOS", "all", 10.0, 300.0)]),
            ..Dataset::default()
        };
        let ctx = ContextFactors::from_dataset(&ds);
        assert_eq!(ctx.goalie("BOS"), FactorValue::computed(1.0));
        assert!(ctx.goalie("TOR").is_degraded());
    }
}
