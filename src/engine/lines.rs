//! Line-pairing deployment factors and surname resolution.
//!
//! Pairing labels are free text ("McAvoy - Lindholm"), so a skater is tied
//! to pairings by a case-insensitive substring match on their surname. The
//! match is fuzzy; callers get the matched labels back and fall back to a
//! neutral factor when nothing matches.

use super::factors::{bounded_ratio, TeamMetricTable, TEAM_FACTOR_BAND};
use crate::data::types::LinePairingRow;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq)]
pub struct Pairing {
    pub label: String,
    pub team: String,
    pub games: f64,
    pub sog_against: f64,
    /// `None` when the pairing has no games on record.
    pub factor: Option<f64>,
    label_lower: String,
}

impl Pairing {
    pub fn sog_against_per_game(&self) -> Option<f64> {
        (self.games > 0.0).then(|| self.sog_against / self.games)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineResolution {
    pub matched: Vec<String>,
    /// Games-weighted factor over matched pairings, clipped.
    pub factor: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct LineIndex {
    pairings: Vec<Pairing>,
    table: TeamMetricTable,
}

/// Lower-cased last whitespace-separated token of a player name.
pub fn surname(player: &str) -> Option<String> {
    player.split_whitespace().last().map(str::to_lowercase)
}

impl LineIndex {
    /// Sums duplicate (label, team) rows, then rates each pairing as
    /// league mean / its shots against per game.
    pub fn from_rows(rows: &[LinePairingRow]) -> Option<Self> {
        let mut summed: BTreeMap<(String, String), (f64, f64)> = BTreeMap::new();
        for row in rows {
            let entry = summed
                .entry((row.label.clone(), row.team.clone()))
                .or_insert((0.0, 0.0));
            entry.0 += row.games.filter(|g| *g >= 0.0).unwrap_or(0.0);
            entry.1 += row.sog_against.filter(|s| *s >= 0.0).unwrap_or(0.0);
        }

        let mut pairings: Vec<Pairing> = summed
            .into_iter()
            .map(|((label, team), (games, sog_against))| Pairing {
                label_lower: label.to_lowercase(),
                label,
                team,
                games,
                sog_against,
                factor: None,
            })
            .collect();

        let mut units: HashMap<String, Vec<f64>> = HashMap::new();
        for p in &pairings {
            if let Some(v) = p.sog_against_per_game() {
                units.entry(p.team.clone()).or_default().push(v);
            }
        }
        let table = TeamMetricTable::from_units(units)?;
        for p in &mut pairings {
            p.factor = p
                .sog_against_per_game()
                .and_then(|v| bounded_ratio(table.league_mean(), v, TEAM_FACTOR_BAND));
        }
        Some(Self { pairings, table })
    }

    /// Resolve `player`'s deployment factor. Pairings on the player's own
    /// team win over same-surname pairings elsewhere.
    pub fn resolve(&self, player: &str, team: &str) -> LineResolution {
        let Some(surname) = surname(player) else {
            return LineResolution {
                matched: Vec::new(),
                factor: None,
            };
        };

        let hits: Vec<&Pairing> = self
            .pairings
            .iter()
            .filter(|p| p.factor.is_some() && p.label_lower.contains(&surname))
            .collect();
        let own: Vec<&Pairing> = hits.iter().copied().filter(|p| p.team == team).collect();
        let chosen = if own.is_empty() { hits } else { own };

        let factor = weighted_factor(&chosen);
        LineResolution {
            matched: chosen.iter().map(|p| p.label.clone()).collect(),
            factor,
        }
    }

    /// Team-level deployment factor: league mean / team mean.
    pub fn team_factor(&self, team: &str) -> Option<f64> {
        bounded_ratio(self.table.league_mean(), self.table.get(team)?, TEAM_FACTOR_BAND)
    }

    pub fn pairings(&self) -> &[Pairing] {
        &self.pairings
    }
}

fn weighted_factor(pairings: &[&Pairing]) -> Option<f64> {
    let factors: Vec<(f64, f64)> = pairings
        .iter()
        .filter_map(|p| p.factor.map(|f| (f, p.games)))
        .collect();
    if factors.is_empty() {
        return None;
    }
    let weight: f64 = factors.iter().map(|(_, g)| g).sum();
    let avg = if weight > 0.0 {
        factors.iter().map(|(f, g)| f * g).sum::<f64>() / weight
    } else {
        factors.iter().map(|(f, _)| f).sum::<f64>() / factors.len() as f64
    };
    Some(avg.clamp(TEAM_FACTOR_BAND.0, TEAM_FACTOR_BAND.1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(label: &str, team: &str, games: f64, sog: f64) -> LinePairingRow {
        LinePairingRow {
            label: label.to_string(),
            team: team.to_string(),
            games: Some(games),
            sog_against: Some(sog),
        }
    }

    fn index() -> LineIndex {
        // BOS pairs: 25/gp and 35/gp -> team 30. TOR: 30/gp -> league 30.
        LineIndex::from_rows(&[
            row("McAvoy - Lindholm", "BOS", 10.0, 250.0),
            row("Peeke - Zadorov", "BOS", 5.0, 175.0),
            row("Rielly - McCabe", "TOR", 10.0, 300.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_surname_last_token() {
        assert_eq!(surname("Charlie McAvoy").as_deref(), Some("mcavoy"));
        assert_eq!(surname("   "), None);
    }

    #[test]
    fn test_pairing_factor_orientation() {
        let idx = index();
        let r = idx.resolve("Charlie McAvoy", "BOS");
        assert_eq!(r.matched, vec!["McAvoy - Lindholm".to_string()]);
        // 30 / 25
        assert!((r.factor.unwrap() - 1.2).abs() < 1e-12);
        assert_eq!(idx.team_factor("BOS"), Some(1.0));
    }

    #[test]
    fn test_no_match_is_none() {
        let r = index().resolve("Auston Matthews", "TOR");
        assert!(r.matched.is_empty());
        assert_eq!(r.factor, None);
    }

    #[test]
    fn test_duplicate_rows_are_summed() {
        let idx = LineIndex::from_rows(&[
            row("Rielly - McCabe", "TOR", 4.0, 100.0),
            row("Rielly - McCabe", "TOR", 6.0, 200.0),
        ])
        .unwrap();
        assert_eq!(idx.pairings().len(), 1);
        assert_eq!(idx.pairings()[0].games, 10.0);
        assert_eq!(idx.pairings()[0].factor, Some(1.0));
    }

    #[test]
    fn test_multiple_matches_weighted_by_games() {
        // league mean 30; pairs at 20/gp (1.3 clipped from 1.5) and 30/gp (1.0)
        let idx = LineIndex::from_rows(&[
            row("Smith - Jones", "NSH", 30.0, 600.0),
            row("Smith - Brown", "NSH", 10.0, 300.0),
            row("Other - Pair", "DAL", 10.0, 400.0),
        ])
        .unwrap();
        // NSH mean (20 + 30) / 2 = 25, DAL 40 -> league 32.5
        // factors: 32.5/20 = 1.625 -> 1.3, 32.5/30 = 1.0833
        let r = idx.resolve("Ryan Smith", "NSH");
        assert_eq!(r.matched.len(), 2);
        let expected = (1.3 * 30.0 + (32.5 / 30.0) * 10.0) / 40.0;
        assert!((r.factor.unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_own_team_preferred() {
        let idx = LineIndex::from_rows(&[
            row("Hughes - Siegenthaler", "NJD", 10.0, 250.0),
            row("Hughes - Juulsen", "VAN", 10.0, 350.0),
        ])
        .unwrap();
        let r = idx.resolve("Luke Hughes", "NJD");
        assert_eq!(r.matched, vec!["Hughes - Siegenthaler".to_string()]);
    }

    #[test]
    fn test_zero_game_pairing_never_matches() {
        let idx = LineIndex::from_rows(&[
            row("Ghost - Pair", "SEA", 0.0, 0.0),
            row("Dunn - Larsson", "SEA", 10.0, 300.0),
        ])
        .unwrap();
        assert_eq!(idx.resolve("Casper Ghost", "SEA").factor, None);
    }
}
