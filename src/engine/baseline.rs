//! Rolling-window baseline for per-game shot counts.
//!
//! Blend: `0.55 * L10 + 0.30 * L5 + 0.15 * L3`, where `LN` is the mean of the
//! trailing N games (or all games when fewer than N exist). Players with
//! fewer than [`MIN_GAMES`] games are not projected at all.

use crate::data::types::{player_key, GameId, PlayerGameRecord};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

pub const WEIGHT_L10: f64 = 0.55;
pub const WEIGHT_L5: f64 = 0.30;
pub const WEIGHT_L3: f64 = 0.15;

/// Admission gate.
pub const MIN_GAMES: usize = 3;

/// Trend magnitude beyond which a player is flagged hot or cold.
const FORM_BAND: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{games} game(s) of history, at least 3 required")]
pub struct InsufficientHistory {
    pub games: usize,
}

/// Mean of the last `n` entries, or of all entries if there are fewer.
/// Empty input yields 0.
pub fn trailing_mean(counts: &[u32], n: usize) -> f64 {
    let start = counts.len().saturating_sub(n);
    let window = &counts[start..];
    if window.is_empty() {
        return 0.0;
    }
    window.iter().map(|&c| c as f64).sum::<f64>() / window.len() as f64
}

pub fn blend(l3: f64, l5: f64, l10: f64) -> f64 {
    WEIGHT_L10 * l10 + WEIGHT_L5 * l5 + WEIGHT_L3 * l3
}

/// `(l5 - l10) / l10`, or 0 when `l10` is zero.
pub fn trend(l5: f64, l10: f64) -> f64 {
    if l10 == 0.0 {
        0.0
    } else {
        (l5 - l10) / l10
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RollingBaseline {
    pub l3: f64,
    pub l5: f64,
    pub l10: f64,
    pub l20: f64,
    pub baseline: f64,
    pub trend: f64,
    pub games: usize,
}

impl RollingBaseline {
    /// `counts` must be in chronological order (oldest first).
    pub fn from_counts(counts: &[u32]) -> Result<Self, InsufficientHistory> {
        if counts.len() < MIN_GAMES {
            return Err(InsufficientHistory {
                games: counts.len(),
            });
        }
        let l3 = trailing_mean(counts, 3);
        let l5 = trailing_mean(counts, 5);
        let l10 = trailing_mean(counts, 10);
        let l20 = trailing_mean(counts, 20);
        Ok(Self {
            l3,
            l5,
            l10,
            l20,
            baseline: blend(l3, l5, l10),
            trend: trend(l5, l10),
            games: counts.len(),
        })
    }

    pub fn form(&self) -> Form {
        Form::from_trend(self.trend)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Form {
    AboveBaseline,
    Neutral,
    BelowBaseline,
}

impl Form {
    pub fn from_trend(trend: f64) -> Self {
        if trend > FORM_BAND {
            Form::AboveBaseline
        } else if trend < -FORM_BAND {
            Form::BelowBaseline
        } else {
            Form::Neutral
        }
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Form::AboveBaseline => "above",
            Form::Neutral => "neutral",
            Form::BelowBaseline => "below",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct GameLine {
    shots: u32,
    goals: Option<u32>,
}

/// One player's games, summed per game id and ordered chronologically.
#[derive(Debug, Clone)]
pub struct PlayerHistory {
    pub player: String,
    games: Vec<(GameId, GameLine)>,
}

impl PlayerHistory {
    pub fn counts(&self) -> Vec<u32> {
        self.games.iter().map(|(_, g)| g.shots).collect()
    }

    pub fn baseline(&self) -> Result<RollingBaseline, InsufficientHistory> {
        RollingBaseline::from_counts(&self.counts())
    }

    pub fn season_avg(&self) -> f64 {
        trailing_mean(&self.counts(), self.games.len())
    }

    /// Last `n` per-game counts, oldest first.
    pub fn recent(&self, n: usize) -> Vec<u32> {
        let start = self.games.len().saturating_sub(n);
        self.games[start..].iter().map(|(_, g)| g.shots).collect()
    }

    /// Goals per shot over the whole history. `None` without goal data or
    /// when no shots were recorded.
    pub fn shooting_pct(&self) -> Option<f64> {
        let shots: u64 = self.games.iter().map(|(_, g)| u64::from(g.shots)).sum();
        let mut goals: Option<u64> = None;
        for (_, g) in &self.games {
            if let Some(n) = g.goals {
                goals = Some(goals.unwrap_or(0) + u64::from(n));
            }
        }
        match goals {
            Some(goals) if shots > 0 => Some(goals as f64 / shots as f64),
            _ => None,
        }
    }
}

/// Shot history for every player in the log, keyed case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct HistoryIndex {
    players: HashMap<String, PlayerHistory>,
}

impl HistoryIndex {
    pub fn from_records(records: &[PlayerGameRecord]) -> Self {
        let mut grouped: HashMap<String, (String, BTreeMap<GameId, GameLine>)> = HashMap::new();
        for rec in records {
            let (_, games) = grouped
                .entry(player_key(&rec.player))
                .or_insert_with(|| (rec.player.trim().to_string(), BTreeMap::new()));
            let line = games.entry(rec.game_id.clone()).or_default();
            line.shots = line.shots.saturating_add(rec.shots_on_goal);
            if let Some(g) = rec.goals {
                line.goals = Some(line.goals.unwrap_or(0).saturating_add(g));
            }
        }
        let players = grouped
            .into_iter()
            .map(|(key, (player, games))| {
                let games = games.into_iter().collect();
                (key, PlayerHistory { player, games })
            })
            .collect();
        Self { players }
    }

    pub fn get(&self, player: &str) -> Option<&PlayerHistory> {
        self.players.get(&player_key(player))
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
