//! Matchup projection builder.
//!
//! For each rostered skater on either side of a matchup:
//!   lambda = baseline * dampen(goalie) * dampen(line) * dampen(pace)
//! with `dampen(f) = 0.7 + 0.3 * f`, then clipped to
//! `[0.6 * baseline, 1.4 * baseline]`.
//!
//! Matchups are independent and are fanned out over the rayon pool.

use super::baseline::{Form, HistoryIndex, InsufficientHistory, RollingBaseline};
use super::cache::ProjectionCache;
use super::factors::{ContextFactors, FactorValue, TeamContextFactors};
use crate::data::types::{player_key, Matchup, RosterEntry};
use crate::data::{Dataset, DatasetVersion};
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use tracing::{debug, info};

pub const DAMPING_FLOOR: f64 = 0.7;
pub const DAMPING_WEIGHT: f64 = 0.3;
pub const GUARD_BAND: (f64, f64) = (0.6, 1.4);

pub fn dampen(factor: f64) -> f64 {
    DAMPING_FLOOR + DAMPING_WEIGHT * factor
}

/// Clip `lambda` to the guard band around `baseline`.
pub fn guard(lambda: f64, baseline: f64) -> f64 {
    let baseline = baseline.max(0.0);
    lambda.clamp(GUARD_BAND.0 * baseline, GUARD_BAND.1 * baseline)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AppliedFactors {
    /// From the opponent's goaltending.
    pub goalie: FactorValue,
    pub line: FactorValue,
    pub pace: FactorValue,
}

impl AppliedFactors {
    pub fn neutral() -> Self {
        Self {
            goalie: FactorValue::computed(1.0),
            line: FactorValue::computed(1.0),
            pace: FactorValue::computed(1.0),
        }
    }

    pub fn dampened_product(&self) -> f64 {
        dampen(self.goalie.value) * dampen(self.line.value) * dampen(self.pace.value)
    }

    /// Names of the factors that fell back to neutral for lack of data.
    pub fn degraded(&self) -> Vec<&'static str> {
        [
            ("goalie", self.goalie),
            ("line", self.line),
            ("pace", self.pace),
        ]
        .into_iter()
        .filter(|(_, f)| f.is_degraded())
        .map(|(name, _)| name)
        .collect()
    }
}

/// `baseline * product(dampened factors)`, guarded.
pub fn project(baseline: f64, factors: &AppliedFactors) -> f64 {
    let lambda = guard(baseline * factors.dampened_product(), baseline);
    if lambda.is_finite() {
        lambda
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectionResult {
    pub player: String,
    pub team: String,
    pub opponent: String,
    pub matchup: Matchup,
    pub baseline: RollingBaseline,
    pub trend: f64,
    pub form: Form,
    pub applied_factors: AppliedFactors,
    pub final_projection: f64,
    pub season_avg: f64,
    pub shooting_pct: Option<f64>,
    pub last_3: Vec<u32>,
    pub last_5: Vec<u32>,
    pub last_10: Vec<u32>,
}

impl ProjectionResult {
    pub fn is_degraded(&self) -> bool {
        !self.applied_factors.degraded().is_empty()
    }
}

/// A rostered player left out of a matchup by the admission gate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exclusion {
    pub player: String,
    pub team: String,
    pub games: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchupProjection {
    pub matchup: Matchup,
    /// Sorted by `final_projection`, highest first.
    pub rows: Vec<ProjectionResult>,
    pub excluded: Vec<Exclusion>,
}

impl MatchupProjection {
    pub fn degraded_rows(&self) -> usize {
        self.rows.iter().filter(|r| r.is_degraded()).count()
    }
}

/// Everything derived from one dataset snapshot that projection needs.
#[derive(Debug, Clone)]
pub struct ProjectionEngine {
    roster: Vec<RosterEntry>,
    history: HistoryIndex,
    context: ContextFactors,
    version: DatasetVersion,
}

impl ProjectionEngine {
    pub fn new(dataset: &Dataset) -> Self {
        let engine = Self {
            roster: dataset.roster.clone(),
            history: HistoryIndex::from_records(&dataset.shots),
            context: ContextFactors::from_dataset(dataset),
            version: dataset.version(),
        };
        info!(
            players = engine.history.len(),
            roster = engine.roster.len(),
            version = engine.version.short(),
            "projection engine ready"
        );
        engine
    }

    pub fn version(&self) -> &DatasetVersion {
        &self.version
    }

    pub fn context(&self) -> &ContextFactors {
        &self.context
    }

    pub fn team_factors(&self, team: &str) -> TeamContextFactors {
        self.context.team(team)
    }

    pub fn project_player(
        &self,
        entry: &RosterEntry,
        matchup: &Matchup,
    ) -> Result<ProjectionResult, InsufficientHistory> {
        let history = self
            .history
            .get(&entry.name)
            .ok_or(InsufficientHistory { games: 0 })?;
        let baseline = history.baseline()?;
        // Roster entries are pre-filtered to the matchup, so this only
        // falls back for a hand-built call.
        let opponent = matchup
            .opponent_of(&entry.team)
            .unwrap_or(matchup.home.as_str())
            .to_string();

        let applied_factors = AppliedFactors {
            goalie: self.context.goalie(&opponent),
            line: self.context.line(&entry.name, &entry.team),
            pace: self.context.pace(&entry.team, &opponent),
        };
        let final_projection = project(baseline.baseline, &applied_factors);

        Ok(ProjectionResult {
            player: entry.name.trim().to_string(),
            team: entry.team.clone(),
            opponent,
            matchup: matchup.clone(),
            trend: baseline.trend,
            form: baseline.form(),
            baseline,
            applied_factors,
            final_projection,
            season_avg: history.season_avg(),
            shooting_pct: history.shooting_pct(),
            last_3: history.recent(3),
            last_5: history.recent(5),
            last_10: history.recent(10),
        })
    }

    /// Rostered players on either side, first occurrence of each name only.
    fn matchup_roster(&self, matchup: &Matchup) -> Vec<&RosterEntry> {
        let mut seen = HashSet::new();
        self.roster
            .iter()
            .filter(|e| matchup.involves(&e.team))
            .filter(|e| seen.insert(player_key(&e.name)))
            .collect()
    }

    pub fn project_matchup(&self, matchup: &Matchup) -> MatchupProjection {
        let outcomes: Vec<(&RosterEntry, Result<ProjectionResult, InsufficientHistory>)> = self
            .matchup_roster(matchup)
            .into_par_iter()
            .map(|entry| (entry, self.project_player(entry, matchup)))
            .collect();

        let mut rows = Vec::with_capacity(outcomes.len());
        let mut excluded = Vec::new();
        for (entry, outcome) in outcomes {
            match outcome {
                Ok(row) => rows.push(row),
                Err(InsufficientHistory { games }) => excluded.push(Exclusion {
                    player: entry.name.clone(),
                    team: entry.team.clone(),
                    games,
                }),
            }
        }
        rows.sort_by(|a, b| {
            b.final_projection
                .partial_cmp(&a.final_projection)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.player.cmp(&b.player))
        });

        debug!(
            %matchup,
            rows = rows.len(),
            excluded = excluded.len(),
            "matchup projected"
        );
        MatchupProjection {
            matchup: matchup.clone(),
            rows,
            excluded,
        }
    }

    pub fn project_slate(&self, matchups: &[Matchup]) -> Vec<MatchupProjection> {
        self.project_slate_until(matchups, &AtomicBool::new(false))
    }

    /// Project every matchup until `cancel` is raised. Matchups already
    /// started finish; the rest are skipped. Output keeps schedule order.
    pub fn project_slate_until(
        &self,
        matchups: &[Matchup],
        cancel: &AtomicBool,
    ) -> Vec<MatchupProjection> {
        let done: Vec<MatchupProjection> = matchups
            .par_iter()
            .filter_map(|m| {
                if cancel.load(AtomicOrdering::Relaxed) {
                    None
                } else {
                    Some(self.project_matchup(m))
                }
            })
            .collect();
        if done.len() < matchups.len() {
            info!(
                completed = done.len(),
                scheduled = matchups.len(),
                "slate cancelled; returning partial results"
            );
        }
        done
    }

    /// Like [`project_slate`](Self::project_slate), memoized on
    /// (matchup, dataset version).
    pub fn project_slate_cached(
        &self,
        matchups: &[Matchup],
        cache: &ProjectionCache,
    ) -> Vec<Arc<MatchupProjection>> {
        matchups
            .par_iter()
            .map(|m| cache.get_or_compute(m, &self.version, || self.project_matchup(m)))
            .collect()
    }
}
