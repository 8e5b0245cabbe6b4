//! CSV export of a priced slate.

use crate::engine::odds::PricedProjection;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Header record. Must follow `ExportRow` field order.
const COLUMNS: [&str; 19] = [
    "date",
    "matchup",
    "player",
    "team",
    "opponent",
    "baseline",
    "trend",
    "form",
    "goalie_factor",
    "line_factor",
    "pace_factor",
    "final_projection",
    "season_avg",
    "shooting_pct",
    "line",
    "probability_pct",
    "odds",
    "signal",
    "degraded",
];

/// One exported row. Field order is the column order.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    date: String,
    matchup: String,
    player: &'a str,
    team: &'a str,
    opponent: &'a str,
    baseline: f64,
    trend: f64,
    form: String,
    goalie_factor: f64,
    line_factor: f64,
    pace_factor: f64,
    final_projection: f64,
    season_avg: f64,
    shooting_pct: Option<f64>,
    line: f64,
    probability_pct: f64,
    odds: String,
    signal: String,
    degraded: String,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

impl<'a> ExportRow<'a> {
    fn new(date: NaiveDate, priced: &PricedProjection<'a>) -> Self {
        let p = priced.projection;
        let q = &priced.quote;
        Self {
            date: date.format("%Y-%m-%d").to_string(),
            matchup: p.matchup.to_string(),
            player: &p.player,
            team: &p.team,
            opponent: &p.opponent,
            baseline: round2(p.baseline.baseline),
            trend: round2(p.trend),
            form: p.form.to_string(),
            goalie_factor: round2(p.applied_factors.goalie.value),
            line_factor: round2(p.applied_factors.line.value),
            pace_factor: round2(p.applied_factors.pace.value),
            final_projection: round2(p.final_projection),
            season_avg: round2(p.season_avg),
            shooting_pct: p.shooting_pct.map(|s| round2(s * 100.0)),
            line: q.line.value(),
            probability_pct: q.probability_pct,
            odds: q.odds.to_string(),
            signal: q.signal.to_string(),
            degraded: p.applied_factors.degraded().join("|"),
        }
    }
}

/// The header is written even for an empty slate.
pub fn write_csv<W: Write>(out: W, date: NaiveDate, rows: &[PricedProjection<'_>]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    wtr.write_record(COLUMNS)?;
    for priced in rows {
        wtr.serialize(ExportRow::new(date, priced))?;
    }
    wtr.flush()?;
    Ok(())
}

/// `<dir>/projections_<YYYY-MM-DD>.csv`
pub fn export_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("projections_{}.csv", date.format("%Y-%m-%d")))
}

/// Write the slate to its dated file under `dir`, creating `dir` if needed.
pub fn export_slate(dir: &Path, date: NaiveDate, rows: &[PricedProjection<'_>]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export dir: {}", dir.display()))?;
    let path = export_path(dir, date);
    let file = std::fs::File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_csv(file, date, rows)?;
    tracing::info!(path = %path.display(), rows = rows.len(), "slate exported");
    Ok(path)
}
