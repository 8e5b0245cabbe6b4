use super::error::IngestError;
use super::schema::{
    GoalieColumns, Headers, LineColumns, PaceColumns, RosterColumns, ShotColumns,
};
use super::teams::TeamCodes;
use super::types::{GameId, GoalieRow, LinePairingRow, PlayerGameRecord, RosterEntry, TeamPaceRow};
use super::Dataset;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Where each table lives on disk. Roster and shot log are required.
#[derive(Debug, Clone)]
pub struct TableSources {
    pub roster: PathBuf,
    pub shots: PathBuf,
    pub goalies: Option<PathBuf>,
    pub lines: Option<PathBuf>,
    pub teams: Option<PathBuf>,
}

/// Parse a numeric cell. Accepts thousands separators and a trailing `%`.
/// Returns `None` for blanks, text and non-finite values.
pub fn parse_number(cell: &str) -> Option<f64> {
    let cleaned: String = cell
        .trim()
        .trim_end_matches('%')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a per-game count: non-negative and integral after rounding.
fn parse_count(cell: &str) -> Option<u32> {
    parse_number(cell)
        .filter(|v| *v >= 0.0 && *v <= u32::MAX as f64)
        .map(|v| v.round() as u32)
}

fn csv_reader<R: Read>(rdr: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(rdr)
}

fn headers<R: Read>(
    reader: &mut csv::Reader<R>,
    table: &'static str,
) -> Result<Headers, IngestError> {
    let record = reader
        .headers()
        .map_err(|source| IngestError::Csv { table, source })?;
    Ok(Headers::from_record(record))
}

fn cell(record: &csv::StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("").trim()
}

pub fn load_roster_from_reader<R: Read>(
    rdr: R,
    codes: &TeamCodes,
) -> Result<Vec<RosterEntry>, IngestError> {
    let mut reader = csv_reader(rdr);
    let cols = RosterColumns::resolve(&headers(&mut reader, RosterColumns::TABLE)?)?;
    let mut roster = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(table = RosterColumns::TABLE, row, error = %e, "skipping malformed row");
                continue;
            }
        };
        let name = cell(&record, cols.name);
        let team = cell(&record, cols.team);
        if name.is_empty() || team.is_empty() {
            debug!(table = RosterColumns::TABLE, row, "skipping row without name/team");
            continue;
        }
        roster.push(RosterEntry {
            name: name.to_string(),
            team: codes.normalize(team),
        });
    }
    Ok(roster)
}

pub fn load_shots_from_reader<R: Read>(
    rdr: R,
    codes: &TeamCodes,
) -> Result<Vec<PlayerGameRecord>, IngestError> {
    let mut reader = csv_reader(rdr);
    let cols = ShotColumns::resolve(&headers(&mut reader, ShotColumns::TABLE)?)?;
    let mut shots = Vec::new();
    let mut skipped = 0usize;
    for (row, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(table = ShotColumns::TABLE, row, error = %e, "skipping malformed row");
                skipped += 1;
                continue;
            }
        };
        let player = cell(&record, cols.player);
        let game_id = cell(&record, cols.game_id);
        let Some(sog) = parse_count(cell(&record, cols.sog)) else {
            skipped += 1;
            continue;
        };
        if player.is_empty() || game_id.is_empty() {
            skipped += 1;
            continue;
        }
        let goals = cols.goal.and_then(|idx| parse_count(cell(&record, idx)));
        let team = cols
            .team
            .map(|idx| cell(&record, idx))
            .filter(|t| !t.is_empty())
            .map(|t| codes.normalize(t));
        shots.push(PlayerGameRecord {
            player: player.to_string(),
            team,
            game_id: GameId::new(game_id),
            shots_on_goal: sog,
            goals,
        });
    }
    if skipped > 0 {
        warn!(table = ShotColumns::TABLE, skipped, "rows without player/game/sog were dropped");
    }
    Ok(shots)
}

pub fn load_goalies_from_reader<R: Read>(
    rdr: R,
    codes: &TeamCodes,
) -> Result<Vec<GoalieRow>, IngestError> {
    let mut reader = csv_reader(rdr);
    let cols = GoalieColumns::resolve(&headers(&mut reader, GoalieColumns::TABLE)?)?;
    let mut rows = Vec::new();
    for result in reader.records() {
        let Ok(record) = result else { continue };
        let team = cell(&record, cols.team);
        if team.is_empty() {
            continue;
        }
        rows.push(GoalieRow {
            goalie: cols
                .name
                .map(|idx| cell(&record, idx).to_string())
                .filter(|n| !n.is_empty()),
            team: codes.normalize(team),
            situation: cell(&record, cols.situation).to_lowercase(),
            games: parse_number(cell(&record, cols.games)),
            unblocked_attempts: parse_number(cell(&record, cols.unblocked_attempts)),
            rebounds: cols.rebounds.and_then(|idx| parse_number(cell(&record, idx))),
        });
    }
    Ok(rows)
}

pub fn load_lines_from_reader<R: Read>(
    rdr: R,
    codes: &TeamCodes,
) -> Result<Vec<LinePairingRow>, IngestError> {
    let mut reader = csv_reader(rdr);
    let cols = LineColumns::resolve(&headers(&mut reader, LineColumns::TABLE)?)?;
    let mut rows = Vec::new();
    for result in reader.records() {
        let Ok(record) = result else { continue };
        let label = cell(&record, cols.label);
        let team = cell(&record, cols.team);
        if label.is_empty() || team.is_empty() {
            continue;
        }
        rows.push(LinePairingRow {
            label: label.to_string(),
            team: codes.normalize(team),
            games: parse_number(cell(&record, cols.games)),
            sog_against: parse_number(cell(&record, cols.sog_against)),
        });
    }
    Ok(rows)
}

pub fn load_pace_from_reader<R: Read>(
    rdr: R,
    codes: &TeamCodes,
) -> Result<Vec<TeamPaceRow>, IngestError> {
    let mut reader = csv_reader(rdr);
    let cols = PaceColumns::resolve(&headers(&mut reader, PaceColumns::TABLE)?)?;
    let mut rows = Vec::new();
    for result in reader.records() {
        let Ok(record) = result else { continue };
        let team = cell(&record, cols.team);
        if team.is_empty() {
            continue;
        }
        rows.push(TeamPaceRow {
            team: codes.normalize(team),
            corsi_pct: parse_number(cell(&record, cols.possession)),
        });
    }
    Ok(rows)
}

fn open(path: &Path) -> Result<File, IngestError> {
    File::open(path).map_err(|source| IngestError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Load an optional context table. Any failure (absent file, missing
/// column, unreadable CSV) degrades to `None` so the matching factor
/// falls back to neutral.
pub fn load_context<T>(
    table: &'static str,
    path: Option<&Path>,
    load: impl FnOnce(File) -> Result<Vec<T>, IngestError>,
) -> Option<Vec<T>> {
    let Some(path) = path else {
        warn!(table, "no source configured; factor will be neutral");
        return None;
    };
    match open(path).and_then(load) {
        Ok(rows) if rows.is_empty() => {
            warn!(table, path = %path.display(), "table is empty; factor will be neutral");
            None
        }
        Ok(rows) => Some(rows),
        Err(e) => {
            warn!(table, path = %path.display(), error = %e, "table unusable; factor will be neutral");
            None
        }
    }
}

/// Load every table into one immutable snapshot.
pub fn load_dataset(sources: &TableSources, codes: &TeamCodes) -> Result<Dataset, IngestError> {
    let roster = load_roster_from_reader(open(&sources.roster)?, codes)?;
    let shots = load_shots_from_reader(open(&sources.shots)?, codes)?;
    let goalies = load_context(GoalieColumns::TABLE, sources.goalies.as_deref(), |f| {
        load_goalies_from_reader(f, codes)
    });
    let lines = load_context(LineColumns::TABLE, sources.lines.as_deref(), |f| {
        load_lines_from_reader(f, codes)
    });
    let teams = load_context(PaceColumns::TABLE, sources.teams.as_deref(), |f| {
        load_pace_from_reader(f, codes)
    });
    debug!(
        roster = roster.len(),
        shots = shots.len(),
        goalies = goalies.as_ref().map_or(0, Vec::len),
        lines = lines.as_ref().map_or(0, Vec::len),
        teams = teams.as_ref().map_or(0, Vec::len),
        "dataset loaded"
    );
    Ok(Dataset {
        roster,
        shots,
        goalies,
        lines,
        teams,
    })
}
