//! End-to-end: CSV tables on disk -> dataset -> slate projection -> pricing.

use shot_prop::data::loader::{load_dataset, TableSources};
use shot_prop::data::{Matchup, TeamCodes};
use shot_prop::engine::factors::FactorSource;
use shot_prop::engine::odds::{apply_threshold, rank, Signal, ThresholdLine};
use shot_prop::engine::{ProjectionCache, ProjectionEngine};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const ROSTER: &str = "\
name,team,position
David Pastrnak,BOS,R
Charlie McAvoy,BOS,D
Auston Matthews,TOR,C
Fraser Minten,TOR,C
Jack Hughes,NJ,C
";

fn shot_log() -> String {
    let mut csv = String::from("player,game_id,sog,goal\n");
    let pasta = [2, 1, 3, 4, 2, 5, 3, 1, 4, 2];
    for (i, sog) in pasta.iter().enumerate() {
        csv.push_str(&format!("David Pastrnak,{},{},0\n", 2025020001 + i, sog));
    }
    for (i, sog) in [6, 5, 7, 6].iter().enumerate() {
        csv.push_str(&format!("Auston Matthews,{},{},1\n", 2025020001 + i, sog));
    }
    for (i, sog) in [2, 3, 2].iter().enumerate() {
        csv.push_str(&format!("Charlie McAvoy,{},{},0\n", 2025020001 + i, sog));
    }
    // two games only
    csv.push_str("Fraser Minten,2025020001,9,0\nFraser Minten,2025020002,9,0\n");
    for (i, sog) in [4, 4, 4].iter().enumerate() {
        csv.push_str(&format!("Jack Hughes,{},{},0\n", 2025020001 + i, sog));
    }
    csv
}

const GOALIES: &str = "\
name,team,situation,games,unblocked attempts,rebounds
Swayman,BOS,all,10,240,10
Swayman,BOS,5on5,10,200,8
Woll,TOR,all,10,360,12
Markstrom,NJ,all,10,300,9
";

const LINES: &str = "\
line pairings,team,games,sog against
McAvoy - Lindholm,BOS,10,250
Rielly - McCabe,TOR,10,300
Hamilton - Siegenthaler,NJ,10,350
";

const TEAMS: &str = "\
team,corsi%
BOS,50
TOR,50
NJ,50
";

fn codes() -> TeamCodes {
    TeamCodes::new(HashMap::from([("NJ".to_string(), "NJD".to_string())]))
}

fn write_tables(dir: &Path, with_context: bool) -> TableSources {
    fs::write(dir.join("SKATERS.csv"), ROSTER).unwrap();
    fs::write(dir.join("SHOTS.csv"), shot_log()).unwrap();
    if with_context {
        fs::write(dir.join("GOALTENDERS.csv"), GOALIES).unwrap();
        fs::write(dir.join("LINES.csv"), LINES).unwrap();
        fs::write(dir.join("TEAMS.csv"), TEAMS).unwrap();
    }
    TableSources {
        roster: dir.join("SKATERS.csv"),
        shots: dir.join("SHOTS.csv"),
        goalies: Some(dir.join("GOALTENDERS.csv")),
        lines: Some(dir.join("LINES.csv")),
        teams: Some(dir.join("TEAMS.csv")),
    }
}

#[test]
fn neutral_context_reproduces_baseline_and_price() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = load_dataset(&write_tables(dir.path(), false), &codes()).unwrap();
    assert!(dataset.goalies.is_none());

    let engine = ProjectionEngine::new(&dataset);
    let slate = engine.project_slate(&[Matchup::new("BOS", "TOR")]);
    let table = &slate[0];

    let pasta = table.rows.iter().find(|r| r.player == "David Pastrnak").unwrap();
    assert!((pasta.baseline.baseline - 2.735).abs() < 1e-9);
    assert!((pasta.final_projection - 2.735).abs() < 1e-9);
    assert_eq!(pasta.applied_factors.goalie.source, FactorSource::Degraded);

    let priced = apply_threshold([pasta], ThresholdLine::new(3.0).unwrap());
    assert_eq!(priced[0].quote.probability_pct, 51.5);
    assert_eq!(priced[0].quote.odds.to_string(), "-106");
}

#[test]
fn two_game_player_never_projected() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = load_dataset(&write_tables(dir.path(), true), &codes()).unwrap();
    let engine = ProjectionEngine::new(&dataset);
    let slate = engine.project_slate(&[
        Matchup::new("BOS", "TOR"),
        Matchup::new("TOR", "NJD"),
    ]);
    for table in &slate {
        assert!(table.rows.iter().all(|r| r.player != "Fraser Minten"));
        assert!(table.excluded.iter().any(|e| e.player == "Fraser Minten" && e.games == 2));
    }
}

#[test]
fn context_tables_shape_projection() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = load_dataset(&write_tables(dir.path(), true), &codes()).unwrap();
    let engine = ProjectionEngine::new(&dataset);
    let table = engine.project_matchup(&Matchup::new("BOS", "TOR"));

    // Sorted by projection, highest first.
    let projections: Vec<f64> = table.rows.iter().map(|r| r.final_projection).collect();
    assert!(projections.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(table.rows[0].player, "Auston Matthews");

    // League goalie mean (24 + 36 + 30) / 3 = 30; TOR allows 36 -> 1.2.
    let pasta = table.rows.iter().find(|r| r.player == "David Pastrnak").unwrap();
    assert!((pasta.applied_factors.goalie.value - 1.2).abs() < 1e-9);
    assert_eq!(pasta.applied_factors.line.source, FactorSource::Unmatched);
    assert_eq!(pasta.applied_factors.pace.value, 1.0);
    assert!((pasta.final_projection - 2.735 * 1.06).abs() < 1e-9);

    // McAvoy's pairing allows 25/gp vs league 30 -> 1.2.
    let mcavoy = table.rows.iter().find(|r| r.player == "Charlie McAvoy").unwrap();
    assert!((mcavoy.applied_factors.line.value - 1.2).abs() < 1e-9);
    assert!(!mcavoy.is_degraded());

    // Matthews faces BOS: 24 / 30 = 0.8.
    let matthews = &table.rows[0];
    assert!((matthews.applied_factors.goalie.value - 0.8).abs() < 1e-9);
    assert_eq!(matthews.shooting_pct, Some(4.0 / 24.0));
}

#[test]
fn aliases_join_across_tables() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = load_dataset(&write_tables(dir.path(), true), &codes()).unwrap();
    assert!(dataset.roster.iter().any(|r| r.team == "NJD"));
    let engine = ProjectionEngine::new(&dataset);
    let table = engine.project_matchup(&Matchup::new("TOR", "NJD"));
    let hughes = table.rows.iter().find(|r| r.player == "Jack Hughes").unwrap();
    assert_eq!(hughes.opponent, "TOR");
    assert_eq!(hughes.applied_factors.goalie.source, FactorSource::Computed);
}

#[test]
fn threshold_reapplied_without_reprojection() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = load_dataset(&write_tables(dir.path(), true), &codes()).unwrap();
    let engine = ProjectionEngine::new(&dataset);
    let cache = ProjectionCache::new();
    let slate = [Matchup::new("BOS", "TOR")];

    let tables = engine.project_slate_cached(&slate, &cache);
    let mut last = f64::INFINITY;
    for step in 0..=20 {
        let line = ThresholdLine::new(step as f64 * 0.5).unwrap();
        let tables_again = engine.project_slate_cached(&slate, &cache);
        assert!(std::sync::Arc::ptr_eq(&tables[0], &tables_again[0]));
        let priced = apply_threshold(&tables[0].rows, line);
        let matthews = priced
            .iter()
            .find(|p| p.projection.player == "Auston Matthews")
            .unwrap();
        assert!(matthews.quote.probability <= last);
        last = matthews.quote.probability;
    }
    assert_eq!(cache.misses(), 1);
}

#[test]
fn ranking_puts_strongest_first() {
    let dir = tempfile::tempdir().unwrap();
    let dataset = load_dataset(&write_tables(dir.path(), true), &codes()).unwrap();
    let engine = ProjectionEngine::new(&dataset);
    let table = engine.project_matchup(&Matchup::new("BOS", "TOR"));
    let mut priced = apply_threshold(&table.rows, ThresholdLine::new(2.5).unwrap());
    rank(&mut priced);
    assert_eq!(priced[0].projection.player, "Auston Matthews");
    assert_eq!(priced[0].quote.signal, Signal::Strong);
    assert!(priced
        .windows(2)
        .all(|w| w[0].quote.signal >= w[1].quote.signal));
}
