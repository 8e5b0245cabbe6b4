use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use shot_prop::config::{parse_slate_date, Config, ScheduleSource};
use shot_prop::data::loader::load_dataset;
use shot_prop::data::{Matchup, TeamCodes};
use shot_prop::engine::factors::FactorValue;
use shot_prop::engine::odds::{apply_threshold, rank, PricedProjection, ThresholdLine};
use shot_prop::engine::{MatchupProjection, ProjectionEngine};
use shot_prop::export::export_slate;
use shot_prop::feed::espn::EspnSchedule;
use shot_prop::feed::{ScheduleFeed, StaticSchedule};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "shot-prop", version, about = "NHL shots-on-goal matchup projections")]
struct Cli {
    /// Path to the TOML config.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Threshold line to price (0-10, 0.5 steps).
    #[arg(long)]
    line: Option<f64>,

    /// Matchup as AWAY@HOME; repeat for several. Overrides the schedule feed.
    #[arg(long = "matchup", value_name = "AWAY@HOME")]
    matchups: Vec<String>,

    /// Slate date, YYYYMMDD.
    #[arg(long)]
    date: Option<String>,

    /// Export the priced slate to this directory.
    #[arg(long, value_name = "DIR")]
    export: Option<PathBuf>,

    /// Worker threads for projection (0 = one per core).
    #[arg(long)]
    threads: Option<usize>,

    /// Also print per-team context factors.
    #[arg(long)]
    factors: bool,
}

fn schedule_feed(cli: &Cli, config: &Config, codes: &TeamCodes) -> Result<Box<dyn ScheduleFeed>> {
    if !cli.matchups.is_empty() {
        let feed: Box<dyn ScheduleFeed> = Box::new(StaticSchedule::parse(&cli.matchups, codes)?);
        return Ok(feed);
    }
    let feed: Box<dyn ScheduleFeed> = match config.schedule.source {
        ScheduleSource::Static => {
            Box::new(StaticSchedule::parse(&config.schedule.matchups, codes)?)
        }
        ScheduleSource::Espn => Box::new(EspnSchedule::new(
            &config.schedule.espn_url,
            config.schedule.request_timeout_ms,
            codes.clone(),
        )?),
    };
    Ok(feed)
}

fn fmt_factor(f: &FactorValue) -> String {
    if f.is_degraded() {
        format!("{:.2}*", f.value)
    } else {
        format!("{:.2}", f.value)
    }
}

fn print_matchup(table: &MatchupProjection, priced: &[PricedProjection<'_>], line: ThresholdLine) {
    println!();
    println!("  {}  ({} projected, {} below 3-game minimum)", table.matchup, table.rows.len(), table.excluded.len());
    if priced.is_empty() {
        println!("    no players with enough history");
        return;
    }
    println!(
        "    {:<24} {:<4} {:<4} {:>5} {:>5} {:>6} {:>6} {:>6} {:<8} {:>7} {:>7} {:<8}",
        "Player", "Team", "Opp", "Base", "Proj", "Goalie", "Line", "Pace", "Form",
        format!("P≥{}", line), "Odds", "Signal"
    );
    for row in priced {
        let p = row.projection;
        let f = &p.applied_factors;
        println!(
            "    {:<24} {:<4} {:<4} {:>5.2} {:>5.2} {:>6} {:>6} {:>6} {:<8} {:>6.1}% {:>7} {:<8}",
            p.player,
            p.team,
            p.opponent,
            p.baseline.baseline,
            p.final_projection,
            fmt_factor(&f.goalie),
            fmt_factor(&f.line),
            fmt_factor(&f.pace),
            p.form.to_string(),
            row.quote.probability_pct,
            row.quote.odds.to_string(),
            row.quote.signal.to_string(),
        );
    }
}

fn print_team_factors(engine: &ProjectionEngine, slate: &[Matchup]) {
    println!();
    println!("  Team context factors (* = neutral, data missing)");
    println!("    {:<5} {:>7} {:>7} {:>7}", "Team", "Goalie", "Line", "Pace");
    for m in slate {
        for team in [&m.away, &m.home] {
            let t = engine.team_factors(team);
            println!(
                "    {:<5} {:>7} {:>7} {:>7}",
                team,
                fmt_factor(&t.goalie_factor),
                fmt_factor(&t.line_factor),
                fmt_factor(&t.pace_factor)
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let line = match cli.line {
        Some(l) => ThresholdLine::new(l).context("invalid --line")?,
        None => config.threshold_line()?,
    };
    let threads = cli.threads.unwrap_or(config.run.threads);
    if threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure worker pool")?;
    }

    let slate_date: Option<NaiveDate> = match &cli.date {
        Some(d) => Some(parse_slate_date(d)?),
        None => config.schedule.slate_date()?,
    };
    let codes = config.team_codes();

    println!();
    println!("  Shot Prop v{}", env!("CARGO_PKG_VERSION"));
    println!("  ================");

    let sources = config.table_sources();
    let dataset = match load_dataset(&sources, &codes) {
        Ok(ds) => ds,
        Err(e) if e.is_schema_mismatch() => {
            eprintln!("  Schema mismatch: {}", e);
            eprintln!("  Roster and shot log need player, team and game columns.");
            std::process::exit(2);
        }
        Err(e) => return Err(e).context("failed to load input tables"),
    };
    println!(
        "  Loaded {} roster rows, {} shot rows",
        dataset.roster.len(),
        dataset.shots.len()
    );

    let feed = schedule_feed(&cli, &config, &codes)?;
    let slate = feed
        .fetch_matchups(slate_date)
        .await
        .with_context(|| format!("{} schedule fetch failed", feed.name()))?;
    if slate.is_empty() {
        println!("  No games found for this date.");
        return Ok(());
    }
    println!("  {} games from {} schedule", slate.len(), feed.name());

    let engine = Arc::new(ProjectionEngine::new(&dataset));
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received; finishing in-flight matchups");
                cancel.store(true, Ordering::Relaxed);
            }
        });
    }

    let projected = {
        let engine = engine.clone();
        let slate = slate.clone();
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || engine.project_slate_until(&slate, &cancel))
            .await
            .context("projection task panicked")?
    };

    let mut all_priced = Vec::new();
    for table in &projected {
        let priced = apply_threshold(&table.rows, line);
        print_matchup(table, &priced, line);
        all_priced.extend(priced);
    }

    let degraded: usize = projected.iter().map(MatchupProjection::degraded_rows).sum();
    if degraded > 0 {
        tracing::warn!(rows = degraded, "some factors fell back to neutral for missing context data");
    }
    if all_priced.is_empty() {
        println!();
        println!("  No player in this slate has 3+ games of history.");
    } else {
        rank(&mut all_priced);
        println!();
        println!("  Top plays at {}+ shots", line);
        for row in all_priced.iter().take(10) {
            println!(
                "    {:<24} {:<9} {:>5.2}  {:>5.1}%  {:>7}  {}",
                row.projection.player,
                row.projection.matchup.to_string(),
                row.projection.final_projection,
                row.quote.probability_pct,
                row.quote.odds.to_string(),
                row.quote.signal
            );
        }
    }

    if cli.factors {
        print_team_factors(&engine, &slate);
    }

    if let Some(dir) = cli.export.as_ref().or(config.output.export_dir.as_ref()) {
        let date = slate_date.unwrap_or_else(|| Local::now().date_naive());
        let path = export_slate(dir, date, &all_priced)?;
        println!();
        println!("  Exported {} rows to {}", all_priced.len(), path.display());
    }
    println!();
    Ok(())
}
