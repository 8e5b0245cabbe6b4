use super::ScheduleFeed;
use crate::data::{Matchup, TeamCodes};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_SCOREBOARD_URL: &str =
    "https://site.api.espn.com/apis/site/v2/sports/hockey/nhl/scoreboard";

// ── ESPN API Deserialization ─────────────────────────────────────────

#[derive(Deserialize)]
struct EspnScoreboard {
    #[serde(default)]
    events: Vec<EspnEvent>,
}

#[derive(Deserialize)]
struct EspnEvent {
    #[serde(default)]
    competitions: Vec<EspnCompetition>,
}

#[derive(Deserialize)]
struct EspnCompetition {
    #[serde(default)]
    competitors: Vec<EspnCompetitor>,
}

#[derive(Deserialize)]
struct EspnCompetitor {
    #[serde(rename = "homeAway", default)]
    home_away: Option<String>,
    #[serde(default)]
    team: EspnTeam,
}

#[derive(Deserialize, Default)]
struct EspnTeam {
    #[serde(default)]
    abbreviation: Option<String>,
}

/// Extract matchups from an NHL scoreboard payload.
///
/// Competitors are placed by `homeAway`; when that is missing the
/// scoreboard's listing order (away first) is used.
pub fn parse_espn_scoreboard(json: &str, codes: &TeamCodes) -> Result<Vec<Matchup>> {
    let scoreboard: EspnScoreboard = serde_json::from_str(json)?;
    let mut matchups = Vec::new();
    for event in scoreboard.events {
        let Some(comp) = event.competitions.first() else { continue };
        if comp.competitors.len() != 2 {
            continue;
        }
        let side = |which: &str| {
            comp.competitors
                .iter()
                .find(|c| c.home_away.as_deref() == Some(which))
        };
        let (away, home) = match (side("away"), side("home")) {
            (Some(a), Some(h)) => (a, h),
            _ => (&comp.competitors[0], &comp.competitors[1]),
        };
        let abbrev = |c: &EspnCompetitor| {
            c.team
                .abbreviation
                .as_deref()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(|a| codes.normalize(a))
                .unwrap_or_default()
        };
        let away = abbrev(away);
        let home = abbrev(home);
        if away.is_empty() || home.is_empty() || away == home {
            warn!(%away, %home, "skipping malformed scoreboard event");
            continue;
        }
        matchups.push(Matchup::new(away, home));
    }
    Ok(matchups)
}

pub struct EspnSchedule {
    client: Client,
    url: String,
    codes: TeamCodes,
}

impl EspnSchedule {
    pub fn new(url: &str, timeout_ms: u64, codes: TeamCodes) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            url: url.to_string(),
            codes,
        })
    }
}

#[async_trait]
impl ScheduleFeed for EspnSchedule {
    async fn fetch_matchups(&self, date: Option<NaiveDate>) -> Result<Vec<Matchup>> {
        let mut request = self.client.get(&self.url);
        if let Some(date) = date {
            request = request.query(&[("dates", date.format("%Y%m%d").to_string())]);
        }
        let resp = request
            .send()
            .await
            .with_context(|| format!("GET {}", self.url))?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("scoreboard returned HTTP {}", status);
        }
        let body = resp.text().await.context("reading scoreboard body")?;
        let matchups = parse_espn_scoreboard(&body, &self.codes)?;
        debug!(games = matchups.len(), ?date, "scoreboard fetched");
        Ok(matchups)
    }

    fn name(&self) -> &'static str {
        "espn"
    }
}
