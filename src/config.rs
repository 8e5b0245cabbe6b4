use crate::data::loader::TableSources;
use crate::data::TeamCodes;
use crate::engine::odds::{ThresholdLine, DEFAULT_LINE};
use crate::feed::espn::DEFAULT_SCOREBOARD_URL;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub data: DataConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub threshold: ThresholdConfig,
    #[serde(default = "default_team_codes")]
    pub team_codes: HashMap<String, String>,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
    pub roster: String,
    pub shots: String,
    pub goalies: Option<String>,
    pub lines: Option<String>,
    pub teams: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleSource {
    #[default]
    Espn,
    Static,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleConfig {
    #[serde(default)]
    pub source: ScheduleSource,
    #[serde(default = "default_espn_url")]
    pub espn_url: String,
    #[serde(default = "default_timeout_ms")]
    pub request_timeout_ms: u64,
    /// YYYYMMDD; today when absent.
    pub date: Option<String>,
    #[serde(default)]
    pub matchups: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ThresholdConfig {
    #[serde(default = "default_line")]
    pub line: f64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RunConfig {
    /// 0 = rayon default.
    #[serde(default)]
    pub threads: usize,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct OutputConfig {
    pub export_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_espn_url() -> String {
    DEFAULT_SCOREBOARD_URL.to_string()
}
fn default_timeout_ms() -> u64 { 10_000 }
fn default_line() -> f64 { DEFAULT_LINE }
fn default_log_filter() -> String {
    "shot_prop=info".to_string()
}

fn default_team_codes() -> HashMap<String, String> {
    [("NJ", "NJD"), ("LA", "LAK"), ("SJ", "SJS"), ("TB", "TBL")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            source: ScheduleSource::default(),
            espn_url: default_espn_url(),
            request_timeout_ms: default_timeout_ms(),
            date: None,
            matchups: Vec::new(),
        }
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self { line: default_line() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: default_log_filter() }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| "Failed to parse config TOML")?;
        Ok(config)
    }

    pub fn table_sources(&self) -> TableSources {
        let dir = &self.data.dir;
        TableSources {
            roster: dir.join(&self.data.roster),
            shots: dir.join(&self.data.shots),
            goalies: self.data.goalies.as_ref().map(|f| dir.join(f)),
            lines: self.data.lines.as_ref().map(|f| dir.join(f)),
            teams: self.data.teams.as_ref().map(|f| dir.join(f)),
        }
    }

    pub fn team_codes(&self) -> TeamCodes {
        TeamCodes::new(self.team_codes.clone())
    }

    pub fn threshold_line(&self) -> Result<ThresholdLine> {
        ThresholdLine::new(self.threshold.line).context("invalid [threshold] line")
    }
}

impl ScheduleConfig {
    pub fn slate_date(&self) -> Result<Option<NaiveDate>> {
        self.date
            .as_deref()
            .map(parse_slate_date)
            .transpose()
    }
}

/// Accepts `YYYYMMDD` or `YYYY-MM-DD`.
pub fn parse_slate_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .with_context(|| format!("invalid date `{}`, expected YYYYMMDD", raw))
}
