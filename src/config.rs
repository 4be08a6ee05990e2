use crate::scrapers::team_rankings::StatSource;
use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_STAT_URLS: [&str; 12] = [
    "https://www.teamrankings.com/nfl/stat/opponent-offensive-touchdowns-per-game",
    "https://www.teamrankings.com/nfl/stat/offensive-touchdowns-per-game",
    "https://www.teamrankings.com/nfl/stat/points-per-game",
    "https://www.teamrankings.com/nfl/stat/opponent-points-per-game",
    "https://www.teamrankings.com/nfl/stat/yards-per-game",
    "https://www.teamrankings.com/nfl/stat/opponent-yards-per-game",
    "https://www.teamrankings.com/nfl/stat/passing-yards-per-game",
    "https://www.teamrankings.com/nfl/stat/rushing-yards-per-game",
    "https://www.teamrankings.com/nfl/stat/turnover-margin-per-game",
    "https://www.teamrankings.com/nfl/stat/average-time-of-possession-net-of-ot",
    "https://www.teamrankings.com/nfl/stat/opponent-passing-yards-per-game",
    "https://www.teamrankings.com/nfl/stat/opponent-rushing-yards-per-game",
];

const SCHEDULE_URL: &str = "https://github.com/nflverse/nfldata/raw/master/data/games.csv";
const INJURIES_BASE_URL: &str =
    "https://github.com/nflverse/nflverse-data/releases/download/injuries";
const DEPTH_CHARTS_BASE_URL: &str =
    "https://github.com/nflverse/nflverse-data/releases/download/depth_charts";
const ODDS_URL: &str = "https://www.vegasinsider.com/nfl/odds/las-vegas/";

/// Runtime settings, read from the environment (and `.env`)
#[derive(Debug, Clone)]
pub struct Config {
    pub season: u16,
    pub stat_sources: Vec<StatSource>,
    pub retry_delay: Duration,
    pub model_path: PathBuf,
    pub scaler_path: PathBuf,
    pub datasets_dir: PathBuf,
    pub schedule_url: String,
    pub injuries_base_url: String,
    pub depth_charts_base_url: String,
    pub odds_url: String,
    pub bookmaker: String,
    pub bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            season: Local::now().year() as u16,
            stat_sources: DEFAULT_STAT_URLS
                .iter()
                .map(|url| StatSource::from_url(url))
                .collect(),
            retry_delay: Duration::from_secs(5),
            model_path: PathBuf::from("nfl_xgboost_model.json"),
            scaler_path: PathBuf::from("nfl_standard_scaler.json"),
            datasets_dir: PathBuf::from("datasets"),
            schedule_url: SCHEDULE_URL.to_string(),
            injuries_base_url: INJURIES_BASE_URL.to_string(),
            depth_charts_base_url: DEPTH_CHARTS_BASE_URL.to_string(),
            odds_url: ODDS_URL.to_string(),
            bookmaker: "DraftKings".to_string(),
            bind_addr: "127.0.0.1:3000".to_string(),
        }
    }
}

impl Config {
    /// Load `.env` and apply any `NFL_*` overrides on top of the defaults
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(season) = lookup("NFL_SEASON") {
            config.season = season
                .trim()
                .parse()
                .with_context(|| format!("Invalid NFL_SEASON: {}", season))?;
        }
        if let Some(urls) = lookup("NFL_STAT_URLS") {
            config.stat_sources = urls
                .split(',')
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(StatSource::from_url)
                .collect();
        }
        if let Some(secs) = lookup("NFL_RETRY_DELAY_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("Invalid NFL_RETRY_DELAY_SECS: {}", secs))?;
            config.retry_delay = Duration::from_secs(secs);
        }
        if let Some(path) = lookup("NFL_MODEL_PATH") {
            config.model_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("NFL_SCALER_PATH") {
            config.scaler_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup("NFL_DATASETS_DIR") {
            config.datasets_dir = PathBuf::from(dir);
        }
        if let Some(url) = lookup("NFL_SCHEDULE_URL") {
            config.schedule_url = url;
        }
        if let Some(url) = lookup("NFL_ODDS_URL") {
            config.odds_url = url;
        }
        if let Some(book) = lookup("NFL_BOOKMAKER") {
            config.bookmaker = book;
        }
        if let Some(addr) = lookup("NFL_BIND_ADDR") {
            config.bind_addr = addr;
        }

        Ok(config)
    }

    pub fn injuries_url(&self) -> String {
        format!("{}/injuries_{}.csv", self.injuries_base_url, self.season)
    }

    pub fn depth_charts_url(&self) -> String {
        format!(
            "{}/depth_charts_{}.csv",
            self.depth_charts_base_url, self.season
        )
    }
}
