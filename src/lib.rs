pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod scrapers;
pub mod utils;

pub use api::*;
pub use models::*;
pub use scrapers::*;
pub use utils::*;

use anyhow::{Context, Result};
use api::injuries_api::{InjuryClient, InjuryReport};
use api::schedule_api::{upcoming_games, ScheduleClient};
use chrono::{DateTime, Duration, Local, NaiveDate};
use config::Config;
use error::PipelineError;
use scrapers::table_source::HttpTableSource;
use scrapers::team_rankings::StatFetcher;
use scrapers::vegas_insider::{OddsScraper, OddsTable};
use tracing::{info, warn};
use utils::aggregator::{StatAggregator, TeamStats};
use utils::predictor::Predictor;

const UPCOMING_DAYS: i64 = 7;

/// Scrape every configured stat page and join them by team
pub async fn load_team_stats(config: &Config) -> error::Result<TeamStats> {
    let fetcher = StatFetcher::new(HttpTableSource::new()?, None, config.retry_delay);
    let aggregator = StatAggregator::new(fetcher, config.stat_sources.clone());
    info!("Fetching {} stat pages", aggregator.sources().len());
    let stats = aggregator.aggregate().await?;

    if !stats.unmapped().is_empty() {
        warn!("Unmapped team names: {}", stats.unmapped().join(", "));
    }
    Ok(stats)
}

/// Predict each game. A failure on one game is recorded on that game and
/// the rest still get predictions.
pub fn predict_games(
    predictor: &Predictor,
    stats: &TeamStats,
    games: &[ScheduleEntry],
    injuries: &InjuryReport,
) -> Vec<GamePrediction> {
    games
        .iter()
        .map(|game| {
            let (prediction, error) =
                match predictor.predict_game(game.home_team, game.away_team, stats) {
                    Ok(prediction) => (Some(prediction), None),
                    Err(PipelineError::MissingTeamData(team)) => {
                        warn!("Missing team data for {} in {}", team, game.game_id);
                        (None, Some("missing team data".to_string()))
                    }
                    Err(e) => {
                        warn!("Prediction failed for {}: {}", game.game_id, e);
                        (None, Some(e.to_string()))
                    }
                };

            GamePrediction {
                game: game.clone(),
                prediction,
                error,
                home_injuries: injuries.summary(game.home_team),
                away_injuries: injuries.summary(game.away_team),
            }
        })
        .collect()
}

/// All the data the dashboard displays
#[derive(Debug, Clone)]
pub struct DashboardData {
    pub generated_at: DateTime<Local>,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    pub stats_timestamp: DateTime<Local>,
    pub skipped_sources: Vec<String>,
    pub unmapped_teams: Vec<String>,
    pub predictions: Vec<GamePrediction>,
    pub injuries: InjuryReport,
    pub odds: Option<OddsTable>,
}

/// Fetch stats, schedule, injuries and odds, then predict the next week
pub async fn fetch_dashboard_data(config: &Config) -> Result<DashboardData> {
    let predictor = Predictor::load(&config.model_path, &config.scaler_path)
        .context("Failed to load model artifacts")?;

    let stats = load_team_stats(config)
        .await
        .context("Failed to fetch team stats")?;

    let today = Local::now().date_naive();
    let window_end = today + Duration::days(UPCOMING_DAYS);
    let schedule = ScheduleClient::new(&config.schedule_url)
        .fetch_season(config.season)
        .await
        .context("Failed to fetch schedule")?;
    let games = upcoming_games(&schedule, today, window_end);
    info!("{} games between {} and {}", games.len(), today, window_end);

    // injuries and odds are display-only, so a failure just leaves them out
    let injuries = match InjuryClient::new()
        .fetch_report(&config.injuries_url(), &config.depth_charts_url())
        .await
    {
        Ok(report) => report,
        Err(e) => {
            warn!("Injury report unavailable: {:#}", e);
            InjuryReport::default()
        }
    };
    let odds = match OddsScraper::new(&config.odds_url) {
        Ok(scraper) => scraper.fetch_odds().await,
        Err(e) => Err(e),
    };
    let odds = match odds {
        Ok(table) => Some(table),
        Err(e) => {
            warn!("Odds unavailable: {:#}", e);
            None
        }
    };

    let predictions = predict_games(&predictor, &stats, &games, &injuries);

    Ok(DashboardData {
        generated_at: Local::now(),
        window_start: today,
        window_end,
        stats_timestamp: stats.timestamp(),
        skipped_sources: stats.skipped().to_vec(),
        unmapped_teams: stats.unmapped().to_vec(),
        predictions,
        injuries,
        odds,
    })
}
