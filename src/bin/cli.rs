use anyhow::{Context, Result};
use chrono::{Duration, Local};
use clap::{Parser, Subcommand};
use nfl_spread_predictor::config::Config;
use nfl_spread_predictor::data::{
    predictions_to_csv, save_combined_stats, save_odds, save_training_set,
};
use nfl_spread_predictor::features::build_training_set;
use nfl_spread_predictor::injuries_api::{InjuryClient, InjuryReport};
use nfl_spread_predictor::predictor::Predictor;
use nfl_spread_predictor::schedule_api::{upcoming_games, ScheduleClient};
use nfl_spread_predictor::team_names::TeamCode;
use nfl_spread_predictor::vegas_insider::OddsScraper;
use nfl_spread_predictor::{load_team_stats, predict_games};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "nfl-predictor", about = "NFL stats scraper and point spread predictor")]
struct Cli {
    /// Season to use for the schedule and injury reports
    #[arg(long, global = true)]
    season: Option<u16>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape every stat page and save the combined snapshot
    Stats,
    /// Join a season's results with current stats into a training dataset
    Training {
        #[arg(long)]
        year: u16,
    },
    /// Predict a single matchup
    Predict {
        #[arg(long)]
        home: String,
        #[arg(long)]
        away: String,
    },
    /// Predict every game in the coming days
    Upcoming {
        #[arg(long, default_value_t = 7)]
        days: i64,
        /// Write the predictions CSV here
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Show the current injury report for one team
    Injuries {
        #[arg(long)]
        team: String,
    },
    /// Scrape sportsbook lines and save them as CSV
    Odds {
        #[arg(long, default_value = "nfl_odds.csv")]
        output: PathBuf,
    },
}

fn parse_team(name: &str) -> Result<TeamCode> {
    name.parse::<TeamCode>()
        .map_err(|e| anyhow::anyhow!(e))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(season) = cli.season {
        config.season = season;
    }

    match cli.command {
        Command::Stats => run_stats(&config).await,
        Command::Training { year } => run_training(&config, year).await,
        Command::Predict { home, away } => run_predict(&config, &home, &away).await,
        Command::Upcoming { days, csv } => run_upcoming(&config, days, csv).await,
        Command::Injuries { team } => run_injuries(&config, &team).await,
        Command::Odds { output } => run_odds(&config, &output).await,
    }
}

async fn run_stats(config: &Config) -> Result<()> {
    println!("Fetching {} stat pages...\n", config.stat_sources.len());
    let stats = load_team_stats(config)
        .await
        .context("No data was successfully scraped")?;

    println!("Combined Dataset ({} teams):\n", stats.len());
    println!("Team  {}", stats.columns().join("  "));
    for team in stats.teams() {
        let values: Vec<String> = stats
            .row(team)
            .unwrap_or_default()
            .iter()
            .map(|v| v.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string()))
            .collect();
        println!("{:<5} {}", team, values.join("  "));
    }
    if !stats.skipped().is_empty() {
        println!("\nSkipped sources: {}", stats.skipped().join(", "));
    }

    let path = save_combined_stats(&stats, &config.datasets_dir)?;
    println!("\nCombined data saved to {}", path.display());
    Ok(())
}

async fn run_training(config: &Config, year: u16) -> Result<()> {
    let schedule = ScheduleClient::new(&config.schedule_url)
        .fetch_season(year)
        .await?;
    let stats = load_team_stats(config)
        .await
        .context("Failed to fetch team stats")?;

    let set = build_training_set(&schedule, &stats);
    if set.is_empty() {
        println!("Failed to build the training dataset or the dataset is empty.");
        println!("Columns: {}", set.columns.join(", "));
        return Ok(());
    }

    println!(
        "Built {} training rows for {} ({} games dropped)",
        set.len(),
        year,
        set.dropped
    );
    let path = save_training_set(&set, year, &config.datasets_dir)?;
    println!("Training dataset for {} has been saved to {}", year, path.display());
    Ok(())
}

async fn run_predict(config: &Config, home: &str, away: &str) -> Result<()> {
    let home = parse_team(home)?;
    let away = parse_team(away)?;

    let predictor = Predictor::load(&config.model_path, &config.scaler_path)
        .context("Failed to load model artifacts")?;
    let stats = load_team_stats(config)
        .await
        .context("Failed to fetch team stats")?;

    let prediction = predictor.predict_game(home, away, &stats)?;
    println!("\nPrediction: {}", prediction.format());
    Ok(())
}

async fn run_upcoming(config: &Config, days: i64, csv: Option<PathBuf>) -> Result<()> {
    let predictor = Predictor::load(&config.model_path, &config.scaler_path)
        .context("Failed to load model artifacts")?;
    let stats = load_team_stats(config)
        .await
        .context("Failed to fetch team stats")?;

    let today = Local::now().date_naive();
    let end = today + Duration::days(days);
    let schedule = ScheduleClient::new(&config.schedule_url)
        .fetch_season(config.season)
        .await?;
    let games = upcoming_games(&schedule, today, end);
    if games.is_empty() {
        println!("No upcoming games in the next {} days.", days);
        return Ok(());
    }

    let injuries = InjuryClient::new()
        .fetch_report(&config.injuries_url(), &config.depth_charts_url())
        .await
        .unwrap_or_else(|e| {
            eprintln!("Injury report unavailable: {:#}", e);
            InjuryReport::default()
        });

    println!("Upcoming games from {} to {}:\n", today, end);
    let predictions = predict_games(&predictor, &stats, &games, &injuries);
    for (i, prediction) in predictions.iter().enumerate() {
        println!("{}. {}", i + 1, prediction.format());
    }

    if let Some(path) = csv {
        std::fs::write(&path, predictions_to_csv(&predictions)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("\nSaved predictions to {}", path.display());
    }
    Ok(())
}

async fn run_injuries(config: &Config, team: &str) -> Result<()> {
    let team = parse_team(team)?;
    let report = InjuryClient::new()
        .fetch_report(&config.injuries_url(), &config.depth_charts_url())
        .await?;

    let entries = report.for_team(team);
    if entries.is_empty() {
        println!("No injury reports available for {}", team);
        return Ok(());
    }

    println!("Injury Report for {}\n", team);
    for entry in entries {
        println!("{}", entry.player);
        println!("  Position: {}", entry.position);
        println!("  Depth Team: {}", entry.depth);
        if let Some(injury) = &entry.primary_injury {
            println!("  Primary Injury: {}", injury);
        }
        if let Some(injury) = &entry.secondary_injury {
            println!("  Secondary Injury: {}", injury);
        }
        println!("  Status: {}", entry.status);
        println!(
            "  Last Updated: {}",
            entry.last_updated.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}

async fn run_odds(config: &Config, output: &Path) -> Result<()> {
    let table = OddsScraper::new(&config.odds_url)?.fetch_odds().await?;
    println!("Found lines for {} teams from {} books", table.rows.len(), table.books.len());

    for (team, line) in table.team_lines(&config.bookmaker) {
        println!("{:<4} {:>7} {:>7}", team, line.line, line.odds);
    }

    save_odds(&table, output)?;
    println!("\nData saved to {}", output.display());
    Ok(())
}
