use crate::models::GamePrediction;
use crate::scrapers::vegas_insider::OddsTable;
use crate::utils::aggregator::TeamStats;
use crate::utils::features::TrainingSet;
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::io::Write;
use std::path::{Path, PathBuf};

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) if !v.is_nan() => v.to_string(),
        _ => String::new(),
    }
}

/// `20241019_170312`, the suffix every snapshot file carries
pub fn snapshot_suffix(now: DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

fn create_in(dir: &Path, filename: &str) -> Result<(PathBuf, std::fs::File)> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(filename);
    let file = std::fs::File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    Ok((path, file))
}

/// `Team, <stat>…, timestamp`
pub fn write_combined_stats<W: Write>(stats: &TeamStats, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["Team".to_string()];
    header.extend(stats.columns().iter().cloned());
    header.push("timestamp".to_string());
    wtr.write_record(&header)?;

    let timestamp = stats.timestamp().to_rfc3339();
    for team in stats.teams() {
        let mut record = vec![team.to_string()];
        if let Some(row) = stats.row(team) {
            record.extend(row.iter().map(|v| format_value(*v)));
        }
        record.push(timestamp.clone());
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn save_combined_stats(stats: &TeamStats, dir: &Path) -> Result<PathBuf> {
    let filename = format!("nfl_combined_data_{}.csv", snapshot_suffix(Local::now()));
    let (path, file) = create_in(dir, &filename)?;
    write_combined_stats(stats, file).context("Failed to write combined stats")?;
    Ok(path)
}

/// Schedule columns, features, then `point_difference`
pub fn write_training_set<W: Write>(set: &TrainingSet, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header: Vec<String> = [
        "game_id",
        "season",
        "week",
        "gameday",
        "gametime",
        "home_team",
        "away_team",
        "home_score",
        "away_score",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    header.extend(set.columns.iter().cloned());
    header.push("point_difference".to_string());
    wtr.write_record(&header)?;

    for (game, row) in set.games.iter().zip(&set.rows) {
        let mut record = vec![
            game.game_id.clone(),
            game.season.to_string(),
            game.week.to_string(),
            game.gameday.to_string(),
            game.gametime.clone(),
            game.home_team.to_string(),
            game.away_team.to_string(),
            game.home_score.map(|s| s.to_string()).unwrap_or_default(),
            game.away_score.map(|s| s.to_string()).unwrap_or_default(),
        ];
        record.extend(row.values.iter().map(|v| format_value(Some(*v))));
        record.push(format_value(row.point_difference));
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn save_training_set(set: &TrainingSet, year: u16, dir: &Path) -> Result<PathBuf> {
    let filename = format!(
        "nfl_training_dataset_{}_{}.csv",
        year,
        snapshot_suffix(Local::now())
    );
    let (path, file) = create_in(dir, &filename)?;
    write_training_set(set, file).context("Failed to write training set")?;
    Ok(path)
}

pub fn write_predictions<W: Write>(predictions: &[GamePrediction], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record([
        "Date",
        "Home Team",
        "Away Team",
        "Predicted Winner",
        "Predicted Point Difference",
        "Home Team Injuries",
        "Away Team Injuries",
    ])?;

    for p in predictions {
        let (winner, difference) = match &p.prediction {
            Some(prediction) => (
                prediction.winner().to_string(),
                format!("{:.2}", prediction.margin()),
            ),
            None => (
                p.error.clone().unwrap_or_default(),
                String::new(),
            ),
        };
        wtr.write_record([
            p.game.gameday.to_string(),
            p.game.home_team.to_string(),
            p.game.away_team.to_string(),
            winner,
            difference,
            p.home_injuries.clone(),
            p.away_injuries.clone(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn predictions_to_csv(predictions: &[GamePrediction]) -> Result<String> {
    let mut buf = Vec::new();
    write_predictions(predictions, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}

/// `Number, Team, <Book> Line, <Book> Odds, …`
pub fn write_odds<W: Write>(table: &OddsTable, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(table.headers())?;

    for row in &table.rows {
        let mut record = vec![row.number.clone(), row.team.clone()];
        for line in &row.lines {
            record.push(line.line.clone());
            record.push(line.odds.clone());
        }
        // short rows still fill every header
        record.resize(table.headers().len(), String::new());
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn save_odds(table: &OddsTable, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_odds(table, file).context("Failed to write odds")
}
