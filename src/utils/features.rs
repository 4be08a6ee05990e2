use crate::error::{PipelineError, Result};
use crate::models::{FeatureRow, ScheduleEntry};
use crate::utils::aggregator::TeamStats;
use crate::utils::team_names::TeamCode;
use tracing::{debug, info};

/// `home_<stat>` for every stat, then `away_<stat>` for every stat
pub fn feature_columns(stats: &TeamStats) -> Vec<String> {
    let home = stats.columns().iter().map(|c| format!("home_{}", c));
    let away = stats.columns().iter().map(|c| format!("away_{}", c));
    home.chain(away).collect()
}

fn team_values(stats: &TeamStats, team: TeamCode) -> Result<impl Iterator<Item = f64> + '_> {
    let row = stats
        .row(team)
        .ok_or(PipelineError::MissingTeamData(team))?;
    Ok(row.iter().map(|v| v.unwrap_or(f64::NAN)))
}

/// Feature vector for a single matchup. A team without stats is an error,
/// never a partial row.
pub fn build_inference_row(
    home: TeamCode,
    away: TeamCode,
    stats: &TeamStats,
) -> Result<FeatureRow> {
    let values = team_values(stats, home)?
        .chain(team_values(stats, away)?)
        .collect();

    Ok(FeatureRow {
        home_team: home,
        away_team: away,
        columns: feature_columns(stats),
        values,
        point_difference: None,
    })
}

/// Played games joined with both teams' stats
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub columns: Vec<String>,
    pub games: Vec<ScheduleEntry>,
    pub rows: Vec<FeatureRow>,
    /// Games left out for missing scores or missing stats
    pub dropped: usize,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Join every game to home and away stats and label it with the actual
/// point difference. Incomplete rows are dropped.
pub fn build_training_set(schedule: &[ScheduleEntry], stats: &TeamStats) -> TrainingSet {
    let mut games = Vec::new();
    let mut rows = Vec::new();
    let mut dropped = 0;

    for game in schedule {
        let Some(target) = game.point_difference() else {
            dropped += 1;
            continue;
        };
        let row = match build_inference_row(game.home_team, game.away_team, stats) {
            Ok(row) if row.is_complete() => row,
            Ok(_) => {
                debug!("Dropping {}: incomplete stats", game.game_id);
                dropped += 1;
                continue;
            }
            Err(e) => {
                debug!("Dropping {}: {}", game.game_id, e);
                dropped += 1;
                continue;
            }
        };

        games.push(game.clone());
        rows.push(FeatureRow {
            point_difference: Some(target),
            ..row
        });
    }

    info!(
        "Built training set with {} rows ({} dropped)",
        rows.len(),
        dropped
    );

    TrainingSet {
        columns: feature_columns(stats),
        games,
        rows,
        dropped,
    }
}
