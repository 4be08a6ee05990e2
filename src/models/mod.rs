use crate::utils::team_names::TeamCode;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One scheduled (or played) NFL game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub game_id: String,
    pub season: u16,
    pub week: u8,
    pub gameday: NaiveDate,
    pub gametime: String,
    pub home_team: TeamCode,
    pub away_team: TeamCode,
    pub home_score: Option<u16>,
    pub away_score: Option<u16>,
}

impl ScheduleEntry {
    /// Home score minus away score, once the game has been played
    pub fn point_difference(&self) -> Option<f64> {
        Some(self.home_score? as f64 - self.away_score? as f64)
    }
}

/// Home and away stats for one game, flattened in model column order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub home_team: TeamCode,
    pub away_team: TeamCode,
    pub columns: Vec<String>,
    /// NaN marks a stat missing from the source pages
    pub values: Vec<f64>,
    pub point_difference: Option<f64>,
}

impl FeatureRow {
    pub fn value(&self, column: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == column)?;
        self.values.get(i).copied()
    }

    pub fn is_complete(&self) -> bool {
        self.values.iter().all(|v| !v.is_nan())
    }
}

/// Predicted point differential; positive favors the home team
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub home_team: TeamCode,
    pub away_team: TeamCode,
    pub point_difference: f64,
}

impl PredictionResult {
    pub fn winner(&self) -> TeamCode {
        if self.point_difference > 0.0 {
            self.home_team
        } else {
            self.away_team
        }
    }

    pub fn loser(&self) -> TeamCode {
        if self.point_difference > 0.0 {
            self.away_team
        } else {
            self.home_team
        }
    }

    pub fn margin(&self) -> f64 {
        self.point_difference.abs()
    }

    pub fn format(&self) -> String {
        format!(
            "{} will defeat {} by {:.2} points.",
            self.winner(),
            self.loser(),
            self.margin()
        )
    }
}

/// An upcoming game with its prediction, or the reason there is none
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GamePrediction {
    pub game: ScheduleEntry,
    pub prediction: Option<PredictionResult>,
    pub error: Option<String>,
    pub home_injuries: String,
    pub away_injuries: String,
}

impl GamePrediction {
    pub fn format(&self) -> String {
        let matchup = format!(
            "{} @ {} - {}",
            self.game.away_team, self.game.home_team, self.game.gameday
        );
        match (&self.prediction, &self.error) {
            (Some(prediction), _) => format!("{} | Prediction: {}", matchup, prediction.format()),
            (None, Some(error)) => format!("{} | Unable to make prediction: {}", matchup, error),
            (None, None) => matchup,
        }
    }
}

/// A player's latest injury report, annotated with their depth chart slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjuryEntry {
    pub team: TeamCode,
    pub player: String,
    pub position: String,
    pub depth: String,
    pub status: String,
    pub primary_injury: Option<String>,
    pub secondary_injury: Option<String>,
    pub last_updated: DateTime<Utc>,
}

impl InjuryEntry {
    pub fn format(&self) -> String {
        if self.status.is_empty() {
            self.player.clone()
        } else {
            format!("{} ({})", self.player, self.status)
        }
    }
}

/// One sportsbook's point line and moneyline for a team
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookLine {
    pub line: String,
    pub odds: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsRow {
    pub number: String,
    pub team: String,
    pub lines: Vec<BookLine>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_sign_convention() {
        let home_win = PredictionResult {
            home_team: TeamCode::DAL,
            away_team: TeamCode::NYG,
            point_difference: 3.5,
        };
        assert_eq!(home_win.winner(), TeamCode::DAL);
        assert_eq!(home_win.format(), "DAL will defeat NYG by 3.50 points.");

        let away_win = PredictionResult {
            point_difference: -6.25,
            ..home_win
        };
        assert_eq!(away_win.winner(), TeamCode::NYG);
        assert_eq!(away_win.loser(), TeamCode::DAL);
        assert_eq!(away_win.margin(), 6.25);
    }

    #[test]
    fn test_point_difference_requires_both_scores() {
        let mut game = ScheduleEntry {
            game_id: "2024_01_NYG_DAL".to_string(),
            season: 2024,
            week: 1,
            gameday: NaiveDate::from_ymd_opt(2024, 9, 8).unwrap(),
            gametime: "16:25".to_string(),
            home_team: TeamCode::DAL,
            away_team: TeamCode::NYG,
            home_score: Some(27),
            away_score: Some(20),
        };
        assert_eq!(game.point_difference(), Some(7.0));

        game.away_score = None;
        assert_eq!(game.point_difference(), None);
    }
}
