use crate::error::{PipelineError, Result};
use crate::models::{FeatureRow, PredictionResult};
use crate::utils::aggregator::TeamStats;
use crate::utils::booster::Booster;
use crate::utils::features::build_inference_row;
use crate::utils::team_names::TeamCode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// A standardization fitted on the training set. The JSON layout mirrors
/// sklearn's `feature_names_in_`, `mean_` and `scale_`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub feature_names: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn from_json(json: &str) -> Result<Self> {
        let scaler: Self = serde_json::from_str(json)?;
        let n = scaler.feature_names.len();
        if scaler.mean.len() != n || scaler.scale.len() != n {
            return Err(PipelineError::InvalidArtifact(format!(
                "scaler has {} names, {} means and {} scales",
                n,
                scaler.mean.len(),
                scaler.scale.len()
            )));
        }
        Ok(scaler)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// `(x - mean) / scale`, with zero-variance columns left unscaled
    pub fn transform(&self, row: &FeatureRow) -> Result<Vec<f64>> {
        if row.columns != self.feature_names {
            return Err(PipelineError::SchemaMismatch {
                expected: self.feature_names.clone(),
                found: row.columns.clone(),
            });
        }

        Ok(row
            .values
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| {
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                (x - mean) / scale
            })
            .collect())
    }
}

/// Scaler plus model; neither is ever refit here
#[derive(Debug, Clone)]
pub struct Predictor {
    model: Booster,
    scaler: StandardScaler,
}

impl Predictor {
    pub fn new(model: Booster, scaler: StandardScaler) -> Result<Self> {
        let names = model.feature_names();
        if !names.is_empty() && names != scaler.feature_names.as_slice() {
            return Err(PipelineError::SchemaMismatch {
                expected: names.to_vec(),
                found: scaler.feature_names.clone(),
            });
        }
        Ok(Self { model, scaler })
    }

    pub fn load(model_path: impl AsRef<Path>, scaler_path: impl AsRef<Path>) -> Result<Self> {
        let model = Booster::load(model_path)?;
        let scaler = StandardScaler::load(scaler_path)?;
        info!(
            "Loaded model with {} trees over {} features",
            model.num_trees(),
            model.num_feature()
        );
        Self::new(model, scaler)
    }

    pub fn feature_names(&self) -> &[String] {
        &self.scaler.feature_names
    }

    /// Signed point differential for a prepared row; positive favors home
    pub fn predict(&self, row: &FeatureRow) -> Result<f64> {
        let scaled = self.scaler.transform(row)?;
        self.model.predict(&scaled)
    }

    pub fn predict_game(
        &self,
        home: TeamCode,
        away: TeamCode,
        stats: &TeamStats,
    ) -> Result<PredictionResult> {
        let row = build_inference_row(home, away, stats)?;
        Ok(PredictionResult {
            home_team: home,
            away_team: away,
            point_difference: self.predict(&row)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::team_rankings::StatTable;
    use crate::utils::booster::fixtures::MODEL_JSON;
    use chrono::Local;

    const SCALER_JSON: &str = r#"{
        "feature_names": ["home_ppg", "away_ppg"],
        "mean": [21.0, 21.0],
        "scale": [3.0, 0.0]
    }"#;

    fn predictor() -> Predictor {
        Predictor::new(
            Booster::from_json(MODEL_JSON).unwrap(),
            StandardScaler::from_json(SCALER_JSON).unwrap(),
        )
        .unwrap()
    }

    fn stats() -> TeamStats {
        TeamStats::from_tables(&[StatTable {
            stat: "ppg".to_string(),
            fetched_at: Local::now(),
            rows: vec![
                ("Dallas".to_string(), Some(24.0)),
                ("NY Giants".to_string(), Some(18.0)),
            ],
        }])
        .unwrap()
    }

    #[test]
    fn test_scaler_transform() {
        let scaler = StandardScaler::from_json(SCALER_JSON).unwrap();
        let row = build_inference_row(TeamCode::DAL, TeamCode::NYG, &stats()).unwrap();
        assert_eq!(scaler.transform(&row).unwrap(), vec![1.0, -3.0]);
    }

    #[test]
    fn test_scaler_rejects_ragged_artifact() {
        let json = r#"{"feature_names": ["a", "b"], "mean": [1.0], "scale": [1.0, 1.0]}"#;
        assert!(matches!(
            StandardScaler::from_json(json),
            Err(PipelineError::InvalidArtifact(_))
        ));
    }

    #[test]
    fn test_predict_game_home_favored() {
        let result = predictor()
            .predict_game(TeamCode::DAL, TeamCode::NYG, &stats())
            .unwrap();
        assert_eq!(result.point_difference, 6.0);
        assert_eq!(result.winner(), TeamCode::DAL);
    }

    #[test]
    fn test_predict_game_away_favored() {
        let result = predictor()
            .predict_game(TeamCode::NYG, TeamCode::DAL, &stats())
            .unwrap();
        assert_eq!(result.point_difference, -5.0);
        assert_eq!(result.winner(), TeamCode::DAL);
    }

    #[test]
    fn test_predict_is_deterministic() {
        let predictor = predictor();
        let row = build_inference_row(TeamCode::DAL, TeamCode::NYG, &stats()).unwrap();
        assert_eq!(
            predictor.predict(&row).unwrap(),
            predictor.predict(&row).unwrap()
        );
    }

    #[test]
    fn test_schema_mismatch() {
        let mut row = build_inference_row(TeamCode::DAL, TeamCode::NYG, &stats()).unwrap();
        row.columns.reverse();
        assert!(matches!(
            predictor().predict(&row),
            Err(PipelineError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_team_is_reported() {
        let result = predictor().predict_game(TeamCode::DAL, TeamCode::KC, &stats());
        assert!(matches!(
            result,
            Err(PipelineError::MissingTeamData(TeamCode::KC))
        ));
    }

    #[test]
    fn test_model_and_scaler_must_agree() {
        let scaler = StandardScaler {
            feature_names: vec!["away_ppg".to_string(), "home_ppg".to_string()],
            mean: vec![0.0, 0.0],
            scale: vec![1.0, 1.0],
        };
        assert!(Predictor::new(Booster::from_json(MODEL_JSON).unwrap(), scaler).is_err());
    }
}
