use crate::utils::team_names::TeamCode;
use thiserror::Error;

/// Failures of the stats → features → prediction pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A stat page had no usable table after the retry
    #[error("source {source_name} unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    #[error("every configured stat source failed")]
    AllSourcesFailed,

    #[error("missing team data for {0}")]
    MissingTeamData(TeamCode),

    #[error("duplicate rows for team {0} in aggregated stats")]
    DuplicateTeam(TeamCode),

    #[error("feature schema mismatch: expected {expected:?}, found {found:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("invalid model artifact: {0}")]
    InvalidArtifact(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn unavailable(source_name: &str, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            source_name: source_name.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
