use thiserror::Error;

pub type Result<T> = std::result::Result<T, RiskError>;

#[derive(Debug, Error)]
pub enum RiskError {
    /// Too few usable gaps, a non-positive mean, or nothing to summarise
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("numeric instability: {0}")]
    NumericInstability(String),

    #[error("simulation cancelled after {completed} of {total} trials")]
    Cancelled { completed: usize, total: usize },

    #[error("trial {trial} failed: {message}")]
    TrialFailed { trial: usize, message: String },

    #[error("failed to read order history: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to parse configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RiskError {
    /// Whether the failure came from the request itself rather than the environment
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RiskError::InsufficientData(_)
                | RiskError::InvalidParameter(_)
                | RiskError::NumericInstability(_)
        )
    }
}
