use thiserror::Error;

#[derive(Debug, Error)]
pub enum SbaCalcError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid confidence level: {0} (available: 0.10, 0.25, 0.50, 0.75, 0.90)")]
    InvalidConfidenceLevel(f64),

    #[error("Invalid fee schedule: {0}")]
    InvalidFeeSchedule(String),

    #[error("Simulation cancelled after {completed} of {requested} scenarios")]
    Cancelled { completed: u32, requested: u32 },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for SbaCalcError {
    fn from(e: serde_json::Error) -> Self {
        SbaCalcError::SerializationError(e.to_string())
    }
}

impl From<serde_yaml::Error> for SbaCalcError {
    fn from(e: serde_yaml::Error) -> Self {
        SbaCalcError::SerializationError(e.to_string())
    }
}
