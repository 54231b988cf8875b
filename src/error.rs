use thiserror::Error;

/// Failures from the surfaces around the engine: file loading, CSV exchange
/// and request validation. Engine operations themselves never fail.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid tax table: {0}")]
    InvalidTaxTable(String),
}

pub type Result<T> = std::result::Result<T, PlannerError>;
