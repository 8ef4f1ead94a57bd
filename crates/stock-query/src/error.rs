//! Error types for stock query operations

use thiserror::Error;

/// Stock query specific errors
#[derive(Debug, Error)]
pub enum StockQueryError {
    /// The store could not be reached or no connection became available in time
    #[error("Connection error: {0}")]
    Connection(String),

    /// The statement was rejected or its result could not be read
    #[error("Query error: {0}")]
    Query(String),

    /// Too few usable observations to fit a forecast model
    #[error(
        "Insufficient history for {entity}: at least {required} observations are needed, found {found}"
    )]
    InsufficientData {
        entity: String,
        required: usize,
        found: usize,
    },

    /// The time-series model could not be fitted or produced unusable values
    #[error("Model fit error: {0}")]
    ModelFit(String),

    /// Chart scene could not be rendered or encoded
    #[error("Chart error: {0}")]
    Chart(String),

    /// Tool arguments were not acceptable
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// System prompt rendering failed
    #[error("Prompt error: {0}")]
    Prompt(#[from] minijinja::Error),

    /// File system error while writing artifacts
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for stock query operations
pub type Result<T> = std::result::Result<T, StockQueryError>;

impl From<sqlx::Error> for StockQueryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Configuration(_)
            | sqlx::Error::WorkerCrashed => StockQueryError::Connection(err.to_string()),
            other => StockQueryError::Query(other.to_string()),
        }
    }
}

impl From<agent_utils::EnvError> for StockQueryError {
    fn from(err: agent_utils::EnvError) -> Self {
        StockQueryError::Config(err.to_string())
    }
}

/// Convert StockQueryError to agent_core::Error
impl From<StockQueryError> for agent_core::Error {
    fn from(err: StockQueryError) -> Self {
        match err {
            StockQueryError::InvalidParameters(msg) => agent_core::Error::InvalidParameters(msg),
            other => agent_core::Error::ProcessingFailed(other.to_string()),
        }
    }
}

/// Convert agent_core::Error to StockQueryError
impl From<agent_core::Error> for StockQueryError {
    fn from(err: agent_core::Error) -> Self {
        StockQueryError::Query(err.to_string())
    }
}
