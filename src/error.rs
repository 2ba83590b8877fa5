//! Error types for the treetune crate

use thiserror::Error;

/// Result type alias for treetune operations
pub type Result<T> = std::result::Result<T, TreeTuneError>;

/// Main error type for the treetune crate
#[derive(Error, Debug)]
pub enum TreeTuneError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Optimization error: {0}")]
    OptimizationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },
}

impl From<polars::error::PolarsError> for TreeTuneError {
    fn from(err: polars::error::PolarsError) -> Self {
        TreeTuneError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for TreeTuneError {
    fn from(err: serde_json::Error) -> Self {
        TreeTuneError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for TreeTuneError {
    fn from(err: ndarray::ShapeError) -> Self {
        TreeTuneError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
