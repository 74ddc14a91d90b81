//! Error types for the grademl pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, GradeMlError>;

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum GradeMlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Fit error: {0}")]
    Fit(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    #[error("Model not fitted")]
    NotFitted,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Plot error: {0}")]
    Plot(String),
}

impl From<polars::error::PolarsError> for GradeMlError {
    fn from(err: polars::error::PolarsError) -> Self {
        GradeMlError::Data(err.to_string())
    }
}

impl From<serde_json::Error> for GradeMlError {
    fn from(err: serde_json::Error) -> Self {
        GradeMlError::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for GradeMlError {
    fn from(err: bincode::Error) -> Self {
        GradeMlError::Serialization(err.to_string())
    }
}
