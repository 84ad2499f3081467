//! Error types for the chest X-ray tooling

use thiserror::Error;

/// Result type alias for crate operations
pub type Result<T> = std::result::Result<T, XrayError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum XrayError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Samples and labels do not have the same length: {x_rows} rows vs {y_rows} rows")]
    ShapeMismatch { x_rows: usize, y_rows: usize },

    #[error("Data types of samples and labels do not match: {x} vs {y}")]
    TypeMismatch { x: String, y: String },

    #[error("Invalid label {value} at row {row}, column {col}: labels must be 0 or 1")]
    InvalidLabel { row: usize, col: usize, value: f64 },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Download error: {0}")]
    DownloadError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<polars::error::PolarsError> for XrayError {
    fn from(err: polars::error::PolarsError) -> Self {
        XrayError::DataError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for XrayError {
    fn from(err: ndarray::ShapeError) -> Self {
        XrayError::DataError(format!("invalid shape: {}", err))
    }
}

impl From<serde_json::Error> for XrayError {
    fn from(err: serde_json::Error) -> Self {
        XrayError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for XrayError {
    fn from(err: reqwest::Error) -> Self {
        XrayError::DownloadError(err.to_string())
    }
}
