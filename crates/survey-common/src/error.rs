//! Error types for the shared survey data model.

use thiserror::Error;

/// Result type alias using SurveyError.
pub type SurveyResult<T> = Result<T, SurveyError>;

/// Primary error type for data model operations.
#[derive(Debug, Error)]
pub enum SurveyError {
    // === Grid Errors ===
    #[error("Invalid grid: {0}")]
    InvalidGrid(String),

    #[error("Invalid bbox: {0}")]
    InvalidBbox(String),

    // === Raster Errors ===
    #[error("Band '{band}' has {actual} samples, expected {expected}")]
    ShapeMismatch {
        band: String,
        expected: usize,
        actual: usize,
    },

    #[error("Raster '{0}' has no bands")]
    NoBands(String),

    #[error("Invalid time specification: {0}")]
    InvalidTime(String),

    // === Infrastructure Errors ===
    #[error("I/O error: {0}")]
    Io(String),
}

impl SurveyError {
    pub fn invalid_grid(msg: impl Into<String>) -> Self {
        Self::InvalidGrid(msg.into())
    }

    pub fn invalid_bbox(msg: impl Into<String>) -> Self {
        Self::InvalidBbox(msg.into())
    }
}

impl From<std::io::Error> for SurveyError {
    fn from(err: std::io::Error) -> Self {
        SurveyError::Io(err.to_string())
    }
}
