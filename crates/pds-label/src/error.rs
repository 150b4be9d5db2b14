//! Error types for label parsing operations.

use thiserror::Error;

/// Result type for label parser operations.
pub type LabelResult<T> = Result<T, LabelError>;

/// Error types for PDS label parsing.
#[derive(Error, Debug)]
pub enum LabelError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Malformed XML
    #[error("Invalid XML in label: {0}")]
    InvalidXml(String),

    /// Label does not carry a complete set of bounding coordinates
    #[error("No bounding coordinates in label: {0}")]
    NoBounds(String),

    /// Neither MAP_SCALE nor MAP_RESOLUTION could be parsed
    #[error("No pixel scale in label: {0}")]
    NoPixelScale(String),
}
