//! Error types for site classification.

use thiserror::Error;

/// Errors that can occur while classifying cells or writing tables.
#[derive(Error, Debug)]
pub enum ClassifierError {
    /// Signal weights do not sum to one.
    #[error("weights must sum to 1 (got {sum})")]
    InvalidWeights { sum: f64 },

    /// Configuration error.
    #[error("configuration error: {0}")]
    InvalidConfig(String),

    /// A band the classifier needs is not in the cell table.
    #[error("cell table has no '{0}' band")]
    MissingBand(String),

    /// Per-slot columns of different lengths.
    #[error("slot '{slot}' has {actual} values, expected {expected}")]
    SlotLengthMismatch {
        slot: String,
        expected: usize,
        actual: usize,
    },

    /// CSV serialization error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClassifierError {
    /// Create an InvalidConfig error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Result type for classifier operations.
pub type Result<T> = std::result::Result<T, ClassifierError>;
