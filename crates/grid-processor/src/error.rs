//! Error types for grid processing.

use pds_label::LabelError;
use survey_common::SurveyError;
use thiserror::Error;

/// Errors that can occur during grid processing.
#[derive(Error, Debug)]
pub enum GridProcessorError {
    /// Source has neither a usable transform/CRS nor label bounds.
    #[error("no georeference for '{scene}': missing CRS/transform and no label bounds")]
    MissingGeoreference { scene: String },

    /// No source produced data for a mosaic band.
    #[error("no valid scenes for band '{band}'")]
    NoValidScenes { band: String },

    /// Arrays that must share a shape do not.
    #[error("shape mismatch: expected {expected} samples, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },

    /// Window over the survey area is too small for terrain derivatives.
    #[error("crop of '{scene}' to the survey area is {width}x{height} pixels, need at least 2x2")]
    CropTooSmall { scene: String, width: usize, height: usize },

    /// Cell grid does not fit the mosaic.
    #[error("invalid cell grid: {0}")]
    InvalidCellGrid(String),

    /// Band index outside the raster.
    #[error("band {index} not present in '{scene}'")]
    BandNotFound { scene: String, index: usize },

    /// Configuration error.
    #[error("configuration error: {0}")]
    InvalidConfig(String),

    /// Disk tier IO error.
    #[error("storage error: {0}")]
    StorageError(String),

    /// Cache error.
    #[error("cache error: {0}")]
    CacheError(String),

    /// Data model error.
    #[error(transparent)]
    Survey(#[from] SurveyError),

    /// Label parsing error.
    #[error(transparent)]
    Label(#[from] LabelError),
}

impl GridProcessorError {
    /// Create a MissingGeoreference error.
    pub fn missing_georeference(scene: impl Into<String>) -> Self {
        Self::MissingGeoreference {
            scene: scene.into(),
        }
    }

    /// Create a NoValidScenes error.
    pub fn no_valid_scenes(band: impl Into<String>) -> Self {
        Self::NoValidScenes { band: band.into() }
    }

    /// Create an InvalidCellGrid error.
    pub fn invalid_cell_grid(msg: impl Into<String>) -> Self {
        Self::InvalidCellGrid(msg.into())
    }
}

impl From<std::io::Error> for GridProcessorError {
    fn from(err: std::io::Error) -> Self {
        Self::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for GridProcessorError {
    fn from(err: serde_json::Error) -> Self {
        Self::CacheError(err.to_string())
    }
}

/// Result type for grid processor operations.
pub type Result<T> = std::result::Result<T, GridProcessorError>;
