//! Configuration for the grid processor.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use survey_common::grid::DEFAULT_MAX_PIXELS;

use crate::types::InterpolationMethod;

/// Configuration for gridding, compositing and aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridProcessorConfig {
    /// Target mosaic resolution in meters per pixel.
    pub target_resolution_m: f64,

    /// Pixel budget for one mosaic; resolution is coarsened to respect it.
    pub max_pixels: usize,

    /// Interpolation method for reprojection.
    pub interpolation: InterpolationMethod,

    /// Number of cell rows in the aggregation grid.
    pub cell_rows: usize,

    /// Number of cell columns in the aggregation grid.
    pub cell_cols: usize,

    /// Near-zero threshold for the footprint mask.
    pub footprint_epsilon: f64,

    /// Memory budget for the stage cache in megabytes.
    pub stage_cache_size_mb: usize,

    /// Directory for persisted stage outputs (memory only when unset).
    pub stage_cache_dir: Option<PathBuf>,
}

impl Default for GridProcessorConfig {
    fn default() -> Self {
        Self {
            target_resolution_m: 150.0,
            max_pixels: DEFAULT_MAX_PIXELS,
            interpolation: InterpolationMethod::Bilinear,
            cell_rows: 100,
            cell_cols: 100,
            footprint_epsilon: 1e-7,
            stage_cache_size_mb: 512,
            stage_cache_dir: None,
        }
    }
}

impl GridProcessorConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from `SURVEY_*` environment variables.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("SURVEY_TARGET_RESOLUTION_M") {
            if let Ok(res) = val.parse() {
                self.target_resolution_m = res;
            }
        }

        if let Ok(val) = std::env::var("SURVEY_MAX_PIXELS") {
            if let Ok(max) = val.parse() {
                self.max_pixels = max;
            }
        }

        if let Ok(val) = std::env::var("SURVEY_INTERPOLATION") {
            self.interpolation = InterpolationMethod::from_str(&val);
        }

        if let Ok(val) = std::env::var("SURVEY_CELL_GRID") {
            if let Some((rows, cols)) = val.split_once('x') {
                if let (Ok(r), Ok(c)) = (rows.trim().parse(), cols.trim().parse()) {
                    self.cell_rows = r;
                    self.cell_cols = c;
                }
            }
        }

        if let Ok(val) = std::env::var("SURVEY_FOOTPRINT_EPSILON") {
            if let Ok(eps) = val.parse() {
                self.footprint_epsilon = eps;
            }
        }

        if let Ok(val) = std::env::var("SURVEY_STAGE_CACHE_SIZE_MB") {
            if let Ok(size) = val.parse() {
                self.stage_cache_size_mb = size;
            }
        }

        if let Ok(val) = std::env::var("SURVEY_STAGE_CACHE_DIR") {
            self.stage_cache_dir = if val.is_empty() {
                None
            } else {
                Some(PathBuf::from(val))
            };
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.target_resolution_m.is_finite() && self.target_resolution_m > 0.0) {
            return Err("target_resolution_m must be > 0".to_string());
        }

        if self.max_pixels == 0 {
            return Err("max_pixels must be > 0".to_string());
        }

        if self.cell_rows == 0 || self.cell_cols == 0 {
            return Err("cell grid must have at least one row and one column".to_string());
        }

        if !(self.footprint_epsilon.is_finite() && self.footprint_epsilon >= 0.0) {
            return Err("footprint_epsilon must be >= 0".to_string());
        }

        Ok(())
    }

    /// Get the stage cache size in bytes.
    pub fn stage_cache_size_bytes(&self) -> usize {
        self.stage_cache_size_mb * 1024 * 1024
    }
}
