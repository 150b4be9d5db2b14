//! Target grid specification shared by every reprojected source.

use crate::{BoundingBox, Crs, GeoTransform, SurveyError, SurveyResult};
use projection::MARS_RADIUS_M;
use serde::{Deserialize, Serialize};

/// Default pixel budget for a single mosaic grid.
pub const DEFAULT_MAX_PIXELS: usize = 60_000_000;

/// Immutable description of the shared mosaic frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// CRS of the grid (equirectangular centred on the bbox)
    pub crs: Crs,
    /// Pixel-to-world transform in CRS units (meters)
    pub transform: GeoTransform,
    /// Number of columns
    pub width: usize,
    /// Number of rows
    pub height: usize,
    /// Realized resolution in meters per pixel after any coarsening
    pub resolution: f64,
}

impl GridSpec {
    /// Build an equirectangular grid covering a geographic bbox.
    ///
    /// `bbox` is in degrees (x = longitude, y = latitude). The central
    /// meridian is the bbox mid-longitude. If `ceil(extent / resolution)`
    /// in both axes exceeds `max_pixels`, the resolution is multiplied by
    /// `sqrt(W*H / max_pixels)` and the dimensions recomputed until the
    /// budget holds.
    pub fn from_geographic_bbox(
        bbox: &BoundingBox,
        resolution_m: f64,
        max_pixels: usize,
    ) -> SurveyResult<Self> {
        if !bbox.is_valid() {
            return Err(SurveyError::invalid_bbox(format!(
                "degenerate bbox {}",
                bbox.cache_key()
            )));
        }
        if !(resolution_m.is_finite() && resolution_m > 0.0) {
            return Err(SurveyError::invalid_grid(format!(
                "resolution must be positive, got {}",
                resolution_m
            )));
        }
        if max_pixels == 0 {
            return Err(SurveyError::invalid_grid("max_pixels must be > 0"));
        }

        let lon0 = 0.5 * (bbox.min_x + bbox.max_x);
        let left = MARS_RADIUS_M * (bbox.min_x - lon0).to_radians();
        let right = MARS_RADIUS_M * (bbox.max_x - lon0).to_radians();
        let bottom = MARS_RADIUS_M * bbox.min_y.to_radians();
        let top = MARS_RADIUS_M * bbox.max_y.to_radians();

        // Pixel counts stay in f64 so that tiny resolutions cannot overflow.
        let dims = |res: f64| {
            (
                ((right - left) / res).ceil().max(1.0),
                ((top - bottom) / res).ceil().max(1.0),
            )
        };

        let budget = max_pixels as f64;
        let mut resolution = resolution_m;
        let (mut width, mut height) = dims(resolution);
        while width * height > budget {
            let scale = (width * height / budget).sqrt().max(1.0 + 1e-9);
            resolution *= scale;
            (width, height) = dims(resolution);
        }
        let (width, height) = (width as usize, height as usize);

        Ok(Self {
            crs: Crs::MarsEquirectangular { lon0 },
            transform: GeoTransform::from_bounds(left, bottom, right, top, width, height),
            width,
            height,
            resolution,
        })
    }

    /// Total number of pixels.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Check if grid is empty.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// CRS coordinates of the centre of pixel `(col, row)`.
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        self.transform.pixel_center(col, row)
    }

    /// Grid bounds in CRS units.
    pub fn bbox(&self) -> BoundingBox {
        self.transform.bounds(self.width, self.height)
    }

    /// Central meridian of the grid frame, if projected.
    pub fn lon0(&self) -> Option<f64> {
        match self.crs {
            Crs::MarsEquirectangular { lon0 } => Some(lon0),
            Crs::MarsGeographic => None,
        }
    }
}
