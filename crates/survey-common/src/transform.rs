//! Affine pixel/world transforms.

use crate::BoundingBox;
use serde::{Deserialize, Serialize};

/// Tolerance used when deciding whether a transform is the identity.
pub const IDENTITY_TOLERANCE: f64 = 1e-9;

/// Six-coefficient affine transform from pixel (col, row) to world (x, y):
///
/// ```text
/// x = a * col + b * row + c
/// y = d * col + e * row + f
/// ```
///
/// `c`/`f` are the world coordinates of the top-left pixel corner, `a` is
/// the pixel width, `e` the (usually negative) pixel height, and `b`/`d`
/// the rotation terms. Integer pixel coordinates refer to pixel corners;
/// pixel centres sit at `col + 0.5`, `row + 0.5`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl GeoTransform {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// The identity transform, which is what untagged images report.
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0)
    }

    /// North-up transform from the top-left corner and pixel size.
    pub fn from_origin(west: f64, north: f64, xsize: f64, ysize: f64) -> Self {
        Self::new(xsize, 0.0, west, 0.0, -ysize, north)
    }

    /// North-up transform that spans `bounds` with `width x height` pixels.
    pub fn from_bounds(west: f64, south: f64, east: f64, north: f64, width: usize, height: usize) -> Self {
        Self::from_origin(
            west,
            north,
            (east - west) / width as f64,
            (north - south) / height as f64,
        )
    }

    /// True when every coefficient is within `IDENTITY_TOLERANCE` of the
    /// identity transform.
    pub fn is_identity(&self) -> bool {
        (self.a - 1.0).abs() < IDENTITY_TOLERANCE
            && self.b.abs() < IDENTITY_TOLERANCE
            && self.c.abs() < IDENTITY_TOLERANCE
            && self.d.abs() < IDENTITY_TOLERANCE
            && (self.e - 1.0).abs() < IDENTITY_TOLERANCE
            && self.f.abs() < IDENTITY_TOLERANCE
    }

    /// Pixel width (x size).
    pub fn pixel_width(&self) -> f64 {
        self.a
    }

    /// Pixel height (y size, negative for north-up rasters).
    pub fn pixel_height(&self) -> f64 {
        self.e
    }

    /// Map fractional pixel coordinates to world coordinates.
    pub fn pixel_to_world(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.a * col + self.b * row + self.c,
            self.d * col + self.e * row + self.f,
        )
    }

    /// World coordinates of the centre of pixel `(col, row)`.
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        self.pixel_to_world(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Inverse transform, or `None` if the matrix is singular.
    pub fn inverse(&self) -> Option<GeoTransform> {
        let det = self.a * self.e - self.b * self.d;
        if det.abs() < f64::EPSILON || !det.is_finite() {
            return None;
        }

        let ia = self.e / det;
        let ib = -self.b / det;
        let id = -self.d / det;
        let ie = self.a / det;
        Some(GeoTransform {
            a: ia,
            b: ib,
            c: -(ia * self.c + ib * self.f),
            d: id,
            e: ie,
            f: -(id * self.c + ie * self.f),
        })
    }

    /// Map world coordinates to fractional pixel coordinates (corner
    /// convention). Returns `None` for singular transforms.
    pub fn world_to_pixel(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        self.inverse().map(|inv| inv.pixel_to_world(x, y))
    }

    /// World-space bounds of a `width x height` raster.
    pub fn bounds(&self, width: usize, height: usize) -> BoundingBox {
        let corners = [
            self.pixel_to_world(0.0, 0.0),
            self.pixel_to_world(width as f64, 0.0),
            self.pixel_to_world(0.0, height as f64),
            self.pixel_to_world(width as f64, height as f64),
        ];

        let mut bbox = BoundingBox::new(f64::MAX, f64::MAX, f64::MIN, f64::MIN);
        for (x, y) in corners {
            bbox.min_x = bbox.min_x.min(x);
            bbox.min_y = bbox.min_y.min(y);
            bbox.max_x = bbox.max_x.max(x);
            bbox.max_y = bbox.max_y.max(y);
        }
        bbox
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::identity()
    }
}
