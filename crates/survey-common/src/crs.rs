//! Coordinate Reference System types for Mars body-fixed frames.

use projection::{Equirectangular, MARS_RADIUS_M};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate reference systems the pipeline understands.
///
/// Both frames use the Mars reference sphere (R = 3396190 m).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Crs {
    /// Planetocentric longitude/latitude in degrees
    MarsGeographic,
    /// Equirectangular projection in meters centred on `lon0` degrees
    MarsEquirectangular { lon0: f64 },
}

impl Crs {
    /// Check if this is a geographic (lon/lat) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, Crs::MarsGeographic)
    }

    /// Convert native CRS coordinates to (lon, lat) degrees.
    pub fn to_geographic(&self, x: f64, y: f64) -> (f64, f64) {
        match self {
            Crs::MarsGeographic => (x, y),
            Crs::MarsEquirectangular { lon0 } => Equirectangular::mars(*lon0).inverse(x, y),
        }
    }

    /// Convert (lon, lat) degrees to native CRS coordinates.
    pub fn from_geographic(&self, lon: f64, lat: f64) -> (f64, f64) {
        match self {
            Crs::MarsGeographic => (lon, lat),
            Crs::MarsEquirectangular { lon0 } => Equirectangular::mars(*lon0).forward(lon, lat),
        }
    }

    /// Transform a point from this CRS into `target`.
    pub fn transform_to(&self, target: &Crs, x: f64, y: f64) -> (f64, f64) {
        if self == target {
            return (x, y);
        }
        let (lon, lat) = self.to_geographic(x, y);
        target.from_geographic(lon, lat)
    }

    /// PROJ-style definition string.
    pub fn proj_string(&self) -> String {
        match self {
            Crs::MarsGeographic => format!(
                "+proj=longlat +a={} +b={} +no_defs",
                MARS_RADIUS_M, MARS_RADIUS_M
            ),
            Crs::MarsEquirectangular { lon0 } => Equirectangular::mars(*lon0).proj_string(),
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crs::MarsGeographic => write!(f, "MARS:GEOGRAPHIC"),
            Crs::MarsEquirectangular { lon0 } => write!(f, "MARS:EQC(lon0={})", lon0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geographic_passthrough() {
        let crs = Crs::MarsGeographic;
        assert_eq!(crs.to_geographic(77.5, 18.4), (77.5, 18.4));
        assert!(crs.is_geographic());
    }

    #[test]
    fn test_transform_between_frames() {
        let geo = Crs::MarsGeographic;
        let eqc = Crs::MarsEquirectangular { lon0: 77.5 };

        let (x, y) = geo.transform_to(&eqc, 77.6, 18.4);
        let (lon, lat) = eqc.transform_to(&geo, x, y);
        assert!((lon - 77.6).abs() < 1e-9);
        assert!((lat - 18.4).abs() < 1e-9);
    }

    #[test]
    fn test_display() {
        assert_eq!(Crs::MarsGeographic.to_string(), "MARS:GEOGRAPHIC");
        assert!(Crs::MarsEquirectangular { lon0: 0.0 }
            .proj_string()
            .contains("+proj=eqc"));
    }
}
