//! Equirectangular (plate carrée) projection on a sphere.
//!
//! This is the PROJ `eqc` projection restricted to a spherical body:
//!
//! ```text
//! x = R * (lon - lon0) * cos(lat_ts)
//! y = R * lat
//! ```
//!
//! with all angles in radians. The projection parameters include:
//! - Central meridian (lon0): longitude mapped to x = 0
//! - Latitude of true scale (lat_ts): 0 for the survey grids
//! - Sphere radius: the body's reference radius in meters

use crate::MARS_RADIUS_M;

/// Equirectangular projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Equirectangular {
    /// Central meridian in degrees
    pub lon0: f64,
    /// Latitude of true scale in degrees
    pub lat_ts: f64,
    /// Sphere radius in meters
    pub radius: f64,
}

impl Equirectangular {
    /// Create a projection with explicit parameters.
    pub fn new(lon0: f64, lat_ts: f64, radius: f64) -> Self {
        Self {
            lon0,
            lat_ts,
            radius,
        }
    }

    /// Mars equirectangular projection centred on `lon0` with true scale
    /// at the equator.
    pub fn mars(lon0: f64) -> Self {
        Self::new(lon0, 0.0, MARS_RADIUS_M)
    }

    /// Convert geographic coordinates (degrees) to projected meters.
    ///
    /// The longitude difference from the central meridian is normalized to
    /// [-180, 180) so that 0-360 and ±180 longitude conventions project to
    /// the same x.
    pub fn forward(&self, lon_deg: f64, lat_deg: f64) -> (f64, f64) {
        let mut dlon = lon_deg - self.lon0;
        while dlon >= 180.0 {
            dlon -= 360.0;
        }
        while dlon < -180.0 {
            dlon += 360.0;
        }

        let x = self.radius * dlon.to_radians() * self.lat_ts.to_radians().cos();
        let y = self.radius * lat_deg.to_radians();
        (x, y)
    }

    /// Convert projected meters back to geographic coordinates (degrees).
    ///
    /// Returned longitudes are `lon0 + dlon` without wrapping, so a grid
    /// centred on 77.7°E yields longitudes near 77.7 rather than a
    /// discontinuity at ±180.
    pub fn inverse(&self, x: f64, y: f64) -> (f64, f64) {
        let lon = self.lon0 + (x / (self.radius * self.lat_ts.to_radians().cos())).to_degrees();
        let lat = (y / self.radius).to_degrees();
        (lon, lat)
    }

    /// Meters per degree of longitude at the latitude of true scale.
    pub fn meters_per_degree_lon(&self) -> f64 {
        self.radius * 1.0_f64.to_radians() * self.lat_ts.to_radians().cos()
    }

    /// Meters per degree of latitude.
    pub fn meters_per_degree_lat(&self) -> f64 {
        self.radius * 1.0_f64.to_radians()
    }

    /// PROJ-style definition string, useful in logs and output metadata.
    pub fn proj_string(&self) -> String {
        format!(
            "+proj=eqc +lat_ts={} +lat_0=0 +lon_0={} +a={} +b={} +units=m +no_defs",
            self.lat_ts, self.lon0, self.radius, self.radius
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_maps_to_zero() {
        let proj = Equirectangular::mars(77.7);
        let (x, y) = proj.forward(77.7, 0.0);
        assert!(x.abs() < 1e-6);
        assert!(y.abs() < 1e-6);
    }

    #[test]
    fn test_forward_inverse_jezero() {
        let proj = Equirectangular::mars(77.68875);
        let (x, y) = proj.forward(77.2663, 18.0077);

        // ~0.42 degrees west of the central meridian
        assert!(x < 0.0);
        assert!((y - MARS_RADIUS_M * 18.0077_f64.to_radians()).abs() < 1e-6);

        let (lon, lat) = proj.inverse(x, y);
        assert!((lon - 77.2663).abs() < 1e-9, "lon was {}", lon);
        assert!((lat - 18.0077).abs() < 1e-9, "lat was {}", lat);
    }

    #[test]
    fn test_forward_handles_negative_longitudes() {
        let proj = Equirectangular::mars(77.0);
        let (x_east, _) = proj.forward(-282.0, 10.0);
        let (x_pos, _) = proj.forward(78.0, 10.0);
        assert!((x_east - x_pos).abs() < 1e-6);
    }

    #[test]
    fn test_meters_per_degree() {
        let proj = Equirectangular::mars(0.0);
        let expected = MARS_RADIUS_M * std::f64::consts::PI / 180.0;
        assert!((proj.meters_per_degree_lat() - expected).abs() < 1e-6);
        assert!((proj.meters_per_degree_lon() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_proj_string() {
        let proj = Equirectangular::mars(0.0);
        assert!(proj.proj_string().starts_with("+proj=eqc"));
        assert!(proj.proj_string().contains("+a=3396190"));
    }
}
