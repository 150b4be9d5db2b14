//! Coordinate transformations for planetary body-fixed frames.
//!
//! Implements the two frames the survey pipeline needs from scratch:
//! a spherical geographic (lon/lat) frame and the equirectangular
//! (plate carrée, "eqc") projection used as the shared mosaic grid.

pub mod equirectangular;
pub mod geographic;

pub use equirectangular::Equirectangular;
pub use geographic::{normalize_lon_range, wrap_lon_near};

/// Mars reference sphere radius in meters (IAU 2000 equatorial radius).
pub const MARS_RADIUS_M: f64 = 3_396_190.0;

/// Approximate surface distance of one degree on the Mars sphere, as used
/// by topography labels that only carry a pixels-per-degree resolution.
pub const MARS_METERS_PER_DEGREE: f64 = 59_200.0;
