//! Longitude bookkeeping for geographic (lon/lat) frames.

/// Normalize a west/east longitude pair so that the span is positive.
///
/// Labels use either the ±180 or the 0-360 convention. A pair where both
/// bounds are negative is moved into 0-360. If the range still crosses the
/// reference meridian (east < west), the east bound is unwrapped by one
/// turn so that `east - west` is the true positive span.
pub fn normalize_lon_range(west: f64, east: f64) -> (f64, f64) {
    let (mut west, mut east) = (west, east);
    if west < 0.0 && east < 0.0 {
        west += 360.0;
        east += 360.0;
    }
    if east < west {
        east += 360.0;
    }
    (west, east)
}

/// Shift `lon` by whole turns so it lies within ±180° of `center`.
///
/// Non-finite inputs come back non-finite.
pub fn wrap_lon_near(lon: f64, center: f64) -> f64 {
    (lon - center + 180.0).rem_euclid(360.0) + center - 180.0
}
