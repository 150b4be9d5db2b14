//! Sampling primitives used by the reprojector.
//!
//! Coordinates are fractional pixel indices where `(0.0, 0.0)` is the
//! centre of the top-left sample.

use crate::types::InterpolationMethod;

/// Nearest neighbor interpolation.
///
/// Returns the value of the nearest grid point, NaN outside the grid.
pub fn nearest_interpolate(data: &[f32], width: usize, height: usize, x: f64, y: f64) -> f32 {
    if !(x.is_finite() && y.is_finite()) {
        return f32::NAN;
    }
    let col = x.round();
    let row = y.round();
    if col < 0.0 || row < 0.0 || col >= width as f64 || row >= height as f64 {
        return f32::NAN;
    }

    data[row as usize * width + col as usize]
}

/// Bilinear interpolation.
///
/// Interpolates between the four surrounding grid points. If any of them
/// is NaN the result is NaN, so missing data never bleeds into valid
/// neighbours.
pub fn bilinear_interpolate(data: &[f32], width: usize, height: usize, x: f64, y: f64) -> f32 {
    if !(x.is_finite() && y.is_finite()) || x < 0.0 || y < 0.0 || width == 0 || height == 0 {
        return f32::NAN;
    }

    let x0 = x.floor() as usize;
    let y0 = y.floor() as usize;
    if x0 >= width || y0 >= height {
        return f32::NAN;
    }
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);

    let xf = (x - x0 as f64) as f32;
    let yf = (y - y0 as f64) as f32;

    let v00 = data[y0 * width + x0];
    let v10 = data[y0 * width + x1];
    let v01 = data[y1 * width + x0];
    let v11 = data[y1 * width + x1];

    if v00.is_nan() || v10.is_nan() || v01.is_nan() || v11.is_nan() {
        return f32::NAN;
    }

    let top = v00 * (1.0 - xf) + v10 * xf;
    let bottom = v01 * (1.0 - xf) + v11 * xf;
    top * (1.0 - yf) + bottom * yf
}

/// Sample with the given method.
#[inline]
pub fn sample(
    method: InterpolationMethod,
    data: &[f32],
    width: usize,
    height: usize,
    x: f64,
    y: f64,
) -> f32 {
    match method {
        InterpolationMethod::Nearest => nearest_interpolate(data, width, height, x, y),
        InterpolationMethod::Bilinear => bilinear_interpolate(data, width, height, x, y),
    }
}
