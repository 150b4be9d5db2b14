//! Terrain derivatives of an elevation mosaic.
//!
//! All three derivatives take a row-major DEM with NaN for missing data
//! and return a same-shape layer.

use rayon::prelude::*;

use crate::error::{GridProcessorError, Result};

fn check_shape(dem: &[f32], width: usize, height: usize) -> Result<()> {
    if dem.len() != width * height {
        return Err(GridProcessorError::ShapeMismatch {
            expected: width * height,
            actual: dem.len(),
        });
    }
    Ok(())
}

/// Gradient along one axis at index `i` of a line of `n` samples.
///
/// Central difference inside, one-sided at the ends, 0 for a single sample.
#[inline]
fn gradient_at(get: impl Fn(usize) -> f64, i: usize, n: usize, spacing: f64) -> f64 {
    if n < 2 {
        return 0.0;
    }
    if i == 0 {
        (get(1) - get(0)) / spacing
    } else if i == n - 1 {
        (get(n - 1) - get(n - 2)) / spacing
    } else {
        (get(i + 1) - get(i - 1)) / (2.0 * spacing)
    }
}

/// Slope in degrees from elevation in metres.
///
/// `dx_m` and `dy_m` are the pixel sizes along columns and rows. A NaN
/// neighbour propagates NaN into the gradient, and pixels that are NaN in
/// the DEM stay NaN.
pub fn slope_degrees(dem: &[f32], width: usize, height: usize, dx_m: f64, dy_m: f64) -> Result<Vec<f32>> {
    check_shape(dem, width, height)?;
    if !(dx_m > 0.0 && dy_m > 0.0) {
        return Err(GridProcessorError::InvalidConfig(format!(
            "pixel spacing must be positive, got {dx_m} x {dy_m}"
        )));
    }

    let mut out = vec![f32::NAN; dem.len()];
    out.par_chunks_mut(width.max(1))
        .enumerate()
        .for_each(|(r, out_row)| {
            for (c, out) in out_row.iter_mut().enumerate() {
                if dem[r * width + c].is_nan() {
                    continue;
                }
                let gx = gradient_at(|i| dem[r * width + i] as f64, c, width, dx_m);
                let gy = gradient_at(|i| dem[i * width + c] as f64, r, height, dy_m);
                *out = (gx.hypot(gy)).atan().to_degrees() as f32;
            }
        });

    Ok(out)
}

/// Finite values in the 3×3 window around (r, c), centre included.
fn window(dem: &[f32], width: usize, height: usize, r: usize, c: usize, buf: &mut Vec<f64>) {
    buf.clear();
    for rr in r.saturating_sub(1)..=(r + 1).min(height - 1) {
        for cc in c.saturating_sub(1)..=(c + 1).min(width - 1) {
            let v = dem[rr * width + cc];
            if v.is_finite() {
                buf.push(v as f64);
            }
        }
    }
}

/// Population standard deviation of the finite values in each 3×3 window.
///
/// Out-of-bounds neighbours count as missing. NaN only where the whole
/// window is missing.
pub fn roughness_std(dem: &[f32], width: usize, height: usize) -> Result<Vec<f32>> {
    check_shape(dem, width, height)?;

    let mut out = vec![f32::NAN; dem.len()];
    out.par_chunks_mut(width.max(1))
        .enumerate()
        .for_each(|(r, out_row)| {
            let mut buf = Vec::with_capacity(9);
            for (c, out) in out_row.iter_mut().enumerate() {
                window(dem, width, height, r, c, &mut buf);
                if buf.is_empty() {
                    continue;
                }
                let n = buf.len() as f64;
                let mean = buf.iter().sum::<f64>() / n;
                let var = buf.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                *out = var.sqrt() as f32;
            }
        });

    Ok(out)
}

/// Terrain Ruggedness Index: sum of absolute elevation differences between
/// each pixel and its finite 8-neighbours.
///
/// NaN where the centre is missing or no neighbour is finite.
pub fn terrain_ruggedness_index(dem: &[f32], width: usize, height: usize) -> Result<Vec<f32>> {
    check_shape(dem, width, height)?;

    let mut out = vec![f32::NAN; dem.len()];
    out.par_chunks_mut(width.max(1))
        .enumerate()
        .for_each(|(r, out_row)| {
            for (c, out) in out_row.iter_mut().enumerate() {
                let centre = dem[r * width + c];
                if !centre.is_finite() {
                    continue;
                }
                let mut sum = 0.0f64;
                let mut count = 0;
                for rr in r.saturating_sub(1)..=(r + 1).min(height - 1) {
                    for cc in c.saturating_sub(1)..=(c + 1).min(width - 1) {
                        if rr == r && cc == c {
                            continue;
                        }
                        let v = dem[rr * width + cc];
                        if v.is_finite() {
                            sum += (v as f64 - centre as f64).abs();
                            count += 1;
                        }
                    }
                }
                if count > 0 {
                    *out = sum as f32;
                }
            }
        });

    Ok(out)
}
