//! Swath footprint masking for multi-band index scenes.

use crate::error::{GridProcessorError, Result};

/// Keep only pixels that look like real swath data.
///
/// A pixel is kept iff at least one band is finite, the sum of the bands
/// (NaN counted as 0) is strictly positive, and the largest absolute band
/// value (NaN counted as 0) is at least `epsilon`. Every band is set to NaN
/// at pixels that fail. Returns the number of pixels masked out.
pub fn apply_footprint_mask(bands: &mut [Vec<f32>], epsilon: f64) -> Result<usize> {
    let Some(len) = bands.first().map(Vec::len) else {
        return Ok(0);
    };
    if let Some(bad) = bands.iter().find(|b| b.len() != len) {
        return Err(GridProcessorError::ShapeMismatch {
            expected: len,
            actual: bad.len(),
        });
    }

    let mut masked = 0;
    for p in 0..len {
        let mut any_finite = false;
        let mut sum = 0.0f64;
        let mut max_abs = 0.0f64;
        for band in bands.iter() {
            let v = band[p];
            if v.is_finite() {
                any_finite = true;
                sum += v as f64;
                max_abs = max_abs.max((v as f64).abs());
            }
        }

        let keep = any_finite && sum > 0.0 && max_abs >= epsilon;
        if !keep {
            if any_finite {
                masked += 1;
            }
            for band in bands.iter_mut() {
                band[p] = f32::NAN;
            }
        }
    }

    Ok(masked)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAN: f32 = f32::NAN;

    #[test]
    fn test_mask_rules() {
        let mut bands = vec![
            vec![0.01, NAN, 0.0, -0.02, 1e-9, 0.0],
            vec![NAN, NAN, 0.0, 0.01, 0.0, 0.003],
            vec![0.02, NAN, 0.0, 0.005, 0.0, NAN],
        ];
        let masked = apply_footprint_mask(&mut bands, 1e-7).unwrap();

        // pixel 0: kept
        assert_eq!(bands[0][0], 0.01);
        assert!(bands[1][0].is_nan());
        // pixel 1: nothing finite, stays NaN, not counted
        assert!(bands.iter().all(|b| b[1].is_nan()));
        // pixel 2: zero fill
        assert!(bands.iter().all(|b| b[2].is_nan()));
        // pixel 3: negative sum
        assert!(bands.iter().all(|b| b[3].is_nan()));
        // pixel 4: positive but below epsilon
        assert!(bands.iter().all(|b| b[4].is_nan()));
        // pixel 5: kept
        assert_eq!(bands[1][5], 0.003);

        assert_eq!(masked, 3);
    }

    #[test]
    fn test_epsilon_is_tunable() {
        let mut bands = vec![vec![1e-9f32], vec![0.0]];
        apply_footprint_mask(&mut bands, 1e-10).unwrap();
        assert!(bands[0][0].is_finite());

        let mut bands = vec![vec![0.004f32], vec![0.0]];
        apply_footprint_mask(&mut bands, 0.01).unwrap();
        assert!(bands[0][0].is_nan());
    }

    #[test]
    fn test_shape_mismatch() {
        let mut bands = vec![vec![1.0f32; 3], vec![1.0; 2]];
        assert!(apply_footprint_mask(&mut bands, 1e-7).is_err());
        assert_eq!(apply_footprint_mask(&mut [], 1e-7).unwrap(), 0);
    }
}
