//! Mosaic compositing.
//!
//! Combines same-shape reprojected layers for one band into a single
//! mosaic plus a per-pixel count of contributing layers. Missing samples
//! (NaN) never participate in a reduction.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GridProcessorError, Result};

/// Per-pixel reduction across layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reducer {
    /// Maximum of finite inputs, for index products where the strongest
    /// detection wins.
    #[default]
    #[serde(alias = "max")]
    Maximum,
    /// Median of finite inputs (even counts average the middle pair), for
    /// noisy physical measurements.
    Median,
}

impl Reducer {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "median" => Self::Median,
            _ => Self::Maximum,
        }
    }

    /// Reduce the finite values in `values`; NaN if there are none.
    ///
    /// `values` may be reordered.
    pub fn reduce(&self, values: &mut [f32]) -> f32 {
        if values.is_empty() {
            return f32::NAN;
        }
        match self {
            Reducer::Maximum => values.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            Reducer::Median => {
                values.sort_unstable_by(|a, b| a.total_cmp(b));
                let n = values.len();
                if n % 2 == 1 {
                    values[n / 2]
                } else {
                    // Average in f64 so the result does not depend on order
                    ((values[n / 2 - 1] as f64 + values[n / 2] as f64) / 2.0) as f32
                }
            }
        }
    }
}

impl std::fmt::Display for Reducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Maximum => write!(f, "maximum"),
            Self::Median => write!(f, "median"),
        }
    }
}

/// A composited band over the survey grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mosaic {
    /// Band name
    pub band: String,
    pub width: usize,
    pub height: usize,
    /// Reduced values, NaN where no layer had data
    pub data: Vec<f32>,
    /// Number of layers with a finite value at each pixel
    pub coverage: Vec<u32>,
}

impl Mosaic {
    /// Number of pixels with data.
    pub fn valid_count(&self) -> usize {
        self.coverage.iter().filter(|&&c| c > 0).count()
    }

    /// Smallest and largest finite value.
    pub fn value_range(&self) -> Option<(f32, f32)> {
        self.data
            .iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc, &v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Approximate heap size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>() + self.coverage.len() * std::mem::size_of::<u32>()
    }
}

/// Composite `layers` (each `width * height` samples) into one mosaic.
pub fn composite(
    band: &str,
    layers: &[Vec<f32>],
    width: usize,
    height: usize,
    reducer: Reducer,
) -> Result<Mosaic> {
    if layers.is_empty() {
        return Err(GridProcessorError::no_valid_scenes(band));
    }
    let len = width * height;
    if let Some(bad) = layers.iter().find(|l| l.len() != len) {
        return Err(GridProcessorError::ShapeMismatch {
            expected: len,
            actual: bad.len(),
        });
    }

    let mut data = vec![f32::NAN; len];
    let mut coverage = vec![0u32; len];
    let row_len = width.max(1);

    data.par_chunks_mut(row_len)
        .zip(coverage.par_chunks_mut(row_len))
        .enumerate()
        .for_each_init(
            || Vec::with_capacity(layers.len()),
            |scratch: &mut Vec<f32>, (row, (out, cov))| {
                let start = row * row_len;
                for (i, (v, c)) in out.iter_mut().zip(cov.iter_mut()).enumerate() {
                    let p = start + i;
                    scratch.clear();
                    scratch.extend(layers.iter().map(|l| l[p]).filter(|v| v.is_finite()));
                    *c = scratch.len() as u32;
                    *v = reducer.reduce(scratch);
                }
            },
        );

    let mosaic = Mosaic {
        band: band.to_string(),
        width,
        height,
        data,
        coverage,
    };

    debug!(
        band = %band,
        reducer = %reducer,
        layers = layers.len(),
        valid = mosaic.valid_count(),
        total = len,
        "Composited mosaic"
    );

    Ok(mosaic)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAN: f32 = f32::NAN;

    #[test]
    fn test_maximum_skips_missing() {
        let layers = vec![vec![1.0, NAN, NAN, 4.0], vec![3.0, 2.0, NAN, -1.0]];
        let m = composite("D2300", &layers, 2, 2, Reducer::Maximum).unwrap();
        assert_eq!(m.data[0], 3.0);
        assert_eq!(m.data[1], 2.0);
        assert!(m.data[2].is_nan());
        assert_eq!(m.data[3], 4.0);
        assert_eq!(m.coverage, vec![2, 1, 0, 2]);
    }

    #[test]
    fn test_median_even_and_odd() {
        let layers = vec![
            vec![200.0, 210.0],
            vec![220.0, NAN],
            vec![240.0, 230.0],
            vec![NAN, 250.0],
        ];
        let m = composite("BT", &layers, 2, 1, Reducer::Median).unwrap();
        assert_eq!(m.data[0], 220.0);
        assert_eq!(m.data[1], 230.0);

        let even = vec![vec![1.0], vec![4.0]];
        let m = composite("BT", &even, 1, 1, Reducer::Median).unwrap();
        assert_eq!(m.data[0], 2.5);
    }

    #[test]
    fn test_empty_and_mismatched_inputs() {
        assert!(matches!(
            composite("BT", &[], 2, 2, Reducer::Median),
            Err(GridProcessorError::NoValidScenes { .. })
        ));
        assert!(matches!(
            composite("BT", &[vec![1.0; 4], vec![1.0; 3]], 2, 2, Reducer::Median),
            Err(GridProcessorError::ShapeMismatch { expected: 4, actual: 3 })
        ));
    }

    #[test]
    fn test_coverage_matches_nan() {
        let layers = vec![vec![NAN, 1.0, NAN], vec![NAN, NAN, 5.0]];
        let m = composite("x", &layers, 3, 1, Reducer::Maximum).unwrap();
        for (v, c) in m.data.iter().zip(&m.coverage) {
            assert_eq!(*c == 0, v.is_nan());
        }
        assert_eq!(m.value_range(), Some((1.0, 5.0)));
    }

    #[test]
    fn test_reducer_parsing() {
        assert_eq!(Reducer::from_str("MEDIAN"), Reducer::Median);
        assert_eq!(Reducer::from_str("max"), Reducer::Maximum);
        let r: Reducer = serde_json::from_str("\"max\"").unwrap();
        assert_eq!(r, Reducer::Maximum);
    }
}
