//! Shared test utilities for the site survey workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Synthetic raster and layer generators
//! - PDS3/PDS4 label fixtures and helpers to write them to disk
//! - Approximate float assertions
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{assert_approx_eq, fixtures, geographic_raster};
//! ```

pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if !(diff <= epsilon) {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Assert that two slices agree elementwise, treating NaN as equal to NaN.
///
/// ```ignore
/// use test_utils::assert_slices_approx_eq;
///
/// assert_slices_approx_eq!(&[1.0, f32::NAN], &[1.0, f32::NAN], 1e-6);
/// ```
#[macro_export]
macro_rules! assert_slices_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left = $left;
        let right = $right;
        assert_eq!(left.len(), right.len(), "slice lengths differ");
        for (i, (l, r)) in left.iter().zip(right.iter()).enumerate() {
            let (l, r) = (*l as f64, *r as f64);
            if l.is_nan() || r.is_nan() {
                assert!(
                    l.is_nan() && r.is_nan(),
                    "index {}: `{:?}` vs `{:?}` (only one is NaN)",
                    i,
                    l,
                    r
                );
            } else if (l - r).abs() > $epsilon as f64 {
                panic!("assertion failed at index {}: `{:?}` vs `{:?}`", i, l, r);
            }
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(0.0, 0.0, 0.0001);
        assert_approx_eq!(-5.5, -5.500001, 0.0001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_rejects_nan() {
        assert_approx_eq!(f64::NAN, 1.0, 0.001);
    }

    #[test]
    fn test_assert_slices_nan_aware() {
        assert_slices_approx_eq!(&[1.0f32, f32::NAN], &[1.000001f32, f32::NAN], 1e-4);
    }

    #[test]
    #[should_panic(expected = "only one is NaN")]
    fn test_assert_slices_nan_mismatch() {
        assert_slices_approx_eq!(&[1.0f32], &[f32::NAN], 1e-4);
    }
}
