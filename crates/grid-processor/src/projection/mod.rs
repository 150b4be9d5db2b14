//! Projection utilities for grid processing.
//!
//! This module handles warping source rasters onto the shared survey grid,
//! the sampling primitives that warp relies on, and native-pixel crops.

pub mod crop;
pub mod interpolation;
pub mod reproject;

pub use crop::{crop_to_bbox, pixel_window, MIN_CROP_PIXELS};
pub use interpolation::{bilinear_interpolate, nearest_interpolate, sample};
pub use reproject::{Georeference, Reprojector};
