//! Synthetic rasters and layers for the survey pipeline tests.
//!
//! These generators create predictable, verifiable patterns so that tests
//! can compute expected values by hand.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use survey_common::{Band, Crs, GeoTransform, Raster};

/// Creates a checkerboard where pixels with even `row + col` are NaN and
/// the rest hold `row * width + col + 1`.
pub fn create_checkerboard(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            if (row + col) % 2 == 0 {
                data.push(f32::NAN);
            } else {
                data.push((row * width + col + 1) as f32);
            }
        }
    }
    data
}

/// Creates brightness temperatures in Kelvin, cold in the north-west and
/// warm in the south-east (roughly 170 K to 270 K).
pub fn create_brightness_temperature_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let x = col as f32 / width.max(1) as f32;
            let y = row as f32 / height.max(1) as f32;
            data.push(170.0 + x * 50.0 + y * 50.0);
        }
    }
    data
}

/// Creates a DEM that rises `rise_per_col` metres per column.
pub fn create_ramp_dem(width: usize, height: usize, base: f32, rise_per_col: f32) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for _row in 0..height {
        for col in 0..width {
            data.push(base + col as f32 * rise_per_col);
        }
    }
    data
}

/// Creates `count` random layers of `len` samples in `[lo, hi)`, with
/// roughly `missing_fraction` of samples set to NaN.
///
/// The same seed always gives the same layers.
pub fn random_layers(
    seed: u64,
    count: usize,
    len: usize,
    lo: f32,
    hi: f32,
    missing_fraction: f64,
) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            (0..len)
                .map(|_| {
                    if rng.gen_bool(missing_fraction) {
                        f32::NAN
                    } else {
                        rng.gen_range(lo..hi)
                    }
                })
                .collect()
        })
        .collect()
}

/// Builds a Mars geographic raster spanning `(west, south, east, north)`.
///
/// # Panics
///
/// Panics if any band does not hold `width * height` samples.
pub fn geographic_raster(
    source: &str,
    bounds: (f64, f64, f64, f64),
    width: usize,
    height: usize,
    bands: Vec<Band>,
) -> Raster {
    let (west, south, east, north) = bounds;
    Raster::new(source, width, height, bands)
        .expect("band shapes match raster size")
        .with_crs(Crs::MarsGeographic)
        .with_transform(GeoTransform::from_bounds(west, south, east, north, width, height))
}

/// Single-band geographic raster filled with `value`.
pub fn constant_raster(
    source: &str,
    band: &str,
    bounds: (f64, f64, f64, f64),
    width: usize,
    height: usize,
    value: f32,
) -> Raster {
    geographic_raster(
        source,
        bounds,
        width,
        height,
        vec![Band::new(band, vec![value; width * height])],
    )
}

/// Three-band spectral index scene with constant band values, named the
/// way index products usually name them.
pub fn spectral_scene(
    source: &str,
    bounds: (f64, f64, f64, f64),
    width: usize,
    height: usize,
    (d2300, bd2210, bd1900): (f32, f32, f32),
) -> Raster {
    let len = width * height;
    geographic_raster(
        source,
        bounds,
        width,
        height,
        vec![
            Band::new("D2300", vec![d2300; len]),
            Band::new("BD2210_2", vec![bd2210; len]),
            Band::new("BD1900_2", vec![bd1900; len]),
        ],
    )
}

/// Raster with no CRS and an identity transform, as produced by readers
/// that found no georeferencing in the file.
pub fn ungeoreferenced_raster(source: &str, width: usize, height: usize, value: f32) -> Raster {
    Raster::new(
        source,
        width,
        height,
        vec![Band::new("BT", vec![value; width * height])],
    )
    .expect("band shape matches raster size")
    .with_transform(GeoTransform::identity())
}
