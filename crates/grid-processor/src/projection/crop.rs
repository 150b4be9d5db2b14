//! Cutting a source raster down to a geographic window on its native
//! pixels.

use pds_label::LabelBounds;
use projection::wrap_lon_near;
use survey_common::{BoundingBox, Crs, GeoTransform, Raster};
use tracing::debug;

use super::reproject::Georeference;
use crate::error::{GridProcessorError, Result};

/// Smallest window, per axis, that still has a central difference.
pub const MIN_CROP_PIXELS: usize = 2;

const SNAP: f64 = 1e-6;

/// Pixel window `(col0, row0, width, height)` of `raster` covering the
/// geographic `bbox`, clamped to the raster.
///
/// Partially covered edge pixels are included. An empty intersection
/// gives a zero-sized window.
pub fn pixel_window(raster: &Raster, georef: &Georeference, bbox: &BoundingBox) -> Result<(usize, usize, usize, usize)> {
    let inverse = georef
        .transform
        .inverse()
        .ok_or_else(|| GridProcessorError::missing_georeference(&raster.source))?;
    let center_lon = georef.transform.bounds(raster.width, raster.height).center().0;

    let corners = [
        (bbox.min_x, bbox.min_y),
        (bbox.min_x, bbox.max_y),
        (bbox.max_x, bbox.min_y),
        (bbox.max_x, bbox.max_y),
    ];
    let (mut c0, mut r0, mut c1, mut r1) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
    for (lon, lat) in corners {
        let lon = if georef.crs.is_geographic() {
            wrap_lon_near(lon, center_lon)
        } else {
            lon
        };
        let (x, y) = Crs::MarsGeographic.transform_to(&georef.crs, lon, lat);
        let (c, r) = inverse.pixel_to_world(x, y);
        c0 = c0.min(c);
        c1 = c1.max(c);
        r0 = r0.min(r);
        r1 = r1.max(r);
    }
    if ![c0, r0, c1, r1].iter().all(|v| v.is_finite()) {
        return Err(GridProcessorError::missing_georeference(&raster.source));
    }

    // Edges within SNAP of a pixel boundary count as on it.
    let lower = |v: f64, max: usize| (v + SNAP).floor().clamp(0.0, max as f64) as usize;
    let upper = |v: f64, max: usize| (v - SNAP).ceil().clamp(0.0, max as f64) as usize;
    let (col0, col1) = (lower(c0, raster.width), upper(c1, raster.width));
    let (row0, row1) = (lower(r0, raster.height), upper(r1, raster.height));
    Ok((col0, row0, col1.saturating_sub(col0), row1.saturating_sub(row0)))
}

/// Crop `raster` to the geographic `bbox`.
///
/// The result carries the resolved CRS and the window's transform, so it
/// no longer needs label bounds. Windows under 2×2 pixels are an error.
pub fn crop_to_bbox(raster: &Raster, label: Option<&LabelBounds>, bbox: &BoundingBox) -> Result<Raster> {
    let georef = Georeference::resolve(raster, label)?;
    let (col0, row0, width, height) = pixel_window(raster, &georef, bbox)?;
    if width < MIN_CROP_PIXELS || height < MIN_CROP_PIXELS {
        return Err(GridProcessorError::CropTooSmall {
            scene: raster.source.clone(),
            width,
            height,
        });
    }

    let bands = raster
        .bands
        .iter()
        .map(|band| {
            let data = (row0..row0 + height)
                .flat_map(|r| {
                    let start = r * raster.width + col0;
                    band.data[start..start + width].iter().copied()
                })
                .collect();
            let mut out = band.clone();
            out.data = data;
            out
        })
        .collect();

    let t = georef.transform;
    let (c, f) = t.pixel_to_world(col0 as f64, row0 as f64);
    let transform = GeoTransform::new(t.a, t.b, c, t.d, t.e, f);

    debug!(
        scene = %raster.source,
        col0,
        row0,
        width,
        height,
        "Cropped raster to survey area"
    );

    let mut out = Raster::new(raster.source.clone(), width, height, bands)?
        .with_crs(georef.crs)
        .with_transform(transform);
    out.nodata = raster.nodata;
    Ok(out)
}
