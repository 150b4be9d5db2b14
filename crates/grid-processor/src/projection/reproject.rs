//! Warping source rasters onto the shared survey grid.
//!
//! Every destination pixel centre is taken from grid coordinates to the
//! source CRS, then through the inverse source transform to a fractional
//! source pixel index (pixel-centre convention). Samples that land outside
//! the source are NaN.

use pds_label::LabelBounds;
use projection::wrap_lon_near;
use rayon::prelude::*;
use survey_common::{Crs, GeoTransform, GridSpec, Raster};
use tracing::{debug, warn};

use super::interpolation::sample;
use crate::error::{GridProcessorError, Result};
use crate::types::InterpolationMethod;

/// Where a source raster sits, after any label fallback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Georeference {
    pub crs: Crs,
    pub transform: GeoTransform,
    /// True when the placement was synthesized from label bounds.
    pub from_label: bool,
}

impl Georeference {
    /// Decide how to place `raster`.
    ///
    /// A raster with a CRS and a non-identity transform is used as is.
    /// Otherwise plausible label bounds (if any) define a Mars geographic
    /// transform spanning the raster. A raster with a real transform but
    /// no CRS and no label is assumed to be Mars geographic.
    pub fn resolve(raster: &Raster, label: Option<&LabelBounds>) -> Result<Self> {
        let usable_transform = raster.transform.filter(|t| !t.is_identity());

        if let (Some(crs), Some(transform)) = (raster.crs, usable_transform) {
            return Ok(Self {
                crs,
                transform,
                from_label: false,
            });
        }

        if let Some(bounds) = label.filter(|b| {
            let ok = b.is_plausible();
            if !ok {
                warn!(scene = %raster.source, "Ignoring out-of-range label bounds");
            }
            ok
        }) {
            let b = bounds.normalized();
            debug!(
                scene = %raster.source,
                west = b.west,
                east = b.east,
                south = b.south,
                north = b.north,
                "Georeferencing from label bounds"
            );
            return Ok(Self {
                crs: Crs::MarsGeographic,
                transform: GeoTransform::from_bounds(
                    b.west,
                    b.south,
                    b.east,
                    b.north,
                    raster.width,
                    raster.height,
                ),
                from_label: true,
            });
        }

        if let Some(transform) = usable_transform {
            warn!(scene = %raster.source, "No CRS declared, assuming Mars geographic");
            return Ok(Self {
                crs: Crs::MarsGeographic,
                transform,
                from_label: false,
            });
        }

        Err(GridProcessorError::missing_georeference(&raster.source))
    }
}

/// Reprojects rasters onto one destination grid.
#[derive(Debug, Clone, Copy)]
pub struct Reprojector<'a> {
    grid: &'a GridSpec,
    method: InterpolationMethod,
}

impl<'a> Reprojector<'a> {
    pub fn new(grid: &'a GridSpec, method: InterpolationMethod) -> Self {
        Self { grid, method }
    }

    pub fn grid(&self) -> &GridSpec {
        self.grid
    }

    /// Reproject every band of `raster`.
    pub fn reproject(&self, raster: &Raster, label: Option<&LabelBounds>) -> Result<Vec<Vec<f32>>> {
        let indices: Vec<usize> = (0..raster.bands.len()).collect();
        self.reproject_bands(raster, &indices, label)
    }

    /// Reproject the selected bands of `raster`, in the order given.
    pub fn reproject_bands(
        &self,
        raster: &Raster,
        band_indices: &[usize],
        label: Option<&LabelBounds>,
    ) -> Result<Vec<Vec<f32>>> {
        let georef = Georeference::resolve(raster, label)?;
        band_indices
            .iter()
            .map(|&i| self.reproject_band(raster, i, &georef))
            .collect()
    }

    /// Reproject one band with an already resolved georeference.
    ///
    /// The band's scale/offset is applied before sampling.
    pub fn reproject_band(
        &self,
        raster: &Raster,
        band_index: usize,
        georef: &Georeference,
    ) -> Result<Vec<f32>> {
        let band = raster
            .bands
            .get(band_index)
            .ok_or_else(|| GridProcessorError::BandNotFound {
                scene: raster.source.clone(),
                index: band_index,
            })?;
        let inverse = georef
            .transform
            .inverse()
            .ok_or_else(|| GridProcessorError::missing_georeference(&raster.source))?;

        let src = band.rescaled();
        let (src_w, src_h) = (raster.width, raster.height);
        let max_col = src_w as f64 - 1.0;
        let max_row = src_h as f64 - 1.0;

        // Geographic sources are unwrapped around their own centre so that
        // 0-360 and ±180 conventions line up with the grid.
        let src_center_lon = {
            let b = georef.transform.bounds(src_w, src_h);
            0.5 * (b.min_x + b.max_x)
        };

        let grid = self.grid;
        let method = self.method;
        let mut output = vec![f32::NAN; grid.len()];

        output
            .par_chunks_mut(grid.width)
            .enumerate()
            .for_each(|(row, out_row)| {
                for (col, out) in out_row.iter_mut().enumerate() {
                    let (x, y) = grid.pixel_center(col, row);
                    let (mut sx, sy) = grid.crs.transform_to(&georef.crs, x, y);
                    if georef.crs.is_geographic() {
                        sx = wrap_lon_near(sx, src_center_lon);
                    }

                    let (c, r) = inverse.pixel_to_world(sx, sy);
                    let (c, r) = (c - 0.5, r - 0.5);
                    if c < 0.0 || r < 0.0 || c > max_col || r > max_row {
                        continue;
                    }
                    *out = sample(method, &src, src_w, src_h, c, r);
                }
            });

        debug!(
            scene = %raster.source,
            band = %band.name,
            valid = output.iter().filter(|v| v.is_finite()).count(),
            total = output.len(),
            "Reprojected band"
        );

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_common::grid::DEFAULT_MAX_PIXELS;
    use survey_common::{Band, BoundingBox};

    fn grid() -> GridSpec {
        GridSpec::from_geographic_bbox(
            &BoundingBox::new(77.0, 18.0, 78.0, 19.0),
            2000.0,
            DEFAULT_MAX_PIXELS,
        )
        .unwrap()
    }

    fn constant_raster(value: f32) -> Raster {
        Raster::new("tile", 20, 20, vec![Band::new("BT", vec![value; 400])]).unwrap()
    }

    #[test]
    fn test_missing_georeference() {
        let raster = constant_raster(1.0).with_transform(GeoTransform::identity());
        let err = Georeference::resolve(&raster, None).unwrap_err();
        assert!(matches!(err, GridProcessorError::MissingGeoreference { ref scene } if scene == "tile"));
    }

    #[test]
    fn test_label_fallback_for_identity_transform() {
        let raster = constant_raster(1.0)
            .with_crs(Crs::MarsGeographic)
            .with_transform(GeoTransform::identity());
        let label = LabelBounds::new(-283.0, -282.0, 18.0, 19.0);
        let georef = Georeference::resolve(&raster, Some(&label)).unwrap();

        assert!(georef.from_label);
        assert_eq!(georef.crs, Crs::MarsGeographic);
        let (x, y) = georef.transform.pixel_to_world(0.0, 0.0);
        assert_eq!((x, y), (77.0, 19.0));
    }

    #[test]
    fn test_out_of_range_label_is_missing_georeference() {
        let grid = grid();
        let raster = constant_raster(1.0);
        let label = LabelBounds::new(1e20, 1.0000000000001e20, 18.0, 19.0);

        let err = Reprojector::new(&grid, InterpolationMethod::Bilinear)
            .reproject(&raster, Some(&label))
            .unwrap_err();
        assert!(matches!(err, GridProcessorError::MissingGeoreference { .. }));
    }

    #[test]
    fn test_far_off_source_longitude_terminates() {
        let grid = grid();
        let raster = constant_raster(1.0)
            .with_crs(Crs::MarsGeographic)
            .with_transform(GeoTransform::from_bounds(1e20, 18.0, 1.0000000000001e20, 19.0, 20, 20));

        let out = Reprojector::new(&grid, InterpolationMethod::Nearest)
            .reproject(&raster, None)
            .unwrap();
        assert_eq!(out[0].len(), grid.len());
    }

    #[test]
    fn test_full_coverage_constant() {
        let grid = grid();
        let raster = constant_raster(250.0)
            .with_crs(Crs::MarsGeographic)
            .with_transform(GeoTransform::from_bounds(76.5, 17.5, 78.5, 19.5, 20, 20));

        let out = Reprojector::new(&grid, InterpolationMethod::Bilinear)
            .reproject(&raster, None)
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].len(), grid.len());
        assert!(out[0].iter().all(|v| (*v - 250.0).abs() < 1e-4));
    }

    #[test]
    fn test_partial_coverage_is_nan_outside() {
        let grid = grid();
        // Covers only the western half of the grid
        let raster = constant_raster(1.0)
            .with_crs(Crs::MarsGeographic)
            .with_transform(GeoTransform::from_bounds(76.0, 17.0, 77.5, 20.0, 20, 20));

        let out = Reprojector::new(&grid, InterpolationMethod::Nearest)
            .reproject(&raster, None)
            .unwrap();
        let row = &out[0][..grid.width];
        assert!(row[0].is_finite());
        assert!(row[grid.width - 1].is_nan());
    }

    #[test]
    fn test_scale_offset_applied() {
        let grid = grid();
        let band = Band::new("BT", vec![100.0; 400]).with_scale_offset(2.0, 5.0);
        let raster = Raster::new("tile", 20, 20, vec![band])
            .unwrap()
            .with_crs(Crs::MarsGeographic)
            .with_transform(GeoTransform::from_bounds(76.5, 17.5, 78.5, 19.5, 20, 20));

        let out = Reprojector::new(&grid, InterpolationMethod::Bilinear)
            .reproject(&raster, None)
            .unwrap();
        assert!((out[0][0] - 205.0).abs() < 1e-3);
    }

    #[test]
    fn test_negative_longitude_source() {
        let grid = grid();
        let raster = constant_raster(3.0)
            .with_crs(Crs::MarsGeographic)
            .with_transform(GeoTransform::from_bounds(-283.5, 17.5, -281.5, 19.5, 20, 20));

        let out = Reprojector::new(&grid, InterpolationMethod::Bilinear)
            .reproject(&raster, None)
            .unwrap();
        assert!(out[0].iter().all(|v| (*v - 3.0).abs() < 1e-5));
    }

    #[test]
    fn test_band_not_found() {
        let grid = grid();
        let raster = constant_raster(1.0)
            .with_crs(Crs::MarsGeographic)
            .with_transform(GeoTransform::from_bounds(76.5, 17.5, 78.5, 19.5, 20, 20));
        let err = Reprojector::new(&grid, InterpolationMethod::Bilinear)
            .reproject_bands(&raster, &[3], None)
            .unwrap_err();
        assert!(matches!(err, GridProcessorError::BandNotFound { index: 3, .. }));
    }
}
