//! In-memory raster model.
//!
//! Samples are `f32`, row-major. NaN is the only missing-data sentinel: a
//! declared nodata value is replaced with NaN when it is attached to the
//! raster, so downstream arithmetic never sees it.

use serde::{Deserialize, Serialize};

use crate::{Crs, GeoTransform, SurveyError, SurveyResult};

/// One band of a raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    /// Band description (e.g. `BD1900_2`)
    pub name: String,
    /// Row-major samples
    pub data: Vec<f32>,
    /// Optional linear scale factor
    #[serde(default)]
    pub scale: Option<f64>,
    /// Optional linear offset
    #[serde(default)]
    pub offset: Option<f64>,
}

impl Band {
    pub fn new(name: impl Into<String>, data: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            data,
            scale: None,
            offset: None,
        }
    }

    /// Attach a scale/offset pair.
    pub fn with_scale_offset(mut self, scale: f64, offset: f64) -> Self {
        self.scale = Some(scale);
        self.offset = Some(offset);
        self
    }

    /// True when the band declares a scale or offset other than 1/0.
    pub fn needs_rescale(&self) -> bool {
        self.scale.map_or(false, |s| s != 1.0) || self.offset.map_or(false, |o| o != 0.0)
    }

    /// Samples with `v * scale + offset` applied. NaN stays NaN.
    pub fn rescaled(&self) -> Vec<f32> {
        if !self.needs_rescale() {
            return self.data.clone();
        }
        let scale = self.scale.unwrap_or(1.0);
        let offset = self.offset.unwrap_or(0.0);
        self.data
            .iter()
            .map(|&v| (v as f64 * scale + offset) as f32)
            .collect()
    }
}

/// A georeferenced (or not yet georeferenced) multi-band raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Raster {
    /// Identifier used in logs and error messages
    pub source: String,
    pub width: usize,
    pub height: usize,
    pub bands: Vec<Band>,
    #[serde(default)]
    pub transform: Option<GeoTransform>,
    #[serde(default)]
    pub crs: Option<Crs>,
    /// Declared nodata value (already converted to NaN in the band data)
    #[serde(default)]
    pub nodata: Option<f64>,
}

impl Raster {
    /// Create a raster, checking that every band has `width * height`
    /// samples.
    pub fn new(
        source: impl Into<String>,
        width: usize,
        height: usize,
        bands: Vec<Band>,
    ) -> SurveyResult<Self> {
        let source = source.into();
        if bands.is_empty() {
            return Err(SurveyError::NoBands(source));
        }
        let expected = width * height;
        for band in &bands {
            if band.data.len() != expected {
                return Err(SurveyError::ShapeMismatch {
                    band: band.name.clone(),
                    expected,
                    actual: band.data.len(),
                });
            }
        }

        Ok(Self {
            source,
            width,
            height,
            bands,
            transform: None,
            crs: None,
            nodata: None,
        })
    }

    pub fn with_transform(mut self, transform: GeoTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = Some(crs);
        self
    }

    /// Declare a nodata value and replace every matching sample with NaN.
    pub fn with_nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        if nodata.is_nan() {
            return self;
        }
        let sentinel = nodata as f32;
        for band in &mut self.bands {
            for v in band.data.iter_mut() {
                if *v == sentinel {
                    *v = f32::NAN;
                }
            }
        }
        self
    }

    /// True when the raster carries a CRS and a non-identity transform.
    pub fn has_georeference(&self) -> bool {
        self.crs.is_some() && self.transform.map_or(false, |t| !t.is_identity())
    }

    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(|b| b.name.as_str()).collect()
    }

    /// Index of the first band matching any alias.
    ///
    /// Aliases are tried in order; for each alias the bands are scanned in
    /// order and the first band whose name equals the alias or contains it
    /// (case-insensitive) wins.
    pub fn find_band_index(&self, aliases: &[&str]) -> Option<usize> {
        let names: Vec<String> = self.bands.iter().map(|b| b.name.to_uppercase()).collect();
        aliases.iter().find_map(|alias| {
            let wanted = alias.to_uppercase();
            names
                .iter()
                .position(|n| *n == wanted || n.contains(&wanted))
        })
    }

    pub fn find_band(&self, aliases: &[&str]) -> Option<&Band> {
        self.find_band_index(aliases).map(|i| &self.bands[i])
    }
}
