//! PDS3 (ODL) label reading for topography products.

use once_cell::sync::Lazy;
use projection::MARS_METERS_PER_DEGREE;
use regex::Regex;
use serde::Serialize;

use crate::{LabelError, LabelResult};

static MAP_SCALE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)MAP_SCALE\s*=\s*([0-9]*\.?[0-9]+)\s*<\s*KM\s*/\s*PIXEL\s*>")
        .expect("valid MAP_SCALE regex")
});

static MAP_RESOLUTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)MAP_RESOLUTION\s*=\s*([0-9]*\.?[0-9]+)\s*<\s*PIXEL\s*/\s*DEGREE\s*>")
        .expect("valid MAP_RESOLUTION regex")
});

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Which keyword the pixel scale came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PixelScaleSource {
    /// `MAP_SCALE = x <KM/PIXEL>`
    MapScale,
    /// `MAP_RESOLUTION = n <PIXEL/DEGREE>`, approximated on the Mars sphere
    MapResolution,
}

/// Ground size of one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PixelScale {
    pub meters_per_pixel: f64,
    pub source: PixelScaleSource,
}

/// Parse the pixel size from a PDS3 label.
///
/// `MAP_SCALE` in km/pixel is preferred. Otherwise `MAP_RESOLUTION` in
/// pixels/degree is converted with a mean 59.2 km per degree.
pub fn parse_pixel_scale(label_text: &str) -> LabelResult<PixelScale> {
    let flat = WHITESPACE.replace_all(label_text, " ");

    if let Some(km) = MAP_SCALE
        .captures(&flat)
        .and_then(|c| c[1].parse::<f64>().ok())
        .filter(|v| *v > 0.0)
    {
        return Ok(PixelScale {
            meters_per_pixel: km * 1000.0,
            source: PixelScaleSource::MapScale,
        });
    }

    if let Some(pix_per_deg) = MAP_RESOLUTION
        .captures(&flat)
        .and_then(|c| c[1].parse::<f64>().ok())
        .filter(|v| *v > 0.0)
    {
        return Ok(PixelScale {
            meters_per_pixel: MARS_METERS_PER_DEGREE / pix_per_deg,
            source: PixelScaleSource::MapResolution,
        });
    }

    let snippet: String = flat.chars().take(200).collect();
    Err(LabelError::NoPixelScale(snippet))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_scale() {
        let label = "OBJECT = IMAGE_MAP_PROJECTION\n  MAP_SCALE = 0.463 <KM/PIXEL>\n  MAP_RESOLUTION = 128 <PIXEL/DEGREE>\nEND_OBJECT";
        let scale = parse_pixel_scale(label).unwrap();
        assert_eq!(scale.source, PixelScaleSource::MapScale);
        assert!((scale.meters_per_pixel - 463.0).abs() < 1e-9);
    }

    #[test]
    fn test_map_scale_spanning_lines() {
        let label = "map_scale =\n   3.705\n  < km / pixel >";
        let scale = parse_pixel_scale(label).unwrap();
        assert!((scale.meters_per_pixel - 3705.0).abs() < 1e-9);
    }

    #[test]
    fn test_map_resolution_fallback() {
        let label = "MAP_RESOLUTION = 128 <PIXEL/DEGREE>";
        let scale = parse_pixel_scale(label).unwrap();
        assert_eq!(scale.source, PixelScaleSource::MapResolution);
        assert!((scale.meters_per_pixel - 462.5).abs() < 1e-9);
    }

    #[test]
    fn test_missing_scale() {
        assert!(matches!(
            parse_pixel_scale("PDS_VERSION_ID = PDS3"),
            Err(LabelError::NoPixelScale(_))
        ));
    }
}
