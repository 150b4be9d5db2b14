//! PDS4 XML label reading.

use std::path::Path;

use projection::normalize_lon_range;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

use crate::{LabelError, LabelResult};

const WEST_TAGS: &[&str] = &[
    "minimum_longitude",
    "westernmost_longitude",
    "west_bounding_coordinate",
    "minimumlongitude",
    "westernmostlongitude",
];
const EAST_TAGS: &[&str] = &[
    "maximum_longitude",
    "easternmost_longitude",
    "east_bounding_coordinate",
    "maximumlongitude",
    "easternmostlongitude",
];
const SOUTH_TAGS: &[&str] = &[
    "minimum_latitude",
    "south_bounding_coordinate",
    "minimumlatitude",
];
const NORTH_TAGS: &[&str] = &[
    "maximum_latitude",
    "north_bounding_coordinate",
    "maximumlatitude",
];

const MAX_ABS_LON: f64 = 720.0;

/// Geographic footprint declared by a label, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelBounds {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

impl LabelBounds {
    pub fn new(west: f64, east: f64, south: f64, north: f64) -> Self {
        Self {
            west,
            east,
            south,
            north,
        }
    }

    /// Finite, with longitudes within ±720° and latitudes within ±90°.
    pub fn is_plausible(&self) -> bool {
        let lon_ok = |v: f64| v.is_finite() && v.abs() <= MAX_ABS_LON;
        let lat_ok = |v: f64| v.is_finite() && v.abs() <= 90.0;
        lon_ok(self.west) && lon_ok(self.east) && lat_ok(self.south) && lat_ok(self.north)
    }

    /// Bounds with longitudes moved so that `east > west`.
    pub fn normalized(&self) -> Self {
        let (west, east) = normalize_lon_range(self.west, self.east);
        Self { west, east, ..*self }
    }
}

/// Flattened view of a PDS4 label: every element with text content, in
/// document order, keyed by its lowercase local (namespace-free) name.
#[derive(Debug, Clone, Default)]
pub struct Pds4Label {
    elements: Vec<(String, String)>,
}

impl Pds4Label {
    /// Parse label XML.
    pub fn parse(xml: &str) -> LabelResult<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut buf = Vec::new();
        let mut stack: Vec<String> = Vec::new();
        let mut elements = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).to_lowercase();
                    stack.push(name);
                }
                Ok(Event::Text(t)) => {
                    if let Some(tag) = stack.last() {
                        let text = t
                            .unescape()
                            .map_err(|e| LabelError::InvalidXml(e.to_string()))?;
                        let text = text.trim();
                        if !text.is_empty() {
                            elements.push((tag.clone(), text.to_string()));
                        }
                    }
                }
                Ok(Event::End(_)) => {
                    stack.pop();
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(LabelError::InvalidXml(format!(
                        "position {}: {:?}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {}
            }
            buf.clear();
        }

        Ok(Self { elements })
    }

    /// Read and parse a label file.
    pub fn from_path(path: impl AsRef<Path>) -> LabelResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Number of text-bearing elements.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Text of the first element whose name is in `names`.
    pub fn first_text(&self, names: &[&str]) -> Option<&str> {
        self.elements
            .iter()
            .find(|(tag, _)| names.iter().any(|n| n.eq_ignore_ascii_case(tag)))
            .map(|(_, text)| text.as_str())
    }

    /// First element whose name is in `names` and whose text parses as a
    /// number. Elements with non-numeric text are skipped.
    pub fn first_f64(&self, names: &[&str]) -> Option<f64> {
        self.elements
            .iter()
            .filter(|(tag, _)| names.iter().any(|n| n.eq_ignore_ascii_case(tag)))
            .find_map(|(_, text)| text.parse::<f64>().ok())
    }

    /// Bounding coordinates, with both-negative longitudes shifted into
    /// 0-360. `None` if any of the four is missing or out of range.
    pub fn bounds(&self) -> Option<LabelBounds> {
        let west = self.first_f64(WEST_TAGS)?;
        let east = self.first_f64(EAST_TAGS)?;
        let south = self.first_f64(SOUTH_TAGS)?;
        let north = self.first_f64(NORTH_TAGS)?;
        let bounds = LabelBounds::new(west, east, south, north);
        if !bounds.is_plausible() {
            tracing::warn!(west, east, south, north, "Label bounds out of range");
            return None;
        }
        Some(bounds.normalized())
    }

    /// Like [`Pds4Label::bounds`] but as an error for callers that need it.
    pub fn require_bounds(&self, label: &str) -> LabelResult<LabelBounds> {
        self.bounds()
            .ok_or_else(|| LabelError::NoBounds(label.to_string()))
    }
}

/// Read bounds from a label file. Unreadable or malformed labels give
/// `Ok(None)` with a warning.
pub fn read_bounds(path: impl AsRef<Path>) -> LabelResult<Option<LabelBounds>> {
    let path = path.as_ref();
    match Pds4Label::from_path(path) {
        Ok(label) => Ok(label.bounds()),
        Err(LabelError::InvalidXml(msg)) => {
            tracing::warn!(label = %path.display(), error = %msg, "Unparseable PDS4 label");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABEL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Product_Observational xmlns="http://pds.nasa.gov/pds4/pds/v1"
    xmlns:cart="http://pds.nasa.gov/pds4/cart/v1">
  <Identification_Area>
    <logical_identifier>urn:nasa:pds:odyssey_themis:I92413021BTR</logical_identifier>
  </Identification_Area>
  <cart:Bounding_Coordinates>
    <cart:west_bounding_coordinate unit="deg">-283.1</cart:west_bounding_coordinate>
    <cart:east_bounding_coordinate unit="deg">-281.9</cart:east_bounding_coordinate>
    <cart:north_bounding_coordinate unit="deg">19.2</cart:north_bounding_coordinate>
    <cart:south_bounding_coordinate unit="deg">17.6</cart:south_bounding_coordinate>
  </cart:Bounding_Coordinates>
</Product_Observational>"#;

    #[test]
    fn test_parse_bounds_with_namespaces() {
        let label = Pds4Label::parse(LABEL).unwrap();
        let b = label.bounds().unwrap();
        assert!((b.west - 76.9).abs() < 1e-9);
        assert!((b.east - 78.1).abs() < 1e-9);
        assert_eq!(b.south, 17.6);
        assert_eq!(b.north, 19.2);
    }

    #[test]
    fn test_missing_bound_gives_none() {
        let xml = "<a><minimum_longitude>77</minimum_longitude><maximum_longitude>78</maximum_longitude><minimum_latitude>18</minimum_latitude></a>";
        let label = Pds4Label::parse(xml).unwrap();
        assert!(label.bounds().is_none());
        assert!(matches!(label.require_bounds("x"), Err(LabelError::NoBounds(_))));
    }

    #[test]
    fn test_non_numeric_entries_are_skipped() {
        let xml = "<a><westernmost_longitude>n/a</westernmost_longitude><minimum_longitude>77.5</minimum_longitude></a>";
        let label = Pds4Label::parse(xml).unwrap();
        assert_eq!(label.first_f64(WEST_TAGS), Some(77.5));
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        assert!(matches!(
            Pds4Label::parse("<a><b>1</c></a>"),
            Err(LabelError::InvalidXml(_))
        ));
    }

    #[test]
    fn test_out_of_range_bounds_give_none() {
        let xml = "<a><minimum_longitude>1e20</minimum_longitude><maximum_longitude>1.0000000000001e20</maximum_longitude>\
                   <minimum_latitude>18</minimum_latitude><maximum_latitude>19</maximum_latitude></a>";
        let label = Pds4Label::parse(xml).unwrap();
        assert!(label.bounds().is_none());

        let xml = "<a><minimum_longitude>77</minimum_longitude><maximum_longitude>78</maximum_longitude>\
                   <minimum_latitude>NaN</minimum_latitude><maximum_latitude>19</maximum_latitude></a>";
        assert!(Pds4Label::parse(xml).unwrap().bounds().is_none());

        assert!(LabelBounds::new(-283.0, -282.0, 18.0, 19.0).is_plausible());
        assert!(!LabelBounds::new(77.0, 78.0, 18.0, 91.0).is_plausible());
    }

    #[test]
    fn test_meridian_crossing_bounds() {
        let b = LabelBounds::new(359.0, 1.0, 0.0, 1.0).normalized();
        assert_eq!(b.west, 359.0);
        assert_eq!(b.east, 361.0);
    }
}
