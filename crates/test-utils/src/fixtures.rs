//! Common test fixtures for the site survey tests.

use std::path::{Path, PathBuf};

/// Bounding boxes as `(west, south, east, north)` in degrees.
pub mod bbox {
    /// Jezero crater region
    pub const JEZERO: (f64, f64, f64, f64) = (77.0, 18.0, 78.0, 19.0);

    /// A small one-degree tile near the equator
    pub const EQUATORIAL_TILE: (f64, f64, f64, f64) = (10.0, -0.5, 11.0, 0.5);

    /// Jezero expressed in negative (west-positive style) longitudes
    pub const JEZERO_NEGATIVE: (f64, f64, f64, f64) = (-283.0, 18.0, -282.0, 19.0);
}

/// Local solar time slots as configured in the thermal workflow.
pub mod slots {
    pub const NAMES: [&str; 4] = ["5_30AM", "7_00AM", "6_30PM", "7_00PM"];
    pub const STRICT_MIN_C: [f64; 4] = [-70.0, -70.0, -60.0, -60.0];
}

/// Minimal PDS4 label with bounding coordinates and an optional local
/// solar time.
pub fn pds4_label(west: f64, east: f64, south: f64, north: f64, lst: Option<&str>) -> String {
    let lst_element = lst
        .map(|t| format!("        <local_true_solar_time>{t}</local_true_solar_time>\n"))
        .unwrap_or_default();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Product_Observational xmlns="http://pds.nasa.gov/pds4/pds/v1">
  <Observation_Area>
    <Discipline_Area>
      <cart:Cartography xmlns:cart="http://pds.nasa.gov/pds4/cart/v1">
        <cart:Spatial_Domain>
          <cart:Bounding_Coordinates>
            <cart:west_bounding_coordinate unit="deg">{west}</cart:west_bounding_coordinate>
            <cart:east_bounding_coordinate unit="deg">{east}</cart:east_bounding_coordinate>
            <cart:north_bounding_coordinate unit="deg">{north}</cart:north_bounding_coordinate>
            <cart:south_bounding_coordinate unit="deg">{south}</cart:south_bounding_coordinate>
          </cart:Bounding_Coordinates>
        </cart:Spatial_Domain>
      </cart:Cartography>
    </Discipline_Area>
    <Mission_Area>
{lst_element}      </Mission_Area>
  </Observation_Area>
</Product_Observational>
"#
    )
}

/// PDS4 label without any bounding coordinates.
pub const PDS4_LABEL_NO_BOUNDS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Product_Observational>
  <Identification_Area>
    <logical_identifier>urn:nasa:pds:test:data:no_bounds</logical_identifier>
  </Identification_Area>
</Product_Observational>
"#;

/// PDS3 label for a topography tile with `MAP_SCALE` in km/pixel.
pub const PDS3_MAP_SCALE_LABEL: &str = r#"PDS_VERSION_ID = PDS3
OBJECT = IMAGE_MAP_PROJECTION
  MAP_PROJECTION_TYPE = "SIMPLE CYLINDRICAL"
  MAP_RESOLUTION = 128 <PIXEL/DEGREE>
  MAP_SCALE = 0.463 <KM/PIXEL>
END_OBJECT = IMAGE_MAP_PROJECTION
END
"#;

/// PDS3 label with only `MAP_RESOLUTION` in pixels/degree.
pub const PDS3_MAP_RESOLUTION_LABEL: &str = r#"PDS_VERSION_ID = PDS3
OBJECT = IMAGE_MAP_PROJECTION
  MAP_RESOLUTION = 128 <PIXEL/DEGREE>
END_OBJECT = IMAGE_MAP_PROJECTION
END
"#;

/// Write `contents` to `dir/name` and return the path.
///
/// # Panics
///
/// Panics if the file cannot be written.
pub fn write_fixture(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write fixture file");
    path
}

/// Create a temporary directory holding one PDS4 label per
/// `(file_id, lst)` pair, all with the same bounds.
pub fn label_dir(entries: &[(&str, Option<&str>)], bounds: (f64, f64, f64, f64)) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    let (west, south, east, north) = bounds;
    for (file_id, lst) in entries {
        write_fixture(
            dir.path(),
            &format!("{file_id}.xml"),
            &pds4_label(west, east, south, north, *lst),
        );
    }
    dir
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pds4_label_contains_values() {
        let xml = pds4_label(77.0, 78.0, 18.0, 19.0, Some("05:31:12"));
        assert!(xml.contains(">77<"));
        assert!(xml.contains("local_true_solar_time>05:31:12<"));

        let no_lst = pds4_label(77.0, 78.0, 18.0, 19.0, None);
        assert!(!no_lst.contains("local_true_solar_time"));
    }

    #[test]
    fn test_label_dir_writes_files() {
        let dir = label_dir(&[("a", Some("07:00:00")), ("b", None)], bbox::JEZERO);
        assert!(dir.path().join("a.xml").exists());
        assert!(dir.path().join("b.xml").exists());
    }

    #[test]
    fn test_slot_tables_align() {
        assert_eq!(slots::NAMES.len(), slots::STRICT_MIN_C.len());
    }
}
