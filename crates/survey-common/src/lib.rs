//! Common types and utilities shared across the site survey crates.

pub mod bbox;
pub mod crs;
pub mod error;
pub mod grid;
pub mod raster;
pub mod time;
pub mod transform;

pub use bbox::{BboxParseError, BoundingBox};
pub use crs::Crs;
pub use error::{SurveyError, SurveyResult};
pub use grid::GridSpec;
pub use raster::{Band, Raster};
pub use time::{LocalSolarTime, TimeSlot};
pub use transform::GeoTransform;
