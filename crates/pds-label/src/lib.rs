//! PDS label parsing.
//!
//! Extracts the handful of metadata items the survey pipeline needs from
//! Planetary Data System labels:
//!
//! - PDS4 XML: geographic bounding coordinates and local solar time
//! - PDS3 ODL: map scale (meters per pixel)
//!
//! Labels in the wild use several spellings for the same quantity, so all
//! lookups go through alias lists and never panic on malformed input.

pub mod error;
pub mod lst;
pub mod pds3;
pub mod pds4;

pub use error::{LabelError, LabelResult};
pub use lst::{build_lst_index, extract_lst, normalize_lst, LstIndexEntry};
pub use pds3::{parse_pixel_scale, PixelScale, PixelScaleSource};
pub use pds4::{read_bounds, LabelBounds, Pds4Label};
