//! Raster gridding for the site survey pipeline.
//!
//! This crate takes georeferenced source rasters onto a shared survey grid
//! and reduces them to a coarse table of cells:
//!
//! - **Reprojection**: warp each source onto a [`GridSpec`], recovering a
//!   placement from PDS4 label bounds when the raster carries none
//! - **Compositing**: merge same-band layers with a maximum or median
//!   reducer, tracking per-pixel coverage
//! - **Aggregation**: NaN-skipping block means over an R×C cell grid
//! - **Caching**: memoize composited mosaics by stage inputs
//!
//! # Architecture
//!
//! ```text
//! Raster + LabelBounds
//!      │
//!      ▼
//! Reprojector::reproject_bands(grid)     (one task per source)
//!      │
//!      ▼
//! apply_footprint_mask (multi-band index scenes)
//!      │
//!      ▼
//! composite(layers, Reducer)  ──►  StageCache
//!      │
//!      ▼
//! aggregate_cells(mosaics, CellGrid)
//!      │
//!      ▼
//! CellTable  ──►  site-classifier
//! ```
//!
//! # Example
//!
//! ```ignore
//! use grid_processor::{aggregate_cells, composite, CellGrid, InterpolationMethod, Reducer, Reprojector};
//!
//! let reprojector = Reprojector::new(&grid, InterpolationMethod::Bilinear);
//! let layers = scenes
//!     .iter()
//!     .map(|s| reprojector.reproject_bands(s, &[0], None).map(|mut b| b.remove(0)))
//!     .collect::<Result<Vec<_>, _>>()?;
//!
//! let mosaic = composite("BT", &layers, grid.width, grid.height, Reducer::Median)?;
//! let table = aggregate_cells(&[&mosaic], CellGrid::new(100, 100))?;
//! ```

pub mod aggregate;
pub mod cache;
pub mod composite;
pub mod config;
pub mod error;
pub mod footprint;
pub mod projection;
pub mod terrain;
pub mod types;

// Re-export commonly used types at crate root
pub use aggregate::{aggregate_band, aggregate_cells, block_range, CellGrid, CellRecord, CellTable, EMPTY_CELL_SENTINEL};
pub use cache::{stage_key, StageCache, StageKey};
pub use composite::{composite, Mosaic, Reducer};
pub use config::GridProcessorConfig;
pub use error::{GridProcessorError, Result};
pub use footprint::apply_footprint_mask;
pub use projection::{bilinear_interpolate, crop_to_bbox, nearest_interpolate, Georeference, Reprojector};
pub use survey_common::GridSpec;
pub use terrain::{roughness_std, slope_degrees, terrain_ruggedness_index};
pub use types::{CacheStats, InterpolationMethod};
