//! Cell aggregation.
//!
//! Reduces full-resolution mosaics to a coarse R×C cell grid by taking the
//! NaN-skipping mean of the pixels in each cell. Cells are laid out in
//! pixel space: every cell is `H / R` rows by `W / C` columns, and the last
//! row and column of cells absorb the remainder.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::composite::Mosaic;
use crate::error::{GridProcessorError, Result};

/// Value written in flat tables for cells with no data.
pub const EMPTY_CELL_SENTINEL: f64 = 0.0;

/// Shape of the aggregation grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellGrid {
    pub rows: usize,
    pub cols: usize,
}

impl CellGrid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check that the grid fits a `width x height` mosaic.
    pub fn validate_for(&self, width: usize, height: usize) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(GridProcessorError::invalid_cell_grid(format!(
                "{}x{} cell grid has no cells",
                self.rows, self.cols
            )));
        }
        if self.rows > height || self.cols > width {
            return Err(GridProcessorError::invalid_cell_grid(format!(
                "{}x{} cells do not fit a {}x{} mosaic",
                self.rows, self.cols, height, width
            )));
        }
        Ok(())
    }

    /// Pixel row range covered by cell row `i`.
    pub fn row_range(&self, i: usize, height: usize) -> Range<usize> {
        block_range(i, self.rows, height)
    }

    /// Pixel column range covered by cell column `j`.
    pub fn col_range(&self, j: usize, width: usize) -> Range<usize> {
        block_range(j, self.cols, width)
    }
}

impl Default for CellGrid {
    fn default() -> Self {
        Self::new(100, 100)
    }
}

/// Range of block `i` out of `n` over `len` items, with the last block
/// extended to `len`.
pub fn block_range(i: usize, n: usize, len: usize) -> Range<usize> {
    let size = len / n;
    let start = i * size;
    let end = if i + 1 == n { len } else { (i + 1) * size };
    start..end
}

/// One aggregated cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    /// Cell column (x)
    pub col: usize,
    /// Cell row (y), 0 at the top
    pub row: usize,
    /// Mean per band, `None` when the cell had no finite pixel
    pub means: Vec<Option<f64>>,
}

impl CellRecord {
    /// Mean of band `i` with empty cells replaced by the sentinel.
    pub fn filled(&self, i: usize) -> f64 {
        self.means
            .get(i)
            .copied()
            .flatten()
            .unwrap_or(EMPTY_CELL_SENTINEL)
    }
}

/// Aggregated cells for a set of bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellTable {
    pub grid: CellGrid,
    /// Band names, in the order of `CellRecord::means`
    pub bands: Vec<String>,
    /// Records ordered by column then row
    pub records: Vec<CellRecord>,
}

impl CellTable {
    pub fn band_index(&self, name: &str) -> Option<usize> {
        self.bands.iter().position(|b| b == name)
    }

    /// Number of (cell, band) pairs with no data.
    pub fn empty_count(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.means.iter().filter(|m| m.is_none()).count())
            .sum()
    }
}

/// Mean of the finite pixels of `data` inside each cell, in the order
/// `col` then `row`.
pub fn aggregate_band(data: &[f32], width: usize, height: usize, grid: CellGrid) -> Result<Vec<Option<f64>>> {
    grid.validate_for(width, height)?;
    if data.len() != width * height {
        return Err(GridProcessorError::ShapeMismatch {
            expected: width * height,
            actual: data.len(),
        });
    }

    let mut out = Vec::with_capacity(grid.len());
    for j in 0..grid.cols {
        let cols = grid.col_range(j, width);
        for i in 0..grid.rows {
            out.push(block_mean(data, width, grid.row_range(i, height), cols.clone()));
        }
    }
    Ok(out)
}

/// NaN-skipping mean over a pixel block; `None` if no value is finite.
fn block_mean(data: &[f32], width: usize, rows: Range<usize>, cols: Range<usize>) -> Option<f64> {
    let mut sum = 0.0f64;
    let mut count = 0usize;
    for r in rows {
        for &v in &data[r * width + cols.start..r * width + cols.end] {
            if v.is_finite() {
                sum += v as f64;
                count += 1;
            }
        }
    }

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Aggregate several same-shape mosaics into one table.
pub fn aggregate_cells(mosaics: &[&Mosaic], grid: CellGrid) -> Result<CellTable> {
    let first = mosaics
        .first()
        .ok_or_else(|| GridProcessorError::no_valid_scenes("<cell aggregation>"))?;
    let (width, height) = (first.width, first.height);

    let mut per_band = Vec::with_capacity(mosaics.len());
    for m in mosaics {
        if m.width != width || m.height != height {
            return Err(GridProcessorError::ShapeMismatch {
                expected: width * height,
                actual: m.width * m.height,
            });
        }
        per_band.push(aggregate_band(&m.data, width, height, grid)?);
    }

    let mut records = Vec::with_capacity(grid.len());
    let mut k = 0;
    for col in 0..grid.cols {
        for row in 0..grid.rows {
            records.push(CellRecord {
                col,
                row,
                means: per_band.iter().map(|b| b[k]).collect(),
            });
            k += 1;
        }
    }

    let table = CellTable {
        grid,
        bands: mosaics.iter().map(|m| m.band.clone()).collect(),
        records,
    };

    let empty = table.empty_count();
    if empty > 0 {
        debug!(empty, "Cells without data will be written as the empty sentinel");
    }
    info!(
        rows = grid.rows,
        cols = grid.cols,
        bands = table.bands.len(),
        empty_cells = empty,
        "Aggregated cells"
    );

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAN: f32 = f32::NAN;

    fn mosaic(band: &str, width: usize, height: usize, data: Vec<f32>) -> Mosaic {
        let coverage = data.iter().map(|v| if v.is_finite() { 1 } else { 0 }).collect();
        Mosaic {
            band: band.to_string(),
            width,
            height,
            data,
            coverage,
        }
    }

    #[test]
    fn test_block_ranges_absorb_remainder() {
        assert_eq!(block_range(0, 3, 10), 0..3);
        assert_eq!(block_range(1, 3, 10), 3..6);
        assert_eq!(block_range(2, 3, 10), 6..10);
        assert_eq!(block_range(0, 1, 7), 0..7);
    }

    #[test]
    fn test_4x4_to_2x2() {
        #[rustfmt::skip]
        let data = vec![
            1.0,  2.0,  3.0,  4.0,
            5.0,  NAN,  7.0,  8.0,
            9.0,  10.0, 11.0, 12.0,
            13.0, 14.0, 15.0, 16.0,
        ];
        let means = aggregate_band(&data, 4, 4, CellGrid::new(2, 2)).unwrap();

        // Order is col-major: (0,0), (0,1), (1,0), (1,1)
        let cell_00 = means[0].unwrap();
        let cell_11 = means[3].unwrap();
        assert!((cell_00 - 8.0 / 3.0).abs() < 1e-9);
        assert!((cell_11 - 13.5).abs() < 1e-9);
        assert!((means[1].unwrap() - 11.5).abs() < 1e-9);
        assert!((means[2].unwrap() - 5.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_cell_is_none_then_sentinel() {
        let data = vec![NAN, NAN, 1.0, 2.0];
        let m = mosaic("B", 2, 2, data);
        let table = aggregate_cells(&[&m], CellGrid::new(2, 1)).unwrap();

        assert_eq!(table.records[0].means[0], None);
        assert_eq!(table.records[0].filled(0), EMPTY_CELL_SENTINEL);
        assert_eq!(table.records[1].means[0], Some(1.5));
        assert_eq!(table.empty_count(), 1);
    }

    #[test]
    fn test_invalid_cell_grids() {
        let data = vec![1.0; 6];
        assert!(matches!(
            aggregate_band(&data, 3, 2, CellGrid::new(3, 1)),
            Err(GridProcessorError::InvalidCellGrid(_))
        ));
        assert!(matches!(
            aggregate_band(&data, 3, 2, CellGrid::new(0, 1)),
            Err(GridProcessorError::InvalidCellGrid(_))
        ));
    }

    #[test]
    fn test_multi_band_table() {
        let a = mosaic("D2300", 2, 2, vec![1.0, 2.0, 3.0, 4.0]);
        let b = mosaic("BD1900", 2, 2, vec![NAN, NAN, NAN, 8.0]);
        let table = aggregate_cells(&[&a, &b], CellGrid::new(1, 1)).unwrap();

        assert_eq!(table.bands, vec!["D2300", "BD1900"]);
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0].means, vec![Some(2.5), Some(8.0)]);
        assert_eq!(table.band_index("BD1900"), Some(1));
    }
}
