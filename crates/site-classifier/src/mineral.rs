//! Spectral index bands and mineral percentage shares.
//!
//! The three tracked index bands map to mineral families:
//! D2300 to Fe/Mg smectites, BD2210 to Al-OH minerals and BD1900 to
//! H2O / hydrated silica.

use grid_processor::CellTable;
use serde::Serialize;

use crate::adaptive::AdaptiveInput;
use crate::error::{ClassifierError, Result};

pub const D2300: &str = "D2300";
pub const BD2210: &str = "BD2210";
pub const BD1900: &str = "BD1900";

/// Band aliases tried in order when looking a tracked band up in a scene.
pub const TRACKED_BANDS: [(&str, &[&str]); 3] = [
    (D2300, &["D2300"]),
    (BD2210, &["BD2210", "D2200", "D2200_1", "D2200_2"]),
    (BD1900, &["BD1900", "BD1900_2", "BD1900_1"]),
];

/// Percentage shares of the three mineral families in one cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MineralShares {
    pub fe_mg: f64,
    pub al_oh: f64,
    pub h2o: f64,
}

impl MineralShares {
    /// `100 * band / (d2300 + bd2210 + bd1900)`, all zero when the sum is
    /// not positive.
    pub fn from_means(d2300: f64, bd2210: f64, bd1900: f64) -> Self {
        let sum = d2300 + bd2210 + bd1900;
        if !(sum > 0.0) {
            return Self::default();
        }
        Self {
            fe_mg: 100.0 * d2300 / sum,
            al_oh: 100.0 * bd2210 / sum,
            h2o: 100.0 * bd1900 / sum,
        }
    }
}

/// Band means and shares of one cell, empty means as 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MineralCell {
    pub col: usize,
    pub row: usize,
    pub d2300: f64,
    pub bd2210: f64,
    pub bd1900: f64,
    pub shares: MineralShares,
}

impl MineralCell {
    pub fn new(col: usize, row: usize, d2300: f64, bd2210: f64, bd1900: f64) -> Self {
        Self {
            col,
            row,
            d2300,
            bd2210,
            bd1900,
            shares: MineralShares::from_means(d2300, bd2210, bd1900),
        }
    }

    /// Water-first signals: primary H2O, secondary Fe/Mg, tertiary Al-OH.
    pub fn to_adaptive_input(&self) -> AdaptiveInput {
        AdaptiveInput {
            col: self.col,
            row: self.row,
            raw: [self.bd1900, self.d2300, self.bd2210],
            signals: [self.shares.h2o, self.shares.fe_mg, self.shares.al_oh],
        }
    }
}

/// Mineral cells from an aggregated table holding the three tracked bands.
pub fn mineral_cells(table: &CellTable) -> Result<Vec<MineralCell>> {
    let index = |name: &str| {
        table
            .band_index(name)
            .ok_or_else(|| ClassifierError::MissingBand(name.to_string()))
    };
    let (i_d, i_al, i_h) = (index(D2300)?, index(BD2210)?, index(BD1900)?);

    Ok(table
        .records
        .iter()
        .map(|r| MineralCell::new(r.col, r.row, r.filled(i_d), r.filled(i_al), r.filled(i_h)))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_processor::{CellGrid, CellRecord};

    #[test]
    fn test_shares() {
        let s = MineralShares::from_means(0.02, 0.01, 0.01);
        assert!((s.fe_mg - 50.0).abs() < 1e-9);
        assert!((s.al_oh - 25.0).abs() < 1e-9);
        assert!((s.h2o - 25.0).abs() < 1e-9);

        assert_eq!(MineralShares::from_means(0.0, 0.0, 0.0), MineralShares::default());
        assert_eq!(MineralShares::from_means(0.01, -0.02, 0.0), MineralShares::default());
    }

    #[test]
    fn test_signal_mapping() {
        let c = MineralCell::new(3, 4, 0.02, 0.01, 0.01);
        let input = c.to_adaptive_input();
        assert_eq!((input.col, input.row), (3, 4));
        assert_eq!(input.raw, [0.01, 0.02, 0.01]);
        assert!((input.signals[0] - 25.0).abs() < 1e-9);
        assert!((input.signals[1] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_cells_from_table() {
        let table = CellTable {
            grid: CellGrid::new(1, 2),
            bands: vec![BD1900.into(), D2300.into(), BD2210.into()],
            records: vec![
                CellRecord {
                    col: 0,
                    row: 0,
                    means: vec![Some(0.03), Some(0.01), None],
                },
                CellRecord {
                    col: 1,
                    row: 0,
                    means: vec![None, None, None],
                },
            ],
        };
        let cells = mineral_cells(&table).unwrap();
        assert_eq!(cells[0].d2300, 0.01);
        assert_eq!(cells[0].bd2210, 0.0);
        assert_eq!(cells[0].bd1900, 0.03);
        assert!(!cells[1].to_adaptive_input().has_data());

        let partial = CellTable {
            bands: vec![D2300.into()],
            ..table
        };
        assert!(matches!(mineral_cells(&partial), Err(ClassifierError::MissingBand(_))));
    }
}
