//! CSV export of cell tables and classifier results.
//!
//! Every writer takes any [`io::Write`] and emits a header row followed by
//! one row per cell. Booleans are written as `True`/`False`.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use csv::Writer;
use grid_processor::{CellTable, EMPTY_CELL_SENTINEL};
use tracing::debug;

use crate::adaptive::AdaptiveOutcome;
use crate::error::Result;
use crate::mineral::MineralCell;
use crate::summary::SlotSummary;
use crate::tiered::{SlotFlags, SlotResult, SlotTable, TieredOutcome};

/// Buffered file for one of the writers below.
pub fn create_file(path: &Path) -> Result<BufWriter<File>> {
    debug!(path = %path.display(), "Creating table");
    Ok(BufWriter::new(File::create(path)?))
}

fn flag(b: bool) -> &'static str {
    if b {
        "True"
    } else {
        "False"
    }
}

fn optional(v: Option<f64>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

/// `x, y, <band>...` with empty means as the sentinel.
pub fn write_cell_table<W: io::Write>(out: W, table: &CellTable) -> Result<()> {
    let mut w = Writer::from_writer(out);
    let mut header = vec!["x".to_string(), "y".to_string()];
    header.extend(table.bands.iter().cloned());
    w.write_record(&header)?;

    for r in &table.records {
        let mut row = vec![r.col.to_string(), r.row.to_string()];
        row.extend(
            r.means
                .iter()
                .map(|m| m.unwrap_or(EMPTY_CELL_SENTINEL).to_string()),
        );
        w.write_record(&row)?;
    }
    w.flush()?;
    Ok(())
}

/// Band means and mineral shares.
pub fn write_mineral_cells<W: io::Write>(out: W, cells: &[MineralCell]) -> Result<()> {
    let mut w = Writer::from_writer(out);
    w.write_record([
        "x",
        "y",
        "Avg_D2300",
        "Avg_BD2210",
        "Avg_BD1900",
        "% Fe/Mg",
        "% Al-OH",
        "% H2O",
    ])?;
    for c in cells {
        w.write_record([
            c.col.to_string(),
            c.row.to_string(),
            c.d2300.to_string(),
            c.bd2210.to_string(),
            c.bd1900.to_string(),
            c.shares.fe_mg.to_string(),
            c.shares.al_oh.to_string(),
            c.shares.h2o.to_string(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Signals, score and pass flag of every cell. `signal_names` label the
/// primary, secondary and tertiary columns.
pub fn write_adaptive_results<W: io::Write>(
    out: W,
    outcome: &AdaptiveOutcome,
    signal_names: [&str; 3],
) -> Result<()> {
    let mut w = Writer::from_writer(out);
    let mut header = vec!["x", "y"];
    header.extend(signal_names);
    header.extend(["has_data", "score", "pass"]);
    w.write_record(&header)?;

    for r in &outcome.records {
        w.write_record([
            r.col.to_string(),
            r.row.to_string(),
            r.signals[0].to_string(),
            r.signals[1].to_string(),
            r.signals[2].to_string(),
            flag(r.has_data).to_string(),
            optional(r.score),
            flag(r.pass).to_string(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// `x, y, landing_flag` with the flag as 0/1.
pub fn write_landing_flags<W: io::Write>(out: W, outcome: &AdaptiveOutcome) -> Result<()> {
    let mut w = Writer::from_writer(out);
    w.write_record(["x", "y", "landing_flag"])?;
    for r in &outcome.records {
        w.write_record([r.col.to_string(), r.row.to_string(), u8::from(r.pass).to_string()])?;
    }
    w.flush()?;
    Ok(())
}

fn mean_column(slot: &str) -> String {
    format!("mean_temperature_{slot}")
}

/// Per-slot cell temperatures, missing values left empty.
pub fn write_slot_means<W: io::Write>(out: W, table: &SlotTable) -> Result<()> {
    let mut w = Writer::from_writer(out);
    let mut header = vec!["x".to_string(), "y".to_string()];
    header.extend(table.slots.iter().map(|s| mean_column(s)));
    w.write_record(&header)?;

    for (i, (col, row)) in table.cells.iter().enumerate() {
        let mut rec = vec![col.to_string(), row.to_string()];
        rec.extend(table.values.iter().map(|v| optional(v[i])));
        w.write_record(&rec)?;
    }
    w.flush()?;
    Ok(())
}

fn per_slot(slots: &[SlotResult], cell: usize, f: impl Fn(&SlotFlags) -> String) -> Vec<String> {
    slots.iter().map(|s| f(&s.flags[cell])).collect()
}

/// Every flag and reason, grouped by kind then slot.
pub fn write_slot_flags<W: io::Write>(out: W, outcome: &TieredOutcome) -> Result<()> {
    let mut w = Writer::from_writer(out);
    let slots = &outcome.slots;

    let prefixes = [
        "has_mean_temperature_",
        "THEMIS_OK_",
        "THEMIS_reason_",
        "ROVER_OK_strict_",
        "ROVER_OK_soft_",
        "ROVER_reason_",
        "HELI_survival_ok_",
        "HELI_energy_pref_",
        "HELI_reason_",
        "SLOT_GOOD_strict_",
        "SLOT_REASON_strict_",
        "SLOT_GOOD_soft_",
        "SLOT_REASON_soft_",
    ];
    let mut header = vec!["x".to_string(), "y".to_string()];
    header.extend(slots.iter().map(|s| mean_column(&s.slot)));
    for p in prefixes {
        header.extend(slots.iter().map(|s| format!("{p}{}", s.slot)));
    }
    w.write_record(&header)?;

    for (i, (col, row)) in outcome.cells.iter().enumerate() {
        let mut rec = vec![col.to_string(), row.to_string()];
        rec.extend(per_slot(slots, i, |f| optional(f.value)));
        rec.extend(per_slot(slots, i, |f| flag(f.has_data()).to_string()));
        rec.extend(per_slot(slots, i, |f| flag(f.quality.is_ok()).to_string()));
        rec.extend(per_slot(slots, i, |f| f.quality.reason().to_string()));
        rec.extend(per_slot(slots, i, |f| flag(f.rover_strict_ok).to_string()));
        rec.extend(per_slot(slots, i, |f| flag(f.rover_soft_ok).to_string()));
        rec.extend(per_slot(slots, i, |f| f.rover_reason.to_string()));
        rec.extend(per_slot(slots, i, |f| flag(f.heli_survival_ok).to_string()));
        rec.extend(per_slot(slots, i, |f| flag(f.heli_energy_pref_ok).to_string()));
        rec.extend(per_slot(slots, i, |f| f.heli_reason.to_string()));
        rec.extend(per_slot(slots, i, |f| flag(f.strict_good).to_string()));
        rec.extend(per_slot(slots, i, |f| f.strict_reason.clone()));
        rec.extend(per_slot(slots, i, |f| flag(f.soft_good).to_string()));
        rec.extend(per_slot(slots, i, |f| f.soft_reason.clone()));
        w.write_record(&rec)?;
    }
    w.flush()?;
    Ok(())
}

/// One strict and one soft status column per slot.
pub fn write_slot_status<W: io::Write>(out: W, outcome: &TieredOutcome) -> Result<()> {
    let mut w = Writer::from_writer(out);
    let slots = &outcome.slots;

    let mut header = vec!["x".to_string(), "y".to_string()];
    header.extend(slots.iter().map(|s| format!("SLOT_STATUS_strict_{}", s.slot)));
    header.extend(slots.iter().map(|s| format!("SLOT_STATUS_soft_{}", s.slot)));
    w.write_record(&header)?;

    for (i, (col, row)) in outcome.cells.iter().enumerate() {
        let mut rec = vec![col.to_string(), row.to_string()];
        rec.extend(slots.iter().map(|s| s.flags[i].strict_status()));
        rec.extend(slots.iter().map(|s| s.flags[i].soft_status()));
        w.write_record(&rec)?;
    }
    w.flush()?;
    Ok(())
}

/// Per-slot good/bad counts.
pub fn write_slot_summaries<W: io::Write>(out: W, summaries: &[SlotSummary]) -> Result<()> {
    let mut w = Writer::from_writer(out);
    for s in summaries {
        w.serialize(s)?;
    }
    w.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_processor::{CellGrid, CellRecord};

    fn to_string(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_cell_table_sentinel() {
        let table = CellTable {
            grid: CellGrid::new(1, 2),
            bands: vec!["avg_slope".into()],
            records: vec![
                CellRecord {
                    col: 0,
                    row: 0,
                    means: vec![Some(2.5)],
                },
                CellRecord {
                    col: 1,
                    row: 0,
                    means: vec![None],
                },
            ],
        };
        let mut buf = Vec::new();
        write_cell_table(&mut buf, &table).unwrap();
        assert_eq!(to_string(buf), "x,y,avg_slope\n0,0,2.5\n1,0,0\n");
    }

    #[test]
    fn test_slot_means_leave_missing_empty() {
        let table = SlotTable {
            cells: vec![(0, 0), (1, 0)],
            slots: vec!["5_30AM".into()],
            values: vec![vec![Some(-80.5), None]],
        };
        let mut buf = Vec::new();
        write_slot_means(&mut buf, &table).unwrap();
        assert_eq!(to_string(buf), "x,y,mean_temperature_5_30AM\n0,0,-80.5\n1,0,\n");
    }

    #[test]
    fn test_summary_header() {
        let summaries = vec![SlotSummary {
            slot: "6_30PM".into(),
            good_strict: 3,
            bad_strict: 1,
            good_soft: 4,
            bad_soft: 0,
            total: 4,
        }];
        let mut buf = Vec::new();
        write_slot_summaries(&mut buf, &summaries).unwrap();
        assert_eq!(
            to_string(buf),
            "slot,good_strict,bad_strict,good_soft,bad_soft,total\n6_30PM,3,1,4,0,4\n"
        );
    }
}
