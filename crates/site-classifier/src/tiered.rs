//! Per-slot operational flags from cell temperatures.
//!
//! Each (cell, slot) value goes through five checks, all pure functions of
//! the value and the slot's precomputed bounds:
//!
//! 1. presence
//! 2. quality: slot-local quantile bounds clipped to a physical window
//! 3. rover ladders: strict (slot minimum) and soft (heater minimum)
//! 4. helicopter: survival and energy-preferred minimums
//! 5. composite: first failure in the order quality, rover, helicopter
//!
//! Temperatures are in °C; see [`crate::units::to_celsius_if_kelvin`].

use std::fmt;

use grid_processor::CellTable;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::TieredConfig;
use crate::error::{ClassifierError, Result};
use crate::stats::quantiles;
use crate::warning::ClassifierWarning;

/// Outcome of the presence and quality checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityStatus {
    Ok,
    Missing,
    OutlierCold,
    OutlierWarm,
}

impl QualityStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Reason string as written to the flag table.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Ok => "good",
            Self::Missing => "fail: themis_missing",
            Self::OutlierCold => "fail: themis_too_cold_outlier",
            Self::OutlierWarm => "fail: themis_too_warm_outlier",
        }
    }
}

/// Where a value sits on the rover temperature ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoverReason {
    Missing,
    TooHot,
    Ideal,
    EnergyPrefSlot,
    HeaterNeeded,
    TooCold,
}

impl RoverReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::TooHot => "too_hot",
            Self::Ideal => "ideal",
            Self::EnergyPrefSlot => "energy_pref_slot",
            Self::HeaterNeeded => "heater_needed",
            Self::TooCold => "too_cold",
        }
    }
}

impl fmt::Display for RoverReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Helicopter survival/energy outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeliReason {
    Missing,
    TooColdSurvival,
    ColdHighEnergy,
    Ok,
}

impl HeliReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::TooColdSurvival => "too_cold_survival",
            Self::ColdHighEnergy => "cold_high_energy",
            Self::Ok => "ok",
        }
    }
}

impl fmt::Display for HeliReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quality window for one slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityBounds {
    pub lo: f64,
    pub hi: f64,
    /// False when the physical window was used for lack of data
    pub from_quantiles: bool,
}

/// Every flag for one (cell, slot).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotFlags {
    pub value: Option<f64>,
    pub quality: QualityStatus,
    pub rover_strict_ok: bool,
    pub rover_soft_ok: bool,
    pub rover_reason: RoverReason,
    pub heli_survival_ok: bool,
    pub heli_energy_pref_ok: bool,
    pub heli_reason: HeliReason,
    pub strict_good: bool,
    pub soft_good: bool,
    pub strict_reason: String,
    pub soft_reason: String,
}

impl SlotFlags {
    pub fn has_data(&self) -> bool {
        self.value.is_some()
    }

    /// Export status: `"True"` or `"Fail: <reason>"`.
    pub fn strict_status(&self) -> String {
        status(self.strict_good, &self.strict_reason)
    }

    pub fn soft_status(&self) -> String {
        status(self.soft_good, &self.soft_reason)
    }
}

fn status(good: bool, reason: &str) -> String {
    if good {
        "True".to_string()
    } else {
        format!("Fail: {reason}")
    }
}

/// Slot temperatures for a set of cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotTable {
    /// `(col, row)` of each cell
    pub cells: Vec<(usize, usize)>,
    pub slots: Vec<String>,
    /// One column per slot, aligned with `cells`
    pub values: Vec<Vec<Option<f64>>>,
}

impl SlotTable {
    /// Build from one single-band cell table per slot. Cells are ordered by
    /// row then column.
    pub fn from_cell_tables(tables: &[(&str, &CellTable)]) -> Result<Self> {
        let Some((_, first)) = tables.first() else {
            return Ok(Self {
                cells: Vec::new(),
                slots: Vec::new(),
                values: Vec::new(),
            });
        };

        let mut order: Vec<usize> = (0..first.records.len()).collect();
        order.sort_by_key(|&i| (first.records[i].row, first.records[i].col));
        let cells: Vec<(usize, usize)> = order
            .iter()
            .map(|&i| (first.records[i].col, first.records[i].row))
            .collect();

        let mut slots = Vec::with_capacity(tables.len());
        let mut values = Vec::with_capacity(tables.len());
        for (name, table) in tables {
            if table.records.len() != first.records.len() || table.grid != first.grid {
                return Err(ClassifierError::SlotLengthMismatch {
                    slot: name.to_string(),
                    expected: first.records.len(),
                    actual: table.records.len(),
                });
            }
            slots.push(name.to_string());
            values.push(order.iter().map(|&i| table.records[i].means.first().copied().flatten()).collect());
        }

        Ok(Self { cells, slots, values })
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Flags of every cell for one slot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotResult {
    pub slot: String,
    pub strict_min_c: f64,
    pub bounds: QualityBounds,
    pub flags: Vec<SlotFlags>,
}

impl SlotResult {
    pub fn strict_good_count(&self) -> usize {
        self.flags.iter().filter(|f| f.strict_good).count()
    }

    pub fn soft_good_count(&self) -> usize {
        self.flags.iter().filter(|f| f.soft_good).count()
    }
}

/// Flags for the whole table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TieredOutcome {
    pub cells: Vec<(usize, usize)>,
    pub slots: Vec<SlotResult>,
    pub warnings: Vec<ClassifierWarning>,
}

/// Tiered operational flagger.
#[derive(Debug, Clone)]
pub struct TieredFlagger {
    config: TieredConfig,
}

impl TieredFlagger {
    pub fn new(config: TieredConfig) -> Result<Self> {
        config.validate().map_err(ClassifierError::InvalidConfig)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &TieredConfig {
        &self.config
    }

    /// Quality window from the present values of one slot.
    ///
    /// With fewer than `min_population` values the physical window is used
    /// as is.
    pub fn quality_bounds(&self, values: &[Option<f64>]) -> QualityBounds {
        let c = &self.config;
        let present: Vec<f64> = values.iter().flatten().copied().filter(|v| v.is_finite()).collect();

        let (q_lo, q_hi, from_quantiles) = if present.len() >= c.min_population {
            match quantiles(&present, &[c.quality_q_low, c.quality_q_high]) {
                Some(q) => (q[0], q[1], true),
                None => (c.phys_min_c, c.phys_max_c, false),
            }
        } else {
            (c.phys_min_c, c.phys_max_c, false)
        };

        QualityBounds {
            lo: q_lo.max(c.phys_min_c),
            hi: q_hi.min(c.phys_max_c),
            from_quantiles,
        }
    }

    /// Rover ladders: `(strict_ok, soft_ok, reason)`.
    pub fn rover(&self, v: f64, strict_min: f64) -> (bool, bool, RoverReason) {
        let c = &self.config;
        if v > c.comp_max_c {
            return (false, false, RoverReason::TooHot);
        }
        let reason = if v >= c.comp_min_c {
            RoverReason::Ideal
        } else if v >= strict_min {
            RoverReason::EnergyPrefSlot
        } else if v >= c.heater_min_c {
            RoverReason::HeaterNeeded
        } else {
            RoverReason::TooCold
        };
        (v >= strict_min, v >= c.heater_min_c, reason)
    }

    /// Helicopter checks: `(survival_ok, energy_pref_ok, reason)`.
    pub fn heli(&self, v: f64) -> (bool, bool, HeliReason) {
        let c = &self.config;
        if v < c.survival_min_c {
            (false, false, HeliReason::TooColdSurvival)
        } else if v < c.energy_pref_min_c {
            (true, false, HeliReason::ColdHighEnergy)
        } else {
            (true, true, HeliReason::Ok)
        }
    }

    /// All flags for one value.
    pub fn evaluate(&self, value: Option<f64>, strict_min: f64, bounds: &QualityBounds) -> SlotFlags {
        let Some(v) = value.filter(|v| v.is_finite()) else {
            let reason = QualityStatus::Missing.reason().to_string();
            return SlotFlags {
                value: None,
                quality: QualityStatus::Missing,
                rover_strict_ok: false,
                rover_soft_ok: false,
                rover_reason: RoverReason::Missing,
                heli_survival_ok: false,
                heli_energy_pref_ok: false,
                heli_reason: HeliReason::Missing,
                strict_good: false,
                soft_good: false,
                strict_reason: reason.clone(),
                soft_reason: reason,
            };
        };

        let quality = if v < bounds.lo {
            QualityStatus::OutlierCold
        } else if v > bounds.hi {
            QualityStatus::OutlierWarm
        } else {
            QualityStatus::Ok
        };
        let (rover_strict_ok, rover_soft_ok, rover_reason) = self.rover(v, strict_min);
        let (heli_survival_ok, heli_energy_pref_ok, heli_reason) = self.heli(v);

        let composite = |rover_ok: bool| -> (bool, String) {
            if !quality.is_ok() {
                (false, quality.reason().to_string())
            } else if !rover_ok {
                (false, format!("fail: rover({rover_reason})"))
            } else if !heli_survival_ok {
                (false, format!("fail: heli({heli_reason})"))
            } else {
                (true, "good".to_string())
            }
        };
        let (strict_good, strict_reason) = composite(rover_strict_ok);
        let (soft_good, soft_reason) = composite(rover_soft_ok);

        SlotFlags {
            value: Some(v),
            quality,
            rover_strict_ok,
            rover_soft_ok,
            rover_reason,
            heli_survival_ok,
            heli_energy_pref_ok,
            heli_reason,
            strict_good,
            soft_good,
            strict_reason,
            soft_reason,
        }
    }

    /// Flag one slot column.
    pub fn flag_slot(&self, slot: &str, values: &[Option<f64>]) -> Result<(SlotResult, Option<ClassifierWarning>)> {
        let strict_min = self
            .config
            .strict_min(slot)
            .ok_or_else(|| ClassifierError::invalid_config(format!("no strict minimum for slot '{slot}'")))?;

        let bounds = self.quality_bounds(values);
        let warning = if bounds.from_quantiles {
            None
        } else {
            let available = values.iter().flatten().filter(|v| v.is_finite()).count();
            warn!(
                slot = %slot,
                available,
                required = self.config.min_population,
                "Too few cells for quality quantiles, using the physical window"
            );
            Some(ClassifierWarning::InsufficientPopulation {
                scope: Some(slot.to_string()),
                available,
                required: self.config.min_population,
            })
        };

        let flags: Vec<SlotFlags> = values
            .iter()
            .map(|v| self.evaluate(*v, strict_min, &bounds))
            .collect();

        let result = SlotResult {
            slot: slot.to_string(),
            strict_min_c: strict_min,
            bounds,
            flags,
        };
        debug!(
            slot = %slot,
            lo = bounds.lo,
            hi = bounds.hi,
            strict_good = result.strict_good_count(),
            soft_good = result.soft_good_count(),
            "Flagged slot"
        );
        Ok((result, warning))
    }

    /// Flag every slot of `table`.
    pub fn flag(&self, table: &SlotTable) -> Result<TieredOutcome> {
        let mut slots = Vec::with_capacity(table.slots.len());
        let mut warnings = Vec::new();

        for (name, values) in table.slots.iter().zip(&table.values) {
            if values.len() != table.len() {
                return Err(ClassifierError::SlotLengthMismatch {
                    slot: name.clone(),
                    expected: table.len(),
                    actual: values.len(),
                });
            }
            let (result, warning) = self.flag_slot(name, values)?;
            slots.push(result);
            warnings.extend(warning);
        }

        for s in &slots {
            info!(
                slot = %s.slot,
                cells = table.len(),
                strict_good = s.strict_good_count(),
                soft_good = s.soft_good_count(),
                "Slot flags"
            );
        }

        Ok(TieredOutcome {
            cells: table.cells.clone(),
            slots,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flagger() -> TieredFlagger {
        TieredFlagger::new(TieredConfig::default()).unwrap()
    }

    fn phys_window() -> QualityBounds {
        QualityBounds {
            lo: -120.0,
            hi: 20.0,
            from_quantiles: false,
        }
    }

    #[test]
    fn test_minus_110_is_too_cold() {
        let f = flagger().evaluate(Some(-110.0), -70.0, &phys_window());

        assert_eq!(f.quality, QualityStatus::Ok);
        assert!(!f.rover_strict_ok);
        assert!(!f.rover_soft_ok);
        assert_eq!(f.rover_reason, RoverReason::TooCold);
        assert!(!f.heli_survival_ok);
        assert_eq!(f.heli_reason, HeliReason::TooColdSurvival);
        assert_eq!(f.strict_reason, "fail: rover(too_cold)");
        assert!(!f.strict_good);
    }

    #[test]
    fn test_quality_failure_reported_first() {
        let bounds = QualityBounds {
            lo: -90.0,
            hi: -10.0,
            from_quantiles: true,
        };
        let f = flagger().evaluate(Some(-110.0), -70.0, &bounds);
        assert_eq!(f.quality, QualityStatus::OutlierCold);
        assert!(!f.rover_strict_ok);
        assert_eq!(f.strict_reason, "fail: themis_too_cold_outlier");
        assert_eq!(f.soft_reason, "fail: themis_too_cold_outlier");
    }

    #[test]
    fn test_survival_reported_when_rover_passes() {
        let config = TieredConfig {
            heater_min_c: -110.0,
            ..Default::default()
        };
        let f = TieredFlagger::new(config)
            .unwrap()
            .evaluate(Some(-105.0), -70.0, &phys_window());
        assert!(f.rover_soft_ok);
        assert!(!f.heli_survival_ok);
        assert_eq!(f.soft_reason, "fail: heli(too_cold_survival)");
        assert_eq!(f.strict_reason, "fail: rover(heater_needed)");
    }

    #[test]
    fn test_ladder_tiers() {
        let fl = flagger();
        assert_eq!(fl.rover(45.0, -70.0), (false, false, RoverReason::TooHot));
        assert_eq!(fl.rover(0.0, -70.0), (true, true, RoverReason::Ideal));
        assert_eq!(fl.rover(-50.0, -60.0), (true, true, RoverReason::EnergyPrefSlot));
        assert_eq!(fl.rover(-65.0, -60.0), (false, true, RoverReason::HeaterNeeded));
        assert_eq!(fl.rover(-100.0, -60.0), (false, true, RoverReason::HeaterNeeded));

        assert_eq!(fl.heli(-80.0), (true, false, HeliReason::ColdHighEnergy));
        assert_eq!(fl.heli(-70.0), (true, true, HeliReason::Ok));
    }

    #[test]
    fn test_good_and_status() {
        let f = flagger().evaluate(Some(-30.0), -70.0, &phys_window());
        assert!(f.strict_good && f.soft_good);
        assert_eq!(f.strict_reason, "good");
        assert_eq!(f.strict_status(), "True");

        let missing = flagger().evaluate(None, -70.0, &phys_window());
        assert_eq!(missing.strict_reason, "fail: themis_missing");
        assert_eq!(missing.rover_reason, RoverReason::Missing);
        assert_eq!(missing.soft_status(), "Fail: fail: themis_missing");
    }

    #[test]
    fn test_quality_bounds_clipped() {
        let fl = flagger();
        // -110..=-10 in steps of 10: q10 = -100, q90 = -20
        let values: Vec<Option<f64>> = (0..=10).map(|i| Some(-110.0 + 10.0 * i as f64)).collect();
        let b = fl.quality_bounds(&values);
        assert!(b.from_quantiles);
        assert!((b.lo - (-100.0)).abs() < 1e-9);
        assert!((b.hi - (-20.0)).abs() < 1e-9);

        let warm: Vec<Option<f64>> = (0..10).map(|i| Some(10.0 + 5.0 * i as f64)).collect();
        assert_eq!(fl.quality_bounds(&warm).hi, 20.0);

        let few = vec![Some(-50.0), None];
        let b = fl.quality_bounds(&few);
        assert!(!b.from_quantiles);
        assert_eq!((b.lo, b.hi), (-120.0, 20.0));
    }

    #[test]
    fn test_unknown_slot_rejected() {
        assert!(flagger().flag_slot("noon", &[Some(0.0)]).is_err());
    }
}
