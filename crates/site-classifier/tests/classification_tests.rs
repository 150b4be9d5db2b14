//! Integration tests for classification and table export.

use std::fs;

use grid_processor::{CellGrid, CellRecord, CellTable};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use site_classifier::table::{create_file, write_landing_flags, write_mineral_cells, write_slot_flags, write_slot_status};
use site_classifier::{
    mineral_cells, quantile, slot_summaries, to_celsius_if_kelvin, AdaptiveClassifier, AdaptiveConfig, AdaptiveInput,
    ClassifierWarning, QualityStatus, QuantileThresholds, SlotTable, TieredConfig, TieredFlagger,
    DEFAULT_KELVIN_THRESHOLD,
};
use test_utils::{assert_approx_eq, fixtures};

fn slot_table(slot: &str, values: &[Option<f64>]) -> CellTable {
    let grid = CellGrid::new(1, values.len());
    CellTable {
        grid,
        bands: vec![slot.to_string()],
        records: values
            .iter()
            .enumerate()
            .map(|(col, v)| CellRecord {
                col,
                row: 0,
                means: vec![*v],
            })
            .collect(),
    }
}

// =============================================================================
// Adaptive classifier
// =============================================================================

#[test]
fn test_quantile_monotone_in_level() {
    let mut rng = StdRng::seed_from_u64(7);
    let values: Vec<f64> = (0..257).map(|_| rng.gen_range(-5.0..5.0)).collect();

    let mut last = f64::NEG_INFINITY;
    for i in 0..=20 {
        let q = quantile(&values, i as f64 / 20.0).unwrap();
        assert!(q >= last);
        last = q;
    }
}

#[test]
fn test_raising_primary_never_drops_a_pass() {
    let mut rng = StdRng::seed_from_u64(11);
    let classifier = AdaptiveClassifier::new(AdaptiveConfig::default()).unwrap();
    let t = QuantileThresholds {
        low: [30.0, 25.0, 10.0],
        high: [45.0, 40.0, 20.0],
    };

    for i in 0..500 {
        let input = AdaptiveInput {
            col: i,
            row: 0,
            raw: [0.01, 0.01, 0.01],
            signals: [rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0)],
        };
        if classifier.decide(&input, &t) {
            let mut raised = input;
            raised.signals[0] += rng.gen_range(0.0..20.0);
            assert!(classifier.decide(&raised, &t), "cell {i} stopped passing");
        }
    }
}

#[test]
fn test_raising_primary_upper_quantile_never_grows_top_band() {
    let mut rng = StdRng::seed_from_u64(23);
    let classifier = AdaptiveClassifier::new(AdaptiveConfig::default()).unwrap();
    let population: Vec<AdaptiveInput> = (0..400)
        .map(|i| AdaptiveInput {
            col: i % 20,
            row: i / 20,
            raw: [0.01, 0.01, 0.01],
            signals: [rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0)],
        })
        .collect();
    let mut t = classifier.thresholds(&population).unwrap();

    let mut last = usize::MAX;
    let start = t.high[0];
    for step in 0..=60 {
        t.high[0] = start + step as f64 * 1.5;
        let in_band = population
            .iter()
            .filter(|c| AdaptiveClassifier::in_top_band(c, &t))
            .count();
        assert!(in_band <= last, "top band grew from {last} to {in_band} at p80 = {}", t.high[0]);
        last = in_band;
    }
    assert_eq!(last, 0);
}

#[test]
fn test_spectral_table_to_landing_flags() {
    // 12 cells on one row; H2O and Fe/Mg shares both grow to the right
    let records: Vec<CellRecord> = (0..12)
        .map(|col| {
            let c = col as f64;
            CellRecord {
                col,
                row: 0,
                means: vec![Some(0.01), Some(0.02 - 0.0015 * c), Some(0.001 * c)],
            }
        })
        .chain([CellRecord {
            col: 12,
            row: 0,
            means: vec![None, None, None],
        }])
        .collect();
    let table = CellTable {
        grid: CellGrid::new(1, 13),
        bands: vec!["D2300".into(), "BD2210".into(), "BD1900".into()],
        records,
    };

    let cells = mineral_cells(&table).unwrap();
    let inputs: Vec<_> = cells.iter().map(|c| c.to_adaptive_input()).collect();
    let outcome = AdaptiveClassifier::new(AdaptiveConfig::default())
        .unwrap()
        .classify(&inputs);

    assert_eq!(outcome.population, 12);
    assert!(outcome.warnings.is_empty());
    assert!(outcome.records[11].pass);
    assert!(!outcome.records[0].pass);
    assert!(!outcome.records[12].pass);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("landing_flags.csv");
    write_landing_flags(create_file(&path).unwrap(), &outcome).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("x,y,landing_flag"));
    assert_eq!(lines.clone().count(), 13);
    assert_eq!(lines.last(), Some("12,0,0"));

    let means = dir.path().join("cell_means.csv");
    write_mineral_cells(create_file(&means).unwrap(), &cells).unwrap();
    let text = fs::read_to_string(&means).unwrap();
    assert!(text.starts_with("x,y,Avg_D2300,Avg_BD2210,Avg_BD1900,% Fe/Mg,% Al-OH,% H2O\n"));
    assert!(text.ends_with("12,0,0,0,0,0,0,0\n"));
}

// =============================================================================
// Tiered flagger
// =============================================================================

#[test]
fn test_kelvin_slots_flagged_in_celsius() {
    // 163.15 K = -110 °C, 243.15 K = -30 °C
    let kelvin = slot_table("5_30AM", &[Some(163.15), Some(243.15), None]);
    let mut table = SlotTable::from_cell_tables(&[("5_30AM", &kelvin)]).unwrap();

    assert!(to_celsius_if_kelvin(&mut table.values, DEFAULT_KELVIN_THRESHOLD));
    let outcome = TieredFlagger::new(TieredConfig::default())
        .unwrap()
        .flag(&table)
        .unwrap();

    let flags = &outcome.slots[0].flags;
    assert_approx_eq!(flags[0].value.unwrap(), -110.0, 1e-9);
    assert_eq!(flags[0].strict_reason, "fail: rover(too_cold)");
    assert!(!flags[0].heli_survival_ok);
    assert!(flags[1].strict_good);
    assert_eq!(flags[2].quality, QualityStatus::Missing);

    // Two present values are below the default population of 10
    assert!(matches!(
        &outcome.warnings[0],
        ClassifierWarning::InsufficientPopulation { scope: Some(s), available: 2, .. } if s == "5_30AM"
    ));
}

#[test]
fn test_quality_reason_before_ladder_reason() {
    // Ten values spread over -80..=-35 so quality quantiles are used; the
    // coldest cell is both a cold outlier and below the strict minimum.
    let values: Vec<Option<f64>> = (0..10).map(|i| Some(-80.0 + 5.0 * i as f64)).collect();
    let table = SlotTable {
        cells: (0..10).map(|c| (c, 0)).collect(),
        slots: vec!["7_00AM".into()],
        values: vec![values],
    };
    let outcome = TieredFlagger::new(TieredConfig::default())
        .unwrap()
        .flag(&table)
        .unwrap();
    let slot = &outcome.slots[0];

    assert!(slot.bounds.from_quantiles);
    assert!(outcome.warnings.is_empty());
    let coldest = &slot.flags[0];
    assert_eq!(coldest.quality, QualityStatus::OutlierCold);
    assert!(!coldest.rover_strict_ok);
    assert_eq!(coldest.strict_reason, "fail: themis_too_cold_outlier");

    let warmest = &slot.flags[9];
    assert_eq!(warmest.quality, QualityStatus::OutlierWarm);
    assert_eq!(warmest.soft_reason, "fail: themis_too_warm_outlier");
}

#[test]
fn test_slot_exports() {
    let names: Vec<&str> = fixtures::slots::NAMES.to_vec();
    let tables: Vec<CellTable> = names
        .iter()
        .map(|n| slot_table(n, &[Some(-30.0), Some(-65.0)]))
        .collect();
    let pairs: Vec<(&str, &CellTable)> = names.iter().copied().zip(&tables).collect();
    let table = SlotTable::from_cell_tables(&pairs).unwrap();

    let outcome = TieredFlagger::new(TieredConfig::default())
        .unwrap()
        .flag(&table)
        .unwrap();

    let summary = slot_summaries(&outcome);
    assert_eq!(summary.len(), names.len());
    assert!(summary.iter().all(|s| s.total == 2 && s.good_soft == 2));

    let dir = tempfile::tempdir().unwrap();
    let status = dir.path().join("status.csv");
    write_slot_status(create_file(&status).unwrap(), &outcome).unwrap();
    let text = fs::read_to_string(&status).unwrap();
    let header = text.lines().next().unwrap();
    assert!(header.starts_with("x,y,SLOT_STATUS_strict_"));
    assert_eq!(header.split(',').count(), 2 + 2 * names.len());
    // -65 °C clears the morning strict minimum but not the evening one
    assert!(text.contains("Fail: fail: rover(heater_needed)"));

    let flags = dir.path().join("flags.csv");
    write_slot_flags(create_file(&flags).unwrap(), &outcome).unwrap();
    let text = fs::read_to_string(&flags).unwrap();
    assert_eq!(text.lines().next().unwrap().split(',').count(), 2 + 14 * names.len());
    assert_eq!(text.lines().count(), 3);
}
