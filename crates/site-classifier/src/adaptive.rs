//! Quantile-gated classification of cells by three weighted signals.
//!
//! Thresholds adapt to the data set: the lower and upper quantiles of each
//! signal are taken over the cells that have data, and a cell passes when
//! its primary signal is in the top band (or in the upper-middle band with
//! a strong secondary signal) and its weighted score clears a blend of the
//! two thresholds.

use serde::Serialize;
use tracing::{info, warn};

use crate::config::AdaptiveConfig;
use crate::error::{ClassifierError, Result};
use crate::stats::quantiles;
use crate::warning::ClassifierWarning;

/// One cell as seen by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AdaptiveInput {
    pub col: usize,
    pub row: usize,
    /// Raw band means behind the signals, empty cells as 0
    pub raw: [f64; 3],
    /// Primary, secondary and tertiary signal values
    pub signals: [f64; 3],
}

impl AdaptiveInput {
    /// A cell has data iff its raw means sum to more than zero.
    pub fn has_data(&self) -> bool {
        self.raw.iter().sum::<f64>() > 0.0
    }
}

/// Lower and upper quantiles of each signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuantileThresholds {
    pub low: [f64; 3],
    pub high: [f64; 3],
}

/// Classified cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdaptiveRecord {
    pub col: usize,
    pub row: usize,
    pub raw: [f64; 3],
    pub signals: [f64; 3],
    pub has_data: bool,
    /// Weighted score, `None` without data
    pub score: Option<f64>,
    pub pass: bool,
}

/// Result of classifying a table.
#[derive(Debug, Clone, Serialize)]
pub struct AdaptiveOutcome {
    pub records: Vec<AdaptiveRecord>,
    /// `None` when no cell has data
    pub thresholds: Option<QuantileThresholds>,
    /// Minimum score a passing cell needs
    pub score_gate: Option<f64>,
    /// Number of data-bearing cells the thresholds came from
    pub population: usize,
    pub warnings: Vec<ClassifierWarning>,
}

impl AdaptiveOutcome {
    pub fn pass_count(&self) -> usize {
        self.records.iter().filter(|r| r.pass).count()
    }
}

/// Adaptive quantile classifier.
#[derive(Debug, Clone)]
pub struct AdaptiveClassifier {
    config: AdaptiveConfig,
}

impl AdaptiveClassifier {
    /// Create a classifier, rejecting weights that do not sum to one.
    pub fn new(config: AdaptiveConfig) -> Result<Self> {
        let sum = config.weights.sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(ClassifierError::InvalidWeights { sum });
        }
        config.validate().map_err(ClassifierError::InvalidConfig)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AdaptiveConfig {
        &self.config
    }

    /// Weighted score of a cell's signals.
    pub fn score(&self, input: &AdaptiveInput) -> f64 {
        self.config
            .weights
            .as_array()
            .iter()
            .zip(input.signals)
            .map(|(w, s)| w * s)
            .sum()
    }

    /// Quantile thresholds over the data-bearing cells.
    pub fn thresholds(&self, inputs: &[AdaptiveInput]) -> Option<QuantileThresholds> {
        let levels = [self.config.quantile_low, self.config.quantile_high];
        let mut low = [0.0; 3];
        let mut high = [0.0; 3];
        for k in 0..3 {
            let values: Vec<f64> = inputs
                .iter()
                .filter(|c| c.has_data())
                .map(|c| c.signals[k])
                .collect();
            let q = quantiles(&values, &levels)?;
            low[k] = q[0];
            high[k] = q[1];
        }
        Some(QuantileThresholds { low, high })
    }

    /// Minimum score for a pass under `t`.
    pub fn score_gate(&self, t: &QuantileThresholds) -> f64 {
        self.config.blend_high * t.high[0] + self.config.blend_low * t.low[1]
    }

    /// Whether the primary signal reaches the upper quantile.
    pub fn in_top_band(input: &AdaptiveInput, t: &QuantileThresholds) -> bool {
        input.signals[0] >= t.high[0]
    }

    /// Pass decision for one cell under fixed thresholds.
    pub fn decide(&self, input: &AdaptiveInput, t: &QuantileThresholds) -> bool {
        if !input.has_data() {
            return false;
        }
        let [a, b, _] = input.signals;
        let signal_ok = Self::in_top_band(input, t) || (a >= t.low[0] && b >= t.low[1]);
        signal_ok && self.score(input) >= self.score_gate(t)
    }

    /// Classify every cell.
    pub fn classify(&self, inputs: &[AdaptiveInput]) -> AdaptiveOutcome {
        let population = inputs.iter().filter(|c| c.has_data()).count();

        let mut warnings = Vec::new();
        if population < self.config.min_population {
            warn!(
                available = population,
                required = self.config.min_population,
                "Quantile thresholds computed from a small population"
            );
            warnings.push(ClassifierWarning::InsufficientPopulation {
                scope: None,
                available: population,
                required: self.config.min_population,
            });
        }

        let thresholds = self.thresholds(inputs);
        let records: Vec<AdaptiveRecord> = inputs
            .iter()
            .map(|c| {
                let has_data = c.has_data();
                AdaptiveRecord {
                    col: c.col,
                    row: c.row,
                    raw: c.raw,
                    signals: c.signals,
                    has_data,
                    score: has_data.then(|| self.score(c)),
                    pass: thresholds.as_ref().map_or(false, |t| self.decide(c, t)),
                }
            })
            .collect();

        let outcome = AdaptiveOutcome {
            score_gate: thresholds.as_ref().map(|t| self.score_gate(t)),
            thresholds,
            records,
            population,
            warnings,
        };

        info!(
            cells = inputs.len(),
            with_data = population,
            passed = outcome.pass_count(),
            "Adaptive classification complete"
        );

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SignalWeights;

    fn cell(i: usize, signals: [f64; 3]) -> AdaptiveInput {
        AdaptiveInput {
            col: i,
            row: 0,
            raw: [0.01, 0.01, 0.01],
            signals,
        }
    }

    fn empty(i: usize) -> AdaptiveInput {
        AdaptiveInput {
            col: i,
            row: 0,
            raw: [0.0; 3],
            signals: [0.0; 3],
        }
    }

    fn classifier() -> AdaptiveClassifier {
        AdaptiveClassifier::new(AdaptiveConfig::default()).unwrap()
    }

    #[test]
    fn test_rejects_bad_weights() {
        let config = AdaptiveConfig {
            weights: SignalWeights::new(0.6, 0.3, 0.2),
            ..Default::default()
        };
        assert!(matches!(
            AdaptiveClassifier::new(config),
            Err(ClassifierError::InvalidWeights { .. })
        ));
    }

    #[test]
    fn test_has_data_uses_raw_sum() {
        assert!(!empty(0).has_data());
        let negative = AdaptiveInput {
            raw: [0.01, -0.02, 0.0],
            ..cell(0, [10.0, 10.0, 10.0])
        };
        assert!(!negative.has_data());
    }

    #[test]
    fn test_top_primary_passes() {
        let inputs: Vec<_> = (0..10)
            .map(|i| cell(i, [i as f64 * 10.0, 20.0, 10.0]))
            .chain([empty(10)])
            .collect();
        let outcome = classifier().classify(&inputs);

        let t = outcome.thresholds.unwrap();
        // primary values 0..90, p80 = 72
        assert!((t.high[0] - 72.0).abs() < 1e-9);
        assert!(outcome.records[9].pass);
        assert!(outcome.records[8].pass);
        assert!(!outcome.records[0].pass);
        assert!(!outcome.records[10].pass);
        assert_eq!(outcome.records[10].score, None);
        assert_eq!(outcome.population, 10);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn test_no_data_fails_everything() {
        let inputs = vec![empty(0), empty(1)];
        let outcome = classifier().classify(&inputs);
        assert!(outcome.thresholds.is_none());
        assert!(outcome.score_gate.is_none());
        assert_eq!(outcome.pass_count(), 0);
        assert!(matches!(
            outcome.warnings[0],
            ClassifierWarning::InsufficientPopulation { available: 0, required: 10, .. }
        ));
    }

    #[test]
    fn test_small_population_still_classifies() {
        let inputs = vec![cell(0, [90.0, 5.0, 5.0]), cell(1, [10.0, 45.0, 45.0])];
        let outcome = classifier().classify(&inputs);
        assert!(outcome.thresholds.is_some());
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.records[0].pass);
    }

    #[test]
    fn test_score_gate_blocks_weak_cells() {
        let c = classifier();
        let t = QuantileThresholds {
            low: [10.0, 10.0, 10.0],
            high: [50.0, 50.0, 50.0],
        };
        // Primary reaches p80 but score 0.6*50 = 30 < 0.55*50 + 0.45*10 = 32
        let weak = cell(0, [50.0, 0.0, 0.0]);
        assert!(AdaptiveClassifier::in_top_band(&weak, &t));
        assert!(!c.decide(&weak, &t));

        let strong = cell(1, [50.0, 10.0, 0.0]);
        assert!(c.decide(&strong, &t));
    }
}
