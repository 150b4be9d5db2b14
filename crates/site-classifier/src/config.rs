//! Configuration for the classifiers.

use serde::{Deserialize, Serialize};

/// Weights of the primary, secondary and tertiary signals in the score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalWeights {
    pub primary: f64,
    pub secondary: f64,
    pub tertiary: f64,
}

impl SignalWeights {
    pub fn new(primary: f64, secondary: f64, tertiary: f64) -> Self {
        Self {
            primary,
            secondary,
            tertiary,
        }
    }

    pub fn sum(&self) -> f64 {
        self.primary + self.secondary + self.tertiary
    }

    pub fn as_array(&self) -> [f64; 3] {
        [self.primary, self.secondary, self.tertiary]
    }
}

impl Default for SignalWeights {
    /// Water first: H2O 0.6, Fe/Mg 0.3, Al-OH 0.1.
    fn default() -> Self {
        Self::new(0.6, 0.3, 0.1)
    }
}

/// Quantile-gated classifier settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveConfig {
    pub weights: SignalWeights,

    /// Lower quantile level (p60 by default).
    pub quantile_low: f64,

    /// Upper quantile level (p80 by default).
    pub quantile_high: f64,

    /// Coefficient of the primary upper quantile in the score gate.
    pub blend_high: f64,

    /// Coefficient of the secondary lower quantile in the score gate.
    pub blend_low: f64,

    /// Data-bearing cells below which thresholds are flagged as unstable.
    pub min_population: usize,
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        Self {
            weights: SignalWeights::default(),
            quantile_low: 0.6,
            quantile_high: 0.8,
            blend_high: 0.55,
            blend_low: 0.45,
            min_population: 10,
        }
    }
}

impl AdaptiveConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        let sum = self.weights.sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(format!("weights must sum to 1 (got {sum})"));
        }
        if self.weights.as_array().iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err("weights must be finite and non-negative".to_string());
        }
        if !(0.0..=1.0).contains(&self.quantile_low) || !(0.0..=1.0).contains(&self.quantile_high) {
            return Err("quantile levels must be in [0, 1]".to_string());
        }
        if self.quantile_low > self.quantile_high {
            return Err("quantile_low must not exceed quantile_high".to_string());
        }
        Ok(())
    }
}

/// Strict minimum temperature for one acquisition slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotThreshold {
    pub name: String,
    /// Strict-ladder minimum in °C
    pub strict_min_c: f64,
}

impl SlotThreshold {
    pub fn new(name: impl Into<String>, strict_min_c: f64) -> Self {
        Self {
            name: name.into(),
            strict_min_c,
        }
    }
}

/// Per-slot operational flagging settings. All temperatures in °C.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TieredConfig {
    pub slots: Vec<SlotThreshold>,

    /// Slot-local quality quantiles.
    pub quality_q_low: f64,
    pub quality_q_high: f64,

    /// Physical plausibility window the quality bounds are clipped to.
    pub phys_min_c: f64,
    pub phys_max_c: f64,

    /// Component-preferred range; above `comp_max_c` is too hot.
    pub comp_min_c: f64,
    pub comp_max_c: f64,

    /// Lowest temperature workable with heaters (soft ladder).
    pub heater_min_c: f64,

    pub survival_min_c: f64,
    pub energy_pref_min_c: f64,

    /// Present cells needed to use quantile quality bounds.
    pub min_population: usize,

    /// Maximum above which all slots are taken to be Kelvin.
    pub kelvin_threshold: f64,
}

impl Default for TieredConfig {
    fn default() -> Self {
        Self {
            slots: vec![
                SlotThreshold::new("5_30AM", -70.0),
                SlotThreshold::new("7_00AM", -70.0),
                SlotThreshold::new("6_30PM", -60.0),
                SlotThreshold::new("7_00PM", -60.0),
            ],
            quality_q_low: 0.10,
            quality_q_high: 0.90,
            phys_min_c: -120.0,
            phys_max_c: 20.0,
            comp_min_c: -40.0,
            comp_max_c: 40.0,
            heater_min_c: -100.0,
            survival_min_c: -100.0,
            energy_pref_min_c: -70.0,
            min_population: 10,
            kelvin_threshold: 200.0,
        }
    }
}

impl TieredConfig {
    /// Strict minimum for `slot`, if configured.
    pub fn strict_min(&self, slot: &str) -> Option<f64> {
        self.slots.iter().find(|s| s.name == slot).map(|s| s.strict_min_c)
    }

    pub fn slot_names(&self) -> Vec<&str> {
        self.slots.iter().map(|s| s.name.as_str()).collect()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.slots.is_empty() {
            return Err("at least one slot is required".to_string());
        }
        for (i, s) in self.slots.iter().enumerate() {
            if self.slots[..i].iter().any(|o| o.name == s.name) {
                return Err(format!("duplicate slot '{}'", s.name));
            }
        }
        if self.phys_min_c >= self.phys_max_c {
            return Err("phys_min_c must be below phys_max_c".to_string());
        }
        if !(0.0..=1.0).contains(&self.quality_q_low)
            || !(0.0..=1.0).contains(&self.quality_q_high)
            || self.quality_q_low > self.quality_q_high
        {
            return Err("quality quantiles must satisfy 0 <= low <= high <= 1".to_string());
        }
        if self.energy_pref_min_c < self.survival_min_c {
            return Err("energy_pref_min_c must not be below survival_min_c".to_string());
        }
        Ok(())
    }
}

/// All classifier settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub adaptive: AdaptiveConfig,
    pub tiered: TieredConfig,
}

impl ClassifierConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from `SURVEY_*` environment variables.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("SURVEY_MIN_POPULATION") {
            if let Ok(n) = val.parse() {
                self.adaptive.min_population = n;
                self.tiered.min_population = n;
            }
        }

        if let Ok(val) = std::env::var("SURVEY_QUANTILES") {
            if let Some((lo, hi)) = val.split_once(',') {
                if let (Ok(lo), Ok(hi)) = (lo.trim().parse(), hi.trim().parse()) {
                    self.adaptive.quantile_low = lo;
                    self.adaptive.quantile_high = hi;
                }
            }
        }

        if let Ok(val) = std::env::var("SURVEY_KELVIN_THRESHOLD") {
            if let Ok(t) = val.parse() {
                self.tiered.kelvin_threshold = t;
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.adaptive.validate().map_err(|e| format!("adaptive: {e}"))?;
        self.tiered.validate().map_err(|e| format!("tiered: {e}"))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClassifierConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tiered.slot_names(), vec!["5_30AM", "7_00AM", "6_30PM", "7_00PM"]);
        assert_eq!(config.tiered.strict_min("6_30PM"), Some(-60.0));
        assert_eq!(config.tiered.strict_min("noon"), None);
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let mut config = AdaptiveConfig::default();
        config.weights = SignalWeights::new(0.5, 0.3, 0.1);
        assert!(config.validate().is_err());

        config.weights = SignalWeights::new(0.5, 0.4, 0.1 + 5e-7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_quantile_order() {
        let mut config = AdaptiveConfig::default();
        config.quantile_low = 0.9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_slots_rejected() {
        let mut config = TieredConfig::default();
        config.slots.push(SlotThreshold::new("5_30AM", -80.0));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: ClassifierConfig =
            serde_json::from_str(r#"{"adaptive": {"quantile_high": 0.9}}"#).unwrap();
        assert_eq!(config.adaptive.quantile_high, 0.9);
        assert_eq!(config.adaptive.quantile_low, 0.6);
        assert_eq!(config.tiered.slots.len(), 4);
    }
}
