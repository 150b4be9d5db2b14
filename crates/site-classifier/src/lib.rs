//! Per-cell site classification.
//!
//! Two classifiers work on aggregated cell tables:
//!
//! - **Adaptive**: weights three signals and gates cells on quantiles of
//!   the data set itself. Used on spectral index shares.
//! - **Tiered**: flags each cell and acquisition slot on temperature
//!   against a quality window, rover ladders and helicopter limits, with a
//!   reason string for every failure.
//!
//! Results are exported as CSV tables via [`table`].
//!
//! ```ignore
//! use site_classifier::{mineral_cells, AdaptiveClassifier, ClassifierConfig};
//!
//! let config = ClassifierConfig::from_env();
//! let cells = mineral_cells(&cell_table)?;
//! let inputs: Vec<_> = cells.iter().map(|c| c.to_adaptive_input()).collect();
//! let outcome = AdaptiveClassifier::new(config.adaptive)?.classify(&inputs);
//! ```

pub mod adaptive;
pub mod config;
pub mod error;
pub mod mineral;
pub mod stats;
pub mod summary;
pub mod table;
pub mod tiered;
pub mod units;
pub mod warning;

pub use adaptive::{AdaptiveClassifier, AdaptiveInput, AdaptiveOutcome, AdaptiveRecord, QuantileThresholds};
pub use config::{AdaptiveConfig, ClassifierConfig, SignalWeights, SlotThreshold, TieredConfig};
pub use error::{ClassifierError, Result};
pub use mineral::{mineral_cells, MineralCell, MineralShares, TRACKED_BANDS};
pub use stats::{quantile, quantiles};
pub use summary::{good_site_composition, slot_summaries, SlotSummary};
pub use tiered::{
    HeliReason, QualityBounds, QualityStatus, RoverReason, SlotFlags, SlotResult, SlotTable, TieredFlagger,
    TieredOutcome,
};
pub use units::{to_celsius_if_kelvin, DEFAULT_KELVIN_THRESHOLD, KELVIN_OFFSET};
pub use warning::ClassifierWarning;
