//! Non-fatal conditions attached to classification results.

use serde::Serialize;

/// Something a consumer of the results should know about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierWarning {
    /// Fewer data-bearing cells than `required` went into a quantile.
    InsufficientPopulation {
        /// Slot name for per-slot thresholds, `None` for the whole table
        scope: Option<String>,
        available: usize,
        required: usize,
    },
}

impl std::fmt::Display for ClassifierWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientPopulation {
                scope,
                available,
                required,
            } => {
                write!(f, "insufficient population")?;
                if let Some(s) = scope {
                    write!(f, " in '{s}'")?;
                }
                write!(f, ": {available} cells with data, {required} required")
            }
        }
    }
}
