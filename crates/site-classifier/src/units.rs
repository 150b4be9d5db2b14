//! Temperature unit handling.

use tracing::info;

/// Offset between Kelvin and degrees Celsius.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Default maximum above which values are taken to be Kelvin.
pub const DEFAULT_KELVIN_THRESHOLD: f64 = 200.0;

/// Convert every slot from Kelvin to °C when the largest finite value
/// across all slots exceeds `threshold`.
///
/// Missing values stay missing. Returns whether a conversion happened.
pub fn to_celsius_if_kelvin(slots: &mut [Vec<Option<f64>>], threshold: f64) -> bool {
    let max = slots
        .iter()
        .flatten()
        .flatten()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))));

    match max {
        Some(m) if m > threshold => {
            for v in slots.iter_mut().flatten().flatten() {
                *v -= KELVIN_OFFSET;
            }
            info!(max = m, threshold, "Converted slot temperatures from Kelvin to Celsius");
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kelvin_converted() {
        let mut slots = vec![vec![Some(250.0), None], vec![Some(180.0)]];
        assert!(to_celsius_if_kelvin(&mut slots, DEFAULT_KELVIN_THRESHOLD));
        assert!((slots[0][0].unwrap() - (-23.15)).abs() < 1e-9);
        assert_eq!(slots[0][1], None);
        assert!((slots[1][0].unwrap() - (-93.15)).abs() < 1e-9);
    }

    #[test]
    fn test_celsius_untouched() {
        let mut slots = vec![vec![Some(-60.0), Some(10.0)]];
        assert!(!to_celsius_if_kelvin(&mut slots, DEFAULT_KELVIN_THRESHOLD));
        assert_eq!(slots[0][0], Some(-60.0));

        let mut empty: Vec<Vec<Option<f64>>> = vec![vec![None]];
        assert!(!to_celsius_if_kelvin(&mut empty, DEFAULT_KELVIN_THRESHOLD));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let mut slots = vec![vec![Some(200.0)]];
        assert!(!to_celsius_if_kelvin(&mut slots, 200.0));
    }
}
