//! Local solar time handling for thermal acquisitions.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{SurveyError, SurveyResult};

const SECONDS_PER_SOL_CLOCK: i64 = 24 * 3600;

/// Local true solar time of an acquisition on the 24-hour Mars clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LocalSolarTime(NaiveTime);

impl LocalSolarTime {
    pub fn new(time: NaiveTime) -> Self {
        Self(time)
    }

    /// Parse `H:MM:SS[.fff]`, `HH:MM` or `H:MM AM|PM`.
    pub fn parse(s: &str) -> SurveyResult<Self> {
        let trimmed = s.trim();
        for fmt in ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M", "%I:%M %p", "%I:%M%p"] {
            if let Ok(t) = NaiveTime::parse_from_str(trimmed, fmt) {
                return Ok(Self(t));
            }
        }
        Err(SurveyError::InvalidTime(s.to_string()))
    }

    /// Seconds since local midnight (fractional part included).
    pub fn seconds_of_day(&self) -> f64 {
        self.0.num_seconds_from_midnight() as f64 + self.0.nanosecond() as f64 * 1e-9
    }

    /// Shortest distance in minutes between two clock times, wrapping
    /// around midnight.
    pub fn minutes_between(&self, other: &LocalSolarTime) -> f64 {
        let diff = (self.seconds_of_day() - other.seconds_of_day()).abs();
        let wrapped = diff.min(SECONDS_PER_SOL_CLOCK as f64 - diff);
        wrapped / 60.0
    }
}

impl fmt::Display for LocalSolarTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.nanosecond() == 0 {
            write!(f, "{}", self.0.format("%H:%M:%S"))
        } else {
            write!(f, "{}", self.0.format("%H:%M:%S%.3f"))
        }
    }
}

impl TryFrom<String> for LocalSolarTime {
    type Error = SurveyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<LocalSolarTime> for String {
    fn from(value: LocalSolarTime) -> Self {
        value.to_string()
    }
}

/// A named acquisition slot such as `5_30AM`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub name: String,
    pub time: LocalSolarTime,
}

impl TimeSlot {
    /// Build a slot from a name of the form `H_MMAM` / `H_MMPM`, deriving
    /// its clock time from the name.
    pub fn from_name(name: &str) -> SurveyResult<Self> {
        let upper = name.trim().to_ascii_uppercase();
        let (clock, pm) = if let Some(rest) = upper.strip_suffix("PM") {
            (rest, true)
        } else if let Some(rest) = upper.strip_suffix("AM") {
            (rest, false)
        } else {
            return Err(SurveyError::InvalidTime(name.to_string()));
        };

        let (h, m) = clock
            .split_once(['_', ':'])
            .ok_or_else(|| SurveyError::InvalidTime(name.to_string()))?;
        let hour: u32 = h
            .trim()
            .parse()
            .map_err(|_| SurveyError::InvalidTime(name.to_string()))?;
        let minute: u32 = m
            .trim()
            .parse()
            .map_err(|_| SurveyError::InvalidTime(name.to_string()))?;
        if !(1..=12).contains(&hour) {
            return Err(SurveyError::InvalidTime(name.to_string()));
        }

        let hour24 = match (hour, pm) {
            (12, false) => 0,
            (12, true) => 12,
            (h, true) => h + 12,
            (h, false) => h,
        };
        let time = NaiveTime::from_hms_opt(hour24, minute, 0)
            .ok_or_else(|| SurveyError::InvalidTime(name.to_string()))?;

        Ok(Self {
            name: name.trim().to_string(),
            time: LocalSolarTime(time),
        })
    }

    /// Pick the slot closest to `lst`, provided it lies within
    /// `tolerance_minutes`.
    pub fn nearest<'a>(
        slots: &'a [TimeSlot],
        lst: &LocalSolarTime,
        tolerance_minutes: f64,
    ) -> Option<&'a TimeSlot> {
        slots
            .iter()
            .map(|s| (s, s.time.minutes_between(lst)))
            .filter(|(_, d)| *d <= tolerance_minutes)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(s, _)| s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lst_formats() {
        assert_eq!(LocalSolarTime::parse("5:30:00").unwrap().to_string(), "05:30:00");
        assert_eq!(
            LocalSolarTime::parse("17:02:11.25").unwrap().to_string(),
            "17:02:11.250"
        );
        assert_eq!(LocalSolarTime::parse("7:00 PM").unwrap().to_string(), "19:00:00");
        assert!(LocalSolarTime::parse("not a time").is_err());
    }

    #[test]
    fn test_minutes_between_wraps_midnight() {
        let a = LocalSolarTime::parse("23:50:00").unwrap();
        let b = LocalSolarTime::parse("00:10:00").unwrap();
        assert!((a.minutes_between(&b) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_slot_from_name() {
        assert_eq!(TimeSlot::from_name("5_30AM").unwrap().time.to_string(), "05:30:00");
        assert_eq!(TimeSlot::from_name("6_30PM").unwrap().time.to_string(), "18:30:00");
        assert_eq!(TimeSlot::from_name("12_00AM").unwrap().time.to_string(), "00:00:00");
        assert!(TimeSlot::from_name("noon").is_err());
        assert!(TimeSlot::from_name("13_00PM").is_err());
    }

    #[test]
    fn test_nearest_slot() {
        let slots: Vec<TimeSlot> = ["5_30AM", "7_00AM", "6_30PM", "7_00PM"]
            .iter()
            .map(|n| TimeSlot::from_name(n).unwrap())
            .collect();

        let lst = LocalSolarTime::parse("18:41:00").unwrap();
        assert_eq!(TimeSlot::nearest(&slots, &lst, 45.0).unwrap().name, "6_30PM");

        let far = LocalSolarTime::parse("12:00:00").unwrap();
        assert!(TimeSlot::nearest(&slots, &far, 45.0).is_none());
    }

    #[test]
    fn test_serde_as_string() {
        let lst = LocalSolarTime::parse("05:31:02").unwrap();
        let json = serde_json::to_string(&lst).unwrap();
        assert_eq!(json, "\"05:31:02\"");
        let back: LocalSolarTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, lst);
    }
}
