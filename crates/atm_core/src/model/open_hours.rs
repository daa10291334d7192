//! Open-hours value object for one week day.
//!
//! # Invariants
//! - `00:00`–`00:00` means closed for the whole day.
//! - `00:00`–`23:59` and `00:00`–`24:00` mean open around the clock.
//! - `from <= to` is not enforced; ranges are taken literally.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

const MIDNIGHT: &str = "00:00";
const END_OF_DAY: &str = "23:59";
const END_OF_DAY_ALT: &str = "24:00";

static TIME_OF_DAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[01]\d|2[0-3]):[0-5]\d$").expect("valid time regex"));

/// Open and close time for one day, both `HH:MM`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenHours {
    pub from: String,
    pub to: String,
}

impl OpenHours {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Usually true; false only when not open on that day at all.
    pub fn is_available(&self) -> bool {
        !(self.from == MIDNIGHT && self.to == MIDNIGHT)
    }

    /// True when open for the whole day.
    pub fn is_available_24h(&self) -> bool {
        self.from == MIDNIGHT && (self.to == END_OF_DAY || self.to == END_OF_DAY_ALT)
    }
}

/// Returns whether `value` is a `HH:MM` time between `00:00` and `23:59`,
/// or the literal end-of-day marker `24:00`.
pub fn is_well_formed_time(value: &str) -> bool {
    value == END_OF_DAY_ALT || TIME_OF_DAY_RE.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::{is_well_formed_time, OpenHours};

    #[test]
    fn closed_day_is_neither_available_nor_24h() {
        let hours = OpenHours::new("00:00", "00:00");
        assert!(!hours.is_available());
        assert!(!hours.is_available_24h());
    }

    #[test]
    fn full_day_variants_are_24h() {
        for to in ["23:59", "24:00"] {
            let hours = OpenHours::new("00:00", to);
            assert!(hours.is_available());
            assert!(hours.is_available_24h());
        }
    }

    #[test]
    fn office_hours_are_available_but_not_24h() {
        let hours = OpenHours::new("09:00", "17:00");
        assert!(hours.is_available());
        assert!(!hours.is_available_24h());
    }

    #[test]
    fn identical_non_midnight_times_are_available() {
        assert!(OpenHours::new("08:00", "08:00").is_available());
    }

    #[test]
    fn morning_only_from_midnight_is_not_24h() {
        let hours = OpenHours::new("00:00", "12:00");
        assert!(hours.is_available());
        assert!(!hours.is_available_24h());
    }

    #[test]
    fn reversed_range_is_accepted_literally() {
        let hours = OpenHours::new("22:00", "06:00");
        assert!(hours.is_available());
        assert!(!hours.is_available_24h());
    }

    #[test]
    fn time_format_check() {
        for valid in ["00:00", "09:30", "23:59", "24:00"] {
            assert!(is_well_formed_time(valid), "{valid} should be valid");
        }
        for invalid in ["", "9:30", "24:01", "25:00", "12:60", "12-30", "12:30 "] {
            assert!(!is_well_formed_time(invalid), "{invalid} should be invalid");
        }
    }
}
