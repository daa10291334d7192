//! Week day enumeration used to key per-day open-hours fields.
//!
//! # Invariants
//! - Exactly seven days, declared monday → sunday.
//! - `as_str()` tags are stable lowercase strings; persisted field and
//!   column names are derived from them.

use serde::{Deserialize, Serialize};

/// Canonical week day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl WeekDay {
    /// All days in declaration order.
    pub const ALL: [WeekDay; 7] = [
        WeekDay::Monday,
        WeekDay::Tuesday,
        WeekDay::Wednesday,
        WeekDay::Thursday,
        WeekDay::Friday,
        WeekDay::Saturday,
        WeekDay::Sunday,
    ];

    /// Stable lowercase tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }

    /// Zero-based position in `ALL`.
    pub fn index(self) -> usize {
        match self {
            Self::Monday => 0,
            Self::Tuesday => 1,
            Self::Wednesday => 2,
            Self::Thursday => 3,
            Self::Friday => 4,
            Self::Saturday => 5,
            Self::Sunday => 6,
        }
    }
}

/// Which end of an open-hours range a field stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HoursBound {
    From,
    To,
}

impl HoursBound {
    pub const BOTH: [HoursBound; 2] = [HoursBound::From, HoursBound::To];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::From => "from",
            Self::To => "to",
        }
    }
}

/// Parses a lowercase week day tag.
pub fn parse_weekday(value: &str) -> Option<WeekDay> {
    WeekDay::ALL.into_iter().find(|day| day.as_str() == value)
}

/// Field name holding one bound of one day, e.g. `open_hours_monday_from`.
pub fn open_hours_field_name(day: WeekDay, bound: HoursBound) -> String {
    format!("open_hours_{}_{}", day.as_str(), bound.as_str())
}

#[cfg(test)]
mod tests {
    use super::{open_hours_field_name, parse_weekday, HoursBound, WeekDay};

    #[test]
    fn indexes_follow_declaration_order() {
        for (position, day) in WeekDay::ALL.iter().enumerate() {
            assert_eq!(day.index(), position);
        }
    }

    #[test]
    fn parses_every_tag_and_rejects_unknown() {
        for day in WeekDay::ALL {
            assert_eq!(parse_weekday(day.as_str()), Some(day));
        }
        assert_eq!(parse_weekday("Monday"), None);
        assert_eq!(parse_weekday("holiday"), None);
    }

    #[test]
    fn derives_field_names() {
        assert_eq!(
            open_hours_field_name(WeekDay::Monday, HoursBound::From),
            "open_hours_monday_from"
        );
        assert_eq!(
            open_hours_field_name(WeekDay::Sunday, HoursBound::To),
            "open_hours_sunday_to"
        );
    }
}
