//! Shared utility functions for the pest monitoring crates.

/// Date utility functions
pub mod dates {
    use crate::error::DateError;
    use chrono::{Datelike, NaiveDate, TimeDelta};

    /// Canonical date format: "YYYY-MM-DD"
    pub const DATE_FORMAT: &str = "%Y-%m-%d";

    /// Compact date format used by some field logs: "YYYYMMDD"
    pub const COMPACT_DATE_FORMAT: &str = "%Y%m%d";

    /// Number of days in a normalized year (Feb 29 shares the Feb 28 bucket).
    pub const DAYS_IN_NORMALIZED_YEAR: u32 = 365;

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format(DATE_FORMAT).to_string()
    }

    /// Parse a calendar day from the formats the feeds emit.
    ///
    /// Accepts "YYYY-MM-DD", "YYYYMMDD" and any timestamp whose first ten
    /// characters are "YYYY-MM-DD" followed by 'T' or ' '. The time of day is
    /// dropped, so a timestamp late on day D still parses as D.
    pub fn parse_date(s: &str) -> Result<NaiveDate, DateError> {
        let s = s.trim();
        if let Ok(date) = NaiveDate::parse_from_str(s, DATE_FORMAT) {
            return Ok(date);
        }
        if s.len() > 10 && matches!(s.as_bytes()[10], b'T' | b' ') {
            if let Some(day) = s.get(..10) {
                if let Ok(date) = NaiveDate::parse_from_str(day, DATE_FORMAT) {
                    return Ok(date);
                }
            }
        }
        parse_date_compact(s)
    }

    /// Parse a date string in "YYYYMMDD" format
    pub fn parse_date_compact(s: &str) -> Result<NaiveDate, DateError> {
        NaiveDate::parse_from_str(s.trim(), COMPACT_DATE_FORMAT)
            .map_err(|_| DateError(format!("unrecognised date '{}'", s)))
    }

    pub fn is_leap_year(year: i32) -> bool {
        NaiveDate::from_ymd_opt(year, 2, 29).is_some()
    }

    /// Ordinal day within the calendar year, normalized to 1..=365.
    ///
    /// In leap years Feb 29 folds onto Feb 28 (day 59) and every later day is
    /// shifted back by one, so a given month/day lands in the same bucket in
    /// every year: March 1 is always day 60.
    pub fn day_of_year(date: &NaiveDate) -> u32 {
        let ordinal = date.ordinal();
        if is_leap_year(date.year()) && ordinal >= 60 {
            ordinal - 1
        } else {
            ordinal
        }
    }

    /// The date `days` calendar days before `date`, saturating at the
    /// earliest representable date.
    pub fn days_before(date: NaiveDate, days: i64) -> NaiveDate {
        TimeDelta::try_days(days)
            .and_then(|delta| date.checked_sub_signed(delta))
            .unwrap_or(NaiveDate::MIN)
    }

    /// The date `days` calendar days after `date`, saturating at the latest
    /// representable date.
    pub fn days_after(date: NaiveDate, days: i64) -> NaiveDate {
        TimeDelta::try_days(days)
            .and_then(|delta| date.checked_add_signed(delta))
            .unwrap_or(NaiveDate::MAX)
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::NaiveDate;

        #[test]
        fn test_format_and_parse() {
            let date = NaiveDate::from_ymd_opt(2023, 6, 15).unwrap();
            let formatted = format_date(&date);
            assert_eq!(formatted, "2023-06-15");
            let parsed = parse_date(&formatted).unwrap();
            assert_eq!(parsed, date);
        }

        #[test]
        fn test_parse_timestamps_truncate_to_day() {
            let day = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
            assert_eq!(parse_date("2024-01-05T23:59:59.999Z").unwrap(), day);
            assert_eq!(parse_date("2024-01-05 14:30:00").unwrap(), day);
            assert_eq!(parse_date("20240105").unwrap(), day);
            assert_eq!(parse_date(" 2024-01-05 ").unwrap(), day);
        }

        #[test]
        fn test_parse_rejects_garbage() {
            assert!(parse_date("").is_err());
            assert!(parse_date("yesterday").is_err());
            assert!(parse_date("2024-13-45").is_err());
        }

        #[test]
        fn test_day_of_year_common_year() {
            let jan1 = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
            assert_eq!(day_of_year(&jan1), 1);
            let mar1 = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap();
            assert_eq!(day_of_year(&mar1), 60);
            let dec31 = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
            assert_eq!(day_of_year(&dec31), 365);
        }

        #[test]
        fn test_day_of_year_leap_year() {
            let feb28 = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
            let feb29 = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
            assert_eq!(day_of_year(&feb28), 59);
            assert_eq!(day_of_year(&feb29), 59);
            let mar1 = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
            assert_eq!(day_of_year(&mar1), 60);
            let dec31 = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
            assert_eq!(day_of_year(&dec31), DAYS_IN_NORMALIZED_YEAR);
        }

        #[test]
        fn test_days_before_and_after() {
            let mar1 = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
            assert_eq!(days_before(mar1, 1), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
            assert_eq!(days_after(mar1, 31), NaiveDate::from_ymd_opt(2024, 4, 1).unwrap());
            assert_eq!(days_before(NaiveDate::MIN, 1), NaiveDate::MIN);
        }
    }
}

/// Rounding and ratio helpers. Every derived value rounds to nearest with
/// ties away from zero.
pub mod rounding {
    /// Round to the nearest whole number.
    pub fn round_whole(value: f64) -> f64 {
        value.round()
    }

    /// Round to one decimal place.
    pub fn round_tenth(value: f64) -> f64 {
        (value * 10.0).round() / 10.0
    }

    /// Arithmetic mean, or `None` for an empty sample.
    pub fn mean(total: f64, samples: usize) -> Option<f64> {
        if samples == 0 {
            None
        } else {
            Some(total / samples as f64)
        }
    }

    /// `100 * part / whole`, defined as 0 when `whole` is 0.
    pub fn percent_of(part: usize, whole: usize) -> f64 {
        if whole == 0 {
            0.0
        } else {
            100.0 * part as f64 / whole as f64
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_round_half_away_from_zero() {
            assert_eq!(round_whole(2.5), 3.0);
            assert_eq!(round_whole(-2.5), -3.0);
            assert_eq!(round_tenth(33.35), 33.4);
            assert_eq!(round_tenth(66.666), 66.7);
        }

        #[test]
        fn test_mean_and_percent_guards() {
            assert_eq!(mean(10.0, 0), None);
            assert_eq!(mean(10.0, 4), Some(2.5));
            assert_eq!(percent_of(3, 0), 0.0);
            assert_eq!(percent_of(1, 2), 50.0);
        }
    }
}

/// Error types
pub mod error {
    use std::fmt;

    #[derive(Debug, Clone, PartialEq)]
    pub struct DateError(pub String);

    impl fmt::Display for DateError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "Date error: {}", self.0)
        }
    }

    impl std::error::Error for DateError {}
}
