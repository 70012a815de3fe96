use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An inclusive span of calendar days. Both endpoints belong to the range:
/// an end of day D covers every observation dated D.
#[derive(Clone, Eq, PartialEq, Copy, Debug, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(deserialize_with = "crate::serde_date::deserialize")]
    pub start: NaiveDate,
    #[serde(deserialize_with = "crate::serde_date::deserialize")]
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// True when `date` falls on or between the endpoints. A reversed range
    /// contains nothing.
    pub fn contains(&self, date: &NaiveDate) -> bool {
        self.start <= *date && *date <= self.end
    }

    /// Iterate each day from start through end.
    pub fn days(&self) -> Days {
        Days(self.start, self.end)
    }
}

/// Iterator over the days of a [`DateRange`].
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct Days(NaiveDate, NaiveDate);

impl Iterator for Days {
    type Item = NaiveDate;
    fn next(&mut self) -> Option<Self::Item> {
        if self.0 <= self.1 {
            let current = self.0;
            match current.succ_opt() {
                Some(next) => self.0 = next,
                None => self.1 = NaiveDate::MIN,
            }
            Some(current)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DateRange;
    use chrono::NaiveDate;

    #[test]
    fn test_date_range_iteration() {
        let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2022, 1, 5).unwrap();
        let range = DateRange::new(start, end);
        let dates: Vec<NaiveDate> = range.days().collect();
        assert_eq!(dates.len(), 5);
        assert_eq!(dates[0], start);
        assert_eq!(dates[4], end);
    }

    #[test]
    fn test_date_range_contains_both_endpoints() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let range = DateRange::new(start, end);
        assert!(range.contains(&start));
        assert!(range.contains(&end));
        assert!(!range.contains(&NaiveDate::from_ymd_opt(2024, 1, 6).unwrap()));
        assert!(!range.contains(&NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()));
    }

    #[test]
    fn test_date_range_reversed_is_empty() {
        let start = NaiveDate::from_ymd_opt(2022, 3, 15).unwrap();
        let end = NaiveDate::from_ymd_opt(2022, 3, 14).unwrap();
        let range = DateRange::new(start, end);
        assert_eq!(range.days().count(), 0);
        assert!(!range.contains(&start));
    }

    #[test]
    fn test_date_range_deserializes_timestamps() {
        let range: DateRange =
            serde_json::from_str(r#"{"start":"2024-01-01","end":"2024-01-05T23:59:59.999Z"}"#)
                .unwrap();
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    }
}
