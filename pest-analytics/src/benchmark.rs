use crate::stitch::ChartSeriesPoint;
use chrono::{Datelike, NaiveDate};
use pest_core::{Choice, Observation, PestType};
use pest_utils::dates::day_of_year;
use pest_utils::rounding::{mean, round_whole};
use serde::Serialize;
use std::collections::HashMap;

/// A forecast date with its same-day comparisons from history.
/// Missing history stays `None`; it is never reported as 0.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkPoint {
    pub date: NaiveDate,
    pub day_of_year: u32,
    pub actual: Option<f64>,
    pub predicted: Option<f64>,
    pub last_year_benchmark: Option<f64>,
    pub overall_benchmark: Option<f64>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Bucket {
    total: f64,
    samples: usize,
}

impl Bucket {
    fn add(&mut self, count: u32) {
        self.total += count as f64;
        self.samples += 1;
    }

    fn average(&self) -> Option<f64> {
        mean(self.total, self.samples).map(round_whole)
    }
}

/// Day-of-year buckets over the pest-filtered history.
struct History {
    by_year: HashMap<(i32, u32), Bucket>,
    all_years: HashMap<u32, Bucket>,
}

impl History {
    fn new(observations: &[Observation], pest: &Choice<PestType>) -> History {
        let mut history = History {
            by_year: HashMap::new(),
            all_years: HashMap::new(),
        };
        for obs in observations.iter().filter(|o| pest.accepts(&o.pest_type)) {
            let doy = day_of_year(&obs.date);
            history
                .by_year
                .entry((obs.date.year(), doy))
                .or_default()
                .add(obs.count);
            history.all_years.entry(doy).or_default().add(obs.count);
        }
        history
    }

    fn last_year(&self, date: &NaiveDate) -> Option<f64> {
        self.by_year
            .get(&(date.year() - 1, day_of_year(date)))
            .and_then(Bucket::average)
    }

    fn overall(&self, date: &NaiveDate) -> Option<f64> {
        self.all_years.get(&day_of_year(date)).and_then(Bucket::average)
    }
}

/// Attach last-year and all-history benchmarks to each forecast point of
/// `series`. Historical-only points are skipped.
pub fn align_benchmarks(
    series: &[ChartSeriesPoint],
    observations: &[Observation],
    pest: &Choice<PestType>,
) -> Vec<BenchmarkPoint> {
    let history = History::new(observations, pest);
    series
        .iter()
        .filter(|p| p.is_forecast)
        .map(|p| BenchmarkPoint {
            date: p.date,
            day_of_year: day_of_year(&p.date),
            actual: p.actual,
            predicted: p.predicted,
            last_year_benchmark: history.last_year(&p.date),
            overall_benchmark: history.overall(&p.date),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stitch::stitch_forecast;
    use crate::test_support::{day, obs, point};
    use pest_core::Horizon;

    #[test]
    fn test_benchmarks_by_day_of_year() {
        let today = day(2024, 3, 10);
        let observations = vec![
            obs("ly", day(2023, 3, 10), 40, 50.0, "Vegetative"),
            obs("ly2", day(2023, 3, 10), 45, 50.0, "Vegetative"),
            obs("old", day(2021, 3, 10), 10, 50.0, "Vegetative"),
            obs("recent", day(2024, 3, 9), 30, 50.0, "Vegetative"),
        ];
        let feed = vec![point(today, 35.0, 30.0, 40.0), point(day(2024, 3, 11), 36.0, 30.0, 42.0)];
        let series = stitch_forecast(&observations, &feed, &Choice::All, today, Horizon::Week);
        let benchmarks = align_benchmarks(&series, &observations, &Choice::All);

        // Bridge plus two forecast days.
        assert_eq!(benchmarks.len(), 3);
        let bridge = &benchmarks[0];
        assert_eq!(bridge.date, day(2024, 3, 9));
        assert_eq!(bridge.actual, Some(30.0));

        let first = &benchmarks[1];
        assert_eq!(first.day_of_year, 69);
        assert_eq!(first.last_year_benchmark, Some(43.0));
        assert_eq!(first.overall_benchmark, Some(32.0));

        let second = &benchmarks[2];
        assert_eq!(second.last_year_benchmark, None);
        assert_eq!(second.overall_benchmark, None);
    }

    #[test]
    fn test_march_first_shares_bucket_across_leap_years() {
        // 2024-03-01 and 2023-03-01 normalise to the same ordinal.
        let observations = vec![obs("ly", day(2023, 3, 1), 20, 50.0, "Vegetative")];
        let feed = vec![point(day(2024, 3, 1), 10.0, 5.0, 15.0)];
        let series = stitch_forecast(&[], &feed, &Choice::All, day(2024, 3, 1), Horizon::Week);
        let benchmarks = align_benchmarks(&series, &observations, &Choice::All);
        assert_eq!(benchmarks[0].day_of_year, 60);
        assert_eq!(benchmarks[0].last_year_benchmark, Some(20.0));
    }

    #[test]
    fn test_missing_benchmark_serialises_as_null() {
        let feed = vec![point(day(2024, 3, 1), 10.0, 5.0, 15.0)];
        let series = stitch_forecast(&[], &feed, &Choice::All, day(2024, 3, 1), Horizon::Week);
        let benchmarks = align_benchmarks(&series, &[], &Choice::All);
        let json = serde_json::to_value(&benchmarks[0]).unwrap();
        assert!(json["lastYearBenchmark"].is_null());
        assert!(json["overallBenchmark"].is_null());
    }
}
