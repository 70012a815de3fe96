//! Week-over-week trends and 14-day sparkline histories.
//!
//! `today` is always passed in; nothing here reads the clock. Windows are
//! whole calendar days: this week is `today-6 ..= today`, last week is
//! `today-13 ..= today-7`, and the sparkline covers both weeks in order.

use crate::insight::{classify, MetricContext, Sentiment};
use chrono::NaiveDate;
use pest_core::{DateRange, Observation};
use pest_utils::dates::days_before;
use pest_utils::rounding::{mean, percent_of, round_whole};
use serde::Serialize;

pub const WEEK_DAYS: i64 = 7;
pub const SPARKLINE_DAYS: usize = 14;

/// Percentage change from `previous` to `current`, rounded to a whole
/// number. A zero `previous` yields 0 when `current` is also 0 and 100
/// when it is positive, so the result is always finite.
pub fn relative_change(current: f64, previous: f64) -> f64 {
    if !current.is_finite() || !previous.is_finite() {
        return 0.0;
    }
    if previous == 0.0 {
        return if current > 0.0 { 100.0 } else { 0.0 };
    }
    round_whole(100.0 * (current - previous) / previous)
}

/// Whole-number aggregates over one window of observations.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct WindowStats {
    observations: usize,
    average_count: f64,
    percent_above: f64,
    action_rate: f64,
}

impl WindowStats {
    fn of<'a>(observations: impl Iterator<Item = &'a Observation>) -> WindowStats {
        let mut total = 0usize;
        let mut count_sum = 0.0;
        let mut above = 0usize;
        let mut actions = 0usize;
        for obs in observations {
            total += 1;
            count_sum += obs.count as f64;
            above += usize::from(obs.above_threshold());
            actions += usize::from(obs.action_taken);
        }
        WindowStats {
            observations: total,
            average_count: round_whole(mean(count_sum, total).unwrap_or_default()),
            percent_above: round_whole(percent_of(above, total)),
            action_rate: round_whole(percent_of(actions, total)),
        }
    }

    fn over(observations: &[Observation], window: DateRange) -> WindowStats {
        WindowStats::of(observations.iter().filter(|o| window.contains(&o.date)))
    }
}

/// A metric's week-over-week value and its daily history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendData {
    /// Percent change for counts, percentage-point change for rates.
    pub value: f64,
    /// Exactly [`SPARKLINE_DAYS`] entries, oldest first; empty days are 0.
    pub history: Vec<f64>,
    pub label: &'static str,
    pub sentiment: Sentiment,
}

impl TrendData {
    fn new(value: f64, history: Vec<f64>, context: MetricContext) -> TrendData {
        let insight = classify(value, context);
        TrendData {
            value,
            history,
            label: insight.label,
            sentiment: insight.sentiment,
        }
    }
}

/// Trend bundle for the four dashboard KPIs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiTrends {
    pub observations: TrendData,
    pub average_count: TrendData,
    pub above_threshold: TrendData,
    pub action_rate: TrendData,
}

impl KpiTrends {
    /// Trends for an empty data set: flat zero histories, no change.
    pub fn flat() -> KpiTrends {
        let zeros = || vec![0.0; SPARKLINE_DAYS];
        KpiTrends {
            observations: TrendData::new(0.0, zeros(), MetricContext::Neutral),
            average_count: TrendData::new(0.0, zeros(), MetricContext::MoreIsBad),
            above_threshold: TrendData::new(0.0, zeros(), MetricContext::MoreIsBad),
            action_rate: TrendData::new(0.0, zeros(), MetricContext::MoreIsGood),
        }
    }
}

/// The current and previous week windows ending on `today`.
pub fn week_windows(today: NaiveDate) -> (DateRange, DateRange) {
    let this_week = DateRange::new(days_before(today, WEEK_DAYS - 1), today);
    let last_week = DateRange::new(
        days_before(today, 2 * WEEK_DAYS - 1),
        days_before(today, WEEK_DAYS),
    );
    (this_week, last_week)
}

/// The sparkline window ending on `today`.
pub fn sparkline_window(today: NaiveDate) -> DateRange {
    DateRange::new(days_before(today, SPARKLINE_DAYS as i64 - 1), today)
}

/// Daily stats for each of the sparkline days, oldest first.
fn daily_stats(filtered: &[Observation], today: NaiveDate) -> Vec<WindowStats> {
    let window = sparkline_window(today);
    let mut buckets: Vec<Vec<&Observation>> = vec![Vec::new(); SPARKLINE_DAYS];
    for obs in filtered.iter().filter(|o| window.contains(&o.date)) {
        let offset = (obs.date - window.start).num_days();
        if let Some(bucket) = usize::try_from(offset).ok().and_then(|i| buckets.get_mut(i)) {
            bucket.push(obs);
        }
    }
    buckets
        .into_iter()
        .map(|bucket| WindowStats::of(bucket.into_iter()))
        .collect()
}

/// Compute week-over-week trends and sparklines over `filtered`.
pub fn compute_trends(filtered: &[Observation], today: NaiveDate) -> KpiTrends {
    let (this_week, last_week) = week_windows(today);
    let current = WindowStats::over(filtered, this_week);
    let previous = WindowStats::over(filtered, last_week);
    let daily = daily_stats(filtered, today);
    let history = |f: fn(&WindowStats) -> f64| daily.iter().map(f).collect::<Vec<f64>>();

    KpiTrends {
        observations: TrendData::new(
            relative_change(current.observations as f64, previous.observations as f64),
            history(|d| d.observations as f64),
            MetricContext::Neutral,
        ),
        average_count: TrendData::new(
            relative_change(current.average_count, previous.average_count),
            history(|d| d.average_count),
            MetricContext::MoreIsBad,
        ),
        above_threshold: TrendData::new(
            current.percent_above - previous.percent_above,
            history(|d| d.percent_above),
            MetricContext::MoreIsBad,
        ),
        action_rate: TrendData::new(
            current.action_rate - previous.action_rate,
            history(|d| d.action_rate),
            MetricContext::MoreIsGood,
        ),
    }
}
