//! Forecast stitching: recent daily averages followed by the model's
//! horizon, joined by a bridge point so the two lines meet.

use chrono::NaiveDate;
use log::warn;
use pest_core::pest::ECONOMIC_THRESHOLD;
use pest_core::{Choice, ForecastPoint, Horizon, Observation, PestType};
use pest_utils::dates::days_before;
use pest_utils::rounding::{mean, round_whole};
use serde::Serialize;
use std::collections::BTreeMap;

/// Days of history shown before the forecast.
pub const HISTORY_WINDOW_DAYS: i64 = 7;

/// A seam jump larger than this fraction of the ET is logged.
pub const DISCONTINUITY_FRACTION: f64 = 0.5;

/// One chart row. Historical rows carry `actual`; forecast rows carry
/// `predicted` and the band; the bridge carries both.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeriesPoint {
    pub date: NaiveDate,
    pub actual: Option<f64>,
    pub predicted: Option<f64>,
    pub lower_bound: Option<f64>,
    pub upper_bound: Option<f64>,
    pub confidence_band_height: Option<f64>,
    pub confidence: Option<f64>,
    pub exceeds_threshold: bool,
    pub is_historical: bool,
    pub is_forecast: bool,
}

impl ChartSeriesPoint {
    fn historical(date: NaiveDate, actual: f64, threshold: f64) -> ChartSeriesPoint {
        ChartSeriesPoint {
            date,
            actual: Some(actual),
            predicted: None,
            lower_bound: None,
            upper_bound: None,
            confidence_band_height: None,
            confidence: None,
            exceeds_threshold: actual > threshold,
            is_historical: true,
            is_forecast: false,
        }
    }

    /// `point` must already be clamped.
    fn forecast(point: &ForecastPoint, threshold: f64) -> ChartSeriesPoint {
        ChartSeriesPoint {
            date: point.date,
            actual: None,
            predicted: Some(point.predicted),
            lower_bound: Some(point.lower_bound),
            upper_bound: Some(point.upper_bound),
            confidence_band_height: Some(point.band_width()),
            confidence: Some(point.confidence),
            exceeds_threshold: point.predicted > threshold,
            is_historical: false,
            is_forecast: true,
        }
    }

    /// The seam point, dated on the last historical day, valued at the last
    /// historical average and carrying the first forecast's band width.
    fn bridge(last: &ChartSeriesPoint, first: &ForecastPoint, threshold: f64) -> Option<ChartSeriesPoint> {
        let value = last.actual?;
        let half_width = first.band_width() / 2.0;
        let lower_bound = (value - half_width).max(0.0);
        let upper_bound = (value + half_width).max(lower_bound);
        Some(ChartSeriesPoint {
            date: last.date,
            actual: Some(value),
            predicted: Some(value),
            lower_bound: Some(lower_bound),
            upper_bound: Some(upper_bound),
            confidence_band_height: Some(upper_bound - lower_bound),
            confidence: Some(first.confidence),
            exceeds_threshold: value > threshold,
            is_historical: false,
            is_forecast: true,
        })
    }

    pub fn is_bridge(&self) -> bool {
        self.actual.is_some() && self.predicted.is_some()
    }
}

/// Economic threshold used to flag series points for the selected pest.
pub fn threshold_for(pest: &Choice<PestType>) -> f64 {
    match pest {
        Choice::Only(pest) => pest.economic_threshold(),
        Choice::All => ECONOMIC_THRESHOLD,
    }
}

/// Rounded mean count per day over the [`HISTORY_WINDOW_DAYS`] before
/// `today`, for the selected pest only. Ascending by date.
pub fn recent_daily_averages(
    observations: &[Observation],
    pest: &Choice<PestType>,
    today: NaiveDate,
) -> Vec<(NaiveDate, f64)> {
    let window_start = days_before(today, HISTORY_WINDOW_DAYS);
    let mut days: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for obs in observations
        .iter()
        .filter(|o| pest.accepts(&o.pest_type) && o.date >= window_start && o.date < today)
    {
        let entry = days.entry(obs.date).or_insert((0.0, 0));
        entry.0 += obs.count as f64;
        entry.1 += 1;
    }
    days.into_iter()
        .filter_map(|(date, (total, samples))| mean(total, samples).map(|m| (date, round_whole(m))))
        .collect()
}

/// Clamped forecast points for the horizon: the first `horizon` days of
/// the feed dated on or after `today`, for the selected pest only.
pub fn forecast_window(
    forecasts: &[ForecastPoint],
    pest: &Choice<PestType>,
    today: NaiveDate,
    horizon: Horizon,
) -> Vec<ForecastPoint> {
    let mut window: Vec<ForecastPoint> = forecasts
        .iter()
        .filter(|p| pest.accepts(&p.pest_type) && p.date >= today)
        .map(ForecastPoint::clamped)
        .collect();
    window.sort_by_key(|p| p.date);
    window.truncate(horizon.days());
    window
}

/// Build the continuous chart series: recent history, the bridge point when
/// both segments exist, then the forecast horizon, ascending by date.
pub fn stitch_forecast(
    observations: &[Observation],
    forecasts: &[ForecastPoint],
    pest: &Choice<PestType>,
    today: NaiveDate,
    horizon: Horizon,
) -> Vec<ChartSeriesPoint> {
    let threshold = threshold_for(pest);
    let window = forecast_window(forecasts, pest, today, horizon);

    let mut series: Vec<ChartSeriesPoint> = recent_daily_averages(observations, pest, today)
        .into_iter()
        .map(|(date, actual)| ChartSeriesPoint::historical(date, actual, threshold))
        .collect();

    let bridge = match (series.last(), window.first()) {
        (Some(last), Some(first)) => ChartSeriesPoint::bridge(last, first, threshold),
        _ => None,
    };
    if let (Some(bridge), Some(first)) = (bridge, window.first()) {
        let seam = bridge.actual.unwrap_or_default();
        let jump = (first.predicted - seam).abs();
        if jump > DISCONTINUITY_FRACTION * threshold {
            warn!(
                "Forecast on {} starts at {} against an observed average of {} on {}",
                first.date, first.predicted, seam, bridge.date
            );
        }
        series.push(bridge);
    }

    series.extend(window.iter().map(|p| ChartSeriesPoint::forecast(p, threshold)));
    // Stable sort keeps each historical point ahead of the bridge on its date.
    series.sort_by_key(|p| p.date);
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{day, obs, point};

    fn history() -> Vec<Observation> {
        vec![
            obs("a", day(2024, 3, 7), 30, 50.0, "Vegetative"),
            obs("b", day(2024, 3, 7), 41, 50.0, "Vegetative"),
            obs("c", day(2024, 3, 9), 55, 50.0, "Vegetative"),
            obs("too-old", day(2024, 3, 2), 90, 50.0, "Vegetative"),
            obs("today", day(2024, 3, 10), 90, 50.0, "Vegetative"),
        ]
    }

    fn forecasts() -> Vec<ForecastPoint> {
        (0..20)
            .map(|i| point(day(2024, 3, 10) + chrono::Days::new(i), 50.0 + i as f64, 44.0 + i as f64, 60.0 + i as f64))
            .collect()
    }

    #[test]
    fn test_history_window_is_strictly_before_today() {
        let averages = recent_daily_averages(&history(), &Choice::All, day(2024, 3, 10));
        assert_eq!(averages, vec![(day(2024, 3, 7), 36.0), (day(2024, 3, 9), 55.0)]);
    }

    #[test]
    fn test_stitched_series_shape() {
        let today = day(2024, 3, 10);
        let series = stitch_forecast(&history(), &forecasts(), &Choice::All, today, Horizon::Week);

        assert_eq!(series.len(), 2 + 1 + 7);
        assert!(series.windows(2).all(|w| w[0].date <= w[1].date));

        let bridges: Vec<&ChartSeriesPoint> = series.iter().filter(|p| p.is_bridge()).collect();
        assert_eq!(bridges.len(), 1);
        let bridge = bridges[0];
        assert_eq!(bridge.date, day(2024, 3, 9));
        assert_eq!(bridge.actual, bridge.predicted);
        assert_eq!(bridge.actual, Some(55.0));
        assert!(bridge.is_forecast && !bridge.is_historical);
        assert_eq!(bridge.lower_bound, Some(47.0));
        assert_eq!(bridge.upper_bound, Some(63.0));
        assert_eq!(bridge.confidence_band_height, Some(16.0));

        // The historical line ends on its own point, ahead of the bridge.
        assert!(series[1].is_historical);
        assert_eq!(series[1].predicted, None);
        assert!(series[1].exceeds_threshold);
        assert!(!series[0].exceeds_threshold);

        let last = series.last().unwrap();
        assert_eq!(last.date, day(2024, 3, 16));
        assert_eq!(last.confidence_band_height, Some(16.0));
        assert!(last.exceeds_threshold);
    }

    #[test]
    fn test_fortnight_horizon() {
        let today = day(2024, 3, 10);
        let series = stitch_forecast(&[], &forecasts(), &Choice::All, today, Horizon::Fortnight);
        assert_eq!(series.len(), 14);
        assert!(series.iter().all(|p| p.is_forecast && !p.is_bridge()));
    }

    #[test]
    fn test_no_forecast_is_history_only() {
        let series = stitch_forecast(&history(), &[], &Choice::All, day(2024, 3, 10), Horizon::Week);
        assert_eq!(series.len(), 2);
        assert!(series.iter().all(|p| p.is_historical));
    }

    #[test]
    fn test_negative_forecast_is_clamped_and_bridge_band_stays_non_negative() {
        let today = day(2024, 3, 10);
        let observations = vec![obs("a", day(2024, 3, 9), 2, 50.0, "Vegetative")];
        let feed = vec![point(today, -3.0, -10.0, 5.0)];
        let series = stitch_forecast(&observations, &feed, &Choice::All, today, Horizon::Week);
        assert_eq!(series.len(), 3);

        let bridge = &series[1];
        assert_eq!(bridge.lower_bound, Some(0.0));
        assert_eq!(bridge.upper_bound, Some(4.5));
        assert_eq!(bridge.confidence_band_height, Some(4.5));

        let forecast = &series[2];
        assert_eq!(forecast.predicted, Some(0.0));
        assert_eq!(forecast.lower_bound, Some(0.0));
        assert_eq!(forecast.upper_bound, Some(5.0));
        assert_eq!(forecast.confidence_band_height, Some(5.0));
    }

    #[test]
    fn test_empty_inputs() {
        assert!(stitch_forecast(&[], &[], &Choice::All, day(2024, 3, 10), Horizon::Week).is_empty());
    }

    #[test]
    fn test_json_shape_keeps_nulls() {
        let series = stitch_forecast(&history(), &[], &Choice::All, day(2024, 3, 10), Horizon::Week);
        let json = serde_json::to_value(&series[0]).unwrap();
        assert_eq!(json["date"], "2024-03-07");
        assert!(json["predicted"].is_null());
        assert_eq!(json["isHistorical"], true);
        assert_eq!(json["confidenceBandHeight"], serde_json::Value::Null);
    }
}
