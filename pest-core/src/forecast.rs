use crate::error::{FeedError, Result};
use crate::pest::PestType;
use chrono::NaiveDate;
use log::{info, warn};
use pest_utils::dates::{days_after, parse_date};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Confidence reported for model-service points, which carry no per-point value.
pub const MODEL_CONFIDENCE: f64 = 92.0;

/// Half-width of the band assumed when the model omits its interval.
pub const DEFAULT_BAND_HALF_WIDTH: f64 = 5.0;

/// Length of the generated mock forecast, in days.
pub const MOCK_FORECAST_DAYS: usize = 30;

/// One model prediction for a single day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPoint {
    #[serde(deserialize_with = "crate::serde_date::deserialize")]
    pub date: NaiveDate,
    #[serde(default = "default_pest_type")]
    pub pest_type: PestType,
    pub predicted: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_pest_type() -> PestType {
    PestType::BlackRiceBug
}

fn default_confidence() -> f64 {
    MODEL_CONFIDENCE
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

impl ForecastPoint {
    /// Clamp the point into displayable range. The model may emit negative
    /// counts; lower bound is clamped first, then the upper bound is raised
    /// to at least the lower bound.
    pub fn clamped(&self) -> ForecastPoint {
        let lower_bound = non_negative(self.lower_bound);
        let upper_bound = if self.upper_bound.is_finite() {
            self.upper_bound.max(lower_bound)
        } else {
            lower_bound
        };
        let confidence = if self.confidence.is_finite() {
            self.confidence.clamp(0.0, 100.0)
        } else {
            0.0
        };
        ForecastPoint {
            date: self.date,
            pest_type: self.pest_type,
            predicted: non_negative(self.predicted),
            lower_bound,
            upper_bound,
            confidence,
        }
    }

    pub fn band_width(&self) -> f64 {
        self.upper_bound - self.lower_bound
    }

    /// Parse a forecast feed body: a bare array of points or the model
    /// service envelope with index-keyed columns.
    pub fn from_json(body: &str) -> Result<Vec<ForecastPoint>> {
        let payload: serde_json::Value = serde_json::from_str(body)?;
        let mut points = if let serde_json::Value::Array(rows) = payload {
            rows.into_iter()
                .enumerate()
                .filter_map(|(row, value)| accept_point(row, serde_json::from_value(value)))
                .collect()
        } else {
            let envelope: ForecastEnvelope = serde_json::from_value(payload)?;
            envelope.into_points()?
        };
        points.sort_by_key(|p| p.date);
        info!("Parsed {} forecast points", points.len());
        Ok(points)
    }
}

fn accept_point(row: usize, parsed: serde_json::Result<ForecastPoint>) -> Option<ForecastPoint> {
    match parsed {
        Ok(point) => Some(point),
        Err(e) => {
            warn!("Skipping forecast row {}: {}", row, e);
            None
        }
    }
}

/// Forecast length offered on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum Horizon {
    #[default]
    Week,
    Fortnight,
}

impl Horizon {
    pub fn days(&self) -> usize {
        match self {
            Horizon::Week => 7,
            Horizon::Fortnight => 14,
        }
    }
}

impl From<Horizon> for u32 {
    fn from(horizon: Horizon) -> u32 {
        horizon.days() as u32
    }
}

impl TryFrom<u32> for Horizon {
    type Error = String;

    fn try_from(days: u32) -> std::result::Result<Self, Self::Error> {
        match days {
            7 => Ok(Horizon::Week),
            14 => Ok(Horizon::Fortnight),
            other => Err(format!("unsupported forecast horizon {} (expected 7 or 14)", other)),
        }
    }
}

impl std::str::FromStr for Horizon {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let days: u32 = s
            .trim()
            .parse()
            .map_err(|_| format!("invalid horizon '{}'", s.trim()))?;
        Horizon::try_from(days)
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} days", self.days())
    }
}

/// Model service response: `{ success, data: { forecasted: {...} } }`.
#[derive(Debug, Deserialize)]
struct ForecastEnvelope {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<EnvelopeData>,
}

fn default_success() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    forecasted: IndexedForecast,
}

/// Parallel columns keyed by position ("0", "1", ...).
#[derive(Debug, Deserialize)]
struct IndexedForecast {
    future_dates: BTreeMap<String, String>,
    forecast: BTreeMap<String, f64>,
    #[serde(default)]
    ci_lower: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    ci_upper: Option<BTreeMap<String, f64>>,
}

impl ForecastEnvelope {
    fn into_points(self) -> Result<Vec<ForecastPoint>> {
        if !self.success {
            return Err(FeedError::Rejected(
                self.message
                    .unwrap_or_else(|| "forecast service reported failure".to_string()),
            ));
        }
        let indexed = match self.data {
            Some(data) => data.forecasted,
            None => return Err(FeedError::EmptyResponse("forecast envelope".to_string())),
        };

        let mut points = Vec::with_capacity(indexed.future_dates.len());
        for (key, raw_date) in &indexed.future_dates {
            let Some(&predicted) = indexed.forecast.get(key) else {
                warn!("Forecast index {} has a date but no prediction; skipping", key);
                continue;
            };
            let date = match parse_date(raw_date) {
                Ok(date) => date,
                Err(e) => {
                    warn!("Skipping forecast index {}: {}", key, e);
                    continue;
                }
            };
            let lower_bound = indexed
                .ci_lower
                .as_ref()
                .and_then(|m| m.get(key).copied())
                .unwrap_or_else(|| (predicted - DEFAULT_BAND_HALF_WIDTH).max(0.0));
            let upper_bound = indexed
                .ci_upper
                .as_ref()
                .and_then(|m| m.get(key).copied())
                .unwrap_or(predicted + DEFAULT_BAND_HALF_WIDTH);
            points.push(ForecastPoint {
                date,
                pest_type: PestType::BlackRiceBug,
                predicted,
                lower_bound,
                upper_bound,
                confidence: MODEL_CONFIDENCE,
            });
        }
        Ok(points)
    }
}

/// Deterministic stand-in forecast used when the model service is
/// unreachable and a mock fallback is configured.
///
/// Starts on `today`, oscillates around 45 and loses half a point of
/// confidence per day, widening the band as it goes.
pub fn mock_forecast(today: NaiveDate, pest_type: PestType, days: usize) -> Vec<ForecastPoint> {
    (0..days)
        .map(|i| {
            let step = (i + 1) as f64;
            let predicted = 45.0 + (step / 2.0).sin() * 10.0;
            let confidence = 95.0 - step * 0.5;
            let margin = predicted * (1.0 - confidence / 100.0) * 2.0;
            ForecastPoint {
                date: days_after(today, i as i64),
                pest_type,
                predicted: predicted.floor(),
                lower_bound: (predicted - margin).floor(),
                upper_bound: (predicted + margin).floor(),
                confidence: confidence.floor(),
            }
        })
        .collect()
}
