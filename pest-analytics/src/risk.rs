//! Forecast risk summaries and the seasonal outlook.

use chrono::NaiveDate;
use pest_core::pest::INJURY_LEVEL_FACTOR;
use pest_core::{Choice, ForecastPoint, Observation, PestType, Season};
use pest_utils::rounding::{mean, round_whole};
use serde::Serialize;
use std::fmt;

/// Band width above this fraction of the ET means low confidence.
pub const LOW_CONFIDENCE_BAND: f64 = 0.3;

/// Band width above this fraction of the ET means medium confidence.
pub const MEDIUM_CONFIDENCE_BAND: f64 = 0.15;

/// Average prediction above this fraction of the ET warrants closer monitoring.
pub const APPROACHING_THRESHOLD: f64 = 0.8;

pub const PEAK_CRITICAL_LEVEL: f64 = 70.0;
pub const PEAK_ELEVATED_LEVEL: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
}

impl RiskLevel {
    pub fn suggested_action(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Continue routine monitoring",
            RiskLevel::Moderate => "Increase scouting frequency",
            RiskLevel::High => "Prepare or apply control measures",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub priority: Priority,
    pub action: String,
    pub reason: String,
}

impl Recommendation {
    fn new(priority: Priority, action: impl Into<String>, reason: impl Into<String>) -> Self {
        Recommendation {
            priority,
            action: action.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PeakDay {
    pub date: NaiveDate,
    pub predicted: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub threshold: f64,
    pub injury_level: f64,
    pub days_above_threshold: usize,
    pub high_risk_days: usize,
    pub average_predicted: f64,
    pub peak_day: PeakDay,
    pub max_upper_bound: f64,
    pub risk_level: RiskLevel,
    pub confidence_level: ConfidenceLevel,
    pub suggested_action: &'static str,
    pub recommendations: Vec<Recommendation>,
}

/// Assess the horizon's clamped forecast points against `threshold`.
/// Returns `None` when there is nothing to assess.
pub fn assess_risk(window: &[ForecastPoint], threshold: f64) -> Option<RiskAssessment> {
    let first = window.first()?;
    let injury_level = threshold * INJURY_LEVEL_FACTOR;

    let days_above_threshold = window.iter().filter(|p| p.predicted > threshold).count();
    let high_risk_days = window.iter().filter(|p| p.predicted > injury_level).count();
    let mean_predicted = mean(window.iter().map(|p| p.predicted).sum(), window.len())?;
    let mean_band = mean(window.iter().map(ForecastPoint::band_width).sum(), window.len())?;
    let max_upper_bound = window
        .iter()
        .map(|p| p.upper_bound)
        .fold(f64::NEG_INFINITY, f64::max);

    let mut peak = first;
    for point in window {
        if point.predicted > peak.predicted {
            peak = point;
        }
    }

    let risk_level = if max_upper_bound > threshold {
        RiskLevel::High
    } else if mean_predicted > threshold {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    };

    let confidence_level = if mean_band > threshold * LOW_CONFIDENCE_BAND {
        ConfidenceLevel::Low
    } else if mean_band > threshold * MEDIUM_CONFIDENCE_BAND {
        ConfidenceLevel::Medium
    } else {
        ConfidenceLevel::High
    };

    let mut assessment = RiskAssessment {
        threshold,
        injury_level,
        days_above_threshold,
        high_risk_days,
        average_predicted: round_whole(mean_predicted),
        peak_day: PeakDay {
            date: peak.date,
            predicted: peak.predicted,
        },
        max_upper_bound,
        risk_level,
        confidence_level,
        suggested_action: risk_level.suggested_action(),
        recommendations: Vec::new(),
    };
    assessment.recommendations = recommendations(&assessment);
    Some(assessment)
}

fn recommendations(risk: &RiskAssessment) -> Vec<Recommendation> {
    let mut actions = Vec::new();
    if risk.days_above_threshold > 0 {
        actions.push(Recommendation::new(
            Priority::High,
            "Prepare intervention resources",
            format!("{} day(s) forecasted above threshold", risk.days_above_threshold),
        ));
    }
    if risk.high_risk_days > 0 {
        actions.push(Recommendation::new(
            Priority::High,
            "Schedule immediate field inspection",
            format!(
                "{} day(s) with critically high pest count predicted",
                risk.high_risk_days
            ),
        ));
    }
    if risk.risk_level == RiskLevel::High {
        actions.push(Recommendation::new(
            Priority::High,
            "Activate emergency response protocol",
            "Overall risk level is HIGH based on forecast",
        ));
    }
    if risk.peak_day.predicted > risk.threshold {
        actions.push(Recommendation::new(
            Priority::Medium,
            format!("Target intervention on {}", risk.peak_day.date.format("%b %-d")),
            format!("Peak pest activity predicted ({} count)", risk.peak_day.predicted),
        ));
    }
    if risk.average_predicted > risk.threshold * APPROACHING_THRESHOLD {
        actions.push(Recommendation::new(
            Priority::Medium,
            "Increase monitoring frequency",
            "Average predicted count approaching threshold",
        ));
    }
    if actions.is_empty() {
        actions.push(Recommendation::new(
            Priority::Low,
            "Maintain regular monitoring",
            "Forecast indicates normal pest levels",
        ));
    }
    actions
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PeakStatus {
    Normal,
    Elevated,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakOutlook {
    pub peak: f64,
    pub status: PeakStatus,
    pub action: &'static str,
}

/// Highest prediction in `window` with its alert level.
pub fn peak_outlook(window: &[ForecastPoint]) -> Option<PeakOutlook> {
    let peak = window
        .iter()
        .map(|p| p.predicted)
        .reduce(f64::max)?;
    let (status, action) = if peak >= PEAK_CRITICAL_LEVEL {
        (PeakStatus::Critical, "Deploy chemical control within 48 hours")
    } else if peak >= PEAK_ELEVATED_LEVEL {
        (PeakStatus::Elevated, "Increase scouting and prep interventions")
    } else {
        (PeakStatus::Normal, "Maintain routine monitoring")
    };
    Some(PeakOutlook { peak, status, action })
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonalOutlook {
    pub dry_average: f64,
    pub wet_average: f64,
    pub peak_season: Season,
}

/// Mean count per season over all history for the selected pest.
pub fn seasonal_outlook(observations: &[Observation], pest: &Choice<PestType>) -> SeasonalOutlook {
    let season_average = |season: Season| {
        let (total, samples) = observations
            .iter()
            .filter(|o| o.season == season && pest.accepts(&o.pest_type))
            .fold((0.0, 0usize), |(t, n), o| (t + o.count as f64, n + 1));
        mean(total, samples).map(round_whole).unwrap_or_default()
    };
    let dry_average = season_average(Season::Dry);
    let wet_average = season_average(Season::Wet);
    SeasonalOutlook {
        dry_average,
        wet_average,
        peak_season: if wet_average > dry_average {
            Season::Wet
        } else {
            Season::Dry
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{day, obs, point};

    #[test]
    fn test_no_forecast_no_assessment() {
        assert_eq!(assess_risk(&[], 50.0), None);
        assert_eq!(peak_outlook(&[]), None);
    }

    #[test]
    fn test_high_risk_from_upper_bound() {
        let window = vec![
            point(day(2024, 3, 10), 40.0, 35.0, 45.0),
            point(day(2024, 3, 11), 80.0, 70.0, 90.0),
            point(day(2024, 3, 12), 55.0, 50.0, 60.0),
        ];
        let risk = assess_risk(&window, 50.0).unwrap();
        assert_eq!(risk.days_above_threshold, 2);
        assert_eq!(risk.high_risk_days, 1);
        assert_eq!(risk.average_predicted, 58.0);
        assert_eq!(risk.peak_day.date, day(2024, 3, 11));
        assert_eq!(risk.max_upper_bound, 90.0);
        assert_eq!(risk.risk_level, RiskLevel::High);
        assert_eq!(risk.confidence_level, ConfidenceLevel::Medium);
        assert_eq!(risk.suggested_action, "Prepare or apply control measures");

        let actions: Vec<&str> = risk.recommendations.iter().map(|r| r.action.as_str()).collect();
        assert_eq!(
            actions,
            vec![
                "Prepare intervention resources",
                "Schedule immediate field inspection",
                "Activate emergency response protocol",
                "Target intervention on Mar 11",
                "Increase monitoring frequency",
            ]
        );
    }

    #[test]
    fn test_quiet_forecast() {
        let window = vec![
            point(day(2024, 3, 10), 10.0, 9.0, 12.0),
            point(day(2024, 3, 11), 12.0, 11.0, 14.0),
        ];
        let risk = assess_risk(&window, 50.0).unwrap();
        assert_eq!(risk.risk_level, RiskLevel::Low);
        assert_eq!(risk.confidence_level, ConfidenceLevel::High);
        assert_eq!(risk.recommendations.len(), 1);
        assert_eq!(risk.recommendations[0].priority, Priority::Low);
    }

    #[test]
    fn test_peak_outlook_levels() {
        let at = |v: f64| vec![point(day(2024, 3, 10), v, v, v)];
        assert_eq!(peak_outlook(&at(70.0)).unwrap().status, PeakStatus::Critical);
        assert_eq!(peak_outlook(&at(50.0)).unwrap().status, PeakStatus::Elevated);
        assert_eq!(peak_outlook(&at(49.9)).unwrap().status, PeakStatus::Normal);
    }

    #[test]
    fn test_seasonal_outlook() {
        let observations = vec![
            obs("d1", day(2024, 1, 10), 10, 50.0, "Vegetative"),
            obs("d2", day(2024, 2, 10), 21, 50.0, "Vegetative"),
            obs("w1", day(2024, 7, 10), 30, 50.0, "Vegetative"),
        ];
        let outlook = seasonal_outlook(&observations, &Choice::All);
        assert_eq!(outlook.dry_average, 16.0);
        assert_eq!(outlook.wet_average, 30.0);
        assert_eq!(outlook.peak_season, Season::Wet);

        let empty = seasonal_outlook(&[], &Choice::All);
        assert_eq!(empty.peak_season, Season::Dry);
        assert_eq!(empty.wet_average, 0.0);
    }
}
