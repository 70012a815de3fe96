//! Dashboard state as a value: inputs plus the snapshot derived from them.
//!
//! [`reduce`] takes the current state and one [`Action`] and returns the
//! next state. Every action rebuilds the whole snapshot from the inputs, so
//! no derived value can lag behind the filters or data it came from.
//! Readers hold an `Arc<DashboardSnapshot>` that never changes under them.

use crate::benchmark::{align_benchmarks, BenchmarkPoint};
use crate::breakdown::{action_tally, threshold_breakdown, ActionTally, ThresholdBreakdown};
use crate::filter::{filter_observations, FilterOptions};
use crate::kpi::{calculate_kpis, KpiMetrics};
use crate::risk::{assess_risk, peak_outlook, seasonal_outlook, PeakOutlook, RiskAssessment, SeasonalOutlook};
use crate::stitch::{forecast_window, stitch_forecast, threshold_for, ChartSeriesPoint};
use crate::trend::{compute_trends, KpiTrends};
use chrono::NaiveDate;
use log::debug;
use pest_core::{FeedOrigin, FilterCriteria, ForecastFeed, Horizon, Observation};
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message")]
pub enum DataStatus {
    Ready,
    /// The observation feed loaded but holds no records.
    NoData,
    /// Records exist but none pass the current filters.
    NoMatches,
    FetchFailed(String),
}

/// Everything the dashboard is computed from.
#[derive(Debug, Clone)]
pub struct DashboardInputs {
    pub observations: Arc<Vec<Observation>>,
    pub forecast: Arc<ForecastFeed>,
    pub filters: FilterCriteria,
    pub horizon: Horizon,
    pub today: NaiveDate,
    pub fetch_error: Option<String>,
}

/// Read-only view handed to renderers after each state change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub status: DataStatus,
    pub today: NaiveDate,
    pub horizon: Horizon,
    pub filters: FilterCriteria,
    pub filter_options: FilterOptions,
    pub filtered_observations: Vec<Observation>,
    pub kpis: KpiMetrics,
    pub trends: KpiTrends,
    pub threshold_breakdown: ThresholdBreakdown,
    pub actions: Vec<ActionTally>,
    pub forecast_origin: FeedOrigin,
    pub forecast_series: Vec<ChartSeriesPoint>,
    pub benchmark_series: Vec<BenchmarkPoint>,
    pub risk: Option<RiskAssessment>,
    pub peak: Option<PeakOutlook>,
    pub seasonal: SeasonalOutlook,
}

impl DashboardSnapshot {
    /// Derive every output from `inputs`.
    pub fn compute(inputs: &DashboardInputs) -> DashboardSnapshot {
        let observations = inputs.observations.as_slice();
        let filters = &inputs.filters;
        let filtered = filter_observations(observations, filters);

        let status = match &inputs.fetch_error {
            Some(message) => DataStatus::FetchFailed(message.clone()),
            None if observations.is_empty() => DataStatus::NoData,
            None if filtered.is_empty() => DataStatus::NoMatches,
            None => DataStatus::Ready,
        };

        // The chart follows the pest selection only, never the other filters.
        let pest = &filters.pest_type;
        let forecasts = inputs.forecast.points.as_slice();
        let window = forecast_window(forecasts, pest, inputs.today, inputs.horizon);
        let forecast_series = stitch_forecast(observations, forecasts, pest, inputs.today, inputs.horizon);
        let benchmark_series = align_benchmarks(&forecast_series, observations, pest);

        DashboardSnapshot {
            status,
            today: inputs.today,
            horizon: inputs.horizon,
            filters: filters.clone(),
            filter_options: FilterOptions::from_observations(observations),
            kpis: calculate_kpis(&filtered),
            trends: compute_trends(&filtered, inputs.today),
            threshold_breakdown: threshold_breakdown(&filtered),
            actions: action_tally(&filtered),
            forecast_origin: inputs.forecast.origin,
            risk: assess_risk(&window, threshold_for(pest)),
            peak: peak_outlook(&window),
            seasonal: seasonal_outlook(observations, pest),
            forecast_series,
            benchmark_series,
            filtered_observations: filtered,
        }
    }
}

/// A change to the dashboard inputs.
#[derive(Debug, Clone)]
pub enum Action {
    /// A fresh observation set replaces the old one wholesale.
    ObservationsLoaded(Vec<Observation>),
    ObservationsFailed(String),
    ForecastsLoaded(ForecastFeed),
    SetFilters(FilterCriteria),
    SetHorizon(Horizon),
    SetToday(NaiveDate),
}

#[derive(Debug, Clone)]
pub struct DashboardState {
    inputs: DashboardInputs,
    snapshot: Arc<DashboardSnapshot>,
}

impl DashboardState {
    /// Empty dashboard on `today`: no observations, no forecast, no filters.
    pub fn new(today: NaiveDate) -> DashboardState {
        DashboardState::from_inputs(DashboardInputs {
            observations: Arc::new(Vec::new()),
            forecast: Arc::new(ForecastFeed::unavailable()),
            filters: FilterCriteria::default(),
            horizon: Horizon::default(),
            today,
            fetch_error: None,
        })
    }

    pub fn from_inputs(inputs: DashboardInputs) -> DashboardState {
        let snapshot = Arc::new(DashboardSnapshot::compute(&inputs));
        DashboardState { inputs, snapshot }
    }

    pub fn inputs(&self) -> &DashboardInputs {
        &self.inputs
    }

    pub fn snapshot(&self) -> Arc<DashboardSnapshot> {
        Arc::clone(&self.snapshot)
    }
}

/// Apply `action` to `state`, returning the next state with a freshly
/// computed snapshot. `state` itself is left untouched.
pub fn reduce(state: &DashboardState, action: Action) -> DashboardState {
    let mut inputs = state.inputs.clone();
    match action {
        Action::ObservationsLoaded(observations) => {
            inputs.observations = Arc::new(observations);
            inputs.fetch_error = None;
        }
        Action::ObservationsFailed(message) => {
            inputs.observations = Arc::new(Vec::new());
            inputs.fetch_error = Some(message);
        }
        Action::ForecastsLoaded(feed) => inputs.forecast = Arc::new(feed),
        Action::SetFilters(filters) => inputs.filters = filters,
        Action::SetHorizon(horizon) => inputs.horizon = horizon,
        Action::SetToday(today) => inputs.today = today,
    }
    let next = DashboardState::from_inputs(inputs);
    debug!(
        "Dashboard recomputed: {:?}, {} of {} observations, {} series points",
        next.snapshot.status,
        next.snapshot.filtered_observations.len(),
        next.inputs.observations.len(),
        next.snapshot.forecast_series.len()
    );
    next
}
