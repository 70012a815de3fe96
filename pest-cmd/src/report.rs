//! Report assembly: load feeds, drive the dashboard state, write JSON.

use crate::args::{FilterArgs, ReportArgs, SourceArgs};
use crate::sources::{http_client, load_observations, resolve_forecast};
use anyhow::Context;
use log::{info, warn};
use pest_analytics::benchmark::BenchmarkPoint;
use pest_analytics::breakdown::{ActionTally, ThresholdBreakdown};
use pest_analytics::dashboard::{reduce, Action, DashboardSnapshot, DashboardState, DataStatus};
use pest_analytics::risk::{PeakOutlook, RiskAssessment, SeasonalOutlook};
use pest_analytics::stitch::ChartSeriesPoint;
use pest_analytics::trend::KpiTrends;
use pest_analytics::{FilterOptions, KpiMetrics};
use pest_core::{Choice, FeedOrigin, PestType};
use serde::Serialize;
use std::sync::Arc;

/// Whether to resolve the forecast feed for a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Forecasts {
    Load,
    Skip,
}

/// Load the configured feeds and fold them into a dashboard state.
pub async fn build_state(
    sources: &SourceArgs,
    filters: &FilterArgs,
    report: &ReportArgs,
    forecasts: Forecasts,
) -> anyhow::Result<DashboardState> {
    let today = report.today();
    let criteria = filters.criteria();
    let client = http_client()?;

    let mut state = DashboardState::new(today);
    state = reduce(&state, Action::SetHorizon(report.horizon));
    state = reduce(&state, Action::SetFilters(criteria.clone()));

    let observations = match sources.observation_source() {
        Some(source) => match load_observations(&client, &source).await {
            Ok(observations) => {
                info!("Loaded {} observations from {}", observations.len(), source);
                Action::ObservationsLoaded(observations)
            }
            Err(e) => {
                warn!("Observation feed {} failed: {}", source, e);
                Action::ObservationsFailed(format!("{}: {}", source, e))
            }
        },
        None => Action::ObservationsFailed("no observation source configured".to_string()),
    };
    state = reduce(&state, observations);

    if forecasts == Forecasts::Load {
        let pest_type = match criteria.pest_type {
            Choice::Only(pest) => pest,
            Choice::All => PestType::BlackRiceBug,
        };
        let feed = resolve_forecast(&client, &sources.forecast_sources(), today, pest_type).await;
        state = reduce(&state, Action::ForecastsLoaded(feed));
    }

    Ok(state)
}

/// KPI, trend and breakdown view of a snapshot.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport<'a> {
    pub status: &'a DataStatus,
    pub kpis: &'a KpiMetrics,
    pub trends: &'a KpiTrends,
    pub threshold_breakdown: &'a ThresholdBreakdown,
    pub actions: &'a [ActionTally],
}

impl<'a> From<&'a DashboardSnapshot> for SummaryReport<'a> {
    fn from(snapshot: &'a DashboardSnapshot) -> Self {
        SummaryReport {
            status: &snapshot.status,
            kpis: &snapshot.kpis,
            trends: &snapshot.trends,
            threshold_breakdown: &snapshot.threshold_breakdown,
            actions: &snapshot.actions,
        }
    }
}

/// Chart series and outlook view of a snapshot.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastReport<'a> {
    pub status: &'a DataStatus,
    pub forecast_origin: FeedOrigin,
    pub forecast_series: &'a [ChartSeriesPoint],
    pub benchmark_series: &'a [BenchmarkPoint],
    pub risk: Option<&'a RiskAssessment>,
    pub peak: Option<&'a PeakOutlook>,
    pub seasonal: &'a SeasonalOutlook,
}

impl<'a> From<&'a DashboardSnapshot> for ForecastReport<'a> {
    fn from(snapshot: &'a DashboardSnapshot) -> Self {
        ForecastReport {
            status: &snapshot.status,
            forecast_origin: snapshot.forecast_origin,
            forecast_series: &snapshot.forecast_series,
            benchmark_series: &snapshot.benchmark_series,
            risk: snapshot.risk.as_ref(),
            peak: snapshot.peak.as_ref(),
            seasonal: &snapshot.seasonal,
        }
    }
}

pub fn render<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

/// Write the report to `--output` or stdout.
pub fn emit<T: Serialize>(value: &T, report: &ReportArgs) -> anyhow::Result<()> {
    let json = render(value, report.pretty)?;
    match &report.output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Report written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

pub async fn run_dashboard(sources: &SourceArgs, filters: &FilterArgs, report: &ReportArgs) -> anyhow::Result<()> {
    let state = build_state(sources, filters, report, Forecasts::Load).await?;
    let snapshot: Arc<DashboardSnapshot> = state.snapshot();
    emit(snapshot.as_ref(), report)
}

pub async fn run_summary(sources: &SourceArgs, filters: &FilterArgs, report: &ReportArgs) -> anyhow::Result<()> {
    let state = build_state(sources, filters, report, Forecasts::Skip).await?;
    let snapshot = state.snapshot();
    emit(&SummaryReport::from(snapshot.as_ref()), report)
}

pub async fn run_forecast(sources: &SourceArgs, filters: &FilterArgs, report: &ReportArgs) -> anyhow::Result<()> {
    let state = build_state(sources, filters, report, Forecasts::Load).await?;
    let snapshot = state.snapshot();
    if let Some(risk) = &snapshot.risk {
        info!(
            "Forecast risk {} over {}: {}",
            risk.risk_level, snapshot.horizon, risk.suggested_action
        );
    }
    emit(&ForecastReport::from(snapshot.as_ref()), report)
}

/// List the values each filter accepts. Fails if observations cannot be read.
pub async fn run_options(sources: &SourceArgs, report: &ReportArgs) -> anyhow::Result<()> {
    let source = sources
        .observation_source()
        .context("An observation source is required (--observations or --observations-url)")?;
    let observations = load_observations(&http_client()?, &source)
        .await
        .with_context(|| format!("Failed to load observations from {}", source))?;
    emit(&FilterOptions::from_observations(&observations), report)
}
