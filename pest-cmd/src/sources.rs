//! Feed source resolution with fallback.

use crate::args::SourceArgs;
use chrono::NaiveDate;
use log::{info, warn};
use pest_core::feed::{fetch_forecasts, fetch_observations, read_forecasts, read_observations};
use pest_core::forecast::{mock_forecast, MOCK_FORECAST_DAYS};
use pest_core::{FeedError, ForecastFeed, ForecastPoint, Observation, PestType};
use reqwest::Client;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq)]
pub enum ObservationSource {
    File(PathBuf),
    Url(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ForecastSource {
    File(PathBuf),
    Url(String),
    Mock,
}

impl fmt::Display for ObservationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObservationSource::File(path) => write!(f, "{}", path.display()),
            ObservationSource::Url(url) => f.write_str(url),
        }
    }
}

impl fmt::Display for ForecastSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForecastSource::File(path) => write!(f, "{}", path.display()),
            ForecastSource::Url(url) => f.write_str(url),
            ForecastSource::Mock => f.write_str("mock forecast"),
        }
    }
}

impl SourceArgs {
    /// The observation feed to read; a URL wins over a file.
    pub fn observation_source(&self) -> Option<ObservationSource> {
        match (&self.observations_url, &self.observations) {
            (Some(url), _) => Some(ObservationSource::Url(url.clone())),
            (None, Some(path)) => Some(ObservationSource::File(path.clone())),
            (None, None) => None,
        }
    }

    /// Primary and fallback forecast sources, in the order they are tried.
    pub fn forecast_sources(&self) -> Vec<ForecastSource> {
        let mut sources = Vec::new();
        if let Some(url) = &self.forecast_url {
            sources.push(ForecastSource::Url(url.clone()));
        }
        if let Some(path) = &self.forecast_file {
            sources.push(ForecastSource::File(path.clone()));
        }
        if self.mock_fallback {
            sources.push(ForecastSource::Mock);
        }
        sources
    }
}

pub fn http_client() -> anyhow::Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()?)
}

pub async fn load_observations(
    client: &Client,
    source: &ObservationSource,
) -> Result<Vec<Observation>, FeedError> {
    match source {
        ObservationSource::File(path) => read_observations(path),
        ObservationSource::Url(url) => fetch_observations(client, url).await,
    }
}

async fn load_forecast_points(
    client: &Client,
    source: &ForecastSource,
    today: NaiveDate,
    pest_type: PestType,
) -> Result<Vec<ForecastPoint>, FeedError> {
    match source {
        ForecastSource::File(path) => read_forecasts(path),
        ForecastSource::Url(url) => fetch_forecasts(client, url).await,
        ForecastSource::Mock => Ok(mock_forecast(today, pest_type, MOCK_FORECAST_DAYS)),
    }
}

/// Try each forecast source in turn. The first one that answers is the
/// primary feed when it is first in line and not the mock, otherwise a
/// fallback. When none answer the feed is unavailable and the dashboard
/// runs on history alone.
pub async fn resolve_forecast(
    client: &Client,
    sources: &[ForecastSource],
    today: NaiveDate,
    pest_type: PestType,
) -> ForecastFeed {
    for (attempt, source) in sources.iter().enumerate() {
        match load_forecast_points(client, source, today, pest_type).await {
            Ok(points) if attempt == 0 && *source != ForecastSource::Mock => {
                info!("Using {} forecast points from {}", points.len(), source);
                return ForecastFeed::primary(points);
            }
            Ok(points) => {
                warn!("Falling back to {} ({} forecast points)", source, points.len());
                return ForecastFeed::fallback(points);
            }
            Err(e) => warn!("Forecast source {} failed: {}", source, e),
        }
    }
    if sources.is_empty() {
        info!("No forecast source configured; showing history only");
    } else {
        warn!("No forecast source answered; showing history only");
    }
    ForecastFeed::unavailable()
}
