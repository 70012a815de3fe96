//! Reading observation and forecast feeds from local snapshots or over HTTP.

use crate::error::{FeedError, Result};
use crate::forecast::ForecastPoint;
use crate::observation::Observation;
use flate2::read::GzDecoder;
use log::info;
use serde::Serialize;
use std::io::Read;
use std::path::Path;

#[cfg(feature = "api")]
use log::warn;
#[cfg(feature = "api")]
use reqwest::{Client, StatusCode};
#[cfg(feature = "api")]
use std::time::Duration;

/// Attempts made against an HTTP feed before giving up.
pub const MAX_FETCH_ATTEMPTS: u32 = 3;

/// Initial backoff between HTTP attempts; doubles after each failure.
pub const INITIAL_BACKOFF_MILLIS: u64 = 500;

/// Encoding of a feed body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedFormat {
    Json,
    Csv,
}

impl FeedFormat {
    /// Pick the format from a file name, looking through a trailing `.gz`.
    /// Returns the format and whether the file is gzip-compressed.
    pub fn from_path(path: &Path) -> (FeedFormat, bool) {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let (inner, compressed) = match name.strip_suffix(".gz") {
            Some(inner) => (inner.to_string(), true),
            None => (name, false),
        };
        let format = if inner.ends_with(".json") {
            FeedFormat::Json
        } else {
            FeedFormat::Csv
        };
        (format, compressed)
    }

    /// Guess the format of an HTTP body from its first non-blank character.
    pub fn sniff(body: &str) -> FeedFormat {
        match body.trim_start().chars().next() {
            Some('[') | Some('{') => FeedFormat::Json,
            _ => FeedFormat::Csv,
        }
    }
}

/// Where the forecast in use came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeedOrigin {
    Primary,
    Fallback,
    /// Neither source answered; the dashboard runs on history alone.
    Unavailable,
}

/// A resolved forecast feed and its origin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastFeed {
    pub points: Vec<ForecastPoint>,
    pub origin: FeedOrigin,
}

impl ForecastFeed {
    pub fn primary(points: Vec<ForecastPoint>) -> Self {
        ForecastFeed {
            points,
            origin: FeedOrigin::Primary,
        }
    }

    pub fn fallback(points: Vec<ForecastPoint>) -> Self {
        ForecastFeed {
            points,
            origin: FeedOrigin::Fallback,
        }
    }

    pub fn unavailable() -> Self {
        ForecastFeed {
            points: Vec::new(),
            origin: FeedOrigin::Unavailable,
        }
    }
}

impl Default for ForecastFeed {
    fn default() -> Self {
        ForecastFeed::unavailable()
    }
}

/// Decode a gzip-compressed snapshot into text.
pub fn decompress_gz(bytes: &[u8]) -> Result<String> {
    let mut decoder = GzDecoder::new(bytes);
    let mut text = String::new();
    decoder.read_to_string(&mut text)?;
    Ok(text)
}

fn read_feed_text(path: &Path) -> Result<(String, FeedFormat)> {
    let (format, compressed) = FeedFormat::from_path(path);
    let text = if compressed {
        decompress_gz(&std::fs::read(path)?)?
    } else {
        std::fs::read_to_string(path)?
    };
    if text.trim().is_empty() {
        return Err(FeedError::EmptyResponse(path.display().to_string()));
    }
    Ok((text, format))
}

/// Parse an observation feed body in the given format.
pub fn parse_observations(body: &str, format: FeedFormat) -> Result<Vec<Observation>> {
    match format {
        FeedFormat::Json => Observation::from_json(body),
        FeedFormat::Csv => Observation::from_csv(body),
    }
}

/// Load observations from a `.json`, `.csv` or gzip-compressed snapshot.
pub fn read_observations(path: &Path) -> Result<Vec<Observation>> {
    let (text, format) = read_feed_text(path)?;
    let observations = parse_observations(&text, format)?;
    info!(
        "Loaded {} observations from {}",
        observations.len(),
        path.display()
    );
    Ok(observations)
}

/// Load forecast points from a JSON snapshot (optionally gzip-compressed).
pub fn read_forecasts(path: &Path) -> Result<Vec<ForecastPoint>> {
    let (text, _) = read_feed_text(path)?;
    let points = ForecastPoint::from_json(&text)?;
    info!(
        "Loaded {} forecast points from {}",
        points.len(),
        path.display()
    );
    Ok(points)
}

/// GET a feed body, retrying with exponential backoff. Non-200 answers and
/// empty bodies count as failed attempts; the last failure is returned.
#[cfg(feature = "api")]
pub async fn fetch_text(client: &Client, url: &str) -> Result<String> {
    let mut sleep_millis = INITIAL_BACKOFF_MILLIS;
    let mut last_error = FeedError::EmptyResponse(url.to_string());

    for attempt in 1..=MAX_FETCH_ATTEMPTS {
        match client.get(url).send().await {
            Ok(response) if response.status() != StatusCode::OK => {
                warn!(
                    "Attempt {}/{}: Bad response status for {}: {}",
                    attempt,
                    MAX_FETCH_ATTEMPTS,
                    url,
                    response.status()
                );
                last_error = FeedError::HttpStatus {
                    url: url.to_string(),
                    status: response.status().as_u16(),
                };
            }
            Ok(response) => match response.text().await {
                Ok(body) if body.trim().is_empty() => {
                    warn!(
                        "Attempt {}/{}: Empty response for {}",
                        attempt, MAX_FETCH_ATTEMPTS, url
                    );
                    last_error = FeedError::EmptyResponse(url.to_string());
                }
                Ok(body) => return Ok(body),
                Err(e) => {
                    warn!(
                        "Attempt {}/{}: Failed to read response body for {}: {}",
                        attempt, MAX_FETCH_ATTEMPTS, url, e
                    );
                    last_error = FeedError::Http(e);
                }
            },
            Err(e) => {
                warn!(
                    "Attempt {}/{}: Request failed for {}: {}",
                    attempt, MAX_FETCH_ATTEMPTS, url, e
                );
                last_error = FeedError::Http(e);
            }
        }

        if attempt < MAX_FETCH_ATTEMPTS {
            info!(
                "Sleeping for {} milliseconds before retrying {}",
                sleep_millis, url
            );
            tokio::time::sleep(Duration::from_millis(sleep_millis)).await;
            sleep_millis *= 2;
        }
    }

    warn!("All attempts failed for {}", url);
    Err(last_error)
}

/// Fetch and parse an observation feed over HTTP.
#[cfg(feature = "api")]
pub async fn fetch_observations(client: &Client, url: &str) -> Result<Vec<Observation>> {
    let body = fetch_text(client, url).await?;
    let observations = parse_observations(&body, FeedFormat::sniff(&body))?;
    info!("Fetched {} observations from {}", observations.len(), url);
    Ok(observations)
}

/// Fetch and parse a forecast feed over HTTP.
#[cfg(feature = "api")]
pub async fn fetch_forecasts(client: &Client, url: &str) -> Result<Vec<ForecastPoint>> {
    let body = fetch_text(client, url).await?;
    let points = ForecastPoint::from_json(&body)?;
    info!("Fetched {} forecast points from {}", points.len(), url);
    Ok(points)
}
