//! Shared command-line arguments.

use chrono::{Local, NaiveDate};
use clap::Args;
use pest_core::{ActionStatus, Choice, DateRange, FilterCriteria, Horizon, PestType, Season, ThresholdStatus};
use pest_utils::dates::parse_date;
use std::path::PathBuf;

/// Where observations and forecasts are read from.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Observation snapshot (.json, .csv, or either with .gz)
    #[arg(short = 'o', long, env = "PEST_OBSERVATIONS")]
    pub observations: Option<PathBuf>,

    /// Observation feed URL; takes precedence over --observations
    #[arg(long, env = "PEST_OBSERVATIONS_URL")]
    pub observations_url: Option<String>,

    /// Forecast model service URL
    #[arg(long, env = "PEST_FORECAST_URL")]
    pub forecast_url: Option<String>,

    /// Forecast snapshot (.json or .json.gz); used as fallback when a URL is also given
    #[arg(long, env = "PEST_FORECAST_FILE")]
    pub forecast_file: Option<PathBuf>,

    /// Fall back to a generated forecast when no forecast source answers
    #[arg(long)]
    pub mock_fallback: bool,
}

/// Dashboard filter dimensions. Every dimension defaults to "All".
#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    #[arg(long, default_value = "All")]
    pub year: Choice<i32>,

    #[arg(long, default_value = "All")]
    pub season: Choice<Season>,

    #[arg(long, default_value = "All")]
    pub field_stage: Choice<String>,

    #[arg(long, default_value = "All")]
    pub pest: Choice<PestType>,

    /// First day of the date range (inclusive)
    #[arg(long, value_parser = parse_date)]
    pub from: Option<NaiveDate>,

    /// Last day of the date range (inclusive)
    #[arg(long, value_parser = parse_date)]
    pub to: Option<NaiveDate>,

    /// All, Above or Below
    #[arg(long, default_value = "All")]
    pub threshold_status: ThresholdStatus,

    /// All, Taken or "Not Taken"
    #[arg(long, default_value = "All")]
    pub action_status: ActionStatus,
}

impl FilterArgs {
    pub fn criteria(&self) -> FilterCriteria {
        let date_range = match (self.from, self.to) {
            (None, None) => None,
            (from, to) => Some(DateRange::new(
                from.unwrap_or(NaiveDate::MIN),
                to.unwrap_or(NaiveDate::MAX),
            )),
        };
        FilterCriteria {
            year: self.year.clone(),
            season: self.season.clone(),
            field_stage: self.field_stage.clone(),
            pest_type: self.pest.clone(),
            date_range,
            threshold_status: self.threshold_status,
            action_status: self.action_status,
        }
    }
}

/// Reference date, horizon and output destination.
#[derive(Args, Debug, Clone)]
pub struct ReportArgs {
    /// Reference day for trends and the forecast seam (defaults to the local date)
    #[arg(long, value_parser = parse_date)]
    pub today: Option<NaiveDate>,

    /// Forecast horizon in days: 7 or 14
    #[arg(long, default_value = "7")]
    pub horizon: Horizon,

    /// Write JSON here instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Pretty-print the JSON
    #[arg(long)]
    pub pretty: bool,
}

impl ReportArgs {
    /// The reference day, read from the local clock only when not given.
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}
