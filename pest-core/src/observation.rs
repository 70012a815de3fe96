use crate::error::{FeedError, Result};
use crate::pest::{PestType, Season};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use log::{info, warn};
use pest_utils::dates::{format_date, parse_date};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Header that identifies a raw field-log export rather than a normalised
/// observation CSV.
pub const FIELD_LOG_COUNT_HEADER: &str = "Pest Count/Damage";

/// Threshold assigned to field-log rows whose status mentions the Economic Threshold.
pub const FIELD_LOG_ECONOMIC_THRESHOLD: f64 = 10.0;

/// Threshold assigned to every other field-log row.
pub const FIELD_LOG_DEFAULT_THRESHOLD: f64 = 5.0;

/// A single pest count taken in the field.
///
/// Whether the count is above threshold is never stored: it is derived from
/// `count` and `threshold` every time it is asked for, so a feed that sends a
/// stale `aboveThreshold` flag cannot disagree with the numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub id: String,
    pub date: NaiveDate,
    pub pest_type: PestType,
    pub count: u32,
    pub threshold: f64,
    pub season: Season,
    pub field_stage: String,
    pub location: Option<String>,
    pub action_taken: bool,
    pub action_type: Option<String>,
    pub action_date: Option<NaiveDate>,
}

impl Observation {
    /// Build an observation with no action recorded. Fails when the
    /// threshold is not a positive finite number.
    pub fn new(
        id: impl Into<String>,
        date: NaiveDate,
        pest_type: PestType,
        count: u32,
        threshold: f64,
        season: Season,
        field_stage: impl Into<String>,
    ) -> Result<Self> {
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(FeedError::InvalidRecord(format!(
                "threshold must be positive, got {}",
                threshold
            )));
        }
        Ok(Observation {
            id: id.into(),
            date,
            pest_type,
            count,
            threshold,
            season,
            field_stage: field_stage.into(),
            location: None,
            action_taken: false,
            action_type: None,
            action_date: None,
        })
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Mark an intervention as taken for this observation.
    pub fn with_action(mut self, action_type: Option<String>, action_date: Option<NaiveDate>) -> Self {
        self.action_taken = true;
        self.action_type = action_type;
        self.action_date = action_date;
        self
    }

    pub fn above_threshold(&self) -> bool {
        self.count as f64 >= self.threshold
    }
}

/// Borrowed wire shape of an [`Observation`], including the derived flag.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ObservationView<'a> {
    id: &'a str,
    date: String,
    pest_type: PestType,
    count: u32,
    threshold: f64,
    above_threshold: bool,
    season: Season,
    field_stage: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<&'a str>,
    action_taken: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    action_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    action_date: Option<String>,
}

impl Serialize for Observation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        ObservationView {
            id: &self.id,
            date: format_date(&self.date),
            pest_type: self.pest_type,
            count: self.count,
            threshold: self.threshold,
            above_threshold: self.above_threshold(),
            season: self.season,
            field_stage: &self.field_stage,
            location: self.location.as_deref(),
            action_taken: self.action_taken,
            action_type: self.action_type.as_deref(),
            action_date: self.action_date.as_ref().map(format_date),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Observation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let record = ObservationRecord::deserialize(deserializer)?;
        record.try_into().map_err(serde::de::Error::custom)
    }
}

/// Raw observation as it arrives on the wire (JSON or normalised CSV).
/// Any `aboveThreshold` column is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub date: String,
    #[serde(default = "default_pest_type")]
    pub pest_type: PestType,
    pub count: f64,
    pub threshold: f64,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub field_stage: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub action_taken: bool,
    #[serde(default)]
    pub action_type: Option<String>,
    #[serde(default)]
    pub action_date: Option<String>,
}

fn default_pest_type() -> PestType {
    PestType::BlackRiceBug
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Flags come as JSON booleans, `0`/`1`, or words depending on the exporter.
fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Int(i) => Ok(i != 0),
        Flag::Text(t) => match t.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "taken" => Ok(true),
            "" | "0" | "false" | "no" | "not taken" => Ok(false),
            other => Err(serde::de::Error::custom(format!("unrecognised flag '{}'", other))),
        },
    }
}

impl TryFrom<ObservationRecord> for Observation {
    type Error = FeedError;

    fn try_from(record: ObservationRecord) -> Result<Self> {
        let date = parse_date(&record.date)?;
        if !record.count.is_finite() || record.count < 0.0 {
            return Err(FeedError::InvalidRecord(format!(
                "count must be a non-negative number, got {}",
                record.count
            )));
        }
        if record.count.fract() != 0.0 || record.count > u32::MAX as f64 {
            return Err(FeedError::InvalidRecord(format!(
                "count must be a whole number of insects, got {}",
                record.count
            )));
        }
        let season = match non_blank(record.season) {
            Some(label) => label.parse::<Season>().map_err(FeedError::InvalidRecord)?,
            None => Season::for_date(&date),
        };
        let action_date = match non_blank(record.action_date) {
            Some(raw) => Some(parse_date(&raw)?),
            None => None,
        };
        let mut observation = Observation::new(
            record.id.unwrap_or_default(),
            date,
            record.pest_type,
            record.count as u32,
            record.threshold,
            season,
            non_blank(record.field_stage).unwrap_or_default(),
        )?;
        if let Some(location) = non_blank(record.location) {
            observation = observation.with_location(location);
        }
        if record.action_taken {
            observation = observation.with_action(non_blank(record.action_type), action_date);
        }
        Ok(observation)
    }
}

/// Row of a raw field-log export.
#[derive(Debug, Deserialize)]
struct FieldLogRecord {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Pest", default)]
    pest: Option<String>,
    #[serde(rename = "Pest Count/Damage")]
    count: f64,
    #[serde(rename = "Threshold Status", default)]
    threshold_status: Option<String>,
    #[serde(rename = "Season", default)]
    season: Option<String>,
    #[serde(rename = "Field Stage", default)]
    field_stage: Option<String>,
    #[serde(rename = "Location", default)]
    location: Option<String>,
    #[serde(rename = "Action", default)]
    action: Option<String>,
}

impl FieldLogRecord {
    fn into_record(self, row: usize) -> Result<ObservationRecord> {
        let pest_type = match non_blank(self.pest) {
            Some(name) => name.parse::<PestType>().map_err(FeedError::InvalidRecord)?,
            None => PestType::BlackRiceBug,
        };
        let threshold = match &self.threshold_status {
            Some(status) if status.contains("Economic Threshold") => FIELD_LOG_ECONOMIC_THRESHOLD,
            _ => FIELD_LOG_DEFAULT_THRESHOLD,
        };
        let action_taken = self.action.as_deref().map(str::trim) == Some("1");
        Ok(ObservationRecord {
            id: Some(format!("obs-{}", row)),
            action_date: action_taken.then(|| self.date.clone()),
            date: self.date,
            pest_type,
            count: self.count,
            threshold,
            season: self.season,
            field_stage: Some(non_blank(self.field_stage).unwrap_or_else(|| "Vegetative".to_string())),
            location: self.location,
            action_taken,
            action_type: action_taken.then(|| "Intervention".to_string()),
        })
    }
}

impl Observation {
    /// Parse a JSON observation feed: either a bare array or an API
    /// envelope `{ "success": bool, "data": [...] }`. Invalid records are
    /// skipped with a warning.
    pub fn from_json(body: &str) -> Result<Vec<Observation>> {
        let payload: serde_json::Value = serde_json::from_str(body)?;
        let items = match payload {
            serde_json::Value::Array(items) => items,
            serde_json::Value::Object(mut envelope) => {
                if envelope.get("success") == Some(&serde_json::Value::Bool(false)) {
                    return Err(FeedError::Rejected(
                        envelope
                            .get("message")
                            .and_then(|m| m.as_str())
                            .unwrap_or("observation feed reported failure")
                            .to_string(),
                    ));
                }
                match envelope.remove("data") {
                    Some(serde_json::Value::Array(items)) => items,
                    _ => {
                        return Err(FeedError::InvalidRecord(
                            "observation envelope has no data array".to_string(),
                        ))
                    }
                }
            }
            _ => {
                return Err(FeedError::InvalidRecord(
                    "observation feed is neither an array nor an envelope".to_string(),
                ))
            }
        };

        let total = items.len();
        let observations = items
            .into_iter()
            .enumerate()
            .filter_map(|(row, item)| {
                let parsed = serde_json::from_value::<ObservationRecord>(item)
                    .map_err(FeedError::from)
                    .and_then(Observation::try_from);
                accept_row(row, parsed)
            })
            .collect::<Vec<_>>();
        Ok(finish_batch(observations, total))
    }

    /// Parse a CSV observation feed. Both the normalised column layout and
    /// raw field-log exports are accepted; the header row decides which.
    pub fn from_csv(body: &str) -> Result<Vec<Observation>> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(body.as_bytes());
        let headers: StringRecord = rdr.headers()?.clone();
        let is_field_log = headers.iter().any(|h| h == FIELD_LOG_COUNT_HEADER);

        let mut total = 0;
        let mut observations = Vec::new();
        if is_field_log {
            for (row, result) in rdr.deserialize::<FieldLogRecord>().enumerate() {
                total += 1;
                let parsed = result
                    .map_err(FeedError::from)
                    .and_then(|r| r.into_record(row))
                    .and_then(Observation::try_from);
                observations.extend(accept_row(row, parsed));
            }
        } else {
            for (row, result) in rdr.deserialize::<ObservationRecord>().enumerate() {
                total += 1;
                let parsed = result
                    .map_err(FeedError::from)
                    .and_then(Observation::try_from);
                observations.extend(accept_row(row, parsed));
            }
        }
        Ok(finish_batch(observations, total))
    }
}

fn accept_row(row: usize, parsed: Result<Observation>) -> Option<Observation> {
    match parsed {
        Ok(observation) => Some(observation),
        Err(e) => {
            warn!("Skipping observation row {}: {}", row, e);
            None
        }
    }
}

/// Give id-less records a stable positional id and report the batch.
fn finish_batch(mut observations: Vec<Observation>, total: usize) -> Vec<Observation> {
    for (idx, observation) in observations.iter_mut().enumerate() {
        if observation.id.is_empty() {
            observation.id = format!("obs-{}", idx);
        }
    }
    info!(
        "Parsed {} observations ({} rejected)",
        observations.len(),
        total - observations.len()
    );
    observations
}
