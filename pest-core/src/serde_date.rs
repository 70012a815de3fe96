//! Lenient date deserializer: feeds send plain days, compact days and full
//! timestamps; all of them reduce to a calendar day.

use chrono::NaiveDate;
use pest_utils::dates::parse_date;
use serde::{de, Deserialize, Deserializer};

pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(de::Error::custom)
}
