//! Dashboard filter criteria. Every dimension accepts the sentinel `"All"`,
//! meaning no constraint.

use crate::date_range::DateRange;
use crate::pest::{PestType, Season};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Label of the "no constraint" sentinel.
pub const ALL: &str = "All";

/// Either no constraint or a single accepted value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Choice<T> {
    All,
    Only(T),
}

impl<T> Default for Choice<T> {
    fn default() -> Self {
        Choice::All
    }
}

impl<T: PartialEq> Choice<T> {
    /// True for `All`, or when the constrained value equals `value`.
    pub fn accepts(&self, value: &T) -> bool {
        match self {
            Choice::All => true,
            Choice::Only(wanted) => wanted == value,
        }
    }
}

impl Choice<String> {
    pub fn accepts_str(&self, value: &str) -> bool {
        match self {
            Choice::All => true,
            Choice::Only(wanted) => wanted == value,
        }
    }
}

impl<T: FromStr> FromStr for Choice<T> {
    type Err = T::Err;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case(ALL) {
            Ok(Choice::All)
        } else {
            s.parse().map(Choice::Only)
        }
    }
}

impl<T: fmt::Display> fmt::Display for Choice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::All => f.write_str(ALL),
            Choice::Only(value) => value.fmt(f),
        }
    }
}

impl<T: Serialize> Serialize for Choice<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Choice::All => serializer.serialize_str(ALL),
            Choice::Only(value) => value.serialize(serializer),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Choice<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw<T> {
            Sentinel(AllTag),
            Value(T),
        }

        #[derive(Deserialize)]
        enum AllTag {
            All,
        }

        match Raw::<T>::deserialize(deserializer)? {
            Raw::Sentinel(AllTag::All) => Ok(Choice::All),
            Raw::Value(value) => Ok(Choice::Only(value)),
        }
    }
}

/// Threshold dimension of the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ThresholdStatus {
    #[default]
    All,
    Above,
    Below,
}

impl ThresholdStatus {
    pub fn accepts(&self, above_threshold: bool) -> bool {
        match self {
            ThresholdStatus::All => true,
            ThresholdStatus::Above => above_threshold,
            ThresholdStatus::Below => !above_threshold,
        }
    }
}

impl FromStr for ThresholdStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ThresholdStatus::All),
            "above" => Ok(ThresholdStatus::Above),
            "below" => Ok(ThresholdStatus::Below),
            other => Err(format!("unknown threshold status '{}'", other)),
        }
    }
}

/// Action dimension of the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ActionStatus {
    #[default]
    All,
    Taken,
    #[serde(rename = "Not Taken", alias = "NotTaken")]
    NotTaken,
}

impl ActionStatus {
    pub fn accepts(&self, action_taken: bool) -> bool {
        match self {
            ActionStatus::All => true,
            ActionStatus::Taken => action_taken,
            ActionStatus::NotTaken => !action_taken,
        }
    }
}

impl FromStr for ActionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], " ").as_str() {
            "all" => Ok(ActionStatus::All),
            "taken" => Ok(ActionStatus::Taken),
            "not taken" | "nottaken" => Ok(ActionStatus::NotTaken),
            other => Err(format!("unknown action status '{}'", other)),
        }
    }
}

/// The full set of dashboard filters. `Default` constrains nothing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(default)]
    pub year: Choice<i32>,
    #[serde(default)]
    pub season: Choice<Season>,
    #[serde(default)]
    pub field_stage: Choice<String>,
    #[serde(default)]
    pub pest_type: Choice<PestType>,
    #[serde(default)]
    pub date_range: Option<DateRange>,
    #[serde(default)]
    pub threshold_status: ThresholdStatus,
    #[serde(default)]
    pub action_status: ActionStatus,
}

impl FilterCriteria {
    /// True when no dimension constrains anything.
    pub fn is_unconstrained(&self) -> bool {
        *self == FilterCriteria::default()
    }
}
