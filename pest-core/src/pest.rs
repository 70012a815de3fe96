use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Economic Threshold (ET): pest count above which intervention is recommended.
pub const ECONOMIC_THRESHOLD: f64 = 50.0;

/// The Economic Injury Level (EIL) sits at this multiple of the ET.
pub const INJURY_LEVEL_FACTOR: f64 = 1.5;

/// Pest species tracked by the monitoring program.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PestType {
    #[serde(rename = "Black Rice Bug", alias = "RBB")]
    BlackRiceBug,
}

impl PestType {
    pub const ALL: [PestType; 1] = [PestType::BlackRiceBug];

    pub fn name(&self) -> &'static str {
        match self {
            PestType::BlackRiceBug => "Black Rice Bug",
        }
    }

    /// Economic Threshold for this pest, in individuals per sample.
    pub fn economic_threshold(&self) -> f64 {
        match self {
            PestType::BlackRiceBug => ECONOMIC_THRESHOLD,
        }
    }

    /// Economic Injury Level: crop-damage risk, 1.5x the ET.
    pub fn economic_injury_level(&self) -> f64 {
        self.economic_threshold() * INJURY_LEVEL_FACTOR
    }
}

impl fmt::Display for PestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PestType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "RBB" => Ok(PestType::BlackRiceBug),
            other if other.eq_ignore_ascii_case("black rice bug") => Ok(PestType::BlackRiceBug),
            other => Err(format!("unknown pest type '{}'", other)),
        }
    }
}

/// Cropping season.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum Season {
    #[serde(alias = "dry", alias = "DRY")]
    Dry,
    #[serde(alias = "wet", alias = "WET")]
    Wet,
}

impl Season {
    /// Wet season runs May through October, Dry season November through April.
    pub fn for_date(date: &NaiveDate) -> Season {
        match date.month() {
            5..=10 => Season::Wet,
            _ => Season::Dry,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Season::Dry => f.write_str("Dry"),
            Season::Wet => f.write_str("Wet"),
        }
    }
}

impl FromStr for Season {
    type Err = String;

    /// Accepts "Dry"/"Wet" as well as labels such as "Wet Season".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        if lowered.starts_with("dry") {
            Ok(Season::Dry)
        } else if lowered.starts_with("wet") {
            Ok(Season::Wet)
        } else {
            Err(format!("unknown season '{}'", s.trim()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pest_type_parse_and_levels() {
        assert_eq!("RBB".parse::<PestType>().unwrap(), PestType::BlackRiceBug);
        assert_eq!("black rice bug".parse::<PestType>().unwrap(), PestType::BlackRiceBug);
        assert!("Locust".parse::<PestType>().is_err());
        assert_eq!(PestType::BlackRiceBug.economic_threshold(), 50.0);
        assert_eq!(PestType::BlackRiceBug.economic_injury_level(), 75.0);
    }

    #[test]
    fn test_pest_type_serde_name() {
        let json = serde_json::to_string(&PestType::BlackRiceBug).unwrap();
        assert_eq!(json, "\"Black Rice Bug\"");
        let parsed: PestType = serde_json::from_str("\"RBB\"").unwrap();
        assert_eq!(parsed, PestType::BlackRiceBug);
    }

    #[test]
    fn test_season_for_date() {
        let may = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let oct = NaiveDate::from_ymd_opt(2024, 10, 31).unwrap();
        let nov = NaiveDate::from_ymd_opt(2024, 11, 1).unwrap();
        let apr = NaiveDate::from_ymd_opt(2024, 4, 30).unwrap();
        assert_eq!(Season::for_date(&may), Season::Wet);
        assert_eq!(Season::for_date(&oct), Season::Wet);
        assert_eq!(Season::for_date(&nov), Season::Dry);
        assert_eq!(Season::for_date(&apr), Season::Dry);
    }

    #[test]
    fn test_season_from_label() {
        assert_eq!("Wet Season".parse::<Season>().unwrap(), Season::Wet);
        assert_eq!("dry".parse::<Season>().unwrap(), Season::Dry);
        assert!("Monsoon".parse::<Season>().is_err());
    }
}
