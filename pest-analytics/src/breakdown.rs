use pest_core::Observation;
use serde::Serialize;
use std::collections::HashMap;

/// Counts at or above this fraction of the threshold are a warning.
pub const WARNING_FRACTION: f64 = 0.7;

/// Label for taken actions recorded without a type.
pub const UNSPECIFIED_ACTION: &str = "Unspecified";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ThresholdBreakdown {
    pub critical: usize,
    pub warning: usize,
    pub normal: usize,
}

/// Bucket each observation by how close its count is to its threshold.
pub fn threshold_breakdown(filtered: &[Observation]) -> ThresholdBreakdown {
    let mut breakdown = ThresholdBreakdown::default();
    for obs in filtered {
        let count = obs.count as f64;
        if obs.above_threshold() {
            breakdown.critical += 1;
        } else if count >= obs.threshold * WARNING_FRACTION {
            breakdown.warning += 1;
        } else {
            breakdown.normal += 1;
        }
    }
    breakdown
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionTally {
    pub action_type: String,
    pub count: usize,
}

/// Count taken actions by type, most frequent first, then by name.
pub fn action_tally(filtered: &[Observation]) -> Vec<ActionTally> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for obs in filtered.iter().filter(|o| o.action_taken) {
        let action_type = obs
            .action_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(UNSPECIFIED_ACTION);
        *counts.entry(action_type).or_insert(0) += 1;
    }
    let mut tally: Vec<ActionTally> = counts
        .into_iter()
        .map(|(action_type, count)| ActionTally {
            action_type: action_type.to_string(),
            count,
        })
        .collect();
    tally.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.action_type.cmp(&b.action_type)));
    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{day, obs};

    #[test]
    fn test_threshold_breakdown() {
        let observations = vec![
            obs("a", day(2024, 1, 1), 10, 10.0, "Vegetative"),
            obs("b", day(2024, 1, 2), 7, 10.0, "Vegetative"),
            obs("c", day(2024, 1, 3), 6, 10.0, "Vegetative"),
            obs("d", day(2024, 1, 4), 0, 10.0, "Vegetative"),
        ];
        assert_eq!(
            threshold_breakdown(&observations),
            ThresholdBreakdown {
                critical: 1,
                warning: 1,
                normal: 2
            }
        );
        assert_eq!(threshold_breakdown(&[]), ThresholdBreakdown::default());
    }

    #[test]
    fn test_action_tally_orders_by_count_then_name() {
        let taken = |id: &str, kind: Option<&str>| {
            obs(id, day(2024, 1, 1), 10, 10.0, "Vegetative").with_action(kind.map(String::from), None)
        };
        let observations = vec![
            taken("a", Some("Spraying")),
            taken("b", Some("Light trap")),
            taken("c", Some("Spraying")),
            taken("d", None),
            taken("e", Some("  ")),
            taken("f", Some("Light trap")),
            obs("g", day(2024, 1, 1), 10, 10.0, "Vegetative"),
        ];
        let tally = action_tally(&observations);
        let rows: Vec<(&str, usize)> = tally
            .iter()
            .map(|t| (t.action_type.as_str(), t.count))
            .collect();
        assert_eq!(
            rows,
            vec![("Light trap", 2), ("Spraying", 2), ("Unspecified", 2)]
        );
    }
}
