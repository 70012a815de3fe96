use pest_core::Observation;
use pest_utils::rounding::{mean, percent_of, round_tenth};
use serde::Serialize;

/// Placeholder stage name when there is nothing to report.
pub const NOT_AVAILABLE: &str = "N/A";

/// Summary metrics over a filtered observation set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiMetrics {
    pub total_observations: usize,
    pub average_pest_count: f64,
    pub percent_above_threshold: f64,
    pub total_actions_taken: usize,
    pub action_rate: f64,
    pub current_field_stage: String,
    pub most_affected_stage: String,
}

impl Default for KpiMetrics {
    fn default() -> Self {
        KpiMetrics {
            total_observations: 0,
            average_pest_count: 0.0,
            percent_above_threshold: 0.0,
            total_actions_taken: 0,
            action_rate: 0.0,
            current_field_stage: NOT_AVAILABLE.to_string(),
            most_affected_stage: NOT_AVAILABLE.to_string(),
        }
    }
}

/// Aggregate KPIs over `filtered`. Averages and percentages are kept to
/// one decimal; an empty set yields [`KpiMetrics::default`].
pub fn calculate_kpis(filtered: &[Observation]) -> KpiMetrics {
    if filtered.is_empty() {
        return KpiMetrics::default();
    }

    let total = filtered.len();
    let count_sum: f64 = filtered.iter().map(|o| o.count as f64).sum();
    let above = filtered.iter().filter(|o| o.above_threshold()).count();
    let actions = filtered.iter().filter(|o| o.action_taken).count();

    KpiMetrics {
        total_observations: total,
        average_pest_count: round_tenth(mean(count_sum, total).unwrap_or_default()),
        percent_above_threshold: round_tenth(percent_of(above, total)),
        total_actions_taken: actions,
        action_rate: round_tenth(percent_of(actions, total)),
        current_field_stage: current_field_stage(filtered),
        most_affected_stage: most_affected_stage(filtered),
    }
}

/// Stage of the most recent observation; the earliest listed wins a tie.
fn current_field_stage(observations: &[Observation]) -> String {
    let mut latest: Option<&Observation> = None;
    for obs in observations {
        if latest.map_or(true, |l| obs.date > l.date) {
            latest = Some(obs);
        }
    }
    match latest {
        Some(obs) if !obs.field_stage.is_empty() => obs.field_stage.clone(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Stage with the highest mean count. Stages are kept in first-seen order
/// and only a strictly higher mean displaces the leader.
fn most_affected_stage(observations: &[Observation]) -> String {
    let mut stages: Vec<(&str, f64, usize)> = Vec::new();
    for obs in observations.iter().filter(|o| !o.field_stage.is_empty()) {
        match stages.iter_mut().find(|(name, _, _)| *name == obs.field_stage) {
            Some(entry) => {
                entry.1 += obs.count as f64;
                entry.2 += 1;
            }
            None => stages.push((obs.field_stage.as_str(), obs.count as f64, 1)),
        }
    }

    let mut best: Option<(&str, f64)> = None;
    for (name, total, samples) in stages {
        let Some(avg) = mean(total, samples) else {
            continue;
        };
        if best.map_or(true, |(_, leader)| avg > leader) {
            best = Some((name, avg));
        }
    }
    best.map_or_else(|| NOT_AVAILABLE.to_string(), |(name, _)| name.to_string())
}
