//! Filter engine: (observations, criteria) -> matching subset.

use chrono::Datelike;
use pest_core::{DateRange, FilterCriteria, Observation, PestType, Season};
use serde::Serialize;

/// True when `observation` satisfies every dimension of `criteria`.
pub fn matches(observation: &Observation, criteria: &FilterCriteria) -> bool {
    criteria.year.accepts(&observation.date.year())
        && criteria.season.accepts(&observation.season)
        && criteria.field_stage.accepts_str(&observation.field_stage)
        && criteria.pest_type.accepts(&observation.pest_type)
        && criteria
            .date_range
            .map_or(true, |range| range.contains(&observation.date))
        && criteria
            .threshold_status
            .accepts(observation.above_threshold())
        && criteria.action_status.accepts(observation.action_taken)
}

/// Return the observations matching `criteria`, in input order.
pub fn filter_observations(observations: &[Observation], criteria: &FilterCriteria) -> Vec<Observation> {
    observations
        .iter()
        .filter(|obs| matches(obs, criteria))
        .cloned()
        .collect()
}

/// Values available for each filter dimension in a data set.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    /// Newest first.
    pub years: Vec<i32>,
    pub seasons: Vec<Season>,
    /// First-seen order.
    pub field_stages: Vec<String>,
    pub pest_types: Vec<PestType>,
    /// Earliest and latest observation dates.
    pub date_bounds: Option<DateRange>,
}

impl FilterOptions {
    pub fn from_observations(observations: &[Observation]) -> FilterOptions {
        let mut options = FilterOptions::default();
        for obs in observations {
            let year = obs.date.year();
            if !options.years.contains(&year) {
                options.years.push(year);
            }
            if !options.seasons.contains(&obs.season) {
                options.seasons.push(obs.season);
            }
            if !obs.field_stage.is_empty() && !options.field_stages.contains(&obs.field_stage) {
                options.field_stages.push(obs.field_stage.clone());
            }
            if !options.pest_types.contains(&obs.pest_type) {
                options.pest_types.push(obs.pest_type);
            }
            options.date_bounds = Some(match options.date_bounds {
                None => DateRange::new(obs.date, obs.date),
                Some(bounds) => DateRange::new(bounds.start.min(obs.date), bounds.end.max(obs.date)),
            });
        }
        options.years.sort_unstable_by(|a, b| b.cmp(a));
        options.pest_types.sort();
        options
    }
}
