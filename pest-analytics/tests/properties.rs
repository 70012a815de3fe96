use chrono::{Days, NaiveDate};
use pest_analytics::{calculate_kpis, filter_observations, relative_change, stitch_forecast};
use pest_core::{Choice, FilterCriteria, ForecastPoint, Horizon, Observation, PestType, Season};
use proptest::prelude::*;

const STAGES: [&str; 4] = ["Seedling", "Tillering", "Heading", "Ripening"];

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
}

prop_compose! {
    fn arb_observation()(
        offset in 0u64..800,
        count in 0u32..200,
        threshold in 1.0f64..100.0,
        stage in 0usize..STAGES.len(),
        taken in any::<bool>(),
    ) -> Observation {
        let date = epoch() + Days::new(offset);
        let obs = Observation::new(
            format!("o-{}", offset),
            date,
            PestType::BlackRiceBug,
            count,
            threshold,
            Season::for_date(&date),
            STAGES[stage],
        )
        .unwrap();
        if taken {
            obs.with_action(Some("Spraying".to_string()), Some(date))
        } else {
            obs
        }
    }
}

prop_compose! {
    fn arb_forecast()(
        offset in 0u64..800,
        predicted in -50.0f64..150.0,
        lower in -80.0f64..150.0,
        upper in -80.0f64..200.0,
        confidence in 0.0f64..100.0,
    ) -> ForecastPoint {
        ForecastPoint {
            date: epoch() + Days::new(offset),
            pest_type: PestType::BlackRiceBug,
            predicted,
            lower_bound: lower,
            upper_bound: upper,
            confidence,
        }
    }
}

proptest! {
    #[test]
    fn prop_identity_filter(observations in prop::collection::vec(arb_observation(), 0..60)) {
        let filtered = filter_observations(&observations, &FilterCriteria::default());
        prop_assert_eq!(filtered, observations);
    }

    #[test]
    fn prop_rates_stay_in_range(observations in prop::collection::vec(arb_observation(), 0..60)) {
        let kpis = calculate_kpis(&observations);
        prop_assert!((0.0..=100.0).contains(&kpis.percent_above_threshold));
        prop_assert!((0.0..=100.0).contains(&kpis.action_rate));
        if observations.is_empty() {
            prop_assert_eq!(kpis.percent_above_threshold, 0.0);
            prop_assert_eq!(kpis.action_rate, 0.0);
        }
    }

    #[test]
    fn prop_filtering_is_idempotent(
        observations in prop::collection::vec(arb_observation(), 0..60),
        year in prop_oneof![Just(Choice::All), (2023i32..2026).prop_map(Choice::Only)],
        stage in prop_oneof![Just(Choice::All), (0usize..STAGES.len()).prop_map(|i| Choice::Only(STAGES[i].to_string()))],
    ) {
        let criteria = FilterCriteria { year, field_stage: stage, ..FilterCriteria::default() };
        let first = filter_observations(&observations, &criteria);
        let second = filter_observations(&observations, &criteria);
        prop_assert_eq!(calculate_kpis(&first), calculate_kpis(&second));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_clamped_bounds_are_ordered(point in arb_forecast()) {
        let clamped = point.clamped();
        prop_assert!(0.0 <= clamped.lower_bound);
        prop_assert!(clamped.lower_bound <= clamped.upper_bound);
        prop_assert!(clamped.predicted >= 0.0);
    }

    #[test]
    fn prop_stitched_series_is_sorted_with_one_bridge(
        observations in prop::collection::vec(arb_observation(), 0..80),
        forecasts in prop::collection::vec(arb_forecast(), 0..40),
        today_offset in 0u64..800,
        fortnight in any::<bool>(),
    ) {
        let today = epoch() + Days::new(today_offset);
        let horizon = if fortnight { Horizon::Fortnight } else { Horizon::Week };
        let series = stitch_forecast(&observations, &forecasts, &Choice::All, today, horizon);

        prop_assert!(series.windows(2).all(|w| w[0].date <= w[1].date));
        for point in &series {
            if let (Some(lower), Some(upper)) = (point.lower_bound, point.upper_bound) {
                prop_assert!(0.0 <= lower && lower <= upper);
            }
        }

        let bridges: Vec<_> = series.iter().filter(|p| p.is_bridge()).collect();
        let has_history = series.iter().any(|p| p.is_historical);
        let has_forecast = series.iter().any(|p| p.is_forecast && !p.is_bridge());
        if has_history && has_forecast {
            prop_assert_eq!(bridges.len(), 1);
            prop_assert_eq!(bridges[0].actual, bridges[0].predicted);
        } else {
            prop_assert!(bridges.is_empty());
        }
    }

    #[test]
    fn prop_relative_change_is_finite(current in 0.0f64..1e6, previous in 0.0f64..1e6) {
        prop_assert!(relative_change(current, previous).is_finite());
    }
}
