//! Qualitative labels for a week-over-week change.
//!
//! Classification is a first-match scan over [`INSIGHT_TABLE`]. Each rule
//! may leave its magnitude, context or direction open to match anything.

use serde::Serialize;
use Direction::{Down, Up};
use Magnitude::{Large, Moderate, Stable};
use MetricContext::{MoreIsBad, MoreIsGood};

/// Change below this magnitude (percent or points) reads as stable.
pub const STABLE_BELOW: f64 = 5.0;

/// Change above this magnitude is large.
pub const LARGE_ABOVE: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Neutral,
    Warning,
    Good,
    Critical,
}

/// How a rising value should be read for a given metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricContext {
    MoreIsBad,
    MoreIsGood,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Magnitude {
    Stable,
    Moderate,
    Large,
}

impl Magnitude {
    pub fn of(change: f64) -> Magnitude {
        let size = if change.is_finite() { change.abs() } else { 0.0 };
        if size < STABLE_BELOW {
            Magnitude::Stable
        } else if size > LARGE_ABOVE {
            Magnitude::Large
        } else {
            Magnitude::Moderate
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn of(change: f64) -> Direction {
        if change > 0.0 {
            Direction::Up
        } else {
            Direction::Down
        }
    }
}

/// Label and sentiment attached to a trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Insight {
    pub label: &'static str,
    pub sentiment: Sentiment,
}

/// One row of the decision table. `None` matches any value.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub magnitude: Option<Magnitude>,
    pub context: Option<MetricContext>,
    pub direction: Option<Direction>,
    pub insight: Insight,
}

impl Rule {
    fn matches(&self, magnitude: Magnitude, context: MetricContext, direction: Direction) -> bool {
        self.magnitude.map_or(true, |m| m == magnitude)
            && self.context.map_or(true, |c| c == context)
            && self.direction.map_or(true, |d| d == direction)
    }
}

const fn rule(
    magnitude: Option<Magnitude>,
    context: Option<MetricContext>,
    direction: Option<Direction>,
    label: &'static str,
    sentiment: Sentiment,
) -> Rule {
    Rule {
        magnitude,
        context,
        direction,
        insight: Insight { label, sentiment },
    }
}

pub const INSIGHT_TABLE: &[Rule] = &[
    rule(Some(Stable), None, None, "Stable vs last week", Sentiment::Neutral),
    rule(Some(Large), Some(MoreIsBad), Some(Up), "Significant spike detected", Sentiment::Critical),
    rule(Some(Moderate), Some(MoreIsBad), Some(Up), "Rising trend observed", Sentiment::Warning),
    rule(None, Some(MoreIsBad), Some(Down), "Improved vs last week", Sentiment::Good),
    rule(None, Some(MoreIsGood), Some(Up), "Performance improving", Sentiment::Good),
    rule(Some(Large), Some(MoreIsGood), Some(Down), "Sharp decline needs review", Sentiment::Critical),
    rule(Some(Moderate), Some(MoreIsGood), Some(Down), "Falling below average", Sentiment::Warning),
    rule(None, Some(MetricContext::Neutral), Some(Up), "Increased field activity", Sentiment::Neutral),
    rule(None, Some(MetricContext::Neutral), Some(Down), "Lower reporting volume", Sentiment::Neutral),
];

/// Returned if no rule matches; unreachable with the table above.
const FALLBACK: Insight = Insight {
    label: "Stable vs last week",
    sentiment: Sentiment::Neutral,
};

/// Classify `change` for a metric read in `context`.
pub fn classify(change: f64, context: MetricContext) -> Insight {
    let magnitude = Magnitude::of(change);
    let direction = Direction::of(change);
    INSIGHT_TABLE
        .iter()
        .find(|r| r.matches(magnitude, context, direction))
        .map_or(FALLBACK, |r| r.insight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::Direction::{Down, Up};
    use super::Magnitude::{Large, Moderate, Stable};
    use super::MetricContext::{MoreIsBad, MoreIsGood};

    const CONTEXTS: [MetricContext; 3] = [MoreIsBad, MoreIsGood, MetricContext::Neutral];

    #[test]
    fn test_small_changes_are_neutral_in_every_context() {
        for context in CONTEXTS {
            for change in [0.0, 4.9, -4.9, 3.0] {
                let insight = classify(change, context);
                assert_eq!(insight.sentiment, Sentiment::Neutral);
                assert_eq!(insight.label, "Stable vs last week");
            }
        }
    }

    #[test]
    fn test_large_changes_are_critical_or_good() {
        assert_eq!(classify(16.0, MoreIsBad).sentiment, Sentiment::Critical);
        assert_eq!(classify(-16.0, MoreIsBad).sentiment, Sentiment::Good);
        assert_eq!(classify(16.0, MoreIsGood).sentiment, Sentiment::Good);
        assert_eq!(classify(-16.0, MoreIsGood).sentiment, Sentiment::Critical);
    }

    #[test]
    fn test_moderate_changes_warn() {
        let rising = classify(10.0, MoreIsBad);
        assert_eq!(rising.label, "Rising trend observed");
        assert_eq!(rising.sentiment, Sentiment::Warning);
        let falling = classify(-15.0, MoreIsGood);
        assert_eq!(falling.label, "Falling below average");
        assert_eq!(falling.sentiment, Sentiment::Warning);
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(Magnitude::of(5.0), Magnitude::Moderate);
        assert_eq!(Magnitude::of(15.0), Magnitude::Moderate);
        assert_eq!(Magnitude::of(15.1), Magnitude::Large);
        assert_eq!(Magnitude::of(f64::NAN), Magnitude::Stable);
    }

    #[test]
    fn test_neutral_context_labels_volume() {
        assert_eq!(classify(40.0, MetricContext::Neutral).label, "Increased field activity");
        assert_eq!(classify(-40.0, MetricContext::Neutral).label, "Lower reporting volume");
        assert_eq!(classify(-40.0, MetricContext::Neutral).sentiment, Sentiment::Neutral);
    }

    #[test]
    fn test_every_combination_is_covered() {
        for context in CONTEXTS {
            for magnitude in [Stable, Moderate, Large] {
                for direction in [Up, Down] {
                    assert!(
                        INSIGHT_TABLE.iter().any(|r| r.matches(magnitude, context, direction)),
                        "no rule for {:?} {:?} {:?}",
                        magnitude,
                        context,
                        direction
                    );
                }
            }
        }
    }
}
