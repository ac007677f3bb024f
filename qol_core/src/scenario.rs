//! Bench intervention propagator.
//!
//! A single bounded magnitude (benches added or removed) is pushed through a
//! fixed per-unit effect table into four factor deltas, which fixed dimension
//! weights fold into a composite score. Every call is a pure function of its
//! input; the caller owns the [`InterventionState`] between interactions.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

pub const MIN_MAGNITUDE: i32 = -10;
pub const MAX_MAGNITUDE: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Social,
    Physical,
    Environmental,
    Psychological,
}

impl Dimension {
    pub const ALL: [Dimension; 4] = [
        Dimension::Social,
        Dimension::Physical,
        Dimension::Environmental,
        Dimension::Psychological,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Dimension::Social => "Social",
            Dimension::Physical => "Physical",
            Dimension::Environmental => "Environmental",
            Dimension::Psychological => "Psychological",
        }
    }

    /// Case-insensitive match against catalog dimension names.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|dimension| dimension.label().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Benches placed (positive) or removed (negative), within `[-10, 10]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InterventionState {
    magnitude: i32,
}

impl InterventionState {
    pub fn new(magnitude: i32) -> Self {
        Self {
            magnitude: clamp_magnitude(magnitude),
        }
    }

    pub fn magnitude(&self) -> i32 {
        self.magnitude
    }

    pub fn set(&mut self, magnitude: i32) {
        self.magnitude = clamp_magnitude(magnitude);
    }

    pub fn increment(&mut self) {
        self.set(self.magnitude.saturating_add(1));
    }

    pub fn decrement(&mut self) {
        self.set(self.magnitude.saturating_sub(1));
    }

    pub fn reset(&mut self) {
        self.magnitude = 0;
    }
}

pub fn clamp_magnitude(magnitude: i32) -> i32 {
    magnitude.clamp(MIN_MAGNITUDE, MAX_MAGNITUDE)
}

/// Change in each factor, in the same units as the per-unit effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FactorDelta {
    pub social: i32,
    pub physical: i32,
    pub environmental: i32,
    pub psychological: i32,
}

impl FactorDelta {
    pub fn get(&self, dimension: Dimension) -> i32 {
        match dimension {
            Dimension::Social => self.social,
            Dimension::Physical => self.physical,
            Dimension::Environmental => self.environmental,
            Dimension::Psychological => self.psychological,
        }
    }

    pub fn scaled(&self, factor: i32) -> Self {
        Self {
            social: self.social * factor,
            physical: self.physical * factor,
            environmental: self.environmental * factor,
            psychological: self.psychological * factor,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Dimension, i32)> + '_ {
        Dimension::ALL
            .into_iter()
            .map(move |dimension| (dimension, self.get(dimension)))
    }
}

/// Per-bench effect on each factor. Environmental is negative: more street
/// furniture lowers perceived safety.
pub const BENCH_EFFECTS: FactorDelta = FactorDelta {
    social: 2,
    physical: 1,
    environmental: -1,
    psychological: 1,
};

/// Weight of each dimension in the composite score.
pub const DIMENSION_WEIGHTS: FactorDelta = FactorDelta {
    social: 2,
    physical: 1,
    environmental: 2,
    psychological: 1,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeightedOutcome {
    pub contributions: BTreeMap<Dimension, i32>,
    pub total: i32,
}

impl WeightedOutcome {
    pub fn contribution(&self, dimension: Dimension) -> i32 {
        self.contributions.get(&dimension).copied().unwrap_or(0)
    }
}

/// Factor deltas for `magnitude` benches; out-of-range input is clamped.
pub fn propagate(magnitude: i32) -> FactorDelta {
    BENCH_EFFECTS.scaled(clamp_magnitude(magnitude))
}

/// Weighted composite of `deltas`. Unbounded; gauges clamp on their side.
pub fn score(deltas: &FactorDelta) -> WeightedOutcome {
    let contributions: BTreeMap<Dimension, i32> = deltas
        .iter()
        .map(|(dimension, delta)| (dimension, DIMENSION_WEIGHTS.get(dimension) * delta))
        .collect();
    let total = contributions.values().sum();
    WeightedOutcome {
        contributions,
        total,
    }
}

/// Largest composite magnitude reachable within the magnitude bounds.
pub fn gauge_bound() -> i32 {
    let per_unit = score(&BENCH_EFFECTS).total.abs();
    (per_unit * MAX_MAGNITUDE.max(MIN_MAGNITUDE.abs())).max(1)
}

/// One evaluated interaction of the scenario sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioRun {
    pub state: InterventionState,
    pub deltas: FactorDelta,
    pub outcome: WeightedOutcome,
}

impl ScenarioRun {
    pub fn evaluate(state: InterventionState) -> Self {
        let deltas = propagate(state.magnitude());
        let outcome = score(&deltas);
        tracing::debug!(
            target: "qol::scenario",
            magnitude = state.magnitude(),
            total = outcome.total,
            "scenario.evaluated"
        );
        Self {
            state,
            deltas,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_benches() {
        let deltas = propagate(3);
        assert_eq!(
            deltas,
            FactorDelta {
                social: 6,
                physical: 3,
                environmental: -3,
                psychological: 3,
            }
        );
        let outcome = score(&deltas);
        assert_eq!(outcome.total, 12);
        assert_eq!(outcome.contribution(Dimension::Social), 12);
        assert_eq!(outcome.contribution(Dimension::Environmental), -6);
    }

    #[test]
    fn zero_is_neutral() {
        let deltas = propagate(0);
        assert_eq!(deltas, FactorDelta::default());
        assert_eq!(score(&deltas).total, 0);
    }

    #[test]
    fn magnitude_is_clamped() {
        assert_eq!(propagate(25), propagate(10));
        assert_eq!(propagate(i32::MIN), propagate(-10));
        assert_eq!(InterventionState::new(-40).magnitude(), -10);
    }

    #[test]
    fn state_steps_stay_in_bounds() {
        let mut state = InterventionState::new(9);
        state.increment();
        state.increment();
        assert_eq!(state.magnitude(), 10);
        state.set(-10);
        state.decrement();
        assert_eq!(state.magnitude(), -10);
        state.reset();
        assert_eq!(state.magnitude(), 0);
    }

    #[test]
    fn gauge_bound_covers_extremes() {
        assert_eq!(gauge_bound(), 40);
        assert!(score(&propagate(10)).total.abs() <= gauge_bound());
        assert!(score(&propagate(-10)).total.abs() <= gauge_bound());
    }

    #[test]
    fn dimensions_parse_case_insensitively() {
        assert_eq!(Dimension::parse(" social "), Some(Dimension::Social));
        assert_eq!(Dimension::parse("PSYCHOLOGICAL"), Some(Dimension::Psychological));
        assert_eq!(Dimension::parse("Economic"), None);
    }

    #[test]
    fn evaluate_is_reproducible() {
        let state = InterventionState::new(-4);
        assert_eq!(ScenarioRun::evaluate(state), ScenarioRun::evaluate(state));
        assert_eq!(ScenarioRun::evaluate(state).outcome.total, -16);
    }
}
