use proptest::prelude::*;
use qol_core::scenario::{clamp_magnitude, MAX_MAGNITUDE, MIN_MAGNITUDE};
use qol_core::{gauge_bound, propagate, score, Dimension, InterventionState, ScenarioRun};

proptest! {
    #[test]
    fn deltas_scale_linearly_with_magnitude(magnitude in MIN_MAGNITUDE..=MAX_MAGNITUDE) {
        let unit = propagate(1);
        let deltas = propagate(magnitude);
        for dimension in Dimension::ALL {
            prop_assert_eq!(deltas.get(dimension), unit.get(dimension) * magnitude);
        }
    }

    #[test]
    fn removing_benches_mirrors_adding_them(magnitude in 0..=MAX_MAGNITUDE) {
        prop_assert_eq!(propagate(-magnitude), propagate(magnitude).scaled(-1));
        prop_assert_eq!(score(&propagate(-magnitude)).total, -score(&propagate(magnitude)).total);
    }

    #[test]
    fn out_of_range_magnitudes_clamp(magnitude in any::<i32>()) {
        prop_assert_eq!(propagate(magnitude), propagate(clamp_magnitude(magnitude)));
        let total = score(&propagate(magnitude)).total;
        prop_assert!(total.abs() <= gauge_bound());
    }

    #[test]
    fn total_is_sum_of_contributions(magnitude in MIN_MAGNITUDE..=MAX_MAGNITUDE) {
        let outcome = score(&propagate(magnitude));
        let sum: i32 = Dimension::ALL.into_iter().map(|d| outcome.contribution(d)).sum();
        prop_assert_eq!(outcome.total, sum);
    }

    #[test]
    fn state_steps_never_leave_bounds(steps in proptest::collection::vec(prop_oneof![Just(1i8), Just(-1i8), Just(0i8)], 0..64)) {
        let mut state = InterventionState::default();
        for step in steps {
            match step {
                1 => state.increment(),
                -1 => state.decrement(),
                _ => state.reset(),
            }
            prop_assert!((MIN_MAGNITUDE..=MAX_MAGNITUDE).contains(&state.magnitude()));
            let run = ScenarioRun::evaluate(state);
            prop_assert_eq!(run.deltas, propagate(state.magnitude()));
        }
    }
}
