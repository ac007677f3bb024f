//! Value classification for choropleth and chart colouring.
//!
//! A [`ClassificationScale`] is built once from every reading being compared
//! (neighbourhoods plus the municipal reference) so that equal readings always
//! land in the same class, whichever entity holds them. Nothing in this module
//! fails: empty input falls back to `[0, 1]`, a zero-width range is widened,
//! out-of-range readings are clamped and missing readings map to
//! [`Classification::NoData`].

use serde::{Deserialize, Serialize};

use crate::reading::finite_values;

/// Half-width applied around a single repeated reading.
pub const DEGENERATE_HALF_WIDTH: f64 = 0.5;
/// Minimal gap inserted between boundaries that tie.
pub const BOUNDARY_EPSILON: f64 = 1e-9;
/// Range used when there is nothing to measure.
pub const EMPTY_RANGE: (f64, f64) = (0.0, 1.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Binning {
    EqualInterval,
    Quantile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    Continuous,
    Discrete { classes: usize, binning: Binning },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassificationScale {
    Continuous { min: f64, max: f64 },
    /// `k + 1` strictly increasing boundaries for `k` classes.
    Discrete { boundaries: Vec<f64> },
}

impl ClassificationScale {
    pub fn min(&self) -> f64 {
        match self {
            Self::Continuous { min, .. } => *min,
            Self::Discrete { boundaries } => boundaries.first().copied().unwrap_or(EMPTY_RANGE.0),
        }
    }

    pub fn max(&self) -> f64 {
        match self {
            Self::Continuous { max, .. } => *max,
            Self::Discrete { boundaries } => boundaries.last().copied().unwrap_or(EMPTY_RANGE.1),
        }
    }

    /// Number of discrete classes; `None` for a continuous scale.
    pub fn class_count(&self) -> Option<usize> {
        match self {
            Self::Continuous { .. } => None,
            Self::Discrete { boundaries } => Some(boundaries.len().saturating_sub(1).max(1)),
        }
    }

    pub fn boundaries(&self) -> Option<&[f64]> {
        match self {
            Self::Continuous { .. } => None,
            Self::Discrete { boundaries } => Some(boundaries),
        }
    }
}

/// Result of classifying one reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Classification {
    NoData,
    /// Position within a continuous scale, always in `[0, 1]`.
    Position(f64),
    /// Bin index within a discrete scale.
    Class(usize),
}

impl Classification {
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData)
    }
}

/// Min and max over finite readings, widened when they coincide.
pub fn value_range(values: &[Option<f64>]) -> (f64, f64) {
    let finite = finite_values(values);
    if finite.is_empty() {
        return EMPTY_RANGE;
    }
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        (min - DEGENERATE_HALF_WIDTH, max + DEGENERATE_HALF_WIDTH)
    } else {
        (min, max)
    }
}

pub fn build_scale(values: &[Option<f64>], mode: ColorMode) -> ClassificationScale {
    match mode {
        ColorMode::Continuous => {
            let (min, max) = value_range(values);
            ClassificationScale::Continuous { min, max }
        }
        ColorMode::Discrete { classes, binning } => ClassificationScale::Discrete {
            boundaries: discrete_boundaries(values, classes.max(1), binning),
        },
    }
}

fn discrete_boundaries(values: &[Option<f64>], classes: usize, binning: Binning) -> Vec<f64> {
    let mut sorted = finite_values(values);
    sorted.sort_by(f64::total_cmp);
    let mut distinct = sorted.clone();
    distinct.dedup();

    let mut boundaries = match binning {
        Binning::Quantile if !sorted.is_empty() && distinct.len() >= classes => {
            let mut quantiles: Vec<f64> = (0..=classes)
                .map(|step| quantile(&sorted, step as f64 / classes as f64))
                .collect();
            enforce_strictly_increasing(&mut quantiles);
            quantiles
        }
        Binning::Quantile => {
            tracing::debug!(
                target: "qol::classify",
                distinct = distinct.len(),
                classes,
                "quantile.fallback=equal_interval"
            );
            equal_interval(value_range(values), classes)
        }
        Binning::EqualInterval => equal_interval(value_range(values), classes),
    };

    round_for_display(&mut boundaries);
    enforce_strictly_increasing(&mut boundaries);
    boundaries
}

fn equal_interval((min, max): (f64, f64), classes: usize) -> Vec<f64> {
    (0..=classes)
        .map(|idx| {
            if idx == classes {
                max
            } else {
                lerp(min, max, idx as f64 / classes as f64)
            }
        })
        .collect()
}

/// Interpolates without forming `max - min`, which overflows for extreme readings.
fn lerp(min: f64, max: f64, t: f64) -> f64 {
    min * (1.0 - t) + max * t
}

/// Linear-interpolation quantile over sorted input.
fn quantile(sorted: &[f64], level: f64) -> f64 {
    let last = sorted.len() - 1;
    let position = level.clamp(0.0, 1.0) * last as f64;
    let lower = (position.floor() as usize).min(last);
    let upper = (lower + 1).min(last);
    let fraction = position - lower as f64;
    lerp(sorted[lower], sorted[upper], fraction)
}

/// Spans of 100 or more round to integers, 10 or more to one decimal,
/// anything narrower to two. The outer boundaries round outwards so every
/// observed reading stays inside the scale.
fn round_for_display(boundaries: &mut [f64]) {
    let (Some(&first), Some(&last)) = (boundaries.first(), boundaries.last()) else {
        return;
    };
    let span = (last - first).abs();
    let decimals = if span >= 100.0 {
        0
    } else if span >= 10.0 {
        1
    } else {
        2
    };
    let factor = 10f64.powi(decimals);
    let end = boundaries.len() - 1;
    for (idx, boundary) in boundaries.iter_mut().enumerate() {
        *boundary = if idx == 0 {
            scaled(*boundary, factor, f64::floor).min(first)
        } else if idx == end {
            scaled(*boundary, factor, f64::ceil).max(last)
        } else {
            scaled(*boundary, factor, f64::round)
        };
    }
}

fn scaled(value: f64, factor: f64, op: fn(f64) -> f64) -> f64 {
    let magnified = value * factor;
    if magnified.is_finite() {
        op(magnified) / factor
    } else {
        value
    }
}

fn enforce_strictly_increasing(boundaries: &mut [f64]) {
    for idx in 1..boundaries.len() {
        if boundaries[idx] <= boundaries[idx - 1] {
            boundaries[idx] = nudge_above(boundaries[idx - 1]);
        }
    }
}

fn nudge_above(value: f64) -> f64 {
    let candidate = value + BOUNDARY_EPSILON;
    if candidate > value {
        candidate
    } else {
        next_representable(value)
    }
}

fn next_representable(value: f64) -> f64 {
    if value.is_nan() || value == f64::INFINITY {
        return value;
    }
    if value == 0.0 {
        return f64::from_bits(1);
    }
    let bits = value.to_bits();
    if value > 0.0 {
        f64::from_bits(bits + 1)
    } else {
        f64::from_bits(bits - 1)
    }
}

pub fn classify(value: Option<f64>, scale: &ClassificationScale) -> Classification {
    let Some(value) = value.filter(|v| v.is_finite()) else {
        return Classification::NoData;
    };
    match scale {
        ClassificationScale::Continuous { min, max } => {
            let position = if (max - min).is_finite() {
                (value - min) / (max - min)
            } else {
                (value / 2.0 - min / 2.0) / (max / 2.0 - min / 2.0)
            };
            if position.is_nan() {
                Classification::Position(0.0)
            } else {
                Classification::Position(position.clamp(0.0, 1.0))
            }
        }
        ClassificationScale::Discrete { boundaries } => {
            let classes = boundaries.len().saturating_sub(1).max(1);
            // Count of boundaries at or below the reading; the top bin is closed.
            let at_or_below = boundaries.partition_point(|boundary| *boundary <= value);
            Classification::Class(at_or_below.saturating_sub(1).min(classes - 1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discrete(classes: usize, binning: Binning) -> ColorMode {
        ColorMode::Discrete { classes, binning }
    }

    fn readings(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn equal_interval_small_example() {
        let scale = build_scale(&readings(&[10.0, 20.0, 30.0]), discrete(2, Binning::EqualInterval));
        assert_eq!(scale.boundaries(), Some(&[10.0, 20.0, 30.0][..]));
        assert_eq!(classify(Some(15.0), &scale), Classification::Class(0));
        assert_eq!(classify(Some(20.0), &scale), Classification::Class(1));
        assert_eq!(classify(Some(25.0), &scale), Classification::Class(1));
        assert_eq!(classify(Some(30.0), &scale), Classification::Class(1));
    }

    #[test]
    fn out_of_range_readings_clamp_to_edge_classes() {
        let scale = build_scale(&readings(&[10.0, 20.0, 30.0]), discrete(2, Binning::EqualInterval));
        assert_eq!(classify(Some(-100.0), &scale), Classification::Class(0));
        assert_eq!(classify(Some(1e6), &scale), Classification::Class(1));
    }

    #[test]
    fn continuous_scale_widens_single_value() {
        let scale = build_scale(&readings(&[4.0, 4.0]), ColorMode::Continuous);
        assert_eq!(scale, ClassificationScale::Continuous { min: 3.5, max: 4.5 });
        assert_eq!(classify(Some(4.0), &scale), Classification::Position(0.5));
    }

    #[test]
    fn continuous_positions_clamp() {
        let scale = build_scale(&readings(&[0.0, 10.0]), ColorMode::Continuous);
        assert_eq!(classify(Some(-5.0), &scale), Classification::Position(0.0));
        assert_eq!(classify(Some(2.5), &scale), Classification::Position(0.25));
        assert_eq!(classify(Some(50.0), &scale), Classification::Position(1.0));
    }

    #[test]
    fn empty_input_uses_unit_range() {
        let scale = build_scale(&[None, Some(f64::NAN)], ColorMode::Continuous);
        assert_eq!(scale, ClassificationScale::Continuous { min: 0.0, max: 1.0 });

        let scale = build_scale(&[], discrete(4, Binning::Quantile));
        assert_eq!(scale.boundaries(), Some(&[0.0, 0.25, 0.5, 0.75, 1.0][..]));
    }

    #[test]
    fn missing_maps_to_no_data() {
        let scale = build_scale(&readings(&[1.0, 2.0]), discrete(3, Binning::EqualInterval));
        assert!(classify(None, &scale).is_no_data());
        assert!(classify(Some(f64::INFINITY), &scale).is_no_data());
    }

    #[test]
    fn quantile_boundaries_follow_observations() {
        let values = readings(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        let scale = build_scale(&values, discrete(4, Binning::Quantile));
        assert_eq!(scale.boundaries(), Some(&[1.0, 3.0, 5.0, 7.0, 9.0][..]));
    }

    #[test]
    fn quantile_ties_are_nudged_apart() {
        let values = readings(&[1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 3.0]);
        let scale = build_scale(&values, discrete(3, Binning::Quantile));
        let boundaries = scale.boundaries().expect("discrete");
        assert_eq!(boundaries.len(), 4);
        assert!(boundaries.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(boundaries[0], 1.0);
        assert_eq!(classify(Some(1.0), &scale), Classification::Class(0));
        assert_eq!(classify(Some(3.0), &scale), Classification::Class(2));
    }

    #[test]
    fn quantile_falls_back_when_too_few_distinct_values() {
        let values = readings(&[5.0, 5.0, 6.0]);
        let quantile = build_scale(&values, discrete(5, Binning::Quantile));
        let equal = build_scale(&values, discrete(5, Binning::EqualInterval));
        assert_eq!(quantile, equal);
    }

    #[test]
    fn boundaries_round_by_span() {
        let wide = build_scale(&readings(&[0.0, 1000.0]), discrete(3, Binning::EqualInterval));
        assert_eq!(wide.boundaries(), Some(&[0.0, 333.0, 667.0, 1000.0][..]));

        let medium = build_scale(&readings(&[0.0, 10.0]), discrete(3, Binning::EqualInterval));
        assert_eq!(medium.boundaries(), Some(&[0.0, 3.3, 6.7, 10.0][..]));

        let narrow = build_scale(&readings(&[0.0, 1.0]), discrete(3, Binning::EqualInterval));
        assert_eq!(narrow.boundaries(), Some(&[0.0, 0.33, 0.67, 1.0][..]));
    }

    #[test]
    fn rounding_never_collapses_boundaries() {
        let values = readings(&[0.0, 0.001, 0.002, 0.003, 0.004, 0.005]);
        let scale = build_scale(&values, discrete(5, Binning::Quantile));
        let boundaries = scale.boundaries().expect("discrete");
        assert_eq!(boundaries.len(), 6);
        assert!(boundaries.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn nudge_handles_large_magnitudes() {
        let big = 1e18;
        assert!(nudge_above(big) > big);
        assert!(nudge_above(-big) > -big);
        assert!(nudge_above(0.0) > 0.0);
    }

    #[test]
    fn outer_boundaries_round_outwards() {
        let values = readings(&[0.006, 0.5, 0.994]);
        for binning in [Binning::EqualInterval, Binning::Quantile] {
            let scale = build_scale(&values, discrete(2, binning));
            assert_eq!(scale.boundaries(), Some(&[0.0, 0.5, 1.0][..]));
            assert_eq!(classify(Some(0.006), &scale), Classification::Class(0));
            assert_eq!(classify(Some(0.994), &scale), Classification::Class(1));
        }
    }

    #[test]
    fn extreme_readings_keep_boundaries_increasing() {
        let values = readings(&[-f64::MAX, f64::MAX]);
        let scale = build_scale(&values, discrete(3, Binning::EqualInterval));
        let boundaries = scale.boundaries().expect("discrete");
        assert!(boundaries.iter().all(|boundary| boundary.is_finite()));
        assert!(boundaries.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(boundaries[0], -f64::MAX);
        assert_eq!(boundaries[3], f64::MAX);
        assert_eq!(classify(Some(0.0), &scale), Classification::Class(1));

        let continuous = build_scale(&values, ColorMode::Continuous);
        assert_eq!(classify(Some(0.0), &continuous), Classification::Position(0.5));
    }

    #[test]
    fn zero_classes_behaves_as_one() {
        let scale = build_scale(&readings(&[2.0, 8.0]), discrete(0, Binning::EqualInterval));
        assert_eq!(scale.class_count(), Some(1));
        assert_eq!(classify(Some(8.0), &scale), Classification::Class(0));
    }
}
