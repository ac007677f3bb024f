//! Neighbourhood-versus-municipality comparison behind the dashboard chart.

use std::{fmt, str::FromStr};

use serde::Serialize;
use thiserror::Error;

use crate::{
    catalog::IndicatorDefinition,
    config::GroupConfig,
    geo::RegionLayer,
    reading::{display_decimals, format_reading},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SortOrder {
    #[default]
    Descending,
    Ascending,
    Alphabetical,
}

impl SortOrder {
    pub const ALL: [SortOrder; 3] = [
        SortOrder::Descending,
        SortOrder::Ascending,
        SortOrder::Alphabetical,
    ];

    pub fn next(self) -> Self {
        match self {
            SortOrder::Descending => SortOrder::Ascending,
            SortOrder::Ascending => SortOrder::Alphabetical,
            SortOrder::Alphabetical => SortOrder::Descending,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortOrder::Descending => "descending",
            SortOrder::Ascending => "ascending",
            SortOrder::Alphabetical => "alphabetical",
        })
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortOrder::ALL
            .into_iter()
            .find(|order| order.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown sort order '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Group {
    A,
    B,
}

impl Group {
    pub fn for_name(name: &str, groups: &GroupConfig) -> Self {
        let key = name.trim().to_lowercase();
        if groups
            .primary_names
            .iter()
            .any(|candidate| candidate.trim().to_lowercase() == key)
        {
            Group::A
        } else {
            Group::B
        }
    }

    pub fn letter(self) -> &'static str {
        match self {
            Group::A => "A",
            Group::B => "B",
        }
    }

    pub fn legend(self, groups: &GroupConfig) -> &str {
        match self {
            Group::A => &groups.primary_label,
            Group::B => &groups.secondary_label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub name: String,
    pub display_name: String,
    pub group: Group,
    pub value: f64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComparisonError {
    #[error("column `{0}` not found in neighbourhoods table")]
    UnknownColumn(String),
    #[error("all values are missing for `{0}`")]
    AllMissing(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub definition: IndicatorDefinition,
    pub rows: Vec<ComparisonRow>,
    pub reference: Option<f64>,
    pub decimals: usize,
    pub axis: (f64, f64),
}

impl Comparison {
    pub fn build(
        layer: &RegionLayer,
        reference: Option<f64>,
        definition: &IndicatorDefinition,
        groups: &GroupConfig,
        order: SortOrder,
        headroom: f64,
    ) -> Result<Self, ComparisonError> {
        let column = &definition.column_key;
        if !layer.has_column(column) {
            return Err(ComparisonError::UnknownColumn(column.clone()));
        }

        let mut rows: Vec<ComparisonRow> = layer
            .values_for(column)
            .into_iter()
            .filter_map(|entry| {
                let value = entry.value?;
                let group = Group::for_name(&entry.entity_name, groups);
                Some(ComparisonRow {
                    display_name: format!("{} ({})", entry.entity_name, group.letter()),
                    name: entry.entity_name,
                    group,
                    value,
                })
            })
            .collect();
        if rows.is_empty() {
            return Err(ComparisonError::AllMissing(column.clone()));
        }
        sort_rows(&mut rows, order);

        let reference = reference.filter(|value| value.is_finite());
        let values: Vec<Option<f64>> = rows.iter().map(|row| Some(row.value)).collect();
        Ok(Self {
            definition: definition.clone(),
            decimals: display_decimals(&values),
            axis: axis_bounds(&rows, reference, headroom),
            rows,
            reference,
        })
    }

    pub fn resort(&mut self, order: SortOrder) {
        sort_rows(&mut self.rows, order);
    }

    pub fn format(&self, value: Option<f64>) -> String {
        format_reading(value, self.decimals)
    }

    /// Fraction of the axis span covered from the lower bound to `value`.
    pub fn axis_fraction(&self, value: f64) -> f64 {
        let (lower, upper) = self.axis;
        let span = upper - lower;
        if span > 0.0 {
            ((value - lower) / span).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

fn sort_rows(rows: &mut [ComparisonRow], order: SortOrder) {
    match order {
        SortOrder::Descending => rows.sort_by(|a, b| b.value.total_cmp(&a.value)),
        SortOrder::Ascending => rows.sort_by(|a, b| a.value.total_cmp(&b.value)),
        SortOrder::Alphabetical => rows.sort_by(|a, b| a.display_name.cmp(&b.display_name)),
    }
}

/// Axis from `min(0, vmin, reference)` to the largest value plus headroom.
fn axis_bounds(rows: &[ComparisonRow], reference: Option<f64>, headroom: f64) -> (f64, f64) {
    let vmax = rows.iter().map(|row| row.value).fold(f64::NEG_INFINITY, f64::max);
    let vmin = rows.iter().map(|row| row.value).fold(f64::INFINITY, f64::min);
    let xmax = reference.map_or(vmax, |value| vmax.max(value));
    let pad = if xmax > 0.0 { headroom * xmax } else { 1.0 };
    let lower = 0f64.min(vmin).min(reference.unwrap_or(0.0));
    (lower, xmax + pad)
}
