//! Plain-text renderings shared by the one-shot subcommands and the sandbox.

use std::fmt::Write as _;

use crossterm::style::{Color, Stylize};
use qol_core::{
    gauge_bound, Comparison, Dimension, Group, GroupConfig, IndicatorCatalog, ScenarioRun,
};

/// One bar of the comparison chart, measured in character cells.
#[derive(Debug, Clone, PartialEq)]
pub struct BarRow {
    pub label: String,
    pub group: Group,
    pub filled: usize,
    pub value_text: String,
}

/// Bars for every row plus the reference marker column, if any.
pub fn bar_rows(comparison: &Comparison, width: usize) -> (Vec<BarRow>, Option<usize>) {
    let cells = |value: f64| (comparison.axis_fraction(value) * width as f64).round() as usize;
    let rows = comparison
        .rows
        .iter()
        .map(|row| BarRow {
            label: row.display_name.clone(),
            group: row.group,
            filled: cells(row.value).min(width),
            value_text: comparison.format(Some(row.value)),
        })
        .collect();
    let marker = comparison.reference.map(|value| cells(value).min(width.saturating_sub(1)));
    (rows, marker)
}

/// Bar cells with the reference marker overlaid.
pub fn bar_cells(row: &BarRow, width: usize, marker: Option<usize>) -> String {
    (0..width)
        .map(|idx| match (Some(idx) == marker, idx < row.filled) {
            (true, _) => '│',
            (false, true) => '█',
            (false, false) => ' ',
        })
        .collect()
}

pub struct ChartStyle<'a> {
    pub groups: &'a GroupConfig,
    pub reference_label: &'a str,
    pub bar_width: usize,
    pub show_labels: bool,
    pub color: bool,
}

pub fn render_comparison(comparison: &Comparison, style: &ChartStyle<'_>) -> String {
    let (rows, marker) = bar_rows(comparison, style.bar_width);
    let name_width = rows.iter().map(|row| row.label.chars().count()).max().unwrap_or(0);

    let mut out = String::new();
    let _ = writeln!(out, "{}", comparison.definition.axis_label());
    for row in &rows {
        let bar = bar_cells(row, style.bar_width, marker);
        let bar = if style.color {
            bar.with(group_color(row.group)).to_string()
        } else {
            bar
        };
        if style.show_labels {
            let _ = writeln!(out, "{:<name_width$} {bar} {}", row.label, row.value_text);
        } else {
            let _ = writeln!(out, "{:<name_width$} {bar}", row.label);
        }
    }

    let _ = writeln!(
        out,
        "█ {}   █ {}   │ {}: {}",
        Group::A.legend(style.groups),
        Group::B.legend(style.groups),
        style.reference_label,
        comparison.format(comparison.reference)
    );
    out.push('\n');

    let _ = writeln!(out, "{:<name_width$}  group  value", "neighbourhood");
    for row in &comparison.rows {
        let _ = writeln!(
            out,
            "{:<name_width$}  {:<5}  {}",
            row.name,
            row.group.letter(),
            comparison.format(Some(row.value))
        );
    }
    out
}

fn group_color(group: Group) -> Color {
    match group {
        Group::A => Color::DarkRed,
        Group::B => Color::Red,
    }
}

pub fn render_catalog(catalog: &IndicatorCatalog) -> String {
    let mut out = String::new();
    for dimension in catalog.dimensions() {
        let _ = writeln!(out, "{dimension}");
        for label in catalog.labels_for(dimension) {
            let unit = catalog
                .lookup(dimension, label)
                .and_then(|definition| definition.display_unit())
                .map(|unit| format!(" [{unit}]"))
                .unwrap_or_default();
            let _ = writeln!(out, "  {label}{unit}");
        }
    }
    out
}

pub fn render_scenario(run: &ScenarioRun) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "benches: {:+}", run.state.magnitude());
    let _ = writeln!(out, "{:<14} {:>6} {:>13}", "dimension", "delta", "contribution");
    for dimension in Dimension::ALL {
        let _ = writeln!(
            out,
            "{:<14} {:>+6} {:>+13}",
            dimension.label(),
            run.deltas.get(dimension),
            run.outcome.contribution(dimension)
        );
    }
    let _ = writeln!(out, "total: {:+} (gauge ±{})", run.outcome.total, gauge_bound());
    out
}
