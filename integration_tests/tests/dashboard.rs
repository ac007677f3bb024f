mod common;

use qol_core::{Comparison, ComparisonError, Group, SortOrder};

fn build(label: &str, order: SortOrder) -> anyhow::Result<Result<Comparison, ComparisonError>> {
    let bundle = common::load_fixture_bundle()?;
    let config = common::config();
    let definition = bundle
        .catalog
        .iter()
        .find(|definition| definition.label == label)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("no indicator {label}"))?;
    Ok(Comparison::build(
        &bundle.neighbourhoods,
        bundle.municipal_reference(&definition.column_key),
        &definition,
        config.groups(),
        order,
        config.chart().headroom(),
    ))
}

#[test]
fn missing_readings_are_dropped_from_the_chart() -> anyhow::Result<()> {
    let comparison = build("Volunteer work", SortOrder::Descending)??;
    let names: Vec<&str> = comparison.rows.iter().map(|row| row.display_name.as_str()).collect();
    assert_eq!(names, vec!["De Burgen (A)", "De Horsten (A)", "Rietkampen (B)"]);
    assert_eq!(comparison.rows[0].group, Group::A);
    assert_eq!(comparison.reference, Some(20.0));
    assert_eq!(comparison.format(comparison.reference), "20.00");
    Ok(())
}

#[test]
fn large_values_format_without_decimals() -> anyhow::Result<()> {
    let comparison = build("Residents", SortOrder::Ascending)??;
    assert_eq!(comparison.decimals, 0);
    assert_eq!(comparison.format(comparison.reference), "118,000");
    let values: Vec<f64> = comparison.rows.iter().map(|row| row.value).collect();
    assert_eq!(values, vec![150.0, 800.0, 1200.0]);
    // The reference dwarfs every neighbourhood, so the axis follows it.
    assert!(comparison.axis.1 > 118_000.0);
    Ok(())
}

#[test]
fn unknown_column_is_reported() -> anyhow::Result<()> {
    let err = build("Unknown column", SortOrder::Descending)?.unwrap_err();
    assert_eq!(err, ComparisonError::UnknownColumn("not_in_layer".to_string()));
    Ok(())
}
