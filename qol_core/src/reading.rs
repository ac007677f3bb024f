use serde::Serialize;
use serde_json::Value;

/// One entity's reading for a single indicator column.
///
/// `value` is `None` when the source carried nothing that parses as a finite
/// number. Missing readings are skipped by scale building but kept for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityValue {
    pub entity_name: String,
    pub value: Option<f64>,
}

impl EntityValue {
    pub fn new(entity_name: impl Into<String>, value: Option<f64>) -> Self {
        Self {
            entity_name: entity_name.into(),
            value,
        }
    }

    pub fn is_missing(&self) -> bool {
        self.value.is_none()
    }
}

/// Coerce a raw property into a reading. Numbers and numeric strings parse;
/// anything else, or a non-finite result, is missing.
pub fn parse_reading(raw: Option<&Value>) -> Option<f64> {
    let value = match raw? {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

/// Finite readings only, in input order.
pub fn finite_values<'a, I>(values: I) -> Vec<f64>
where
    I: IntoIterator<Item = &'a Option<f64>>,
{
    values
        .into_iter()
        .filter_map(|value| value.filter(|v| v.is_finite()))
        .collect()
}

/// 0 decimals once the largest reading reaches 100, otherwise 2.
pub fn display_decimals<'a, I>(values: I) -> usize
where
    I: IntoIterator<Item = &'a Option<f64>>,
{
    let max = finite_values(values).into_iter().fold(None, |acc: Option<f64>, v| {
        Some(acc.map_or(v, |current| current.max(v)))
    });
    match max {
        Some(max) if max >= 100.0 => 0,
        _ => 2,
    }
}

/// Render a reading with `,` thousands separators; missing renders as `n/a`.
pub fn format_reading(value: Option<f64>, decimals: usize) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(value) => group_thousands(&format!("{:.*}", decimals, value)),
        None => "n/a".to_string(),
    }
}

fn group_thousands(fixed: &str) -> String {
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed),
    };
    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (idx, ch) in integer.chars().enumerate() {
        if idx > 0 && (integer.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let mut out = String::from(sign);
    out.push_str(&grouped);
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(fraction);
    }
    out
}
