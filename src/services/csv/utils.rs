use crate::models::CellValue;
use std::collections::HashSet;

/// Missing-value markers written by common CSV producers. Free-text
/// placeholders such as "n/a" or "-" are ordinary text.
pub const NULL_SENTINELS: &[&str] = &["NaN", "nan", "NULL", "null", "None", "<NA>", "#N/A"];

pub fn is_null_field(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || NULL_SENTINELS.contains(&trimmed)
}

/// Parses a finite number from a trimmed field. Integers that fit an `i64`
/// come back as `CellValue::Integer` so they never lose precision.
pub fn parse_number(raw: &str) -> Option<CellValue> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(CellValue::Integer(i));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(CellValue::Number)
}

/// Share of non-null values that parse as numbers, as `(valid, non_null)`.
/// `None` when there is nothing to score.
pub fn numeric_parse_counts<'a, I>(values: I) -> Option<(usize, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let (valid, non_null) = values
        .into_iter()
        .fold((0, 0), |(valid, total), value| {
            let parsed = parse_number(value).is_some() as usize;
            (valid + parsed, total + 1)
        });

    if non_null == 0 {
        None
    } else {
        Some((valid, non_null))
    }
}

pub fn unique_column_name(name: &str, position: usize, existing_names: &mut HashSet<String>) -> String {
    let base_name = if name.trim().is_empty() {
        format!("column_{}", position + 1)
    } else {
        name.to_string()
    };

    // If the name already exists, add a numeric suffix
    let mut cleaned = base_name.clone();
    let mut counter = 1;
    while !existing_names.insert(cleaned.clone()) {
        cleaned = format!("{}_{}", base_name, counter);
        counter += 1;
    }

    cleaned
}

pub fn update_min_max(min_max: &mut (Option<String>, Option<String>), value: &str) {
    match &min_max.0 {
        Some(min_val) if value < min_val.as_str() => min_max.0 = Some(value.to_string()),
        None => min_max.0 = Some(value.to_string()),
        _ => {}
    }

    match &min_max.1 {
        Some(max_val) if value > max_val.as_str() => min_max.1 = Some(value.to_string()),
        None => min_max.1 = Some(value.to_string()),
        _ => {}
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round2(part as f64 / whole as f64 * 100.0)
    }
}
