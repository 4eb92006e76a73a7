//! # Cell Display
//!
//! Text shown for a cell in a formatted column. Display only: filtering,
//! faceting and sorting always use the raw stringification.

use crate::sort::parse_timestamp;
use crate::{CellValue, ColumnFormat};
use chrono::{DateTime, Utc};

/// Render a cell for display.
///
/// | format   | rendering                                  |
/// |----------|--------------------------------------------|
/// | currency | `1,234.50`                                 |
/// | number   | `1,234.5` (fraction kept as is)            |
/// | percent  | `12.50%`                                   |
/// | boolean  | `Yes` / `No`                               |
/// | date     | `YYYY-MM-DD`, unparsable text verbatim     |
///
/// Values that do not fit the format fall back to plain text.
#[must_use]
pub fn format_cell(value: &CellValue, format: Option<ColumnFormat>) -> String {
    if value.is_null() {
        return String::new();
    }
    let Some(format) = format else {
        return value.to_string();
    };
    match format {
        ColumnFormat::Currency => value
            .as_number()
            .map_or_else(|| value.to_string(), |n| group_thousands(&format!("{n:.2}"))),
        ColumnFormat::Number => value
            .as_number()
            .map_or_else(|| value.to_string(), |n| group_thousands(&n.to_string())),
        ColumnFormat::Percent => value
            .as_number()
            .map_or_else(|| value.to_string(), |n| format!("{n:.2}%")),
        ColumnFormat::Boolean => match value {
            CellValue::Bool(b) => yes_no(*b).to_string(),
            CellValue::Text(s) if s.eq_ignore_ascii_case("true") => yes_no(true).to_string(),
            CellValue::Text(s) if s.eq_ignore_ascii_case("false") => yes_no(false).to_string(),
            other => other.to_string(),
        },
        ColumnFormat::Date => format_date(value),
    }
}

const fn yes_no(b: bool) -> &'static str {
    if b { "Yes" } else { "No" }
}

fn format_date(value: &CellValue) -> String {
    let millis = match value {
        CellValue::Number(n) if n.is_finite() => Some(*n as i64),
        CellValue::Text(s) => parse_timestamp(s),
        _ => None,
    };
    millis
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map_or_else(|| value.to_string(), |dt| dt.format("%Y-%m-%d").to_string())
}

/// Insert `,` between thousands groups of the integer part.
fn group_thousands(plain: &str) -> String {
    let (sign, rest) = plain
        .strip_prefix('-')
        .map_or(("", plain), |rest| ("-", rest));
    let (int_part, frac_part) = rest.split_once('.').map_or((rest, None), |(i, f)| (i, Some(f)));

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(plain.len().saturating_add(digits.len() / 3));
    grouped.push_str(sign);
    for (i, ch) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}
