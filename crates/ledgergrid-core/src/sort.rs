//! # Sort Engine
//!
//! Stable, type-aware sort on a single column.
//!
//! ## Comparator policy
//!
//! - Nulls sort after every non-null value in both directions; direction only
//!   flips the order among non-null values.
//! - Two numbers compare numerically.
//! - In a `date` column values compare as timestamps; unparsable dates count
//!   as epoch 0.
//! - Everything else compares as case-insensitive strings. Numeric text is
//!   not special-cased here.

use crate::{CellValue, ColumnDescriptor, ColumnFormat, GridRecord, SortDirection, SortState};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;

// =============================================================================
// DATE PARSING
// =============================================================================

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%d.%m.%Y %H:%M:%S"];
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"];

/// Parse a date/datetime into epoch milliseconds.
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc().timestamp_millis());
        }
    }
    None
}

/// Timestamp of a cell in a date column. Numbers are epoch milliseconds.
#[must_use]
pub fn cell_timestamp(value: &CellValue) -> i64 {
    match value {
        CellValue::Number(n) if n.is_finite() => *n as i64,
        CellValue::Text(s) => parse_timestamp(s).unwrap_or(0),
        _ => 0,
    }
}

// =============================================================================
// COMPARATOR
// =============================================================================

/// Compare two cells under the comparator policy.
#[must_use]
pub fn compare_cells(
    a: &CellValue,
    b: &CellValue,
    format: Option<ColumnFormat>,
    direction: SortDirection,
) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }
    let ord = compare_present(&SortKey::new(a, format), &SortKey::new(b, format));
    match direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
    }
}

/// Pre-extracted comparison key of a non-null cell.
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Number(f64),
    Timestamp(i64),
    Text(String),
}

impl SortKey {
    fn new(value: &CellValue, format: Option<ColumnFormat>) -> Self {
        if format == Some(ColumnFormat::Date) {
            return Self::Timestamp(cell_timestamp(value));
        }
        match value {
            CellValue::Number(n) => Self::Number(*n),
            other => Self::Text(other.to_string().to_lowercase()),
        }
    }

    /// Numbers rank before timestamps, timestamps before text.
    const fn rank(&self) -> u8 {
        match self {
            Self::Number(_) => 0,
            Self::Timestamp(_) => 1,
            Self::Text(_) => 2,
        }
    }
}

/// Total order over present keys; mixed kinds order by [`SortKey::rank`].
fn compare_present(a: &SortKey, b: &SortKey) -> Ordering {
    match (a, b) {
        (SortKey::Number(x), SortKey::Number(y)) => x.total_cmp(y),
        (SortKey::Timestamp(x), SortKey::Timestamp(y)) => x.cmp(y),
        (SortKey::Text(x), SortKey::Text(y)) => x.cmp(y),
        _ => a.rank().cmp(&b.rank()),
    }
}

// =============================================================================
// SORT
// =============================================================================

/// Sort row indices in place by the active sort column.
///
/// Stable: ties keep their relative input order. An inactive sort, or one
/// naming a column absent from `columns`, leaves the order untouched.
pub fn sort_indices<R: GridRecord>(
    rows: &[R],
    indices: &mut Vec<usize>,
    state: &SortState,
    columns: &[ColumnDescriptor],
) {
    let Some(key) = state.column.as_deref() else {
        return;
    };
    let Some(column) = columns.iter().find(|c| c.key == key) else {
        return;
    };

    let mut decorated: Vec<(Option<SortKey>, usize)> = indices
        .iter()
        .map(|&i| {
            let cell = rows[i].cell(key);
            let sort_key = (!cell.is_null()).then(|| SortKey::new(&cell, column.format));
            (sort_key, i)
        })
        .collect();

    decorated.sort_by(|(a, _), (b, _)| match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match state.direction {
            SortDirection::Asc => compare_present(a, b),
            SortDirection::Desc => compare_present(a, b).reverse(),
        },
    });

    indices.clear();
    indices.extend(decorated.into_iter().map(|(_, i)| i));
}

/// Sorted copy of `rows`.
pub fn apply<'r, R: GridRecord>(
    rows: &'r [R],
    state: &SortState,
    columns: &[ColumnDescriptor],
) -> Vec<&'r R> {
    let mut indices: Vec<usize> = (0..rows.len()).collect();
    sort_indices(rows, &mut indices, state, columns);
    indices.into_iter().map(|i| &rows[i]).collect()
}

// =============================================================================
// TESTS
// =============================================================================
