//! Category parsers: turn a [`RawTable`] into typed, rule-checked rows.
//!
//! Each parser checks required columns, drops rows missing critical cells,
//! converts the remaining cells and applies the category's business rules.
//! The first violation aborts the whole file.

pub mod kpi;
pub mod publications;
pub mod research_funding;
pub mod students;

use std::collections::HashSet;

use chrono::NaiveDate;
use thiserror::Error;

use crate::ingest::table::RawTable;
pub use crate::records::ValidatedTable;

pub use kpi::parse_kpi;
pub use publications::parse_publications;
pub use research_funding::parse_research_funding;
pub use students::parse_students;

/// Schema or business-rule violation in an uploaded file.
///
/// `row` fields are spreadsheet line numbers: the header is line 1.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Duplicate {column} found: {}", .keys.join(", "))]
    DuplicateKey { column: String, keys: Vec<String> },

    #[error("Invalid number in {column} at line {line}: '{value}'")]
    InvalidNumber {
        column: String,
        line: usize,
        value: String,
    },

    #[error("Invalid date in {column} at line {line}: '{value}'")]
    InvalidDate {
        column: String,
        line: usize,
        value: String,
    },

    #[error("{column} {message}")]
    OutOfRange { column: String, message: String },

    #[error("{0}")]
    Rule(String),
}

/// Resolves `names` to column indexes, reporting every missing one at once.
pub(crate) fn require_columns(
    table: &RawTable,
    names: &[&str],
) -> Result<Vec<usize>, ValidationError> {
    let mut indexes = Vec::with_capacity(names.len());
    let mut missing = Vec::new();
    for name in names {
        match table.column(name) {
            Some(i) => indexes.push(i),
            None => missing.push((*name).to_string()),
        }
    }
    if missing.is_empty() {
        Ok(indexes)
    } else {
        Err(ValidationError::MissingColumns(missing))
    }
}

/// Indexes of rows whose `critical` cells are all non-empty.
pub(crate) fn complete_rows(table: &RawTable, critical: &[usize]) -> Vec<usize> {
    let kept: Vec<usize> = (0..table.len())
        .filter(|&row| critical.iter().all(|&col| !table.cell(row, col).is_empty()))
        .collect();
    let dropped = table.len() - kept.len();
    if dropped > 0 {
        log::debug!("Dropped {} rows with missing required cells", dropped);
    }
    kept
}

/// Fails with every key that appears more than once, in first-repeat order.
pub(crate) fn ensure_unique<I>(column: &str, keys: I) -> Result<(), ValidationError>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for key in keys {
        if !seen.insert(key.clone()) && !duplicates.contains(&key) {
            duplicates.push(key);
        }
    }
    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::DuplicateKey {
            column: column.to_string(),
            keys: duplicates,
        })
    }
}

fn strip_separators(value: &str) -> String {
    value.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect()
}

pub(crate) fn parse_f64(column: &str, line: usize, value: &str) -> Result<f64, ValidationError> {
    strip_separators(value)
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| ValidationError::InvalidNumber {
            column: column.to_string(),
            line,
            value: value.to_string(),
        })
}

/// Parses an integer cell. Spreadsheet exports such as `"3.0"` are accepted
/// when the fraction is zero.
pub(crate) fn parse_i64(column: &str, line: usize, value: &str) -> Result<i64, ValidationError> {
    let cleaned = strip_separators(value);
    if let Ok(n) = cleaned.parse::<i64>() {
        return Ok(n);
    }
    match cleaned.parse::<f64>() {
        Ok(n) if n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64 => Ok(n as i64),
        _ => Err(ValidationError::InvalidNumber {
            column: column.to_string(),
            line,
            value: value.to_string(),
        }),
    }
}

/// Parses `YYYY-MM-DD`, also with `/` or `.` separators. A trailing time
/// part is ignored.
pub(crate) fn parse_date(
    column: &str,
    line: usize,
    value: &str,
) -> Result<NaiveDate, ValidationError> {
    let date_part = value.split_whitespace().next().unwrap_or("");
    let normalized = date_part.replace(['/', '.'], "-");
    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d").map_err(|_| ValidationError::InvalidDate {
        column: column.to_string(),
        line,
        value: value.to_string(),
    })
}
