use crate::ingest::table::RawTable;
use crate::records::{Publication, ValidatedTable};

use super::{complete_rows, ensure_unique, parse_f64, require_columns, ValidationError};

const PUBLICATION_ID: &str = "논문ID";
const DEPARTMENT: &str = "학과";
const JOURNAL_TIER: &str = "저널등급";
const IMPACT_FACTOR: &str = "Impact Factor";

/// Parses a publication list. The impact factor may be left blank.
pub fn parse_publications(table: &RawTable) -> Result<ValidatedTable, ValidationError> {
    let cols = require_columns(
        table,
        &[PUBLICATION_ID, DEPARTMENT, JOURNAL_TIER, IMPACT_FACTOR],
    )?;
    let (id_col, dept_col, tier_col, if_col) = (cols[0], cols[1], cols[2], cols[3]);

    let rows = complete_rows(table, &[id_col, dept_col]);
    ensure_unique(
        PUBLICATION_ID,
        rows.iter().map(|&r| table.cell(r, id_col).to_string()),
    )?;

    let mut publications = Vec::with_capacity(rows.len());
    for &row in &rows {
        let raw_if = table.cell(row, if_col);
        let impact_factor = if raw_if.is_empty() {
            None
        } else {
            let value = parse_f64(IMPACT_FACTOR, table.line(row), raw_if)?;
            if value < 0.0 {
                return Err(ValidationError::OutOfRange {
                    column: IMPACT_FACTOR.to_string(),
                    message: "cannot be negative".to_string(),
                });
            }
            Some(value)
        };

        publications.push(Publication {
            publication_id: table.cell(row, id_col).to_string(),
            department: table.cell(row, dept_col).to_string(),
            journal_tier: table.cell(row, tier_col).to_string(),
            impact_factor,
        });
    }

    Ok(ValidatedTable::Publications(publications))
}
