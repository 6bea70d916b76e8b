use crate::ingest::table::RawTable;
use crate::records::{ResearchProject, ValidatedTable};

use super::{
    complete_rows, ensure_unique, parse_date, parse_i64, require_columns, ValidationError,
};

const EXECUTION_ID: &str = "집행ID";
const DEPARTMENT: &str = "소속학과";
const TOTAL_BUDGET: &str = "총연구비";
const EXECUTION_DATE: &str = "집행일자";
const EXECUTION_AMOUNT: &str = "집행금액";

/// Parses a research-funding execution export.
///
/// Rules: execution IDs are unique, budget and amount are non-negative and an
/// execution never exceeds its project's total budget.
pub fn parse_research_funding(table: &RawTable) -> Result<ValidatedTable, ValidationError> {
    let cols = require_columns(
        table,
        &[EXECUTION_ID, DEPARTMENT, TOTAL_BUDGET, EXECUTION_DATE, EXECUTION_AMOUNT],
    )?;
    let (id_col, dept_col, budget_col, date_col, amount_col) =
        (cols[0], cols[1], cols[2], cols[3], cols[4]);

    let rows = complete_rows(table, &[id_col, budget_col, amount_col]);
    ensure_unique(
        EXECUTION_ID,
        rows.iter().map(|&r| table.cell(r, id_col).to_string()),
    )?;

    let mut projects = Vec::with_capacity(rows.len());
    for &row in &rows {
        let line = table.line(row);
        projects.push(ResearchProject {
            execution_id: table.cell(row, id_col).to_string(),
            department: table.cell(row, dept_col).to_string(),
            total_budget: parse_i64(TOTAL_BUDGET, line, table.cell(row, budget_col))?,
            execution_date: parse_date(EXECUTION_DATE, line, table.cell(row, date_col))?,
            execution_amount: parse_i64(EXECUTION_AMOUNT, line, table.cell(row, amount_col))?,
        });
    }

    if projects.iter().any(|p| p.total_budget < 0) {
        return Err(ValidationError::OutOfRange {
            column: TOTAL_BUDGET.to_string(),
            message: "cannot be negative".to_string(),
        });
    }
    if projects.iter().any(|p| p.execution_amount < 0) {
        return Err(ValidationError::OutOfRange {
            column: EXECUTION_AMOUNT.to_string(),
            message: "cannot be negative".to_string(),
        });
    }

    let over_budget: Vec<&str> = projects
        .iter()
        .filter(|p| p.execution_amount > p.total_budget)
        .map(|p| p.execution_id.as_str())
        .collect();
    if !over_budget.is_empty() {
        return Err(ValidationError::Rule(format!(
            "{} exceeds {} for IDs: {}",
            EXECUTION_AMOUNT,
            TOTAL_BUDGET,
            over_budget.join(", ")
        )));
    }

    Ok(ValidatedTable::ResearchFunding(projects))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const HEADER: &str = "집행ID,소속학과,총연구비,집행일자,집행금액\n";

    fn parse(body: &str) -> Result<ValidatedTable, ValidationError> {
        let csv = format!("{}{}", HEADER, body);
        parse_research_funding(&RawTable::from_reader(csv.as_bytes()).unwrap())
    }

    fn projects(table: ValidatedTable) -> Vec<ResearchProject> {
        match table {
            ValidatedTable::ResearchFunding(rows) => rows,
            other => panic!("unexpected table {:?}", other),
        }
    }

    #[test]
    fn test_valid_rows() {
        let rows = projects(
            parse("E-1,물리학과,\"1,000,000\",2024-03-01,250000\nE-2,수학과,500,2024/04/02,500\n")
                .unwrap(),
        );

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].total_budget, 1_000_000);
        assert_eq!(
            rows[1].execution_date,
            NaiveDate::from_ymd_opt(2024, 4, 2).unwrap()
        );
    }

    #[test]
    fn test_rows_missing_critical_cells_are_dropped() {
        let rows = projects(parse("E-1,물리학과,100,2024-03-01,50\n,수학과,100,2024-03-01,50\nE-3,수학과,,2024-03-01,50\n").unwrap());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].execution_id, "E-1");
    }

    #[test]
    fn test_missing_column() {
        let table = RawTable::from_reader("집행ID,소속학과\nE-1,물리학과\n".as_bytes()).unwrap();
        let err = parse_research_funding(&table).unwrap_err();
        assert!(matches!(err, ValidationError::MissingColumns(ref cols) if cols.len() == 3));
    }

    #[test]
    fn test_duplicate_execution_id() {
        let err = parse("E-1,물리학과,100,2024-03-01,50\nE-1,수학과,100,2024-03-01,50\n")
            .unwrap_err();
        assert_eq!(err.to_string(), "Duplicate 집행ID found: E-1");
    }

    #[test]
    fn test_amount_over_budget() {
        let err = parse("E-1,물리학과,100,2024-03-01,150\n").unwrap_err();
        assert!(matches!(err, ValidationError::Rule(ref m) if m.contains("E-1")));
    }

    #[test]
    fn test_negative_budget() {
        let err = parse("E-1,물리학과,-100,2024-03-01,-150\n").unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { ref column, .. } if column == "총연구비"));
    }

    #[test]
    fn test_unparseable_date() {
        let err = parse("E-1,물리학과,100,someday,50\n").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidDate { line: 2, .. }));
    }

    #[test]
    fn test_error_line_counts_blank_rows() {
        let err = parse(",,,,\n,,,,\nE-1,물리학과,100,someday,50\n").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidDate { line: 4, .. }));
        assert_eq!(err.to_string(), "Invalid date in 집행일자 at line 4: 'someday'");
    }
}
