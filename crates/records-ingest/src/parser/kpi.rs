use crate::ingest::table::RawTable;
use crate::records::{DepartmentKpi, ValidatedTable};

use super::{complete_rows, ensure_unique, parse_f64, parse_i64, require_columns, ValidationError};

const EVALUATION_YEAR: &str = "평가년도";
const DEPARTMENT: &str = "학과";
const EMPLOYMENT_RATE: &str = "졸업생 취업률 (%)";
const TECH_TRANSFER: &str = "연간 기술이전 수입액 (억원)";

/// Exports spell the percentage and currency headers with and without a
/// space before the unit, so those two columns are matched by keyword.
fn is_employment_column(header: &str) -> bool {
    header.contains("취업률") && header.contains("(%)")
}

fn is_tech_transfer_column(header: &str) -> bool {
    header.contains("기술이전") && header.contains("억원")
}

/// Parses yearly department KPIs.
pub fn parse_kpi(table: &RawTable) -> Result<ValidatedTable, ValidationError> {
    let employment_col = table.find_column(is_employment_column);
    let transfer_col = table.find_column(is_tech_transfer_column);

    let fixed = require_columns(table, &[EVALUATION_YEAR, DEPARTMENT]);
    let (year_col, dept_col, employment_col, transfer_col) =
        match (fixed, employment_col, transfer_col) {
            (Ok(cols), Some(e), Some(t)) => (cols[0], cols[1], e, t),
            (fixed, e, t) => {
                let mut missing = match fixed {
                    Err(ValidationError::MissingColumns(cols)) => cols,
                    _ => Vec::new(),
                };
                if e.is_none() {
                    missing.push(EMPLOYMENT_RATE.to_string());
                }
                if t.is_none() {
                    missing.push(TECH_TRANSFER.to_string());
                }
                return Err(ValidationError::MissingColumns(missing));
            }
        };

    let rows = complete_rows(table, &[year_col, dept_col]);

    let mut kpis = Vec::with_capacity(rows.len());
    for &row in &rows {
        let line = table.line(row);
        let year = parse_i64(EVALUATION_YEAR, line, table.cell(row, year_col))?;
        let evaluation_year = i32::try_from(year).map_err(|_| ValidationError::InvalidNumber {
            column: EVALUATION_YEAR.to_string(),
            line,
            value: table.cell(row, year_col).to_string(),
        })?;
        let employment_rate = parse_f64(EMPLOYMENT_RATE, line, table.cell(row, employment_col))?;
        let tech_transfer_revenue = parse_f64(TECH_TRANSFER, line, table.cell(row, transfer_col))?;

        if !(0.0..=100.0).contains(&employment_rate) {
            return Err(ValidationError::OutOfRange {
                column: EMPLOYMENT_RATE.to_string(),
                message: "must be between 0 and 100".to_string(),
            });
        }
        if tech_transfer_revenue < 0.0 {
            return Err(ValidationError::OutOfRange {
                column: TECH_TRANSFER.to_string(),
                message: "cannot be negative".to_string(),
            });
        }

        kpis.push(DepartmentKpi {
            evaluation_year,
            department: table.cell(row, dept_col).to_string(),
            employment_rate,
            tech_transfer_revenue,
        });
    }

    ensure_unique(
        "평가년도/학과",
        kpis.iter()
            .map(|k| format!("{}/{}", k.evaluation_year, k.department)),
    )?;

    Ok(ValidatedTable::DepartmentKpi(kpis))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(csv: &str) -> Result<ValidatedTable, ValidationError> {
        parse_kpi(&RawTable::from_reader(csv.as_bytes()).unwrap())
    }

    #[test]
    fn test_header_spelling_variants() {
        for header in [
            "평가년도,학과,졸업생 취업률 (%),연간 기술이전 수입액 (억원)",
            "평가년도,학과,졸업생 취업률(%),연간 기술이전 수입액(억원)",
        ] {
            let table = parse(&format!("{}\n2024,물리학과,78.5,1.2\n", header)).unwrap();
            let ValidatedTable::DepartmentKpi(rows) = table else {
                panic!("expected kpis");
            };
            assert_eq!(rows[0].evaluation_year, 2024);
            assert_eq!(rows[0].employment_rate, 78.5);
        }
    }

    #[test]
    fn test_missing_keyword_columns() {
        let err = parse("평가년도,학과,취업률\n2024,물리학과,78\n").unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingColumns(vec![
                EMPLOYMENT_RATE.to_string(),
                TECH_TRANSFER.to_string(),
            ])
        );
    }

    #[test]
    fn test_rate_out_of_range() {
        let err = parse("평가년도,학과,졸업생 취업률 (%),연간 기술이전 수입액 (억원)\n2024,물리학과,120,1\n")
            .unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
    }

    #[test]
    fn test_negative_revenue() {
        let err = parse("평가년도,학과,졸업생 취업률 (%),연간 기술이전 수입액 (억원)\n2024,물리학과,50,-1\n")
            .unwrap_err();
        assert_eq!(err.to_string(), "연간 기술이전 수입액 (억원) cannot be negative");
    }

    #[test]
    fn test_year_department_unique() {
        let err = parse(
            "평가년도,학과,졸업생 취업률 (%),연간 기술이전 수입액 (억원)\n2024,물리학과,50,1\n2024,물리학과,60,2\n2023,물리학과,55,1\n",
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateKey { ref keys, .. } if keys == &["2024/물리학과"]));
    }
}
