use crate::ingest::table::RawTable;
use crate::records::{Student, ValidatedTable};

use super::{complete_rows, ensure_unique, parse_i64, require_columns, ValidationError};

const STUDENT_ID: &str = "학번";
const DEPARTMENT: &str = "학과";
const GRADE: &str = "학년";
const PROGRAM_TYPE: &str = "과정구분";
const ENROLLMENT_STATUS: &str = "학적상태";

const MAX_GRADE: i64 = 7;

/// Parses a student roster. Grade 0 marks graduate students without a year.
pub fn parse_students(table: &RawTable) -> Result<ValidatedTable, ValidationError> {
    let cols = require_columns(
        table,
        &[STUDENT_ID, DEPARTMENT, GRADE, PROGRAM_TYPE, ENROLLMENT_STATUS],
    )?;
    let (id_col, dept_col, grade_col, program_col, status_col) =
        (cols[0], cols[1], cols[2], cols[3], cols[4]);

    let rows = complete_rows(table, &[id_col]);
    ensure_unique(
        STUDENT_ID,
        rows.iter().map(|&r| table.cell(r, id_col).to_string()),
    )?;

    let mut students = Vec::with_capacity(rows.len());
    for &row in &rows {
        let grade = parse_i64(GRADE, table.line(row), table.cell(row, grade_col))?;
        if !(0..=MAX_GRADE).contains(&grade) {
            return Err(ValidationError::OutOfRange {
                column: GRADE.to_string(),
                message: format!("must be between 0 and {}", MAX_GRADE),
            });
        }
        students.push(Student {
            student_id: table.cell(row, id_col).to_string(),
            department: table.cell(row, dept_col).to_string(),
            grade: grade as i32,
            program_type: table.cell(row, program_col).to_string(),
            enrollment_status: table.cell(row, status_col).to_string(),
        });
    }

    Ok(ValidatedTable::Students(students))
}
