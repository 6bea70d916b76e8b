//! Replace-writes of validated record tables.

use chrono::Utc;
use rusqlite::{params, Transaction};
use serde::Serialize;

use super::{Database, DatabaseError};
use crate::records::{
    DepartmentKpi, FileCategory, Publication, ResearchProject, Student, ValidatedTable,
};

/// Result of persisting one validated table.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PersistSummary {
    pub rows_inserted: usize,
}

/// Writes `table` to its category's table in a single transaction.
///
/// With `replace` set the existing rows are deleted first. Any failing insert
/// rolls back the delete, so readers see either the old or the new rows.
pub fn save_table(
    db: &Database,
    table: &ValidatedTable,
    replace: bool,
) -> Result<PersistSummary, DatabaseError> {
    let category = table.category();
    let now = Utc::now().to_rfc3339();

    db.transaction(|tx| {
        if replace {
            let deleted = tx.execute(&format!("DELETE FROM {}", category.table()), [])?;
            log::debug!("Cleared {} existing rows from {}", deleted, category.table());
        }

        let rows_inserted = match table {
            ValidatedTable::ResearchFunding(rows) => insert_research(tx, rows, &now)?,
            ValidatedTable::Students(rows) => insert_students(tx, rows, &now)?,
            ValidatedTable::Publications(rows) => insert_publications(tx, rows, &now)?,
            ValidatedTable::DepartmentKpi(rows) => insert_kpis(tx, rows, &now)?,
        };

        log::info!("Saved {} rows to {}", rows_inserted, category.table());
        Ok(PersistSummary { rows_inserted })
    })
}

fn insert_research(
    tx: &Transaction<'_>,
    rows: &[ResearchProject],
    now: &str,
) -> Result<usize, DatabaseError> {
    let mut stmt = tx.prepare(
        "INSERT INTO research_projects
         (execution_id, department, total_budget, execution_date, execution_amount,
          created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
    )?;
    for row in rows {
        stmt.execute(params![
            row.execution_id,
            row.department,
            row.total_budget,
            row.execution_date.format("%Y-%m-%d").to_string(),
            row.execution_amount,
            now,
        ])?;
    }
    Ok(rows.len())
}

fn insert_students(
    tx: &Transaction<'_>,
    rows: &[Student],
    now: &str,
) -> Result<usize, DatabaseError> {
    let mut stmt = tx.prepare(
        "INSERT INTO students
         (student_id, department, grade, program_type, enrollment_status,
          created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
    )?;
    for row in rows {
        stmt.execute(params![
            row.student_id,
            row.department,
            row.grade,
            row.program_type,
            row.enrollment_status,
            now,
        ])?;
    }
    Ok(rows.len())
}

fn insert_publications(
    tx: &Transaction<'_>,
    rows: &[Publication],
    now: &str,
) -> Result<usize, DatabaseError> {
    let mut stmt = tx.prepare(
        "INSERT INTO publications
         (publication_id, department, journal_tier, impact_factor, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
    )?;
    for row in rows {
        stmt.execute(params![
            row.publication_id,
            row.department,
            row.journal_tier,
            row.impact_factor,
            now,
        ])?;
    }
    Ok(rows.len())
}

fn insert_kpis(
    tx: &Transaction<'_>,
    rows: &[DepartmentKpi],
    now: &str,
) -> Result<usize, DatabaseError> {
    let mut stmt = tx.prepare(
        "INSERT INTO department_kpis
         (evaluation_year, department, employment_rate, tech_transfer_revenue,
          created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
    )?;
    for row in rows {
        stmt.execute(params![
            row.evaluation_year,
            row.department,
            row.employment_rate,
            row.tech_transfer_revenue,
            now,
        ])?;
    }
    Ok(rows.len())
}

/// Number of rows currently stored for `category`.
pub fn count_rows(db: &Database, category: FileCategory) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", category.table()),
            [],
            |r| r.get(0),
        )?;
        Ok(count as usize)
    })
}

/// Distinct departments stored for `category`, sorted.
pub fn list_departments(
    db: &Database,
    category: FileCategory,
) -> Result<Vec<String>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT DISTINCT department FROM {} ORDER BY department",
            category.table()
        ))?;
        let departments = stmt
            .query_map([], |r| r.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(departments)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn student(id: &str, department: &str) -> Student {
        Student {
            student_id: id.to_string(),
            department: department.to_string(),
            grade: 2,
            program_type: "학사".to_string(),
            enrollment_status: "재학".to_string(),
        }
    }

    #[test]
    fn test_save_students_inserts_rows() {
        let db = Database::open_in_memory().unwrap();
        let table = ValidatedTable::Students(vec![student("s1", "Physics"), student("s2", "Math")]);

        let summary = save_table(&db, &table, true).unwrap();

        assert_eq!(summary.rows_inserted, 2);
        assert_eq!(count_rows(&db, FileCategory::Students).unwrap(), 2);
        assert_eq!(
            list_departments(&db, FileCategory::Students).unwrap(),
            vec!["Math".to_string(), "Physics".to_string()]
        );
    }

    #[test]
    fn test_replace_discards_previous_rows() {
        let db = Database::open_in_memory().unwrap();
        save_table(
            &db,
            &ValidatedTable::Students(vec![student("s1", "Physics"), student("s2", "Math")]),
            true,
        )
        .unwrap();

        save_table(&db, &ValidatedTable::Students(vec![student("s3", "Biology")]), true).unwrap();

        assert_eq!(count_rows(&db, FileCategory::Students).unwrap(), 1);
        assert_eq!(
            list_departments(&db, FileCategory::Students).unwrap(),
            vec!["Biology".to_string()]
        );
    }

    #[test]
    fn test_append_keeps_previous_rows() {
        let db = Database::open_in_memory().unwrap();
        save_table(&db, &ValidatedTable::Students(vec![student("s1", "Physics")]), true).unwrap();
        save_table(&db, &ValidatedTable::Students(vec![student("s2", "Math")]), false).unwrap();

        assert_eq!(count_rows(&db, FileCategory::Students).unwrap(), 2);
    }

    #[test]
    fn test_failed_replace_keeps_old_rows() {
        let db = Database::open_in_memory().unwrap();
        save_table(&db, &ValidatedTable::Students(vec![student("s1", "Physics")]), true).unwrap();

        // Duplicate primary key fails the second insert after the delete ran.
        let bad = ValidatedTable::Students(vec![student("s9", "Math"), student("s9", "Math")]);
        assert!(save_table(&db, &bad, true).is_err());

        assert_eq!(count_rows(&db, FileCategory::Students).unwrap(), 1);
        assert_eq!(
            list_departments(&db, FileCategory::Students).unwrap(),
            vec!["Physics".to_string()]
        );
    }

    #[test]
    fn test_save_each_category() {
        let db = Database::open_in_memory().unwrap();

        save_table(
            &db,
            &ValidatedTable::ResearchFunding(vec![ResearchProject {
                execution_id: "E-1".to_string(),
                department: "Physics".to_string(),
                total_budget: 1_000_000,
                execution_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                execution_amount: 250_000,
            }]),
            true,
        )
        .unwrap();
        save_table(
            &db,
            &ValidatedTable::Publications(vec![Publication {
                publication_id: "P-1".to_string(),
                department: "Physics".to_string(),
                journal_tier: "SCIE".to_string(),
                impact_factor: None,
            }]),
            true,
        )
        .unwrap();
        save_table(
            &db,
            &ValidatedTable::DepartmentKpi(vec![DepartmentKpi {
                evaluation_year: 2024,
                department: "Physics".to_string(),
                employment_rate: 75.5,
                tech_transfer_revenue: 1.2,
            }]),
            true,
        )
        .unwrap();

        for category in [
            FileCategory::ResearchFunding,
            FileCategory::Publications,
            FileCategory::Kpi,
        ] {
            assert_eq!(count_rows(&db, category).unwrap(), 1, "{}", category);
        }

        let stored_date: String = db
            .with_conn(|conn| {
                Ok(conn.query_row(
                    "SELECT execution_date FROM research_projects",
                    [],
                    |r| r.get(0),
                )?)
            })
            .unwrap();
        assert_eq!(stored_date, "2024-03-01");
    }
}
