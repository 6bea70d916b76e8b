//! Validated institutional records, one type per upload category.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The upload categories with a production parser and table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    ResearchFunding,
    Students,
    Publications,
    Kpi,
}

impl FileCategory {
    pub const ALL: [FileCategory; 4] = [
        FileCategory::ResearchFunding,
        FileCategory::Students,
        FileCategory::Publications,
        FileCategory::Kpi,
    ];

    /// Name used as the upload field and registry key.
    pub fn as_str(self) -> &'static str {
        match self {
            FileCategory::ResearchFunding => "research_funding",
            FileCategory::Students => "students",
            FileCategory::Publications => "publications",
            FileCategory::Kpi => "kpi",
        }
    }

    /// Backing table name.
    pub fn table(self) -> &'static str {
        match self {
            FileCategory::ResearchFunding => "research_projects",
            FileCategory::Students => "students",
            FileCategory::Publications => "publications",
            FileCategory::Kpi => "department_kpis",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FileCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown file type: {}", s))
    }
}

/// One research-funding execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchProject {
    pub execution_id: String,
    pub department: String,
    pub total_budget: i64,
    pub execution_date: NaiveDate,
    pub execution_amount: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub student_id: String,
    pub department: String,
    pub grade: i32,
    pub program_type: String,
    pub enrollment_status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    pub publication_id: String,
    pub department: String,
    pub journal_tier: String,
    pub impact_factor: Option<f64>,
}

/// Yearly KPI figures for one department.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentKpi {
    pub evaluation_year: i32,
    pub department: String,
    /// Graduate employment rate, percent.
    pub employment_rate: f64,
    /// Technology-transfer revenue, in 100M KRW.
    pub tech_transfer_revenue: f64,
}

/// Rows produced by a category parser, ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatedTable {
    ResearchFunding(Vec<ResearchProject>),
    Students(Vec<Student>),
    Publications(Vec<Publication>),
    DepartmentKpi(Vec<DepartmentKpi>),
}

impl ValidatedTable {
    pub fn category(&self) -> FileCategory {
        match self {
            ValidatedTable::ResearchFunding(_) => FileCategory::ResearchFunding,
            ValidatedTable::Students(_) => FileCategory::Students,
            ValidatedTable::Publications(_) => FileCategory::Publications,
            ValidatedTable::DepartmentKpi(_) => FileCategory::Kpi,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ValidatedTable::ResearchFunding(rows) => rows.len(),
            ValidatedTable::Students(rows) => rows.len(),
            ValidatedTable::Publications(rows) => rows.len(),
            ValidatedTable::DepartmentKpi(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
