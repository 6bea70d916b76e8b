//! Job records and the per-file results attached to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of an ingestion job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Returns true for `Completed` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    fn rank(self) -> u8 {
        match self {
            JobStatus::Pending => 0,
            JobStatus::Processing => 1,
            JobStatus::Completed | JobStatus::Failed => 2,
        }
    }

    /// Whether a job in this status may move to `next`.
    ///
    /// Transitions only move forward and never leave a terminal state.
    /// Re-asserting the current non-terminal status is allowed.
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        !self.is_terminal() && next.rank() >= self.rank()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a single file of a job failed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FileErrorCode {
    /// No parser is registered for the submitted category.
    UnknownType,
    /// The file was read but violated the category's schema or business rules.
    Validation,
    /// Reading or persisting the file failed.
    System,
}

impl FileErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            FileErrorCode::UnknownType => "unknown_type",
            FileErrorCode::Validation => "validation",
            FileErrorCode::System => "system",
        }
    }
}

impl std::fmt::Display for FileErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one file inside a job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileResult {
    /// Category the file was submitted under.
    pub category: String,
    pub success: bool,
    /// Data rows read from the file (set on success).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_processed: Option<usize>,
    /// Rows written by the replace-write (set on success).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_inserted: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<FileErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl FileResult {
    pub fn succeeded(category: &str, rows_processed: usize, rows_inserted: usize) -> Self {
        Self {
            category: category.to_string(),
            success: true,
            rows_processed: Some(rows_processed),
            rows_inserted: Some(rows_inserted),
            error_code: None,
            error_message: None,
        }
    }

    pub fn failed(category: &str, code: FileErrorCode, message: impl Into<String>) -> Self {
        Self {
            category: category.to_string(),
            success: false,
            rows_processed: None,
            rows_inserted: None,
            error_code: Some(code),
            error_message: Some(message.into()),
        }
    }
}

/// Reporting-level classification of a finished job.
///
/// The store status stays binary (`Completed`/`Failed`); a mixed set of
/// file results is reported as `PartialSuccess` on top of `Completed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcome {
    Succeeded,
    PartialSuccess,
    Failed,
}

impl JobOutcome {
    /// Classifies a set of file results. Returns `None` for an empty set.
    pub fn from_results(results: &[FileResult]) -> Option<Self> {
        if results.is_empty() {
            return None;
        }
        let failed = results.iter().filter(|r| !r.success).count();
        Some(if failed == 0 {
            JobOutcome::Succeeded
        } else if failed == results.len() {
            JobOutcome::Failed
        } else {
            JobOutcome::PartialSuccess
        })
    }

    /// The store status this outcome is recorded as.
    pub fn status(self) -> JobStatus {
        match self {
            JobOutcome::Succeeded | JobOutcome::PartialSuccess => JobStatus::Completed,
            JobOutcome::Failed => JobStatus::Failed,
        }
    }
}

/// Snapshot of a job as held by the [`JobStatusStore`](super::JobStatusStore).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub id: String,
    pub status: JobStatus,
    pub progress: u64,
    pub total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Per-file results in processing order.
    #[serde(default)]
    pub files: Vec<FileResult>,
}

impl JobRecord {
    pub(crate) fn new(id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            status: JobStatus::Pending,
            progress: 0,
            total: 0,
            error_message: None,
            created_at: now,
            updated_at: now,
            files: Vec::new(),
        }
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// Progress as a percentage, or 0 while `total` is unset.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        (u128::from(self.progress.min(self.total)) * 100 / u128::from(self.total)) as u8
    }

    /// The reporting outcome of a finished job.
    ///
    /// A failed job always reports `Failed`, including one aborted part-way
    /// after some files were already persisted.
    pub fn outcome(&self) -> Option<JobOutcome> {
        match self.status {
            JobStatus::Pending | JobStatus::Processing => None,
            JobStatus::Completed => JobOutcome::from_results(&self.files),
            JobStatus::Failed => Some(JobOutcome::Failed),
        }
    }
}
