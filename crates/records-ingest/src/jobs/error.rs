use thiserror::Error;

use super::record::JobStatus;

/// Errors reported by the [`JobStatusStore`](super::JobStatusStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobStoreError {
    #[error("Job {0} already exists")]
    AlreadyExists(String),

    #[error("Job {0} not found")]
    NotFound(String),

    #[error("Job {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: JobStatus,
        to: JobStatus,
    },

    #[error("Job {id} progress {progress} exceeds total {total}")]
    ProgressOutOfRange { id: String, progress: u64, total: u64 },

    #[error("Job {0} is already finished")]
    JobFinished(String),
}
