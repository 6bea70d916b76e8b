//! Job tracking for background ingestion.

pub mod error;
pub mod record;
pub mod store;

pub use error::JobStoreError;
pub use record::{FileErrorCode, FileResult, JobOutcome, JobRecord, JobStatus};
pub use store::{JobCounts, JobStatusStore};
