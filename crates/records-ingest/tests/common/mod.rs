//! Shared helpers for the records-ingest integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use records_ingest::{
    FileTypeRegistry, IngestConfig, IngestionOrchestrator, JobRecord, JobStatus, JobStatusStore,
    PersistError, PersistSummary, RawTable, ValidatedTable, ValidationError,
};

/// Scratch directory holding uploaded CSV files for one test.
pub struct UploadDir {
    dir: TempDir,
}

impl UploadDir {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Writes `body` to `name` and returns its path.
    pub fn write(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, body).expect("Failed to write upload");
        path
    }
}

/// Accepts any table that has no `bad` column.
pub fn parse_unless_bad(raw: &RawTable) -> Result<ValidatedTable, ValidationError> {
    if raw.column("bad").is_some() {
        return Err(ValidationError::Rule("bad schema".to_string()));
    }
    Ok(ValidatedTable::Students(vec![]))
}

pub fn persist_ok(_: &ValidatedTable, _: bool) -> Result<PersistSummary, PersistError> {
    Ok(PersistSummary { rows_inserted: 1 })
}

/// Registry with fake categories `a`, `b` and `c` that accept any table
/// without a `bad` column.
pub fn fake_registry() -> FileTypeRegistry {
    FileTypeRegistry::new()
        .register("a", parse_unless_bad, persist_ok)
        .register("b", parse_unless_bad, persist_ok)
        .register("c", parse_unless_bad, persist_ok)
}

pub fn orchestrator(registry: FileTypeRegistry) -> IngestionOrchestrator {
    IngestionOrchestrator::new(
        Arc::new(JobStatusStore::new()),
        Arc::new(registry),
        IngestConfig::default(),
    )
    .unwrap()
}

/// Polls until the job has settled, panicking after five seconds.
///
/// The final `100/100` progress write lands just after the terminal status,
/// so completed jobs are also waited on for that.
pub fn wait_for_finish(store: &JobStatusStore, job_id: &str) -> JobRecord {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let job = store.get_job(job_id).expect("job disappeared");
        let settled = match job.status {
            JobStatus::Completed => job.total == 100 && job.progress == 100,
            JobStatus::Failed => true,
            JobStatus::Pending | JobStatus::Processing => false,
        };
        if settled {
            return job;
        }
        assert!(Instant::now() < deadline, "job {} did not finish", job_id);
        thread::sleep(Duration::from_millis(10));
    }
}
