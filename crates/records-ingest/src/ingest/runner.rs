//! Executes one ingestion job on the calling thread.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, info, info_span, warn};

use crate::jobs::{FileResult, JobOutcome, JobStatus, JobStatusStore};
use crate::sanitize;

use super::batch::{UploadBatch, UploadedFile};
use super::error::{FileError, IngestError};
use super::registry::FileTypeRegistry;
use super::table::RawTable;

/// Runs jobs against a store and a registry. Cheap to share between workers.
pub struct IngestRunner {
    store: Arc<JobStatusStore>,
    registry: Arc<FileTypeRegistry>,
}

impl IngestRunner {
    pub fn new(store: Arc<JobStatusStore>, registry: Arc<FileTypeRegistry>) -> Self {
        Self { store, registry }
    }

    pub fn store(&self) -> &Arc<JobStatusStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<FileTypeRegistry> {
        &self.registry
    }

    /// Processes every file of `batch` in order and records the outcome.
    ///
    /// A failing file is recorded and the run moves on to the next one.
    /// `Err` is returned only when the store refuses an update.
    pub fn run(&self, job_id: &str, batch: &UploadBatch) -> Result<JobOutcome, IngestError> {
        let _job_span = info_span!("ingest_job", job_id = %job_id, files = batch.len()).entered();

        self.store
            .update_status(job_id, JobStatus::Processing, None)?;
        self.store.update_progress(job_id, 0, batch.len() as u64)?;

        let mut results = Vec::with_capacity(batch.len());
        for file in batch {
            let result = self.ingest_file(file);
            self.store.record_file_result(job_id, result.clone())?;
            self.store.increment_progress(job_id)?;
            results.push(result);
        }

        let outcome = JobOutcome::from_results(&results).unwrap_or(JobOutcome::Succeeded);
        let error_message = (outcome == JobOutcome::Failed).then(|| failure_summary(&results));
        self.store
            .update_status(job_id, outcome.status(), error_message.as_deref())?;
        self.store.update_progress(job_id, 100, 100)?;

        info!("Job {} finished: {:?}", job_id, outcome);
        Ok(outcome)
    }

    /// Runs the job and turns any error or panic into a `Failed` status.
    ///
    /// Files already persisted before the failure stay persisted. Nothing is
    /// propagated to the caller.
    pub fn run_guarded(&self, job_id: &str, batch: &UploadBatch) {
        let message = match panic::catch_unwind(AssertUnwindSafe(|| self.run(job_id, batch))) {
            Ok(Ok(_)) => return,
            Ok(Err(e)) => e.to_string(),
            Err(payload) => format!("Unexpected error: {}", panic_message(payload.as_ref())),
        };

        warn!("Job {} aborted: {}", job_id, message);
        if let Err(e) = self
            .store
            .update_status(job_id, JobStatus::Failed, Some(&message))
        {
            log::error!("Could not mark job {} as failed: {}", job_id, e);
        }
    }

    fn ingest_file(&self, file: &UploadedFile) -> FileResult {
        let filename = sanitize::redact_path(&file.path);
        let _file_span = info_span!("ingest_file",
            category = %file.category,
            filename = %filename,
        )
        .entered();

        match self.process_file(file) {
            Ok((rows_processed, rows_inserted)) => {
                debug!("Ingested {} rows from {}", rows_inserted, filename);
                FileResult::succeeded(&file.category, rows_processed, rows_inserted)
            }
            Err(e) => {
                warn!("File {} ({}) failed: {}", filename, file.category, e);
                FileResult::failed(&file.category, e.code(), e.to_string())
            }
        }
    }

    fn process_file(&self, file: &UploadedFile) -> Result<(usize, usize), FileError> {
        let file_type = self
            .registry
            .get(&file.category)
            .ok_or_else(|| FileError::UnknownCategory(file.category.clone()))?;

        let raw = RawTable::from_path(&file.path)?;
        let table = (file_type.parse)(&raw)?;
        let summary = (file_type.persist)(&table, true)?;

        Ok((raw.len(), summary.rows_inserted))
    }
}

fn failure_summary(results: &[FileResult]) -> String {
    let details: Vec<String> = results
        .iter()
        .map(|r| {
            format!(
                "{}: {}",
                r.category,
                r.error_message.as_deref().unwrap_or("failed")
            )
        })
        .collect();
    format!("All files failed ({})", details.join("; "))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
