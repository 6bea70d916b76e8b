//! In-memory job status store.
//!
//! Every operation takes the map lock exactly once for its whole
//! read-modify-write, so readers never see a record between two logical
//! updates. Records are never handed out by reference; callers get clones.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;

use super::error::JobStoreError;
use super::record::{FileResult, JobRecord, JobStatus};

/// Number of jobs per status.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobCounts {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Thread-safe mapping from job id to [`JobRecord`].
///
/// Not durable: state is lost when the process exits.
#[derive(Default)]
pub struct JobStatusStore {
    jobs: RwLock<HashMap<String, JobRecord>>,
}

impl JobStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, JobRecord>> {
        match self.jobs.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Job status store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, JobRecord>> {
        match self.jobs.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Job status store lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Applies `f` to the record for `id` under the write lock.
    fn with_job<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut JobRecord) -> Result<T, JobStoreError>,
    ) -> Result<T, JobStoreError> {
        let mut jobs = self.write();
        let job = jobs
            .get_mut(id)
            .ok_or_else(|| JobStoreError::NotFound(id.to_string()))?;
        f(job)
    }

    /// Inserts a new pending job.
    ///
    /// Exactly one of any number of racing callers with the same id succeeds.
    pub fn create_job(&self, id: &str) -> Result<JobRecord, JobStoreError> {
        let mut jobs = self.write();
        match jobs.entry(id.to_string()) {
            Entry::Occupied(_) => Err(JobStoreError::AlreadyExists(id.to_string())),
            Entry::Vacant(slot) => Ok(slot.insert(JobRecord::new(id)).clone()),
        }
    }

    /// Returns a snapshot of the job.
    pub fn get_job(&self, id: &str) -> Result<JobRecord, JobStoreError> {
        self.read()
            .get(id)
            .cloned()
            .ok_or_else(|| JobStoreError::NotFound(id.to_string()))
    }

    /// Moves the job to `status`, optionally recording an error message.
    ///
    /// Terminal states are final: any further update is rejected and the
    /// record is left untouched.
    pub fn update_status(
        &self,
        id: &str,
        status: JobStatus,
        error_message: Option<&str>,
    ) -> Result<(), JobStoreError> {
        self.with_job(id, |job| {
            if !job.status.can_transition_to(status) {
                return Err(JobStoreError::InvalidTransition {
                    id: id.to_string(),
                    from: job.status,
                    to: status,
                });
            }
            job.status = status;
            if let Some(message) = error_message {
                job.error_message = Some(message.to_string());
            }
            job.touch();
            Ok(())
        })
    }

    /// Sets `progress` and `total` together.
    pub fn update_progress(&self, id: &str, progress: u64, total: u64) -> Result<(), JobStoreError> {
        self.with_job(id, |job| {
            if total > 0 && progress > total {
                return Err(JobStoreError::ProgressOutOfRange {
                    id: id.to_string(),
                    progress,
                    total,
                });
            }
            job.progress = progress;
            job.total = total;
            job.touch();
            Ok(())
        })
    }

    /// Adds one to `progress` and returns the new value.
    ///
    /// Once `total` is set, an increment past it is rejected.
    pub fn increment_progress(&self, id: &str) -> Result<u64, JobStoreError> {
        self.with_job(id, |job| {
            let next = match job.progress.checked_add(1) {
                Some(next) if job.total == 0 || next <= job.total => next,
                _ => {
                    return Err(JobStoreError::ProgressOutOfRange {
                        id: id.to_string(),
                        progress: job.progress.saturating_add(1),
                        total: job.total,
                    })
                }
            };
            job.progress = next;
            job.touch();
            Ok(next)
        })
    }

    /// Appends a per-file result to a job that is still running.
    pub fn record_file_result(&self, id: &str, result: FileResult) -> Result<(), JobStoreError> {
        self.with_job(id, |job| {
            if job.is_finished() {
                return Err(JobStoreError::JobFinished(id.to_string()));
            }
            job.files.push(result);
            job.touch();
            Ok(())
        })
    }

    /// Removes a job and returns its last state.
    pub fn delete_job(&self, id: &str) -> Result<JobRecord, JobStoreError> {
        self.write()
            .remove(id)
            .ok_or_else(|| JobStoreError::NotFound(id.to_string()))
    }

    /// Removes every job. Returns how many were removed.
    pub fn clear_all(&self) -> usize {
        let mut jobs = self.write();
        let removed = jobs.len();
        jobs.clear();
        removed
    }

    /// Returns all jobs, newest first.
    pub fn list(&self) -> Vec<JobRecord> {
        let mut result: Vec<JobRecord> = self.read().values().cloned().collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        result
    }

    pub fn counts(&self) -> JobCounts {
        let jobs = self.read();
        let mut counts = JobCounts::default();
        for job in jobs.values() {
            match job.status {
                JobStatus::Pending => counts.pending += 1,
                JobStatus::Processing => counts.processing += 1,
                JobStatus::Completed => counts.completed += 1,
                JobStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
