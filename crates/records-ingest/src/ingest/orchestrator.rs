//! Accepts upload batches and schedules them on the worker pool.

use std::sync::Arc;

use uuid::Uuid;

use crate::config::{validate_ingest_config, IngestConfig};
use crate::error::{ConfigError, WorkerError};
use crate::jobs::{JobOutcome, JobStatusStore};
use crate::worker::{IngestTask, WorkerPool};

use super::batch::UploadBatch;
use super::error::IngestError;
use super::registry::FileTypeRegistry;
use super::runner::IngestRunner;

pub struct IngestionOrchestrator {
    runner: Arc<IngestRunner>,
    pool: WorkerPool,
    config: IngestConfig,
}

impl IngestionOrchestrator {
    /// Starts the worker pool described by `config`.
    ///
    /// A config with no workers or a zero-capacity queue is rejected before
    /// any thread is spawned.
    pub fn new(
        store: Arc<JobStatusStore>,
        registry: Arc<FileTypeRegistry>,
        config: IngestConfig,
    ) -> Result<Self, ConfigError> {
        validate_ingest_config(&config)?;

        let runner = Arc::new(IngestRunner::new(store, registry));
        let pool = WorkerPool::new(
            Arc::clone(&runner),
            config.worker_count,
            config.queue_capacity,
        );
        Ok(Self {
            runner,
            pool,
            config,
        })
    }

    /// Registers a pending job for `batch` and queues it.
    ///
    /// Returns the job id once the job is both visible in the store and
    /// queued. A batch that cannot be queued leaves no record behind.
    pub fn submit(&self, batch: UploadBatch) -> Result<String, IngestError> {
        batch.validate(&self.config)?;

        let job_id = Uuid::new_v4().to_string();
        self.runner.store().create_job(&job_id)?;

        let file_count = batch.len();
        if let Err(e) = self
            .pool
            .try_submit(IngestTask::new(job_id.clone(), batch))
        {
            if let Err(cleanup) = self.runner.store().delete_job(&job_id) {
                log::error!("Could not remove unqueued job {}: {}", job_id, cleanup);
            }
            log::warn!("Rejected job {}: {}", job_id, e);
            return Err(match e {
                WorkerError::QueueFull => IngestError::QueueFull,
                WorkerError::ChannelClosed => IngestError::PoolClosed,
            });
        }

        log::info!("Queued job {} with {} files", job_id, file_count);
        Ok(job_id)
    }

    /// Runs a registered job on the calling thread.
    pub fn run(&self, job_id: &str, batch: &UploadBatch) -> Result<JobOutcome, IngestError> {
        self.runner.run(job_id, batch)
    }

    pub fn store(&self) -> &Arc<JobStatusStore> {
        self.runner.store()
    }

    pub fn registry(&self) -> &Arc<FileTypeRegistry> {
        self.runner.registry()
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Stops the workers after their current job. Jobs still queued are
    /// marked failed by [`wait`](Self::wait).
    pub fn shutdown(&self) {
        self.pool.shutdown();
    }

    pub fn is_shutdown(&self) -> bool {
        self.pool.is_shutdown()
    }

    /// Processes everything queued, then joins the workers.
    pub fn wait(self) {
        self.pool.wait();
    }
}
