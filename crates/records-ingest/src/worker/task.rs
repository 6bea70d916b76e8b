use crate::ingest::UploadBatch;

/// A queued job: the id already registered in the store and its files.
#[derive(Debug, Clone)]
pub struct IngestTask {
    pub job_id: String,
    pub batch: UploadBatch,
}

impl IngestTask {
    pub fn new(job_id: impl Into<String>, batch: UploadBatch) -> Self {
        Self {
            job_id: job_id.into(),
            batch,
        }
    }
}
