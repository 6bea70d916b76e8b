pub mod pool;
pub mod task;

pub use crate::error::WorkerError;
pub use pool::WorkerPool;
pub use task::IngestTask;
