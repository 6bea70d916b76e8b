//! Background ingestion of institutional spreadsheet exports.
//!
//! Uploads are accepted as a batch, tracked in an in-memory
//! [`JobStatusStore`] and processed by a small worker pool. Each file is
//! parsed by its category's parser and replace-written to SQLite.

pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod jobs;
pub mod logging;
pub mod parser;
pub mod records;
pub mod sanitize;
pub mod worker;

pub use config::{load_config, load_config_from_str, Config, IngestConfig, LoggingConfig};
pub use db::{Database, DatabaseError, PersistSummary};
pub use error::{ConfigError, Error, Result, WorkerError};
pub use ingest::{
    FileError, FileTypeRegistry, IngestError, IngestRunner, IngestionOrchestrator, PersistError,
    RawTable, UploadBatch, UploadedFile,
};
pub use jobs::{
    FileErrorCode, FileResult, JobCounts, JobOutcome, JobRecord, JobStatus, JobStatusStore,
    JobStoreError,
};
pub use logging::init_logging;
pub use parser::{ValidatedTable, ValidationError};
pub use records::FileCategory;
