//! Background ingestion of uploaded institutional data files.
//!
//! [`IngestionOrchestrator::submit`] validates a batch, registers a pending
//! job and queues it. A worker then runs it through [`IngestRunner`], which
//! looks each file's category up in the [`FileTypeRegistry`], parses it and
//! replace-writes the rows. Failures are recorded per file.

pub mod batch;
pub mod error;
pub mod orchestrator;
pub mod registry;
pub mod runner;
pub mod table;

pub use batch::{UploadBatch, UploadedFile};
pub use error::{FileError, IngestError, PersistError};
pub use orchestrator::IngestionOrchestrator;
pub use registry::{FileType, FileTypeRegistry, ParseFn, PersistFn};
pub use runner::IngestRunner;
pub use table::{RawTable, TableError};
