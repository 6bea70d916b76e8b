use std::path::PathBuf;

use thiserror::Error;

use crate::db::DatabaseError;
use crate::jobs::{FileErrorCode, JobStoreError};
use crate::parser::ValidationError;

use super::table::TableError;

/// Errors returned to the submitter or from a job run.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("No files were submitted")]
    EmptyBatch,

    #[error("Too many files: {count} submitted, at most {max} allowed")]
    TooManyFiles { count: usize, max: usize },

    #[error("File type '{0}' submitted more than once")]
    DuplicateCategory(String),

    #[error("Uploaded file not found: {0}")]
    MissingFile(PathBuf),

    #[error("File '{path}' is {size} bytes, limit is {max}")]
    FileTooLarge { path: PathBuf, size: u64, max: u64 },

    #[error("Ingestion queue is full, try again later")]
    QueueFull,

    #[error("Ingestion workers are shut down")]
    PoolClosed,

    #[error(transparent)]
    Store(#[from] JobStoreError),
}

/// Why one file of a job could not be ingested.
#[derive(Error, Debug)]
pub enum FileError {
    #[error("Unknown file type: {0}")]
    UnknownCategory(String),

    #[error("Failed to read file: {0}")]
    Read(#[from] TableError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to save records: {0}")]
    Persist(#[from] PersistError),
}

impl FileError {
    pub fn code(&self) -> FileErrorCode {
        match self {
            FileError::UnknownCategory(_) => FileErrorCode::UnknownType,
            FileError::Validation(_) => FileErrorCode::Validation,
            FileError::Read(_) | FileError::Persist(_) => FileErrorCode::System,
        }
    }
}

#[derive(Error, Debug)]
pub enum PersistError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// The persister does not accept this table, e.g. a category mismatch.
    #[error("{0}")]
    Rejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_error_codes() {
        assert_eq!(
            FileError::UnknownCategory("x".into()).code(),
            FileErrorCode::UnknownType
        );
        assert_eq!(
            FileError::from(ValidationError::Rule("bad".into())).code(),
            FileErrorCode::Validation
        );
        assert_eq!(
            FileError::from(PersistError::Rejected("no".into())).code(),
            FileErrorCode::System
        );
    }

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = FileError::from(ValidationError::Rule("학년 must be between 0 and 7".into()));
        assert_eq!(err.to_string(), "학년 must be between 0 and 7");
    }
}
