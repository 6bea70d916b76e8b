use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::IngestConfig;

use super::error::IngestError;

/// One uploaded file and the category it was submitted under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub category: String,
    pub path: PathBuf,
}

/// Files submitted together as one job, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadBatch {
    files: Vec<UploadedFile>,
}

impl UploadBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, category: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.push(category, path);
        self
    }

    pub fn push(&mut self, category: impl Into<String>, path: impl Into<PathBuf>) {
        self.files.push(UploadedFile {
            category: category.into(),
            path: path.into(),
        });
    }

    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UploadedFile> {
        self.files.iter()
    }

    /// Checks the batch before a job is created for it.
    ///
    /// Categories are not checked against the registry here; an unknown
    /// category fails only its own file during the run.
    pub fn validate(&self, config: &IngestConfig) -> Result<(), IngestError> {
        if self.files.is_empty() {
            return Err(IngestError::EmptyBatch);
        }
        if self.files.len() > config.max_files_per_job {
            return Err(IngestError::TooManyFiles {
                count: self.files.len(),
                max: config.max_files_per_job,
            });
        }

        let mut seen = HashSet::new();
        for file in &self.files {
            if !seen.insert(file.category.as_str()) {
                return Err(IngestError::DuplicateCategory(file.category.clone()));
            }
            check_file(&file.path, config.max_file_size_bytes)?;
        }

        Ok(())
    }
}

fn check_file(path: &Path, max_size: Option<u64>) -> Result<(), IngestError> {
    let metadata = match std::fs::metadata(path) {
        Ok(m) if m.is_file() => m,
        _ => return Err(IngestError::MissingFile(path.to_path_buf())),
    };
    if let Some(max) = max_size {
        if metadata.len() > max {
            return Err(IngestError::FileTooLarge {
                path: path.to_path_buf(),
                size: metadata.len(),
                max,
            });
        }
    }
    Ok(())
}

impl FromIterator<UploadedFile> for UploadBatch {
    fn from_iter<I: IntoIterator<Item = UploadedFile>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a UploadBatch {
    type Item = &'a UploadedFile;
    type IntoIter = std::slice::Iter<'a, UploadedFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn csv_file(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(".csv").unwrap();
        write!(file, "{}", body).unwrap();
        file
    }

    #[test]
    fn test_preserves_insertion_order() {
        let batch = UploadBatch::new()
            .with_file("students", "/a.csv")
            .with_file("kpi", "/b.csv")
            .with_file("publications", "/c.csv");

        let categories: Vec<&str> = batch.iter().map(|f| f.category.as_str()).collect();
        assert_eq!(categories, vec!["students", "kpi", "publications"]);
    }

    #[test]
    fn test_empty_batch_rejected() {
        let result = UploadBatch::new().validate(&IngestConfig::default());
        assert!(matches!(result, Err(IngestError::EmptyBatch)));
    }

    #[test]
    fn test_too_many_files_rejected() {
        let file = csv_file("a\n");
        let batch: UploadBatch = (0..5)
            .map(|i| UploadedFile {
                category: format!("type{}", i),
                path: file.path().to_path_buf(),
            })
            .collect();

        let result = batch.validate(&IngestConfig::default());
        assert!(matches!(
            result,
            Err(IngestError::TooManyFiles { count: 5, max: 4 })
        ));
    }

    #[test]
    fn test_duplicate_category_rejected() {
        let a = csv_file("a\n");
        let b = csv_file("b\n");
        let batch = UploadBatch::new()
            .with_file("students", a.path())
            .with_file("students", b.path());

        let result = batch.validate(&IngestConfig::default());
        assert!(matches!(result, Err(IngestError::DuplicateCategory(ref c)) if c == "students"));
    }

    #[test]
    fn test_missing_file_rejected() {
        let dir = TempDir::new().unwrap();
        let batch = UploadBatch::new().with_file("students", dir.path().join("gone.csv"));
        assert!(matches!(
            batch.validate(&IngestConfig::default()),
            Err(IngestError::MissingFile(_))
        ));

        // A directory is not an uploaded file either.
        let batch = UploadBatch::new().with_file("students", dir.path());
        assert!(matches!(
            batch.validate(&IngestConfig::default()),
            Err(IngestError::MissingFile(_))
        ));
    }

    #[test]
    fn test_file_size_limit() {
        let file = csv_file("0123456789");
        let batch = UploadBatch::new().with_file("students", file.path());

        let mut config = IngestConfig {
            max_file_size_bytes: Some(5),
            ..IngestConfig::default()
        };
        assert!(matches!(
            batch.validate(&config),
            Err(IngestError::FileTooLarge { size: 10, max: 5, .. })
        ));

        config.max_file_size_bytes = None;
        assert!(batch.validate(&config).is_ok());
    }

    #[test]
    fn test_unknown_category_accepted() {
        let file = csv_file("a\n");
        let batch = UploadBatch::new().with_file("grades", file.path());
        assert!(batch.validate(&IngestConfig::default()).is_ok());
    }
}
