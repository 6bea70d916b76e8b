//! Category name to parser and persister lookup.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::db::{records_repo, Database, PersistSummary};
use crate::parser::{self, ValidatedTable, ValidationError};
use crate::records::FileCategory;

use super::error::PersistError;
use super::table::RawTable;

pub type ParseFn =
    Arc<dyn Fn(&RawTable) -> Result<ValidatedTable, ValidationError> + Send + Sync>;

/// Persists a validated table. The flag requests a replace-write.
pub type PersistFn =
    Arc<dyn Fn(&ValidatedTable, bool) -> Result<PersistSummary, PersistError> + Send + Sync>;

#[derive(Clone)]
pub struct FileType {
    pub name: String,
    pub parse: ParseFn,
    pub persist: PersistFn,
}

impl fmt::Debug for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileType").field("name", &self.name).finish()
    }
}

/// Immutable after construction; share it as `Arc<FileTypeRegistry>`.
#[derive(Debug, Clone, Default)]
pub struct FileTypeRegistry {
    types: HashMap<String, FileType>,
}

impl FileTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the handler for `name`.
    pub fn register<P, S>(mut self, name: impl Into<String>, parse: P, persist: S) -> Self
    where
        P: Fn(&RawTable) -> Result<ValidatedTable, ValidationError> + Send + Sync + 'static,
        S: Fn(&ValidatedTable, bool) -> Result<PersistSummary, PersistError>
            + Send
            + Sync
            + 'static,
    {
        let name = name.into();
        self.types.insert(
            name.clone(),
            FileType {
                name,
                parse: Arc::new(parse),
                persist: Arc::new(persist),
            },
        );
        self
    }

    /// The four production categories, persisted to `db`.
    pub fn standard(db: Database) -> Self {
        let mut registry = Self::new();
        for category in FileCategory::ALL {
            let parse: fn(&RawTable) -> Result<ValidatedTable, ValidationError> = match category {
                FileCategory::ResearchFunding => parser::parse_research_funding,
                FileCategory::Students => parser::parse_students,
                FileCategory::Publications => parser::parse_publications,
                FileCategory::Kpi => parser::parse_kpi,
            };
            let db = db.clone();
            registry = registry.register(category.as_str(), parse, move |table, replace| {
                if table.category() != category {
                    return Err(PersistError::Rejected(format!(
                        "{} rows cannot be stored as {}",
                        table.category(),
                        category
                    )));
                }
                Ok(records_repo::save_table(&db, table, replace)?)
            });
        }
        registry
    }

    pub fn get(&self, name: &str) -> Option<&FileType> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn categories(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
