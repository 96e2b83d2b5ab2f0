use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{MonthlyAnalyticsEntry, ProjectRecord};

pub const PROJECTS_KEY: &str = "pulse_projects";
pub const MONTHLY_ANALYTICS_KEY: &str = "pulse_monthly_analytics";

const PROJECTS_FILE: &str = "projects.json";
const MONTHLY_ANALYTICS_FILE: &str = "monthly_analytics.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("stored records under {key} are not valid JSON: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Anything kept in a store is addressed by a string id.
pub trait Record: Clone {
    fn id(&self) -> &str;
}

impl Record for ProjectRecord {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for MonthlyAnalyticsEntry {
    fn id(&self) -> &str {
        &self.id
    }
}

pub trait RecordStore<T: Record> {
    fn list(&self) -> StoreResult<Vec<T>>;

    fn get(&self, id: &str) -> StoreResult<Option<T>> {
        Ok(self.list()?.into_iter().find(|record| record.id() == id))
    }

    /// Replaces the record with the same id in place, or appends it.
    /// Returns `true` when the record was new.
    fn upsert(&mut self, record: T) -> StoreResult<bool>;

    /// Returns `true` when a record was removed.
    fn delete(&mut self, id: &str) -> StoreResult<bool>;
}

pub trait ProjectStore: RecordStore<ProjectRecord> {}

impl<S: RecordStore<ProjectRecord>> ProjectStore for S {}

pub trait AnalyticsStore: RecordStore<MonthlyAnalyticsEntry> {
    /// All entries, or only those for `project_id` when given.
    fn list_for_project(&self, project_id: Option<&str>) -> StoreResult<Vec<MonthlyAnalyticsEntry>> {
        let entries = self.list()?;
        Ok(match project_id {
            Some(id) => entries.into_iter().filter(|e| e.project_id == id).collect(),
            None => entries,
        })
    }
}

impl<S: RecordStore<MonthlyAnalyticsEntry>> AnalyticsStore for S {}

fn upsert_into<T: Record>(records: &mut Vec<T>, record: T) -> bool {
    match records.iter_mut().find(|existing| existing.id() == record.id()) {
        Some(existing) => {
            *existing = record;
            false
        }
        None => {
            records.push(record);
            true
        }
    }
}

fn delete_from<T: Record>(records: &mut Vec<T>, id: &str) -> bool {
    let before = records.len();
    records.retain(|record| record.id() != id);
    records.len() != before
}

/// In-process store; keeps insertion order.
#[derive(Debug, Clone)]
pub struct MemoryStore<T> {
    records: Vec<T>,
}

impl<T> MemoryStore<T> {
    pub fn new(records: Vec<T>) -> Self {
        Self { records }
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl<T: Record> RecordStore<T> for MemoryStore<T> {
    fn list(&self) -> StoreResult<Vec<T>> {
        Ok(self.records.clone())
    }

    fn upsert(&mut self, record: T) -> StoreResult<bool> {
        Ok(upsert_into(&mut self.records, record))
    }

    fn delete(&mut self, id: &str) -> StoreResult<bool> {
        Ok(delete_from(&mut self.records, id))
    }
}

/// A JSON array of records stored under `key` in `<dir>/<file_name>`. Every
/// call reads the file fresh; writes replace the whole array.
#[derive(Debug, Clone)]
pub struct JsonFileStore<T> {
    key: String,
    path: PathBuf,
    _records: PhantomData<T>,
}

impl<T> JsonFileStore<T> {
    pub fn new(dir: &Path, key: &str, file_name: &str) -> Self {
        Self {
            key: key.to_string(),
            path: dir.join(file_name),
            _records: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl JsonFileStore<ProjectRecord> {
    pub fn projects(dir: &Path) -> Self {
        Self::new(dir, PROJECTS_KEY, PROJECTS_FILE)
    }
}

impl JsonFileStore<MonthlyAnalyticsEntry> {
    pub fn monthly_analytics(dir: &Path) -> Self {
        Self::new(dir, MONTHLY_ANALYTICS_KEY, MONTHLY_ANALYTICS_FILE)
    }
}

impl<T: Record + Serialize + DeserializeOwned> JsonFileStore<T> {
    /// Creates the file with an empty array if it does not exist yet.
    pub fn init(&self) -> StoreResult<()> {
        if self.path.exists() {
            return Ok(());
        }
        self.save(&[])?;
        info!(path = %self.path.display(), "created empty record file");
        Ok(())
    }

    fn load(&self) -> StoreResult<Vec<T>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(key = %self.key, "no record file yet");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
            key: self.key.clone(),
            source,
        })
    }

    fn save(&self, records: &[T]) -> StoreResult<()> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let body = serde_json::to_string_pretty(records).map_err(|source| StoreError::Corrupt {
            key: self.key.clone(),
            source,
        })?;
        fs::write(&self.path, body).map_err(io_err)
    }
}

impl<T: Record + Serialize + DeserializeOwned> RecordStore<T> for JsonFileStore<T> {
    fn list(&self) -> StoreResult<Vec<T>> {
        self.load()
    }

    fn upsert(&mut self, record: T) -> StoreResult<bool> {
        let mut records = self.load()?;
        let inserted = upsert_into(&mut records, record);
        self.save(&records)?;
        Ok(inserted)
    }

    fn delete(&mut self, id: &str) -> StoreResult<bool> {
        let mut records = self.load()?;
        let removed = delete_from(&mut records, id);
        if removed {
            self.save(&records)?;
        }
        Ok(removed)
    }
}
