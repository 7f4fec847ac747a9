//! JSON file item store for the blog service.
//!
//! The whole collection lives in a single JSON array on disk. Every call
//! re-reads the document, and every mutating call rewrites all of it.
//! Read-modify-write cycles are serialized within the process, and the
//! rewrite goes through a temporary file that is renamed over the document.
//! Several processes sharing one document are still not coordinated.

use crate::error::{StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One stored entity: a mandatory `id` plus any other fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            fields: Map::new(),
        }
    }

    #[cfg(test)]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Overwrites the given fields and keeps everything else. `id` is never
    /// taken from `fields`.
    pub fn merge(&mut self, fields: Map<String, Value>) {
        for (key, value) in fields {
            if key == "id" {
                continue;
            }
            self.fields.insert(key, value);
        }
    }

    pub fn from_typed<T: Serialize>(value: &T) -> StoreResult<Self> {
        let json =
            serde_json::to_value(value).map_err(|e| StoreError::InvalidRecord(e.to_string()))?;
        serde_json::from_value(json).map_err(|e| StoreError::InvalidRecord(e.to_string()))
    }

    pub fn into_typed<T: DeserializeOwned>(self) -> StoreResult<T> {
        let id = self.id;
        let json = serde_json::to_value(self)
            .map_err(|e| StoreError::CorruptData(format!("record {}: {}", id, e)))?;
        serde_json::from_value(json)
            .map_err(|e| StoreError::CorruptData(format!("record {}: {}", id, e)))
    }
}

/// CRUD over a collection of records.
pub trait ItemStore: Send + Sync {
    /// Every record, in document order.
    fn load_all(&self) -> StoreResult<Vec<Record>>;

    /// One past the highest id in the store, 1 when empty. Nothing is
    /// reserved, so use [`ItemStore::insert_new`] when the id must not race.
    fn allocate_id(&self) -> StoreResult<u64>;

    /// Appends a record. Does not check that its id is unused; a record whose
    /// `fields` carry a second `id` is rejected.
    fn create(&self, record: Record) -> StoreResult<()>;

    /// First record with `id`, or `None`.
    fn get(&self, id: u64) -> StoreResult<Option<Record>>;

    /// Applies `edit` to the record with `id` and persists the result. Nothing
    /// is written when `edit` fails.
    fn modify(
        &self,
        id: u64,
        edit: &mut dyn FnMut(&mut Record) -> StoreResult<()>,
    ) -> StoreResult<Record>;

    fn delete(&self, id: u64) -> StoreResult<()>;

    /// Allocates the next id and appends a record with `fields` in one cycle.
    fn insert_new(&self, fields: Map<String, Value>) -> StoreResult<Record>;

    /// Overwrites the whole collection. Returns the number of records written.
    /// Rejects a set that repeats an id.
    fn replace_all(&self, records: Vec<Record>) -> StoreResult<usize>;

    /// Human readable location of the backing document.
    fn location(&self) -> String;

    /// Merges `fields` into the record with `id`.
    fn update(&self, id: u64, fields: Map<String, Value>) -> StoreResult<()> {
        let mut fields = Some(fields);
        self.modify(id, &mut |record| {
            if let Some(fields) = fields.take() {
                record.merge(fields);
            }
            Ok(())
        })?;
        Ok(())
    }
}

pub struct JsonStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonStore {
    /// Opens an existing document. The file is not created.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(StoreError::Configuration(
                "document path is an empty string".to_string(),
            ));
        }
        if !path.exists() {
            return Err(StoreError::NotFound(format!(
                "'{}' does not exist",
                path.display()
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
            write_lock: Mutex::new(()),
        })
    }

    /// Writes an empty collection to `path` if nothing is there yet, then opens it.
    pub fn create_empty(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(StoreError::Configuration(
                "document path is an empty string".to_string(),
            ));
        }
        if !path.exists() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, "[]\n")?;
            log::info!("Created empty document at {}", path.display());
        }
        Self::open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn read_records(&self) -> StoreResult<Vec<Record>> {
        let raw = fs::read(&self.path)?;
        serde_json::from_slice(&raw)
            .map_err(|e| StoreError::CorruptData(format!("{}: {}", self.path.display(), e)))
    }

    fn commit(&self, records: &[Record]) -> StoreResult<()> {
        let mut json = serde_json::to_vec_pretty(records)
            .map_err(|e| StoreError::InvalidRecord(e.to_string()))?;
        json.push(b'\n');

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

fn next_id(records: &[Record]) -> u64 {
    records
        .iter()
        .map(|r| r.id)
        .max()
        .map_or(1, |max| max.saturating_add(1))
}

fn check_fields(record: &Record) -> StoreResult<()> {
    if record.fields.contains_key("id") {
        return Err(StoreError::InvalidRecord(format!(
            "record {} carries a second 'id' field",
            record.id
        )));
    }
    Ok(())
}

fn check_unique_ids(records: &[Record]) -> StoreResult<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        check_fields(record)?;
        if !seen.insert(record.id) {
            return Err(StoreError::InvalidRecord(format!(
                "id '{}' appears more than once",
                record.id
            )));
        }
    }
    Ok(())
}

fn position_of(records: &[Record], id: u64) -> StoreResult<usize> {
    records
        .iter()
        .position(|r| r.id == id)
        .ok_or_else(|| StoreError::NotFound(format!("an item with id '{}' does not exist", id)))
}

impl ItemStore for JsonStore {
    fn load_all(&self) -> StoreResult<Vec<Record>> {
        self.read_records()
    }

    fn allocate_id(&self) -> StoreResult<u64> {
        Ok(next_id(&self.read_records()?))
    }

    fn create(&self, record: Record) -> StoreResult<()> {
        check_fields(&record)?;
        let _guard = self.lock();
        let mut records = self.read_records()?;
        records.push(record);
        self.commit(&records)
    }

    fn get(&self, id: u64) -> StoreResult<Option<Record>> {
        Ok(self.read_records()?.into_iter().find(|r| r.id == id))
    }

    fn modify(
        &self,
        id: u64,
        edit: &mut dyn FnMut(&mut Record) -> StoreResult<()>,
    ) -> StoreResult<Record> {
        let _guard = self.lock();
        let mut records = self.read_records()?;
        let index = position_of(&records, id)?;
        edit(&mut records[index])?;
        // The edit may not move a record to another id.
        records[index].id = id;
        records[index].fields.remove("id");
        self.commit(&records)?;
        Ok(records.swap_remove(index))
    }

    fn delete(&self, id: u64) -> StoreResult<()> {
        let _guard = self.lock();
        let mut records = self.read_records()?;
        let index = position_of(&records, id)?;
        records.remove(index);
        self.commit(&records)
    }

    fn insert_new(&self, fields: Map<String, Value>) -> StoreResult<Record> {
        let _guard = self.lock();
        let mut records = self.read_records()?;
        let mut record = Record::new(next_id(&records));
        record.merge(fields);
        records.push(record.clone());
        self.commit(&records)?;
        Ok(record)
    }

    fn replace_all(&self, records: Vec<Record>) -> StoreResult<usize> {
        check_unique_ids(&records)?;
        let _guard = self.lock();
        self.commit(&records)?;
        Ok(records.len())
    }

    fn location(&self) -> String {
        self.path().display().to_string()
    }
}
