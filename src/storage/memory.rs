//! In-memory storage backend using `DashMap`.
//!
//! Nothing touches the disk - data is lost when the backend is dropped.
//! Used by the test suite and benchmarks, where the interesting part is
//! *what* was written and *when*, not the bytes on disk.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::{DashMap, DashSet};
use serde_json::Value;

use super::{snapshot_file_name, validate_key, Storage};
use crate::{clock, Error, Result};

/// In-memory storage keyed by path.
///
/// # Example
///
/// ```rust
/// use exlab::storage::{MemoryStorage, Storage};
/// use serde_json::json;
/// use std::path::Path;
///
/// let storage = MemoryStorage::new();
/// storage.write_structured_record(Path::new("a"), &json!({"k": 1})).unwrap();
/// assert_eq!(storage.write_count(), 1);
/// assert_eq!(storage.record_at(Path::new("a")), Some(json!({"k": 1})));
/// ```
#[derive(Debug, Default)]
pub struct MemoryStorage {
    directories: DashSet<PathBuf>,
    records: DashMap<PathBuf, Value>,
    snapshots: DashMap<PathBuf, Value>,
    writes: AtomicUsize,
    fixed_timestamp: Option<String>,
}

impl MemoryStorage {
    /// Create a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend whose clock always reports `timestamp`.
    ///
    /// Makes save-folder names predictable in tests.
    #[must_use]
    pub fn with_fixed_timestamp(timestamp: impl Into<String>) -> Self {
        Self {
            fixed_timestamp: Some(timestamp.into()),
            ..Self::default()
        }
    }

    /// Check whether `path` was created as a directory.
    #[must_use]
    pub fn has_directory(&self, path: &Path) -> bool {
        self.directories.contains(path)
    }

    /// All created directories, sorted.
    #[must_use]
    pub fn directories(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self.directories.iter().map(|d| d.key().clone()).collect();
        dirs.sort();
        dirs
    }

    /// The record last written to `folder`, if any.
    #[must_use]
    pub fn record_at(&self, folder: &Path) -> Option<Value> {
        self.records.get(folder).map(|r| r.value().clone())
    }

    /// The snapshot stored under `label` in `folder`, if any.
    #[must_use]
    pub fn snapshot_at(&self, folder: &Path, label: &str) -> Option<Value> {
        self.snapshots
            .get(&folder.join(snapshot_file_name(label)))
            .map(|s| s.value().clone())
    }

    /// Total number of structured-record writes.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// Number of folders holding a record.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

fn not_found(path: &Path) -> Error {
    Error::Io(io::Error::new(
        io::ErrorKind::NotFound,
        format!("nothing stored at {}", path.display()),
    ))
}

impl Storage for MemoryStorage {
    fn create_directory(&self, parent: &Path, name: &str) -> Result<PathBuf> {
        validate_key(name)?;
        let path = parent.join(name);
        self.directories.insert(path.clone());
        Ok(path)
    }

    fn write_structured_record(&self, folder: &Path, record: &Value) -> Result<()> {
        let Value::Object(map) = record else {
            return Err(Error::InvalidRecord(
                "structured records must be mappings".to_string(),
            ));
        };
        for key in map.keys() {
            validate_key(key)?;
        }
        self.records.insert(folder.to_path_buf(), record.clone());
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn read_structured_record(&self, folder: &Path) -> Result<Value> {
        self.record_at(folder).ok_or_else(|| not_found(folder))
    }

    fn snapshot_object(&self, folder: &Path, label: &str, object: &Value) -> Result<PathBuf> {
        validate_key(label)?;
        let path = folder.join(snapshot_file_name(label));
        self.snapshots.insert(path.clone(), object.clone());
        Ok(path)
    }

    fn read_snapshot(&self, folder: &Path, label: &str) -> Result<Value> {
        validate_key(label)?;
        self.snapshot_at(folder, label)
            .ok_or_else(|| not_found(&folder.join(snapshot_file_name(label))))
    }

    fn current_timestamp_string(&self) -> String {
        self.fixed_timestamp.clone().unwrap_or_else(clock::timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_storage_directories() {
        let storage = MemoryStorage::new();
        let path = storage.create_directory(Path::new("root"), "A_0").unwrap();
        storage.create_directory(Path::new("root"), "A_0").unwrap();

        assert!(storage.has_directory(&path));
        assert_eq!(storage.directories(), vec![PathBuf::from("root/A_0")]);
    }

    #[test]
    fn test_memory_storage_overwrites_record() {
        let storage = MemoryStorage::new();
        let folder = Path::new("root/A_0");
        storage.write_structured_record(folder, &json!({"v": 1})).unwrap();
        storage.write_structured_record(folder, &json!({"v": 2})).unwrap();

        assert_eq!(storage.read_structured_record(folder).unwrap(), json!({"v": 2}));
        assert_eq!(storage.write_count(), 2);
        assert_eq!(storage.record_count(), 1);
    }

    #[test]
    fn test_memory_storage_missing_record() {
        let storage = MemoryStorage::new();
        let result = storage.read_structured_record(Path::new("nowhere"));
        assert!(matches!(result, Err(Error::Io(e)) if e.kind() == io::ErrorKind::NotFound));
    }

    #[test]
    fn test_memory_storage_fixed_timestamp() {
        let storage = MemoryStorage::with_fixed_timestamp("T0");
        assert_eq!(storage.current_timestamp_string(), "T0");
    }

    #[test]
    fn test_memory_storage_snapshot() {
        let storage = MemoryStorage::new();
        storage
            .snapshot_object(Path::new("root"), "exp", &json!({"id": "E"}))
            .unwrap();
        assert_eq!(
            storage.read_snapshot(Path::new("root"), "exp").unwrap(),
            json!({"id": "E"})
        );
        assert!(storage.snapshot_at(Path::new("root"), "other").is_none());
    }
}
