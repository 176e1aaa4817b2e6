//! File-system storage backend.
//!
//! A record is expanded into a folder tree: every mapping becomes a
//! directory and every other value becomes a pretty-printed `<key>.json`
//! file. Keys are visited in sorted order, so identical records produce
//! identical trees.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use super::{snapshot_file_name, validate_key, Storage, JSON_EXTENSION};
use crate::{Error, Result};

/// Storage backend writing to the local file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStorage;

impl FsStorage {
    /// Create a new file-system backend.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

fn leaf_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{key}.{JSON_EXTENSION}"))
}

fn write_tree(dir: &Path, map: &Map<String, Value>) -> Result<()> {
    fs::create_dir_all(dir)?;

    for (key, value) in map {
        validate_key(key)?;
        let branch = dir.join(key);
        let leaf = leaf_path(dir, key);

        if let Value::Object(child) = value {
            // a key may switch from leaf to mapping between records
            if leaf.is_file() {
                fs::remove_file(&leaf)?;
            }
            write_tree(&branch, child)?;
        } else {
            if branch.is_dir() {
                fs::remove_dir_all(&branch)?;
            }
            fs::write(&leaf, serde_json::to_vec_pretty(value)?)?;
        }
    }

    Ok(())
}

fn read_tree(dir: &Path) -> Result<Map<String, Value>> {
    let mut entries = fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(fs::DirEntry::file_name);

    let mut map = Map::new();
    for entry in entries {
        let path = entry.path();
        let name = entry
            .file_name()
            .into_string()
            .map_err(|raw| Error::InvalidKey(raw.to_string_lossy().into_owned()))?;

        if path.is_dir() {
            map.insert(name, Value::Object(read_tree(&path)?));
        } else if let Some(key) = name.strip_suffix(&format!(".{JSON_EXTENSION}")) {
            let bytes = fs::read(&path)?;
            map.insert(key.to_string(), serde_json::from_slice(&bytes)?);
        }
    }

    Ok(map)
}

impl Storage for FsStorage {
    fn create_directory(&self, parent: &Path, name: &str) -> Result<PathBuf> {
        validate_key(name)?;
        let path = parent.join(name);
        fs::create_dir_all(&path)?;
        debug!(path = %path.display(), "created directory");
        Ok(path)
    }

    fn write_structured_record(&self, folder: &Path, record: &Value) -> Result<()> {
        let Value::Object(map) = record else {
            return Err(Error::InvalidRecord(
                "structured records must be mappings".to_string(),
            ));
        };
        write_tree(folder, map)?;
        debug!(folder = %folder.display(), keys = map.len(), "wrote structured record");
        Ok(())
    }

    fn read_structured_record(&self, folder: &Path) -> Result<Value> {
        Ok(Value::Object(read_tree(folder)?))
    }

    fn snapshot_object(&self, folder: &Path, label: &str, object: &Value) -> Result<PathBuf> {
        validate_key(label)?;
        fs::create_dir_all(folder)?;
        let path = folder.join(snapshot_file_name(label));
        fs::write(&path, serde_json::to_vec_pretty(object)?)?;
        debug!(path = %path.display(), "wrote snapshot");
        Ok(path)
    }

    fn read_snapshot(&self, folder: &Path, label: &str) -> Result<Value> {
        validate_key(label)?;
        let bytes = fs::read(folder.join(snapshot_file_name(label)))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
