//! Storage backend for experiment output
//!
//! The harness only ever talks to storage through the [`Storage`] trait:
//! create a directory, write/read a structured record, and take an opaque
//! snapshot of a whole experiment.
//!
//! Two backends ship with the crate:
//! - [`FsStorage`]: the real file system (one JSON file per leaf value)
//! - [`MemoryStorage`]: `DashMap`-backed, for tests and benchmarks
//!
//! # Example
//!
//! ```rust
//! use exlab::storage::{MemoryStorage, Storage};
//! use serde_json::json;
//! use std::path::Path;
//!
//! # fn example() -> exlab::Result<()> {
//! let storage = MemoryStorage::new();
//! let folder = storage.create_directory(Path::new("out"), "Counter_0")?;
//! storage.write_structured_record(&folder, &json!({"Info": {"Name": "Counter"}}))?;
//! assert_eq!(storage.read_structured_record(&folder)?["Info"]["Name"], "Counter");
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

mod fs;
mod memory;

pub use fs::FsStorage;
pub use memory::MemoryStorage;

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::{clock, Error, Result};

/// File extension used for leaf values and snapshots.
pub const JSON_EXTENSION: &str = "json";

/// Storage backend trait.
///
/// Object-safe, so subjects can receive `&dyn Storage` from whichever
/// backend the experiment was built with.
pub trait Storage {
    /// Create `parent/name` (and any missing ancestors), returning its path.
    ///
    /// Creating a directory that already exists is not an error.
    ///
    /// # Errors
    ///
    /// Returns error if `name` is not a valid path component or creation fails
    fn create_directory(&self, parent: &Path, name: &str) -> Result<PathBuf>;

    /// Serialize a nested string-keyed mapping into `folder`.
    ///
    /// Existing entries with the same keys are overwritten.
    ///
    /// # Errors
    ///
    /// Returns error if `record` is not a mapping, a key is invalid, or a write fails
    fn write_structured_record(&self, folder: &Path, record: &Value) -> Result<()>;

    /// Inverse of [`Storage::write_structured_record`].
    ///
    /// # Errors
    ///
    /// Returns error if `folder` does not exist or holds unreadable data
    fn read_structured_record(&self, folder: &Path) -> Result<Value>;

    /// Store an opaque whole-object snapshot under `label` in `folder`.
    ///
    /// # Errors
    ///
    /// Returns error if `label` is invalid or the write fails
    fn snapshot_object(&self, folder: &Path, label: &str, object: &Value) -> Result<PathBuf>;

    /// Read back a snapshot written by [`Storage::snapshot_object`].
    ///
    /// # Errors
    ///
    /// Returns error if no snapshot exists under `label`
    fn read_snapshot(&self, folder: &Path, label: &str) -> Result<Value>;

    /// Human-readable timestamp used for folder names and `Info` stamps.
    fn current_timestamp_string(&self) -> String {
        clock::timestamp()
    }
}

/// Check that `key` can be used as a single path component.
///
/// # Errors
///
/// Returns `InvalidKey` for empty keys, `.`/`..`, keys containing
/// separators, or keys ending in `.json` (which would collide with the file
/// of the leaf named by the key's stem)
pub fn validate_key(key: &str) -> Result<()> {
    let bad = key.is_empty()
        || key == "."
        || key == ".."
        || key.contains(['/', '\\', '\0'])
        || key
            .strip_suffix(JSON_EXTENSION)
            .is_some_and(|stem| stem.ends_with('.'));
    if bad {
        return Err(Error::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// File name of the snapshot stored under `label`.
#[must_use]
pub fn snapshot_file_name(label: &str) -> String {
    format!("{label}.{JSON_EXTENSION}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key_accepts_plain_names() {
        assert!(validate_key("Datetime Start").is_ok());
        assert!(validate_key("Counter_0").is_ok());
        assert!(validate_key("loss.v2").is_ok());
        assert!(validate_key("json").is_ok());
        assert!(validate_key("notes_json").is_ok());
    }

    #[test]
    fn test_validate_key_rejects_path_like_names() {
        for key in ["", ".", "..", "a/b", "a\\b", "nul\0", "a.json", ".json"] {
            assert!(
                matches!(validate_key(key), Err(Error::InvalidKey(_))),
                "key {key:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_snapshot_file_name() {
        assert_eq!(snapshot_file_name("exp"), "exp.json");
    }
}
