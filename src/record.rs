//! Subject Record - the `Info`/`Data` dictionary a test subject owns
//!
//! ## Layout
//!
//! ```text
//! SubjectRecord
//!   ├── Info  { "Name", "Datetime Start", "Datetime Finish"?, "Test ID"? , ... }
//!   └── Data  { subject-defined measurement series }
//! ```
//!
//! Both halves are ordered maps, so serializing the same in-memory state
//! always produces the same bytes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{clock, Error, Result};

/// Metadata half of a subject record (scalars and strings).
pub type Info = BTreeMap<String, Value>;

/// Measurement half of a subject record (arbitrary, subject-defined).
pub type Data = BTreeMap<String, Value>;

/// Top-level key of the metadata half.
pub const INFO_KEY: &str = "Info";
/// Top-level key of the measurement half.
pub const DATA_KEY: &str = "Data";

/// `Info` key: identity label, fixed at construction.
pub const NAME: &str = "Name";
/// `Info` key: creation timestamp, set once at construction.
pub const DATETIME_START: &str = "Datetime Start";
/// `Info` key: set once by the final measurement.
pub const DATETIME_FINISH: &str = "Datetime Finish";
/// `Info` key: `"{name}_{index}"`, set at record time.
pub const TEST_ID: &str = "Test ID";

/// The information record of one test subject.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubjectRecord {
    /// Metadata (`Name`, timestamps, `Test ID`, ...).
    #[serde(rename = "Info", default)]
    pub info: Info,
    /// Measurements, mutated in place every epoch.
    #[serde(rename = "Data", default)]
    pub data: Data,
}

impl SubjectRecord {
    /// Create a fresh record, stamping `Datetime Start` with [`clock::timestamp`].
    ///
    /// # Arguments
    ///
    /// * `name` - Explicit display name; `None` or an empty string selects the default
    /// * `default_name` - Type-level label of the concrete subject
    #[must_use]
    pub fn new(name: Option<&str>, default_name: &str) -> Self {
        Self::started_at(name, default_name, clock::timestamp())
    }

    /// Create a fresh record whose `Datetime Start` is `datetime_start`.
    ///
    /// Pass `storage.current_timestamp_string()` to stamp with the same clock
    /// the experiment uses for folder names.
    #[must_use]
    pub fn started_at(
        name: Option<&str>,
        default_name: &str,
        datetime_start: impl Into<String>,
    ) -> Self {
        let name = match name {
            Some(name) if !name.is_empty() => name,
            _ => default_name,
        };

        let mut info = Info::new();
        info.insert(DATETIME_START.to_string(), Value::from(datetime_start.into()));
        info.insert(NAME.to_string(), Value::from(name));

        Self {
            info,
            data: Data::new(),
        }
    }

    /// The subject's display name (empty if the record carries none).
    #[must_use]
    pub fn name(&self) -> &str {
        self.info_str(NAME).unwrap_or_default()
    }

    /// Creation timestamp.
    #[must_use]
    pub fn datetime_start(&self) -> Option<&str> {
        self.info_str(DATETIME_START)
    }

    /// Finish timestamp, present only after the final measurement.
    #[must_use]
    pub fn datetime_finish(&self) -> Option<&str> {
        self.info_str(DATETIME_FINISH)
    }

    /// `Test ID`, present only after the subject has been recorded.
    #[must_use]
    pub fn test_id(&self) -> Option<&str> {
        self.info_str(TEST_ID)
    }

    /// Look up a string-valued `Info` entry.
    #[must_use]
    pub fn info_str(&self, key: &str) -> Option<&str> {
        self.info.get(key).and_then(Value::as_str)
    }

    /// Append `value` to the array stored under `key` in `Data`.
    ///
    /// Creates the array on first use. A non-array entry already stored under
    /// `key` is replaced by a one-element array.
    pub fn push_data(&mut self, key: &str, value: impl Into<Value>) {
        let entry = self
            .data
            .entry(key.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        match entry {
            Value::Array(series) => series.push(value.into()),
            other => *other = Value::Array(vec![value.into()]),
        }
    }

    /// Number of entries in the `Data` series stored under `key`.
    #[must_use]
    pub fn series_len(&self, key: &str) -> usize {
        self.data
            .get(key)
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    /// Convert into a nested JSON mapping with top-level `Info` and `Data` keys.
    ///
    /// # Errors
    ///
    /// Returns error if a value cannot be represented as JSON
    pub fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Rebuild a record from a nested JSON mapping.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRecord` if `value` is not a mapping with an `Info`
    /// mapping, or if `Info` has no non-empty string `Name`
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(map) = &value else {
            return Err(Error::InvalidRecord("expected a mapping".to_string()));
        };
        let Some(Value::Object(info)) = map.get(INFO_KEY) else {
            return Err(Error::InvalidRecord(format!("missing `{INFO_KEY}` mapping")));
        };
        if !info
            .get(NAME)
            .and_then(Value::as_str)
            .is_some_and(|name| !name.is_empty())
        {
            return Err(Error::InvalidRecord(format!(
                "`{INFO_KEY}` has no `{NAME}`"
            )));
        }
        serde_json::from_value(value)
            .map_err(|e| Error::InvalidRecord(format!("malformed record: {e}")))
    }
}
