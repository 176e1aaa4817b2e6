//! Experiment Snapshot - the whole-object copy written at the end of a run

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::record::SubjectRecord;
use crate::storage::Storage;
use crate::subject::BaseSubject;
use crate::Result;

/// Label the snapshot is stored under in the save folder.
pub const SNAPSHOT_LABEL: &str = "exp";

/// Serializable copy of an experiment and every subject reachable from it.
///
/// Subjects are captured through their records; [`ExperimentSnapshot::subjects`]
/// rebuilds them as [`BaseSubject`]s for inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSnapshot {
    /// Experiment identifier (save-folder prefix).
    pub id: String,
    /// The experiment's save folder.
    pub save_folder: PathBuf,
    /// Whether epoch reports were enabled.
    pub print_report: bool,
    /// Number of epochs fully measured by the last run.
    pub epochs_completed: u64,
    /// When the snapshot was taken.
    pub taken_at: String,
    /// Subject records, in sequence order.
    pub subject_records: Vec<SubjectRecord>,
    /// Last recorded dictionary per subject identity.
    pub experiment_info: BTreeMap<String, SubjectRecord>,
    /// Analysis payload per subject identity.
    pub analysis_info: BTreeMap<String, Value>,
    /// Graph payload per subject identity.
    pub graph_info: BTreeMap<String, Value>,
}

impl ExperimentSnapshot {
    /// Read the snapshot previously written into `save_folder`.
    ///
    /// # Errors
    ///
    /// Returns error if no snapshot exists or it cannot be parsed
    pub fn read(storage: &dyn Storage, save_folder: &Path) -> Result<Self> {
        let value = storage.read_snapshot(save_folder, SNAPSHOT_LABEL)?;
        Ok(serde_json::from_value(value)?)
    }

    /// Rebuild the captured subjects, in sequence order.
    #[must_use]
    pub fn subjects(&self) -> Vec<BaseSubject> {
        self.subject_records
            .iter()
            .cloned()
            .map(BaseSubject::from_record)
            .collect()
    }
}
