//! Builder for `Experiment`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::info;

use super::{Experiment, RunState};
use crate::config::ExperimentConfig;
use crate::storage::Storage;
use crate::subject::TestSubject;
use crate::Result;

/// Default experiment identifier.
pub const DEFAULT_ID: &str = "Experiment";

/// Builder for [`Experiment`].
///
/// The subject sequence is fixed once `build` is called.
pub struct ExperimentBuilder {
    save_folder: PathBuf,
    id: String,
    print_report: bool,
    snapshot: bool,
    test_subjects: Vec<Box<dyn TestSubject>>,
}

impl ExperimentBuilder {
    /// Create a new builder writing under `save_folder`.
    #[must_use]
    pub fn new(save_folder: impl Into<PathBuf>) -> Self {
        Self {
            save_folder: save_folder.into(),
            id: DEFAULT_ID.to_string(),
            print_report: true,
            snapshot: true,
            test_subjects: Vec::new(),
        }
    }

    /// Apply the experiment-level settings of `config` (id and flags).
    #[must_use]
    pub fn from_config(save_folder: impl Into<PathBuf>, config: &ExperimentConfig) -> Self {
        Self::new(save_folder)
            .id(config.id.clone())
            .print_report(config.print_report)
            .snapshot(config.snapshot)
    }

    /// Set the identifier (prefix of the save-folder name).
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Enable or disable per-epoch reports.
    #[must_use]
    pub const fn print_report(mut self, print_report: bool) -> Self {
        self.print_report = print_report;
        self
    }

    /// Enable or disable the whole-experiment snapshot at the end of a run.
    #[must_use]
    pub const fn snapshot(mut self, snapshot: bool) -> Self {
        self.snapshot = snapshot;
        self
    }

    /// Append one subject to the sequence.
    #[must_use]
    pub fn subject(mut self, subject: impl TestSubject + 'static) -> Self {
        self.test_subjects.push(Box::new(subject));
        self
    }

    /// Append several subjects to the sequence.
    #[must_use]
    pub fn subjects(mut self, subjects: impl IntoIterator<Item = Box<dyn TestSubject>>) -> Self {
        self.test_subjects.extend(subjects);
        self
    }

    /// Build the experiment, creating `save_folder/{id}{timestamp}` immediately.
    ///
    /// # Errors
    ///
    /// Returns error if the save folder cannot be created (e.g. `id` is not a
    /// valid path component)
    pub fn build<S: Storage>(self, storage: S) -> Result<Experiment<S>> {
        let folder_name = format!("{}{}", self.id, storage.current_timestamp_string());
        let save_folder = storage.create_directory(&self.save_folder, &folder_name)?;

        info!(
            id = %self.id,
            save_folder = %save_folder.display(),
            subjects = self.test_subjects.len(),
            "created experiment"
        );

        Ok(Experiment {
            storage,
            id: self.id,
            save_folder,
            test_subjects: self.test_subjects,
            print_report: self.print_report,
            snapshot: self.snapshot,
            state: RunState::Idle,
            epochs_completed: 0,
            experiment_info: BTreeMap::new(),
            analysis_info: BTreeMap::new(),
            graph_info: BTreeMap::new(),
        })
    }
}
