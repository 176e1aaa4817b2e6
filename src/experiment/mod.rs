//! Experiment Driver - the epoch loop over a fixed sequence of subjects
//!
//! The design follows how lab experiments are run: a set of independent
//! test subjects is observed once per epoch, then measured one final time
//! and recorded to disk.
//!
//! ## Run Overview
//!
//! ```text
//! for epoch in 0..epochs:          measure(epoch) on S[0], S[1], ... S[n-1]
//! final pass:                      final_measure(last_epoch) on S[0] ... S[n-1]
//! record:                          S[i].record(save_folder, i)  ->  experiment_info["{name}{i}"]
//! snapshot (optional):             save_folder/exp.json
//! ```
//!
//! Jidoka: the first failing measurement stops the line. Every subject is
//! flushed to storage (emergency record) before the failure is returned.
//!
//! ## Usage
//!
//! ```rust
//! use exlab::experiment::ExperimentBuilder;
//! use exlab::storage::MemoryStorage;
//! use exlab::subject::BaseSubject;
//!
//! # fn example() -> exlab::Result<()> {
//! let mut exp = ExperimentBuilder::new("results")
//!     .id("Baseline")
//!     .print_report(false)
//!     .subject(BaseSubject::new(Some("A")))
//!     .subject(BaseSubject::new(Some("B")))
//!     .build(MemoryStorage::new())?;
//!
//! exp.run(3)?;
//!
//! assert!(exp.experiment_info().contains_key("A0"));
//! assert!(exp.experiment_info().contains_key("B1"));
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

mod builder;
mod snapshot;
mod state;

pub use builder::{ExperimentBuilder, DEFAULT_ID};
pub use snapshot::{ExperimentSnapshot, SNAPSHOT_LABEL};
pub use state::RunState;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{error, info};

use crate::error::{MeasurementFailure, MeasurementPhase};
use crate::record::SubjectRecord;
use crate::storage::Storage;
use crate::subject::{SubjectLifecycle, TestSubject};
use crate::{Error, Result};

/// Default number of epochs for a run.
pub const DEFAULT_EPOCHS: u64 = 100;

/// Driver for a set of test subjects sharing one save folder.
pub struct Experiment<S: Storage> {
    storage: S,
    id: String,
    save_folder: PathBuf,
    test_subjects: Vec<Box<dyn TestSubject>>,
    print_report: bool,
    snapshot: bool,
    state: RunState,
    epochs_completed: u64,
    experiment_info: BTreeMap<String, SubjectRecord>,
    analysis_info: BTreeMap<String, Value>,
    graph_info: BTreeMap<String, Value>,
}

impl<S: Storage> Experiment<S> {
    /// Create an experiment with default settings.
    ///
    /// # Errors
    ///
    /// Returns error if the save folder cannot be created
    pub fn new(
        storage: S,
        save_folder: impl Into<PathBuf>,
        test_subjects: Vec<Box<dyn TestSubject>>,
    ) -> Result<Self> {
        ExperimentBuilder::new(save_folder)
            .subjects(test_subjects)
            .build(storage)
    }

    /// Experiment identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The folder created for this experiment.
    #[must_use]
    pub fn save_folder(&self) -> &Path {
        &self.save_folder
    }

    /// The storage backend.
    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// The subject sequence, in execution order.
    #[must_use]
    pub fn test_subjects(&self) -> &[Box<dyn TestSubject>] {
        &self.test_subjects
    }

    /// Number of subjects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.test_subjects.len()
    }

    /// Whether the experiment has no subjects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.test_subjects.is_empty()
    }

    /// Whether epoch reports are emitted.
    #[must_use]
    pub const fn print_report(&self) -> bool {
        self.print_report
    }

    /// Whether a snapshot is written at the end of a run.
    #[must_use]
    pub const fn snapshot_enabled(&self) -> bool {
        self.snapshot
    }

    /// Current run state.
    #[must_use]
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// Number of epochs fully measured by the last run.
    #[must_use]
    pub const fn epochs_completed(&self) -> u64 {
        self.epochs_completed
    }

    /// Last recorded dictionary per subject identity.
    #[must_use]
    pub const fn experiment_info(&self) -> &BTreeMap<String, SubjectRecord> {
        &self.experiment_info
    }

    /// Analysis payload per subject identity.
    #[must_use]
    pub const fn analysis_info(&self) -> &BTreeMap<String, Value> {
        &self.analysis_info
    }

    /// Graph payload per subject identity.
    #[must_use]
    pub const fn graph_info(&self) -> &BTreeMap<String, Value> {
        &self.graph_info
    }

    /// Record every subject, in sequence order, into the save folder.
    ///
    /// Each returned dictionary replaces the entry under the subject's
    /// identity in `experiment_info`. Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Returns the first storage error; later subjects are not recorded
    pub fn record(&mut self) -> Result<()> {
        for (index, subject) in self.test_subjects.iter_mut().enumerate() {
            let record = subject.record(&self.storage, &self.save_folder, index)?;
            self.experiment_info.insert(subject.id(index), record);
        }
        Ok(())
    }

    /// Run `epochs` epochs, the final measurement pass, and the final record.
    ///
    /// With zero epochs the loop is skipped and `final_measure` receives
    /// `None` as the last epoch.
    ///
    /// # Errors
    ///
    /// Returns `Error::Measurement` if a subject fails (after an emergency
    /// record of every subject), or a storage error from the final record
    /// or snapshot
    pub fn run(&mut self, epochs: u64) -> Result<()> {
        info!(id = %self.id, epochs, subjects = self.len(), "starting run");
        self.epochs_completed = 0;

        let mut last_epoch = None;
        for epoch in 0..epochs {
            self.state = RunState::Looping { epoch };
            if self.print_report {
                info!("Experiment Epoch {epoch}");
            }

            for index in 0..self.test_subjects.len() {
                match self.test_subjects[index].measure(epoch) {
                    Ok(Some(output)) if self.print_report => info!("{output}"),
                    Ok(_) => {}
                    Err(cause) => {
                        return Err(self.abort(index, MeasurementPhase::Measure, Some(epoch), cause))
                    }
                }
            }

            self.epochs_completed = epoch + 1;
            last_epoch = Some(epoch);
        }

        self.state = RunState::FinalMeasuring;
        for index in 0..self.test_subjects.len() {
            let finished = self.test_subjects[index].final_measure(&self.storage, last_epoch);
            if let Err(cause) = finished {
                return Err(self.abort(index, MeasurementPhase::FinalMeasure, last_epoch, cause));
            }
        }

        self.state = RunState::Recording;
        self.record().map_err(|e| {
            self.state = RunState::Failed;
            e
        })?;

        if self.snapshot {
            self.state = RunState::Snapshotting;
            self.write_snapshot().map_err(|e| {
                self.state = RunState::Failed;
                e
            })?;
        }

        self.state = RunState::Done;
        info!(id = %self.id, epochs = self.epochs_completed, "run complete");
        Ok(())
    }

    /// Announce a failed measurement, flush every subject, and build the error.
    fn abort(
        &mut self,
        index: usize,
        phase: MeasurementPhase,
        epoch: Option<u64>,
        cause: anyhow::Error,
    ) -> Error {
        let subject_id = self.test_subjects[index].id(index);
        error!(subject = %subject_id, epoch = ?epoch, "Exception occurred during {phase} of {subject_id}");

        self.state = RunState::EmergencyRecording;
        let mut failure = MeasurementFailure::new(subject_id, phase, epoch, cause);
        if let Err(record_error) = self.record() {
            error!(error = %record_error, "emergency record failed");
            failure = failure.with_emergency_record_error(&record_error);
        }

        self.state = RunState::Failed;
        Error::Measurement(failure)
    }

    /// Run every subject's analysis, keyed by identity.
    pub fn analysis(&mut self) -> &BTreeMap<String, Value> {
        for (index, subject) in self.test_subjects.iter().enumerate() {
            self.analysis_info.insert(subject.id(index), subject.analysis());
        }
        &self.analysis_info
    }

    /// Run every subject's graph step, keyed by identity.
    pub fn graph(&mut self) -> &BTreeMap<String, Value> {
        for (index, subject) in self.test_subjects.iter().enumerate() {
            self.graph_info.insert(subject.id(index), subject.graph());
        }
        &self.graph_info
    }

    /// Capture the experiment and every subject's record.
    #[must_use]
    pub fn to_snapshot(&self) -> ExperimentSnapshot {
        ExperimentSnapshot {
            id: self.id.clone(),
            save_folder: self.save_folder.clone(),
            print_report: self.print_report,
            epochs_completed: self.epochs_completed,
            taken_at: self.storage.current_timestamp_string(),
            subject_records: self
                .test_subjects
                .iter()
                .map(|s| s.state().clone())
                .collect(),
            experiment_info: self.experiment_info.clone(),
            analysis_info: self.analysis_info.clone(),
            graph_info: self.graph_info.clone(),
        }
    }

    /// Write the snapshot into the save folder under [`SNAPSHOT_LABEL`].
    ///
    /// # Errors
    ///
    /// Returns error if the snapshot cannot be serialized or written
    pub fn write_snapshot(&self) -> Result<PathBuf> {
        let value = serde_json::to_value(self.to_snapshot())?;
        self.storage
            .snapshot_object(&self.save_folder, SNAPSHOT_LABEL, &value)
    }
}

impl<S: Storage> fmt::Debug for Experiment<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.test_subjects.iter().map(|s| s.name()).collect();
        f.debug_struct("Experiment")
            .field("id", &self.id)
            .field("save_folder", &self.save_folder)
            .field("test_subjects", &names)
            .field("print_report", &self.print_report)
            .field("snapshot", &self.snapshot)
            .field("state", &self.state)
            .field("epochs_completed", &self.epochs_completed)
            .finish_non_exhaustive()
    }
}

/// Wrap a single subject in an experiment and run it.
///
/// Returns the finished experiment so its records can be inspected.
///
/// # Errors
///
/// Returns error if the experiment cannot be created or the run fails
pub fn run_single<S: Storage>(
    subject: impl TestSubject + 'static,
    storage: S,
    save_folder: impl Into<PathBuf>,
    id: &str,
    epochs: u64,
) -> Result<Experiment<S>> {
    let mut experiment = ExperimentBuilder::new(save_folder)
        .id(id)
        .subject(subject)
        .build(storage)?;
    experiment.run(epochs)?;
    Ok(experiment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::subject::BaseSubject;

    fn two_subjects() -> Experiment<MemoryStorage> {
        ExperimentBuilder::new("out")
            .print_report(false)
            .subject(BaseSubject::new(Some("A")))
            .subject(BaseSubject::new(Some("B")))
            .build(MemoryStorage::with_fixed_timestamp("T"))
            .unwrap()
    }

    #[test]
    fn test_record_keys_by_identity() {
        let mut exp = two_subjects();
        exp.record().unwrap();

        let keys: Vec<&String> = exp.experiment_info().keys().collect();
        assert_eq!(keys, ["A0", "B1"]);
        assert!(exp.storage().record_at(Path::new("out/ExperimentT/A_0")).is_some());
        assert!(exp.storage().record_at(Path::new("out/ExperimentT/B_1")).is_some());
    }

    #[test]
    fn test_run_reaches_done_with_snapshot() {
        let mut exp = two_subjects();
        exp.run(2).unwrap();

        assert_eq!(exp.state(), RunState::Done);
        assert_eq!(exp.epochs_completed(), 2);
        let snap = ExperimentSnapshot::read(exp.storage(), exp.save_folder()).unwrap();
        assert_eq!(snap.epochs_completed, 2);
        assert_eq!(snap.subject_records.len(), 2);
        assert_eq!(snap.experiment_info.len(), 2);
    }

    #[test]
    fn test_analysis_and_graph_use_separate_maps() {
        let mut exp = two_subjects();
        assert_eq!(exp.analysis().len(), 2);
        assert!(exp.graph_info().is_empty());
        assert_eq!(exp.graph().len(), 2);
        assert_eq!(exp.analysis_info().len(), 2);
    }

    #[test]
    fn test_new_uses_defaults() {
        let subjects: Vec<Box<dyn TestSubject>> = vec![Box::new(BaseSubject::default())];
        let exp = Experiment::new(MemoryStorage::with_fixed_timestamp("T"), "out", subjects)
            .unwrap();

        assert_eq!(exp.save_folder(), Path::new("out/ExperimentT"));
        assert!(exp.print_report());
        assert!(!exp.is_empty());
    }

    #[test]
    fn test_run_single() {
        let exp = run_single(
            BaseSubject::new(Some("solo")),
            MemoryStorage::new(),
            "out",
            "Solo",
            4,
        )
        .unwrap();
        assert_eq!(exp.len(), 1);
        assert!(exp.experiment_info().contains_key("solo0"));
    }

    #[test]
    fn test_debug_lists_subject_names() {
        let exp = two_subjects();
        let debug = format!("{exp:?}");
        assert!(debug.contains("\"A\""));
        assert!(debug.contains("Idle"));
    }
}
