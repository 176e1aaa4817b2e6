//! Test Subject - the measured entity driven by an [`Experiment`](crate::experiment::Experiment)
//!
//! ## Lifecycle
//!
//! ```text
//! new(name?)  ──>  measure(epoch) × N  ──>  final_measure(last_epoch)  ──>  record(folder, index)
//!  stamps                mutates                 stamps                      stamps "Test ID",
//!  "Datetime Start"      Data in place           "Datetime Finish"           writes Info/Data
//! ```
//!
//! Concrete subjects implement [`TestSubject`] by exposing their
//! [`SubjectRecord`] and overriding the measurement hooks. The lifecycle
//! (`final_measure`, `record`, `load`, `id`) lives on [`SubjectLifecycle`],
//! a sealed trait implemented for every subject, so it cannot be replaced:
//! subjects customize the terminal observation through
//! [`TestSubject::on_final_measure`] and the finish stamp always happens.

mod base;

pub use base::BaseSubject;

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::SubjectResult;
use crate::record::{SubjectRecord, DATETIME_FINISH, NAME, TEST_ID};
use crate::storage::Storage;
use crate::Result;

/// `Test ID` of the subject at `index`: `"{name}_{index}"`.
///
/// Also the name of the subject's folder under the experiment save folder.
#[must_use]
pub fn test_id(name: &str, index: usize) -> String {
    format!("{name}_{index}")
}

/// Contract every measured subject honors.
///
/// The trait is object-safe; experiments hold `Box<dyn TestSubject>`.
pub trait TestSubject {
    /// The subject's information record.
    fn state(&self) -> &SubjectRecord;

    /// Mutable access to the subject's information record.
    fn state_mut(&mut self) -> &mut SubjectRecord;

    /// Display name, fixed at construction.
    fn name(&self) -> &str {
        self.state().name()
    }

    /// Observe the subject at `epoch`, updating `Data` in place.
    ///
    /// Returns an optional human-readable summary, printed by the experiment
    /// when reporting is enabled.
    ///
    /// # Errors
    ///
    /// Returns error only for unrecoverable internal failures; the experiment
    /// aborts the run after an emergency record.
    fn measure(&mut self, epoch: u64) -> SubjectResult<Option<String>> {
        let _ = epoch;
        Ok(None)
    }

    /// Terminal observation hook, called by [`SubjectLifecycle::final_measure`].
    ///
    /// `last_epoch` is `None` when the experiment ran zero epochs.
    ///
    /// # Errors
    ///
    /// Returns error for unrecoverable internal failures.
    fn on_final_measure(&mut self, last_epoch: Option<u64>) -> SubjectResult<()> {
        let _ = last_epoch;
        Ok(())
    }

    /// Subject-defined analysis payload.
    fn analysis(&self) -> Value {
        Value::Null
    }

    /// Subject-defined graph payload.
    fn graph(&self) -> Value {
        Value::Null
    }
}

mod sealed {
    pub trait Sealed {}

    impl<T: super::TestSubject + ?Sized> Sealed for T {}
}

/// Lifecycle steps the experiment drives on every subject.
///
/// Implemented for all [`TestSubject`]s and sealed, so no subject can
/// skip the finish stamp or change how identities are derived.
pub trait SubjectLifecycle: TestSubject + sealed::Sealed {
    /// Perform the terminal observation, then stamp `Datetime Finish`.
    ///
    /// The stamp comes from `storage`'s clock and is written even when the
    /// hook fails, so an emergency record shows when the subject stopped.
    ///
    /// # Errors
    ///
    /// Returns the hook's error after stamping.
    fn final_measure(
        &mut self,
        storage: &dyn Storage,
        last_epoch: Option<u64>,
    ) -> SubjectResult<()> {
        let observed = self.on_final_measure(last_epoch);
        self.state_mut().info.insert(
            DATETIME_FINISH.to_string(),
            Value::from(storage.current_timestamp_string()),
        );
        observed
    }

    /// Write the record into `save_folder/{name}_{index}` and return it.
    ///
    /// Stamps `Test ID` first, so the persisted record carries it.
    ///
    /// # Errors
    ///
    /// Returns error if the folder cannot be created or the record cannot be written
    fn record(
        &mut self,
        storage: &dyn Storage,
        save_folder: &Path,
        index: usize,
    ) -> Result<SubjectRecord> {
        let test_id = test_id(self.name(), index);
        self.state_mut()
            .info
            .insert(TEST_ID.to_string(), Value::from(test_id.as_str()));

        let folder = storage.create_directory(save_folder, &test_id)?;
        storage.write_structured_record(&folder, &self.state().to_value()?)?;
        debug!(test_id = %test_id, folder = %folder.display(), "recorded subject");

        Ok(self.state().clone())
    }

    /// Replace the in-memory record with one previously written by `record`.
    ///
    /// The subject keeps the `Name` it was constructed with; every other
    /// `Info` and `Data` entry comes from the loaded record.
    ///
    /// # Errors
    ///
    /// Returns error if the folder cannot be read or does not hold a record
    fn load(&mut self, storage: &dyn Storage, load_folder: &Path) -> Result<SubjectRecord> {
        let mut record = SubjectRecord::from_value(storage.read_structured_record(load_folder)?)?;
        if record.name() != self.name() {
            debug!(loaded = %record.name(), kept = %self.name(), "keeping constructed name");
        }
        record.info.insert(NAME.to_string(), Value::from(self.name()));
        *self.state_mut() = record.clone();
        Ok(record)
    }

    /// Identity of the subject at position `index`: name followed by index.
    fn id(&self, index: usize) -> String {
        format!("{}{index}", self.name())
    }
}

impl<T: TestSubject + ?Sized> SubjectLifecycle for T {}
