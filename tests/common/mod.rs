//! Shared test subjects and storage doubles for integration tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use exlab::record::SubjectRecord;
use exlab::storage::{MemoryStorage, Storage};
use exlab::subject::TestSubject;
use exlab::{Error, SubjectResult};
use serde_json::Value;

/// One call observed by a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Measure { subject: String, epoch: u64 },
    FinalMeasure { subject: String, last_epoch: Option<u64> },
}

/// Call log shared by every probe of one experiment.
pub type EventLog = Rc<RefCell<Vec<Event>>>;

/// Error raised by a probe on purpose.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("value out of range at epoch {0}")]
pub struct ValueError(pub u64);

/// Subject that counts epochs, logs every call, and can fail on demand.
pub struct Probe {
    record: SubjectRecord,
    log: EventLog,
    fail_at: Option<u64>,
    fail_final: bool,
}

impl Probe {
    pub const DEFAULT_NAME: &'static str = "Probe";

    pub fn new(name: &str, log: &EventLog) -> Self {
        Self {
            record: SubjectRecord::new(Some(name), Self::DEFAULT_NAME),
            log: Rc::clone(log),
            fail_at: None,
            fail_final: false,
        }
    }

    pub const fn failing_at(mut self, epoch: u64) -> Self {
        self.fail_at = Some(epoch);
        self
    }

    pub const fn failing_final(mut self) -> Self {
        self.fail_final = true;
        self
    }
}

impl TestSubject for Probe {
    fn state(&self) -> &SubjectRecord {
        &self.record
    }

    fn state_mut(&mut self) -> &mut SubjectRecord {
        &mut self.record
    }

    fn measure(&mut self, epoch: u64) -> SubjectResult<Option<String>> {
        self.log.borrow_mut().push(Event::Measure {
            subject: self.name().to_string(),
            epoch,
        });
        if self.fail_at == Some(epoch) {
            return Err(ValueError(epoch).into());
        }
        self.record.push_data("epoch", epoch);
        Ok(Some(format!("{} measured epoch {epoch}", self.name())))
    }

    fn on_final_measure(&mut self, last_epoch: Option<u64>) -> SubjectResult<()> {
        self.log.borrow_mut().push(Event::FinalMeasure {
            subject: self.name().to_string(),
            last_epoch,
        });
        if self.fail_final {
            anyhow::bail!("final probe broke");
        }
        self.record
            .data
            .insert("final_epoch".to_string(), Value::from(last_epoch));
        Ok(())
    }

    fn analysis(&self) -> Value {
        Value::from(self.record.series_len("epoch"))
    }

    fn graph(&self) -> Value {
        serde_json::json!({ "points": self.record.series_len("epoch") })
    }
}

pub fn new_log() -> EventLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Storage that creates directories but refuses every record write.
#[derive(Debug, Default)]
pub struct ReadOnlyStorage {
    inner: MemoryStorage,
}

fn denied() -> Error {
    Error::Io(io::Error::new(io::ErrorKind::PermissionDenied, "read-only storage"))
}

impl Storage for ReadOnlyStorage {
    fn create_directory(&self, parent: &Path, name: &str) -> exlab::Result<PathBuf> {
        self.inner.create_directory(parent, name)
    }

    fn write_structured_record(&self, _folder: &Path, _record: &Value) -> exlab::Result<()> {
        Err(denied())
    }

    fn read_structured_record(&self, folder: &Path) -> exlab::Result<Value> {
        self.inner.read_structured_record(folder)
    }

    fn snapshot_object(&self, _folder: &Path, _label: &str, _object: &Value) -> exlab::Result<PathBuf> {
        Err(denied())
    }

    fn read_snapshot(&self, folder: &Path, label: &str) -> exlab::Result<Value> {
        self.inner.read_snapshot(folder, label)
    }
}
