//! # exlab: Epoch-Driven Experiment Harness
//!
//! **Version**: 0.1.0
//!
//! exlab runs repeated measurements ("epochs") against a set of independent
//! test subjects and records their results to disk, the way a lab
//! experiment tracks subjects over time.
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Jidoka**: The first failed measurement stops the run, after an
//!   emergency record of every subject
//! - **Poka-Yoke**: The subject sequence is fixed at construction, so
//!   identities (`{name}{index}`) cannot drift mid-run
//! - **Genchi Genbutsu**: Every subject keeps its raw `Info`/`Data` record;
//!   the harness aggregates, it does not interpret
//!
//! ## Example Usage
//!
//! ```rust
//! use exlab::record::SubjectRecord;
//! use exlab::storage::MemoryStorage;
//! use exlab::subject::TestSubject;
//! use exlab::{ExperimentBuilder, SubjectResult};
//!
//! struct Counter {
//!     record: SubjectRecord,
//! }
//!
//! impl TestSubject for Counter {
//!     fn state(&self) -> &SubjectRecord {
//!         &self.record
//!     }
//!
//!     fn state_mut(&mut self) -> &mut SubjectRecord {
//!         &mut self.record
//!     }
//!
//!     fn measure(&mut self, epoch: u64) -> SubjectResult<Option<String>> {
//!         self.record.push_data("count", epoch);
//!         Ok(None)
//!     }
//! }
//!
//! let counter = Counter { record: SubjectRecord::new(None, "Counter") };
//! let mut exp = ExperimentBuilder::new("results")
//!     .print_report(false)
//!     .subject(counter)
//!     .build(MemoryStorage::new())?;
//!
//! exp.run(3)?;
//! assert_eq!(exp.experiment_info()["Counter0"].series_len("count"), 3);
//! # Ok::<(), exlab::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod clock;
pub mod config;
pub mod error;
pub mod experiment;
pub mod logging;
pub mod record;
pub mod storage;
pub mod subject;

pub use config::ExperimentConfig;
pub use error::{Error, MeasurementFailure, MeasurementPhase, Result, SubjectResult};
pub use experiment::{run_single, Experiment, ExperimentBuilder, RunState};
pub use record::SubjectRecord;
pub use storage::{FsStorage, MemoryStorage, Storage};
pub use subject::{BaseSubject, SubjectLifecycle, TestSubject};
