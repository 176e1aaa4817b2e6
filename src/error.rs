//! Error types for exlab
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)

use std::fmt;

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Result type returned by subject hooks (`measure`, `final_measure`, ...).
///
/// Subjects fail with whatever error type suits them; the driver keeps the
/// original error intact so callers can downcast it.
pub type SubjectResult<T> = anyhow::Result<T>;

/// exlab error types
#[derive(Error, Debug)]
pub enum Error {
    /// A subject failed during measurement (run aborted after emergency flush)
    #[error(transparent)]
    Measurement(#[from] MeasurementFailure),

    /// Record key cannot be mapped onto the storage layout
    #[error("Invalid record key: {0:?}\nKeys must be non-empty and must not contain path separators")]
    InvalidKey(String),

    /// Loaded data does not have the `Info`/`Data` record shape
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Configuration value could not be parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Which measurement step a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementPhase {
    /// Per-epoch `measure` call.
    Measure,
    /// Terminal `final_measure` call.
    FinalMeasure,
}

impl fmt::Display for MeasurementPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Measure => write!(f, "measurement"),
            Self::FinalMeasure => write!(f, "final measurement"),
        }
    }
}

/// A subject's measurement failed and the run was aborted.
///
/// By the time a caller sees this, the driver has already attempted an
/// emergency record of every subject. The subject's own error is kept as
/// `cause` so its type and message reach the caller unchanged.
#[derive(Debug)]
pub struct MeasurementFailure {
    subject_id: String,
    phase: MeasurementPhase,
    epoch: Option<u64>,
    cause: anyhow::Error,
    emergency_record_error: Option<String>,
}

impl MeasurementFailure {
    /// Create a new measurement failure.
    ///
    /// # Arguments
    ///
    /// * `subject_id` - Identity (`id(index)`) of the failing subject
    /// * `phase` - Whether `measure` or `final_measure` failed
    /// * `epoch` - Epoch being measured, `None` for a final pass after zero epochs
    /// * `cause` - The subject's original error
    #[must_use]
    pub fn new(
        subject_id: impl Into<String>,
        phase: MeasurementPhase,
        epoch: Option<u64>,
        cause: anyhow::Error,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            phase,
            epoch,
            cause,
            emergency_record_error: None,
        }
    }

    /// Attach the error raised by the emergency record, if it failed too.
    #[must_use]
    pub fn with_emergency_record_error(mut self, error: &Error) -> Self {
        self.emergency_record_error = Some(error.to_string());
        self
    }

    /// Identity of the subject that failed.
    #[must_use]
    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    /// Measurement step that failed.
    #[must_use]
    pub const fn phase(&self) -> MeasurementPhase {
        self.phase
    }

    /// Epoch being measured when the failure happened.
    #[must_use]
    pub const fn epoch(&self) -> Option<u64> {
        self.epoch
    }

    /// The subject's original error.
    #[must_use]
    pub const fn cause(&self) -> &anyhow::Error {
        &self.cause
    }

    /// Consume the failure, returning the subject's original error.
    #[must_use]
    pub fn into_cause(self) -> anyhow::Error {
        self.cause
    }

    /// Message of the emergency record error, if the flush itself failed.
    #[must_use]
    pub fn emergency_record_error(&self) -> Option<&str> {
        self.emergency_record_error.as_deref()
    }
}

impl fmt::Display for MeasurementFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Exception occurred during {} of {}", self.phase, self.subject_id)?;
        if let Some(epoch) = self.epoch {
            write!(f, " (epoch {epoch})")?;
        }
        write!(f, ": {}", self.cause)
    }
}

impl std::error::Error for MeasurementFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let cause: &(dyn std::error::Error + Send + Sync + 'static) = self.cause.as_ref();
        Some(cause)
    }
}

impl Error {
    /// The measurement failure behind this error, if any.
    #[must_use]
    pub const fn as_measurement(&self) -> Option<&MeasurementFailure> {
        match self {
            Self::Measurement(failure) => Some(failure),
            _ => None,
        }
    }
}
