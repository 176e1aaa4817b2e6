//! Base subject - no-op measurements, default lifecycle

use crate::record::SubjectRecord;

use super::TestSubject;

/// Subject whose measurements do nothing.
///
/// Useful as a placeholder, and for reloading records of subjects whose
/// concrete type is not at hand.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseSubject {
    record: SubjectRecord,
}

impl BaseSubject {
    /// Label used when no explicit name is given.
    pub const DEFAULT_NAME: &'static str = "TestSubject";

    /// Create a base subject, stamping its start time.
    #[must_use]
    pub fn new(name: Option<&str>) -> Self {
        Self {
            record: SubjectRecord::new(name, Self::DEFAULT_NAME),
        }
    }

    /// Wrap an existing record (e.g. one read back from a snapshot).
    #[must_use]
    pub const fn from_record(record: SubjectRecord) -> Self {
        Self { record }
    }
}

impl Default for BaseSubject {
    fn default() -> Self {
        Self::new(None)
    }
}

impl TestSubject for BaseSubject {
    fn state(&self) -> &SubjectRecord {
        &self.record
    }

    fn state_mut(&mut self) -> &mut SubjectRecord {
        &mut self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_subject_default_name() {
        assert_eq!(BaseSubject::default().name(), BaseSubject::DEFAULT_NAME);
        assert_eq!(BaseSubject::new(Some("")).name(), "TestSubject");
    }

    #[test]
    fn test_base_subject_measure_is_noop() {
        let mut subject = BaseSubject::new(Some("idle"));
        let before = subject.state().clone();

        assert!(subject.measure(0).unwrap().is_none());
        assert_eq!(*subject.state(), before);
    }
}
