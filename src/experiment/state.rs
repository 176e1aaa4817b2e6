//! Run state - where an experiment is in its `run` lifecycle

use serde::{Deserialize, Serialize};

/// State of an experiment run.
///
/// ```text
/// Idle ─> Looping(0..N-1) ─> FinalMeasuring ─> Recording ─> [Snapshotting] ─> Done
///              │                   │
///              └──────> EmergencyRecording ─> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// Constructed, `run` not called yet.
    Idle,
    /// Measuring every subject at `epoch`.
    Looping {
        /// Current epoch (0-based).
        epoch: u64,
    },
    /// Calling `final_measure` on every subject.
    FinalMeasuring,
    /// Persisting every subject after a normal run.
    Recording,
    /// Writing the whole-experiment snapshot.
    Snapshotting,
    /// Run completed successfully.
    Done,
    /// Flushing every subject after a measurement failure.
    EmergencyRecording,
    /// Run aborted.
    Failed,
}

impl RunState {
    /// Whether the run has finished, successfully or not.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(RunState::Done.is_terminal());
        assert!(RunState::Failed.is_terminal());
        assert!(!RunState::Idle.is_terminal());
        assert!(!RunState::Looping { epoch: 3 }.is_terminal());
        assert!(!RunState::EmergencyRecording.is_terminal());
    }
}
