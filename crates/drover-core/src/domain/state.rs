//! Process status and queue run state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a process.
///
/// State transitions:
/// - Pending -> Running -> Fulfilled
/// - Pending -> Running -> Rejected
/// - Pending -> Running -> TimedOut
///
/// Terminal states are never stored in the queue: reaching one removes the
/// process from the tracked sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProcessStatus {
    /// Waiting for admission.
    Pending,

    /// Admitted; the operation is executing (or waiting out the start delay).
    Running,

    /// The operation resolved.
    Fulfilled,

    /// The operation failed (or panicked).
    Rejected,

    /// Evicted because the operation did not settle within the timeout.
    TimedOut,
}

impl ProcessStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ProcessStatus::Fulfilled | ProcessStatus::Rejected | ProcessStatus::TimedOut
        )
    }

    /// Eligible for admission.
    pub fn is_pending(self) -> bool {
        matches!(self, ProcessStatus::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProcessStatus::Pending => "pending",
            ProcessStatus::Running => "running",
            ProcessStatus::Fulfilled => "fulfilled",
            ProcessStatus::Rejected => "rejected",
            ProcessStatus::TimedOut => "timed-out",
        }
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the queue promotes pending processes.
///
/// Independent of individual process status: stopping never interrupts a
/// running process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunState {
    #[default]
    Stopped,
    Running,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Stopped => f.write_str("stopped"),
            RunState::Running => f.write_str("running"),
        }
    }
}
