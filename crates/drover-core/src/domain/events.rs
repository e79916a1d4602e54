//! Lifecycle event channels.
//!
//! Each channel carries a [`ProcessSnapshot`](super::ProcessSnapshot) taken at
//! the moment of emission.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ProcessStatus;

/// Channel names reported by the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessEvent {
    /// A pending process was admitted (`process-run`).
    #[serde(rename = "process-run")]
    Run,

    /// The operation resolved (`process-fulfill`).
    #[serde(rename = "process-fulfill")]
    Fulfill,

    /// The operation failed (`process-reject`).
    #[serde(rename = "process-reject")]
    Reject,

    /// The process was evicted by its timer (`process-timeout`).
    #[serde(rename = "process-timeout")]
    Timeout,
}

impl ProcessEvent {
    pub const ALL: [ProcessEvent; 4] = [
        ProcessEvent::Run,
        ProcessEvent::Fulfill,
        ProcessEvent::Reject,
        ProcessEvent::Timeout,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProcessEvent::Run => "process-run",
            ProcessEvent::Fulfill => "process-fulfill",
            ProcessEvent::Reject => "process-reject",
            ProcessEvent::Timeout => "process-timeout",
        }
    }

    /// The channel a process reaching `status` is reported on.
    pub fn for_status(status: ProcessStatus) -> Option<Self> {
        match status {
            ProcessStatus::Pending => None,
            ProcessStatus::Running => Some(ProcessEvent::Run),
            ProcessStatus::Fulfilled => Some(ProcessEvent::Fulfill),
            ProcessStatus::Rejected => Some(ProcessEvent::Reject),
            ProcessStatus::TimedOut => Some(ProcessEvent::Timeout),
        }
    }
}

impl fmt::Display for ProcessEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown process event: {0}")]
pub struct UnknownEventError(String);

impl FromStr for ProcessEvent {
    type Err = UnknownEventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProcessEvent::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| UnknownEventError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::run(ProcessEvent::Run, "process-run")]
    #[case::fulfill(ProcessEvent::Fulfill, "process-fulfill")]
    #[case::reject(ProcessEvent::Reject, "process-reject")]
    #[case::timeout(ProcessEvent::Timeout, "process-timeout")]
    fn channel_names(#[case] event: ProcessEvent, #[case] name: &str) {
        assert_eq!(event.to_string(), name);
        assert_eq!(name.parse::<ProcessEvent>().unwrap(), event);
        assert_eq!(serde_json::to_value(event).unwrap(), serde_json::json!(name));
    }

    #[test]
    fn pending_has_no_channel() {
        assert_eq!(ProcessEvent::for_status(ProcessStatus::Pending), None);
        assert_eq!(
            ProcessEvent::for_status(ProcessStatus::TimedOut),
            Some(ProcessEvent::Timeout)
        );
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert!("process-cancel".parse::<ProcessEvent>().is_err());
    }
}
