use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ProcessId, ProcessStatus};

/// Read-only view of a process, as returned by `get_processes` and carried by
/// every lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSnapshot {
    pub id: ProcessId,
    pub status: ProcessStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub settled_at: Option<DateTime<Utc>>,

    /// Rejection reason, set only for `rejected` processes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessSnapshot {
    pub fn is_pending(&self) -> bool {
        self.status == ProcessStatus::Pending
    }

    pub fn is_running(&self) -> bool {
        self.status == ProcessStatus::Running
    }
}
