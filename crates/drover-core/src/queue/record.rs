//! Process record: status + operation + timestamps.

use std::fmt;

use chrono::{DateTime, Utc};
use tokio::task::JoinError;

use crate::domain::{ProcessEvent, ProcessId, ProcessSnapshot, ProcessStatus};
use crate::error::OperationError;
use crate::operation::BoxedOperation;

/// A tracked process.
///
/// Design:
/// - The record is the single source of truth for a process while it is
///   tracked; once settled it is consumed into a snapshot.
/// - The operation is owned here until the process starts.
pub(crate) struct ProcessRecord {
    id: ProcessId,
    status: ProcessStatus,
    operation: Option<BoxedOperation>,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
}

impl ProcessRecord {
    pub(crate) fn new(id: ProcessId, operation: BoxedOperation, now: DateTime<Utc>) -> Self {
        Self {
            id,
            status: ProcessStatus::Pending,
            operation: Some(operation),
            created_at: now,
            started_at: None,
        }
    }

    pub(crate) fn id(&self) -> ProcessId {
        self.id
    }

    pub(crate) fn status(&self) -> ProcessStatus {
        self.status
    }

    /// Mark as running and hand over the operation.
    ///
    /// Returns `None` (and leaves the record untouched) unless it is pending.
    pub(crate) fn start(&mut self, now: DateTime<Utc>) -> Option<BoxedOperation> {
        if !self.status.is_pending() {
            return None;
        }
        let operation = self.operation.take()?;
        self.status = ProcessStatus::Running;
        self.started_at = Some(now);
        Some(operation)
    }

    pub(crate) fn snapshot(&self) -> ProcessSnapshot {
        ProcessSnapshot {
            id: self.id,
            status: self.status,
            created_at: self.created_at,
            started_at: self.started_at,
            settled_at: None,
            error: None,
        }
    }

    /// Consume the record into its final snapshot.
    pub(crate) fn settle(self, settlement: Settlement, now: DateTime<Utc>) -> ProcessSnapshot {
        let status = settlement.status();
        let error = match settlement {
            Settlement::Rejected(err) => Some(err.message().to_string()),
            Settlement::Fulfilled | Settlement::TimedOut => None,
        };
        ProcessSnapshot {
            status,
            settled_at: Some(now),
            error,
            ..self.snapshot()
        }
    }
}

impl fmt::Debug for ProcessRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessRecord")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("created_at", &self.created_at)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

/// How a running process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Settlement {
    Fulfilled,
    Rejected(OperationError),
    TimedOut,
}

impl Settlement {
    pub(crate) fn from_join(joined: Result<Result<(), OperationError>, JoinError>) -> Self {
        match joined {
            Ok(Ok(())) => Settlement::Fulfilled,
            Ok(Err(err)) => Settlement::Rejected(err),
            Err(err) if err.is_panic() => {
                Settlement::Rejected(OperationError::new("operation panicked"))
            }
            Err(_) => Settlement::Rejected(OperationError::new("operation was cancelled")),
        }
    }

    pub(crate) fn status(&self) -> ProcessStatus {
        match self {
            Settlement::Fulfilled => ProcessStatus::Fulfilled,
            Settlement::Rejected(_) => ProcessStatus::Rejected,
            Settlement::TimedOut => ProcessStatus::TimedOut,
        }
    }

    pub(crate) fn event(&self) -> ProcessEvent {
        match self {
            Settlement::Fulfilled => ProcessEvent::Fulfill,
            Settlement::Rejected(_) => ProcessEvent::Reject,
            Settlement::TimedOut => ProcessEvent::Timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::boxed;
    use chrono::TimeZone;
    use ulid::Ulid;

    fn record() -> ProcessRecord {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        ProcessRecord::new(
            ProcessId::from_ulid(Ulid::new()),
            boxed(|| async { Ok::<_, OperationError>(()) }),
            now,
        )
    }

    #[test]
    fn new_record_is_pending() {
        let record = record();
        assert_eq!(record.status(), ProcessStatus::Pending);
        assert!(record.snapshot().started_at.is_none());
    }

    #[test]
    fn start_hands_over_operation_once() {
        let mut record = record();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 5).unwrap();

        assert!(record.start(at).is_some());
        assert_eq!(record.status(), ProcessStatus::Running);
        assert_eq!(record.snapshot().started_at, Some(at));

        // already running
        assert!(record.start(at).is_none());
    }

    #[test]
    fn settle_rejected_keeps_error() {
        let mut record = record();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 9).unwrap();
        record.start(at);

        let snapshot = record.settle(Settlement::Rejected(OperationError::new("boom")), at);
        assert_eq!(snapshot.status, ProcessStatus::Rejected);
        assert_eq!(snapshot.error.as_deref(), Some("boom"));
        assert_eq!(snapshot.settled_at, Some(at));
    }

    #[test]
    fn settlement_maps_to_channel() {
        assert_eq!(Settlement::Fulfilled.event(), ProcessEvent::Fulfill);
        assert_eq!(Settlement::TimedOut.event(), ProcessEvent::Timeout);
        assert_eq!(
            Settlement::Rejected(OperationError::new("x")).status(),
            ProcessStatus::Rejected
        );
    }

    fn explode() -> Result<(), OperationError> {
        panic!("bad operation")
    }

    #[tokio::test]
    async fn panicking_operation_is_a_rejection() {
        let joined = tokio::spawn(async { explode() }).await;

        assert_eq!(
            Settlement::from_join(joined),
            Settlement::Rejected(OperationError::new("operation panicked"))
        );
    }
}
