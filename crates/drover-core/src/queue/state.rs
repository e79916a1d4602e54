//! Tracked sequence + run state, mutated only under the queue's lock.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};

use super::Concurrency;
use super::record::ProcessRecord;
use crate::domain::{ProcessId, ProcessSnapshot, ProcessStatus, RunState};
use crate::observability::QueueCounts;
use crate::operation::BoxedOperation;

#[derive(Debug)]
pub(crate) struct QueueState {
    /// Pending and running processes, in admission order.
    processes: VecDeque<ProcessRecord>,

    /// Running processes dropped by `clear`. Not tracked and not counted
    /// against the limit; kept only so their settlement is still reported.
    detached: HashMap<ProcessId, ProcessRecord>,

    run_state: RunState,
    concurrency: Concurrency,
}

impl QueueState {
    pub(crate) fn new(concurrency: Concurrency, run_state: RunState) -> Self {
        Self {
            processes: VecDeque::new(),
            detached: HashMap::new(),
            run_state,
            concurrency,
        }
    }

    pub(crate) fn run_state(&self) -> RunState {
        self.run_state
    }

    pub(crate) fn set_run_state(&mut self, run_state: RunState) {
        self.run_state = run_state;
    }

    pub(crate) fn concurrency(&self) -> Concurrency {
        self.concurrency
    }

    pub(crate) fn set_concurrency(&mut self, concurrency: Concurrency) {
        self.concurrency = concurrency;
    }

    pub(crate) fn len(&self) -> usize {
        self.processes.len()
    }

    pub(crate) fn running(&self) -> usize {
        self.processes
            .iter()
            .filter(|record| record.status() == ProcessStatus::Running)
            .count()
    }

    /// Append, keeping the batch order.
    pub(crate) fn push_back(&mut self, records: Vec<ProcessRecord>) {
        self.processes.extend(records);
    }

    /// Prepend, keeping the batch order: `[a, b]` onto `[x]` gives `[a, b, x]`.
    pub(crate) fn push_front(&mut self, records: Vec<ProcessRecord>) {
        for record in records.into_iter().rev() {
            self.processes.push_front(record);
        }
    }

    /// Promote pending processes in order until the concurrency limit is hit.
    ///
    /// Returns the snapshot (already `running`) and operation of each process
    /// started by this pass. The caller emits and spawns outside the lock.
    pub(crate) fn admit(&mut self, now: DateTime<Utc>) -> Vec<(ProcessSnapshot, BoxedOperation)> {
        let limit = self.concurrency;
        let mut running = self.running();
        let mut started = Vec::new();

        for record in self.processes.iter_mut() {
            if !record.status().is_pending() {
                continue;
            }
            if !limit.admits(running) {
                break;
            }
            if let Some(operation) = record.start(now) {
                running += 1;
                started.push((record.snapshot(), operation));
            }
        }
        started
    }

    /// Remove a tracked or detached process for settlement.
    ///
    /// `None` once it has already been settled.
    pub(crate) fn take(&mut self, id: ProcessId) -> Option<ProcessRecord> {
        match self.processes.iter().position(|record| record.id() == id) {
            Some(index) => self.processes.remove(index),
            None => self.detached.remove(&id),
        }
    }

    /// Stop tracking every process, returning how many there were.
    ///
    /// Pending operations are dropped; running ones are detached.
    pub(crate) fn clear(&mut self) -> usize {
        let removed = self.processes.len();
        for record in self.processes.drain(..) {
            if record.status() == ProcessStatus::Running {
                self.detached.insert(record.id(), record);
            }
        }
        removed
    }

    pub(crate) fn detached(&self) -> usize {
        self.detached.len()
    }

    pub(crate) fn snapshots(&self) -> Vec<ProcessSnapshot> {
        self.processes.iter().map(ProcessRecord::snapshot).collect()
    }

    pub(crate) fn counts(&self) -> QueueCounts {
        let mut counts = QueueCounts::default();
        for record in &self.processes {
            match record.status() {
                ProcessStatus::Pending => counts.pending += 1,
                ProcessStatus::Running => counts.running += 1,
                // settled records are removed, never stored
                ProcessStatus::Fulfilled | ProcessStatus::Rejected | ProcessStatus::TimedOut => {}
            }
        }
        counts
    }
}
