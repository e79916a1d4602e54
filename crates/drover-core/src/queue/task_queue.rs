//! TaskQueue: bounded-concurrency admission with per-process timeout eviction.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, error, warn};

use super::record::{ProcessRecord, Settlement};
use super::state::QueueState;
use super::{Concurrency, QueueOptions, worker};
use crate::domain::{ProcessEvent, ProcessId, ProcessSnapshot, ProcessStatus, RunState};
use crate::error::EmitterError;
use crate::events::{EventEmitter, ListenerId};
use crate::observability::QueueCounts;
use crate::operation::{BoxedOperation, Operation, boxed};
use crate::ports::{Clock, IdGenerator, SystemClock, UlidGenerator};

pub type QueueEmitter = EventEmitter<ProcessEvent, ProcessSnapshot>;

/// A FIFO task queue that runs at most `concurrency` operations at once.
///
/// Cloning is cheap and every clone drives the same queue.
///
/// Design:
/// - All bookkeeping happens under one lock that is never held across an
///   `.await` or while listeners run.
/// - Each admitted process is driven by its own Tokio task racing the
///   operation against the timeout; whichever settles first wins and the
///   other finds the process gone.
/// - Mutating methods never fail. Operation failures surface only as
///   `process-reject` events.
///
/// Admission spawns onto the ambient Tokio runtime; outside one, processes
/// stay pending and an error is logged.
#[derive(Clone)]
pub struct TaskQueue {
    inner: Arc<Inner>,
}

struct Inner {
    state: Mutex<QueueState>,
    emitter: QueueEmitter,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
    delay: Duration,
    /// Number of tracked processes, for `drained`.
    tracked: watch::Sender<usize>,
}

#[derive(Debug, Clone, Copy)]
enum Placement {
    Back,
    Front,
}

impl TaskQueue {
    pub fn new(options: QueueOptions) -> Self {
        Self::builder().options(options).build()
    }

    pub fn builder() -> TaskQueueBuilder {
        TaskQueueBuilder::new()
    }

    /// Begin promoting pending processes. Warns and does nothing if already running.
    pub fn start(&self) {
        {
            let mut state = self.lock();
            if state.run_state() == RunState::Running {
                warn!("start() called on a queue that is already running");
                return;
            }
            state.set_run_state(RunState::Running);
        }
        debug!("queue started");
        self.admit();
    }

    /// Stop promoting pending processes. Running processes are not interrupted.
    pub fn stop(&self) {
        {
            let mut state = self.lock();
            if state.run_state() == RunState::Stopped {
                warn!("stop() called on a queue that is already stopped");
                return;
            }
            state.set_run_state(RunState::Stopped);
        }
        debug!("queue stopped");
    }

    /// Forget every tracked process.
    ///
    /// Pending operations are dropped without running. Running ones keep going
    /// and still report their settlement, but never re-enter the queue.
    pub fn clear(&self) {
        let removed = {
            let mut state = self.lock();
            let removed = state.clear();
            self.publish(&state);
            removed
        };
        debug!(removed, "queue cleared");
    }

    /// Append operations, returning their ids in the order given.
    pub fn push<I>(&self, operations: I) -> Vec<ProcessId>
    where
        I: IntoIterator<Item = BoxedOperation>,
    {
        self.enqueue(operations, Placement::Back)
    }

    /// Prepend operations ahead of everything already queued, keeping their
    /// relative order.
    pub fn unshift<I>(&self, operations: I) -> Vec<ProcessId>
    where
        I: IntoIterator<Item = BoxedOperation>,
    {
        self.enqueue(operations, Placement::Front)
    }

    pub fn push_one(&self, operation: impl Operation + 'static) -> ProcessId {
        let record = self.new_record(boxed(operation));
        let id = record.id();
        self.insert(vec![record], Placement::Back);
        id
    }

    pub fn unshift_one(&self, operation: impl Operation + 'static) -> ProcessId {
        let record = self.new_record(boxed(operation));
        let id = record.id();
        self.insert(vec![record], Placement::Front);
        id
    }

    pub fn concurrency(&self) -> Concurrency {
        self.lock().concurrency()
    }

    /// Change the limit. Running processes above a lowered limit are left
    /// alone; a raised limit is used immediately.
    pub fn set_concurrency(&self, concurrency: Concurrency) {
        let run_state = {
            let mut state = self.lock();
            state.set_concurrency(concurrency);
            state.run_state()
        };
        debug!(%concurrency, "concurrency changed");
        if run_state == RunState::Running {
            self.admit();
        }
    }

    /// Snapshot of the tracked processes, in queue order.
    pub fn get_processes(&self) -> Vec<ProcessSnapshot> {
        self.lock().snapshots()
    }

    pub fn counts(&self) -> QueueCounts {
        self.lock().counts()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn run_state(&self) -> RunState {
        self.lock().run_state()
    }

    pub fn is_running(&self) -> bool {
        self.run_state() == RunState::Running
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// Resolves once no process is tracked.
    ///
    /// Processes detached by `clear` are not waited for.
    pub async fn drained(&self) {
        let mut tracked = self.inner.tracked.subscribe();
        // the sender lives in `self`, so this only ends when the predicate holds
        let _ = tracked.wait_for(|len| *len == 0).await;
    }

    pub fn events(&self) -> &QueueEmitter {
        &self.inner.emitter
    }

    pub fn on<F>(&self, event: ProcessEvent, listener: F) -> Result<ListenerId, EmitterError>
    where
        F: Fn(&ProcessSnapshot) + Send + Sync + 'static,
    {
        self.inner.emitter.on(event, listener)
    }

    pub fn once<F>(&self, event: ProcessEvent, listener: F) -> Result<ListenerId, EmitterError>
    where
        F: Fn(&ProcessSnapshot) + Send + Sync + 'static,
    {
        self.inner.emitter.once(event, listener)
    }

    pub fn prepend<F>(&self, event: ProcessEvent, listener: F) -> Result<ListenerId, EmitterError>
    where
        F: Fn(&ProcessSnapshot) + Send + Sync + 'static,
    {
        self.inner.emitter.prepend(event, listener)
    }

    pub fn off(&self, event: ProcessEvent, id: ListenerId) -> bool {
        self.inner.emitter.off(&event, id)
    }

    fn new_record(&self, operation: BoxedOperation) -> ProcessRecord {
        ProcessRecord::new(
            self.inner.ids.generate_process_id(),
            operation,
            self.inner.clock.now(),
        )
    }

    fn enqueue<I>(&self, operations: I, placement: Placement) -> Vec<ProcessId>
    where
        I: IntoIterator<Item = BoxedOperation>,
    {
        let records: Vec<ProcessRecord> = operations
            .into_iter()
            .map(|operation| self.new_record(operation))
            .collect();
        let ids = records.iter().map(ProcessRecord::id).collect();
        self.insert(records, placement);
        ids
    }

    fn insert(&self, records: Vec<ProcessRecord>, placement: Placement) {
        if records.is_empty() {
            return;
        }
        let count = records.len();
        let run_state = {
            let mut state = self.lock();
            match placement {
                Placement::Back => state.push_back(records),
                Placement::Front => state.push_front(records),
            }
            self.publish(&state);
            state.run_state()
        };
        debug!(count, ?placement, "processes queued");
        if run_state == RunState::Running {
            self.admit();
        }
    }

    /// Promote pending processes, in order, up to the concurrency limit.
    fn admit(&self) {
        let (handle, started) = {
            let mut state = self.lock();
            if state.run_state() == RunState::Stopped {
                warn!("queue is stopped, pending processes are not admitted");
                return;
            }
            let Ok(handle) = Handle::try_current() else {
                error!("no Tokio runtime available, pending processes stay queued");
                return;
            };
            (handle, state.admit(self.inner.clock.now()))
        };

        for (snapshot, operation) in started {
            debug!(process = %snapshot.id, "process running");
            self.inner.emitter.emit(&ProcessEvent::Run, &snapshot);
            worker::spawn(
                &handle,
                self.clone(),
                snapshot.id,
                operation,
                self.inner.timeout,
                self.inner.delay,
            );
        }
    }

    /// Record how a process ended. A process that was already settled is
    /// ignored, which is what makes the success/failure vs. timeout race safe.
    pub(crate) fn settle(&self, id: ProcessId, settlement: Settlement) {
        let status = settlement.status();
        let event = settlement.event();
        let snapshot = {
            let mut state = self.lock();
            let Some(record) = state.take(id) else {
                debug!(process = %id, outcome = %status, "settlement for settled process ignored");
                return;
            };
            self.publish(&state);
            record.settle(settlement, self.inner.clock.now())
        };

        match status {
            ProcessStatus::TimedOut => warn!(
                process = %id,
                timeout_ms = self.inner.timeout.as_millis() as u64,
                "process timed out"
            ),
            ProcessStatus::Rejected => debug!(
                process = %id,
                error = snapshot.error.as_deref().unwrap_or_default(),
                "process rejected"
            ),
            _ => debug!(process = %id, "process fulfilled"),
        }

        self.inner.emitter.emit(&event, &snapshot);
        self.admit();
    }

    pub(crate) fn downgrade(&self) -> WeakTaskQueue {
        WeakTaskQueue(Arc::downgrade(&self.inner))
    }

    fn publish(&self, state: &QueueState) {
        self.inner.tracked.send_replace(state.len());
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new(QueueOptions::default())
    }
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("TaskQueue")
            .field("run_state", &state.run_state())
            .field("concurrency", &state.concurrency())
            .field("counts", &state.counts())
            .field("detached", &state.detached())
            .field("timeout", &self.inner.timeout)
            .field("delay", &self.inner.delay)
            .finish()
    }
}

/// Non-owning handle held by operations that outlived their timeout.
pub(crate) struct WeakTaskQueue(Weak<Inner>);

impl WeakTaskQueue {
    pub(crate) fn upgrade(&self) -> Option<TaskQueue> {
        self.0.upgrade().map(|inner| TaskQueue { inner })
    }
}

/// Builds a [`TaskQueue`] with custom ports.
pub struct TaskQueueBuilder {
    options: QueueOptions,
    ids: Option<Arc<dyn IdGenerator>>,
    clock: Option<Arc<dyn Clock>>,
}

impl TaskQueueBuilder {
    pub fn new() -> Self {
        Self {
            options: QueueOptions::default(),
            ids: None,
            clock: None,
        }
    }

    pub fn options(mut self, options: QueueOptions) -> Self {
        self.options = options;
        self
    }

    pub fn id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Some(Arc::new(ids));
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    pub fn build(self) -> TaskQueue {
        let QueueOptions {
            concurrency,
            autostart,
            timeout,
            delay,
            max_listeners,
        } = self.options;

        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(Arc::clone(&clock))));
        let run_state = if autostart {
            RunState::Running
        } else {
            RunState::Stopped
        };
        let (tracked, _) = watch::channel(0);

        TaskQueue {
            inner: Arc::new(Inner {
                state: Mutex::new(QueueState::new(concurrency, run_state)),
                emitter: EventEmitter::with_max_listeners(max_listeners),
                ids,
                clock,
                timeout,
                delay,
                tracked,
            }),
        }
    }
}

impl Default for TaskQueueBuilder {
    fn default() -> Self {
        Self::new()
    }
}
