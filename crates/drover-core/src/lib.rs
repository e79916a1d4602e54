//! drover-core
//!
//! A FIFO task queue with bounded concurrency, explicit lifecycle states and
//! per-process timeout eviction.
//!
//! # モジュール構成
//! - **domain**: ids, statuses, snapshots, event channels
//! - **ports**: Clock / IdGenerator（テストで差し替え可能）
//! - **events**: channel-keyed EventEmitter
//! - **operation**: Operation trait（引数なしの非同期処理）
//! - **queue**: TaskQueue 本体
//! - **observability**: counts + tracing setup
//!
//! ```ignore
//! let queue = TaskQueue::new(QueueOptions::new().with_concurrency(Concurrency::limited(2)?));
//! queue.on(ProcessEvent::Reject, |p| eprintln!("{} failed: {:?}", p.id, p.error))?;
//! queue.push([boxed(|| fetch("a")), boxed(|| fetch("b"))]);
//! queue.start();
//! queue.drained().await;
//! ```

pub mod domain;
pub mod error;
pub mod events;
pub mod observability;
pub mod operation;
pub mod ports;
pub mod queue;

pub use domain::{ProcessEvent, ProcessId, ProcessSnapshot, ProcessStatus, RunState};
pub use error::{ConfigError, DroverError, EmitterError, OperationError};
pub use events::{EventEmitter, ListenerId};
pub use observability::QueueCounts;
pub use operation::{BoxedOperation, Operation, boxed};
pub use queue::{Concurrency, QueueConfig, QueueOptions, TaskQueue, TaskQueueBuilder};
