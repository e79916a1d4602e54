//! Queue module: options, process records, admission and timeout handling.

mod config;
mod record;
mod state;
mod task_queue;
mod worker;


pub use config::{Concurrency, DEFAULT_TIMEOUT, QueueConfig, QueueOptions};
pub use task_queue::{QueueEmitter, TaskQueue, TaskQueueBuilder};
