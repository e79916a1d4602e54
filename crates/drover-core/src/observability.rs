use serde::{Deserialize, Serialize};
use tracing_subscriber::{EnvFilter, fmt};

/// Tracked processes by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    pub pending: usize,
    pub running: usize,
}

impl QueueCounts {
    pub fn total(&self) -> usize {
        self.pending + self.running
    }
}

/// Install a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter`. Does nothing if a global subscriber is already set.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
