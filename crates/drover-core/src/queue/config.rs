//! Queue options and the serde-facing config they are loaded from.

use std::fmt;
use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::events::DEFAULT_MAX_LISTENERS;

/// Default eviction bound for a running process.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Upper bound on simultaneously running processes.
///
/// Zero is not representable: "no limit" is the explicit `Unbounded` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Concurrency {
    #[default]
    Unbounded,
    Limited(NonZeroUsize),
}

impl Concurrency {
    pub fn limited(n: usize) -> Result<Self, ConfigError> {
        NonZeroUsize::new(n)
            .map(Concurrency::Limited)
            .ok_or(ConfigError::InvalidConcurrency(n))
    }

    pub fn limit(self) -> Option<usize> {
        match self {
            Concurrency::Unbounded => None,
            Concurrency::Limited(n) => Some(n.get()),
        }
    }

    /// Whether one more process may start while `running` are in flight.
    pub fn admits(self, running: usize) -> bool {
        match self {
            Concurrency::Unbounded => true,
            Concurrency::Limited(n) => running < n.get(),
        }
    }
}

impl From<NonZeroUsize> for Concurrency {
    fn from(n: NonZeroUsize) -> Self {
        Concurrency::Limited(n)
    }
}

impl fmt::Display for Concurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Concurrency::Unbounded => f.write_str("unbounded"),
            Concurrency::Limited(n) => write!(f, "{n}"),
        }
    }
}

/// Construction options for a `TaskQueue`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueOptions {
    pub concurrency: Concurrency,

    /// Start in the `running` state.
    pub autostart: bool,

    /// Running processes that have not settled after this long are evicted.
    pub timeout: Duration,

    /// Pause inserted before each operation starts. Counted against `timeout`.
    pub delay: Duration,

    /// Per-channel listener limit of the queue's emitter (`0` = unlimited).
    pub max_listeners: usize,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            concurrency: Concurrency::Unbounded,
            autostart: false,
            timeout: DEFAULT_TIMEOUT,
            delay: Duration::ZERO,
            max_listeners: DEFAULT_MAX_LISTENERS,
        }
    }
}

impl QueueOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_concurrency(mut self, concurrency: Concurrency) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_autostart(mut self, autostart: bool) -> Self {
        self.autostart = autostart;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_max_listeners(mut self, max_listeners: usize) -> Self {
        self.max_listeners = max_listeners;
        self
    }
}

/// On-disk form of [`QueueOptions`].
///
/// ```json
/// { "concurrency": 4, "autostart": true, "timeout_ms": 5000, "delay_ms": 0 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueConfig {
    /// Omit (or `null`) for unbounded.
    pub concurrency: Option<usize>,
    pub autostart: bool,
    pub timeout_ms: u64,
    pub delay_ms: u64,
    pub max_listeners: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            concurrency: None,
            autostart: false,
            timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
            delay_ms: 0,
            max_listeners: DEFAULT_MAX_LISTENERS,
        }
    }
}

impl QueueConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }
}

impl TryFrom<QueueConfig> for QueueOptions {
    type Error = ConfigError;

    fn try_from(config: QueueConfig) -> Result<Self, Self::Error> {
        let concurrency = match config.concurrency {
            None => Concurrency::Unbounded,
            Some(n) => Concurrency::limited(n)?,
        };
        Ok(QueueOptions {
            concurrency,
            autostart: config.autostart,
            timeout: Duration::from_millis(config.timeout_ms),
            delay: Duration::from_millis(config.delay_ms),
            max_listeners: config.max_listeners,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults() {
        let options = QueueOptions::default();
        assert_eq!(options.concurrency, Concurrency::Unbounded);
        assert!(!options.autostart);
        assert_eq!(options.timeout, DEFAULT_TIMEOUT);
        assert_eq!(options.delay, Duration::ZERO);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        assert!(matches!(
            Concurrency::limited(0),
            Err(ConfigError::InvalidConcurrency(0))
        ));
    }

    #[rstest]
    #[case::unbounded(Concurrency::Unbounded, 1_000_000, true)]
    #[case::below_limit(Concurrency::limited(2).unwrap(), 1, true)]
    #[case::at_limit(Concurrency::limited(2).unwrap(), 2, false)]
    #[case::above_limit(Concurrency::limited(2).unwrap(), 3, false)]
    fn admits(#[case] concurrency: Concurrency, #[case] running: usize, #[case] expected: bool) {
        assert_eq!(concurrency.admits(running), expected);
    }

    #[test]
    fn config_from_json() {
        let config = QueueConfig::from_json_str(
            r#"{ "concurrency": 3, "autostart": true, "timeout_ms": 250, "delay_ms": 10 }"#,
        )
        .unwrap();
        let options = QueueOptions::try_from(config).unwrap();

        assert_eq!(options.concurrency.limit(), Some(3));
        assert!(options.autostart);
        assert_eq!(options.timeout, Duration::from_millis(250));
        assert_eq!(options.delay, Duration::from_millis(10));
        assert_eq!(options.max_listeners, DEFAULT_MAX_LISTENERS);
    }

    #[test]
    fn empty_config_matches_default_options() {
        let config = QueueConfig::from_json_str("{}").unwrap();
        assert_eq!(QueueOptions::try_from(config).unwrap(), QueueOptions::default());
    }

    #[test]
    fn config_rejects_zero_concurrency_and_unknown_fields() {
        let zero = QueueConfig::from_json_str(r#"{ "concurrency": 0 }"#).unwrap();
        assert!(QueueOptions::try_from(zero).is_err());

        assert!(matches!(
            QueueConfig::from_json_str(r#"{ "priority": 1 }"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_config_file_reports_path() {
        let err = QueueConfig::from_path("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
