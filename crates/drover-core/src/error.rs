use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Failure reported by an operation.
///
/// Only the message survives: the queue never re-raises it, it is carried on
/// the `process-reject` snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct OperationError {
    message: String,
}

impl OperationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn from_display(err: impl fmt::Display) -> Self {
        Self::new(err.to_string())
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitterError {
    #[error("max listeners ({max}) exceeded for channel {channel}")]
    MaxListenersExceeded { channel: String, max: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("concurrency must be a positive integer, got {0}")]
    InvalidConcurrency(usize),

    #[error("invalid queue config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum DroverError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Emitter(#[from] EmitterError),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_error_keeps_display_message() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "upstream slow");
        let err = OperationError::from_display(io);
        assert_eq!(err.message(), "upstream slow");
        assert_eq!(err.to_string(), "upstream slow");
    }

    #[test]
    fn emitter_error_names_channel() {
        let err = EmitterError::MaxListenersExceeded {
            channel: "process-run".to_string(),
            max: 2,
        };
        let msg = DroverError::from(err).to_string();
        assert!(msg.contains("process-run"));
        assert!(msg.contains('2'));
    }
}
