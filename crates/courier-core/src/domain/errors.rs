//! Error types.
//!
//! - `RegistryError`: register / unregister.
//! - `HandlerError`: raised by a handler.
//! - `DispatchError`: handler faults as seen by the caller of `dispatch`.

use std::error::Error as StdError;

use thiserror::Error;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("handler is already registered for event '{event}'")]
    HandlerAlreadyRegistered { event: String },

    #[error("handler is not registered for event '{event}'")]
    HandlerNotFound { event: String },
}

/// HandlerError is the fault a handler reports back to the dispatcher.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// One failed invocation inside a dispatch.
#[derive(Debug, Error)]
#[error("handler #{position} failed: {error}")]
pub struct HandlerFailure {
    /// Zero-based index in the registration bucket.
    pub position: usize,
    #[source]
    pub error: HandlerError,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    /// `FailurePolicy::Halt`: handlers after `position` were not invoked.
    #[error("handler #{position} for event '{event}' failed: {source}")]
    HandlerFailed {
        event: String,
        position: usize,
        #[source]
        source: HandlerError,
    },

    /// `FailurePolicy::Collect`: every handler ran, some failed.
    #[error("{} of {invoked} handlers for event '{event}' failed", .failures.len())]
    Aggregate {
        event: String,
        invoked: usize,
        failures: Vec<HandlerFailure>,
    },
}

impl DispatchError {
    pub fn event(&self) -> &str {
        match self {
            DispatchError::HandlerFailed { event, .. } => event,
            DispatchError::Aggregate { event, .. } => event,
        }
    }

    /// Positions of the handlers that failed.
    pub fn failed_positions(&self) -> Vec<usize> {
        match self {
            DispatchError::HandlerFailed { position, .. } => vec![*position],
            DispatchError::Aggregate { failures, .. } => {
                failures.iter().map(|f| f.position).collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_error_keeps_source() {
        let io = std::io::Error::other("disk full");
        let err = HandlerError::with_source("write audit log", io);

        assert_eq!(err.to_string(), "write audit log");
        assert_eq!(err.source().map(|s| s.to_string()), Some("disk full".into()));
    }

    #[test]
    fn handler_error_without_source() {
        let err = HandlerError::new("plain");
        assert_eq!(err.message(), "plain");
        assert!(err.source().is_none());
    }

    #[test]
    fn aggregate_message_counts_failures() {
        let err = DispatchError::Aggregate {
            event: "test".into(),
            invoked: 3,
            failures: vec![
                HandlerFailure {
                    position: 0,
                    error: HandlerError::new("a"),
                },
                HandlerFailure {
                    position: 2,
                    error: HandlerError::new("b"),
                },
            ],
        };

        assert_eq!(err.to_string(), "2 of 3 handlers for event 'test' failed");
        assert_eq!(err.failed_positions(), vec![0, 2]);
        assert_eq!(err.event(), "test");
    }

    #[test]
    fn registry_error_names_event() {
        let err = RegistryError::HandlerAlreadyRegistered {
            event: "test".into(),
        };
        assert!(err.to_string().contains("'test'"));
    }
}
