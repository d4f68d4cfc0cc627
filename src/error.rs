//! Error handling for modupipe
//!
//! This module defines the error type shared by every pipeline stage and a
//! Result alias for use throughout the crate.
//!
//! Natural end of a sequence is not an error: streams simply return `None`.
//! Everything else (bound exceeded, queue timeouts, leaf failures) travels as a
//! [`PipelineError`] through the pull/push chain untouched until a
//! [`Retry`](crate::pipeline::runnable::Retry) or the top-level driver sees it.

use std::time::Duration;
use thiserror::Error;

/// Main error type for pipeline operations
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A `MaxIterations` source was pulled past its limit
    #[error("Maximum number of iterations reached ({limit})")]
    MaxIterationsReached { limit: usize },

    /// A blocking get/put did not complete within its timeout
    #[error("Queue '{queue}' timed out after {timeout:?}")]
    QueueTimeout { queue: String, timeout: Duration },

    /// A non-blocking get found nothing to take
    #[error("Queue '{queue}' is empty")]
    QueueEmpty { queue: String },

    /// A non-blocking put found no room
    #[error("Queue '{queue}' is full")]
    QueueFull { queue: String },

    /// The other side of the queue is gone
    #[error("Queue '{queue}' is disconnected")]
    QueueDisconnected { queue: String },

    /// Errors raised by a data producer
    #[error("Source error: {0}")]
    Source(String),

    /// Errors raised by a data consumer
    #[error("Sink error: {0}")]
    Sink(String),

    /// A concurrently running child panicked
    #[error("Worker '{worker}' panicked: {message}")]
    WorkerPanicked { worker: String, message: String },

    /// The host refused to start a worker
    #[error("Failed to spawn worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failures from user-provided stages
    #[error(transparent)]
    External(#[from] anyhow::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PipelineError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Strip any context wrappers
    pub fn root(&self) -> &PipelineError {
        match self {
            PipelineError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }

    /// True for the bounded-iteration signal, as opposed to a real failure
    pub fn is_bound_exceeded(&self) -> bool {
        matches!(self.root(), PipelineError::MaxIterationsReached { .. })
    }

    /// True for blocking queue operations that gave up waiting
    pub fn is_timeout(&self) -> bool {
        matches!(self.root(), PipelineError::QueueTimeout { .. })
    }

    /// True for failures coming from an external resource that may go away on
    /// a fresh attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.root(),
            PipelineError::QueueTimeout { .. }
                | PipelineError::QueueEmpty { .. }
                | PipelineError::QueueFull { .. }
                | PipelineError::Source(_)
                | PipelineError::Sink(_)
                | PipelineError::External(_)
        )
    }
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::MaxIterationsReached { limit: 10 };
        assert_eq!(err.to_string(), "Maximum number of iterations reached (10)");
    }

    #[test]
    fn test_error_with_context() {
        let err = PipelineError::Source("test".to_string());
        let with_ctx = err.with_context("Failed to fetch");
        assert!(with_ctx.to_string().contains("Failed to fetch"));
        assert!(with_ctx.is_transient());
    }

    #[test]
    fn test_bound_exceeded_survives_context() {
        let err = PipelineError::MaxIterationsReached { limit: 3 }.with_context("stage 1");
        assert!(err.is_bound_exceeded());
        assert!(!err.is_transient());
    }

    #[test]
    fn test_timeout_is_distinct_from_disconnect() {
        let timeout = PipelineError::QueueTimeout {
            queue: "q".to_string(),
            timeout: Duration::from_millis(5),
        };
        let closed = PipelineError::QueueDisconnected {
            queue: "q".to_string(),
        };
        assert!(timeout.is_timeout());
        assert!(!closed.is_timeout());
        assert!(timeout.to_string().contains("'q'"));
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: PipelineError = anyhow::anyhow!("flaky device").into();
        assert_eq!(err.to_string(), "flaky device");
        assert!(err.is_transient());
    }
}
