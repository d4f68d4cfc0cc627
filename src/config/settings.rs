//! Settings sections that make up a [`Settings`](super::Settings) file
//!
//! # Main Types
//!
//! - [`QueueSettings`] - Capacity of the demo queue and how each side waits
//! - [`RunnerSettings`] - Retry, repeat and iteration limits for runnables
//! - [`LoggingSettings`] - Log filter directive and optional log file
//!
//! # Queue Strategies
//!
//! [`GetMode`] and [`PutMode`] are the serializable forms of the queue
//! strategies and implement [`GetStrategy`]/[`PutStrategy`] themselves, so a
//! loaded setting can be handed straight to a `QueueSource` or `QueueSink`:
//!
//! ```toml
//! [queue]
//! capacity = 64
//!
//! [queue.get]
//! mode = "blocking"
//! timeout_ms = 500
//!
//! [queue.put]
//! mode = "non_blocking"
//! ```

use crate::error::Result;
use crate::pipeline::queue::{GetStrategy, PutStrategy, Queue};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::{
    DEFAULT_BUFFER_SIZE, DEFAULT_LOG_FILTER, DEFAULT_MAX_RETRIES, DEFAULT_QUEUE_CAPACITY,
};

// ==================== Queue ====================

/// How a consumer waits on an empty queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum GetMode {
    /// Wait for an item, giving up after `timeout_ms` if set
    Blocking {
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
    /// Fail straight away
    NonBlocking,
}

impl Default for GetMode {
    fn default() -> Self {
        GetMode::Blocking { timeout_ms: None }
    }
}

impl<T> GetStrategy<T> for GetMode {
    fn get(&self, queue: &Queue<T>) -> Result<T> {
        match *self {
            GetMode::Blocking { timeout_ms } => {
                queue.get_blocking(timeout_ms.map(Duration::from_millis))
            }
            GetMode::NonBlocking => queue.get_nonblocking(),
        }
    }
}

/// How a producer waits on a full queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PutMode {
    /// Wait for room, giving up after `timeout_ms` if set
    Blocking {
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
    /// Fail straight away
    NonBlocking,
}

impl Default for PutMode {
    fn default() -> Self {
        PutMode::Blocking { timeout_ms: None }
    }
}

impl<T> PutStrategy<T> for PutMode {
    fn put(&self, queue: &Queue<T>, item: T) -> Result<()> {
        match *self {
            PutMode::Blocking { timeout_ms } => {
                queue.put_blocking(item, timeout_ms.map(Duration::from_millis))
            }
            PutMode::NonBlocking => queue.put_nonblocking(item),
        }
    }
}

/// Queue configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueSettings {
    /// Maximum number of waiting items (0 = unbounded)
    pub capacity: usize,

    /// Consumer-side strategy
    pub get: GetMode,

    /// Producer-side strategy
    pub put: PutMode,
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_QUEUE_CAPACITY,
            get: GetMode::default(),
            put: PutMode::default(),
        }
    }
}

impl QueueSettings {
    /// Create a queue with the configured capacity
    pub fn build<T>(&self, name: impl Into<String>) -> Queue<T> {
        let queue = if self.capacity == 0 {
            Queue::unbounded()
        } else {
            Queue::bounded(self.capacity)
        };
        queue.with_name(name)
    }
}

// ==================== Runner ====================

/// Limits applied by the runnable decorators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSettings {
    /// Retries after a failed run (`Retry`)
    pub max_retries: usize,

    /// Number of sequential runs (`Repeat`)
    pub repeat: usize,

    /// Items a source may yield before `MaxIterationsReached` (None = no limit)
    pub max_iterations: Option<usize>,

    /// Batch size for `Buffer` stages
    pub buffer_size: usize,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            repeat: 1,
            max_iterations: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

// ==================== Logging ====================

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is not set
    pub filter: String,

    /// Write logs to this file instead of stdout
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            file: None,
        }
    }
}
