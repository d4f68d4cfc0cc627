//! Named FIFO queues connecting pipelines that run concurrently.
//!
//! A [`Queue`] wraps a crossbeam channel and keeps both ends, so any clone can
//! put and get. One clone usually lives in the producing pipeline (behind a
//! `QueueSink` or `PutToQueue`) and one in the consuming pipeline (behind a
//! `QueueSource`).
//!
//! How a side waits is decided by a strategy, chosen independently per side:
//!
//! | strategy        | empty / full queue                          |
//! |-----------------|---------------------------------------------|
//! | `GetBlocking`   | waits (forever, or until the timeout fails) |
//! | `GetNonBlocking`| fails immediately with `QueueEmpty`         |
//! | `PutBlocking`   | waits (forever, or until the timeout fails) |
//! | `PutNonBlocking`| fails immediately with `QueueFull`          |

use crate::error::{PipelineError, Result};
use crossbeam_channel::{
    bounded, unbounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender, TryRecvError,
    TrySendError,
};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

static NEXT_QUEUE_ID: AtomicU64 = AtomicU64::new(0);

fn generated_name() -> String {
    format!("queue-{}", NEXT_QUEUE_ID.fetch_add(1, Ordering::Relaxed))
}

/// A FIFO channel shared by two pipeline halves.
pub struct Queue<T> {
    name: Arc<str>,
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> Queue<T> {
    /// A queue holding at most `capacity` items.
    pub fn bounded(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Self::from_channel(tx, rx)
    }

    /// A queue without a size limit; puts never wait.
    pub fn unbounded() -> Self {
        let (tx, rx) = unbounded();
        Self::from_channel(tx, rx)
    }

    /// Wrap an existing channel pair.
    pub fn from_channel(tx: Sender<T>, rx: Receiver<T>) -> Self {
        Self {
            name: generated_name().into(),
            tx,
            rx,
        }
    }

    /// Replace the generated name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name: String = name.into();
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of items waiting to be taken.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Maximum number of items, or `None` when unbounded.
    pub fn capacity(&self) -> Option<usize> {
        self.tx.capacity()
    }

    /// Put an item, waiting for room. `None` waits forever.
    pub fn put_blocking(&self, item: T, timeout: Option<Duration>) -> Result<()> {
        tracing::trace!(queue = %self.name, "put (blocking)");
        match timeout {
            None => self.tx.send(item).map_err(|_| self.disconnected()),
            Some(timeout) => self.tx.send_timeout(item, timeout).map_err(|e| match e {
                SendTimeoutError::Timeout(_) => self.timed_out(timeout),
                SendTimeoutError::Disconnected(_) => self.disconnected(),
            }),
        }
    }

    /// Put an item only if there is room right now.
    pub fn put_nonblocking(&self, item: T) -> Result<()> {
        tracing::trace!(queue = %self.name, "put (non-blocking)");
        self.tx.try_send(item).map_err(|e| match e {
            TrySendError::Full(_) => PipelineError::QueueFull {
                queue: self.name.to_string(),
            },
            TrySendError::Disconnected(_) => self.disconnected(),
        })
    }

    /// Take the oldest item, waiting for one. `None` waits forever.
    pub fn get_blocking(&self, timeout: Option<Duration>) -> Result<T> {
        tracing::trace!(queue = %self.name, "get (blocking)");
        match timeout {
            None => self.rx.recv().map_err(|_| self.disconnected()),
            Some(timeout) => self.rx.recv_timeout(timeout).map_err(|e| match e {
                RecvTimeoutError::Timeout => self.timed_out(timeout),
                RecvTimeoutError::Disconnected => self.disconnected(),
            }),
        }
    }

    /// Take the oldest item only if one is waiting right now.
    pub fn get_nonblocking(&self) -> Result<T> {
        tracing::trace!(queue = %self.name, "get (non-blocking)");
        self.rx.try_recv().map_err(|e| match e {
            TryRecvError::Empty => PipelineError::QueueEmpty {
                queue: self.name.to_string(),
            },
            TryRecvError::Disconnected => self.disconnected(),
        })
    }

    fn timed_out(&self, timeout: Duration) -> PipelineError {
        PipelineError::QueueTimeout {
            queue: self.name.to_string(),
            timeout,
        }
    }

    fn disconnected(&self) -> PipelineError {
        PipelineError::QueueDisconnected {
            queue: self.name.to_string(),
        }
    }
}

impl<T> Clone for Queue<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            tx: self.tx.clone(),
            rx: self.rx.clone(),
        }
    }
}

impl<T> fmt::Debug for Queue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("name", &self.name)
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

// ==================== Strategies ====================

/// How a consumer takes items out of a queue.
pub trait GetStrategy<T>: Send {
    fn get(&self, queue: &Queue<T>) -> Result<T>;
}

/// How a producer puts items into a queue.
pub trait PutStrategy<T>: Send {
    fn put(&self, queue: &Queue<T>, item: T) -> Result<()>;
}

/// Wait for an item, optionally giving up after `timeout`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetBlocking {
    pub timeout: Option<Duration>,
}

impl GetBlocking {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

impl<T> GetStrategy<T> for GetBlocking {
    fn get(&self, queue: &Queue<T>) -> Result<T> {
        queue.get_blocking(self.timeout)
    }
}

/// Fail with `QueueEmpty` instead of waiting.
#[derive(Debug, Clone, Copy, Default)]
pub struct GetNonBlocking;

impl<T> GetStrategy<T> for GetNonBlocking {
    fn get(&self, queue: &Queue<T>) -> Result<T> {
        queue.get_nonblocking()
    }
}

/// Wait for room, optionally giving up after `timeout`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PutBlocking {
    pub timeout: Option<Duration>,
}

impl PutBlocking {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }
}

impl<T> PutStrategy<T> for PutBlocking {
    fn put(&self, queue: &Queue<T>, item: T) -> Result<()> {
        queue.put_blocking(item, self.timeout)
    }
}

/// Fail with `QueueFull` instead of waiting.
#[derive(Debug, Clone, Copy, Default)]
pub struct PutNonBlocking;

impl<T> PutStrategy<T> for PutNonBlocking {
    fn put(&self, queue: &Queue<T>, item: T) -> Result<()> {
        queue.put_nonblocking(item)
    }
}
