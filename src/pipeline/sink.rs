//! Terminal item consumers.

use crate::error::{PipelineError, Result};
use crate::pipeline::condition::Condition;
use crate::pipeline::loader::Loader;
use crate::pipeline::queue::{PutStrategy, Queue};
use std::fmt::Display;
use std::io::Write;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard};

/// A capability that consumes one item at a time.
pub trait Sink<In>: Send {
    fn receive(&mut self, item: In) -> Result<()>;
}

impl<In, K: Sink<In> + ?Sized> Sink<In> for Box<K> {
    fn receive(&mut self, item: In) -> Result<()> {
        (**self).receive(item)
    }
}

/// A loader used as a sink; its output is dropped.
pub struct LoaderSink<L> {
    loader: L,
}

impl<L> LoaderSink<L> {
    pub fn new(loader: L) -> Self {
        Self { loader }
    }

    pub fn into_inner(self) -> L {
        self.loader
    }
}

impl<In, L: Loader<In>> Sink<In> for LoaderSink<L> {
    fn receive(&mut self, item: In) -> Result<()> {
        self.loader.load(item).map(drop)
    }
}

/// Delivers every item to each member, in order.
///
/// Delivery is best-effort, like `LoaderList`: every member receives the item
/// even if an earlier one failed, and the first failure is returned afterwards.
pub struct SinkList<K> {
    sinks: Vec<K>,
}

impl<K> SinkList<K> {
    pub fn new(sinks: Vec<K>) -> Self {
        Self { sinks }
    }
}

impl<In: Clone, K: Sink<In>> Sink<In> for SinkList<K> {
    fn receive(&mut self, item: In) -> Result<()> {
        let mut first_error = None;
        for (member, sink) in self.sinks.iter_mut().enumerate() {
            if let Err(e) = sink.receive(item.clone()) {
                tracing::warn!(member, error = %e, "Sink list member failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Passes an item on only when the condition holds.
pub struct ConditionalSink<K, C> {
    sink: K,
    condition: C,
}

impl<K, C> ConditionalSink<K, C> {
    pub fn new(sink: K, condition: C) -> Self {
        Self { sink, condition }
    }
}

impl<In, K, C> Sink<In> for ConditionalSink<K, C>
where
    K: Sink<In>,
    C: Condition<In>,
{
    fn receive(&mut self, item: In) -> Result<()> {
        if self.condition.check(&item) {
            self.sink.receive(item)
        } else {
            Ok(())
        }
    }
}

/// Puts every item into a queue.
pub struct QueueSink<T, P> {
    queue: Queue<T>,
    strategy: P,
}

impl<T, P> QueueSink<T, P> {
    pub fn new(queue: Queue<T>, strategy: P) -> Self {
        Self { queue, strategy }
    }
}

impl<T: Send, P: PutStrategy<T>> Sink<T> for QueueSink<T, P> {
    fn receive(&mut self, item: T) -> Result<()> {
        self.strategy.put(&self.queue, item)
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl<In> Sink<In> for NullSink {
    fn receive(&mut self, _item: In) -> Result<()> {
        Ok(())
    }
}

/// Writes one line per item, optionally prefixed.
pub struct Printer<W> {
    out: W,
    prefix: String,
}

impl Printer<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> Printer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            prefix: String::new(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<In: Display, W: Write + Send> Sink<In> for Printer<W> {
    fn receive(&mut self, item: In) -> Result<()> {
        writeln!(self.out, "{}{}", self.prefix, item)?;
        Ok(())
    }
}

/// Records every item it receives; clones share the same record.
pub struct Collect<T> {
    items: Arc<Mutex<Vec<T>>>,
}

impl<T> Collect<T> {
    pub fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        match self.items.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Take everything recorded so far.
    pub fn take(&self) -> Vec<T> {
        std::mem::take(&mut *self.lock())
    }
}

impl<T: Clone> Collect<T> {
    /// Copy of everything recorded so far.
    pub fn items(&self) -> Vec<T> {
        self.lock().clone()
    }
}

impl<T> Default for Collect<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Collect<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<T: Send> Sink<T> for Collect<T> {
    fn receive(&mut self, item: T) -> Result<()> {
        self.lock().push(item);
        Ok(())
    }
}

/// A sink driven by a closure.
pub struct FromFn<In, F> {
    f: F,
    _input: PhantomData<fn(In)>,
}

impl<In, F> FromFn<In, F>
where
    F: FnMut(In) -> Result<()> + Send,
{
    pub fn new(f: F) -> Self {
        Self {
            f,
            _input: PhantomData,
        }
    }
}

impl<In, F> Sink<In> for FromFn<In, F>
where
    F: FnMut(In) -> Result<()> + Send,
{
    fn receive(&mut self, item: In) -> Result<()> {
        (self.f)(item)
    }
}

/// A sink that rejects everything with `message`.
pub fn failing<In>(message: impl Into<String>) -> impl Sink<In> {
    let message = message.into();
    FromFn::new(move |_: In| Err(PipelineError::Sink(message.clone())))
}
