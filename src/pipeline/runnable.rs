//! Execution drivers.
//!
//! A [`Runnable`] binds a topology (source, mappers, sink) and drives it when
//! `run()` is called. Each call moves through *running* to either completion
//! (`Ok`) or failure (`Err`); nothing survives between calls except what the
//! owned stages keep themselves, such as a loader `Buffer`'s partial batch.
//!
//! # Drivers
//!
//! - [`Pipeline`] - pull everything from a source into a sink, one item at a time
//! - [`StepPipeline`] - one pull-and-deliver cycle per `run()`
//! - [`Repeat`] / [`Retry`] / [`StopAtBound`] / [`Named`] - decorators around
//!   another runnable
//!
//! Concurrent composites live in [`concurrent`](crate::pipeline::concurrent).

use crate::error::Result;
use crate::pipeline::sink::{NullSink, Sink};
use crate::pipeline::source::Source;
use crate::pipeline::stream::Stream;

/// Something that can be driven to completion.
pub trait Runnable: Send {
    fn run(&mut self) -> Result<()>;

    /// Label used in logs and worker names.
    fn name(&self) -> &str {
        short_type_name::<Self>()
    }
}

impl<R: Runnable + ?Sized> Runnable for Box<R> {
    fn run(&mut self) -> Result<()> {
        (**self).run()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<R: Runnable + ?Sized> Runnable for &mut R {
    fn run(&mut self) -> Result<()> {
        (**self).run()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// `modupipe::pipeline::runnable::Retry<Foo>` -> `Retry`
fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

// ==================== Pipelines ====================

/// Pulls every item from `source` and hands it to `sink`.
///
/// The sink finishes with item *i* before item *i + 1* is requested. A failure
/// from either side ends the run at once; items already delivered stay
/// delivered.
pub struct Pipeline<S, K> {
    source: S,
    sink: K,
}

/// A pipeline whose source carries its own side effects; items are dropped.
pub type FullPipeline<S> = Pipeline<S, NullSink>;

impl<S, K> Pipeline<S, K> {
    pub fn new(source: S, sink: K) -> Self {
        Self { source, sink }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn into_parts(self) -> (S, K) {
        (self.source, self.sink)
    }
}

impl<S> Pipeline<S, NullSink> {
    /// Drive `source` to exhaustion, discarding what it yields.
    pub fn draining(source: S) -> Self {
        Self::new(source, NullSink)
    }
}

impl<S, K> Runnable for Pipeline<S, K>
where
    S: Source,
    K: Sink<S::Item>,
{
    fn run(&mut self) -> Result<()> {
        tracing::debug!("Pipeline started");
        let mut delivered = 0usize;
        for item in self.source.fetch() {
            if let Err(e) = item.and_then(|item| self.sink.receive(item)) {
                tracing::debug!(delivered, error = %e, "Pipeline stopped");
                return Err(e);
            }
            delivered += 1;
        }
        tracing::debug!(delivered, "Pipeline finished");
        Ok(())
    }
}

/// Delivers a single item per `run()`, resuming where the last call stopped.
///
/// The stream fetched at construction is kept as state, so the source is
/// borrowed for as long as the step pipeline lives. Once the stream ends every
/// further `run()` is a no-op.
pub struct StepPipeline<'a, T, K> {
    items: Stream<'a, T>,
    sink: K,
    finished: bool,
}

impl<'a, T, K> StepPipeline<'a, T, K>
where
    T: Send + 'static,
    K: Sink<T>,
{
    pub fn new<S>(source: &'a mut S, sink: K) -> Self
    where
        S: Source<Item = T>,
    {
        Self {
            items: source.fetch(),
            sink,
            finished: false,
        }
    }

    /// Whether the underlying stream has ended.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl<T, K> Runnable for StepPipeline<'_, T, K>
where
    T: Send + 'static,
    K: Sink<T>,
{
    fn run(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        match self.items.next() {
            Some(item) => self.sink.receive(item?),
            None => {
                tracing::debug!("Step pipeline exhausted");
                self.finished = true;
                Ok(())
            }
        }
    }
}

// ==================== Decorators ====================

/// Runs the inner runnable `times` times in a row, stopping at the first failure.
pub struct Repeat<R> {
    runnable: R,
    times: usize,
}

impl<R> Repeat<R> {
    pub fn new(runnable: R, times: usize) -> Self {
        Self { runnable, times }
    }
}

impl<R: Runnable> Runnable for Repeat<R> {
    fn run(&mut self) -> Result<()> {
        for _ in 0..self.times {
            self.runnable.run()?;
        }
        Ok(())
    }
}

/// Re-runs the inner runnable after any failure, at most `max_retries` times.
///
/// Retries start immediately and do not look at the kind of failure. Each one
/// restarts the whole inner `run()`, so only sources that can start over
/// benefit. After the last retry fails, that failure is returned.
pub struct Retry<R> {
    runnable: R,
    max_retries: usize,
}

impl<R> Retry<R> {
    pub fn new(runnable: R, max_retries: usize) -> Self {
        Self {
            runnable,
            max_retries,
        }
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }
}

impl<R: Runnable> Runnable for Retry<R> {
    fn run(&mut self) -> Result<()> {
        let mut retries = 0;
        loop {
            let error = match self.runnable.run() {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };
            retries += 1;
            if retries > self.max_retries {
                tracing::error!(
                    runnable = self.runnable.name(),
                    retries = self.max_retries,
                    error = %error,
                    "Giving up"
                );
                return Err(error);
            }
            tracing::warn!(
                runnable = self.runnable.name(),
                attempt = retries,
                max_retries = self.max_retries,
                error = %error,
                "Run failed, retrying"
            );
        }
    }
}

/// Treats the inner runnable hitting its iteration bound as normal completion.
///
/// Any other failure is returned unchanged.
pub struct StopAtBound<R> {
    runnable: R,
}

impl<R> StopAtBound<R> {
    pub fn new(runnable: R) -> Self {
        Self { runnable }
    }
}

impl<R: Runnable> Runnable for StopAtBound<R> {
    fn run(&mut self) -> Result<()> {
        match self.runnable.run() {
            Err(e) if e.is_bound_exceeded() => {
                tracing::debug!(runnable = self.runnable.name(), "Iteration bound reached");
                Ok(())
            }
            other => other,
        }
    }

    fn name(&self) -> &str {
        self.runnable.name()
    }
}

/// Gives a runnable a name for logs and worker threads.
pub struct Named<R> {
    name: String,
    runnable: R,
}

impl<R> Named<R> {
    pub fn new(name: impl Into<String>, runnable: R) -> Self {
        Self {
            name: name.into(),
            runnable,
        }
    }

    pub fn into_inner(self) -> R {
        self.runnable
    }
}

impl<R: Runnable> Runnable for Named<R> {
    fn run(&mut self) -> Result<()> {
        let span = tracing::info_span!("runnable", name = %self.name);
        let _enter = span.enter();
        tracing::info!("Starting {}", self.name);
        self.runnable.run()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// A runnable driven by a closure.
pub struct FromFn<F> {
    f: F,
}

impl<F> FromFn<F>
where
    F: FnMut() -> Result<()> + Send,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Runnable for FromFn<F>
where
    F: FnMut() -> Result<()> + Send,
{
    fn run(&mut self) -> Result<()> {
        (self.f)()
    }
}
