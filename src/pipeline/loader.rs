//! Chainable item consumers.
//!
//! A [`Loader`] receives one item at a time and returns a derived value that
//! the next loader in the chain receives. Loaders that may have nothing to
//! report yet (`Buffer`, `OnCondition`) return `Option`s; [`IfPresent`] lets a
//! chain continue only with present values.
//!
//! Any loader can end a pipeline through [`LoaderExt::into_sink`].

use crate::error::Result;
use crate::pipeline::condition::Condition;
use crate::pipeline::queue::{PutStrategy, Queue};
use crate::pipeline::sink::LoaderSink;
use std::fmt::{Debug, Display};

/// A consumer of one item that also returns a value for further chaining.
pub trait Loader<In>: Send {
    type Output: Send + 'static;

    fn load(&mut self, item: In) -> Result<Self::Output>;
}

impl<In, L: Loader<In> + ?Sized> Loader<In> for Box<L> {
    type Output = L::Output;

    fn load(&mut self, item: In) -> Result<Self::Output> {
        (**self).load(item)
    }
}

/// Builder-style combinators available on every [`Loader`].
pub trait LoaderExt<In>: Loader<In> + Sized {
    /// Feed this loader's output into `next`.
    fn then<L>(self, next: L) -> ChainedLoader<Self, L>
    where
        L: Loader<Self::Output>,
    {
        ChainedLoader::new(self, next)
    }

    /// Use this loader as a terminal sink, discarding its output.
    fn into_sink(self) -> LoaderSink<Self> {
        LoaderSink::new(self)
    }

    fn boxed(self) -> Box<dyn Loader<In, Output = Self::Output>>
    where
        Self: 'static,
    {
        Box::new(self)
    }
}

impl<In, L: Loader<In>> LoaderExt<In> for L {}

/// `next.load(first.load(item))`.
pub struct ChainedLoader<A, B> {
    first: A,
    next: B,
}

impl<A, B> ChainedLoader<A, B> {
    pub fn new(first: A, next: B) -> Self {
        Self { first, next }
    }
}

impl<In, A, B> Loader<In> for ChainedLoader<A, B>
where
    A: Loader<In>,
    B: Loader<A::Output>,
{
    type Output = B::Output;

    fn load(&mut self, item: In) -> Result<Self::Output> {
        let mid = self.first.load(item)?;
        self.next.load(mid)
    }
}

/// Loads through a closure.
pub struct Map<F> {
    f: F,
}

impl<F> Map<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<In, Out, F> Loader<In> for Map<F>
where
    F: FnMut(In) -> Out + Send,
    Out: Send + 'static,
{
    type Output = Out;

    fn load(&mut self, item: In) -> Result<Out> {
        Ok((self.f)(item))
    }
}

/// Loads through a fallible closure.
pub struct TryMap<F> {
    f: F,
}

impl<F> TryMap<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<In, Out, F> Loader<In> for TryMap<F>
where
    F: FnMut(In) -> Result<Out> + Send,
    Out: Send + 'static,
{
    type Output = Out;

    fn load(&mut self, item: In) -> Result<Out> {
        (self.f)(item)
    }
}

/// Runs the wrapped loader only when the condition holds; otherwise returns
/// `None` without touching it.
pub struct OnCondition<C, L> {
    condition: C,
    loader: L,
}

impl<C, L> OnCondition<C, L> {
    pub fn new(condition: C, loader: L) -> Self {
        Self { condition, loader }
    }
}

impl<In, C, L> Loader<In> for OnCondition<C, L>
where
    C: Condition<In>,
    L: Loader<In>,
{
    type Output = Option<L::Output>;

    fn load(&mut self, item: In) -> Result<Self::Output> {
        if self.condition.check(&item) {
            self.loader.load(item).map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Continues a chain only with present values.
pub struct IfPresent<L> {
    loader: L,
}

impl<L> IfPresent<L> {
    pub fn new(loader: L) -> Self {
        Self { loader }
    }
}

impl<In, L: Loader<In>> Loader<Option<In>> for IfPresent<L> {
    type Output = Option<L::Output>;

    fn load(&mut self, item: Option<In>) -> Result<Self::Output> {
        item.map(|item| self.loader.load(item)).transpose()
    }
}

/// Fans one item out to every member, in order, and collects their results.
///
/// Delivery is best-effort: a failing member does not stop the item from
/// reaching the members after it. If any member failed, the first failure is
/// returned once every member has been tried.
pub struct LoaderList<L> {
    loaders: Vec<L>,
}

impl<L> LoaderList<L> {
    pub fn new(loaders: Vec<L>) -> Self {
        Self { loaders }
    }
}

impl<In, L> Loader<In> for LoaderList<L>
where
    In: Clone,
    L: Loader<In>,
{
    type Output = Vec<L::Output>;

    fn load(&mut self, item: In) -> Result<Self::Output> {
        let mut outputs = Vec::with_capacity(self.loaders.len());
        let mut first_error = None;
        for (member, loader) in self.loaders.iter_mut().enumerate() {
            match loader.load(item.clone()) {
                Ok(output) => outputs.push(output),
                Err(e) => {
                    tracing::warn!(member, error = %e, "Loader list member failed");
                    first_error.get_or_insert(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(outputs),
        }
    }
}

/// Accumulates items across calls and returns a full batch every `size`
/// items, `None` otherwise.
#[derive(Debug, Clone)]
pub struct Buffer<T> {
    size: usize,
    batch: Vec<T>,
}

impl<T> Buffer<T> {
    /// A size of zero behaves like one.
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            batch: Vec::with_capacity(size),
        }
    }

    /// Items accumulated towards the next batch.
    pub fn pending(&self) -> usize {
        self.batch.len()
    }
}

impl<T: Send + 'static> Loader<T> for Buffer<T> {
    type Output = Option<Vec<T>>;

    fn load(&mut self, item: T) -> Result<Self::Output> {
        self.batch.push(item);
        if self.batch.len() >= self.size {
            let full = std::mem::replace(&mut self.batch, Vec::with_capacity(self.size));
            Ok(Some(full))
        } else {
            Ok(None)
        }
    }
}

/// Puts every item into a queue and returns it.
pub struct PutToQueue<T, P> {
    queue: Queue<T>,
    strategy: P,
}

impl<T, P> PutToQueue<T, P> {
    pub fn new(queue: Queue<T>, strategy: P) -> Self {
        Self { queue, strategy }
    }
}

impl<T, P> Loader<T> for PutToQueue<T, P>
where
    T: Clone + Send + 'static,
    P: PutStrategy<T>,
{
    type Output = T;

    fn load(&mut self, item: T) -> Result<T> {
        self.strategy.put(&self.queue, item.clone())?;
        Ok(item)
    }
}

/// Converts an item to its `Display` text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToString;

impl<T: Display> Loader<T> for ToString {
    type Output = String;

    fn load(&mut self, item: T) -> Result<String> {
        Ok(format!("{item}"))
    }
}

/// Converts an item to its `Debug` text.
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugString;

impl<T: Debug> Loader<T> for DebugString {
    type Output = String;

    fn load(&mut self, item: T) -> Result<String> {
        Ok(format!("{item:?}"))
    }
}

/// Prints an item to stdout and returns it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Print;

impl<T: Display + Send + 'static> Loader<T> for Print {
    type Output = T;

    fn load(&mut self, item: T) -> Result<T> {
        println!("{item}");
        Ok(item)
    }
}
