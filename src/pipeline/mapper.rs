//! Stream-to-stream transducers.
//!
//! A [`Mapper`] turns one lazy [`Stream`] into another: 1:1 (`Map`,
//! `ToString`), 1:N (`Repeat`), N:1 (`Buffer`), filtering (`Filter`), fan-in
//! (`Aggregate`) or side-effecting pass-through (`PutToQueue`, `PushTo`).
//!
//! Mappers never pull ahead of demand. The only stage that reads several
//! inputs before emitting is `Buffer`, whose look-ahead is its batch size.
//! Failures from upstream are passed through untouched.

use crate::error::Result;
use crate::pipeline::condition::Condition;
use crate::pipeline::loader::Loader;
use crate::pipeline::queue::{PutStrategy, Queue};
use crate::pipeline::stream::{self, SharedCursor, Stream};
use std::fmt::Display;

/// A capability converting a lazy sequence of `In` into a lazy sequence of
/// [`Output`](Mapper::Output).
pub trait Mapper<In>: Send {
    type Output: Send + 'static;

    /// Wrap `items`; no item is pulled until the returned stream is.
    fn map<'a>(&'a mut self, items: Stream<'a, In>) -> Stream<'a, Self::Output>
    where
        In: 'a;
}

impl<In, M: Mapper<In> + ?Sized> Mapper<In> for Box<M> {
    type Output = M::Output;

    fn map<'a>(&'a mut self, items: Stream<'a, In>) -> Stream<'a, Self::Output>
    where
        In: 'a,
    {
        (**self).map(items)
    }
}

/// Builder-style combinators available on every [`Mapper`].
pub trait MapperExt<In>: Mapper<In> + Sized {
    /// Feed this mapper's output into `next`.
    fn then<M>(self, next: M) -> Chained<Self, M>
    where
        M: Mapper<Self::Output>,
    {
        Chained::new(self, next)
    }

    fn boxed(self) -> Box<dyn Mapper<In, Output = Self::Output>>
    where
        Self: 'static,
    {
        Box::new(self)
    }
}

impl<In, M: Mapper<In>> MapperExt<In> for M {}

/// `next.map(first.map(items))`.
pub struct Chained<A, B> {
    first: A,
    next: B,
}

impl<A, B> Chained<A, B> {
    pub fn new(first: A, next: B) -> Self {
        Self { first, next }
    }
}

impl<In, A, B> Mapper<In> for Chained<A, B>
where
    A: Mapper<In>,
    B: Mapper<A::Output>,
{
    type Output = B::Output;

    fn map<'a>(&'a mut self, items: Stream<'a, In>) -> Stream<'a, Self::Output>
    where
        In: 'a,
    {
        let mid = self.first.map(items);
        self.next.map(mid)
    }
}

/// 1:1 conversion through a closure.
pub struct Map<F> {
    f: F,
}

impl<F> Map<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<In, Out, F> Mapper<In> for Map<F>
where
    F: FnMut(In) -> Out + Send,
    Out: Send + 'static,
{
    type Output = Out;

    fn map<'a>(&'a mut self, items: Stream<'a, In>) -> Stream<'a, Out>
    where
        In: 'a,
    {
        let f = &mut self.f;
        Box::new(items.map(move |item| item.map(&mut *f)))
    }
}

/// 1:1 conversion through a fallible closure; an `Err` ends the stream.
pub struct TryMap<F> {
    f: F,
}

impl<F> TryMap<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<In, Out, F> Mapper<In> for TryMap<F>
where
    F: FnMut(In) -> Result<Out> + Send,
    Out: Send + 'static,
{
    type Output = Out;

    fn map<'a>(&'a mut self, items: Stream<'a, In>) -> Stream<'a, Out>
    where
        In: 'a,
    {
        let f = &mut self.f;
        Box::new(items.map(move |item| item.and_then(&mut *f)))
    }
}

/// Keeps the items the condition holds for, in order.
pub struct Filter<C> {
    condition: C,
}

impl<C> Filter<C> {
    pub fn new(condition: C) -> Self {
        Self { condition }
    }
}

impl<T, C> Mapper<T> for Filter<C>
where
    T: Send + 'static,
    C: Condition<T>,
{
    type Output = T;

    fn map<'a>(&'a mut self, items: Stream<'a, T>) -> Stream<'a, T>
    where
        T: 'a,
    {
        let condition = &mut self.condition;
        Box::new(items.filter(move |item| match item {
            Ok(item) => condition.check(item),
            Err(_) => true,
        }))
    }
}

/// Groups consecutive items into batches of `size`.
///
/// A trailing batch smaller than `size` is dropped when the input ends; it is
/// never flushed. A size of zero behaves like one.
#[derive(Debug, Clone, Copy)]
pub struct Buffer {
    size: usize,
}

impl Buffer {
    pub fn new(size: usize) -> Self {
        Self { size: size.max(1) }
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

impl<T: Send + 'static> Mapper<T> for Buffer {
    type Output = Vec<T>;

    fn map<'a>(&'a mut self, mut items: Stream<'a, T>) -> Stream<'a, Vec<T>>
    where
        T: 'a,
    {
        let size = self.size;
        let mut batch = Vec::with_capacity(size);
        Box::new(std::iter::from_fn(move || loop {
            match items.next()? {
                Ok(item) => {
                    batch.push(item);
                    if batch.len() >= size {
                        let full = std::mem::replace(&mut batch, Vec::with_capacity(size));
                        return Some(Ok(full));
                    }
                }
                Err(e) => return Some(Err(e)),
            }
        }))
    }
}

/// Converts every item to its `Display` text.
#[derive(Debug, Clone, Copy, Default)]
pub struct ToString;

impl<T: Display> Mapper<T> for ToString {
    type Output = String;

    fn map<'a>(&'a mut self, items: Stream<'a, T>) -> Stream<'a, String>
    where
        T: 'a,
    {
        Box::new(items.map(|item| item.map(|item| format!("{item}"))))
    }
}

/// Emits every item `times` times in a row.
#[derive(Debug, Clone, Copy)]
pub struct Repeat {
    times: usize,
}

impl Repeat {
    pub fn new(times: usize) -> Self {
        Self { times }
    }
}

impl<T: Clone + Send + 'static> Mapper<T> for Repeat {
    type Output = T;

    fn map<'a>(&'a mut self, mut items: Stream<'a, T>) -> Stream<'a, T>
    where
        T: 'a,
    {
        let times = self.times;
        let mut current: Option<T> = None;
        let mut remaining = 0usize;
        Box::new(std::iter::from_fn(move || loop {
            if remaining > 0 {
                remaining -= 1;
                let item = if remaining == 0 {
                    current.take()
                } else {
                    current.clone()
                };
                // `current` is always set while `remaining > 0`
                if let Some(item) = item {
                    return Some(Ok(item));
                }
            }
            match items.next()? {
                Ok(item) => {
                    current = Some(item);
                    remaining = times;
                }
                Err(e) => return Some(Err(e)),
            }
        }))
    }
}

/// Runs several mappers over one upstream sequence and zips their outputs.
///
/// The members share a single cursor over the input, so every upstream item is
/// consumed by exactly one member. Output ends with the shortest member.
pub struct Aggregate<M> {
    mappers: Vec<M>,
}

impl<M> Aggregate<M> {
    pub fn new(mappers: Vec<M>) -> Self {
        Self { mappers }
    }
}

impl<In, M> Mapper<In> for Aggregate<M>
where
    In: Send + 'static,
    M: Mapper<In>,
{
    type Output = Vec<M::Output>;

    fn map<'a>(&'a mut self, items: Stream<'a, In>) -> Stream<'a, Self::Output>
    where
        In: 'a,
    {
        let cursor = SharedCursor::new(items);
        let outputs = self
            .mappers
            .iter_mut()
            .map(|mapper| mapper.map(cursor.stream()))
            .collect();
        stream::zip_all(outputs)
    }
}

/// Pushes every item into a queue and passes it on unchanged.
///
/// A failing put (timeout, full queue) ends the stream with that error.
pub struct PutToQueue<T, P> {
    queue: Queue<T>,
    strategy: P,
}

impl<T, P> PutToQueue<T, P> {
    pub fn new(queue: Queue<T>, strategy: P) -> Self {
        Self { queue, strategy }
    }
}

impl<T, P> Mapper<T> for PutToQueue<T, P>
where
    T: Clone + Send + 'static,
    P: PutStrategy<T>,
{
    type Output = T;

    fn map<'a>(&'a mut self, items: Stream<'a, T>) -> Stream<'a, T>
    where
        T: 'a,
    {
        let Self { queue, strategy } = self;
        Box::new(items.map(move |item| {
            let item = item?;
            strategy.put(queue, item.clone())?;
            Ok(item)
        }))
    }
}

/// Hands every item to a loader and passes the original on.
pub struct PushTo<L> {
    loader: L,
}

impl<L> PushTo<L> {
    pub fn new(loader: L) -> Self {
        Self { loader }
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }
}

impl<In, L> Mapper<In> for PushTo<L>
where
    In: Clone + Send + 'static,
    L: Loader<In>,
{
    type Output = In;

    fn map<'a>(&'a mut self, items: Stream<'a, In>) -> Stream<'a, In>
    where
        In: 'a,
    {
        let loader = &mut self.loader;
        Box::new(items.map(move |item| {
            let item = item?;
            loader.load(item.clone())?;
            Ok(item)
        }))
    }
}

/// Hands every item to a loader and passes the loader's result on.
pub struct PushAndMap<L> {
    loader: L,
}

impl<L> PushAndMap<L> {
    pub fn new(loader: L) -> Self {
        Self { loader }
    }
}

impl<In, L> Mapper<In> for PushAndMap<L>
where
    L: Loader<In>,
{
    type Output = L::Output;

    fn map<'a>(&'a mut self, items: Stream<'a, In>) -> Stream<'a, L::Output>
    where
        In: 'a,
    {
        let loader = &mut self.loader;
        Box::new(items.map(move |item| loader.load(item?)))
    }
}

/// Prints every item to stdout and passes it on.
#[derive(Debug, Clone, Copy, Default)]
pub struct Print;

impl<T: Display + Send + 'static> Mapper<T> for Print {
    type Output = T;

    fn map<'a>(&'a mut self, items: Stream<'a, T>) -> Stream<'a, T>
    where
        T: 'a,
    {
        Box::new(items.inspect(|item| {
            if let Ok(item) = item {
                println!("{item}");
            }
        }))
    }
}
