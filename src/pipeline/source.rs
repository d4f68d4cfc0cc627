//! Data producers.
//!
//! A [`Source`] hands out a fresh lazy [`Stream`] on every `fetch()`. Items are
//! produced only when the consumer pulls them, so composing sources with
//! mappers costs nothing until a runnable starts driving the result.

use crate::error::{PipelineError, Result};
use crate::pipeline::mapper::Mapper;
use crate::pipeline::queue::{GetStrategy, Queue};
use crate::pipeline::stream::{self, Stream};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::marker::PhantomData;

/// A capability that produces a lazy, possibly infinite, sequence of items.
pub trait Source: Send {
    type Item: Send + 'static;

    /// Begin a new pass over the sequence.
    ///
    /// Whether a second pass starts over depends on the source: in-memory and
    /// generated sources restart, queue-backed ones continue where the queue is.
    fn fetch(&mut self) -> Stream<'_, Self::Item>;
}

impl<S: Source + ?Sized> Source for Box<S> {
    type Item = S::Item;

    fn fetch(&mut self) -> Stream<'_, Self::Item> {
        (**self).fetch()
    }
}

/// Builder-style combinators available on every [`Source`].
pub trait SourceExt: Source + Sized {
    /// Thread every fetched item through `mapper`.
    fn mapped_with<M>(self, mapper: M) -> MappedSource<Self, M>
    where
        M: Mapper<Self::Item>,
    {
        MappedSource::new(self, mapper)
    }

    /// Fail with `MaxIterationsReached` once more than `limit` items are pulled.
    fn max_iterations(self, limit: usize) -> MaxIterations<Self> {
        MaxIterations::new(self, limit)
    }

    fn boxed(self) -> Box<dyn Source<Item = Self::Item>>
    where
        Self: 'static,
    {
        Box::new(self)
    }
}

impl<S: Source> SourceExt for S {}

// ==================== Composition ====================

/// A source whose items pass through a mapper chain.
pub struct MappedSource<S, M> {
    source: S,
    mapper: M,
}

impl<S, M> MappedSource<S, M> {
    pub fn new(source: S, mapper: M) -> Self {
        Self { source, mapper }
    }
}

impl<S, M> Source for MappedSource<S, M>
where
    S: Source,
    M: Mapper<S::Item>,
{
    type Item = M::Output;

    fn fetch(&mut self) -> Stream<'_, Self::Item> {
        let upstream = self.source.fetch();
        self.mapper.map(upstream)
    }
}

/// Wraps a source and stops it after `limit` items.
///
/// Pulling past the limit yields `MaxIterationsReached` instead of a quiet
/// end, so drivers can tell "the bound was hit" from "the data ran out". If
/// the wrapped source runs out first, the stream simply ends.
pub struct MaxIterations<S> {
    source: S,
    limit: usize,
}

impl<S> MaxIterations<S> {
    pub fn new(source: S, limit: usize) -> Self {
        Self { source, limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl<S: Source> Source for MaxIterations<S> {
    type Item = S::Item;

    fn fetch(&mut self) -> Stream<'_, Self::Item> {
        let limit = self.limit;
        let mut upstream = self.source.fetch();
        let mut pulled = 0usize;
        let mut done = false;
        Box::new(std::iter::from_fn(move || {
            if done {
                return None;
            }
            let next = upstream.next();
            match next {
                Some(Ok(_)) if pulled >= limit => {
                    done = true;
                    Some(Err(PipelineError::MaxIterationsReached { limit }))
                }
                Some(Ok(item)) => {
                    pulled += 1;
                    Some(Ok(item))
                }
                Some(Err(e)) => {
                    done = true;
                    Some(Err(e))
                }
                None => {
                    done = true;
                    None
                }
            }
        }))
    }
}

/// Steps several sources in lockstep and yields one `Vec` per round.
///
/// Ends as soon as the shortest member ends.
pub struct SourceList<S> {
    sources: Vec<S>,
}

impl<S> SourceList<S> {
    pub fn new(sources: Vec<S>) -> Self {
        Self { sources }
    }
}

impl<S: Source> Source for SourceList<S> {
    type Item = Vec<S::Item>;

    fn fetch(&mut self) -> Stream<'_, Self::Item> {
        let streams = self.sources.iter_mut().map(Source::fetch).collect();
        stream::zip_all(streams)
    }
}

// ==================== Leaf sources ====================

/// Pulls forever from a queue using the given get strategy.
///
/// With a blocking strategy every pull suspends the calling thread until an
/// item arrives (or the strategy's timeout fails the stream).
pub struct QueueSource<T, G> {
    queue: Queue<T>,
    strategy: G,
}

impl<T, G> QueueSource<T, G> {
    pub fn new(queue: Queue<T>, strategy: G) -> Self {
        Self { queue, strategy }
    }
}

impl<T, G> Source for QueueSource<T, G>
where
    T: Send + 'static,
    G: GetStrategy<T>,
{
    type Item = T;

    fn fetch(&mut self) -> Stream<'_, T> {
        let Self { queue, strategy } = self;
        Box::new(std::iter::repeat_with(move || strategy.get(queue)))
    }
}

/// Infinite uniform values in `[0, 1)`.
pub struct Random {
    rng: StdRng,
}

impl Random {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sequence for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for Random {
    fn default() -> Self {
        Self::new()
    }
}

impl Source for Random {
    type Item = f64;

    fn fetch(&mut self) -> Stream<'_, f64> {
        let rng = &mut self.rng;
        Box::new(std::iter::repeat_with(move || Ok(rng.gen::<f64>())))
    }
}

/// In-memory items, replayed from the start on every fetch.
#[derive(Debug, Clone)]
pub struct Items<T> {
    items: Vec<T>,
}

impl<T> Items<T> {
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }
}

impl<T: Clone + Send + 'static> Source for Items<T> {
    type Item = T;

    fn fetch(&mut self) -> Stream<'_, T> {
        stream::boxed(self.items.clone().into_iter().map(Ok))
    }
}

/// A source driven by a closure; `None` ends the current pass.
///
/// The closure keeps its state between fetches.
pub struct FromFn<T, F> {
    next: F,
    _item: PhantomData<fn() -> T>,
}

impl<T, F> FromFn<T, F>
where
    F: FnMut() -> Option<Result<T>> + Send,
{
    pub fn new(next: F) -> Self {
        Self {
            next,
            _item: PhantomData,
        }
    }
}

impl<T, F> Source for FromFn<T, F>
where
    T: Send + 'static,
    F: FnMut() -> Option<Result<T>> + Send,
{
    type Item = T;

    fn fetch(&mut self) -> Stream<'_, T> {
        Box::new(std::iter::from_fn(&mut self.next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::mapper::{self, MapperExt};
    use crate::pipeline::queue::{GetBlocking, GetNonBlocking};
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn drain<S: Source>(source: &mut S) -> Vec<Result<S::Item>> {
        source.fetch().collect()
    }

    fn counting(counter: Arc<AtomicUsize>) -> impl Source<Item = usize> {
        FromFn::new(move || Some(Ok(counter.fetch_add(1, Ordering::SeqCst))))
    }

    #[test]
    fn test_max_iterations_stops_after_limit() {
        let mut source = Items::new([1, 2, 3, 4]).max_iterations(2);
        let mut stream = source.fetch();
        assert_eq!(stream.next().unwrap().unwrap(), 1);
        assert_eq!(stream.next().unwrap().unwrap(), 2);
        let err = stream.next().unwrap().unwrap_err();
        assert!(err.is_bound_exceeded());
        assert!(stream.next().is_none());
    }

    #[test]
    fn test_max_iterations_ends_quietly_when_source_runs_out() {
        let mut source = MaxIterations::new(Items::new([1, 2]), 5);
        let items: Vec<i32> = source.fetch().collect::<Result<_>>().unwrap();
        assert_eq!(items, vec![1, 2]);
    }

    #[test]
    fn test_max_iterations_zero_signals_on_first_pull() {
        let mut source = MaxIterations::new(Random::seeded(1), 0);
        assert!(source.fetch().next().unwrap().unwrap_err().is_bound_exceeded());
    }

    #[test]
    fn test_mapped_source_maps_values() {
        let mut source = Items::new([1, 2, 3]).mapped_with(mapper::Map::new(|x: i32| x * 10));
        let items: Vec<i32> = source.fetch().collect::<Result<_>>().unwrap();
        assert_eq!(items, vec![10, 20, 30]);
    }

    #[test]
    fn test_mapping_is_lazy() {
        let pulls = Arc::new(AtomicUsize::new(0));
        let mapped = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&mapped);
        let mut source = counting(Arc::clone(&pulls)).mapped_with(
            mapper::Map::new(move |x: usize| {
                seen.fetch_add(1, Ordering::SeqCst);
                x
            })
            .then(mapper::ToString),
        );
        assert_eq!(pulls.load(Ordering::SeqCst), 0);

        let mut stream = source.fetch();
        assert_eq!(pulls.load(Ordering::SeqCst), 0);

        let first: Vec<String> = stream.by_ref().take(3).collect::<Result<_>>().unwrap();
        assert_eq!(first, vec!["0", "1", "2"]);
        assert_eq!(pulls.load(Ordering::SeqCst), 3);
        assert_eq!(mapped.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_source_list_zips_to_shortest() {
        let mut source = SourceList::new(vec![
            Items::new([1, 2, 3]).boxed(),
            counting(Arc::new(AtomicUsize::new(100))).mapped_with(mapper::Map::new(|x: usize| x as i32)).boxed(),
        ]);
        let items: Vec<Vec<i32>> = source.fetch().collect::<Result<_>>().unwrap();
        assert_eq!(items, vec![vec![1, 100], vec![2, 101], vec![3, 102]]);
    }

    #[test]
    fn test_source_list_does_not_signal_bound() {
        let mut source = SourceList::new(vec![Items::new([1.0, 2.0, 3.0]).boxed(), Random::seeded(7).boxed()]);
        let results = drain(&mut source);
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.is_ok()));
    }

    #[test]
    fn test_queue_source_pulls_from_queue() {
        let queue = Queue::unbounded();
        queue.put_nonblocking(1.5).unwrap();
        queue.put_nonblocking(2.5).unwrap();
        let mut source = QueueSource::new(queue.clone(), GetBlocking::new());
        let mut stream = source.fetch();
        assert_eq!(stream.next().unwrap().unwrap(), 1.5);
        assert_eq!(stream.next().unwrap().unwrap(), 2.5);
    }

    #[test]
    fn test_queue_source_surfaces_would_block() {
        let mut source = QueueSource::new(Queue::<u8>::bounded(1), GetNonBlocking);
        let err = source.fetch().next().unwrap().unwrap_err();
        assert!(matches!(err, PipelineError::QueueEmpty { .. }));
    }

    #[test]
    fn test_random_values_are_in_unit_interval() {
        let mut source = Random::seeded(42);
        for value in source.fetch().take(1000) {
            let value = value.unwrap();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn test_items_restart_on_every_fetch() {
        let mut source = Items::new(["a", "b"]);
        assert_eq!(drain(&mut source).len(), 2);
        assert_eq!(drain(&mut source).len(), 2);
    }

    proptest! {
        #[test]
        fn test_max_iterations_is_exact(limit in 0usize..50, extra in 1usize..10) {
            let data: Vec<usize> = (0..limit + extra).collect();
            let mut source = Items::new(data.clone()).max_iterations(limit);
            let results = drain(&mut source);
            prop_assert_eq!(results.len(), limit + 1);
            for (i, result) in results[..limit].iter().enumerate() {
                prop_assert_eq!(*result.as_ref().unwrap(), data[i]);
            }
            prop_assert!(results[limit].as_ref().unwrap_err().is_bound_exceeded());
        }
    }
}
