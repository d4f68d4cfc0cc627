//! Lazy item streams shared by sources and mappers.
//!
//! A [`Stream`] is a boxed, pull-driven iterator of `Result<T>`:
//!
//! - `Some(Ok(item))` - the next item.
//! - `Some(Err(e))` - a failure; the consumer stops pulling.
//! - `None` - natural end of the sequence.
//!
//! Nothing happens until the consumer calls `next()`.

use crate::error::Result;
use std::sync::{Arc, Mutex};

/// A lazy sequence of fallible items borrowed from the stage that created it.
pub type Stream<'a, T> = Box<dyn Iterator<Item = Result<T>> + Send + 'a>;

/// Box any compatible iterator into a [`Stream`].
pub fn boxed<'a, T, I>(iter: I) -> Stream<'a, T>
where
    I: Iterator<Item = Result<T>> + Send + 'a,
{
    Box::new(iter)
}

/// A stream that yields nothing.
pub fn empty<'a, T: Send + 'a>() -> Stream<'a, T> {
    Box::new(std::iter::empty())
}

/// Step several streams in lockstep, yielding one `Vec` per round.
///
/// Ends as soon as any member ends; pulls already made from earlier members in
/// that round are abandoned. A failure from any member is passed through.
/// With no members the result is empty.
pub fn zip_all<'a, T: Send + 'a>(mut streams: Vec<Stream<'a, T>>) -> Stream<'a, Vec<T>> {
    let mut done = streams.is_empty();
    Box::new(std::iter::from_fn(move || {
        if done {
            return None;
        }
        let mut round = Vec::with_capacity(streams.len());
        for stream in streams.iter_mut() {
            match stream.next() {
                Some(Ok(item)) => round.push(item),
                Some(Err(e)) => {
                    done = true;
                    return Some(Err(e));
                }
                None => {
                    done = true;
                    return None;
                }
            }
        }
        Some(Ok(round))
    }))
}

/// A cursor over one upstream stream that several consumers pull from.
///
/// Every clone draws from the same position, so each upstream item is handed
/// to exactly one consumer.
pub struct SharedCursor<'a, T> {
    inner: Arc<Mutex<Stream<'a, T>>>,
}

impl<'a, T: Send + 'a> SharedCursor<'a, T> {
    pub fn new(stream: Stream<'a, T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(stream)),
        }
    }

    /// A stream view over the shared position.
    pub fn stream(&self) -> Stream<'a, T> {
        Box::new(self.clone())
    }
}

impl<T> Clone for SharedCursor<'_, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Iterator for SharedCursor<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        // A panic in another consumer leaves the cursor itself intact.
        let mut guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;

    fn numbers<'a>(items: Vec<u32>) -> Stream<'a, u32> {
        boxed(items.into_iter().map(Ok))
    }

    #[test]
    fn test_zip_all_stops_at_shortest() {
        let zipped: Vec<_> = zip_all(vec![numbers(vec![1, 2, 3]), numbers(vec![10, 20])])
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(zipped, vec![vec![1, 10], vec![2, 20]]);
    }

    #[test]
    fn test_zip_all_without_members_is_empty() {
        let mut zipped = zip_all::<u32>(Vec::new());
        assert!(zipped.next().is_none());
    }

    #[test]
    fn test_zip_all_passes_failure_through() {
        let failing = boxed(vec![Err(PipelineError::Source("boom".into()))].into_iter());
        let mut zipped = zip_all(vec![numbers(vec![1]), failing]);
        assert!(matches!(zipped.next(), Some(Err(PipelineError::Source(_)))));
        assert!(zipped.next().is_none());
    }

    #[test]
    fn test_shared_cursor_hands_out_each_item_once() {
        let cursor = SharedCursor::new(numbers(vec![1, 2, 3, 4]));
        let mut a = cursor.stream();
        let mut b = cursor.stream();
        assert_eq!(a.next().unwrap().unwrap(), 1);
        assert_eq!(b.next().unwrap().unwrap(), 2);
        assert_eq!(a.next().unwrap().unwrap(), 3);
        assert_eq!(b.next().unwrap().unwrap(), 4);
        assert!(a.next().is_none());
    }
}
