//! Test data builders for creating sources with scripted behaviour

use modupipe::pipeline::stream::Stream;
use modupipe::{PipelineError, Result, Source};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// A restartable source that fails a scripted number of passes.
///
/// Each `fetch()` yields the first `fail_after` items and then a
/// `PipelineError::Source`, until `failures` passes have failed; later passes
/// yield every item.
pub struct FlakySource {
    items: Vec<i32>,
    fail_after: usize,
    failures_left: usize,
    fetches: Arc<AtomicUsize>,
}

impl Source for FlakySource {
    type Item = i32;

    fn fetch(&mut self) -> Stream<'_, i32> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let mut pass: Vec<Result<i32>> = Vec::with_capacity(self.items.len());
        if self.failures_left > 0 {
            self.failures_left -= 1;
            pass.extend(self.items.iter().take(self.fail_after).map(|x| Ok(*x)));
            pass.push(Err(PipelineError::Source("flaky pass".to_string())));
        } else {
            pass.extend(self.items.iter().map(|x| Ok(*x)));
        }
        Box::new(pass.into_iter())
    }
}

/// Builder for [`FlakySource`]
pub struct FlakySourceBuilder {
    items: Vec<i32>,
    fail_after: usize,
    failures: usize,
}

impl FlakySourceBuilder {
    pub fn new(items: impl IntoIterator<Item = i32>) -> Self {
        Self {
            items: items.into_iter().collect(),
            fail_after: 0,
            failures: 0,
        }
    }

    /// Number of passes that fail
    pub fn failures(mut self, failures: usize) -> Self {
        self.failures = failures;
        self
    }

    /// Items yielded by a failing pass before its failure
    pub fn fail_after(mut self, fail_after: usize) -> Self {
        self.fail_after = fail_after;
        self
    }

    /// Build the source plus a counter of `fetch()` calls
    pub fn build(self) -> (FlakySource, Arc<AtomicUsize>) {
        let fetches = Arc::new(AtomicUsize::new(0));
        let source = FlakySource {
            items: self.items,
            fail_after: self.fail_after,
            failures_left: self.failures,
            fetches: Arc::clone(&fetches),
        };
        (source, fetches)
    }
}

/// An infinite source of 0, 1, 2, ... that counts how often it is pulled.
pub fn counting_source(pulls: Arc<AtomicUsize>) -> impl Source<Item = usize> {
    modupipe::pipeline::source::FromFn::new(move || Some(Ok(pulls.fetch_add(1, Ordering::SeqCst))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flaky_source_builder() {
        let (mut source, fetches) = FlakySourceBuilder::new([1, 2, 3])
            .failures(1)
            .fail_after(2)
            .build();

        let first: Vec<_> = source.fetch().collect();
        assert_eq!(first.len(), 3);
        assert!(first[2].is_err());

        let second: Vec<i32> = source.fetch().map(|x| x.unwrap()).collect();
        assert_eq!(second, vec![1, 2, 3]);
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }
}
