//! Predicates over single items, used by `Filter`, `OnCondition` and
//! `ConditionalSink`.

/// A predicate over one item.
///
/// Conditions may keep stage-local state (hence `&mut self`), but they must not
/// hold on to the item they are shown.
pub trait Condition<T: ?Sized>: Send {
    fn check(&mut self, item: &T) -> bool;
}

impl<T: ?Sized, F> Condition<T> for F
where
    F: FnMut(&T) -> bool + Send,
{
    fn check(&mut self, item: &T) -> bool {
        self(item)
    }
}

/// Inverts another condition.
pub struct Not<C>(pub C);

impl<T: ?Sized, C: Condition<T>> Condition<T> for Not<C> {
    fn check(&mut self, item: &T) -> bool {
        !self.0.check(item)
    }
}

/// Holds on every `n`-th item (the 1st, `n+1`-th, ...).
pub struct EveryNth {
    n: usize,
    seen: usize,
}

impl EveryNth {
    pub fn new(n: usize) -> Self {
        Self { n: n.max(1), seen: 0 }
    }
}

impl<T: ?Sized> Condition<T> for EveryNth {
    fn check(&mut self, _item: &T) -> bool {
        let hit = self.seen % self.n == 0;
        self.seen += 1;
        hit
    }
}
