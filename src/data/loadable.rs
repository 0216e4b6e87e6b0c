/// Async-loaded value as seen by a view.
///
/// Every `Loading` ends in `Ready`, `Empty` or `Failed`; views never spin forever.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Loadable<T> {
    #[default]
    Idle,
    Loading,
    Ready(T),
    Empty,
    Failed(String),
}

impl<T> Loadable<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

impl<T> Loadable<Vec<T>> {
    /// Settle a list fetch: an empty list is `Empty`, not an error
    pub fn from_list<E: std::fmt::Display>(result: Result<Vec<T>, E>) -> Self {
        match result {
            Ok(items) if items.is_empty() => Self::Empty,
            Ok(items) => Self::Ready(items),
            Err(err) => Self::Failed(err.to_string()),
        }
    }

    /// Items if ready, otherwise an empty slice
    pub fn items(&self) -> &[T] {
        match self {
            Self::Ready(items) => items,
            _ => &[],
        }
    }
}

impl<T> Loadable<T> {
    pub fn from_result<E: std::fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Ready(value),
            Err(err) => Self::Failed(err.to_string()),
        }
    }
}

/// Read-only copy of backend-owned data, invalidated after writes.
///
/// Every fetch gets a sequence number; only the latest one may settle. An invalidation
/// raised while a fetch is in flight survives that fetch's result.
#[derive(Clone, Debug, Default)]
pub struct Cached<T> {
    state: Loadable<T>,
    stale: bool,
    seq: u64,
}

impl<T> Cached<T> {
    pub fn state(&self) -> &Loadable<T> {
        &self.state
    }

    /// Mark the cached copy as out of date; the next refresh must refetch it
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    /// Fetch needed: never loaded or invalidated, and nothing in flight.
    /// Failures are not retried until invalidated again.
    pub fn needs_fetch(&self) -> bool {
        if self.state.is_loading() {
            return false;
        }
        self.stale || matches!(self.state, Loadable::Idle)
    }

    pub fn begin(&mut self) -> u64 {
        self.seq += 1;
        self.stale = false;
        self.state = Loadable::Loading;
        self.seq
    }

    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.seq
    }

    /// Store the result of fetch `seq`; returns `false` if a later fetch or reset superseded it
    pub fn settle(&mut self, seq: u64, state: Loadable<T>) -> bool {
        if !self.is_current(seq) {
            return false;
        }
        self.state = state;
        true
    }

    /// Forget the cached copy. Fetches started before the reset can no longer settle.
    pub fn reset(&mut self) {
        self.seq += 1;
        self.stale = false;
        self.state = Loadable::Idle;
    }
}

/// A value with a revision counter that only moves when the content changes
#[derive(Clone, Debug, Default)]
pub struct Versioned<T> {
    value: T,
    revision: u64,
}

impl<T: PartialEq> Versioned<T> {
    pub fn new(value: T) -> Self {
        Self { value, revision: 0 }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Replace the value; returns `true` if the content actually changed
    pub fn set(&mut self, value: T) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        self.revision += 1;
        true
    }

    /// Mutate in place; the revision moves only if the result differs
    pub fn update<F>(&mut self, f: F) -> bool
    where
        T: Clone,
        F: FnOnce(&mut T),
    {
        let mut next = self.value.clone();
        f(&mut next);
        self.set(next)
    }
}

#[cfg(test)]
mod tests {
    use super::{Cached, Loadable, Versioned};

    #[test]
    fn empty_list_is_not_an_error() {
        let state = Loadable::<Vec<u8>>::from_list(Ok::<_, String>(vec![]));
        assert_eq!(state, Loadable::Empty);
        assert!(!state.is_loading());
    }

    #[test]
    fn failed_list_keeps_message() {
        let state = Loadable::<Vec<u8>>::from_list(Err("boom"));
        assert_eq!(state.error(), Some("boom"));
        assert!(state.items().is_empty());
    }

    #[test]
    fn cached_refetches_after_invalidation() {
        let mut cached = Cached::<u32>::default();
        assert!(cached.needs_fetch());

        let seq = cached.begin();
        assert!(!cached.needs_fetch(), "in-flight fetch must not be duplicated");

        assert!(cached.settle(seq, Loadable::Ready(1)));
        assert!(!cached.needs_fetch());

        cached.invalidate();
        assert!(cached.needs_fetch());
        assert_eq!(cached.state().ready(), Some(&1), "stale data stays visible");
    }

    #[test]
    fn invalidation_during_fetch_survives_its_result() {
        let mut cached = Cached::<u32>::default();
        let seq = cached.begin();
        cached.invalidate();

        assert!(cached.settle(seq, Loadable::Ready(1)));
        assert_eq!(cached.state().ready(), Some(&1));
        assert!(cached.needs_fetch(), "result predates the invalidation");
    }

    #[test]
    fn reset_drops_in_flight_result() {
        let mut cached = Cached::<u32>::default();
        let before = cached.begin();
        cached.reset();
        let after = cached.begin();

        assert!(!cached.settle(before, Loadable::Ready(1)));
        assert!(cached.state().is_loading());
        assert!(cached.settle(after, Loadable::Ready(2)));
        assert_eq!(cached.state().ready(), Some(&2));
    }

    #[test]
    fn revision_moves_only_on_change() {
        let mut value = Versioned::new(vec![1, 2]);
        assert!(!value.set(vec![1, 2]));
        assert_eq!(value.revision(), 0);

        assert!(value.set(vec![1, 2, 3]));
        assert_eq!(value.revision(), 1);

        assert!(!value.update(|v| v.sort_unstable()));
        assert_eq!(value.revision(), 1);
    }
}
