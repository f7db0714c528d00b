//! Multiset of requested polling intervals.

use std::time::Duration;

/// Polling intervals requested by independent subscribers.
///
/// Each `insert` corresponds to one subscriber; `remove` drops a single
/// matching entry, so two subscribers asking for the same interval are
/// tracked independently. The effective interval is cached and kept equal to
/// the minimum entry.
#[derive(Debug, Default, Clone)]
pub(crate) struct IntervalSet {
    entries: Vec<Duration>,
    effective: Option<Duration>,
}

impl IntervalSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register one more subscriber at `interval`.
    pub(crate) fn insert(&mut self, interval: Duration) {
        self.entries.push(interval);
        self.recompute();
    }

    /// Remove the first entry equal to `interval`.
    ///
    /// Returns `false` (and changes nothing) if no entry matches.
    pub(crate) fn remove(&mut self, interval: Duration) -> bool {
        match self.entries.iter().position(|entry| *entry == interval) {
            Some(idx) => {
                self.entries.remove(idx);
                self.recompute();
                true
            }
            None => false,
        }
    }

    /// The fastest requested interval, or `None` when nobody is subscribed.
    pub(crate) fn effective(&self) -> Option<Duration> {
        self.effective
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn to_vec(&self) -> Vec<Duration> {
        self.entries.clone()
    }

    fn recompute(&mut self) {
        self.effective = self.entries.iter().copied().min();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_empty_is_unbounded() {
        let set = IntervalSet::new();
        assert_eq!(set.effective(), None);
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn test_minimum_tracks_inserts_and_removes() {
        let mut set = IntervalSet::new();
        set.insert(ms(100));
        assert_eq!(set.effective(), Some(ms(100)));

        set.insert(ms(50));
        assert_eq!(set.effective(), Some(ms(50)));

        assert!(set.remove(ms(50)));
        assert_eq!(set.effective(), Some(ms(100)));

        assert!(set.remove(ms(100)));
        assert_eq!(set.effective(), None);
    }

    #[test]
    fn test_remove_drops_single_occurrence() {
        let mut set = IntervalSet::new();
        set.insert(ms(100));
        set.insert(ms(100));

        assert!(set.remove(ms(100)));
        assert_eq!(set.len(), 1);
        assert_eq!(set.effective(), Some(ms(100)));

        assert!(set.remove(ms(100)));
        assert!(!set.remove(ms(100)));
        assert_eq!(set.effective(), None);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut set = IntervalSet::new();
        set.insert(ms(30));

        assert!(!set.remove(ms(40)));
        assert_eq!(set.to_vec(), vec![ms(30)]);
    }

    proptest! {
        #[test]
        fn prop_effective_is_minimum(ops in prop::collection::vec((any::<bool>(), 0u64..8), 0..64)) {
            let mut set = IntervalSet::new();
            let mut model: Vec<u64> = Vec::new();

            for (is_start, value) in ops {
                if is_start {
                    set.insert(ms(value));
                    model.push(value);
                } else {
                    let removed = set.remove(ms(value));
                    let idx = model.iter().position(|v| *v == value);
                    prop_assert_eq!(removed, idx.is_some());
                    if let Some(idx) = idx {
                        model.remove(idx);
                    }
                }

                prop_assert_eq!(set.effective(), model.iter().min().map(|v| ms(*v)));
                prop_assert_eq!(set.len(), model.len());
            }
        }
    }
}
