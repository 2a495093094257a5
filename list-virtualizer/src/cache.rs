use alloc::vec::Vec;

use crate::ItemKey;
use crate::key::KeyMap;

/// Result of [`MeasurementCache::record`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Recorded {
    /// The stored extent is within epsilon of the new one; nothing changed.
    Unchanged,
    /// The extent was inserted or replaced.
    Changed { previous: Option<u32> },
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    extent: u32,
    /// Set when the key was missing from the latest snapshot.
    retired: bool,
}

/// Measured extents keyed by item identity.
///
/// Entries survive reorders and insertions. A key that disappears from the data source is
/// retired for one snapshot (absorbing flicker from rapid updates) and evicted if it is still
/// missing from the next one. At most `slack` retired entries are kept, so the cache never
/// holds more than `present keys + slack` entries after a snapshot sync.
#[derive(Clone, Debug)]
pub(crate) struct MeasurementCache {
    entries: KeyMap<Entry>,
    retired: usize,
    slack: usize,
    epsilon: u32,
}

impl MeasurementCache {
    pub(crate) fn new(slack: usize, epsilon: u32) -> Self {
        Self {
            entries: KeyMap::default(),
            retired: 0,
            slack,
            epsilon,
        }
    }

    /// Updates limits; takes effect on the next record or snapshot sync.
    pub(crate) fn configure(&mut self, slack: usize, epsilon: u32) {
        self.slack = slack;
        self.epsilon = epsilon;
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub(crate) fn retired_len(&self) -> usize {
        self.retired
    }

    pub(crate) fn get(&self, key: &ItemKey) -> Option<u32> {
        self.entries.get(key).map(|e| e.extent)
    }

    /// Upserts a measured extent. Idempotent: re-recording the same value is `Unchanged`.
    pub(crate) fn record(&mut self, key: ItemKey, extent: u32) -> Recorded {
        if let Some(entry) = self.entries.get_mut(&key) {
            if entry.retired {
                entry.retired = false;
                self.retired -= 1;
            }
            if entry.extent.abs_diff(extent) <= self.epsilon {
                return Recorded::Unchanged;
            }
            let previous = entry.extent;
            entry.extent = extent;
            return Recorded::Changed {
                previous: Some(previous),
            };
        }
        self.entries.insert(
            key,
            Entry {
                extent,
                retired: false,
            },
        );
        Recorded::Changed { previous: None }
    }

    pub(crate) fn evict(&mut self, key: &ItemKey) -> Option<u32> {
        let entry = self.entries.remove(key)?;
        if entry.retired {
            self.retired -= 1;
        }
        Some(entry.extent)
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.retired = 0;
    }

    /// Reconciles the cache with the keys of a new data-source snapshot.
    ///
    /// Returns the number of evicted entries.
    pub(crate) fn sync_snapshot(&mut self, is_present: impl Fn(&ItemKey) -> bool) -> usize {
        let mut evict = Vec::new();
        let mut newly_retired = Vec::new();
        for (key, entry) in self.entries.iter_mut() {
            if is_present(key) {
                entry.retired = false;
            } else if entry.retired {
                // Missing from two consecutive snapshots.
                evict.push(key.clone());
            } else {
                newly_retired.push(key.clone());
            }
        }

        for key in &evict {
            self.entries.remove(key);
        }
        let overflow = newly_retired.len().saturating_sub(self.slack);
        for key in newly_retired.drain(..overflow) {
            self.entries.remove(&key);
        }
        for key in &newly_retired {
            if let Some(entry) = self.entries.get_mut(key) {
                entry.retired = true;
            }
        }
        self.retired = newly_retired.len();

        let evicted = evict.len() + overflow;
        if evicted > 0 {
            vtrace!(evicted, retired = self.retired, "MeasurementCache::sync_snapshot");
        }
        evicted
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&ItemKey, u32)> + '_ {
        self.entries.iter().map(|(k, e)| (k, e.extent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys<'a>(names: &'a [&'a str]) -> impl Fn(&ItemKey) -> bool + 'a {
        move |k| names.iter().any(|n| k.as_str() == Some(*n))
    }

    #[test]
    fn record_is_idempotent_within_epsilon() {
        let mut cache = MeasurementCache::new(4, 1);
        let a = ItemKey::from("a");
        assert_eq!(
            cache.record(a.clone(), 30),
            Recorded::Changed { previous: None }
        );
        assert_eq!(cache.record(a.clone(), 30), Recorded::Unchanged);
        assert_eq!(cache.record(a.clone(), 31), Recorded::Unchanged);
        assert_eq!(
            cache.record(a.clone(), 40),
            Recorded::Changed { previous: Some(30) }
        );
        assert_eq!(cache.get(&a), Some(40));
    }

    #[test]
    fn missing_key_is_retired_then_evicted_on_next_snapshot() {
        let mut cache = MeasurementCache::new(4, 0);
        cache.record("a".into(), 10);
        cache.record("b".into(), 20);

        assert_eq!(cache.sync_snapshot(keys(&["a"])), 0);
        assert_eq!(cache.get(&"b".into()), Some(20));
        assert_eq!(cache.retired_len(), 1);

        assert_eq!(cache.sync_snapshot(keys(&["a"])), 1);
        assert_eq!(cache.get(&"b".into()), None);
        assert_eq!(cache.retired_len(), 0);
    }

    #[test]
    fn key_reappearing_after_one_snapshot_is_kept() {
        let mut cache = MeasurementCache::new(4, 0);
        cache.record("a".into(), 10);
        cache.sync_snapshot(keys(&[]));
        cache.sync_snapshot(keys(&["a"]));
        cache.sync_snapshot(keys(&["a"]));
        assert_eq!(cache.get(&"a".into()), Some(10));
    }

    #[test]
    fn retired_entries_are_bounded_by_slack() {
        let mut cache = MeasurementCache::new(2, 0);
        for i in 0..10i64 {
            cache.record(ItemKey::Int(i), 5);
        }
        cache.sync_snapshot(|_| false);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.retired_len(), 2);
    }

    #[test]
    fn evict_removes_entry() {
        let mut cache = MeasurementCache::new(0, 0);
        cache.record(ItemKey::Int(1), 7);
        assert_eq!(cache.evict(&ItemKey::Int(1)), Some(7));
        assert_eq!(cache.evict(&ItemKey::Int(1)), None);
        assert_eq!(cache.len(), 0);
    }
}
