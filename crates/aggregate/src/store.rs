use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use beacon_common::Granularity;

use super::accumulator::Accumulator;
use super::key::AggregationKey;

/// Concurrent map from key to accumulator for one granularity.
///
/// Each entry is updated under its shard's write guard, so a merge is
/// never observed half-applied and concurrent merges on the same key are
/// never lost. Reads return copies.
pub struct BucketStore {
    granularity: Granularity,
    entries: DashMap<AggregationKey, Accumulator>,
}

impl BucketStore {
    pub fn new(granularity: Granularity) -> Self {
        Self {
            granularity,
            entries: DashMap::new(),
        }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &AggregationKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &AggregationKey) -> Option<Accumulator> {
        self.entries.get(key).map(|acc| *acc)
    }

    pub fn average(&self, key: &AggregationKey) -> Option<f64> {
        self.get(key).and_then(|acc| acc.average())
    }

    /// Copy of every entry. Each pair is consistent on its own; the set as a
    /// whole is not a single point-in-time view while writers are active.
    pub fn entries(&self) -> Vec<(AggregationKey, Accumulator)> {
        self.entries
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect()
    }

    pub(crate) fn merge(&self, key: AggregationKey, value: f64) {
        self.entries.entry(key).or_default().merge(value);
    }

    /// Folds a previously drained accumulator back in, adding to whatever
    /// arrived for the same key in the meantime. An empty accumulator is
    /// ignored so no key exists without at least one sample.
    pub fn restore(&self, key: AggregationKey, acc: Accumulator) {
        if acc.count() == 0 {
            return;
        }
        self.entries.entry(key).or_default().absorb(&acc);
    }

    /// Removes and returns every entry whose key matches `predicate`.
    /// Each removal is atomic; merges racing with the drain either land in
    /// the returned accumulator or in a fresh entry.
    pub fn drain_where<F>(&self, predicate: F) -> Vec<(AggregationKey, Accumulator)>
    where
        F: Fn(&AggregationKey) -> bool,
    {
        let keys: Vec<AggregationKey> = self
            .entries
            .iter()
            .filter(|e| predicate(e.key()))
            .map(|e| e.key().clone())
            .collect();

        keys.into_iter()
            .filter_map(|k| self.entries.remove(&k))
            .collect()
    }

    /// Inserts a recovered entry. Returns `false` if the key was already
    /// present, leaving the existing accumulator untouched.
    pub(crate) fn insert_recovered(&self, key: AggregationKey, acc: Accumulator) -> bool {
        match self.entries.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(acc);
                true
            }
        }
    }
}
