use dashmap::DashMap;

use crate::model::{ContentType, Counter, Snapshot, TimeBucket};

type Key = (ContentType, TimeBucket);

/// Live, write-optimized staging area for engagement counts.
///
/// Every increment goes through [DashMap::entry], which holds the shard's write
/// lock across the lookup, the insert of a missing entry and the increment, so
/// the get-or-create never races and same-key increments are linearizable.
/// Keys that live on different shards never contend.
#[derive(Debug, Default)]
pub struct CounterStore {
    counters: DashMap<Key, Counter>,
}

impl CounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_view(&self, content: &ContentType, bucket: &TimeBucket) {
        self.update(content, bucket, |counter| counter.view += 1);
    }

    pub fn record_click(&self, content: &ContentType, bucket: &TimeBucket) {
        self.update(content, bucket, |counter| counter.click += 1);
    }

    fn update(&self, content: &ContentType, bucket: &TimeBucket, f: impl FnOnce(&mut Counter)) {
        let mut counter = self
            .counters
            .entry((content.clone(), bucket.clone()))
            .or_default();
        f(counter.value_mut());
    }

    pub fn get(&self, content: &ContentType, bucket: &TimeBucket) -> Option<Counter> {
        self.counters
            .get(&(content.clone(), bucket.clone()))
            .map(|counter| *counter.value())
    }

    /// Remove every entry and return what it held.
    ///
    /// Each entry is removed under its shard lock, so its view/click pair is
    /// never observed half-updated. Entries created while the drain is running
    /// may be left for the next drain.
    pub fn drain(&self) -> Vec<Snapshot> {
        let keys: Vec<Key> = self.counters.iter().map(|entry| entry.key().clone()).collect();

        keys.into_iter()
            .filter_map(|key| self.counters.remove(&key))
            .map(|((content, bucket), counter)| Snapshot::new(content, bucket, counter))
            .collect()
    }

    /// Read every entry without clearing it.
    pub fn snapshot(&self) -> Vec<Snapshot> {
        self.counters
            .iter()
            .map(|entry| {
                let (content, bucket) = entry.key().clone();
                Snapshot::new(content, bucket, *entry.value())
            })
            .collect()
    }

    /// Add drained counts back, merging with anything recorded since the drain.
    pub fn restore(&self, snapshots: impl IntoIterator<Item = Snapshot>) {
        for Snapshot {
            content,
            bucket,
            counter,
        } in snapshots
        {
            self.counters
                .entry((content, bucket))
                .or_default()
                .merge(counter);
        }
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }
}
