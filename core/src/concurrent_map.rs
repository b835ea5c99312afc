//! Sharded map for accumulating values from many threads at once.
//!
//! Every key lives in exactly one bucket, chosen by hashing the key. Each
//! bucket has its own lock, so two workers touching keys in different
//! buckets never wait on each other. Parallel ranking uses this to sum
//! relevance per document without a single global lock.

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

pub struct ConcurrentMap<K, V> {
    buckets: Vec<Mutex<BTreeMap<K, V>>>,
}

impl<K, V> ConcurrentMap<K, V>
where
    K: Ord + Hash,
    V: Default,
{
    /// Creates a map with `bucket_count` independently locked shards (at least one).
    pub fn new(bucket_count: usize) -> Self {
        let buckets = (0..bucket_count.max(1))
            .map(|_| Mutex::new(BTreeMap::new()))
            .collect();
        Self { buckets }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    fn bucket_index(&self, key: &K) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.buckets.len() as u64) as usize
    }

    /// Locks the bucket owning `key` and returns its value, inserting the default first.
    pub fn access(&self, key: K) -> MappedMutexGuard<'_, V> {
        let bucket = self.buckets[self.bucket_index(&key)].lock();
        MutexGuard::map(bucket, |map| map.entry(key).or_default())
    }

    /// Applies `f` to the value of `key` while holding only that key's bucket lock.
    pub fn update<F>(&self, key: K, f: F)
    where
        F: FnOnce(&mut V),
    {
        let mut value = self.access(key);
        f(&mut value);
    }

    pub fn erase(&self, key: &K) -> Option<V> {
        self.buckets[self.bucket_index(key)].lock().remove(key)
    }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(|bucket| bucket.lock().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(|bucket| bucket.lock().is_empty())
    }

    /// Merges every bucket into one ordered map. Takes `self` so no writer can still be running.
    pub fn build_ordinary_map(self) -> BTreeMap<K, V> {
        let mut merged = BTreeMap::new();
        for bucket in self.buckets {
            merged.extend(bucket.into_inner());
        }
        merged
    }
}
