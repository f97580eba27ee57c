use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::Arc;

/// Concurrent append-only cache. An entry, once written, is never replaced,
/// so readers on other threads only ever see one value per key. When the
/// cache is full new keys are simply not remembered; a miss is recomputed.
pub struct LockFreeCache<K, V> {
    map: Arc<DashMap<K, V>>,
    capacity: usize,
}

impl<K, V> Clone for LockFreeCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            map: Arc::clone(&self.map),
            capacity: self.capacity,
        }
    }
}

impl<K, V> LockFreeCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            map: Arc::new(DashMap::with_capacity(capacity.min(4096))),
            capacity,
        }
    }

    #[inline(always)]
    pub fn get(&self, key: &K) -> Option<V> {
        self.map.get(key).map(|v| v.clone())
    }

    /// Stores `value` unless the key is already present, and returns the
    /// value that is now cached (the earlier one if there was one).
    #[inline(always)]
    pub fn insert(&self, key: K, value: V) -> V {
        if self.map.len() >= self.capacity {
            return self.get(&key).unwrap_or(value);
        }
        match self.map.entry(key) {
            Entry::Occupied(existing) => existing.get().clone(),
            Entry::Vacant(slot) => slot.insert(value).clone(),
        }
    }

    #[inline(always)]
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
