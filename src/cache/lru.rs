//! Capacity-bounded LRU map
//!
//! Recency is tracked with a monotonically increasing tick per entry and an
//! ordered `tick -> key` map, so the least recently used key is always the
//! first entry of that map.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Cache statistics, passive only
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups through `get` that found an entry
    pub hits: u64,
    /// Lookups through `get` that found nothing
    pub misses: u64,
    /// Entries stored
    pub inserts: u64,
    /// Entries dropped for capacity
    pub evictions: u64,
}

impl CacheStats {
    /// Hit rate in `0.0..=1.0`
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone)]
struct Slot<V> {
    value: V,
    tick: u64,
}

/// LRU map with an optional capacity.
///
/// `None` means unbounded; `Some(0)` stores nothing.
#[derive(Debug, Clone)]
pub struct LruCache<K, V> {
    map: HashMap<K, Slot<V>>,
    order: BTreeMap<u64, K>,
    capacity: Option<usize>,
    next_tick: u64,
    stats: CacheStats,
}

impl<K: Hash + Eq + Clone, V> LruCache<K, V> {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            map: HashMap::new(),
            order: BTreeMap::new(),
            capacity,
            next_tick: 0,
            stats: CacheStats::default(),
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    fn tick(&mut self) -> u64 {
        let t = self.next_tick;
        self.next_tick += 1;
        t
    }

    fn touch(&mut self, key: &K) {
        let tick = self.tick();
        if let Some(slot) = self.map.get_mut(key) {
            if let Some(k) = self.order.remove(&slot.tick) {
                self.order.insert(tick, k);
            }
            slot.tick = tick;
        }
    }

    /// Look up and mark as most recently used
    pub fn get(&mut self, key: &K) -> Option<&V> {
        if self.map.contains_key(key) {
            self.stats.hits += 1;
            self.touch(key);
            self.map.get(key).map(|slot| &slot.value)
        } else {
            self.stats.misses += 1;
            None
        }
    }

    /// Look up without changing recency or statistics
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.map.get(key).map(|slot| &slot.value)
    }

    /// Mutable lookup without changing recency
    pub fn peek_mut(&mut self, key: &K) -> Option<&mut V> {
        self.map.get_mut(key).map(|slot| &mut slot.value)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Store as most recently used, evicting from the cold end if over capacity
    pub fn insert(&mut self, key: K, value: V) {
        let tick = self.tick();
        if let Some(old) = self.map.insert(key.clone(), Slot { value, tick }) {
            self.order.remove(&old.tick);
        }
        self.order.insert(tick, key);
        self.stats.inserts += 1;

        if let Some(capacity) = self.capacity {
            while self.map.len() > capacity {
                let Some((_, cold)) = self.order.pop_first() else {
                    break;
                };
                self.map.remove(&cold);
                self.stats.evictions += 1;
            }
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let slot = self.map.remove(key)?;
        self.order.remove(&slot.tick);
        Some(slot.value)
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }

    /// Keys from least to most recently used
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.order.values()
    }

    /// Visit every entry from least to most recently used without changing
    /// recency
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&K, &mut V)) {
        for key in self.order.values() {
            if let Some(slot) = self.map.get_mut(key) {
                f(key, &mut slot.value);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}
