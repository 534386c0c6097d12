//! Bounded least-recently-used cache
//!
//! Entries live in a slab threaded into a doubly linked recency list by
//! index; a hash map points each key at its slot. Every operation is O(1)
//! on average.

use skiplite_core::HotCache;
use std::collections::HashMap;
use std::hash::Hash;

/// Capacity used when none is configured
pub const DEFAULT_LRU_CAPACITY: usize = 8;

struct Entry<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// LRU cache with a fixed capacity
pub struct LruCache<K, V> {
    map: HashMap<K, usize>,
    slots: Vec<Option<Entry<K, V>>>,
    free: Vec<usize>,
    /// Most recently used
    head: Option<usize>,
    /// Least recently used, next to be evicted
    tail: Option<usize>,
    capacity: usize,
}

impl<K: Hash + Eq + Clone, V> LruCache<K, V> {
    /// Creates a cache. A capacity of 0 caches nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
            capacity,
        }
    }

    /// Maximum number of entries
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Membership probe that leaves recency untouched
    pub fn contains(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Returns the value and marks the key most recently used
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.map.get(key)?;
        self.detach(idx);
        self.push_front(idx);
        self.slots[idx].as_ref().map(|e| &e.value)
    }

    /// Inserts or overwrites a key as most recently used.
    ///
    /// When full, the least recently used entry is evicted first.
    pub fn put(&mut self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }
        if let Some(&idx) = self.map.get(&key) {
            if let Some(entry) = self.slots[idx].as_mut() {
                entry.value = value;
            }
            self.detach(idx);
            self.push_front(idx);
            return;
        }
        if self.map.len() >= self.capacity {
            if let Some(lru) = self.tail {
                self.evict(lru);
            }
        }

        let entry = Entry {
            key: key.clone(),
            value,
            prev: None,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(entry);
                idx
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        };
        self.map.insert(key, idx);
        self.push_front(idx);
    }

    /// Removes a key, returning its value
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.map.remove(key)?;
        self.detach(idx);
        self.free.push(idx);
        self.slots[idx].take().map(|e| e.value)
    }

    /// Entries from most to least recently used
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: &self.slots,
            next: self.head,
        }
    }

    fn evict(&mut self, idx: usize) {
        self.detach(idx);
        if let Some(entry) = self.slots[idx].take() {
            self.map.remove(&entry.key);
        }
        self.free.push(idx);
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = match self.slots[idx].as_ref() {
            Some(e) => (e.prev, e.next),
            None => return,
        };
        match prev {
            Some(p) => self.link_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.link_mut(n).prev = prev,
            None => self.tail = prev,
        }
    }

    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        {
            let entry = self.link_mut(idx);
            entry.prev = None;
            entry.next = old_head;
        }
        match old_head {
            Some(h) => self.link_mut(h).prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    fn link_mut(&mut self, idx: usize) -> &mut Entry<K, V> {
        self.slots[idx]
            .as_mut()
            .expect("recency list points at an empty slot")
    }
}

/// Iterator from most to least recently used
pub struct Iter<'a, K, V> {
    slots: &'a [Option<Entry<K, V>>],
    next: Option<usize>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.slots[self.next?].as_ref()?;
        self.next = entry.next;
        Some((&entry.key, &entry.value))
    }
}

impl<K, V> HotCache<K, V> for LruCache<K, V>
where
    K: Hash + Eq + Clone + Send,
    V: Send,
{
    fn get(&mut self, key: &K) -> Option<&V> {
        LruCache::get(self, key)
    }

    fn put(&mut self, key: K, value: V) {
        LruCache::put(self, key, value)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        LruCache::remove(self, key)
    }

    fn contains(&self, key: &K) -> bool {
        LruCache::contains(self, key)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Cache used when the hot tier is disabled. Holds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl<K, V> HotCache<K, V> for NoCache {
    fn get(&mut self, _key: &K) -> Option<&V> {
        None
    }

    fn put(&mut self, _key: K, _value: V) {}

    fn remove(&mut self, _key: &K) -> Option<V> {
        None
    }

    fn contains(&self, _key: &K) -> bool {
        false
    }

    fn len(&self) -> usize {
        0
    }

    fn capacity(&self) -> usize {
        0
    }
}
