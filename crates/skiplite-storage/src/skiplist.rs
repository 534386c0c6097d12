//! SkipList - probabilistic ordered map
//!
//! The header owns one forward link per level up to `max_level`. Every node
//! draws a level by repeated fair coin flips, capped at `max_level`, and is
//! linked at all levels `0..=level`. The level-0 chain from the header is
//! the full key order.
//!
//! ```text
//! level 2:  HEAD ───────────────► 30 ─────────────────► NIL
//! level 1:  HEAD ──────► 20 ────► 30 ──────► 50 ──────► NIL
//! level 0:  HEAD ► 10 ─► 20 ─► 25 ► 30 ─► 40 ► 50 ─► 60 ► NIL
//! ```
//!
//! Node memory is owned by a [`NodeStore`] and level draws come from an
//! injected [`RngCore`], so tests can fix the random sequence and assert the
//! exact shape of the list.

use crate::node::{HeapNodes, NodeId, NodeStore};
use crate::random::ParkMiller;
use rand::RngCore;
use skiplite_core::{InsertOutcome, Result};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::marker::PhantomData;

/// Level ceiling used when none is configured
pub const DEFAULT_MAX_LEVEL: usize = 12;

/// Skip list over an injected node store and random source
pub struct SkipList<K, V, S = HeapNodes<K, V>, R = ParkMiller> {
    /// Header links, one per level `0..=max_level`. `None` is the end of a level.
    head: Vec<Option<NodeId>>,
    cur_level: usize,
    max_level: usize,
    len: usize,
    store: S,
    rng: R,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K: Ord, V> SkipList<K, V> {
    /// Creates an empty heap-backed list with the default seeded generator
    pub fn new(max_level: usize) -> Self {
        Self::with_parts(max_level, HeapNodes::new(), ParkMiller::default())
    }
}

impl<K, V, S, R> SkipList<K, V, S, R>
where
    K: Ord,
    S: NodeStore<K, V>,
    R: RngCore,
{
    /// Creates an empty list from an explicit store and random source
    pub fn with_parts(max_level: usize, store: S, rng: R) -> Self {
        Self {
            head: vec![None; max_level + 1],
            cur_level: 0,
            max_level,
            len: 0,
            store,
            rng,
            _marker: PhantomData,
        }
    }

    /// Number of keys in the list
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the list holds no keys
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Highest level with at least one node (0 when empty)
    pub fn cur_level(&self) -> usize {
        self.cur_level
    }

    /// Configured level ceiling
    pub fn max_level(&self) -> usize {
        self.max_level
    }

    /// The node store
    pub fn store(&self) -> &S {
        &self.store
    }

    fn next_of(&self, pred: Option<NodeId>, level: usize) -> Option<NodeId> {
        match pred {
            None => self.head[level],
            Some(id) => self.store.next(id, level),
        }
    }

    fn set_next_of(&mut self, pred: Option<NodeId>, level: usize, next: Option<NodeId>) {
        match pred {
            None => self.head[level] = next,
            Some(id) => self.store.set_next(id, level, next),
        }
    }

    fn cmp_key<Q>(&self, id: NodeId, key: &Q) -> Ordering
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let stored: &Q = self.store.key(id).borrow();
        stored.cmp(key)
    }

    /// Descends from `cur_level` to 0, recording the last node before `key`
    /// at each level (`None` is the header). Returns the predecessors and
    /// the level-0 landing node.
    fn descend<Q>(&self, key: &Q) -> (Vec<Option<NodeId>>, Option<NodeId>)
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut update = vec![None; self.max_level + 1];
        let mut cur = None;
        for level in (0..=self.cur_level).rev() {
            while let Some(next) = self.next_of(cur, level) {
                if self.cmp_key(next, key) == Ordering::Less {
                    cur = Some(next);
                } else {
                    break;
                }
            }
            update[level] = cur;
        }
        (update, self.next_of(cur, 0))
    }

    fn find<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut cur = None;
        for level in (0..=self.cur_level).rev() {
            while let Some(next) = self.next_of(cur, level) {
                if self.cmp_key(next, key) == Ordering::Less {
                    cur = Some(next);
                } else {
                    break;
                }
            }
        }
        self.next_of(cur, 0)
            .filter(|id| self.cmp_key(*id, key) == Ordering::Equal)
    }

    /// Draws a level in `[0, max_level]`: one level per consecutive
    /// "continue" coin flip.
    fn random_level(&mut self) -> usize {
        let mut level = 0;
        while level < self.max_level && self.rng.next_u32() % 2 == 1 {
            level += 1;
        }
        level
    }

    /// Inserts a key, or overwrites the value of an existing one in place
    pub fn insert(&mut self, key: K, value: V) -> Result<InsertOutcome> {
        let (mut update, landing) = self.descend(&key);

        if let Some(id) = landing {
            if *self.store.key(id) == key {
                *self.store.value_mut(id) = value;
                return Ok(InsertOutcome::Updated);
            }
        }

        let level = self.random_level();
        // A failed allocation must leave the list untouched
        let id = self.store.allocate(key, value, level)?;
        if level > self.cur_level {
            for slot in &mut update[self.cur_level + 1..=level] {
                *slot = None;
            }
            self.cur_level = level;
        }

        for (lvl, pred) in update.iter().enumerate().take(level + 1) {
            let succ = self.next_of(*pred, lvl);
            self.store.set_next(id, lvl, succ);
            self.set_next_of(*pred, lvl, Some(id));
        }
        self.len += 1;
        Ok(InsertOutcome::Inserted)
    }

    /// Looks up a key
    pub fn search<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).map(|id| self.store.value(id))
    }

    /// Returns true if the key is present
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Removes a key. Returns false if it was not present.
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let (update, landing) = self.descend(key);
        let target = match landing {
            Some(id) if self.cmp_key(id, key) == Ordering::Equal => id,
            _ => return false,
        };

        for level in 0..=self.cur_level {
            if self.next_of(update[level], level) != Some(target) {
                // Higher levels never pointed at the target
                break;
            }
            let succ = self.store.next(target, level);
            self.set_next_of(update[level], level, succ);
        }
        self.store.release(target);

        while self.cur_level > 0 && self.head[self.cur_level].is_none() {
            self.cur_level -= 1;
        }
        self.len -= 1;
        true
    }

    /// Entries in ascending key order (the level-0 chain)
    pub fn iter(&self) -> Iter<'_, K, V, S> {
        Iter {
            store: &self.store,
            next: self.head[0],
            _marker: PhantomData,
        }
    }

    /// Keys threaded at `level`, in order. Empty above `cur_level`.
    pub fn level_keys(&self, level: usize) -> Vec<&K> {
        let mut keys = Vec::new();
        if level > self.max_level {
            return keys;
        }
        let mut cur = self.head[level];
        while let Some(id) = cur {
            keys.push(self.store.key(id));
            cur = self.store.next(id, level);
        }
        keys
    }

    /// Level a key was drawn at, if present
    pub fn level_of<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.find(key).map(|id| self.store.level(id))
    }
}

/// Ascending iterator over the level-0 chain
pub struct Iter<'a, K, V, S> {
    store: &'a S,
    next: Option<NodeId>,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<'a, K: 'a, V: 'a, S: NodeStore<K, V>> Iterator for Iter<'a, K, V, S> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        self.next = self.store.next(id, 0);
        Some((self.store.key(id), self.store.value(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::MemoryGauge;
    use crate::node::ArenaNodes;
    use skiplite_core::Error;
    use std::collections::VecDeque;

    /// Replays a fixed sequence of coin values; 1 continues, 0 stops.
    struct Scripted(VecDeque<u32>);

    impl Scripted {
        fn new(flips: &[u32]) -> Self {
            Self(flips.iter().copied().collect())
        }
    }

    impl RngCore for Scripted {
        fn next_u32(&mut self) -> u32 {
            self.0.pop_front().unwrap_or(0)
        }

        fn next_u64(&mut self) -> u64 {
            self.next_u32() as u64
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    fn assert_sorted<S: NodeStore<u32, String>, R: RngCore>(list: &SkipList<u32, String, S, R>) {
        let keys: Vec<u32> = list.iter().map(|(k, _)| *k).collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]), "unsorted: {:?}", keys);
        assert_eq!(keys.len(), list.len());
        assert!(list.cur_level() <= list.max_level());
    }

    #[test]
    fn test_empty_list() {
        let list: SkipList<u32, String> = SkipList::new(6);
        assert!(list.is_empty());
        assert_eq!(list.cur_level(), 0);
        assert_eq!(list.search(&1), None);
        assert_eq!(list.iter().count(), 0);
    }

    #[test]
    fn test_insert_search_delete() {
        let mut list = SkipList::new(6);
        assert_eq!(list.insert(1, "sing".to_string()).unwrap(), InsertOutcome::Inserted);
        assert_eq!(list.insert(2, "dance".to_string()).unwrap(), InsertOutcome::Inserted);
        assert_eq!(list.insert(3, "rap".to_string()).unwrap(), InsertOutcome::Inserted);
        assert_eq!(list.len(), 3);

        assert_eq!(list.search(&2).map(String::as_str), Some("dance"));
        assert!(list.delete(&2));
        assert!(!list.delete(&2));
        assert_eq!(list.search(&2), None);
        assert_eq!(list.len(), 2);
        assert_sorted(&list);
    }

    #[test]
    fn test_update_in_place() {
        let mut list = SkipList::new(6);
        list.insert(5, "cxk".to_string()).unwrap();
        assert_eq!(
            list.insert(5, "cxk is best".to_string()).unwrap(),
            InsertOutcome::Updated
        );
        assert_eq!(list.len(), 1);
        assert_eq!(list.search(&5).map(String::as_str), Some("cxk is best"));
    }

    #[test]
    fn test_borrowed_lookup() {
        let mut list: SkipList<String, u32> = SkipList::new(4);
        list.insert("b".to_string(), 2).unwrap();
        list.insert("a".to_string(), 1).unwrap();
        assert_eq!(list.search("a"), Some(&1));
        assert!(list.contains("b"));
        assert!(list.delete("a"));
        assert!(!list.contains("a"));
    }

    #[test]
    fn test_scripted_levels_give_exact_shape() {
        // Levels: 10 -> 2, 20 -> 0, 30 -> 1, 40 -> 3 (capped by max_level 3)
        let flips = [1, 1, 0, 0, 1, 0, 1, 1, 1];
        let mut list = SkipList::with_parts(3, HeapNodes::new(), Scripted::new(&flips));
        for key in [10u32, 20, 30, 40] {
            list.insert(key, key.to_string()).unwrap();
        }

        assert_eq!(list.level_of(&10), Some(2));
        assert_eq!(list.level_of(&20), Some(0));
        assert_eq!(list.level_of(&30), Some(1));
        assert_eq!(list.level_of(&40), Some(3));
        assert_eq!(list.cur_level(), 3);

        assert_eq!(list.level_keys(0), vec![&10, &20, &30, &40]);
        assert_eq!(list.level_keys(1), vec![&10, &30, &40]);
        assert_eq!(list.level_keys(2), vec![&10, &40]);
        assert_eq!(list.level_keys(3), vec![&40]);

        // Removing the only level-3 node shrinks cur_level
        assert!(list.delete(&40));
        assert_eq!(list.cur_level(), 2);
        assert_eq!(list.level_keys(2), vec![&10]);
        assert_eq!(list.level_keys(1), vec![&10, &30]);

        assert!(list.delete(&10));
        assert_eq!(list.cur_level(), 1);
        assert!(list.delete(&30));
        assert_eq!(list.cur_level(), 0);
        assert_eq!(list.level_keys(0), vec![&20]);
    }

    /// Heap store that refuses allocations once its budget is spent
    struct Budgeted {
        inner: HeapNodes<u32, String>,
        budget: usize,
    }

    impl NodeStore<u32, String> for Budgeted {
        fn allocate(&mut self, key: u32, value: String, level: usize) -> Result<NodeId> {
            if self.budget == 0 {
                return Err(Error::AllocationFailure { requested: level + 1 });
            }
            self.budget -= 1;
            self.inner.allocate(key, value, level)
        }

        fn release(&mut self, id: NodeId) {
            self.inner.release(id)
        }

        fn key(&self, id: NodeId) -> &u32 {
            self.inner.key(id)
        }

        fn value(&self, id: NodeId) -> &String {
            self.inner.value(id)
        }

        fn value_mut(&mut self, id: NodeId) -> &mut String {
            self.inner.value_mut(id)
        }

        fn level(&self, id: NodeId) -> usize {
            self.inner.level(id)
        }

        fn next(&self, id: NodeId, level: usize) -> Option<NodeId> {
            self.inner.next(id, level)
        }

        fn set_next(&mut self, id: NodeId, level: usize, next: Option<NodeId>) {
            self.inner.set_next(id, level, next)
        }

        fn gauge(&self) -> MemoryGauge {
            self.inner.gauge()
        }

        fn live(&self) -> usize {
            self.inner.live()
        }
    }

    #[test]
    fn test_failed_allocation_leaves_list_unchanged() {
        // 10 and 20 land on level 0; the third insert draws level 3 and fails
        let flips = [0, 0, 1, 1, 1, 0];
        let store = Budgeted {
            inner: HeapNodes::new(),
            budget: 2,
        };
        let mut list = SkipList::with_parts(4, store, Scripted::new(&flips));
        list.insert(10, "a".to_string()).unwrap();
        list.insert(20, "b".to_string()).unwrap();

        let result = list.insert(30, "c".to_string());
        assert!(matches!(result, Err(Error::AllocationFailure { .. })));
        assert_eq!(list.len(), 2);
        assert_eq!(list.cur_level(), 0);
        assert!(list.level_keys(1).is_empty());
        assert_eq!(list.search(&30), None);
        assert_sorted(&list);
    }

    #[test]
    fn test_seeded_generator_is_reproducible() {
        let build = || {
            let mut list = SkipList::new(8);
            for key in 0..200u32 {
                list.insert(key, key.to_string()).unwrap();
            }
            (0..200u32).map(|k| list.level_of(&k)).collect::<Vec<_>>()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_levels_never_exceed_max() {
        let always = vec![1u32; 1000];
        let mut list = SkipList::with_parts(4, HeapNodes::new(), Scripted::new(&always));
        for key in 0..50u32 {
            list.insert(key, String::new()).unwrap();
            assert!(list.cur_level() <= 4);
        }
        assert_eq!(list.cur_level(), 4);
    }

    #[test]
    fn test_mixed_workload_stays_sorted() {
        let mut list = SkipList::new(12);
        let mut rng = ParkMiller::new(7);
        for _ in 0..2000 {
            let key = rng.uniform(500);
            if rng.one_in(3) {
                list.delete(&key);
            } else {
                list.insert(key, key.to_string()).unwrap();
            }
        }
        assert_sorted(&list);
        for (k, v) in list.iter() {
            assert_eq!(&k.to_string(), v);
        }
    }

    #[test]
    fn test_arena_backed_list() {
        let mut list = SkipList::with_parts(8, ArenaNodes::new(), ParkMiller::new(11));
        for key in (0..300u32).rev() {
            list.insert(key, format!("v{}", key)).unwrap();
        }
        let used = list.store().gauge().get();
        for key in (0..300u32).step_by(2) {
            assert!(list.delete(&key));
        }
        assert_sorted(&list);
        assert_eq!(list.len(), 150);
        assert_eq!(list.search(&3).map(String::as_str), Some("v3"));
        assert_eq!(list.search(&4), None);
        // Deleted nodes keep their arena bytes
        assert_eq!(list.store().gauge().get(), used);
    }
}
