//! Indexed max-priority queue with in-place reprioritization.
//!
//! A binary max-heap stored in a `Vec`, plus a map from key to heap slot.
//! The map is kept in step with every swap, so a key's priority can be
//! raised or lowered in O(log n) without leaving stale entries behind.
//!
//! Ties on priority go to the entry stamped earliest: every insert and every
//! update takes the next value of a sequence counter, and among equal
//! priorities the smaller stamp pops first.

use crate::error::{Error, Result};
use rustc_hash::FxHashMap;
use std::hash::Hash;

struct Slot<K, P> {
    key: K,
    priority: P,
    seq: u64,
}

impl<K, P: Ord> Slot<K, P> {
    /// True if `self` should sit above `other` in the heap.
    #[inline]
    fn outranks(&self, other: &Self) -> bool {
        self.priority > other.priority || (self.priority == other.priority && self.seq < other.seq)
    }
}

/// Max-priority queue over unique keys.
pub struct IndexedMaxQueue<K, P> {
    heap: Vec<Slot<K, P>>,
    positions: FxHashMap<K, usize>,
    next_seq: u64,
}

impl<K, P> IndexedMaxQueue<K, P>
where
    K: Hash + Eq + Clone,
    P: Ord + Copy,
{
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            positions: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            next_seq: 0,
        }
    }

    /// Number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.positions.contains_key(key)
    }

    /// Current priority of `key`, if present.
    pub fn priority(&self, key: &K) -> Option<P> {
        self.positions.get(key).map(|&pos| self.heap[pos].priority)
    }

    /// Insert `key`, or replace its priority if it is already queued.
    pub fn insert_or_update(&mut self, key: K, priority: P) {
        if let Some(&pos) = self.positions.get(&key) {
            self.set_priority(pos, priority);
            return;
        }
        let seq = self.bump();
        let pos = self.heap.len();
        self.positions.insert(key.clone(), pos);
        self.heap.push(Slot { key, priority, seq });
        self.sift_up(pos);
    }

    /// Change the priority of a queued key.
    pub fn reprioritize(&mut self, key: &K, priority: P) -> Result<()> {
        let pos = *self.positions.get(key).ok_or(Error::KeyNotFound)?;
        self.set_priority(pos, priority);
        Ok(())
    }

    /// The highest-priority entry, without removing it.
    pub fn peek_max(&self) -> Result<(P, &K)> {
        self.heap
            .first()
            .map(|slot| (slot.priority, &slot.key))
            .ok_or(Error::EmptyQueue)
    }

    /// Remove and return the highest-priority entry.
    pub fn extract_max(&mut self) -> Result<(P, K)> {
        self.take(0)
            .map(|slot| (slot.priority, slot.key))
            .ok_or(Error::EmptyQueue)
    }

    /// Iterate over queued entries in heap order (not sorted).
    pub fn iter(&self) -> impl Iterator<Item = (P, &K)> {
        self.heap.iter().map(|slot| (slot.priority, &slot.key))
    }

    fn bump(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn set_priority(&mut self, pos: usize, priority: P) {
        let seq = self.bump();
        let slot = &mut self.heap[pos];
        slot.priority = priority;
        slot.seq = seq;
        let pos = self.sift_up(pos);
        self.sift_down(pos);
    }

    /// Detach the slot at `pos` and restore the heap around the hole.
    fn take(&mut self, pos: usize) -> Option<Slot<K, P>> {
        let last = self.heap.len().checked_sub(1)?;
        self.swap(pos, last);
        let slot = self.heap.pop()?;
        self.positions.remove(&slot.key);
        if pos < self.heap.len() {
            let pos = self.sift_up(pos);
            self.sift_down(pos);
        }
        Some(slot)
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.heap.swap(a, b);
        for pos in [a, b] {
            if let Some(entry) = self.positions.get_mut(&self.heap[pos].key) {
                *entry = pos;
            }
        }
    }

    fn sift_up(&mut self, mut pos: usize) -> usize {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if !self.heap[pos].outranks(&self.heap[parent]) {
                break;
            }
            self.swap(pos, parent);
            pos = parent;
        }
        pos
    }

    fn sift_down(&mut self, mut pos: usize) -> usize {
        let len = self.heap.len();
        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut best = pos;
            if left < len && self.heap[left].outranks(&self.heap[best]) {
                best = left;
            }
            if right < len && self.heap[right].outranks(&self.heap[best]) {
                best = right;
            }
            if best == pos {
                return pos;
            }
            self.swap(pos, best);
            pos = best;
        }
    }
}

impl<K, P> Default for IndexedMaxQueue<K, P>
where
    K: Hash + Eq + Clone,
    P: Ord + Copy,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    /// Check the heap property and the position map.
    fn assert_consistent<K: Hash + Eq + Clone, P: Ord + Copy>(queue: &IndexedMaxQueue<K, P>) {
        assert_eq!(queue.heap.len(), queue.positions.len());
        for (pos, slot) in queue.heap.iter().enumerate() {
            assert_eq!(queue.positions[&slot.key], pos);
            if pos > 0 {
                assert!(!slot.outranks(&queue.heap[(pos - 1) / 2]));
            }
        }
    }

    #[test]
    fn test_push_pop_ordered() {
        let mut queue = IndexedMaxQueue::new();
        queue.insert_or_update("low", 10);
        queue.insert_or_update("lower", 5);
        queue.insert_or_update("high", 15);

        assert_eq!(queue.extract_max().unwrap(), (15, "high"));
        assert_eq!(queue.extract_max().unwrap(), (10, "low"));
        assert_eq!(queue.extract_max().unwrap(), (5, "lower"));
        assert!(matches!(queue.extract_max(), Err(Error::EmptyQueue)));
    }

    #[test]
    fn test_equal_priorities_pop_oldest_first() {
        let mut queue = IndexedMaxQueue::new();
        queue.insert_or_update("first", 10);
        queue.insert_or_update("second", 10);
        queue.insert_or_update("third", 10);

        assert_eq!(queue.extract_max().unwrap().1, "first");
        assert_eq!(queue.extract_max().unwrap().1, "second");
        assert_eq!(queue.extract_max().unwrap().1, "third");
    }

    #[test]
    fn test_update_restamps_entry() {
        let mut queue = IndexedMaxQueue::new();
        queue.insert_or_update("a", 3);
        queue.insert_or_update("b", 3);
        // Re-setting the same priority makes "a" the newer of the two
        queue.reprioritize(&"a", 3).unwrap();

        assert_eq!(queue.peek_max().unwrap(), (3, &"b"));
    }

    #[test]
    fn test_peek_does_not_remove() {
        let mut queue = IndexedMaxQueue::new();
        queue.insert_or_update(1u32, 7u32);
        assert_eq!(queue.peek_max().unwrap(), (7, &1));
        assert_eq!(queue.peek_max().unwrap(), (7, &1));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_empty_queue() {
        let mut queue: IndexedMaxQueue<u32, u32> = IndexedMaxQueue::new();
        assert!(matches!(queue.peek_max(), Err(Error::EmptyQueue)));
        assert!(matches!(queue.extract_max(), Err(Error::EmptyQueue)));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_decrease_key_below_others() {
        let mut queue = IndexedMaxQueue::new();
        queue.insert_or_update("a", 9);
        queue.insert_or_update("b", 5);
        queue.insert_or_update("c", 7);

        queue.reprioritize(&"a", 1).unwrap();
        assert_eq!(queue.peek_max().unwrap(), (7, &"c"));
        assert_eq!(queue.priority(&"a"), Some(1));
        assert_consistent(&queue);
    }

    #[test]
    fn test_increase_key() {
        let mut queue = IndexedMaxQueue::new();
        queue.insert_or_update("a", 1);
        queue.insert_or_update("b", 5);
        queue.insert_or_update("a", 8);

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.peek_max().unwrap(), (8, &"a"));
    }

    #[test]
    fn test_missing_key() {
        let mut queue = IndexedMaxQueue::new();
        queue.insert_or_update("a", 1);
        assert!(matches!(queue.reprioritize(&"b", 2), Err(Error::KeyNotFound)));

        queue.extract_max().unwrap();
        // Extracted keys do not come back
        assert!(matches!(queue.reprioritize(&"a", 2), Err(Error::KeyNotFound)));
        assert!(!queue.contains(&"a"));
    }

    #[test]
    fn test_iter_after_extract() {
        let mut queue = IndexedMaxQueue::new();
        for (key, priority) in [("a", 4), ("b", 9), ("c", 1), ("d", 6), ("e", 3)] {
            queue.insert_or_update(key, priority);
        }
        queue.extract_max().unwrap();
        assert_consistent(&queue);

        let mut seen: Vec<(u32, &str)> = queue.iter().map(|(p, k)| (p, *k)).collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![(1, "c"), (3, "e"), (4, "a"), (6, "d")]);
    }

    #[test]
    fn test_random_operations_keep_heap_valid() {
        let mut rng = SmallRng::seed_from_u64(42);
        let mut queue = IndexedMaxQueue::new();
        let mut reference: FxHashMap<u32, u32> = FxHashMap::default();

        for _ in 0..2_000 {
            let key = rng.gen_range(0..64u32);
            match rng.gen_range(0..4) {
                0 | 1 => {
                    let priority = rng.gen_range(0..20u32);
                    queue.insert_or_update(key, priority);
                    reference.insert(key, priority);
                }
                2 => {
                    let result = queue.reprioritize(&key, rng.gen_range(0..20u32));
                    assert_eq!(result.is_ok(), reference.contains_key(&key));
                    if let Some(p) = queue.priority(&key) {
                        reference.insert(key, p);
                    }
                }
                _ => {
                    if let Ok((priority, key)) = queue.extract_max() {
                        let best = reference.values().copied().max().unwrap();
                        assert_eq!(priority, best);
                        assert_eq!(reference.remove(&key), Some(priority));
                    } else {
                        assert!(reference.is_empty());
                    }
                }
            }
            assert_eq!(queue.len(), reference.len());
        }
        assert_consistent(&queue);
    }
}
