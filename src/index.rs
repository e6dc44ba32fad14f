//! Interval indexing for fast overlap queries.
//!
//! The index is a balanced binary tree stored in a `Vec`, ordered by
//! `(low, high)` and augmented with the largest live `high` in each subtree.
//! Removal marks nodes dead and refreshes the augmentation on the way back
//! up, so subtrees with nothing left in them are skipped by later queries.
//! Intervals inserted after the tree is built sit in a pending list until
//! there are enough of them to justify a rebuild.

use crate::config::OverlapMode;
use crate::range::Span;

/// Pending inserts tolerated before the tree is rebuilt.
const PENDING_MIN: usize = 64;

/// Dead nodes tolerated before the tree is compacted.
const COMPACT_MIN: usize = 64;

struct Node<T> {
    span: Span,
    payload: T,
    alive: bool,
    /// Largest `high` among live entries of this subtree, or `-inf`.
    max_high: f64,
    left: Option<usize>,
    right: Option<usize>,
}

/// A mutable collection of intervals with payloads.
pub struct IntervalIndex<T> {
    nodes: Vec<Node<T>>,
    root: Option<usize>,
    pending: Vec<(Span, T)>,
    live: usize,
    mode: OverlapMode,
}

impl<T> IntervalIndex<T> {
    /// Create a new empty index using half-open overlap.
    pub fn new() -> Self {
        Self::with_mode(OverlapMode::default())
    }

    /// Create a new empty index with the given overlap test.
    pub fn with_mode(mode: OverlapMode) -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
            pending: Vec::new(),
            live: 0,
            mode,
        }
    }

    /// Build an index from a collection of intervals.
    pub fn from_entries(entries: Vec<(Span, T)>, mode: OverlapMode) -> Self {
        let mut index = Self::with_mode(mode);
        index.build(entries);
        index
    }

    /// The overlap test this index applies.
    pub fn mode(&self) -> OverlapMode {
        self.mode
    }

    /// Add an interval.
    pub fn insert(&mut self, span: Span, payload: T) {
        self.pending.push((span, payload));
        if self.pending.len() >= PENDING_MIN.max(self.live / 4) {
            self.rebuild();
        }
    }

    /// Find all intervals overlapping `query`.
    pub fn overlapping(&self, query: Span) -> Vec<(Span, &T)> {
        let mut results = Vec::new();
        self.for_each_overlap(query, |span, payload| results.push((span, payload)));
        results
    }

    /// Count intervals overlapping `query`.
    pub fn count_overlapping(&self, query: Span) -> usize {
        let mut count = 0;
        self.for_each_overlap(query, |_, _| count += 1);
        count
    }

    /// Call `f` for every interval overlapping `query`.
    pub fn for_each_overlap<'a, F>(&'a self, query: Span, mut f: F)
    where
        F: FnMut(Span, &'a T),
    {
        if let Some(root) = self.root {
            self.visit(root, &query, &mut f);
        }
        for (span, payload) in &self.pending {
            if span.overlaps(&query, self.mode) {
                f(*span, payload);
            }
        }
    }

    fn visit<'a, F>(&'a self, idx: usize, query: &Span, f: &mut F)
    where
        F: FnMut(Span, &'a T),
    {
        let node = &self.nodes[idx];
        if !self.mode.reaches(node.max_high, query.low) {
            return;
        }
        if let Some(left) = node.left {
            self.visit(left, query, f);
        }
        if node.alive && node.span.overlaps(query, self.mode) {
            f(node.span, &node.payload);
        }
        // Everything to the right starts at or after this node
        if self.mode.starts_before(node.span.low, query.high) {
            if let Some(right) = node.right {
                self.visit(right, query, f);
            }
        }
    }

    /// Remove every interval whose bounds equal `span`, returning how many
    /// were removed. Neighbours that merely overlap are left alone.
    pub fn remove_exact(&mut self, span: Span) -> usize {
        let before = self.len();
        if let Some(root) = self.root {
            self.remove_exact_at(root, &span);
        }
        self.pending.retain(|(s, _)| *s != span);
        let removed = before - self.len();
        self.maybe_compact();
        removed
    }

    fn remove_exact_at(&mut self, idx: usize, span: &Span) {
        let (left, right, here) = {
            let node = &self.nodes[idx];
            (node.left, node.right, node.span.cmp(span))
        };
        // Equal keys may sit on either side of a node with the same key
        if here.is_ge() {
            if let Some(left) = left {
                self.remove_exact_at(left, span);
            }
        }
        if here.is_le() {
            if let Some(right) = right {
                self.remove_exact_at(right, span);
            }
        }
        if here.is_eq() && self.nodes[idx].alive {
            self.nodes[idx].alive = false;
            self.live -= 1;
        }
        self.refresh(idx);
    }

    fn refresh(&mut self, idx: usize) {
        let node = &self.nodes[idx];
        let mut max_high = if node.alive {
            node.span.high
        } else {
            f64::NEG_INFINITY
        };
        for child in [node.left, node.right].into_iter().flatten() {
            max_high = max_high.max(self.nodes[child].max_high);
        }
        self.nodes[idx].max_high = max_high;
    }

    /// Get the total number of live intervals.
    pub fn len(&self) -> usize {
        self.live + self.pending.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over all live intervals in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (Span, &T)> {
        self.nodes
            .iter()
            .filter(|n| n.alive)
            .map(|n| (n.span, &n.payload))
            .chain(self.pending.iter().map(|(s, p)| (*s, p)))
    }

    fn build(&mut self, mut entries: Vec<(Span, T)>) {
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        self.live = entries.len();
        self.nodes = entries
            .into_iter()
            .map(|(span, payload)| Node {
                span,
                payload,
                alive: true,
                max_high: span.high,
                left: None,
                right: None,
            })
            .collect();
        let len = self.nodes.len();
        self.root = link(&mut self.nodes, 0, len);
    }

    /// Fold pending inserts into the tree and drop dead nodes.
    fn rebuild(&mut self) {
        let mut entries: Vec<(Span, T)> = std::mem::take(&mut self.nodes)
            .into_iter()
            .filter(|n| n.alive)
            .map(|n| (n.span, n.payload))
            .collect();
        entries.append(&mut self.pending);
        self.build(entries);
    }

    fn maybe_compact(&mut self) {
        let dead = self.nodes.len() - self.live;
        if dead > COMPACT_MIN && dead > self.live {
            self.rebuild();
        }
    }
}

impl<T: Clone> IntervalIndex<T> {
    /// Remove every interval overlapping `query` and return them.
    pub fn drain_overlapping(&mut self, query: Span) -> Vec<(Span, T)> {
        let mut removed = Vec::new();
        if let Some(root) = self.root {
            self.drain_at(root, &query, &mut removed);
        }
        let mode = self.mode;
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].0.overlaps(&query, mode) {
                removed.push(self.pending.swap_remove(i));
            } else {
                i += 1;
            }
        }
        self.maybe_compact();
        removed
    }

    /// Remove every interval overlapping `query`.
    pub fn remove_overlapping(&mut self, query: Span) {
        self.drain_overlapping(query);
    }

    fn drain_at(&mut self, idx: usize, query: &Span, removed: &mut Vec<(Span, T)>) {
        let (left, right, reaches, starts_before) = {
            let node = &self.nodes[idx];
            (
                node.left,
                node.right,
                self.mode.reaches(node.max_high, query.low),
                self.mode.starts_before(node.span.low, query.high),
            )
        };
        if !reaches {
            return;
        }
        if let Some(left) = left {
            self.drain_at(left, query, removed);
        }
        let hit = {
            let node = &self.nodes[idx];
            node.alive && node.span.overlaps(query, self.mode)
        };
        if hit {
            let node = &mut self.nodes[idx];
            node.alive = false;
            removed.push((node.span, node.payload.clone()));
            self.live -= 1;
        }
        if starts_before {
            if let Some(right) = right {
                self.drain_at(right, query, removed);
            }
        }
        self.refresh(idx);
    }
}

impl<T> Default for IntervalIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Link `nodes[lo..hi]` (sorted) into a balanced subtree, returning its root.
fn link<T>(nodes: &mut [Node<T>], lo: usize, hi: usize) -> Option<usize> {
    if lo >= hi {
        return None;
    }
    let mid = lo + (hi - lo) / 2;
    let left = link(nodes, lo, mid);
    let right = link(nodes, mid + 1, hi);

    let mut max_high = nodes[mid].span.high;
    for child in [left, right].into_iter().flatten() {
        max_high = max_high.max(nodes[child].max_high);
    }
    let node = &mut nodes[mid];
    node.left = left;
    node.right = right;
    node.max_high = max_high;
    Some(mid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn sample_entries() -> Vec<(Span, u32)> {
        vec![
            (Span::new(100.0, 200.0), 0),
            (Span::new(150.0, 250.0), 1),
            (Span::new(300.0, 400.0), 2),
            (Span::new(200.0, 300.0), 3),
        ]
    }

    fn ids(mut hits: Vec<(Span, &u32)>) -> Vec<u32> {
        let mut ids: Vec<u32> = hits.drain(..).map(|(_, id)| *id).collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn test_build_index() {
        let index = IntervalIndex::from_entries(sample_entries(), OverlapMode::HalfOpen);
        assert_eq!(index.len(), 4);
        assert!(!index.is_empty());
    }

    #[test]
    fn test_find_overlaps_half_open() {
        let index = IntervalIndex::from_entries(sample_entries(), OverlapMode::HalfOpen);

        assert_eq!(ids(index.overlapping(Span::new(175.0, 225.0))), vec![0, 1, 3]);
        // [200, 300) touches [100, 200) only at 200
        assert_eq!(ids(index.overlapping(Span::new(200.0, 210.0))), vec![1, 3]);
        assert_eq!(index.count_overlapping(Span::new(500.0, 600.0)), 0);
    }

    #[test]
    fn test_find_overlaps_closed() {
        let index = IntervalIndex::from_entries(sample_entries(), OverlapMode::Closed);

        assert_eq!(ids(index.overlapping(Span::new(200.0, 210.0))), vec![0, 1, 3]);
        assert_eq!(ids(index.overlapping(Span::new(400.0, 400.0))), vec![2]);
    }

    #[test]
    fn test_point_stab_half_open() {
        let mut index = IntervalIndex::from_entries(sample_entries(), OverlapMode::HalfOpen);

        // A point on a shared endpoint hits both neighbours
        assert_eq!(ids(index.overlapping(Span::new(200.0, 200.0))), vec![0, 1, 3]);
        assert_eq!(ids(index.overlapping(Span::new(400.0, 400.0))), vec![2]);

        index.insert(Span::new(250.0, 250.0), 9);
        assert_eq!(ids(index.overlapping(Span::new(240.0, 260.0))), vec![1, 3, 9]);
        assert_eq!(ids(index.overlapping(Span::new(250.0, 300.0))), vec![3, 9]);
        assert_eq!(ids(index.overlapping(Span::new(260.0, 300.0))), vec![3]);
    }

    #[test]
    fn test_empty_index() {
        let index: IntervalIndex<u32> = IntervalIndex::new();
        assert!(index.overlapping(Span::new(0.0, 10.0)).is_empty());
        assert!(index.is_empty());
    }

    #[test]
    fn test_drain_overlapping() {
        let mut index = IntervalIndex::from_entries(sample_entries(), OverlapMode::HalfOpen);

        let mut removed: Vec<u32> = index
            .drain_overlapping(Span::new(160.0, 170.0))
            .into_iter()
            .map(|(_, id)| id)
            .collect();
        removed.sort_unstable();

        assert_eq!(removed, vec![0, 1]);
        assert_eq!(index.len(), 2);
        assert!(index.overlapping(Span::new(100.0, 199.0)).is_empty());
        assert_eq!(ids(index.overlapping(Span::new(0.0, 1000.0))), vec![2, 3]);
    }

    #[test]
    fn test_remove_overlapping_is_idempotent() {
        let mut index = IntervalIndex::from_entries(sample_entries(), OverlapMode::HalfOpen);
        index.remove_overlapping(Span::new(0.0, 1000.0));
        index.remove_overlapping(Span::new(0.0, 1000.0));
        assert!(index.is_empty());
    }

    #[test]
    fn test_remove_exact_keeps_touching_neighbours() {
        let entries = vec![
            (Span::new(0.0, 5.0), ()),
            (Span::new(5.0, 10.0), ()),
            (Span::new(10.0, 15.0), ()),
        ];
        let mut index = IntervalIndex::from_entries(entries, OverlapMode::Closed);

        assert_eq!(index.remove_exact(Span::new(5.0, 10.0)), 1);
        assert_eq!(index.len(), 2);

        let mut left: Vec<Span> = index
            .overlapping(Span::new(0.0, 15.0))
            .into_iter()
            .map(|(s, _)| s)
            .collect();
        left.sort();
        assert_eq!(left, vec![Span::new(0.0, 5.0), Span::new(10.0, 15.0)]);

        assert_eq!(index.remove_exact(Span::new(5.0, 10.0)), 0);
    }

    #[test]
    fn test_insert_after_build() {
        let mut index = IntervalIndex::from_entries(sample_entries(), OverlapMode::HalfOpen);
        index.insert(Span::new(180.0, 190.0), 9);

        assert_eq!(index.len(), 5);
        assert_eq!(ids(index.overlapping(Span::new(185.0, 186.0))), vec![0, 1, 9]);

        let removed = index.drain_overlapping(Span::new(185.0, 186.0));
        assert_eq!(removed.len(), 3);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_many_inserts_trigger_rebuild() {
        let mut index = IntervalIndex::new();
        for i in 0..1_000u32 {
            let low = i as f64;
            index.insert(Span::new(low, low + 2.0), i);
        }

        assert_eq!(index.len(), 1_000);
        assert!(index.pending.len() < index.live);
        assert_eq!(ids(index.overlapping(Span::new(500.5, 500.6))), vec![499, 500]);
    }

    #[test]
    fn test_duplicate_spans() {
        let entries = vec![
            (Span::new(1.0, 2.0), 0u32),
            (Span::new(1.0, 2.0), 1),
            (Span::new(1.0, 2.0), 2),
        ];
        let mut index = IntervalIndex::from_entries(entries, OverlapMode::HalfOpen);
        assert_eq!(index.count_overlapping(Span::new(1.5, 1.6)), 3);
        assert_eq!(index.remove_exact(Span::new(1.0, 2.0)), 3);
        assert!(index.is_empty());
    }

    #[test]
    fn test_matches_linear_scan() {
        let mut rng = SmallRng::seed_from_u64(7);
        for mode in [OverlapMode::HalfOpen, OverlapMode::Closed] {
            let mut reference: Vec<(Span, u32)> = (0..400u32)
                .map(|i| {
                    let low = rng.gen_range(0.0..100.0);
                    let width = rng.gen_range(0.0..10.0);
                    (Span::new(low, low + width), i)
                })
                .collect();
            let mut index = IntervalIndex::from_entries(reference.clone(), mode);

            for round in 0..200u32 {
                let low = rng.gen_range(0.0..100.0);
                let query = Span::new(low, low + rng.gen_range(0.0..5.0));

                let mut expected: Vec<u32> = reference
                    .iter()
                    .filter(|(s, _)| s.overlaps(&query, mode))
                    .map(|(_, id)| *id)
                    .collect();
                expected.sort_unstable();
                assert_eq!(ids(index.overlapping(query)), expected);

                if round % 3 == 0 {
                    let mut drained: Vec<u32> = index
                        .drain_overlapping(query)
                        .into_iter()
                        .map(|(_, id)| id)
                        .collect();
                    drained.sort_unstable();
                    assert_eq!(drained, expected);
                    reference.retain(|(s, _)| !s.overlaps(&query, mode));
                } else if round % 3 == 1 {
                    let id = 1_000 + round;
                    index.insert(query, id);
                    reference.push((query, id));
                }
                assert_eq!(index.len(), reference.len());
            }
        }
    }
}
