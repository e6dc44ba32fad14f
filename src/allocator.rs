//! Per-color greedy allocator.
//!
//! A [`ColorAllocator`] cuts one color's balls into atomic ranges, counts
//! how many balls cover each, and hands out the densest range on request.
//! Handing out a range consumes every ball covering it; each consumed
//! ball then lowers the count of every other atomic range it covered.
//!
//! Four structures move together:
//! - `balls`: live ball ranges, payload = ball id
//! - `atoms`: atomic ranges not yet handed out
//! - `counts`: atomic range -> live balls covering it
//! - `queue`: the same counts, ordered for max extraction
//!
//! An atomic range is in `atoms`, `counts` and `queue` or in none of them.
//! Every ball overlaps at least one atomic range, so an exhausted allocator
//! has no live balls left.

use crate::ball::{Ball, BallId};
use crate::bucket::Bucket;
use crate::config::OverlapMode;
use crate::error::{Error, Result};
use crate::index::IntervalIndex;
use crate::pqueue::IndexedMaxQueue;
use crate::range::{atomic_ranges, AtomicRange, Span};
use rustc_hash::FxHashMap;

/// Greedy bucket allocator for the balls of one color.
pub struct ColorAllocator {
    color: String,
    balls: IntervalIndex<BallId>,
    atoms: IntervalIndex<()>,
    counts: FxHashMap<AtomicRange, usize>,
    queue: IndexedMaxQueue<AtomicRange, usize>,
}

impl ColorAllocator {
    /// Build an allocator from one color's balls.
    ///
    /// Every ball must carry `color` and satisfy `low <= high`.
    pub fn new(color: impl Into<String>, balls: &[Ball], mode: OverlapMode) -> Result<Self> {
        let color = color.into();
        for ball in balls {
            ball.validate()?;
            if ball.color != color {
                return Err(Error::InvalidArgument(format!(
                    "ball {} has color '{}', expected '{}'",
                    ball.id, ball.color, color
                )));
            }
        }

        let endpoints: Vec<f64> = balls.iter().flat_map(|b| [b.low, b.high]).collect();
        let ranges = atomic_ranges(endpoints);

        let balls = IntervalIndex::from_entries(
            balls.iter().map(|b| (b.span(), b.id)).collect(),
            mode,
        );
        let atoms = IntervalIndex::from_entries(ranges.iter().map(|r| (*r, ())).collect(), mode);

        let mut counts = FxHashMap::with_capacity_and_hasher(ranges.len(), Default::default());
        let mut queue = IndexedMaxQueue::with_capacity(ranges.len());
        for range in ranges {
            let count = balls.count_overlapping(range);
            counts.insert(range, count);
            queue.insert_or_update(range, count);
        }

        log::debug!(
            "built allocator for '{}': {} balls, {} atomic ranges",
            color,
            balls.len(),
            queue.len()
        );

        Ok(Self {
            color,
            balls,
            atoms,
            counts,
            queue,
        })
    }

    /// The color this allocator serves.
    pub fn color(&self) -> &str {
        &self.color
    }

    /// True once every atomic range has been handed out.
    pub fn is_exhausted(&self) -> bool {
        self.queue.is_empty()
    }

    /// Atomic ranges not yet handed out.
    pub fn remaining_ranges(&self) -> usize {
        self.queue.len()
    }

    /// Balls not yet consumed.
    pub fn live_balls(&self) -> usize {
        self.balls.len()
    }

    /// Current count of an atomic range still in play.
    pub fn overlap_count(&self, range: &AtomicRange) -> Option<usize> {
        self.counts.get(range).copied()
    }

    /// The densest remaining atomic range and its count.
    pub fn peek(&self) -> Result<(usize, AtomicRange)> {
        self.queue.peek_max().map(|(count, range)| (count, *range))
    }

    /// Hand out the densest atomic range, consuming every ball covering it.
    pub fn extract_bucket(&mut self) -> Result<Bucket> {
        let (count, range) = self.queue.extract_max()?;
        self.counts.remove(&range);
        self.atoms.remove_exact(range);

        let spent = self.balls.drain_overlapping(range);
        if spent.len() != count {
            return Err(Error::InvariantViolation(format!(
                "color '{}': range {} has count {} but {} live balls overlap it",
                self.color,
                range,
                count,
                spent.len()
            )));
        }

        for (ball_span, _) in &spent {
            self.release(*ball_span)?;
        }

        let mut ball_ids: Vec<BallId> = spent.into_iter().map(|(_, id)| id).collect();
        ball_ids.sort_unstable();

        log::debug!(
            "color '{}': bucket {} count {} ({} ranges left)",
            self.color,
            range,
            count,
            self.queue.len()
        );

        Ok(Bucket::new(self.color.clone(), count, range, ball_ids))
    }

    /// Take one consumed ball's contribution off every atomic range it
    /// still covers.
    fn release(&mut self, ball_span: Span) -> Result<()> {
        let mut touched: Vec<AtomicRange> = Vec::new();
        self.atoms
            .for_each_overlap(ball_span, |range, _| touched.push(range));

        for range in touched {
            let count = self.counts.get_mut(&range).ok_or(Error::KeyNotFound)?;
            *count = count.checked_sub(1).ok_or_else(|| {
                Error::InvariantViolation(format!(
                    "color '{}': count of {} would go negative",
                    self.color, range
                ))
            })?;
            self.queue.reprioritize(&range, *count)?;
        }
        Ok(())
    }

    /// Recount every remaining atomic range from scratch and check that the
    /// index, the count map and the queue all agree.
    pub fn verify(&self) -> Result<()> {
        let violation = |msg: String| {
            Err(Error::InvariantViolation(format!(
                "color '{}': {}",
                self.color, msg
            )))
        };

        if self.counts.len() != self.queue.len() || self.atoms.len() != self.queue.len() {
            return violation(format!(
                "{} counts, {} atomic ranges, {} queued",
                self.counts.len(),
                self.atoms.len(),
                self.queue.len()
            ));
        }

        if self.queue.is_empty() && !self.balls.is_empty() {
            return violation(format!(
                "exhausted with {} live balls",
                self.balls.len()
            ));
        }

        for (count, range) in self.queue.iter() {
            if self.counts.get(range) != Some(&count) {
                return violation(format!(
                    "{} queued at {} but counted {:?}",
                    range,
                    count,
                    self.counts.get(range)
                ));
            }
        }

        for (range, _) in self.atoms.iter() {
            let Some(&count) = self.counts.get(&range) else {
                return violation(format!("{} indexed but not counted", range));
            };
            if self.queue.priority(&range) != Some(count) {
                return violation(format!(
                    "{} counted {} but queued at {:?}",
                    range,
                    count,
                    self.queue.priority(&range)
                ));
            }
            let actual = self.balls.count_overlapping(range);
            if actual != count {
                return violation(format!(
                    "{} counted {} but {} live balls overlap it",
                    range, count, actual
                ));
            }
        }
        Ok(())
    }
}
