//! Cross-color greedy selection loop.
//!
//! Each step peeks the densest atomic range of every color that still has
//! ranges left, extracts a bucket from the winner, and repeats. The winner
//! is the color with the strictly largest count; on a tie the color that
//! appeared first in the input wins.

use crate::allocator::ColorAllocator;
use crate::ball::Ball;
use crate::bucket::Bucket;
use crate::config::AllocConfig;
use crate::error::{Error, Result};
use crate::parallel::{build_allocators, group_by_color};
use std::fmt;
use std::time::Instant;

/// Statistics from one allocation run.
#[derive(Debug, Default, Clone)]
pub struct RunStats {
    pub balls: usize,
    pub colors: usize,
    pub atomic_ranges: usize,
    pub buckets: usize,
    pub assigned_balls: usize,
    pub elapsed_secs: f64,
}

impl fmt::Display for RunStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Balls: {}, Colors: {}, Atomic ranges: {}, Buckets: {}, Assigned: {} ({:.3}s)",
            self.balls,
            self.colors,
            self.atomic_ranges,
            self.buckets,
            self.assigned_balls,
            self.elapsed_secs
        )
    }
}

/// Drives the greedy loop over one allocator per color.
pub struct Orchestrator {
    allocators: Vec<ColorAllocator>,
    config: AllocConfig,
    stats: RunStats,
}

impl Orchestrator {
    /// Group `balls` by color and build one allocator per color.
    pub fn new(balls: Vec<Ball>, config: AllocConfig) -> Result<Self> {
        config.validate()?;
        let ball_count = balls.len();
        let groups = group_by_color(balls);
        let allocators = build_allocators(groups, config.overlap, config.parallel_threshold)?;

        let mut orchestrator = Self::from_allocators(allocators, config);
        orchestrator.stats.balls = ball_count;
        Ok(orchestrator)
    }

    /// Wrap prebuilt allocators. Their order is the tie-break order.
    pub fn from_allocators(allocators: Vec<ColorAllocator>, config: AllocConfig) -> Self {
        let stats = RunStats {
            balls: allocators.iter().map(|a| a.live_balls()).sum(),
            colors: allocators.len(),
            atomic_ranges: allocators.iter().map(|a| a.remaining_ranges()).sum(),
            ..Default::default()
        };
        Self {
            allocators,
            config,
            stats,
        }
    }

    /// The allocators, in tie-break order.
    pub fn allocators(&self) -> &[ColorAllocator] {
        &self.allocators
    }

    /// True when no color has atomic ranges left.
    pub fn is_exhausted(&self) -> bool {
        self.allocators.iter().all(|a| a.is_exhausted())
    }

    /// Statistics accumulated so far.
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    /// Pick the color to extract from next, with its peeked count.
    fn select(&self) -> Result<Option<(usize, usize)>> {
        let mut best: Option<(usize, usize)> = None;
        for (idx, allocator) in self.allocators.iter().enumerate() {
            if allocator.is_exhausted() {
                continue;
            }
            let (count, _) = allocator.peek()?;
            if best.is_none_or(|(_, best_count)| count > best_count) {
                best = Some((idx, count));
            }
        }
        Ok(best)
    }

    /// Produce up to `num_buckets` buckets in extraction order.
    ///
    /// Returns fewer when every color runs out of atomic ranges, or, with
    /// `skip_empty`, when the densest remaining range is empty.
    pub fn run(&mut self, num_buckets: usize) -> Result<Vec<Bucket>> {
        let start = Instant::now();
        let mut buckets = Vec::with_capacity(num_buckets.min(self.stats.atomic_ranges));

        while buckets.len() < num_buckets {
            let Some((idx, count)) = self.select()? else {
                break;
            };
            if count == 0 && self.config.skip_empty {
                log::debug!("densest remaining range is empty, stopping");
                break;
            }

            let allocator = &mut self.allocators[idx];
            let bucket = allocator.extract_bucket()?;
            if self.config.verify {
                allocator.verify()?;
            }

            self.stats.buckets += 1;
            self.stats.assigned_balls += bucket.ball_ids.len();
            buckets.push(bucket);
        }

        self.stats.elapsed_secs += start.elapsed().as_secs_f64();
        Ok(buckets)
    }
}

/// Allocate up to `num_buckets` buckets over `balls`.
///
/// Fails with `InvalidArgument` if `num_buckets` is negative or any ball
/// has `low > high`.
pub fn allocate(balls: Vec<Ball>, num_buckets: i64, config: AllocConfig) -> Result<Vec<Bucket>> {
    let num_buckets = usize::try_from(num_buckets).map_err(|_| {
        Error::InvalidArgument(format!(
            "bucket count must be non-negative, got {}",
            num_buckets
        ))
    })?;
    Orchestrator::new(balls, config)?.run(num_buckets)
}
