//! Allocation settings.
//!
//! Everything that changes how balls are counted or how the greedy loop
//! terminates lives in [`AllocConfig`]. It is passed explicitly to the
//! engine rather than stored globally, so two runs with different settings
//! can share a process.

use crate::error::{Error, Result};

/// Minimum number of balls before allocators are built in parallel.
/// Below this, building sequentially beats the rayon fan-out.
pub const PARALLEL_THRESHOLD: usize = 10_000;

/// Which overlap test the interval indices apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapMode {
    /// `l < high && low < h`. Ranges that only touch at an endpoint do not
    /// overlap, so a ball `[0, 10]` is not counted on the atomic range
    /// `[10, 15]`.
    ///
    /// A zero-width range `[p, p]` is a point stab instead: it overlaps
    /// every range with `low <= p <= high`.
    #[default]
    HalfOpen,
    /// `l <= high && low <= h`. Touching endpoints overlap.
    Closed,
}

impl OverlapMode {
    /// Parse mode from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "half-open" | "half_open" | "halfopen" => Some(Self::HalfOpen),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }

    /// Check whether `[a_low, a_high]` and `[b_low, b_high]` overlap.
    #[inline]
    pub fn overlaps(&self, a_low: f64, a_high: f64, b_low: f64, b_high: f64) -> bool {
        let closed = a_low <= b_high && b_low <= a_high;
        match self {
            Self::HalfOpen if a_low == a_high || b_low == b_high => closed,
            Self::HalfOpen => a_low < b_high && b_low < a_high,
            Self::Closed => closed,
        }
    }

    /// Check whether an interval ending at `high` can reach a query starting
    /// at `query_low`. Inclusive in both modes so point stabs are never
    /// pruned.
    #[inline]
    pub fn reaches(&self, high: f64, query_low: f64) -> bool {
        high >= query_low
    }

    /// Check whether an interval starting at `low` begins no later than a
    /// query ending at `query_high`. Inclusive in both modes, like
    /// [`OverlapMode::reaches`].
    #[inline]
    pub fn starts_before(&self, low: f64, query_high: f64) -> bool {
        low <= query_high
    }
}

/// Configuration for one allocation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocConfig {
    /// Overlap test used for counting and cascading.
    pub overlap: OverlapMode,
    /// Stop once the densest remaining atomic range has a zero count.
    pub skip_empty: bool,
    /// Recheck every allocator's bookkeeping after each extraction.
    pub verify: bool,
    /// Ball count at which allocator construction goes parallel.
    pub parallel_threshold: usize,
}

impl Default for AllocConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocConfig {
    pub fn new() -> Self {
        Self {
            overlap: OverlapMode::HalfOpen,
            skip_empty: false,
            verify: false,
            parallel_threshold: PARALLEL_THRESHOLD,
        }
    }

    /// Set the overlap mode.
    pub fn with_overlap(mut self, overlap: OverlapMode) -> Self {
        self.overlap = overlap;
        self
    }

    /// Stop at the first zero-count bucket.
    pub fn with_skip_empty(mut self, skip_empty: bool) -> Self {
        self.skip_empty = skip_empty;
        self
    }

    /// Verify bookkeeping after every extraction.
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Set the parallel construction threshold.
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Reject settings the engine cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.parallel_threshold == 0 {
            return Err(Error::InvalidArgument(
                "parallel threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
