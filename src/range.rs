//! Numeric range type used for ball ranges and atomic ranges.

use crate::config::OverlapMode;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A range `[low, high]` on the real line.
///
/// Equality, hashing and ordering are structural over the bit patterns of
/// the endpoints (with `-0.0` folded into `0.0`), so a `Span` can key a hash
/// map or a priority queue directly. Spans built by this crate never hold
/// NaN; see [`Span::validate`].
#[derive(Debug, Clone, Copy)]
pub struct Span {
    pub low: f64,
    pub high: f64,
}

/// A segment between two consecutive distinct endpoints of one color's
/// balls.
pub type AtomicRange = Span;

impl Span {
    /// Create a new span.
    #[inline]
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Returns the width of the span.
    #[inline]
    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    /// Half the width of the span.
    #[inline]
    pub fn half_width(&self) -> f64 {
        (self.high - self.low) / 2.0
    }

    /// Returns true if the span has zero width.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.low >= self.high
    }

    /// Check if this span overlaps another under the given mode.
    #[inline]
    pub fn overlaps(&self, other: &Span, mode: OverlapMode) -> bool {
        mode.overlaps(self.low, self.high, other.low, other.high)
    }

    /// Check that both endpoints are finite and ordered.
    pub fn validate(&self) -> Result<(), String> {
        if !self.low.is_finite() || !self.high.is_finite() {
            return Err(format!(
                "endpoints must be finite, got ({}, {})",
                self.low, self.high
            ));
        }
        if self.low > self.high {
            return Err(format!("low ({}) > high ({})", self.low, self.high));
        }
        Ok(())
    }

    #[inline]
    fn key_bits(&self) -> (u64, u64) {
        (canonical_bits(self.low), canonical_bits(self.high))
    }
}

#[inline]
fn canonical(x: f64) -> f64 {
    if x == 0.0 {
        0.0
    } else {
        x
    }
}

#[inline]
fn canonical_bits(x: f64) -> u64 {
    canonical(x).to_bits()
}

impl PartialEq for Span {
    fn eq(&self, other: &Self) -> bool {
        self.key_bits() == other.key_bits()
    }
}

impl Eq for Span {}

impl Hash for Span {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key_bits().hash(state);
    }
}

impl Ord for Span {
    fn cmp(&self, other: &Self) -> Ordering {
        canonical(self.low)
            .total_cmp(&canonical(other.low))
            .then_with(|| canonical(self.high).total_cmp(&canonical(other.high)))
    }
}

impl PartialOrd for Span {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.low, self.high)
    }
}

impl From<(f64, f64)> for Span {
    fn from((low, high): (f64, f64)) -> Self {
        Self::new(low, high)
    }
}

/// Split the hull of a set of endpoints into consecutive atomic ranges.
///
/// Duplicate endpoints collapse and the ranges tile `[min, max]` in
/// ascending order. With two or more distinct endpoints every range has
/// positive width; a single distinct endpoint `p` yields the one range
/// `[p, p]`.
pub fn atomic_ranges(mut endpoints: Vec<f64>) -> Vec<AtomicRange> {
    endpoints.sort_unstable_by(|a, b| a.total_cmp(b));
    endpoints.dedup_by(|a, b| a == b);
    if let [point] = endpoints.as_slice() {
        return vec![Span::new(*point, *point)];
    }
    endpoints
        .windows(2)
        .map(|pair| Span::new(pair[0], pair[1]))
        .collect()
}
