// Clippy allows for the whole crate
#![allow(clippy::should_implement_trait)]
#![allow(clippy::type_complexity)]

//! range-buckets: greedy interval bucket allocation
//!
//! Balls are colored closed intervals on the real line. For each color the
//! distinct endpoints cut the line into atomic ranges; the allocator
//! repeatedly picks the atomic range covered by the most live balls of one
//! color, emits it as a bucket, and consumes those balls so they stop
//! counting toward every other range they covered.
//!
//! # Features
//!
//! - **Indexed structures**: an augmented interval index and an indexed
//!   max-queue keep each extraction close to logarithmic
//! - **Parallel construction**: per-color allocators are built with Rayon
//! - **Fast I/O**: memory-mapped input, itoa/ryu output
//!
//! # Example
//!
//! ```rust,no_run
//! use range_buckets::{ball, config::AllocConfig, orchestrator::Orchestrator};
//!
//! let balls = ball::read_balls("balls.txt", false).unwrap();
//! let mut orchestrator = Orchestrator::new(balls, AllocConfig::default()).unwrap();
//! for bucket in orchestrator.run(5).unwrap() {
//!     println!("{}", bucket);
//! }
//! ```

pub mod allocator;
pub mod ball;
pub mod bucket;
pub mod commands;
pub mod config;
pub mod error;
pub mod index;
pub mod orchestrator;
pub mod parallel;
pub mod pqueue;
pub mod range;

// Re-export commonly used types
pub use allocator::ColorAllocator;
pub use ball::{parse_balls, read_balls, Ball, BallId, BallReader};
pub use bucket::{Bucket, BucketWriter};
pub use config::{AllocConfig, OverlapMode};
pub use error::{Error, Result};
pub use index::IntervalIndex;
pub use orchestrator::{allocate, Orchestrator, RunStats};
pub use pqueue::IndexedMaxQueue;
pub use range::{AtomicRange, Span};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::allocator::ColorAllocator;
    pub use crate::ball::{parse_balls, read_balls, Ball, BallId, BallReader};
    pub use crate::bucket::{Bucket, BucketWriter};
    pub use crate::commands::{AllocateCommand, GenerateCommand};
    pub use crate::config::{AllocConfig, OverlapMode};
    pub use crate::error::{Error, Result};
    pub use crate::orchestrator::{allocate, Orchestrator};
    pub use crate::range::{AtomicRange, Span};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_basic_workflow() {
        use crate::ball::parse_balls;
        use crate::orchestrator::allocate;

        let content = "0\tred\t0\t10\n1\tred\t5\t15\n";
        let balls = parse_balls(content).unwrap();

        let buckets = allocate(balls, 5, Default::default()).unwrap();

        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].count, 2);
        assert_eq!(buckets[0].range.low, 5.0);
        assert_eq!(buckets[0].range.high, 10.0);
    }

    #[test]
    fn test_generate_then_allocate_workflow() {
        use crate::ball::parse_balls;
        use crate::commands::{GenerateCommand, GenerateConfig, GenerateMode, SizeSpec};
        use crate::config::AllocConfig;
        use crate::orchestrator::Orchestrator;

        let config = GenerateConfig {
            count: SizeSpec { count: 50 },
            mode: GenerateMode::Shifted,
            ..Default::default()
        };
        let mut out = Vec::new();
        GenerateCommand::new(config).write_to(&mut out).unwrap();
        let balls = parse_balls(std::str::from_utf8(&out).unwrap()).unwrap();

        let mut orchestrator =
            Orchestrator::new(balls, AllocConfig::default().with_verify(true)).unwrap();
        let buckets = orchestrator.run(1).unwrap();

        // Every shifted ball covers the middle range
        assert_eq!(buckets[0].count, 50);
        assert_eq!(buckets[0].ball_ids.len(), 50);
    }
}
