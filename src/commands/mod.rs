//! Command implementations for rbuckets.

pub mod allocate;
pub mod generate;

pub use allocate::{AllocateCommand, DEFAULT_BUCKETS};
pub use generate::{GenerateCommand, GenerateConfig, GenerateMode, GenerateStats, SizeSpec};
