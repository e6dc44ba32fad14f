//! Allocate command implementation.
//!
//! Reads a ball file, runs the greedy allocation and writes one TSV line
//! per bucket.

use crate::ball::{read_balls, read_balls_stdin, Ball};
use crate::bucket::BucketWriter;
use crate::config::{AllocConfig, OverlapMode};
use crate::error::Result;
use crate::orchestrator::{Orchestrator, RunStats};
use std::io::Write;
use std::path::Path;
use std::time::Instant;

/// Default number of buckets to extract.
pub const DEFAULT_BUCKETS: usize = 5;

/// Allocate command configuration.
#[derive(Debug, Clone)]
pub struct AllocateCommand {
    /// Buckets to extract
    pub num_buckets: usize,
    /// Allocation settings
    pub config: AllocConfig,
    /// Skip malformed input lines instead of failing
    pub lenient: bool,
    /// Write a column header before the buckets
    pub header: bool,
}

impl Default for AllocateCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocateCommand {
    pub fn new() -> Self {
        Self {
            num_buckets: DEFAULT_BUCKETS,
            config: AllocConfig::default(),
            lenient: false,
            header: false,
        }
    }

    pub fn with_buckets(mut self, n: usize) -> Self {
        self.num_buckets = n;
        self
    }

    pub fn with_config(mut self, config: AllocConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_overlap(mut self, mode: OverlapMode) -> Self {
        self.config = self.config.with_overlap(mode);
        self
    }

    pub fn with_lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }

    /// Allocate over balls already in memory.
    pub fn allocate<W: Write>(&self, balls: Vec<Ball>, output: &mut W) -> Result<RunStats> {
        let start = Instant::now();
        let mut orchestrator = Orchestrator::new(balls, self.config.clone())?;
        let buckets = orchestrator.run(self.num_buckets)?;

        let mut writer = BucketWriter::new(output);
        if self.header {
            writer.write_header()?;
        }
        writer.write_all(&buckets)?;
        writer.flush()?;

        let mut stats = orchestrator.stats().clone();
        stats.elapsed_secs = start.elapsed().as_secs_f64();
        log::info!("allocate: {}", stats);
        Ok(stats)
    }

    /// Read balls from a file and allocate.
    pub fn run<P: AsRef<Path>, W: Write>(&self, path: P, output: &mut W) -> Result<RunStats> {
        let balls = read_balls(path, self.lenient)?;
        self.allocate(balls, output)
    }

    /// Read balls from stdin and allocate.
    pub fn run_stdin<W: Write>(&self, output: &mut W) -> Result<RunStats> {
        let balls = read_balls_stdin(self.lenient)?;
        self.allocate(balls, output)
    }
}
