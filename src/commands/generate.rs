//! Generate synthetic ball files for benchmarking.
//!
//! Two distributions:
//! - `random`: start and width drawn from U[0, 1)
//! - `shifted`: ball `i` of `n` spans `[i/(2n), 10 + i/(2n)]`, so every
//!   ball overlaps every other and the atomic ranges pile up at the ends
//!
//! Output is deterministic for a given seed.

use crate::error::{Error, Result};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

/// Buffer size for output (1MB)
const BUF_SIZE: usize = 1024 * 1024;

/// Distribution of generated balls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateMode {
    /// Uniform start, uniform width, both in [0, 1)
    Random,
    /// Evenly shifted wide balls
    Shifted,
}

impl GenerateMode {
    /// Parse mode from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "random" | "uniform" => Some(Self::Random),
            "shifted" => Some(Self::Shifted),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Shifted => "shifted",
        }
    }
}

/// Size specification (parses 1K, 1M, etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeSpec {
    pub count: u64,
}

impl SizeSpec {
    /// Parse size from string (e.g., "1K", "5M", "100").
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim().to_uppercase();
        if s.is_empty() {
            return None;
        }

        let (num_part, multiplier) = if let Some(n) = s.strip_suffix('K') {
            (n, 1_000u64)
        } else if let Some(n) = s.strip_suffix('M') {
            (n, 1_000_000u64)
        } else {
            (s.as_str(), 1u64)
        };

        num_part
            .parse::<u64>()
            .ok()
            .and_then(|n| n.checked_mul(multiplier))
            .map(|count| Self { count })
    }

    /// Format size for display.
    pub fn display(&self) -> String {
        format_count(self.count)
    }
}

/// Configuration for the generate command.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// Output file, `None` for stdout
    pub output: Option<PathBuf>,
    pub count: SizeSpec,
    pub seed: u64,
    pub mode: GenerateMode,
    /// Colors drawn uniformly per ball
    pub colors: Vec<String>,
    pub force: bool,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            output: None,
            count: SizeSpec { count: 2_000 },
            seed: 42,
            mode: GenerateMode::Random,
            colors: vec!["red".to_string()],
            force: false,
        }
    }
}

/// Statistics from generate operation.
#[derive(Debug, Default, Clone)]
pub struct GenerateStats {
    pub total_balls: u64,
    pub colors: usize,
    pub elapsed_secs: f64,
}

impl std::fmt::Display for GenerateStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} balls in {} colors ({:.1}s)",
            format_count(self.total_balls),
            self.colors,
            self.elapsed_secs
        )
    }
}

/// Generate command.
pub struct GenerateCommand {
    config: GenerateConfig,
}

impl GenerateCommand {
    /// Create a new generate command with the given config.
    pub fn new(config: GenerateConfig) -> Self {
        Self { config }
    }

    /// Run the generation, writing to the configured output.
    pub fn run(&self) -> Result<GenerateStats> {
        match &self.config.output {
            Some(path) => {
                if !self.config.force && path.exists() {
                    return Err(Error::InvalidArgument(format!(
                        "{} exists, use --force to overwrite",
                        path.display()
                    )));
                }
                let file = File::create(path)?;
                let stats = self.write_to(file)?;
                log::info!(
                    "generate {}: {} -> {}",
                    self.config.mode.name(),
                    stats,
                    path.display()
                );
                Ok(stats)
            }
            None => {
                let stdout = io::stdout();
                let stats = self.write_to(stdout.lock())?;
                log::info!("generate {}: {} -> stdout", self.config.mode.name(), stats);
                Ok(stats)
            }
        }
    }

    /// Write generated balls to any sink.
    pub fn write_to<W: Write>(&self, output: W) -> Result<GenerateStats> {
        if self.config.colors.is_empty() {
            return Err(Error::InvalidArgument(
                "at least one color is required".to_string(),
            ));
        }

        let start = Instant::now();
        let mut rng = SmallRng::seed_from_u64(self.config.seed);
        let mut writer = BufWriter::with_capacity(BUF_SIZE, output);
        let mut itoa_buf = itoa::Buffer::new();
        let mut ryu_buf = ryu::Buffer::new();

        let n = self.config.count.count;
        for i in 0..n {
            let (low, high) = self.sample_range(i, n, &mut rng);
            let color = &self.config.colors[rng.gen_range(0..self.config.colors.len())];

            writer.write_all(itoa_buf.format(i).as_bytes())?;
            writer.write_all(b"\t")?;
            writer.write_all(color.as_bytes())?;
            writer.write_all(b"\t")?;
            writer.write_all(ryu_buf.format(low).as_bytes())?;
            writer.write_all(b"\t")?;
            writer.write_all(ryu_buf.format(high).as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        Ok(GenerateStats {
            total_balls: n,
            colors: self.config.colors.len(),
            elapsed_secs: start.elapsed().as_secs_f64(),
        })
    }

    /// Range of ball `i` out of `n`.
    #[inline]
    fn sample_range(&self, i: u64, n: u64, rng: &mut SmallRng) -> (f64, f64) {
        match self.config.mode {
            GenerateMode::Random => {
                let start: f64 = rng.gen();
                let width: f64 = rng.gen();
                (start, start + width)
            }
            GenerateMode::Shifted => {
                let shift = i as f64 / (2 * n) as f64;
                (shift, 10.0 + shift)
            }
        }
    }
}

/// Format count with K/M suffix.
fn format_count(count: u64) -> String {
    if count >= 1_000_000 && count % 1_000_000 == 0 {
        format!("{}M", count / 1_000_000)
    } else if count >= 1_000 && count % 1_000 == 0 {
        format!("{}K", count / 1_000)
    } else {
        count.to_string()
    }
}
