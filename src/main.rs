//! rbuckets: greedy interval bucket allocation
//!
//! Usage: rbuckets <COMMAND> [OPTIONS]

use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::process;

use range_buckets::commands::{
    AllocateCommand, GenerateCommand, GenerateConfig, GenerateMode, SizeSpec, DEFAULT_BUCKETS,
};
use range_buckets::config::{AllocConfig, OverlapMode};
use range_buckets::error::{Error, Result};

#[derive(Parser)]
#[command(name = "rbuckets")]
#[command(version)]
#[command(about = "Greedy allocation of colored intervals into densest-range buckets", long_about = None)]
struct Cli {
    /// Number of threads to use (default: number of CPUs)
    #[arg(long, short = 't', global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Allocate balls into buckets, densest atomic range first
    Allocate {
        /// Input ball file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Number of buckets to extract
        #[arg(short = 'n', long, default_value_t = DEFAULT_BUCKETS)]
        buckets: usize,

        /// Overlap test: half-open|closed
        #[arg(long, default_value = "half-open")]
        overlap: String,

        /// Shorthand for --overlap closed
        #[arg(long, conflicts_with = "overlap")]
        closed: bool,

        /// Stop once the densest remaining range is empty
        #[arg(long)]
        skip_empty: bool,

        /// Recheck allocator bookkeeping after every bucket
        #[arg(long)]
        verify: bool,

        /// Skip malformed input lines instead of failing
        #[arg(long)]
        lenient: bool,

        /// Write a column header line
        #[arg(long)]
        header: bool,

        /// Print allocation statistics to stderr
        #[arg(long)]
        stats: bool,
    },

    /// Generate a synthetic ball file
    Generate {
        /// Output file (use - for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of balls (e.g., "2000", "10K", "1M")
        #[arg(long, default_value = "2000")]
        count: String,

        /// Random seed for reproducibility
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Distribution: random|shifted
        #[arg(long, default_value = "random")]
        mode: String,

        /// Colors to draw from (comma-separated)
        #[arg(long, default_value = "red")]
        colors: String,

        /// Overwrite an existing output file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = configure_threads(cli.threads).and_then(|()| match cli.command {
        Commands::Allocate {
            input,
            buckets,
            overlap,
            closed,
            skip_empty,
            verify,
            lenient,
            header,
            stats,
        } => run_allocate(
            input, buckets, overlap, closed, skip_empty, verify, lenient, header, stats,
        ),

        Commands::Generate {
            output,
            count,
            seed,
            mode,
            colors,
            force,
        } => run_generate(output, count, seed, mode, colors, force),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn configure_threads(threads: Option<usize>) -> Result<()> {
    if let Some(n) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .map_err(|e| Error::InvalidArgument(format!("thread pool: {}", e)))?;
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_allocate(
    input: Option<PathBuf>,
    buckets: usize,
    overlap: String,
    closed: bool,
    skip_empty: bool,
    verify: bool,
    lenient: bool,
    header: bool,
    stats: bool,
) -> Result<()> {
    let overlap = if closed {
        OverlapMode::Closed
    } else {
        OverlapMode::from_str(&overlap).ok_or_else(|| {
            Error::InvalidFormat(format!(
                "Invalid overlap mode '{}'. Use: half-open, closed",
                overlap
            ))
        })?
    };
    let config = AllocConfig::new()
        .with_overlap(overlap)
        .with_skip_empty(skip_empty)
        .with_verify(verify);
    let cmd = AllocateCommand::new()
        .with_buckets(buckets)
        .with_config(config)
        .with_lenient(lenient)
        .with_header(header);

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    let result = match input {
        Some(path) if path.to_string_lossy() != "-" => cmd.run(&path, &mut handle)?,
        _ => cmd.run_stdin(&mut handle)?,
    };

    if stats {
        eprintln!("Allocate stats: {}", result);
    }

    Ok(())
}

fn run_generate(
    output: Option<PathBuf>,
    count: String,
    seed: u64,
    mode: String,
    colors: String,
    force: bool,
) -> Result<()> {
    let mode = GenerateMode::from_str(&mode).ok_or_else(|| {
        Error::InvalidFormat(format!("Invalid mode '{}'. Use: random, shifted", mode))
    })?;

    let count = SizeSpec::from_str(&count).ok_or_else(|| {
        Error::InvalidFormat(format!(
            "Invalid count '{}'. Use formats like 2000, 10K, 1M",
            count
        ))
    })?;

    let colors: Vec<String> = colors
        .split(',')
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();

    let output = output.filter(|p| p.to_string_lossy() != "-");

    let config = GenerateConfig {
        output,
        count,
        seed,
        mode,
        colors,
        force,
    };

    GenerateCommand::new(config).run()?;
    Ok(())
}
