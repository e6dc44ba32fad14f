//! Ball records and the ball-file reader.
//!
//! A ball file has one ball per line: `id color low high`, separated by
//! any run of whitespace. Blank lines and lines starting with `#` are
//! skipped.

use crate::error::{Error, Result};
use crate::range::Span;
use memchr::memchr;
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

/// Identifier of a ball, unique within one input.
pub type BallId = i64;

/// Minimum file size to use mmap (smaller files use buffered I/O)
const MMAP_THRESHOLD: u64 = 64 * 1024;

/// A colored interval.
#[derive(Debug, Clone, PartialEq)]
pub struct Ball {
    pub id: BallId,
    pub color: String,
    pub low: f64,
    pub high: f64,
}

impl Ball {
    /// Create a ball, rejecting non-finite endpoints and `low > high`.
    pub fn new(id: BallId, color: impl Into<String>, low: f64, high: f64) -> Result<Self> {
        let ball = Self {
            id,
            color: color.into(),
            low,
            high,
        };
        ball.validate()?;
        Ok(ball)
    }

    /// The ball's range.
    #[inline]
    pub fn span(&self) -> Span {
        Span::new(self.low, self.high)
    }

    /// Check the range invariant.
    pub fn validate(&self) -> Result<()> {
        self.span()
            .validate()
            .map_err(|msg| Error::InvalidArgument(format!("ball {}: {}", self.id, msg)))
    }
}

/// Parse one line. Returns `Ok(None)` for lines that carry no ball.
pub fn parse_ball_line(line: &str, line_number: usize) -> Result<Option<Ball>> {
    let line = line.trim();
    if should_skip_line(line) {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 4 {
        return Err(Error::Parse {
            line: line_number,
            message: format!("Expected 4 fields, got {}", fields.len()),
        });
    }

    let id = fields[0].parse::<BallId>().map_err(|_| Error::Parse {
        line: line_number,
        message: format!("Invalid id: '{}'", fields[0]),
    })?;
    let low = parse_endpoint(fields[2], "low", line_number)?;
    let high = parse_endpoint(fields[3], "high", line_number)?;

    let ball = Ball {
        id,
        color: fields[1].to_string(),
        low,
        high,
    };
    ball.span().validate().map_err(|message| Error::Parse {
        line: line_number,
        message,
    })?;

    Ok(Some(ball))
}

fn parse_endpoint(s: &str, field_name: &str, line_number: usize) -> Result<f64> {
    s.parse().map_err(|_| Error::Parse {
        line: line_number,
        message: format!("Invalid {} endpoint: '{}'", field_name, s),
    })
}

/// Check if a line should be skipped (empty or comment).
#[inline]
pub fn should_skip_line(line: &str) -> bool {
    line.is_empty() || line.starts_with('#')
}

/// A streaming ball-file reader.
pub struct BallReader<R: Read> {
    reader: BufReader<R>,
    line_number: usize,
    buffer: String,
    lenient: bool,
    skipped: usize,
}

impl BallReader<File> {
    /// Open a ball file from a path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> BallReader<R> {
    /// Create a new ball reader from any readable source.
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
            buffer: String::with_capacity(256),
            lenient: false,
            skipped: 0,
        }
    }

    /// Skip malformed lines instead of failing on them.
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }

    /// Number of malformed lines skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Read the next ball.
    pub fn read_ball(&mut self) -> Result<Option<Ball>> {
        loop {
            self.buffer.clear();
            let bytes_read = self.reader.read_line(&mut self.buffer)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            match parse_ball_line(&self.buffer, self.line_number) {
                Ok(Some(ball)) => return Ok(Some(ball)),
                Ok(None) => continue,
                Err(e) if self.lenient => {
                    log::warn!("skipping malformed line: {}", e);
                    self.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Read every remaining ball.
    pub fn read_all(&mut self) -> Result<Vec<Ball>> {
        let mut balls = Vec::new();
        while let Some(ball) = self.read_ball()? {
            balls.push(ball);
        }
        Ok(balls)
    }
}

/// Parse balls from an in-memory buffer, splitting lines with memchr.
pub fn parse_ball_bytes(data: &[u8], lenient: bool) -> Result<Vec<Ball>> {
    let mut balls = Vec::new();
    let mut pos = 0;
    let mut line_number = 0;

    while pos < data.len() {
        let end = memchr(b'\n', &data[pos..]).map_or(data.len(), |i| pos + i);
        line_number += 1;
        let raw = &data[pos..end];
        pos = end + 1;

        let parsed = std::str::from_utf8(raw)
            .map_err(|_| Error::Parse {
                line: line_number,
                message: "Line is not valid UTF-8".to_string(),
            })
            .and_then(|line| parse_ball_line(line, line_number));

        match parsed {
            Ok(Some(ball)) => balls.push(ball),
            Ok(None) => {}
            Err(e) if lenient => log::warn!("skipping malformed line: {}", e),
            Err(e) => return Err(e),
        }
    }

    Ok(balls)
}

/// Read all balls from a file, memory-mapping large files.
pub fn read_balls<P: AsRef<Path>>(path: P, lenient: bool) -> Result<Vec<Ball>> {
    let file = File::open(path)?;
    let size = file.metadata()?.len();

    if size >= MMAP_THRESHOLD {
        // SAFETY: the map is read-only and dropped before this function returns
        let mmap = unsafe { Mmap::map(&file)? };
        parse_ball_bytes(&mmap, lenient)
    } else {
        BallReader::new(file).lenient(lenient).read_all()
    }
}

/// Read all balls from stdin.
pub fn read_balls_stdin(lenient: bool) -> Result<Vec<Ball>> {
    let stdin = io::stdin();
    BallReader::new(stdin.lock()).lenient(lenient).read_all()
}

/// Parse balls from a string (strict).
pub fn parse_balls(content: &str) -> Result<Vec<Ball>> {
    BallReader::new(content.as_bytes()).read_all()
}
