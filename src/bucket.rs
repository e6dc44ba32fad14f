//! Bucket records and their tab-separated output.
//!
//! Uses itoa for integer formatting and ryu for float formatting
//! to avoid allocation per bucket.

use crate::ball::BallId;
use crate::error::Result;
use crate::range::Span;
use std::fmt;
use std::io::{BufWriter, Write};

/// Buffer size for BucketWriter.
const DEFAULT_BUFFER_SIZE: usize = 256 * 1024;

/// One greedy extraction: the chosen atomic range and the balls it consumed.
#[derive(Debug, Clone, PartialEq)]
pub struct Bucket {
    pub color: String,
    /// `(range.high - range.low) / 2`.
    ///
    /// This is half the width of the range, not its midpoint. It is kept
    /// as-is because downstream consumers read this exact value.
    pub representative_point: f64,
    /// Overlap count of the range when it was extracted.
    pub count: usize,
    pub range: Span,
    /// Ids of the consumed balls, ascending.
    pub ball_ids: Vec<BallId>,
}

impl Bucket {
    pub fn new(color: impl Into<String>, count: usize, range: Span, ball_ids: Vec<BallId>) -> Self {
        Self {
            color: color.into(),
            representative_point: range.half_width(),
            count,
            range,
            ball_ids,
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t",
            self.color, self.representative_point, self.count, self.range.low, self.range.high
        )?;
        if self.ball_ids.is_empty() {
            return write!(f, ".");
        }
        for (i, id) in self.ball_ids.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", id)?;
        }
        Ok(())
    }
}

/// Header line for bucket output.
pub const HEADER: &str = "#color\tpoint\tcount\tlow\thigh\tball_ids";

/// Buffered writer for bucket lines.
pub struct BucketWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
    ryu_buf: ryu::Buffer,
}

impl<W: Write> BucketWriter<W> {
    pub fn new(output: W) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, output)
    }

    pub fn with_capacity(capacity: usize, output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            itoa_buf: itoa::Buffer::new(),
            ryu_buf: ryu::Buffer::new(),
        }
    }

    /// Write the column header.
    pub fn write_header(&mut self) -> Result<()> {
        self.writer.write_all(HEADER.as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Write one bucket followed by newline.
    pub fn write_bucket(&mut self, bucket: &Bucket) -> Result<()> {
        self.writer.write_all(bucket.color.as_bytes())?;
        self.writer.write_all(b"\t")?;
        self.write_float(bucket.representative_point)?;
        self.writer.write_all(b"\t")?;
        self.writer
            .write_all(self.itoa_buf.format(bucket.count).as_bytes())?;
        self.writer.write_all(b"\t")?;
        self.write_float(bucket.range.low)?;
        self.writer.write_all(b"\t")?;
        self.write_float(bucket.range.high)?;
        self.writer.write_all(b"\t")?;

        if bucket.ball_ids.is_empty() {
            self.writer.write_all(b".")?;
        }
        for (i, id) in bucket.ball_ids.iter().enumerate() {
            if i > 0 {
                self.writer.write_all(b",")?;
            }
            self.writer.write_all(self.itoa_buf.format(*id).as_bytes())?;
        }
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Write every bucket in order.
    pub fn write_all(&mut self, buckets: &[Bucket]) -> Result<()> {
        for bucket in buckets {
            self.write_bucket(bucket)?;
        }
        Ok(())
    }

    /// Write a float using ryu, printing integral values without a
    /// trailing `.0`.
    #[inline]
    fn write_float(&mut self, x: f64) -> Result<()> {
        if x.fract() == 0.0 && x.abs() < 1e15 {
            self.writer
                .write_all(self.itoa_buf.format(x as i64).as_bytes())?;
        } else {
            self.writer.write_all(self.ryu_buf.format(x).as_bytes())?;
        }
        Ok(())
    }

    /// Flush buffered output.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
