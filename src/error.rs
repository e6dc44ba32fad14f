//! Error type shared by the allocation engine, the ball reader and the commands.

use std::io;
use thiserror::Error;

/// Errors that can occur while reading balls or allocating buckets.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Extraction or peek on a queue (or allocator) with no entries left.
    #[error("Queue is empty")]
    EmptyQueue,

    /// Reprioritize or remove of a key that is not in the queue.
    #[error("Key not found in queue")]
    KeyNotFound,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Internal bookkeeping disagreed with itself.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
