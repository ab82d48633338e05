//! Tiered I/O: size-threshold dispatch between in-memory, streaming, and
//! chunked read paths, atomic temp+rename writes, and streamed copies.

mod atomic;
mod range;
mod safety;
mod tiers;

pub use atomic::atomic_write;
pub use range::read_line_range;
pub use safety::{MAX_FILE_SIZE, mode_of, validate_for_read};
pub use tiers::{IoThresholds, Tier, copy_file, read_file};

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the tiered I/O layer.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("cannot read block device: {0}")]
    BlockDevice(PathBuf),

    #[error("cannot read character device: {0}")]
    CharDevice(PathBuf),

    #[error("cannot read FIFO/named pipe: {0}")]
    Fifo(PathBuf),

    #[error("cannot read socket: {0}")]
    Socket(PathBuf),

    #[error("cannot read special system path: {0}")]
    SpecialPath(PathBuf),

    #[error("file too large: {path} ({size} bytes, max {max} bytes)")]
    TooLarge { path: PathBuf, size: u64, max: u64 },

    #[error("path has no usable parent directory: {0}")]
    InvalidPath(PathBuf),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
