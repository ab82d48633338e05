//! Size-threshold dispatch between in-memory, streamed, and chunked I/O.

use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};

use crate::IoError;
use crate::safety::{MAX_FILE_SIZE, validate_for_read};

/// Read-path size tier selected for a given file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    /// Read whole file into memory.
    Small,
    /// Buffered streaming read through a pooled buffer.
    Medium,
    /// Chunked reader; never materializes the full contents at once.
    Large,
}

/// Configurable size-tier boundaries, in bytes.
#[derive(Debug, Clone, Copy)]
pub struct IoThresholds {
    pub small: u64,
    pub medium: u64,
    pub large: u64,
}

impl IoThresholds {
    pub fn classify(&self, size: u64) -> Tier {
        if size <= self.small {
            Tier::Small
        } else if size <= self.large {
            Tier::Medium
        } else {
            Tier::Large
        }
    }
}

impl Default for IoThresholds {
    fn default() -> Self {
        Self {
            small: 100 * 1024,
            medium: 500 * 1024,
            large: 5 * 1024 * 1024,
        }
    }
}

const POOLED_BUFFER_SIZE: usize = 64 * 1024;

/// Read the full contents of `path`, dispatching to the tier appropriate
/// for its size. All tiers return the complete bytes; the tiering only
/// changes how much memory is held at once while reading.
pub async fn read_file(path: &Path, thresholds: &IoThresholds) -> Result<(Vec<u8>, u32), IoError> {
    let metadata = validate_for_read(path, MAX_FILE_SIZE)?;
    let mode = crate::safety::mode_of(path);
    let size = metadata.len();

    let bytes = match thresholds.classify(size) {
        Tier::Small => tokio::fs::read(path).await?,
        Tier::Medium => read_buffered(path).await?,
        Tier::Large => read_chunked(path, size).await?,
    };

    Ok((bytes, mode))
}

async fn read_buffered(path: &Path) -> Result<Vec<u8>, IoError> {
    let file = File::open(path).await?;
    let mut reader = BufReader::with_capacity(POOLED_BUFFER_SIZE, file);
    let mut out = Vec::new();
    reader.read_to_end(&mut out).await?;
    Ok(out)
}

async fn read_chunked(path: &Path, size_hint: u64) -> Result<Vec<u8>, IoError> {
    let mut file = File::open(path).await?;
    let mut out = Vec::with_capacity(size_hint.min(64 * 1024 * 1024) as usize);
    let mut buf = vec![0u8; POOLED_BUFFER_SIZE];
    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
    }
    Ok(out)
}

/// Copy `from` to `to`, always streaming through a pooled buffer regardless
/// of size, so the cost is O(buffer) memory rather than O(file size).
pub async fn copy_file(from: &Path, to: &Path) -> Result<u64, IoError> {
    validate_for_read(from, MAX_FILE_SIZE)?;
    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut src = BufReader::with_capacity(POOLED_BUFFER_SIZE, File::open(from).await?);
    let mut dst = File::create(to).await?;
    let mut buf = vec![0u8; POOLED_BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let n = src.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        dst.write_all(&buf[..n]).await?;
        total += n as u64;
    }
    dst.flush().await?;
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_size() {
        let thresholds = IoThresholds::default();
        assert_eq!(thresholds.classify(10), Tier::Small);
        assert_eq!(thresholds.classify(200 * 1024), Tier::Medium);
        assert_eq!(thresholds.classify(10 * 1024 * 1024), Tier::Large);
    }

    #[tokio::test]
    async fn reads_small_file_whole() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        tokio::fs::write(tmp.path(), b"hello world").await.unwrap();
        let (bytes, _mode) = read_file(tmp.path(), &IoThresholds::default()).await.unwrap();
        assert_eq!(bytes, b"hello world");
    }

    #[tokio::test]
    async fn copy_streams_contents() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src.txt");
        let dst = tmp.path().join("nested").join("dst.txt");
        tokio::fs::write(&src, b"payload").await.unwrap();

        let copied = copy_file(&src, &dst).await.unwrap();
        assert_eq!(copied, 7);
        assert_eq!(tokio::fs::read(&dst).await.unwrap(), b"payload");
    }
}
