//! Line-range reads: scan line-by-line, counting newlines, emitting only
//! the requested `[start, end]` window and stopping early past `end`.

use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::IoError;
use crate::safety::{MAX_FILE_SIZE, validate_for_read};

/// Read lines `start..=end` (1-indexed, inclusive) of `path` without
/// materializing the rest of the file.
pub async fn read_line_range(path: &Path, start: usize, end: usize) -> Result<Vec<String>, IoError> {
    validate_for_read(path, MAX_FILE_SIZE)?;
    let file = File::open(path).await?;
    let mut reader = BufReader::new(file).lines();

    let mut out = Vec::new();
    let mut line_no = 0usize;
    while let Some(line) = reader.next_line().await? {
        line_no += 1;
        if line_no < start {
            continue;
        }
        if line_no > end {
            break;
        }
        out.push(line);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_inclusive_range() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        tokio::fs::write(tmp.path(), "one\ntwo\nthree\nfour\nfive\n")
            .await
            .unwrap();

        let lines = read_line_range(tmp.path(), 2, 4).await.unwrap();
        assert_eq!(lines, vec!["two", "three", "four"]);
    }

    #[tokio::test]
    async fn stops_early_past_end() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let mut content = String::new();
        for i in 0..10_000 {
            content.push_str(&format!("line {i}\n"));
        }
        tokio::fs::write(tmp.path(), content).await.unwrap();

        let lines = read_line_range(tmp.path(), 1, 2).await.unwrap();
        assert_eq!(lines, vec!["line 0", "line 1"]);
    }
}
