//! Pre-I/O validation: rejects special files and reserved paths before any
//! read or write touches them.

use std::path::{Path, PathBuf};

use crate::IoError;

/// Hard ceiling on a single read, independent of the tiering thresholds.
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Validate that `path` is safe to read: not a device/FIFO/socket, not a
/// reserved OS path, and within `max_size` bytes.
pub fn validate_for_read(path: &Path, max_size: u64) -> Result<std::fs::Metadata, IoError> {
    let metadata = std::fs::metadata(path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::FileTypeExt;
        let file_type = metadata.file_type();
        if file_type.is_block_device() {
            return Err(IoError::BlockDevice(path.to_path_buf()));
        }
        if file_type.is_char_device() {
            return Err(IoError::CharDevice(path.to_path_buf()));
        }
        if file_type.is_fifo() {
            return Err(IoError::Fifo(path.to_path_buf()));
        }
        if file_type.is_socket() {
            return Err(IoError::Socket(path.to_path_buf()));
        }
    }

    if is_reserved_path(path) {
        return Err(IoError::SpecialPath(path.to_path_buf()));
    }

    if max_size > 0 && metadata.len() > max_size {
        return Err(IoError::TooLarge {
            path: path.to_path_buf(),
            size: metadata.len(),
            max: max_size,
        });
    }

    Ok(metadata)
}

fn is_reserved_path(path: &Path) -> bool {
    let path_str = path.to_string_lossy();

    #[cfg(unix)]
    {
        if path_str.starts_with("/dev/") || path_str.starts_with("/proc/") || path_str.starts_with("/sys/") {
            return true;
        }
    }

    #[cfg(windows)]
    {
        let upper = path_str.to_uppercase();
        if upper.starts_with(r"\\.\") || upper.starts_with(r"\\?\") {
            return true;
        }
        let stem = upper.trim_end_matches([':', '\\', '/']);
        if matches!(
            stem,
            "CON" | "PRN" | "AUX" | "NUL"
                | "COM1" | "COM2" | "COM3" | "COM4" | "COM5" | "COM6" | "COM7" | "COM8" | "COM9"
                | "LPT1" | "LPT2" | "LPT3" | "LPT4" | "LPT5" | "LPT6" | "LPT7" | "LPT8" | "LPT9"
        ) {
            return true;
        }
    }

    let _ = &path_str;
    false
}

/// Permission mode of an existing file, or the process default (0644) if
/// the path does not exist yet.
#[cfg(unix)]
pub fn mode_of(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.permissions().mode())
        .unwrap_or(0o644)
}

#[cfg(not(unix))]
pub fn mode_of(_path: &Path) -> u32 {
    0o644
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_file_passes() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), b"hello").unwrap();
        assert!(validate_for_read(tmp.path(), MAX_FILE_SIZE).is_ok());
    }

    #[test]
    fn oversized_file_rejected() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), b"hello").unwrap();
        assert!(validate_for_read(tmp.path(), 1).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn dev_null_rejected() {
        let result = validate_for_read(std::path::Path::new("/dev/null"), MAX_FILE_SIZE);
        assert!(result.is_err());
    }
}
