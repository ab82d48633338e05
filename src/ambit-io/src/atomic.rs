//! Atomic writes: write to a temp sibling file with a random suffix, then
//! rename over the target. Readers never observe a partial file.

use std::path::{Path, PathBuf};

use rand::Rng;
use rand::distr::Alphanumeric;
use tokio::fs;

use crate::IoError;
use crate::safety::mode_of;

fn random_suffix() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect()
}

fn temp_sibling(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("ambit-tmp");
    parent.join(format!(".{file_name}.{}.tmp", random_suffix()))
}

/// Write `content` to `path` atomically, preserving the original file's
/// permission bits if it already existed (defaulting to 0644 otherwise).
/// Creates parent directories as needed.
pub async fn atomic_write(path: &Path, content: &[u8]) -> Result<(), IoError> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| IoError::InvalidPath(path.to_path_buf()))?;

    if !fs::try_exists(parent).await.unwrap_or(false) {
        fs::create_dir_all(parent).await?;
    }

    let mode = mode_of(path);
    let temp_path = temp_sibling(path);

    let write_result = fs::write(&temp_path, content).await;
    if let Err(e) = write_result {
        let _ = fs::remove_file(&temp_path).await;
        return Err(e.into());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(mode)).await;
    }
    let _ = mode; // mode is a no-op on non-unix targets

    let mut retries = 5u32;
    loop {
        #[cfg(windows)]
        if fs::try_exists(path).await.unwrap_or(false) {
            let _ = fs::remove_file(path).await;
        }

        match fs::rename(&temp_path, path).await {
            Ok(()) => return Ok(()),
            Err(e) if retries > 0 => {
                retries -= 1;
                tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
                let _ = e;
                continue;
            }
            Err(e) => {
                let _ = fs::remove_file(&temp_path).await;
                return Err(e.into());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn writes_new_file_creating_parents() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("nested").join("file.txt");
        atomic_write(&target, b"hello").await.unwrap();
        assert_eq!(tokio::fs::read(&target).await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn overwrites_existing_preserving_mode() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("file.txt");
        tokio::fs::write(&target, b"old").await.unwrap();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&target, std::fs::Permissions::from_mode(0o600))
                .await
                .unwrap();
        }

        atomic_write(&target, b"new").await.unwrap();
        assert_eq!(tokio::fs::read(&target).await.unwrap(), b"new");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = tokio::fs::metadata(&target).await.unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[tokio::test]
    async fn leaves_no_temp_file_behind_on_success() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("file.txt");
        atomic_write(&target, b"hello").await.unwrap();

        let mut entries = tokio::fs::read_dir(tmp.path()).await.unwrap();
        let mut count = 0;
        while entries.next_entry().await.unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 1);
    }
}
