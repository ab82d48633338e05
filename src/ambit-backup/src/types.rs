//! On-disk and in-memory shapes of a backup entry.

use std::path::PathBuf;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// One file's captured state inside a backup entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileBackupEntry {
    pub original_path: PathBuf,
    /// Path of the copy under `<backup_root>/<backup_id>/files/...`.
    pub stored_path: PathBuf,
    pub size: u64,
    pub sha256: String,
    pub original_modtime: Option<SystemTime>,
    pub original_mode: u32,
}

/// An immutable, timestamped record of file bytes captured before a
/// destructive operation. Written to `<backup_root>/<backup_id>/metadata.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupEntry {
    pub backup_id: String,
    /// Seconds since epoch.
    pub timestamp: i64,
    pub operation: String,
    pub user_context: String,
    pub files: Vec<FileBackupEntry>,
    pub total_size: u64,
}

impl BackupEntry {
    pub fn file(&self, path: &std::path::Path) -> Option<&FileBackupEntry> {
        self.files.iter().find(|f| f.original_path == path)
    }
}

/// Filter applied by [`crate::BackupManager::list`].
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub operation: Option<String>,
    pub path_substring: Option<String>,
    pub max_age_hours: Option<u64>,
}

/// Summary row returned by `list`, newest-first.
#[derive(Debug, Clone, Serialize)]
pub struct BackupSummary {
    pub backup_id: String,
    pub timestamp: i64,
    pub operation: String,
    pub file_count: usize,
    pub total_size: u64,
}

impl From<&BackupEntry> for BackupSummary {
    fn from(entry: &BackupEntry) -> Self {
        Self {
            backup_id: entry.backup_id.clone(),
            timestamp: entry.timestamp,
            operation: entry.operation.clone(),
            file_count: entry.files.len(),
            total_size: entry.total_size,
        }
    }
}

/// Result of [`crate::BackupManager::compare`].
#[derive(Debug, Clone, Serialize)]
pub struct CompareReport {
    pub backup_id: String,
    pub path: PathBuf,
    pub backed_up_size: u64,
    pub current_size: u64,
    pub size_delta: i64,
    pub similarity_percent: f64,
    pub unified_diff: String,
    pub identical: bool,
}

/// Per-file outcome of a restore.
#[derive(Debug, Clone, Serialize)]
pub struct RestoredFile {
    pub path: PathBuf,
    pub bytes_written: u64,
}

/// Result of [`crate::BackupManager::restore`].
#[derive(Debug, Clone, Serialize)]
pub struct RestoreReport {
    pub backup_id: String,
    pub preview: bool,
    pub restored: Vec<RestoredFile>,
    /// Id of the backup taken of the pre-restore state, unless this was a preview.
    pub safety_backup_id: Option<String>,
}

/// Result of [`crate::BackupManager::cleanup`].
#[derive(Debug, Clone, Serialize, Default)]
pub struct CleanupReport {
    pub dry_run: bool,
    pub removed_ids: Vec<String>,
    pub reclaimed_bytes: u64,
}
