//! Backup creation, listing, retrieval, comparison, restore and cleanup.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::BackupError;
use crate::sanitize::{generate_id, validate_id};
use crate::types::{
    BackupEntry, BackupSummary, CleanupReport, CompareReport, FileBackupEntry, ListFilter,
    RestoreReport, RestoredFile,
};

/// Default retention: keep seven days, or the hundred most recent entries.
pub const DEFAULT_MAX_AGE_DAYS: u64 = 7;
pub const DEFAULT_MAX_COUNT: usize = 100;

/// Resolve a reasonable default backup root under the OS data directory,
/// mirroring the teacher's `dirs`-crate-based resolution for its own
/// application data directory.
pub fn default_backup_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("ambit-fs")
        .join("backups")
}

/// Turn an absolute path into a filesystem-safe relative path suitable for
/// nesting under `<backup_root>/<backup_id>/files/...`.
fn sanitize_relative_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        let piece = match component {
            std::path::Component::Normal(s) => s.to_string_lossy().replace(':', "_"),
            std::path::Component::RootDir | std::path::Component::Prefix(_) => continue,
            std::path::Component::CurDir | std::path::Component::ParentDir => continue,
        };
        out.push(piece);
    }
    out
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex_encode(&hasher.finalize())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn mode_of(path: &Path) -> u32 {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path)
            .map(|m| m.permissions().mode())
            .unwrap_or(0o644)
    }
    #[cfg(not(unix))]
    {
        let _ = path;
        0o644
    }
}

/// Persistent store of immutable backup entries under `backup_root`.
pub struct BackupManager {
    backup_root: PathBuf,
    max_age_days: u64,
    max_count: usize,
    /// Cache of known backup ids, newest-last; invalidated on create/cleanup.
    /// Protected by a single read/write lock -- callers never chain an
    /// `RLock -> RUnlock -> Lock` sequence that assumes the state held.
    known_ids: RwLock<Option<Vec<String>>>,
}

impl BackupManager {
    pub fn new(backup_root: PathBuf, max_age_days: u64, max_count: usize) -> Self {
        Self {
            backup_root,
            max_age_days,
            max_count,
            known_ids: RwLock::new(None),
        }
    }

    pub fn with_defaults(backup_root: PathBuf) -> Self {
        Self::new(backup_root, DEFAULT_MAX_AGE_DAYS, DEFAULT_MAX_COUNT)
    }

    pub fn backup_root(&self) -> &Path {
        &self.backup_root
    }

    async fn invalidate_index(&self) {
        *self.known_ids.write().await = None;
    }

    fn entry_dir(&self, backup_id: &str) -> PathBuf {
        self.backup_root.join(backup_id)
    }

    fn metadata_path(&self, backup_id: &str) -> PathBuf {
        self.entry_dir(backup_id).join("metadata.json")
    }

    /// Capture the current bytes, size, mtime and mode of every path in
    /// `paths` into a new, immutable backup entry.
    pub async fn create(
        &self,
        paths: &[PathBuf],
        operation: &str,
        user_context: &str,
    ) -> Result<BackupEntry, BackupError> {
        let backup_id = generate_id();
        let entry_dir = self.entry_dir(&backup_id);
        let files_dir = entry_dir.join("files");
        tokio::fs::create_dir_all(&files_dir).await?;

        let mut files = Vec::with_capacity(paths.len());
        let mut total_size = 0u64;

        for path in paths {
            match self.backup_one_file(path, &files_dir).await {
                Ok(entry) => {
                    total_size += entry.size;
                    files.push(entry);
                }
                Err(e) => {
                    let _ = tokio::fs::remove_dir_all(&entry_dir).await;
                    return Err(BackupError::CreateFailed {
                        detail: format!("failed to back up {}: {e}", path.display()),
                        partial_id: None,
                    });
                }
            }
        }

        let entry = BackupEntry {
            backup_id: backup_id.clone(),
            timestamp: now_unix(),
            operation: operation.to_string(),
            user_context: user_context.to_string(),
            files,
            total_size,
        };

        if let Err(e) = self.write_metadata(&entry_dir, &entry).await {
            let _ = tokio::fs::remove_dir_all(&entry_dir).await;
            return Err(e);
        }

        self.invalidate_index().await;
        info!(backup_id = %backup_id, files = entry.files.len(), "backup created");
        Ok(entry)
    }

    async fn backup_one_file(
        &self,
        path: &Path,
        files_dir: &Path,
    ) -> Result<FileBackupEntry, BackupError> {
        let stored_rel = sanitize_relative_path(path);
        let stored_path = files_dir.join(&stored_rel);
        if let Some(parent) = stored_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        ambit_io::copy_file(path, &stored_path).await?;

        let bytes = tokio::fs::read(&stored_path).await?;
        let sha256 = sha256_hex(&bytes);
        let metadata = tokio::fs::metadata(path).await.ok();
        let original_modtime = metadata.as_ref().and_then(|m| m.modified().ok());

        Ok(FileBackupEntry {
            original_path: path.to_path_buf(),
            stored_path,
            size: bytes.len() as u64,
            sha256,
            original_modtime,
            original_mode: mode_of(path),
        })
    }

    async fn write_metadata(
        &self,
        entry_dir: &Path,
        entry: &BackupEntry,
    ) -> Result<(), BackupError> {
        let metadata_path = entry_dir.join("metadata.json");
        let json = serde_json::to_string_pretty(entry)?;
        tokio::fs::write(&metadata_path, json).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&metadata_path, std::fs::Permissions::from_mode(0o600))
                .await?;
        }
        Ok(())
    }

    /// Load the full metadata for `backup_id`.
    pub async fn get(&self, backup_id: &str) -> Result<BackupEntry, BackupError> {
        validate_id(backup_id)?;
        let path = self.metadata_path(backup_id);
        let json = tokio::fs::read_to_string(&path)
            .await
            .map_err(|_| BackupError::NotFound(backup_id.to_string()))?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Enumerate every backup entry on disk, newest-first, applying `filter`.
    pub async fn list(&self, filter: &ListFilter) -> Result<Vec<BackupSummary>, BackupError> {
        let mut entries = Vec::new();
        let mut dir = match tokio::fs::read_dir(&self.backup_root).await {
            Ok(d) => d,
            Err(_) => return Ok(Vec::new()),
        };

        while let Some(item) = dir.next_entry().await? {
            if !item.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            let Some(id) = item.file_name().to_str().map(str::to_string) else {
                continue;
            };
            let Ok(entry) = self.get(&id).await else {
                continue;
            };
            entries.push(entry);
        }

        entries.sort_by_key(|e| std::cmp::Reverse(e.timestamp));

        let now = now_unix();
        let filtered = entries
            .into_iter()
            .filter(|e| {
                if let Some(op) = &filter.operation {
                    if &e.operation != op {
                        return false;
                    }
                }
                if let Some(sub) = &filter.path_substring {
                    let hit = e
                        .files
                        .iter()
                        .any(|f| f.original_path.to_string_lossy().contains(sub.as_str()));
                    if !hit {
                        return false;
                    }
                }
                if let Some(max_age_hours) = filter.max_age_hours {
                    let age_hours = (now - e.timestamp).max(0) / 3600;
                    if age_hours as u64 > max_age_hours {
                        return false;
                    }
                }
                true
            })
            .map(|e| BackupSummary::from(&e))
            .collect();

        Ok(filtered)
    }

    /// Compare the currently-stored bytes for `file_path` in `backup_id`
    /// against the file's present-day content on disk.
    pub async fn compare(
        &self,
        backup_id: &str,
        file_path: &Path,
    ) -> Result<CompareReport, BackupError> {
        let entry = self.get(backup_id).await?;
        let file_entry = entry
            .file(file_path)
            .ok_or_else(|| BackupError::FileNotInBackup {
                path: file_path.to_path_buf(),
                backup_id: backup_id.to_string(),
            })?;

        let stored_bytes = tokio::fs::read(&file_entry.stored_path).await?;
        let current_bytes = tokio::fs::read(file_path).await.unwrap_or_default();

        let stored_text = String::from_utf8_lossy(&stored_bytes);
        let current_text = String::from_utf8_lossy(&current_bytes);

        let diff = similar::TextDiff::from_lines(stored_text.as_ref(), current_text.as_ref());
        let similarity_percent = diff.ratio() as f64 * 100.0;
        let unified_diff = diff
            .unified_diff()
            .context_radius(3)
            .header("backup", "current")
            .to_string();

        Ok(CompareReport {
            backup_id: backup_id.to_string(),
            path: file_path.to_path_buf(),
            backed_up_size: stored_bytes.len() as u64,
            current_size: current_bytes.len() as u64,
            size_delta: current_bytes.len() as i64 - stored_bytes.len() as i64,
            similarity_percent,
            unified_diff,
            identical: stored_bytes == current_bytes,
        })
    }

    /// Restore one or all files tracked by `backup_id`. Unless `preview`,
    /// a safety backup of the current on-disk state is created first so a
    /// failed or regretted restore can itself be undone.
    pub async fn restore(
        &self,
        backup_id: &str,
        files: Option<&[PathBuf]>,
        preview: bool,
    ) -> Result<RestoreReport, BackupError> {
        let entry = self.get(backup_id).await?;
        let targets: Vec<&FileBackupEntry> = entry
            .files
            .iter()
            .filter(|f| files.is_none_or(|set| set.contains(&f.original_path)))
            .collect();

        for file in &targets {
            let stored_bytes = tokio::fs::read(&file.stored_path).await?;
            let actual = sha256_hex(&stored_bytes);
            if actual != file.sha256 {
                return Err(BackupError::IntegrityMismatch {
                    path: file.original_path.clone(),
                    expected: file.sha256.clone(),
                    actual,
                });
            }
        }

        if preview {
            let restored = targets
                .iter()
                .map(|f| RestoredFile {
                    path: f.original_path.clone(),
                    bytes_written: f.size,
                })
                .collect();
            return Ok(RestoreReport {
                backup_id: backup_id.to_string(),
                preview: true,
                restored,
                safety_backup_id: None,
            });
        }

        let target_paths: Vec<PathBuf> = targets.iter().map(|f| f.original_path.clone()).collect();
        let safety = self
            .create(&target_paths, "restore-safety", backup_id)
            .await
            .map_err(|e| BackupError::RestoreFailed {
                detail: format!("could not snapshot current state before restore: {e}"),
                safety_backup_id: String::new(),
            })?;

        let mut restored = Vec::with_capacity(targets.len());
        for file in &targets {
            let bytes = tokio::fs::read(&file.stored_path).await.map_err(|e| {
                BackupError::RestoreFailed {
                    detail: format!("{e}"),
                    safety_backup_id: safety.backup_id.clone(),
                }
            })?;
            ambit_io::atomic_write(&file.original_path, &bytes)
                .await
                .map_err(|e| BackupError::RestoreFailed {
                    detail: format!("{e}"),
                    safety_backup_id: safety.backup_id.clone(),
                })?;
            restored.push(RestoredFile {
                path: file.original_path.clone(),
                bytes_written: bytes.len() as u64,
            });
        }

        debug!(backup_id, safety = %safety.backup_id, "restore complete");

        Ok(RestoreReport {
            backup_id: backup_id.to_string(),
            preview: false,
            restored,
            safety_backup_id: Some(safety.backup_id),
        })
    }

    /// Purge entries older than `max_age_days`, plus any beyond
    /// `max_count` (oldest-first), in a single combined pass.
    pub async fn cleanup(&self, dry_run: bool) -> Result<CleanupReport, BackupError> {
        let all = self.list(&ListFilter::default()).await?;
        let cutoff = now_unix() - (self.max_age_days as i64 * 86_400);

        let mut to_remove: Vec<&BackupSummary> = all.iter().filter(|e| e.timestamp < cutoff).collect();
        if all.len() > self.max_count {
            for extra in &all[self.max_count..] {
                if !to_remove.iter().any(|e| e.backup_id == extra.backup_id) {
                    to_remove.push(extra);
                }
            }
        }

        let mut report = CleanupReport {
            dry_run,
            ..Default::default()
        };

        for entry in to_remove {
            report.removed_ids.push(entry.backup_id.clone());
            report.reclaimed_bytes += entry.total_size;
            if !dry_run {
                let dir = self.entry_dir(&entry.backup_id);
                if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
                    warn!(backup_id = %entry.backup_id, error = %e, "failed to remove backup during cleanup");
                }
            }
        }

        if !dry_run {
            self.invalidate_index().await;
        }

        Ok(report)
    }
}

fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn write(path: &Path, content: &str) {
        tokio::fs::write(path, content).await.unwrap();
    }

    #[tokio::test]
    async fn round_trips_a_single_file() {
        let work = tempfile::tempdir().unwrap();
        let store = tempfile::tempdir().unwrap();
        let file = work.path().join("a.txt");
        write(&file, "original").await;

        let manager = BackupManager::with_defaults(store.path().to_path_buf());
        let entry = manager
            .create(&[file.clone()], "edit", "test edit")
            .await
            .unwrap();

        assert_eq!(entry.files.len(), 1);
        let stored = &entry.files[0];
        let stored_bytes = tokio::fs::read(&stored.stored_path).await.unwrap();
        assert_eq!(sha256_hex(&stored_bytes), stored.sha256);

        write(&file, "mutated").await;
        let report = manager.restore(&entry.backup_id, None, false).await.unwrap();
        assert!(!report.preview);
        assert!(report.safety_backup_id.is_some());

        assert_eq!(tokio::fs::read_to_string(&file).await.unwrap(), "original");
    }

    #[tokio::test]
    async fn preview_restore_does_not_write() {
        let work = tempfile::tempdir().unwrap();
        let store = tempfile::tempdir().unwrap();
        let file = work.path().join("a.txt");
        write(&file, "v1").await;

        let manager = BackupManager::with_defaults(store.path().to_path_buf());
        let entry = manager.create(&[file.clone()], "edit", "").await.unwrap();

        write(&file, "v2").await;
        let report = manager.restore(&entry.backup_id, None, true).await.unwrap();
        assert!(report.preview);
        assert!(report.safety_backup_id.is_none());
        assert_eq!(tokio::fs::read_to_string(&file).await.unwrap(), "v2");
    }

    #[tokio::test]
    async fn list_orders_newest_first() {
        let work = tempfile::tempdir().unwrap();
        let store = tempfile::tempdir().unwrap();
        let file = work.path().join("a.txt");
        write(&file, "v1").await;

        let manager = BackupManager::with_defaults(store.path().to_path_buf());
        let first = manager.create(&[file.clone()], "edit", "").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = manager.create(&[file.clone()], "edit", "").await.unwrap();

        let summaries = manager.list(&ListFilter::default()).await.unwrap();
        assert_eq!(summaries[0].backup_id, second.backup_id);
        assert_eq!(summaries[1].backup_id, first.backup_id);
    }

    #[tokio::test]
    async fn cleanup_respects_max_count() {
        let work = tempfile::tempdir().unwrap();
        let store = tempfile::tempdir().unwrap();
        let file = work.path().join("a.txt");
        write(&file, "v1").await;

        let manager = BackupManager::new(store.path().to_path_buf(), 7, 1);
        manager.create(&[file.clone()], "edit", "").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        manager.create(&[file.clone()], "edit", "").await.unwrap();

        let report = manager.cleanup(false).await.unwrap();
        assert_eq!(report.removed_ids.len(), 1);

        let remaining = manager.list(&ListFilter::default()).await.unwrap();
        assert_eq!(remaining.len(), 1);
    }

    #[tokio::test]
    async fn get_rejects_malformed_id() {
        let store = tempfile::tempdir().unwrap();
        let manager = BackupManager::with_defaults(store.path().to_path_buf());
        assert!(manager.get("../../etc/passwd").await.is_err());
    }

    #[tokio::test]
    async fn compare_reports_similarity() {
        let work = tempfile::tempdir().unwrap();
        let store = tempfile::tempdir().unwrap();
        let file = work.path().join("a.txt");
        write(&file, "line one\nline two\n").await;

        let manager = BackupManager::with_defaults(store.path().to_path_buf());
        let entry = manager.create(&[file.clone()], "edit", "").await.unwrap();

        write(&file, "line one\nline TWO\n").await;
        let report = manager.compare(&entry.backup_id, &file).await.unwrap();
        assert!(!report.identical);
        assert!(report.similarity_percent > 0.0);
    }
}
