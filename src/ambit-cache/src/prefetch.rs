//! Access-pattern tracking and best-effort sibling-file prefetch.
//!
//! Once a path has been accessed `threshold` times, the next access
//! schedules a fire-and-forget background read of the other files in the
//! same directory into the content cache. Prefetch never blocks the caller
//! and any failure (permission denied, file vanished, directory too large)
//! is discarded.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::DashMap;

use crate::content::ContentCache;

/// Default access count that triggers a prefetch.
pub const DEFAULT_THRESHOLD: u32 = 3;

/// Maximum number of sibling files prefetched per trigger, to bound the
/// background work a single hot path can cause.
const MAX_SIBLINGS_PER_PREFETCH: usize = 16;

pub struct AccessTracker {
    counts: DashMap<PathBuf, AtomicU32>,
    threshold: u32,
}

impl AccessTracker {
    pub fn new(threshold: u32) -> Self {
        Self {
            counts: DashMap::new(),
            threshold,
        }
    }

    /// Record an access to `path`. Returns `true` exactly once, the first
    /// time the access count reaches `threshold`.
    pub fn record_access(&self, path: &Path) -> bool {
        let counter = self
            .counts
            .entry(path.to_path_buf())
            .or_insert_with(|| AtomicU32::new(0));
        let previous = counter.fetch_add(1, Ordering::Relaxed);
        previous + 1 == self.threshold
    }
}

impl Default for AccessTracker {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

/// Spawn a best-effort background prefetch of `path`'s siblings into
/// `cache`. Must be called from within a Tokio runtime; errors of any kind
/// (missing directory, I/O failure, permission denial) are silently
/// dropped, since this is purely an optimization.
pub fn spawn_sibling_prefetch(cache: Arc<ContentCache>, path: PathBuf) {
    tokio::spawn(async move {
        let Some(dir) = path.parent().map(Path::to_path_buf) else {
            return;
        };
        let Ok(mut entries) = tokio::fs::read_dir(&dir).await else {
            return;
        };

        let mut prefetched = 0usize;
        while prefetched < MAX_SIBLINGS_PER_PREFETCH {
            let Ok(Some(entry)) = entries.next_entry().await else {
                break;
            };
            let sibling = entry.path();
            if sibling == path || !sibling.is_file() {
                continue;
            }
            let Ok(metadata) = tokio::fs::metadata(&sibling).await else {
                continue;
            };
            let Ok(mtime) = metadata.modified() else {
                continue;
            };
            if let Ok(bytes) = tokio::fs::read(&sibling).await {
                cache.put(sibling, Arc::from(bytes.into_boxed_slice()), mtime);
                prefetched += 1;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_exactly_once_at_threshold() {
        let tracker = AccessTracker::new(3);
        let path = PathBuf::from("/tmp/hot.txt");
        assert!(!tracker.record_access(&path));
        assert!(!tracker.record_access(&path));
        assert!(tracker.record_access(&path));
        assert!(!tracker.record_access(&path));
    }

    #[tokio::test]
    async fn prefetch_populates_cache_for_siblings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("target.txt"), b"target").unwrap();
        std::fs::write(dir.path().join("sibling.txt"), b"sibling").unwrap();

        let cache = Arc::new(ContentCache::new(1024 * 1024, 1024 * 1024));
        spawn_sibling_prefetch(Arc::clone(&cache), dir.path().join("target.txt"));

        // Give the spawned task a chance to run.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(cache.len() >= 1);
    }
}
