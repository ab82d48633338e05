//! Per-path lock striping: serializes concurrent edits to the same file
//! within this process without blocking edits to unrelated files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use once_cell::sync::Lazy;
use tokio::sync::Mutex as AsyncMutex;

static FILE_LOCKS: Lazy<Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Key a path resolves to for locking purposes: its canonical form where
/// possible, so a relative and absolute spelling of the same file share a
/// lock, falling back to the path as given for files that don't exist yet.
fn lock_key(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Fetch (creating if needed) the async mutex striping concurrent access
/// to `path`.
pub fn lock_for(path: &Path) -> Arc<AsyncMutex<()>> {
    let key = lock_key(path);
    let mut locks = FILE_LOCKS.lock().unwrap_or_else(|poison| poison.into_inner());
    locks.entry(key).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
}

/// Drop the cached lock entry for `path` once nobody is expected to need
/// it again, so the table doesn't grow unbounded across a long-lived
/// server process. Safe to call while other handles to the `Arc` are
/// still held; they continue to work, just outside the shared table.
pub fn forget(path: &Path) {
    let key = lock_key(path);
    let mut locks = FILE_LOCKS.lock().unwrap_or_else(|poison| poison.into_inner());
    locks.remove(&key);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_path_yields_the_same_lock() {
        let a = lock_for(Path::new("/tmp/ambit-fs-lock-test-a"));
        let b = lock_for(Path::new("/tmp/ambit-fs-lock-test-a"));
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn different_paths_yield_different_locks() {
        let a = lock_for(Path::new("/tmp/ambit-fs-lock-test-b"));
        let b = lock_for(Path::new("/tmp/ambit-fs-lock-test-c"));
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn lock_serializes_access() {
        let lock = lock_for(Path::new("/tmp/ambit-fs-lock-test-d"));
        let _guard = lock.lock().await;
        assert!(lock.try_lock().is_err());
    }
}
