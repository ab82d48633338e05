//! File-bytes cache, keyed by canonical path, bounded by total byte size.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

/// Default total capacity of the content cache: ~200 MB.
pub const DEFAULT_CAPACITY_BYTES: u64 = 200 * 1024 * 1024;

/// Entries larger than this are never cached (served straight through C3).
pub const DEFAULT_ENTRY_LIMIT_BYTES: u64 = 1024 * 1024;

struct Entry {
    path: PathBuf,
    bytes: Arc<[u8]>,
    mtime: SystemTime,
}

struct Inner {
    entries: std::collections::HashMap<PathBuf, Entry>,
    /// Recency order, oldest first, rebuilt lazily on eviction.
    order: VecDeque<PathBuf>,
    total_bytes: u64,
}

/// Cache of whole-file byte contents, invalidated by mtime mismatch.
///
/// A cache hit is only served when the directory entry's current mtime
/// equals the mtime recorded at insertion time; any mismatch silently drops
/// the entry and the caller re-reads from disk.
pub struct ContentCache {
    capacity_bytes: u64,
    entry_limit_bytes: u64,
    inner: Mutex<Inner>,
}

impl ContentCache {
    pub fn new(capacity_bytes: u64, entry_limit_bytes: u64) -> Self {
        Self {
            capacity_bytes,
            entry_limit_bytes,
            inner: Mutex::new(Inner {
                entries: std::collections::HashMap::new(),
                order: VecDeque::new(),
                total_bytes: 0,
            }),
        }
    }

    /// Look up `path`'s cached bytes, validating against `current_mtime`.
    /// Returns `None` on miss or on mtime mismatch (which also evicts the
    /// stale entry).
    pub fn get(&self, path: &Path, current_mtime: SystemTime) -> Option<Arc<[u8]>> {
        let mut inner = self.inner.lock().expect("content cache mutex poisoned");
        let stale = match inner.entries.get(path) {
            Some(entry) if entry.mtime == current_mtime => false,
            Some(_) => true,
            None => return None,
        };
        if stale {
            if let Some(entry) = inner.entries.remove(path) {
                inner.total_bytes = inner.total_bytes.saturating_sub(entry.bytes.len() as u64);
            }
            return None;
        }
        inner.order.retain(|p| p != path);
        inner.order.push_back(path.to_path_buf());
        inner.entries.get(path).map(|e| Arc::clone(&e.bytes))
    }

    /// Insert `bytes` for `path`, evicting oldest entries until the cache
    /// fits within `capacity_bytes`. Entries over `entry_limit_bytes` are
    /// not cached at all.
    pub fn put(&self, path: PathBuf, bytes: Arc<[u8]>, mtime: SystemTime) {
        let size = bytes.len() as u64;
        if size > self.entry_limit_bytes {
            return;
        }
        let mut inner = self.inner.lock().expect("content cache mutex poisoned");

        if let Some(old) = inner.entries.remove(&path) {
            inner.total_bytes = inner.total_bytes.saturating_sub(old.bytes.len() as u64);
            inner.order.retain(|p| p != &path);
        }

        while inner.total_bytes + size > self.capacity_bytes {
            let Some(oldest) = inner.order.pop_front() else {
                break;
            };
            if let Some(evicted) = inner.entries.remove(&oldest) {
                inner.total_bytes = inner.total_bytes.saturating_sub(evicted.bytes.len() as u64);
            }
        }

        inner.total_bytes += size;
        inner.order.push_back(path.clone());
        inner.entries.insert(path.clone(), Entry { path, bytes, mtime });
    }

    /// Drop any cached entry for `path`. Called after every write this
    /// process performs.
    pub fn invalidate(&self, path: &Path) {
        let mut inner = self.inner.lock().expect("content cache mutex poisoned");
        if let Some(entry) = inner.entries.remove(path) {
            inner.total_bytes = inner.total_bytes.saturating_sub(entry.bytes.len() as u64);
        }
        inner.order.retain(|p| p != path);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("content cache mutex poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ContentCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY_BYTES, DEFAULT_ENTRY_LIMIT_BYTES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_requires_matching_mtime() {
        let cache = ContentCache::new(1024, 512);
        let t0 = SystemTime::now();
        let path = PathBuf::from("/tmp/a.txt");
        cache.put(path.clone(), Arc::from(b"hello".as_slice()), t0);
        assert!(cache.get(&path, t0).is_some());

        let t1 = t0 + std::time::Duration::from_secs(1);
        assert!(cache.get(&path, t1).is_none());
        // stale entry should have been evicted
        assert!(cache.is_empty());
    }

    #[test]
    fn entries_over_limit_are_never_cached() {
        let cache = ContentCache::new(1024, 4);
        let path = PathBuf::from("/tmp/big.txt");
        let t0 = SystemTime::now();
        cache.put(path.clone(), Arc::from(b"too big".as_slice()), t0);
        assert!(cache.get(&path, t0).is_none());
    }

    #[test]
    fn evicts_oldest_when_over_byte_capacity() {
        let cache = ContentCache::new(10, 10);
        let t0 = SystemTime::now();
        cache.put(PathBuf::from("/a"), Arc::from(b"12345".as_slice()), t0);
        cache.put(PathBuf::from("/b"), Arc::from(b"12345".as_slice()), t0);
        cache.put(PathBuf::from("/c"), Arc::from(b"12345".as_slice()), t0);
        assert!(cache.get(&PathBuf::from("/a"), t0).is_none());
        assert!(cache.get(&PathBuf::from("/c"), t0).is_some());
    }

    #[test]
    fn invalidate_drops_entry() {
        let cache = ContentCache::new(1024, 512);
        let t0 = SystemTime::now();
        let path = PathBuf::from("/tmp/a.txt");
        cache.put(path.clone(), Arc::from(b"hello".as_slice()), t0);
        cache.invalidate(&path);
        assert!(cache.get(&path, t0).is_none());
    }
}
