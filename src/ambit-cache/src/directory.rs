//! Directory-listing cache, invalidated by directory mtime and a secondary TTL.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant, SystemTime};

/// Secondary TTL bound, in addition to mtime comparison: ~3 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(180);

struct Entry {
    listing: String,
    dir_mtime: SystemTime,
    cached_at: Instant,
}

/// Cache of rendered directory listings.
///
/// An entry is only served if the directory's current mtime equals the
/// mtime recorded when the listing was produced, *and* the entry has not
/// exceeded its TTL.
pub struct DirectoryCache {
    ttl: Duration,
    entries: Mutex<HashMap<PathBuf, Entry>>,
}

impl DirectoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, dir: &Path, current_mtime: SystemTime) -> Option<String> {
        let mut entries = self.entries.lock().expect("directory cache mutex poisoned");
        let fresh = match entries.get(dir) {
            Some(e) => e.dir_mtime == current_mtime && e.cached_at.elapsed() < self.ttl,
            None => return None,
        };
        if fresh {
            entries.get(dir).map(|e| e.listing.clone())
        } else {
            entries.remove(dir);
            None
        }
    }

    pub fn put(&self, dir: PathBuf, listing: String, dir_mtime: SystemTime) {
        let mut entries = self.entries.lock().expect("directory cache mutex poisoned");
        entries.insert(
            dir,
            Entry {
                listing,
                dir_mtime,
                cached_at: Instant::now(),
            },
        );
    }

    pub fn invalidate(&self, dir: &Path) {
        self.entries
            .lock()
            .expect("directory cache mutex poisoned")
            .remove(dir);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("directory cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DirectoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_requires_matching_mtime() {
        let cache = DirectoryCache::new(Duration::from_secs(60));
        let dir = PathBuf::from("/tmp/dir");
        let t0 = SystemTime::now();
        cache.put(dir.clone(), "a.txt\nb.txt".to_string(), t0);
        assert_eq!(cache.get(&dir, t0).as_deref(), Some("a.txt\nb.txt"));

        let t1 = t0 + Duration::from_secs(5);
        assert!(cache.get(&dir, t1).is_none());
    }

    #[test]
    fn expires_after_ttl_even_with_same_mtime() {
        let cache = DirectoryCache::new(Duration::from_millis(1));
        let dir = PathBuf::from("/tmp/dir");
        let t0 = SystemTime::now();
        cache.put(dir.clone(), "listing".to_string(), t0);
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get(&dir, t0).is_none());
    }
}
