//! LRU cache of compiled regular expressions, keyed by pattern string.

use std::sync::{Arc, Mutex};

use regex::Regex;
use thiserror::Error;

use crate::lru::LruCache;

/// Default capacity: at most ~100 compiled patterns retained.
pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Debug, Error)]
pub enum RegexCacheError {
    #[error("invalid regex pattern '{pattern}': {source}")]
    Invalid {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Thread-safe LRU of compiled patterns. Lookup key is the pattern string
/// verbatim, so two logically-equivalent-but-differently-written patterns
/// are compiled separately.
pub struct RegexCache {
    inner: Mutex<LruCache<String, Arc<Regex>>>,
}

impl RegexCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Get a compiled regex for `pattern`, compiling and caching it on miss.
    pub fn get_or_compile(&self, pattern: &str) -> Result<Arc<Regex>, RegexCacheError> {
        let mut inner = self.inner.lock().expect("regex cache mutex poisoned");
        if let Some(re) = inner.get(&pattern.to_string()) {
            return Ok(Arc::clone(re));
        }
        let compiled = Regex::new(pattern).map_err(|source| RegexCacheError::Invalid {
            pattern: pattern.to_string(),
            source,
        })?;
        let compiled = Arc::new(compiled);
        inner.insert(pattern.to_string(), Arc::clone(&compiled));
        Ok(compiled)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("regex cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RegexCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_and_caches() {
        let cache = RegexCache::new(4);
        let a = cache.get_or_compile(r"\d+").unwrap();
        let b = cache.get_or_compile(r"\d+").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn rejects_invalid_pattern() {
        let cache = RegexCache::new(4);
        assert!(cache.get_or_compile("(").is_err());
    }

    #[test]
    fn evicts_under_pressure() {
        let cache = RegexCache::new(1);
        cache.get_or_compile("a").unwrap();
        cache.get_or_compile("b").unwrap();
        assert_eq!(cache.len(), 1);
    }
}
