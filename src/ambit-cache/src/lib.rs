//! Content, directory-listing, and regex caches.
//!
//! Three independent stores share nothing but the eviction idiom (a small
//! capacity-bounded LRU, see [`lru`]): [`content`] caches whole-file bytes
//! keyed by canonical path and invalidated by mtime, [`directory`] caches
//! rendered directory listings the same way plus a TTL, and [`regex_cache`]
//! caches compiled patterns keyed by their source string. [`prefetch`] tracks
//! per-path access counts and schedules best-effort sibling reads once a
//! path gets hot.

mod content;
mod directory;
mod lru;
mod prefetch;
mod regex_cache;

pub use content::{ContentCache, DEFAULT_CAPACITY_BYTES, DEFAULT_ENTRY_LIMIT_BYTES};
pub use directory::{DEFAULT_TTL, DirectoryCache};
pub use prefetch::{AccessTracker, DEFAULT_THRESHOLD, spawn_sibling_prefetch};
pub use regex_cache::{DEFAULT_CAPACITY, RegexCache, RegexCacheError};
