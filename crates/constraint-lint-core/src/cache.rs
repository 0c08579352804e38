//! In-memory result cache keyed by path and content hash.
//!
//! An entry is only returned when the stored hash equals the hash of the
//! content just read, so edits invalidate it without any explicit step.
//! Entries live as long as the engine.
//!
//! [`ResultCache::clear`] starts a new generation. Inserts carry the generation
//! their computation started in and are dropped if it has since moved on, so
//! a worker still running against the old rules cannot refill the cache.

use crate::types::ValidationResult;

use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Hex SHA-256 of `content`.
#[must_use]
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone)]
struct Entry {
    content_hash: String,
    result: ValidationResult,
}

#[derive(Debug, Default)]
struct Inner {
    generation: u64,
    entries: HashMap<PathBuf, Entry>,
}

/// Thread-safe map from path to the last result computed for it.
#[derive(Debug, Default)]
pub struct ResultCache {
    inner: Mutex<Inner>,
}

impl ResultCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached result if `content_hash` matches what was stored for `path`.
    #[must_use]
    pub fn get(&self, path: &Path, content_hash: &str) -> Option<ValidationResult> {
        self.inner
            .lock()
            .entries
            .get(path)
            .filter(|e| e.content_hash == content_hash)
            .map(|e| e.result.clone())
    }

    /// Current generation; pass it back to [`ResultCache::insert`].
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    /// Stores a result computed during `generation`, replacing whatever was
    /// cached for `path`.
    ///
    /// Returns `false` and stores nothing if the cache was cleared since.
    pub fn insert(
        &self,
        path: &Path,
        content_hash: String,
        generation: u64,
        result: ValidationResult,
    ) -> bool {
        let mut inner = self.inner.lock();
        if inner.generation != generation {
            return false;
        }
        inner.entries.insert(
            path.to_path_buf(),
            Entry {
                content_hash,
                result,
            },
        );
        true
    }

    /// Drops every entry and starts a new generation.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.generation += 1;
    }

    /// Number of cached paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn hash_is_stable_and_content_sensitive() {
        assert_eq!(hash_content("class A {}"), hash_content("class A {}"));
        assert_ne!(hash_content("class A {}"), hash_content("class B {}"));
        assert_eq!(hash_content("").len(), 64);
    }

    #[test]
    fn hit_requires_matching_hash() {
        let cache = ResultCache::new();
        let path = Path::new("a.ts");
        let h1 = hash_content("v1");
        cache.insert(path, h1.clone(), 0, ValidationResult::new(path, vec![], Duration::ZERO));

        assert!(cache.get(path, &h1).is_some());
        assert!(cache.get(path, &hash_content("v2")).is_none());
        assert!(cache.get(Path::new("b.ts"), &h1).is_none());
    }

    #[test]
    fn newer_content_replaces_entry() {
        let cache = ResultCache::new();
        let path = Path::new("a.ts");
        cache.insert(path, hash_content("v1"), 0, ValidationResult::new(path, vec![], Duration::ZERO));
        cache.insert(path, hash_content("v2"), 0, ValidationResult::new(path, vec![], Duration::ZERO));
        assert_eq!(cache.len(), 1);
        assert!(cache.get(path, &hash_content("v1")).is_none());

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn insert_from_before_clear_is_dropped() {
        let cache = ResultCache::new();
        let path = Path::new("a.ts");
        let started = cache.generation();

        cache.clear();
        assert_ne!(cache.generation(), started);
        let stale = ValidationResult::new(path, vec![], Duration::ZERO);
        assert!(!cache.insert(path, hash_content("v1"), started, stale.clone()));
        assert!(cache.get(path, &hash_content("v1")).is_none());

        assert!(cache.insert(path, hash_content("v1"), cache.generation(), stale));
        assert!(cache.get(path, &hash_content("v1")).is_some());
    }
}
