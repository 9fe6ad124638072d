//! Session-owned content hash cache

use crate::store::AssetStore;
use modroot_core::{AssetPath, ContentHash, Result};
use std::collections::HashMap;

/// Memoized asset hashes, keyed case-insensitively by path.
///
/// Owned by a resolver session and cleared whenever the documents it was
/// built from may have changed (every rescan and every execute).
#[derive(Debug, Default)]
pub struct HashCache {
    hashes: HashMap<String, ContentHash>,
}

impl HashCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash of an asset, computed through the store on first request
    pub fn hash<S: AssetStore + ?Sized>(&mut self, store: &S, path: &AssetPath) -> Result<ContentHash> {
        let key = path.key();
        if let Some(hash) = self.hashes.get(&key) {
            return Ok(*hash);
        }
        let hash = store.content_hash(path)?;
        self.hashes.insert(key, hash);
        Ok(hash)
    }

    /// Byte equality through the cache; unreadable assets compare unequal
    pub fn content_equals<S: AssetStore + ?Sized>(
        &mut self,
        store: &S,
        a: &AssetPath,
        b: &AssetPath,
    ) -> bool {
        if a.same_as(b) {
            return store.exists(a);
        }
        match (self.hash(store, a), self.hash(store, b)) {
            (Ok(ha), Ok(hb)) => ha == hb,
            _ => false,
        }
    }

    /// Record a hash already known to the caller (e.g. right after a copy)
    pub fn insert(&mut self, path: &AssetPath, hash: ContentHash) {
        self.hashes.insert(path.key(), hash);
    }

    pub fn invalidate(&mut self, path: &AssetPath) {
        self.hashes.remove(&path.key());
    }

    pub fn clear(&mut self) {
        self.hashes.clear();
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}
