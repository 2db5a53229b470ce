// Refscope - reference and revision metadata service
// Copyright (C) 2026 Refscope Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

//! Object Database (ODB)
//!
//! Content-addressable object storage over a [`StorageBackend`]:
//! - **Addressing**: SHA-1 of the framed object, stored at
//!   `objects/{first2hex}/{remaining38hex}`
//! - **Deduplication**: writing existing content is a no-op
//! - **Caching**: decoded objects are kept in a moka cache; objects are
//!   immutable so entries never go stale
//! - **Integrity**: every read from storage is re-hashed against its id

use crate::{MetaError, MetaResult, ObjectCursor, ObjectKind, ObjectStore, Oid, RawObject};
use moka::sync::Cache;
use refscope_storage::StorageBackend;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Snapshot of object database counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OdbStats {
    /// Reads answered from the cache
    pub cache_hits: u64,
    /// Reads that went to storage
    pub cache_misses: u64,
    /// Objects newly written to storage
    pub objects_written: u64,
    /// Writes skipped because the object already existed
    pub dedup_hits: u64,
}

impl OdbStats {
    /// Fraction of reads served from cache
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct Counters {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    objects_written: AtomicU64,
    dedup_hits: AtomicU64,
}

/// Object database with content-addressable storage
///
/// # Examples
///
/// ```
/// use refscope_core::{ObjectDatabase, ObjectKind, ObjectStore};
/// use refscope_storage::MemoryBackend;
/// use std::sync::Arc;
///
/// let odb = ObjectDatabase::new(Arc::new(MemoryBackend::new()), 100);
/// let oid = odb.write_object(ObjectKind::Blob, b"Hello, refscope!")?;
/// assert_eq!(odb.read_object(&oid)?.data, b"Hello, refscope!");
/// assert_eq!(odb.object_kind(&oid)?, ObjectKind::Blob);
/// # Ok::<(), refscope_core::MetaError>(())
/// ```
pub struct ObjectDatabase {
    storage: Arc<dyn StorageBackend>,
    cache: Cache<Oid, Arc<RawObject>>,
    counters: Counters,
    cursors: Arc<AtomicUsize>,
}

impl ObjectDatabase {
    /// Create an object database caching up to `cache_capacity` objects
    pub fn new(storage: Arc<dyn StorageBackend>, cache_capacity: u64) -> Self {
        info!(capacity = cache_capacity, "Creating ObjectDatabase");
        Self {
            storage,
            cache: Cache::new(cache_capacity),
            counters: Counters::default(),
            cursors: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Storage key of an object
    pub fn object_key(oid: &Oid) -> String {
        format!("objects/{}", oid.to_path())
    }

    /// Check if an object exists
    pub fn exists(&self, oid: &Oid) -> MetaResult<bool> {
        if self.cache.contains_key(oid) {
            return Ok(true);
        }
        Ok(self.storage.exists(&Self::object_key(oid))?)
    }

    /// Number of cursors currently held by readers
    pub fn open_cursors(&self) -> usize {
        self.cursors.load(Ordering::Acquire)
    }

    /// Counter snapshot
    pub fn stats(&self) -> OdbStats {
        OdbStats {
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.counters.cache_misses.load(Ordering::Relaxed),
            objects_written: self.counters.objects_written.load(Ordering::Relaxed),
            dedup_hits: self.counters.dedup_hits.load(Ordering::Relaxed),
        }
    }

    /// Drop every cached object
    pub fn clear_cache(&self) {
        self.cache.invalidate_all();
    }
}

impl ObjectStore for ObjectDatabase {
    fn read_object(&self, oid: &Oid) -> MetaResult<RawObject> {
        if let Some(cached) = self.cache.get(oid) {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok((*cached).clone());
        }
        self.counters.cache_misses.fetch_add(1, Ordering::Relaxed);

        let key = Self::object_key(oid);
        let bytes = self
            .storage
            .get(&key)
            .map_err(|e| MetaError::from_storage(e, &format!("object {oid}")))?;
        let raw = RawObject::decode(&bytes)?;

        let computed = raw.id();
        if computed != *oid {
            warn!(expected = %oid, computed = %computed, "Object integrity check failed");
            return Err(MetaError::corruption(format!(
                "object {oid} hashes to {computed}"
            )));
        }

        debug!(oid = %oid, kind = %raw.kind, size = raw.data.len(), "Read object");
        let raw = Arc::new(raw);
        self.cache.insert(*oid, Arc::clone(&raw));
        Ok((*raw).clone())
    }

    fn write_object(&self, kind: ObjectKind, payload: &[u8]) -> MetaResult<Oid> {
        let raw = RawObject::new(kind, payload.to_vec());
        let oid = raw.id();
        let key = Self::object_key(&oid);

        if self.storage.exists(&key)? {
            debug!(oid = %oid, "Object already exists (deduplicated)");
            self.counters.dedup_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.storage.put(&key, &raw.encode())?;
            self.counters.objects_written.fetch_add(1, Ordering::Relaxed);
            debug!(oid = %oid, kind = %kind, size = payload.len(), "Stored new object");
        }

        self.cache.insert(oid, Arc::new(raw));
        Ok(oid)
    }

    fn open_cursor(&self) -> ObjectCursor {
        ObjectCursor::tracked(&self.cursors)
    }
}

impl fmt::Debug for ObjectDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectDatabase")
            .field("storage", &self.storage)
            .field("cached", &self.cache.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refscope_storage::MemoryBackend;

    fn odb() -> (MemoryBackend, ObjectDatabase) {
        let backend = MemoryBackend::new();
        let odb = ObjectDatabase::new(Arc::new(backend.clone()), 16);
        (backend, odb)
    }

    #[test]
    fn test_write_and_read() {
        let (backend, odb) = odb();
        let oid = odb.write_object(ObjectKind::Blob, b"hello").unwrap();

        assert_eq!(oid.to_hex(), "b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0");
        assert!(backend.exists("objects/b6/fc4c620b67d95f953a5c1c1230aaab5db5a1b0").unwrap());
        assert_eq!(odb.read_object(&oid).unwrap().data, b"hello");
    }

    #[test]
    fn test_deduplication() {
        let (backend, odb) = odb();
        let a = odb.write_object(ObjectKind::Blob, b"same").unwrap();
        let b = odb.write_object(ObjectKind::Blob, b"same").unwrap();
        assert_eq!(a, b);
        assert_eq!(backend.len(), 1);

        let stats = odb.stats();
        assert_eq!(stats.objects_written, 1);
        assert_eq!(stats.dedup_hits, 1);
    }

    #[test]
    fn test_missing_object() {
        let (_backend, odb) = odb();
        let err = odb.read_object(&Oid::hash(b"nope")).unwrap_err();
        assert!(err.is_not_found());
        assert!(!odb.exists(&Oid::hash(b"nope")).unwrap());
    }

    #[test]
    fn test_cache_hit_after_read() {
        let (_backend, odb) = odb();
        let oid = odb.write_object(ObjectKind::Blob, b"cached").unwrap();
        odb.clear_cache();

        odb.read_object(&oid).unwrap();
        odb.read_object(&oid).unwrap();
        let stats = odb.stats();
        assert_eq!(stats.cache_misses, 1);
        assert_eq!(stats.cache_hits, 1);
        assert!(stats.hit_rate() > 0.4);
    }

    #[test]
    fn test_tampered_object_is_corruption() {
        let (backend, odb) = odb();
        let oid = odb.write_object(ObjectKind::Blob, b"original").unwrap();
        backend
            .put(&ObjectDatabase::object_key(&oid), b"blob 8\0tampered")
            .unwrap();
        odb.clear_cache();

        assert!(odb.read_object(&oid).unwrap_err().is_corruption());
    }

    #[test]
    fn test_get_commit_rejects_blob() {
        let (_backend, odb) = odb();
        let oid = odb.write_object(ObjectKind::Blob, b"not a commit").unwrap();
        assert!(odb.get_commit(&oid).unwrap_err().is_invalid_object());
    }

    #[test]
    fn test_cursor_tracking() {
        let (_backend, odb) = odb();
        let cursor = odb.open_cursor();
        assert_eq!(odb.open_cursors(), 1);
        drop(cursor);
        assert_eq!(odb.open_cursors(), 0);
    }
}
