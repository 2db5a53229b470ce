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

//! In-memory storage backend
//!
//! Thread-safe map behind `Arc<RwLock<..>>`. Clones share the same map, which
//! lets a test hold a second handle and act as a concurrent writer.
//!
//! # Examples
//!
//! ```
//! use refscope_storage::{StorageBackend, memory::MemoryBackend};
//!
//! let storage = MemoryBackend::new();
//! storage.put("objects/ab/cdef", b"payload")?;
//! assert!(storage.exists("objects/ab/cdef")?);
//! assert_eq!(storage.list_objects("objects/")?.len(), 1);
//! # Ok::<(), refscope_storage::StorageError>(())
//! ```

use crate::{validate_key, StorageBackend, StorageError, StorageResult};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

type Store = BTreeMap<String, Vec<u8>>;

/// In-memory storage backend
///
/// Keys are kept in a `BTreeMap`, so prefix listings come out sorted without
/// an extra pass.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    store: Arc<RwLock<Store>>,
}

impl MemoryBackend {
    /// Create a new empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend pre-populated with `initial_data`
    pub fn with_data(initial_data: impl IntoIterator<Item = (String, Vec<u8>)>) -> Self {
        MemoryBackend {
            store: Arc::new(RwLock::new(initial_data.into_iter().collect())),
        }
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.read_store().map(|s| s.len()).unwrap_or(0)
    }

    /// Whether the backend holds no keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of all keys
    pub fn keys(&self) -> Vec<String> {
        self.read_store()
            .map(|s| s.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn read_store(&self) -> StorageResult<RwLockReadGuard<'_, Store>> {
        self.store
            .read()
            .map_err(|_| StorageError::backend("memory store lock poisoned"))
    }

    fn write_store(&self) -> StorageResult<RwLockWriteGuard<'_, Store>> {
        self.store
            .write()
            .map_err(|_| StorageError::backend("memory store lock poisoned"))
    }
}

impl fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("keys", &self.len())
            .finish()
    }
}

impl StorageBackend for MemoryBackend {
    fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        validate_key(key)?;
        self.read_store()?
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::not_found(key))
    }

    fn put(&self, key: &str, data: &[u8]) -> StorageResult<()> {
        validate_key(key)?;
        self.write_store()?.insert(key.to_string(), data.to_vec());
        Ok(())
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        Ok(self.read_store()?.contains_key(key))
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        validate_key(key)?;
        self.write_store()?.remove(key);
        Ok(())
    }

    fn list_objects(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let store = self.read_store()?;
        Ok(store
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new: Option<&[u8]>,
    ) -> StorageResult<()> {
        validate_key(key)?;
        let mut store = self.write_store()?;

        if store.get(key).map(Vec::as_slice) != expected {
            return Err(StorageError::conflict(key));
        }

        match new {
            Some(data) => {
                store.insert(key.to_string(), data.to_vec());
            }
            None => {
                store.remove(key);
            }
        }
        Ok(())
    }
}
