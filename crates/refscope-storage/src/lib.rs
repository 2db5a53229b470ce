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

//! Storage abstraction layer for refscope
//!
//! A small key/value interface that the object database and the reference
//! database are layered on:
//! - [`memory::MemoryBackend`] keeps everything in a map (tests, embedding)
//! - [`local::LocalBackend`] maps keys onto files below a root directory
//!
//! # Core Concepts
//!
//! - **Keys**: `/`-separated relative paths such as `objects/ab/cdef..` or
//!   `refs/heads/main`
//! - **Values**: arbitrary bytes
//! - **Compare-and-swap**: the only way reference values move under
//!   concurrent writers
//!
//! # Examples
//!
//! ```
//! use refscope_storage::{StorageBackend, memory::MemoryBackend};
//!
//! let storage = MemoryBackend::new();
//! storage.put("refs/heads/main", b"abc\n")?;
//!
//! // Only succeeds while the current value is still what we read
//! storage.compare_and_swap("refs/heads/main", Some(&b"abc\n"[..]), Some(&b"def\n"[..]))?;
//! assert_eq!(storage.get("refs/heads/main")?, b"def\n");
//! # Ok::<(), refscope_storage::StorageError>(())
//! ```
//!
//! # Implementation Guide
//!
//! 1. Return [`StorageError::NotFound`] from `get` for absent keys
//! 2. `list_objects` returns sorted keys
//! 3. Deleting a missing key succeeds
//! 4. `compare_and_swap` is atomic with respect to other writers of the
//!    same key and returns [`StorageError::Conflict`] on mismatch

pub mod error;
pub mod local;
pub mod memory;

use std::fmt::Debug;

pub use error::{StorageError, StorageResult};
pub use local::LocalBackend;
pub use memory::MemoryBackend;

/// Storage backend trait for key/value operations
///
/// All implementations must be `Send + Sync` so a single backend can be
/// shared by readers on several threads behind an `Arc`.
pub trait StorageBackend: Send + Sync + Debug {
    /// Retrieve the value stored under `key`
    ///
    /// # Errors
    ///
    /// [`StorageError::NotFound`] if the key doesn't exist,
    /// [`StorageError::InvalidKey`] for malformed keys.
    fn get(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Store `data` under `key`, replacing any previous value
    fn put(&self, key: &str, data: &[u8]) -> StorageResult<()>;

    /// Check whether `key` exists
    fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Remove `key`; removing an absent key is not an error
    fn delete(&self, key: &str) -> StorageResult<()>;

    /// List all keys starting with `prefix`, sorted
    fn list_objects(&self, prefix: &str) -> StorageResult<Vec<String>>;

    /// Atomically replace the value under `key`
    ///
    /// `expected == None` means the key must not exist yet; `new == None`
    /// deletes the key.
    ///
    /// # Errors
    ///
    /// [`StorageError::Conflict`] if the current value differs from
    /// `expected`.
    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new: Option<&[u8]>,
    ) -> StorageResult<()>;
}

/// Reject keys that are empty, absolute or escape the backend root
pub(crate) fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::invalid_key("key cannot be empty"));
    }
    if key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::invalid_key(format!("key must be relative: {key}")));
    }
    if key.split('/').any(|part| part.is_empty() || part == "." || part == "..") {
        return Err(StorageError::invalid_key(format!("malformed key: {key}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trait_is_object_safe() {
        fn _check_object_safe(_: &dyn StorageBackend) {}
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("refs/heads/main").is_ok());
        assert!(validate_key("HEAD").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("refs/../../x").is_err());
        assert!(validate_key("refs//main").is_err());
        assert!(validate_key("refs/heads/").is_err());
    }
}
