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

//! Local filesystem storage backend
//!
//! Every key is a relative path below the backend root:
//! ```text
//! root/
//!   HEAD
//!   refs/heads/main
//!   objects/ab/cdef0123...
//! ```
//!
//! - Plain writes go to a temp file first and are renamed into place.
//! - Compare-and-swap takes an exclusive `<key>.lock` file (created with
//!   `create_new`), compares, writes the new value into the lock file and
//!   renames it over the key. A lock left by another writer is reported as a
//!   conflict so callers can retry instead of blocking.
//!
//! # Examples
//!
//! ```rust,no_run
//! use refscope_storage::{StorageBackend, local::LocalBackend};
//!
//! let storage = LocalBackend::new(".refscope")?;
//! storage.put("refs/heads/main", b"0123\n")?;
//! let names = storage.list_objects("refs/heads/")?;
//! assert_eq!(names, vec!["refs/heads/main".to_string()]);
//! # Ok::<(), refscope_storage::StorageError>(())
//! ```

use crate::{validate_key, StorageBackend, StorageError, StorageResult};
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, trace};

const LOCK_SUFFIX: &str = ".lock";
const TMP_SUFFIX: &str = ".tmp";

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Local filesystem storage backend
#[derive(Clone)]
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    /// Open (and create if needed) a backend rooted at `root`
    ///
    /// # Errors
    ///
    /// Fails if `root` exists but is not a directory.
    pub fn new<P: AsRef<Path>>(root: P) -> StorageResult<Self> {
        let root = root.as_ref().to_path_buf();

        if !root.exists() {
            fs::create_dir_all(&root)?;
        } else if !root.is_dir() {
            return Err(StorageError::backend(format!(
                "path exists but is not a directory: {}",
                root.display()
            )));
        }

        Ok(LocalBackend { root })
    }

    /// Root directory of this backend
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        if key.ends_with(LOCK_SUFFIX) || key.ends_with(TMP_SUFFIX) {
            return Err(StorageError::invalid_key(format!(
                "reserved suffix in key: {key}"
            )));
        }
        Ok(key.split('/').fold(self.root.clone(), |p, part| p.join(part)))
    }

    fn ensure_parent_dir(path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn read_optional(path: &Path) -> StorageResult<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn collect_keys(&self, dir: &Path, prefix: &str, out: &mut Vec<String>) -> StorageResult<()> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;

            if file_type.is_dir() {
                self.collect_keys(&path, prefix, out)?;
            } else if file_type.is_file() {
                let Ok(rel) = path.strip_prefix(&self.root) else {
                    continue;
                };
                let key = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if key.ends_with(LOCK_SUFFIX) || key.ends_with(TMP_SUFFIX) {
                    continue;
                }
                if key.starts_with(prefix) {
                    out.push(key);
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for LocalBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalBackend")
            .field("root", &self.root)
            .finish()
    }
}

/// Exclusive lock on a key, removed on drop unless committed
struct LockFile {
    path: PathBuf,
    file: Option<File>,
}

impl LockFile {
    fn acquire(target: &Path, key: &str) -> StorageResult<Self> {
        let mut name = target.as_os_str().to_owned();
        name.push(LOCK_SUFFIX);
        let path = PathBuf::from(name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => {
                trace!(key = %key, "Acquired lock");
                Ok(Self {
                    path,
                    file: Some(file),
                })
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(key = %key, "Key is locked by another writer");
                Err(StorageError::conflict(key))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write `data` into the lock file and move it over `target`
    fn commit(mut self, target: &Path, data: &[u8]) -> StorageResult<()> {
        if let Some(mut file) = self.file.take() {
            file.write_all(data)?;
            file.sync_all()?;
        }
        fs::rename(&self.path, target)?;
        self.path = PathBuf::new();
        Ok(())
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        self.file.take();
        if !self.path.as_os_str().is_empty() {
            let _ = fs::remove_file(&self.path);
        }
    }
}

impl StorageBackend for LocalBackend {
    fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_path(key)?;
        Self::read_optional(&path)?.ok_or_else(|| StorageError::not_found(key))
    }

    fn put(&self, key: &str, data: &[u8]) -> StorageResult<()> {
        let path = self.key_path(key)?;
        Self::ensure_parent_dir(&path)?;

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(format!(
            ".{}-{}{}",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed),
            TMP_SUFFIX
        ));
        let tmp_path = PathBuf::from(tmp_name);

        let mut file = File::create(&tmp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp_path, &path)?;
        trace!(key = %key, size = data.len(), "Stored value");
        Ok(())
    }

    fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.key_path(key)?;
        Ok(path.is_file())
    }

    fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.key_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn list_objects(&self, prefix: &str) -> StorageResult<Vec<String>> {
        // Start at the deepest directory fully named by the prefix.
        let dir = match prefix.rsplit_once('/') {
            Some((dir, _)) if !dir.is_empty() => {
                dir.split('/').fold(self.root.clone(), |p, part| p.join(part))
            }
            _ => self.root.clone(),
        };

        let mut keys = Vec::new();
        self.collect_keys(&dir, prefix, &mut keys)?;
        keys.sort();
        Ok(keys)
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&[u8]>,
        new: Option<&[u8]>,
    ) -> StorageResult<()> {
        let path = self.key_path(key)?;
        Self::ensure_parent_dir(&path)?;

        let lock = LockFile::acquire(&path, key)?;
        let current = Self::read_optional(&path)?;

        if current.as_deref() != expected {
            debug!(key = %key, "Compare-and-swap mismatch");
            return Err(StorageError::conflict(key));
        }

        match new {
            Some(data) => lock.commit(&path, data)?,
            None => {
                if current.is_some() {
                    fs::remove_file(&path)?;
                }
                drop(lock);
            }
        }
        Ok(())
    }
}
