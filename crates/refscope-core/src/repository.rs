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

//! Repository handle
//!
//! Wires a storage backend, the object and reference databases and the
//! configuration into the four query components. A repository on disk lives
//! in a `.refscope/` directory:
//!
//! ```text
//! .refscope/
//!   HEAD                      ref: refs/heads/main
//!   config.toml
//!   objects/ab/cdef...        framed objects
//!   refs/heads/main           <40 hex>
//! ```

use crate::refs::validate_ref_name;
use crate::revision::resolve_revision;
use crate::{
    AncestryOracle, Head, MetaError, MetaResult, NotesIndex, ObjectDatabase, ObjectStore, Oid,
    RefDatabase, RefStore, RefTarget, ReferenceStore, RevWalk, WalkOptions, HEAD,
};
use refscope_config::Config;
use refscope_storage::{LocalBackend, StorageBackend};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Name of the repository metadata directory
pub const REPO_DIR_NAME: &str = ".refscope";

/// An open repository
#[derive(Debug, Clone)]
pub struct Repository {
    root: Option<PathBuf>,
    objects: Arc<ObjectDatabase>,
    refs: Arc<RefDatabase>,
    config: Arc<Config>,
    references: ReferenceStore,
    ancestry: AncestryOracle,
    notes: NotesIndex,
}

impl Repository {
    /// Create a repository in `path`, with HEAD on an unborn branch
    ///
    /// `initial_branch` overrides `core.default_branch`.
    ///
    /// # Errors
    ///
    /// [`MetaError::AlreadyExists`] if `path` already holds a repository.
    pub fn init(path: impl AsRef<Path>, initial_branch: Option<&str>) -> MetaResult<Self> {
        let root = path.as_ref().to_path_buf();
        let repo_dir = root.join(REPO_DIR_NAME);
        if repo_dir.exists() {
            return Err(MetaError::AlreadyExists(format!(
                "repository at {}",
                root.display()
            )));
        }

        let mut config = Config::load(&repo_dir)?;
        if let Some(branch) = initial_branch {
            config.core.default_branch = branch.to_string();
        }
        let branch_ref = format!("refs/heads/{}", config.core.default_branch);
        validate_ref_name(&branch_ref)?;

        let storage = Arc::new(LocalBackend::new(&repo_dir)?);
        config.save(&repo_dir)?;

        let repo = Self::assemble(Some(root), storage, config);
        repo.refs
            .write_ref(HEAD, None, Some(&RefTarget::Symbolic(branch_ref.clone())))?;

        info!(path = %repo_dir.display(), branch = %branch_ref, "Initialized repository");
        Ok(repo)
    }

    /// Open the repository containing `path` (searching parent directories)
    ///
    /// # Errors
    ///
    /// [`MetaError::NotFound`] if no `.refscope` directory is found.
    pub fn open(path: impl AsRef<Path>) -> MetaResult<Self> {
        let root = Self::discover(path.as_ref())?;
        let repo_dir = root.join(REPO_DIR_NAME);
        let config = Config::load(&repo_dir)?;
        let storage = Arc::new(LocalBackend::new(&repo_dir)?);

        debug!(path = %repo_dir.display(), "Opened repository");
        Ok(Self::assemble(Some(root), storage, config))
    }

    /// Find the directory holding `.refscope`, starting at `start`
    pub fn discover(start: &Path) -> MetaResult<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            if current.join(REPO_DIR_NAME).is_dir() {
                return Ok(current);
            }
            if !current.pop() {
                return Err(MetaError::not_found(format!(
                    "refscope repository at {} or any parent",
                    start.display()
                )));
            }
        }
    }

    /// Check if `path` itself holds a repository that opens cleanly
    ///
    /// Unlike [`Repository::open`], parent directories are not searched.
    pub fn is_repository(path: impl AsRef<Path>) -> bool {
        let repo_dir = path.as_ref().join(REPO_DIR_NAME);
        repo_dir.is_dir() && Config::load(&repo_dir).is_ok()
    }

    /// Build a repository over an arbitrary backend (no directory on disk)
    pub fn from_backend(storage: Arc<dyn StorageBackend>, config: Config) -> Self {
        Self::assemble(None, storage, config)
    }

    fn assemble(root: Option<PathBuf>, storage: Arc<dyn StorageBackend>, config: Config) -> Self {
        let capacity = config.core.cache_capacity;
        let config = Arc::new(config);
        let objects = Arc::new(ObjectDatabase::new(Arc::clone(&storage), capacity));
        let refs = Arc::new(RefDatabase::new(storage));

        let references = ReferenceStore::new(
            Arc::clone(&refs) as Arc<dyn RefStore>,
            Arc::clone(&objects) as Arc<dyn ObjectStore>,
            Arc::clone(&config),
        );
        let ancestry =
            AncestryOracle::new(Arc::clone(&objects) as Arc<dyn ObjectStore>, capacity);
        let notes = NotesIndex::new(&references);

        Self {
            root,
            objects,
            refs,
            config,
            references,
            ancestry,
            notes,
        }
    }

    /// Working directory containing `.refscope`, if on disk
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Alias of [`Repository::root`]
    pub fn workdir(&self) -> Option<&Path> {
        self.root()
    }

    /// Effective configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Object database
    pub fn objects(&self) -> &Arc<ObjectDatabase> {
        &self.objects
    }

    /// Reference database
    pub fn refs(&self) -> &Arc<RefDatabase> {
        &self.refs
    }

    /// Reference store
    pub fn references(&self) -> &ReferenceStore {
        &self.references
    }

    /// Ancestry oracle
    pub fn ancestry(&self) -> &AncestryOracle {
        &self.ancestry
    }

    /// Notes index
    pub fn notes(&self) -> &NotesIndex {
        &self.notes
    }

    /// Current HEAD; `None` if unborn
    pub fn head(&self) -> MetaResult<Option<Head>> {
        self.references.head()
    }

    /// Check if HEAD is detached
    pub fn is_head_detached(&self) -> MetaResult<bool> {
        self.references.is_head_detached()
    }

    /// Check if the repository has no reachable references
    pub fn is_empty(&self) -> MetaResult<bool> {
        self.references.is_empty()
    }

    /// Resolve a revision specifier such as `main~2` to a commit id
    pub fn resolve_revision(&self, revision: &str) -> MetaResult<Oid> {
        resolve_revision(&self.references, revision)
    }

    /// Walk the history reachable from `start`
    pub fn walk(&self, start: Oid, options: WalkOptions) -> MetaResult<RevWalk> {
        RevWalk::new(Arc::clone(&self.objects) as Arc<dyn ObjectStore>, start, options)
    }

    /// Number of commits reachable from HEAD (0 when unborn)
    pub fn count_revisions(&self) -> MetaResult<usize> {
        let Some(head) = self.head_oid()? else {
            return Ok(0);
        };
        let mut count = 0;
        for commit in self.walk(head, WalkOptions::default())? {
            commit?;
            count += 1;
        }
        Ok(count)
    }

    /// Ids of all commits reachable from HEAD, newest first
    ///
    /// The count from a first pass only sizes the result; HEAD is resolved
    /// again for the fill pass, so a HEAD that moved in between is reflected
    /// in full.
    pub fn revisions(&self) -> MetaResult<Vec<Oid>> {
        let hint = self.count_revisions()?;
        let mut ids = Vec::with_capacity(hint);

        let Some(head) = self.head_oid()? else {
            return Ok(ids);
        };
        for commit in self.walk(head, WalkOptions::default())? {
            ids.push(commit?.id);
        }

        if ids.len() != hint {
            debug!(hint, actual = ids.len(), "HEAD moved between count and fill");
        }
        Ok(ids)
    }

    fn head_oid(&self) -> MetaResult<Option<Oid>> {
        match self.references.resolve(HEAD) {
            Ok(oid) => Ok(Some(oid)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
