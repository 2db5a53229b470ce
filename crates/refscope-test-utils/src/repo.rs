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

//! Test repository on disk
//!
//! The CLI has no commit command, so history is written through the core
//! API directly into `.refscope/`.

use crate::graph::GraphBuilder;
use refscope_core::{Commit, Oid, RefStore, RefTarget, Repository, Tree, HEAD, REPO_DIR_NAME};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use tempfile::TempDir;

/// A repository in a temporary directory, removed on drop
///
/// # Example
/// ```
/// use refscope_test_utils::TestRepo;
///
/// let repo = TestRepo::initialized();
/// let first = repo.commit("Initial commit");
/// let second = repo.commit("Second");
/// assert_eq!(repo.open().revisions().unwrap(), vec![second, first]);
/// ```
pub struct TestRepo {
    temp_dir: TempDir,
    clock: AtomicI64,
}

impl TestRepo {
    /// Empty temporary directory (no repository yet)
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
            clock: AtomicI64::new(1_700_000_000),
        }
    }

    /// Temporary directory with a fresh repository on `main`
    pub fn initialized() -> Self {
        let repo = Self::new();
        Repository::init(repo.path(), None).expect("Failed to initialize repository");
        repo
    }

    /// Repository with one commit on `main`
    pub fn with_initial_commit() -> Self {
        let repo = Self::initialized();
        repo.commit("Initial commit");
        repo
    }

    /// Working directory
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The `.refscope` directory
    pub fn refscope_dir(&self) -> PathBuf {
        self.temp_dir.path().join(REPO_DIR_NAME)
    }

    /// Open the repository (re-reads configuration each time)
    pub fn open(&self) -> Repository {
        Repository::open(self.path()).expect("Failed to open repository")
    }

    /// Replace `.refscope/config.toml`
    pub fn write_config(&self, contents: &str) {
        fs::write(self.refscope_dir().join("config.toml"), contents)
            .expect("Failed to write config");
    }

    /// Commit on top of HEAD, moving HEAD's branch (or detached HEAD)
    pub fn commit(&self, message: &str) -> Oid {
        let repo = self.open();
        let refs = repo.refs();

        let head = refs.read_ref(HEAD).expect("HEAD missing");
        let target_ref = head.symbolic_target().unwrap_or(HEAD).to_string();
        let parent = refs.read_ref(&target_ref).ok().map(|r| r.target);
        let parents: Vec<Oid> = parent
            .as_ref()
            .and_then(|t| match t {
                RefTarget::Direct(oid) => Some(*oid),
                RefTarget::Symbolic(_) => None,
            })
            .into_iter()
            .collect();

        let secs = self.clock.fetch_add(60, Ordering::Relaxed);
        let sig = GraphBuilder::signature(secs);
        let tree = Tree::new().write(&**repo.objects()).expect("Failed to write tree");
        let oid = Commit::with_parents(tree, parents, sig.clone(), sig, message)
            .write(&**repo.objects())
            .expect("Failed to write commit");

        refs.write_ref(&target_ref, parent.as_ref(), Some(&RefTarget::Direct(oid)))
            .expect("Failed to move branch");
        oid
    }

    /// Set any reference
    pub fn set_ref(&self, name: &str, target: RefTarget) {
        let repo = self.open();
        let current = repo.refs().read_ref(name).ok().map(|r| r.target);
        repo.refs()
            .write_ref(name, current.as_ref(), Some(&target))
            .expect("Failed to set reference");
    }

    /// Create `refs/heads/<name>` at `oid`
    pub fn branch(&self, name: &str, oid: Oid) {
        self.set_ref(&format!("refs/heads/{name}"), RefTarget::Direct(oid));
    }
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_creation() {
        let repo = TestRepo::new();
        assert!(repo.path().exists());
        assert!(!repo.refscope_dir().exists());
    }

    #[test]
    fn test_commits_advance_branch() {
        let repo = TestRepo::initialized();
        let c1 = repo.commit("one");
        let c2 = repo.commit("two");

        let opened = repo.open();
        assert_eq!(opened.references().resolve("refs/heads/main").unwrap(), c2);
        assert_eq!(opened.resolve_revision("HEAD~1").unwrap(), c1);
    }

    #[test]
    fn test_commit_on_detached_head() {
        let repo = TestRepo::with_initial_commit();
        let base = repo.open().references().resolve(HEAD).unwrap();
        repo.set_ref(HEAD, RefTarget::Direct(base));
        let detached = repo.commit("detached");

        let opened = repo.open();
        assert_eq!(opened.references().resolve(HEAD).unwrap(), detached);
        assert_eq!(opened.references().resolve("refs/heads/main").unwrap(), base);
    }
}
