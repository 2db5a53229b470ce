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

//! Labelled commit graphs for tests
//!
//! Commits are named by short labels and get strictly increasing committer
//! timestamps in creation order unless a time is given explicitly.
//!
//! # Example
//! ```
//! use refscope_test_utils::GraphBuilder;
//!
//! let mut g = GraphBuilder::new();
//! g.commit("c1", &[]);
//! g.commit("c2", &["c1"]);
//! g.branch("main", "c2");
//! g.head_to("main");
//! assert!(g.repo().ancestry().is_descendant(&g.oid("c2"), &g.oid("c1")).unwrap());
//! ```

use chrono::{TimeZone, Utc};
use refscope_config::Config;
use refscope_core::{
    Commit, ObjectKind, Oid, RefStore, RefTarget, Repository, Signature, Tag, Tree, HEAD,
};
use refscope_storage::MemoryBackend;
use std::collections::HashMap;
use std::sync::Arc;

/// First timestamp handed out, in seconds since the epoch
const BASE_TIME: i64 = 1_700_000_000;

/// Builds commits, refs and tags on an in-memory repository
pub struct GraphBuilder {
    repo: Repository,
    backend: MemoryBackend,
    tree: Oid,
    labels: HashMap<String, Oid>,
    clock: i64,
}

impl GraphBuilder {
    /// Empty graph with default configuration
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Empty graph with `config`
    pub fn with_config(config: Config) -> Self {
        let backend = MemoryBackend::new();
        let repo = Repository::from_backend(Arc::new(backend.clone()), config);
        let tree = Tree::new()
            .write(&**repo.objects())
            .expect("Failed to write empty tree");
        Self {
            repo,
            backend,
            tree,
            labels: HashMap::new(),
            clock: BASE_TIME,
        }
    }

    /// Repository the graph lives in
    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    /// Raw backend, for tests that tamper with storage
    pub fn backend(&self) -> &MemoryBackend {
        &self.backend
    }

    /// Signature at `secs` seconds since the epoch
    pub fn signature(secs: i64) -> Signature {
        Signature::new(
            "Test User",
            "test@example.com",
            Utc.timestamp_opt(secs, 0).single().expect("valid timestamp"),
        )
    }

    /// Create commit `label` with the given parent labels
    pub fn commit(&mut self, label: &str, parents: &[&str]) -> Oid {
        self.clock += 60;
        let time = self.clock;
        self.commit_at(label, parents, time)
    }

    /// Create commit `label` with an explicit committer time
    pub fn commit_at(&mut self, label: &str, parents: &[&str], secs: i64) -> Oid {
        let parents = parents.iter().map(|p| self.oid(p)).collect();
        self.commit_with_parent_ids(label, parents, secs)
    }

    /// Create commit `label` whose parents are raw ids (possibly missing)
    pub fn commit_with_parent_ids(&mut self, label: &str, parents: Vec<Oid>, secs: i64) -> Oid {
        let sig = Self::signature(secs);
        let oid = Commit::with_parents(self.tree, parents, sig.clone(), sig, label)
            .write(&**self.repo.objects())
            .expect("Failed to write commit");
        self.labels.insert(label.to_string(), oid);
        oid
    }

    /// Linear history `prefix0 <- prefix1 <- ...`, returning ids oldest first
    pub fn linear(&mut self, prefix: &str, len: usize) -> Vec<Oid> {
        let mut ids = Vec::with_capacity(len);
        for i in 0..len {
            let label = format!("{prefix}{i}");
            let parent = i.checked_sub(1).map(|p| format!("{prefix}{p}"));
            let parents: Vec<&str> = parent.iter().map(String::as_str).collect();
            ids.push(self.commit(&label, &parents));
        }
        ids
    }

    /// Id of a labelled commit or tag
    pub fn oid(&self, label: &str) -> Oid {
        *self
            .labels
            .get(label)
            .unwrap_or_else(|| panic!("unknown label '{label}'"))
    }

    /// Point `refs/heads/<name>` at `label`
    pub fn branch(&self, name: &str, label: &str) {
        self.set_ref(&format!("refs/heads/{name}"), RefTarget::Direct(self.oid(label)));
    }

    /// Point `refs/remotes/<remote>/<name>` at `label`
    pub fn remote_branch(&self, remote: &str, name: &str, label: &str) {
        self.set_ref(
            &format!("refs/remotes/{remote}/{name}"),
            RefTarget::Direct(self.oid(label)),
        );
    }

    /// Lightweight tag `refs/tags/<name>` at `label`
    pub fn lightweight_tag(&self, name: &str, label: &str) {
        self.set_ref(&format!("refs/tags/{name}"), RefTarget::Direct(self.oid(label)));
    }

    /// Annotated tag `refs/tags/<name>` at `label`; the tag object is
    /// labelled `tag:<name>`
    pub fn annotated_tag(&mut self, name: &str, label: &str, message: &str) -> Oid {
        let tagger = Self::signature(self.clock);
        let tag = Tag::new(name, self.oid(label), ObjectKind::Commit, tagger, message)
            .write(&**self.repo.objects())
            .expect("Failed to write tag");
        self.labels.insert(format!("tag:{name}"), tag);
        self.set_ref(&format!("refs/tags/{name}"), RefTarget::Direct(tag));
        tag
    }

    /// Attach HEAD to `refs/heads/<branch>`
    pub fn head_to(&self, branch: &str) {
        self.set_ref(HEAD, RefTarget::Symbolic(format!("refs/heads/{branch}")));
    }

    /// Detach HEAD at `label`
    pub fn detach(&self, label: &str) {
        self.set_ref(HEAD, RefTarget::Direct(self.oid(label)));
    }

    /// Create or overwrite any reference
    pub fn set_ref(&self, name: &str, target: RefTarget) {
        let refs = self.repo.refs();
        let current = refs.read_ref(name).ok().map(|r| r.target);
        refs.write_ref(name, current.as_ref(), Some(&target))
            .unwrap_or_else(|e| panic!("Failed to set {name}: {e}"));
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
