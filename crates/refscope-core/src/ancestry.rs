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

//! Ancestry queries over the commit graph
//!
//! [`AncestryOracle::is_descendant`] answers whether one commit has another
//! in its history. Ancestry is strict: a commit is never its own descendant.
//!
//! # Algorithm
//!
//! 1. Check both ids name commits
//! 2. Breadth-first search from the commit's parents along parent edges
//! 3. Stop as soon as the ancestor is dequeued
//!
//! Commits are immutable, so parent lists and answers are memoized in moka
//! caches shared by all callers of one oracle.
//!
//! Merge bases use the same parent cache: collect the ancestors of one side,
//! intersect with the other, then drop every common ancestor that is an
//! ancestor of another one. Criss-cross histories yield several bases.

use crate::{MetaError, MetaResult, ObjectStore, Oid};
use moka::sync::Cache;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Memoizing ancestry oracle
#[derive(Clone)]
pub struct AncestryOracle {
    objects: Arc<dyn ObjectStore>,
    parents: Cache<Oid, Arc<Vec<Oid>>>,
    answers: Cache<(Oid, Oid), bool>,
}

impl AncestryOracle {
    /// Create an oracle whose caches hold up to `cache_capacity` entries each
    pub fn new(objects: Arc<dyn ObjectStore>, cache_capacity: u64) -> Self {
        Self {
            objects,
            parents: Cache::new(cache_capacity),
            answers: Cache::new(cache_capacity),
        }
    }

    /// Check if `ancestor` is reachable from `commit` through parent edges
    ///
    /// # Errors
    ///
    /// - [`MetaError::InvalidObject`] if either id is missing or not a commit
    /// - [`MetaError::Corruption`] if the search meets a dangling parent
    pub fn is_descendant(&self, commit: &Oid, ancestor: &Oid) -> MetaResult<bool> {
        self.require_commit(commit)?;
        self.require_commit(ancestor)?;

        if commit == ancestor {
            return Ok(false);
        }
        if let Some(answer) = self.answers.get(&(*commit, *ancestor)) {
            return Ok(answer);
        }

        let found = self.search(commit, ancestor)?;
        self.answers.insert((*commit, *ancestor), found);
        if found {
            // ancestry is antisymmetric
            self.answers.insert((*ancestor, *commit), false);
        }

        debug!(commit = %commit, ancestor = %ancestor, found, "Ancestry query");
        Ok(found)
    }

    /// Lowest common ancestors of `a` and `b`
    ///
    /// One id when either commit contains the other (or `a == b`); several
    /// for criss-cross merges; empty when the histories are disjoint.
    pub fn merge_base(&self, a: &Oid, b: &Oid) -> MetaResult<Vec<Oid>> {
        self.require_commit(a)?;
        self.require_commit(b)?;

        if a == b {
            return Ok(vec![*a]);
        }
        if self.is_descendant(b, a)? {
            debug!(ancestor = %a, descendant = %b, "Merge base is the first commit");
            return Ok(vec![*a]);
        }
        if self.is_descendant(a, b)? {
            debug!(ancestor = %b, descendant = %a, "Merge base is the second commit");
            return Ok(vec![*b]);
        }

        let ancestors_a = self.ancestors(a)?;
        let common: Vec<Oid> = self
            .bfs_order(b)?
            .into_iter()
            .filter(|oid| ancestors_a.contains(oid))
            .collect();

        let mut bases = Vec::new();
        for candidate in &common {
            let mut lowest = true;
            for other in &common {
                if candidate != other && self.is_descendant(other, candidate)? {
                    lowest = false;
                    break;
                }
            }
            if lowest {
                bases.push(*candidate);
            }
        }

        debug!(a = %a, b = %b, merge_bases = ?bases, "Found merge base(s)");
        Ok(bases)
    }

    /// Commits only in `local`'s history and commits only in `upstream`'s
    pub fn ahead_behind(&self, local: &Oid, upstream: &Oid) -> MetaResult<(usize, usize)> {
        self.require_commit(local)?;
        self.require_commit(upstream)?;

        let ours = self.ancestors(local)?;
        let theirs = self.ancestors(upstream)?;
        let ahead = ours.difference(&theirs).count();
        let behind = theirs.difference(&ours).count();

        debug!(local = %local, upstream = %upstream, ahead, behind, "Computed divergence");
        Ok((ahead, behind))
    }

    /// Drop all memoized parent lists and answers
    pub fn clear_cache(&self) {
        self.parents.invalidate_all();
        self.answers.invalidate_all();
    }

    fn search(&self, commit: &Oid, ancestor: &Oid) -> MetaResult<bool> {
        let mut visited = HashSet::new();
        let mut queue: VecDeque<Oid> = self.parents_of(commit)?.iter().copied().collect();

        while let Some(current) = queue.pop_front() {
            if current == *ancestor {
                return Ok(true);
            }
            if !visited.insert(current) {
                continue;
            }
            for parent in self.parents_of(&current)?.iter() {
                if !visited.contains(parent) {
                    queue.push_back(*parent);
                }
            }
        }
        Ok(false)
    }

    /// `oid` and every commit reachable from it
    fn ancestors(&self, oid: &Oid) -> MetaResult<HashSet<Oid>> {
        Ok(self.bfs_order(oid)?.into_iter().collect())
    }

    fn bfs_order(&self, oid: &Oid) -> MetaResult<Vec<Oid>> {
        let mut seen = HashSet::from([*oid]);
        let mut order = Vec::new();
        let mut queue = VecDeque::from([*oid]);

        while let Some(current) = queue.pop_front() {
            order.push(current);
            for parent in self.parents_of(&current)?.iter() {
                if seen.insert(*parent) {
                    queue.push_back(*parent);
                }
            }
        }
        Ok(order)
    }

    fn require_commit(&self, oid: &Oid) -> MetaResult<()> {
        if self.parents.contains_key(oid) {
            return Ok(());
        }
        match self.objects.get_commit(oid) {
            Ok(commit) => {
                self.parents.insert(*oid, Arc::new(commit.parents));
                Ok(())
            }
            Err(e) if e.is_not_found() || e.is_invalid_object() => Err(MetaError::invalid_object(
                format!("{oid} does not name a commit"),
            )),
            Err(e) => Err(e),
        }
    }

    /// Parent list of a commit reached during a search
    fn parents_of(&self, oid: &Oid) -> MetaResult<Arc<Vec<Oid>>> {
        if let Some(parents) = self.parents.get(oid) {
            return Ok(parents);
        }
        match self.objects.get_commit(oid) {
            Ok(commit) => {
                let parents = Arc::new(commit.parents);
                self.parents.insert(*oid, Arc::clone(&parents));
                Ok(parents)
            }
            Err(e) if e.is_not_found() || e.is_invalid_object() => {
                warn!(oid = %oid, "Dangling parent during ancestry search");
                Err(MetaError::corruption(format!("parent {oid} is missing")))
            }
            Err(e) => Err(e),
        }
    }
}

impl fmt::Debug for AncestryOracle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AncestryOracle")
            .field("parents_cached", &self.parents.entry_count())
            .field("answers_cached", &self.answers.entry_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Commit, ObjectDatabase, ObjectKind, Signature, Tree};
    use chrono::{TimeZone, Utc};
    use refscope_storage::{MemoryBackend, StorageBackend};

    struct Graph {
        backend: MemoryBackend,
        odb: Arc<ObjectDatabase>,
        oracle: AncestryOracle,
        tree: Oid,
    }

    impl Graph {
        fn new() -> Self {
            let backend = MemoryBackend::new();
            let odb = Arc::new(ObjectDatabase::new(Arc::new(backend.clone()), 64));
            let tree = Tree::new().write(&*odb).unwrap();
            let oracle = AncestryOracle::new(odb.clone(), 64);
            Self { backend, odb, oracle, tree }
        }

        fn commit(&self, msg: &str, parents: &[Oid]) -> Oid {
            let sig = Signature::new("A", "a@example.com", Utc.timestamp_opt(1, 0).unwrap());
            Commit::with_parents(self.tree, parents.to_vec(), sig.clone(), sig, msg)
                .write(&*self.odb)
                .unwrap()
        }
    }

    #[test]
    fn test_linear_chain() {
        let g = Graph::new();
        let c1 = g.commit("c1", &[]);
        let c2 = g.commit("c2", &[c1]);
        let c3 = g.commit("c3", &[c2]);

        assert!(g.oracle.is_descendant(&c3, &c1).unwrap());
        assert!(g.oracle.is_descendant(&c2, &c1).unwrap());
        assert!(!g.oracle.is_descendant(&c1, &c3).unwrap());
    }

    #[test]
    fn test_not_reflexive() {
        let g = Graph::new();
        let c1 = g.commit("c1", &[]);
        assert!(!g.oracle.is_descendant(&c1, &c1).unwrap());
    }

    #[test]
    fn test_disjoint_histories_unrelated() {
        let g = Graph::new();
        let a = g.commit("a", &[]);
        let b = g.commit("b", &[]);
        assert!(!g.oracle.is_descendant(&a, &b).unwrap());
        assert!(!g.oracle.is_descendant(&b, &a).unwrap());
        assert!(g.oracle.merge_base(&a, &b).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_ids() {
        let g = Graph::new();
        let c1 = g.commit("c1", &[]);
        let blob = g.odb.write_object(ObjectKind::Blob, b"blob").unwrap();

        assert!(g.oracle.is_descendant(&c1, &blob).unwrap_err().is_invalid_object());
        assert!(g.oracle.is_descendant(&Oid::hash(b"missing"), &c1).unwrap_err().is_invalid_object());
    }

    #[test]
    fn test_dangling_parent_is_corruption() {
        let g = Graph::new();
        let root = g.commit("root", &[]);
        let broken = g.commit("broken", &[Oid::hash(b"gone")]);
        assert!(g.oracle.is_descendant(&broken, &root).unwrap_err().is_corruption());
    }

    #[test]
    fn test_answers_survive_object_loss() {
        let g = Graph::new();
        let c1 = g.commit("c1", &[]);
        let c2 = g.commit("c2", &[c1]);
        assert!(g.oracle.is_descendant(&c2, &c1).unwrap());

        for key in g.backend.list_objects("objects/").unwrap() {
            g.backend.delete(&key).unwrap();
        }
        g.odb.clear_cache();

        assert!(g.oracle.is_descendant(&c2, &c1).unwrap());
        assert!(!g.oracle.is_descendant(&c1, &c2).unwrap());
    }

    #[test]
    fn test_merge_base_fork_and_fast_forward() {
        let g = Graph::new();
        let root = g.commit("root", &[]);
        let base = g.commit("base", &[root]);
        let left = g.commit("left", &[base]);
        let right = g.commit("right", &[base]);

        assert_eq!(g.oracle.merge_base(&left, &right).unwrap(), vec![base]);
        assert_eq!(g.oracle.merge_base(&left, &root).unwrap(), vec![root]);
        assert_eq!(g.oracle.merge_base(&left, &left).unwrap(), vec![left]);
    }

    #[test]
    fn test_merge_base_criss_cross() {
        let g = Graph::new();
        let root = g.commit("root", &[]);
        let a = g.commit("a", &[root]);
        let b = g.commit("b", &[root]);
        let m1 = g.commit("m1", &[a, b]);
        let m2 = g.commit("m2", &[b, a]);

        let mut bases = g.oracle.merge_base(&m1, &m2).unwrap();
        bases.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(bases, expected);
    }

    #[test]
    fn test_ahead_behind() {
        let g = Graph::new();
        let base = g.commit("base", &[]);
        let l1 = g.commit("l1", &[base]);
        let l2 = g.commit("l2", &[l1]);
        let u1 = g.commit("u1", &[base]);

        assert_eq!(g.oracle.ahead_behind(&l2, &u1).unwrap(), (2, 1));
        assert_eq!(g.oracle.ahead_behind(&l2, &l2).unwrap(), (0, 0));
        assert_eq!(g.oracle.ahead_behind(&base, &l2).unwrap(), (0, 2));
    }
}
