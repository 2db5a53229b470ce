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

//! Commit graph walker
//!
//! [`RevWalk`] enumerates the commits reachable from a start commit. The
//! default order is newest committer timestamp first, ties broken by the
//! order commits were discovered; each commit is yielded once.
//!
//! Topological and reversed walks buffer the reachable set before the first
//! commit is yielded.
//!
//! # Examples
//!
//! ```
//! use refscope_core::{ObjectDatabase, RevWalk, WalkOptions};
//! # use refscope_core::{Commit, Signature, Tree};
//! # use refscope_storage::MemoryBackend;
//! # use std::sync::Arc;
//! # let odb = Arc::new(ObjectDatabase::new(Arc::new(MemoryBackend::new()), 16));
//! # let tree = Tree::new().write(&*odb)?;
//! # let sig = Signature::now("A", "a@example.com");
//! # let head = Commit::new(tree, sig.clone(), sig, "root").write(&*odb)?;
//!
//! let walk = RevWalk::new(odb, head, WalkOptions::default().limit(10))?;
//! for commit in walk {
//!     let commit = commit?;
//!     println!("{} {}", commit.id.short(), commit.summary());
//! }
//! # Ok::<(), refscope_core::MetaError>(())
//! ```

use crate::{Commit, MetaError, MetaResult, ObjectCursor, ObjectStore, Oid};
use chrono::{DateTime, Utc};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Walk order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sorting {
    /// Newest committer timestamp first
    #[default]
    Time,
    /// No parent before all of its children; time order among ready commits
    Topological,
}

/// Options for a [`RevWalk`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkOptions {
    /// Walk order
    pub sorting: Sorting,

    /// Yield oldest first (applied after `limit`)
    pub reverse: bool,

    /// Follow only the first parent of merges
    pub first_parent: bool,

    /// Commits whose ancestry is excluded from the walk
    pub hide: Vec<Oid>,

    /// Maximum number of commits to yield
    pub limit: Option<usize>,
}

impl WalkOptions {
    /// Set the walk order
    pub fn sorting(mut self, sorting: Sorting) -> Self {
        self.sorting = sorting;
        self
    }

    /// Yield oldest first
    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = reverse;
        self
    }

    /// Follow only first parents
    pub fn first_parent(mut self, first_parent: bool) -> Self {
        self.first_parent = first_parent;
        self
    }

    /// Exclude `oid` and everything reachable from it
    pub fn hide(mut self, oid: Oid) -> Self {
        self.hide.push(oid);
        self
    }

    /// Stop after `limit` commits
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn is_buffered(&self) -> bool {
        self.reverse || self.sorting == Sorting::Topological
    }
}

/// Heap entry ordered by timestamp, then earliest discovery
struct Queued {
    time: DateTime<Utc>,
    seq: u64,
    commit: Commit,
}

impl Queued {
    fn key(&self) -> (DateTime<Utc>, Reverse<u64>) {
        (self.time, Reverse(self.seq))
    }
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Time-ordered frontier over the commit graph
struct Frontier {
    objects: Arc<dyn ObjectStore>,
    heap: BinaryHeap<Queued>,
    seen: HashSet<Oid>,
    hidden: HashSet<Oid>,
    first_parent: bool,
    next_seq: u64,
    pending_error: Option<MetaError>,
}

impl Frontier {
    fn push(&mut self, commit: Commit) {
        self.heap.push(Queued {
            time: commit.time(),
            seq: self.next_seq,
            commit,
        });
        self.next_seq += 1;
    }

    fn next(&mut self) -> Option<MetaResult<Commit>> {
        if let Some(err) = self.pending_error.take() {
            self.heap.clear();
            return Some(Err(err));
        }

        let Queued { commit, .. } = self.heap.pop()?;
        let parents: &[Oid] = if self.first_parent {
            commit.parents.get(..1).unwrap_or_default()
        } else {
            &commit.parents
        };

        for parent in parents {
            if self.hidden.contains(parent) || !self.seen.insert(*parent) {
                continue;
            }
            match load_parent(self.objects.as_ref(), &commit.id, parent) {
                Ok(loaded) => self.push(loaded),
                Err(err) => {
                    // the commit itself is intact; the error follows it
                    self.pending_error = Some(err);
                    break;
                }
            }
        }

        Some(Ok(commit))
    }
}

enum Mode {
    Streaming(Frontier),
    Buffered(std::vec::IntoIter<MetaResult<Commit>>),
}

/// Single-pass iterator over reachable commits
///
/// Holds an object-store cursor until the iterator is exhausted or
/// dropped. Once an error has been yielded the walk ends.
pub struct RevWalk {
    mode: Mode,
    remaining: Option<usize>,
    cursor: Option<ObjectCursor>,
}

impl RevWalk {
    /// Start a walk at `start`
    ///
    /// # Errors
    ///
    /// [`MetaError::InvalidObject`] if `start` (or a hidden id) is missing
    /// or not a commit. Corruption found while buffering a topological or
    /// reversed walk is yielded by the iterator, not returned here.
    pub fn new(objects: Arc<dyn ObjectStore>, start: Oid, options: WalkOptions) -> MetaResult<Self> {
        let cursor = objects.open_cursor();
        let start_commit = load_start(objects.as_ref(), &start)?;
        let hidden = hidden_set(objects.as_ref(), &options.hide)?;

        let mut frontier = Frontier {
            objects,
            heap: BinaryHeap::new(),
            seen: HashSet::from([start]),
            hidden,
            first_parent: options.first_parent,
            next_seq: 0,
            pending_error: None,
        };
        if !frontier.hidden.contains(&start) {
            frontier.push(start_commit);
        }

        debug!(
            start = %start,
            sorting = ?options.sorting,
            reverse = options.reverse,
            first_parent = options.first_parent,
            hidden = frontier.hidden.len(),
            "Starting revision walk"
        );

        if !options.is_buffered() {
            return Ok(Self {
                mode: Mode::Streaming(frontier),
                remaining: options.limit,
                cursor: Some(cursor),
            });
        }

        let buffered = match buffer(frontier, &options) {
            Ok(commits) => commits.into_iter().map(Ok).collect::<Vec<_>>(),
            Err(err) => vec![Err(err)],
        };
        Ok(Self {
            mode: Mode::Buffered(buffered.into_iter()),
            remaining: None,
            cursor: Some(cursor),
        })
    }

    fn finish(&mut self) {
        if self.cursor.take().is_some() {
            trace!("Revision walk exhausted");
        }
        self.mode = Mode::Buffered(Vec::new().into_iter());
    }
}

impl Iterator for RevWalk {
    type Item = MetaResult<Commit>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == Some(0) {
            self.finish();
            return None;
        }

        let item = match &mut self.mode {
            Mode::Streaming(frontier) => frontier.next(),
            Mode::Buffered(iter) => iter.next(),
        };

        match item {
            Some(Ok(commit)) => {
                if let Some(remaining) = self.remaining.as_mut() {
                    *remaining -= 1;
                }
                Some(Ok(commit))
            }
            Some(Err(err)) => {
                self.finish();
                Some(Err(err))
            }
            None => {
                self.finish();
                None
            }
        }
    }
}

impl std::fmt::Debug for RevWalk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match &self.mode {
            Mode::Streaming(frontier) => format!("streaming({} queued)", frontier.heap.len()),
            Mode::Buffered(iter) => format!("buffered({} left)", iter.len()),
        };
        f.debug_struct("RevWalk")
            .field("mode", &mode)
            .field("remaining", &self.remaining)
            .field("active", &self.cursor.is_some())
            .finish()
    }
}

fn load_start(objects: &dyn ObjectStore, oid: &Oid) -> MetaResult<Commit> {
    match objects.get_commit(oid) {
        Ok(commit) => Ok(commit),
        Err(e) if e.is_not_found() => Err(MetaError::invalid_object(format!(
            "{oid} does not name a commit"
        ))),
        Err(e) => Err(e),
    }
}

fn load_parent(objects: &dyn ObjectStore, child: &Oid, parent: &Oid) -> MetaResult<Commit> {
    match objects.get_commit(parent) {
        Ok(commit) => Ok(commit),
        Err(e) if e.is_not_found() || e.is_invalid_object() => {
            warn!(commit = %child, parent = %parent, "Dangling parent reference");
            Err(MetaError::corruption(format!(
                "commit {child} has missing parent {parent}"
            )))
        }
        Err(e) => Err(e),
    }
}

/// Every commit reachable from `hide`, all parents followed
fn hidden_set(objects: &dyn ObjectStore, hide: &[Oid]) -> MetaResult<HashSet<Oid>> {
    let mut hidden = HashSet::new();
    let mut queue = VecDeque::new();

    for oid in hide {
        load_start(objects, oid)?;
        if hidden.insert(*oid) {
            queue.push_back(*oid);
        }
    }

    while let Some(current) = queue.pop_front() {
        let commit = objects.get_commit(&current)?;
        for parent in &commit.parents {
            if hidden.insert(*parent) {
                load_parent(objects, &current, parent)?;
                queue.push_back(*parent);
            }
        }
    }

    Ok(hidden)
}

/// Drain the frontier and apply topological order, limit and reverse
fn buffer(mut frontier: Frontier, options: &WalkOptions) -> MetaResult<Vec<Commit>> {
    let mut commits = Vec::new();
    while let Some(item) = frontier.next() {
        commits.push(item?);
    }

    if options.sorting == Sorting::Topological {
        commits = topo_sort(commits, options.first_parent);
    }
    if let Some(limit) = options.limit {
        commits.truncate(limit);
    }
    if options.reverse {
        commits.reverse();
    }
    Ok(commits)
}

/// Kahn's algorithm over the walked set; `commits` arrives in time order
fn topo_sort(commits: Vec<Commit>, first_parent: bool) -> Vec<Commit> {
    let index: HashMap<Oid, usize> = commits.iter().enumerate().map(|(i, c)| (c.id, i)).collect();
    let edges = |commit: &Commit| -> Vec<usize> {
        let parents = if first_parent {
            commit.parents.get(..1).unwrap_or_default()
        } else {
            &commit.parents[..]
        };
        parents.iter().filter_map(|p| index.get(p).copied()).collect()
    };

    let mut children = vec![0usize; commits.len()];
    for commit in &commits {
        for parent in edges(commit) {
            children[parent] += 1;
        }
    }

    // smaller index = earlier in time order
    let mut ready: BinaryHeap<Reverse<usize>> = children
        .iter()
        .enumerate()
        .filter(|(_, n)| **n == 0)
        .map(|(i, _)| Reverse(i))
        .collect();

    let mut order = Vec::with_capacity(commits.len());
    while let Some(Reverse(i)) = ready.pop() {
        for parent in edges(&commits[i]) {
            children[parent] -= 1;
            if children[parent] == 0 {
                ready.push(Reverse(parent));
            }
        }
        order.push(i);
    }

    let mut slots: Vec<Option<Commit>> = commits.into_iter().map(Some).collect();
    order.into_iter().filter_map(|i| slots[i].take()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ObjectDatabase, ObjectKind, Signature, Tree};
    use chrono::TimeZone;
    use refscope_storage::MemoryBackend;

    struct Graph {
        odb: Arc<ObjectDatabase>,
        tree: Oid,
    }

    impl Graph {
        fn new() -> Self {
            let odb = Arc::new(ObjectDatabase::new(Arc::new(MemoryBackend::new()), 64));
            let tree = Tree::new().write(&*odb).unwrap();
            Self { odb, tree }
        }

        fn commit(&self, msg: &str, parents: &[Oid], secs: i64) -> Oid {
            let sig = Signature::new("W", "w@example.com", Utc.timestamp_opt(secs, 0).unwrap());
            Commit::with_parents(self.tree, parents.to_vec(), sig.clone(), sig, msg)
                .write(&*self.odb)
                .unwrap()
        }

        fn walk(&self, start: Oid, options: WalkOptions) -> Vec<String> {
            RevWalk::new(self.odb.clone(), start, options)
                .unwrap()
                .map(|c| c.unwrap().message)
                .collect()
        }
    }

    #[test]
    fn test_linear_history_newest_first() {
        let g = Graph::new();
        let c1 = g.commit("c1", &[], 100);
        let c2 = g.commit("c2", &[c1], 200);
        let c3 = g.commit("c3", &[c2], 300);
        assert_eq!(g.walk(c3, WalkOptions::default()), ["c3", "c2", "c1"]);
    }

    #[test]
    fn test_merge_yields_shared_ancestor_once() {
        let g = Graph::new();
        let root = g.commit("root", &[], 100);
        let left = g.commit("left", &[root], 200);
        let right = g.commit("right", &[root], 300);
        let merge = g.commit("merge", &[left, right], 400);

        assert_eq!(g.walk(merge, WalkOptions::default()), ["merge", "right", "left", "root"]);
    }

    #[test]
    fn test_equal_timestamps_keep_discovery_order() {
        let g = Graph::new();
        let root = g.commit("root", &[], 100);
        let a = g.commit("a", &[root], 100);
        let b = g.commit("b", &[root], 100);
        let merge = g.commit("merge", &[a, b], 100);

        assert_eq!(g.walk(merge, WalkOptions::default()), ["merge", "a", "b", "root"]);
    }

    #[test]
    fn test_first_parent_and_hide() {
        let g = Graph::new();
        let root = g.commit("root", &[], 100);
        let main1 = g.commit("main1", &[root], 200);
        let side = g.commit("side", &[root], 250);
        let merge = g.commit("merge", &[main1, side], 300);

        let fp = g.walk(merge, WalkOptions::default().first_parent(true));
        assert_eq!(fp, ["merge", "main1", "root"]);

        let hidden = g.walk(merge, WalkOptions::default().hide(main1));
        assert_eq!(hidden, ["merge", "side"]);

        assert!(g.walk(main1, WalkOptions::default().hide(merge)).is_empty());
    }

    #[test]
    fn test_topological_with_skewed_clock() {
        let g = Graph::new();
        let root = g.commit("root", &[], 100);
        // parent committed "after" its child
        let skewed = g.commit("skewed", &[root], 900);
        let child = g.commit("child", &[skewed], 500);
        let other = g.commit("other", &[root], 600);
        let merge = g.commit("merge", &[child, other], 1000);

        let time = g.walk(merge, WalkOptions::default());
        assert_eq!(time, ["merge", "other", "child", "skewed", "root"]);

        let topo = g.walk(merge, WalkOptions::default().sorting(Sorting::Topological));
        let pos = |m: &str| topo.iter().position(|x| x == m).unwrap();
        assert!(pos("child") < pos("skewed"));
        assert!(pos("skewed") < pos("root"));
        assert!(pos("other") < pos("root"));
        assert_eq!(topo[0], "merge");
    }

    #[test]
    fn test_limit_and_reverse() {
        let g = Graph::new();
        let c1 = g.commit("c1", &[], 100);
        let c2 = g.commit("c2", &[c1], 200);
        let c3 = g.commit("c3", &[c2], 300);

        assert_eq!(g.walk(c3, WalkOptions::default().limit(2)), ["c3", "c2"]);
        assert_eq!(g.walk(c3, WalkOptions::default().reverse(true)), ["c1", "c2", "c3"]);
        assert_eq!(g.walk(c3, WalkOptions::default().limit(2).reverse(true)), ["c2", "c3"]);
        assert!(g.walk(c3, WalkOptions::default().limit(0)).is_empty());
    }

    #[test]
    fn test_start_must_be_commit() {
        let g = Graph::new();
        let blob = g.odb.write_object(ObjectKind::Blob, b"not a commit").unwrap();
        let err = RevWalk::new(g.odb.clone(), blob, WalkOptions::default()).unwrap_err();
        assert!(err.is_invalid_object());

        let err = RevWalk::new(g.odb.clone(), Oid::hash(b"nothing"), WalkOptions::default()).unwrap_err();
        assert!(err.is_invalid_object());
    }

    #[test]
    fn test_dangling_parent_yields_corruption_then_ends() {
        let g = Graph::new();
        let tip = g.commit("tip", &[Oid::hash(b"missing parent")], 100);

        let mut walk = RevWalk::new(g.odb.clone(), tip, WalkOptions::default()).unwrap();
        assert_eq!(walk.next().unwrap().unwrap().id, tip);
        assert!(walk.next().unwrap().unwrap_err().is_corruption());
        assert!(walk.next().is_none());
        assert_eq!(g.odb.open_cursors(), 0);

        let mut buffered =
            RevWalk::new(g.odb.clone(), tip, WalkOptions::default().reverse(true)).unwrap();
        assert!(buffered.next().unwrap().unwrap_err().is_corruption());
        assert!(buffered.next().is_none());
    }

    #[test]
    fn test_cursor_released_on_drop_and_exhaustion() {
        let g = Graph::new();
        let c1 = g.commit("c1", &[], 100);
        let c2 = g.commit("c2", &[c1], 200);

        let mut walk = RevWalk::new(g.odb.clone(), c2, WalkOptions::default()).unwrap();
        assert_eq!(g.odb.open_cursors(), 1);
        walk.next();
        drop(walk);
        assert_eq!(g.odb.open_cursors(), 0);

        let walk = RevWalk::new(g.odb.clone(), c2, WalkOptions::default()).unwrap();
        assert_eq!(walk.count(), 2);
        assert_eq!(g.odb.open_cursors(), 0);
    }
}
