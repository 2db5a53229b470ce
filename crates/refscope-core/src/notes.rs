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

//! Notes index
//!
//! Notes attach a free-text message to any object without changing it.
//! Each notes ref (default `refs/notes/commits`) points at a chain of notes
//! commits; the tree of the tip maps annotated object ids to message blobs.
//!
//! # Layout
//!
//! ```text
//! <tree>
//!   3f2a...40 hex         -> blob   (flat entry)
//!   9c/                   -> tree   (fan-out)
//!     1b...38 hex         -> blob
//!   e4/                   -> tree   (two fan-out levels)
//!     07/                 -> tree
//!       5d...36 hex       -> blob
//! ```
//!
//! Fan-out subtrees are named by two hex digits and may nest to any depth.
//! New notes are written flat; a note that already lives in a fan-out
//! subtree is updated where it is.
//!
//! # Updates
//!
//! Every create or remove writes a blob, tree(s) and a commit whose parent is
//! the observed tip, then moves the notes ref from that tip by
//! compare-and-swap. A lost race re-reads the tip and tries again, up to
//! `core.cas_retries` times.

use crate::refs::validate_ref_name;
use crate::{
    Commit, EntryMode, MetaError, MetaResult, ObjectKind, ObjectStore, Oid, RefStore, RefTarget,
    ReferenceStore, Signature, Tree, TreeEntry, OID_HEX_LEN,
};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

const NOTES_PREFIX: &str = "refs/notes/";
const ADD_MESSAGE: &str = "Notes added by 'git notes add'";
const REMOVE_MESSAGE: &str = "Notes removed by 'git notes remove'";

/// A note attached to an object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    /// Blob holding the message
    pub blob_id: Oid,

    /// Object the note annotates
    pub annotated_object_id: Oid,

    /// Note text
    pub message: String,

    /// Notes ref the note was read from or written to
    pub ref_name: String,
}

/// Where a note's entry sits in the notes tree
///
/// `path` holds the fan-out subtrees on the way down, outermost first, each
/// with its two-digit name. `leaf` is the entry name in the innermost tree.
/// A flat note has an empty path.
struct Slot {
    path: Vec<(String, Tree)>,
    leaf: String,
}

/// Read and update notes
#[derive(Debug, Clone)]
pub struct NotesIndex {
    refs: Arc<dyn RefStore>,
    objects: Arc<dyn ObjectStore>,
    default_ref: String,
    cas_retries: u32,
}

impl NotesIndex {
    /// Create a notes index over the handles of `store`
    pub fn new(store: &ReferenceStore) -> Self {
        Self {
            refs: Arc::clone(store.refs()),
            objects: Arc::clone(store.objects()),
            default_ref: store.config().core.notes_ref.clone(),
            cas_retries: store.config().core.cas_retries,
        }
    }

    /// Notes ref used when a call doesn't name one
    pub fn default_ref(&self) -> &str {
        &self.default_ref
    }

    /// Attach `message` to `annotated`
    ///
    /// # Errors
    ///
    /// - [`MetaError::NotFound`] if `annotated` doesn't exist
    /// - [`MetaError::AlreadyExists`] if a note exists and `overwrite` is false
    /// - [`MetaError::Conflict`] if concurrent writers won every retry
    pub fn create(
        &self,
        annotated: &Oid,
        message: &str,
        author: &Signature,
        committer: &Signature,
        ref_name: Option<&str>,
        overwrite: bool,
    ) -> MetaResult<Note> {
        let ref_name = self.notes_ref(ref_name)?;
        match self.objects.object_kind(annotated) {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                return Err(MetaError::not_found(format!("object {annotated}")))
            }
            Err(e) => return Err(e),
        }

        let blob_id = self.objects.write_object(ObjectKind::Blob, message.as_bytes())?;
        let hex = annotated.to_hex();

        self.update(&ref_name, author, committer, ADD_MESSAGE, |tree| {
            match self.locate(tree, annotated)? {
                Some(_) if !overwrite => Err(MetaError::AlreadyExists(format!(
                    "note for {annotated} in {ref_name}"
                ))),
                Some((slot, _)) => self.store_slot(tree, slot, Some(blob_id)),
                None => {
                    tree.insert(TreeEntry::new(hex.as_str(), EntryMode::Blob, blob_id));
                    Ok(())
                }
            }
        })?;

        info!(ref_name = %ref_name, object = %annotated, overwrite, "Added note");
        Ok(Note {
            blob_id,
            annotated_object_id: *annotated,
            message: message.to_string(),
            ref_name,
        })
    }

    /// Note attached to `annotated`
    ///
    /// # Errors
    ///
    /// [`MetaError::NotFound`] if there is no such note.
    pub fn read(&self, annotated: &Oid, ref_name: Option<&str>) -> MetaResult<Note> {
        let ref_name = self.notes_ref(ref_name)?;
        let tree = match self.read_tip(&ref_name)? {
            Some(tip) => self.tree_of(&tip)?,
            None => Tree::new(),
        };

        match self.locate(&tree, annotated)? {
            Some((_, blob_id)) => self.load_note(blob_id, *annotated, &ref_name),
            None => Err(MetaError::not_found(format!("note for {annotated} in {ref_name}"))),
        }
    }

    /// All notes under a notes ref, ordered by annotated object id
    ///
    /// Empty when the notes ref doesn't exist yet.
    pub fn list(&self, ref_name: Option<&str>) -> MetaResult<Vec<Note>> {
        let ref_name = self.notes_ref(ref_name)?;
        let Some(tip) = self.read_tip(&ref_name)? else {
            debug!(ref_name = %ref_name, "No notes ref; nothing to list");
            return Ok(Vec::new());
        };

        let mut notes = Vec::new();
        self.collect_notes(&self.tree_of(&tip)?, "", &ref_name, &mut notes)?;

        notes.sort_by(|a, b| a.annotated_object_id.cmp(&b.annotated_object_id));
        debug!(ref_name = %ref_name, count = notes.len(), "Listed notes");
        Ok(notes)
    }

    /// Remove `note` from its notes ref
    ///
    /// # Errors
    ///
    /// [`MetaError::NotFound`] if the note is already gone.
    pub fn remove(&self, note: &Note, author: &Signature, committer: &Signature) -> MetaResult<()> {
        let ref_name = self.notes_ref(Some(&note.ref_name))?;
        let annotated = note.annotated_object_id;

        self.update(&ref_name, author, committer, REMOVE_MESSAGE, |tree| {
            match self.locate(tree, &annotated)? {
                None => Err(MetaError::not_found(format!("note for {annotated} in {ref_name}"))),
                Some((slot, _)) => self.store_slot(tree, slot, None),
            }
        })?;

        info!(ref_name = %ref_name, object = %annotated, "Removed note");
        Ok(())
    }

    /// Apply `edit` to the tip tree and move the ref, retrying lost races
    fn update<F>(
        &self,
        ref_name: &str,
        author: &Signature,
        committer: &Signature,
        message: &str,
        mut edit: F,
    ) -> MetaResult<Oid>
    where
        F: FnMut(&mut Tree) -> MetaResult<()>,
    {
        let mut retry_count = 0;

        loop {
            let tip = self.read_tip(ref_name)?;
            let mut tree = match &tip {
                Some(tip) => self.tree_of(tip)?,
                None => Tree::new(),
            };
            edit(&mut tree)?;

            let tree_id = tree.write(self.objects.as_ref())?;
            let commit = Commit::with_parents(
                tree_id,
                tip.into_iter().collect(),
                author.clone(),
                committer.clone(),
                message,
            );
            let commit_id = commit.write(self.objects.as_ref())?;

            let expected = tip.map(RefTarget::Direct);
            match self
                .refs
                .write_ref(ref_name, expected.as_ref(), Some(&RefTarget::Direct(commit_id)))
            {
                Ok(()) => {
                    debug!(ref_name = %ref_name, commit = %commit_id, retry_count, "Moved notes ref");
                    return Ok(commit_id);
                }
                Err(e) if e.is_conflict() && retry_count < self.cas_retries => {
                    retry_count += 1;
                    warn!(ref_name = %ref_name, retry_count, error = %e, "Notes ref moved concurrently; retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn notes_ref(&self, ref_name: Option<&str>) -> MetaResult<String> {
        let name = ref_name.unwrap_or(&self.default_ref);
        validate_ref_name(name)?;
        if !name.starts_with(NOTES_PREFIX) {
            return Err(MetaError::invalid_argument(format!(
                "notes ref must live under {NOTES_PREFIX}: {name}"
            )));
        }
        Ok(name.to_string())
    }

    /// Current notes commit, `None` if the ref doesn't exist
    fn read_tip(&self, ref_name: &str) -> MetaResult<Option<Oid>> {
        match self.refs.read_ref(ref_name) {
            Ok(reference) => match reference.target {
                RefTarget::Direct(oid) => Ok(Some(oid)),
                RefTarget::Symbolic(target) => Err(MetaError::invalid_argument(format!(
                    "notes ref {ref_name} is symbolic (-> {target})"
                ))),
            },
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn tree_of(&self, tip: &Oid) -> MetaResult<Tree> {
        let commit = match self.objects.get_commit(tip) {
            Ok(commit) => commit,
            Err(e) if e.is_not_found() || e.is_invalid_object() => {
                return Err(MetaError::corruption(format!(
                    "notes ref points at {tip}, which is not a commit"
                )))
            }
            Err(e) => return Err(e),
        };
        self.load_tree(&commit.tree)
    }

    fn load_tree(&self, oid: &Oid) -> MetaResult<Tree> {
        match Tree::read(self.objects.as_ref(), oid) {
            Err(e) if e.is_not_found() || e.is_invalid_object() => {
                Err(MetaError::corruption(format!("notes tree {oid} is missing")))
            }
            other => other,
        }
    }

    /// Append the notes of `tree` whose names continue `prefix`
    fn collect_notes(
        &self,
        tree: &Tree,
        prefix: &str,
        ref_name: &str,
        notes: &mut Vec<Note>,
    ) -> MetaResult<()> {
        for entry in tree.iter() {
            let name = format!("{prefix}{}", entry.name);
            match entry.mode {
                EntryMode::Blob if name.len() == OID_HEX_LEN => {
                    if let Ok(annotated) = Oid::from_hex(&name) {
                        notes.push(self.load_note(entry.oid, annotated, ref_name)?);
                        continue;
                    }
                }
                EntryMode::Tree
                    if entry.name.len() == 2
                        && name.len() < OID_HEX_LEN
                        && entry.name.bytes().all(|b| b.is_ascii_hexdigit()) =>
                {
                    let sub = self.load_tree(&entry.oid)?;
                    self.collect_notes(&sub, &name, ref_name, notes)?;
                    continue;
                }
                _ => {}
            }
            trace!(entry = %name, "Skipping non-note entry");
        }
        Ok(())
    }

    /// Find the entry for `annotated`, flat or under any number of fan-out
    /// levels
    fn locate(&self, tree: &Tree, annotated: &Oid) -> MetaResult<Option<(Slot, Oid)>> {
        let hex = annotated.to_hex();
        let mut path: Vec<(String, Tree)> = Vec::new();

        loop {
            let rest = &hex[path.len() * 2..];
            let current = path.last().map_or(tree, |(_, sub)| sub);
            if let Some(blob) = current.get(rest).filter(|e| e.mode == EntryMode::Blob).map(|e| e.oid)
            {
                let leaf = rest.to_string();
                return Ok(Some((Slot { path, leaf }, blob)));
            }
            if rest.len() <= 2 {
                return Ok(None);
            }

            let prefix = &rest[..2];
            let Some(sub_id) = current.get(prefix).filter(|e| e.is_tree()).map(|e| e.oid) else {
                return Ok(None);
            };
            let sub = self.load_tree(&sub_id)?;
            path.push((prefix.to_string(), sub));
        }
    }

    /// Put `blob` at `slot` (or drop the entry when `None`) and rewrite the
    /// fan-out subtrees above it, pruning any left empty
    fn store_slot(&self, tree: &mut Tree, slot: Slot, blob: Option<Oid>) -> MetaResult<()> {
        let Slot { mut path, leaf } = slot;
        let mut name = leaf;
        let mut mode = EntryMode::Blob;
        let mut pending = blob;

        while let Some((prefix, mut sub)) = path.pop() {
            match pending {
                Some(oid) => {
                    sub.insert(TreeEntry::new(name, mode, oid));
                }
                None => {
                    sub.remove(&name);
                }
            }
            pending = if sub.is_empty() {
                None
            } else {
                Some(sub.write(self.objects.as_ref())?)
            };
            name = prefix;
            mode = EntryMode::Tree;
        }

        match pending {
            Some(oid) => {
                tree.insert(TreeEntry::new(name, mode, oid));
            }
            None => {
                tree.remove(&name);
            }
        }
        Ok(())
    }

    fn load_note(&self, blob_id: Oid, annotated: Oid, ref_name: &str) -> MetaResult<Note> {
        let raw = match self.objects.read_object(&blob_id) {
            Ok(raw) if raw.kind == ObjectKind::Blob => raw,
            Ok(raw) => {
                return Err(MetaError::corruption(format!(
                    "note {blob_id} for {annotated} is a {}",
                    raw.kind
                )))
            }
            Err(e) if e.is_not_found() => {
                return Err(MetaError::corruption(format!(
                    "note blob {blob_id} for {annotated} is missing"
                )))
            }
            Err(e) => return Err(e),
        };

        Ok(Note {
            blob_id,
            annotated_object_id: annotated,
            message: String::from_utf8_lossy(&raw.data).into_owned(),
            ref_name: ref_name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, ObjectDatabase, RefDatabase, Reference};
    use chrono::{TimeZone, Utc};
    use refscope_storage::MemoryBackend;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn sig() -> Signature {
        Signature::new("Noter", "noter@example.com", Utc.timestamp_opt(7_000, 0).unwrap())
    }

    /// Ref store that lets a rival writer win the next `races` swaps
    #[derive(Debug)]
    struct RacyRefs {
        inner: RefDatabase,
        objects: Arc<ObjectDatabase>,
        races: AtomicU32,
    }

    impl RefStore for RacyRefs {
        fn read_ref(&self, name: &str) -> MetaResult<Reference> {
            self.inner.read_ref(name)
        }

        fn write_ref(
            &self,
            name: &str,
            expected_old: Option<&RefTarget>,
            new: Option<&RefTarget>,
        ) -> MetaResult<()> {
            let pending = self.races.load(Ordering::SeqCst);
            if pending > 0 {
                self.races.store(pending - 1, Ordering::SeqCst);
                // a rival writer appends its own notes commit first
                let current = self.inner.read_ref(name).ok().and_then(|r| r.target_oid());
                let tree = match current {
                    Some(tip) => self.objects.get_commit(&tip)?.tree,
                    None => Tree::new().write(&*self.objects)?,
                };
                let parents = current.into_iter().collect();
                let rival = Commit::with_parents(tree, parents, sig(), sig(), format!("rival {pending}"))
                    .write(&*self.objects)?;
                self.inner.write_ref(
                    name,
                    current.map(RefTarget::Direct).as_ref(),
                    Some(&RefTarget::Direct(rival)),
                )?;
            }
            self.inner.write_ref(name, expected_old, new)
        }

        fn list_ref_names(&self, prefix: &str) -> MetaResult<Vec<String>> {
            self.inner.list_ref_names(prefix)
        }
    }

    struct Fixture {
        odb: Arc<ObjectDatabase>,
        refdb: Arc<RefDatabase>,
        notes: NotesIndex,
        target: Oid,
    }

    fn fixture() -> Fixture {
        let backend = Arc::new(MemoryBackend::new());
        let odb = Arc::new(ObjectDatabase::new(backend.clone(), 64));
        let refdb = Arc::new(RefDatabase::new(backend));
        let store = ReferenceStore::new(refdb.clone(), odb.clone(), Arc::new(Config::default()));
        let target = odb.write_object(ObjectKind::Blob, b"annotated").unwrap();
        Fixture {
            notes: NotesIndex::new(&store),
            odb,
            refdb,
            target,
        }
    }

    #[test]
    fn test_default_ref() {
        let f = fixture();
        assert_eq!(f.notes.default_ref(), "refs/notes/commits");
    }

    #[test]
    fn test_create_list_remove() {
        let f = fixture();
        assert!(f.notes.list(None).unwrap().is_empty());

        let note = f.notes.create(&f.target, "reviewed", &sig(), &sig(), None, false).unwrap();
        assert_eq!(note.ref_name, "refs/notes/commits");
        assert_eq!(note.annotated_object_id, f.target);

        let listed = f.notes.list(None).unwrap();
        assert_eq!(listed, vec![note.clone()]);
        assert_eq!(f.notes.read(&f.target, None).unwrap().message, "reviewed");

        f.notes.remove(&note, &sig(), &sig()).unwrap();
        assert!(f.notes.list(None).unwrap().is_empty());
        assert!(f.notes.read(&f.target, None).unwrap_err().is_not_found());
        assert!(f.notes.remove(&note, &sig(), &sig()).unwrap_err().is_not_found());
    }

    #[test]
    fn test_overwrite_semantics() {
        let f = fixture();
        f.notes.create(&f.target, "first", &sig(), &sig(), None, false).unwrap();

        let err = f.notes.create(&f.target, "second", &sig(), &sig(), None, false).unwrap_err();
        assert!(err.is_already_exists());

        f.notes.create(&f.target, "second", &sig(), &sig(), None, true).unwrap();
        let listed = f.notes.list(None).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].message, "second");
    }

    #[test]
    fn test_notes_commits_are_chained() {
        let f = fixture();
        f.notes.create(&f.target, "one", &sig(), &sig(), None, false).unwrap();
        let first = f.refdb.read_ref("refs/notes/commits").unwrap().target_oid().unwrap();
        f.notes.create(&f.target, "two", &sig(), &sig(), None, true).unwrap();
        let second = f.refdb.read_ref("refs/notes/commits").unwrap().target_oid().unwrap();

        let commit = f.odb.get_commit(&second).unwrap();
        assert_eq!(commit.parents, vec![first]);
        assert_eq!(commit.message, ADD_MESSAGE);
    }

    #[test]
    fn test_separate_refs_and_missing_target() {
        let f = fixture();
        f.notes
            .create(&f.target, "review", &sig(), &sig(), Some("refs/notes/review"), false)
            .unwrap();
        assert!(f.notes.list(None).unwrap().is_empty());
        assert_eq!(f.notes.list(Some("refs/notes/review")).unwrap().len(), 1);

        let missing = Oid::hash(b"never stored");
        let err = f.notes.create(&missing, "x", &sig(), &sig(), None, false).unwrap_err();
        assert!(err.is_not_found());

        let err = f.notes.list(Some("refs/heads/main")).unwrap_err();
        assert!(matches!(err, MetaError::InvalidArgument(_)));
    }

    #[test]
    fn test_fan_out_layout_read_and_preserved() {
        let f = fixture();
        let hex = f.target.to_hex();
        let (prefix, rest) = hex.split_at(2);
        let blob = f.odb.write_object(ObjectKind::Blob, b"fanned").unwrap();

        let mut sub = Tree::new();
        sub.insert(TreeEntry::new(rest, EntryMode::Blob, blob));
        let mut root = Tree::new();
        root.insert(TreeEntry::new(prefix, EntryMode::Tree, sub.write(&*f.odb).unwrap()));
        let tree = root.write(&*f.odb).unwrap();
        let tip = Commit::new(tree, sig(), sig(), "Notes").write(&*f.odb).unwrap();
        f.refdb
            .write_ref("refs/notes/commits", None, Some(&RefTarget::Direct(tip)))
            .unwrap();

        assert_eq!(f.notes.read(&f.target, None).unwrap().message, "fanned");

        f.notes.create(&f.target, "updated", &sig(), &sig(), None, true).unwrap();
        let new_tip = f.refdb.read_ref("refs/notes/commits").unwrap().target_oid().unwrap();
        let new_root = Tree::read(&*f.odb, &f.odb.get_commit(&new_tip).unwrap().tree).unwrap();
        assert!(new_root.get(prefix).unwrap().is_tree());
        assert!(new_root.get(&hex).is_none());
        assert_eq!(f.notes.list(None).unwrap()[0].message, "updated");

        let other = f.odb.write_object(ObjectKind::Blob, b"another").unwrap();
        f.notes.create(&other, "flat", &sig(), &sig(), None, false).unwrap();
        let tip = f.refdb.read_ref("refs/notes/commits").unwrap().target_oid().unwrap();
        let root = Tree::read(&*f.odb, &f.odb.get_commit(&tip).unwrap().tree).unwrap();
        assert!(root.get(&other.to_hex()).is_some());
    }

    #[test]
    fn test_nested_fan_out_levels() {
        let f = fixture();
        let hex = f.target.to_hex();
        let blob = f.odb.write_object(ObjectKind::Blob, b"deep").unwrap();

        // ab/cd/<36 hex>
        let mut inner = Tree::new();
        inner.insert(TreeEntry::new(&hex[4..], EntryMode::Blob, blob));
        let mut outer = Tree::new();
        outer.insert(TreeEntry::new(&hex[2..4], EntryMode::Tree, inner.write(&*f.odb).unwrap()));
        let mut root = Tree::new();
        root.insert(TreeEntry::new(&hex[..2], EntryMode::Tree, outer.write(&*f.odb).unwrap()));
        let tip = Commit::new(root.write(&*f.odb).unwrap(), sig(), sig(), "Notes")
            .write(&*f.odb)
            .unwrap();
        f.refdb
            .write_ref("refs/notes/commits", None, Some(&RefTarget::Direct(tip)))
            .unwrap();

        let listed = f.notes.list(None).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].annotated_object_id, f.target);
        assert_eq!(listed[0].message, "deep");
        assert_eq!(f.notes.read(&f.target, None).unwrap().message, "deep");
        assert!(f.notes.create(&f.target, "x", &sig(), &sig(), None, false).unwrap_err().is_already_exists());

        // overwrite keeps both levels
        f.notes.create(&f.target, "deeper", &sig(), &sig(), None, true).unwrap();
        let tip = f.refdb.read_ref("refs/notes/commits").unwrap().target_oid().unwrap();
        let root = Tree::read(&*f.odb, &f.odb.get_commit(&tip).unwrap().tree).unwrap();
        assert!(root.get(&hex).is_none());
        let outer = Tree::read(&*f.odb, &root.get(&hex[..2]).unwrap().oid).unwrap();
        assert!(outer.get(&hex[2..4]).unwrap().is_tree());
        assert_eq!(f.notes.list(None).unwrap()[0].message, "deeper");

        // removing the only note prunes the emptied subtrees
        let note = f.notes.read(&f.target, None).unwrap();
        f.notes.remove(&note, &sig(), &sig()).unwrap();
        let tip = f.refdb.read_ref("refs/notes/commits").unwrap().target_oid().unwrap();
        let root = Tree::read(&*f.odb, &f.odb.get_commit(&tip).unwrap().tree).unwrap();
        assert!(root.is_empty());
        assert!(f.notes.list(None).unwrap().is_empty());
    }

    fn racy_notes(races: u32, retries: u32) -> (NotesIndex, Oid) {
        let backend = Arc::new(MemoryBackend::new());
        let odb = Arc::new(ObjectDatabase::new(backend.clone(), 64));
        let refs = Arc::new(RacyRefs {
            inner: RefDatabase::new(backend),
            objects: odb.clone(),
            races: AtomicU32::new(races),
        });
        let mut config = Config::default();
        config.core.cas_retries = retries;
        let store = ReferenceStore::new(refs, odb.clone(), Arc::new(config));
        let target = odb.write_object(ObjectKind::Blob, b"annotated").unwrap();
        (NotesIndex::new(&store), target)
    }

    #[test]
    fn test_conflict_retried_then_surfaced() {
        let (notes, target) = racy_notes(2, 3);
        notes.create(&target, "eventually", &sig(), &sig(), None, false).unwrap();
        assert_eq!(notes.list(None).unwrap().len(), 1);

        let (notes, target) = racy_notes(10, 2);
        let err = notes.create(&target, "never", &sig(), &sig(), None, false).unwrap_err();
        assert!(err.is_conflict());
    }
}
