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

//! Tree objects
//!
//! Trees map entry names to blobs or sub-trees. Entries are kept sorted by
//! name so identical contents always encode (and hash) identically. The
//! notes index is the main user.

use crate::{MetaError, MetaResult, ObjectKind, ObjectStore, Oid};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Kind of object a tree entry points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntryMode {
    /// Regular content (100644)
    Blob,
    /// Sub-tree (040000)
    Tree,
}

impl EntryMode {
    /// Object kind the entry must resolve to
    pub fn object_kind(&self) -> ObjectKind {
        match self {
            EntryMode::Blob => ObjectKind::Blob,
            EntryMode::Tree => ObjectKind::Tree,
        }
    }
}

impl fmt::Display for EntryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryMode::Blob => f.write_str("100644"),
            EntryMode::Tree => f.write_str("040000"),
        }
    }
}

/// Entry in a tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Entry name (a single path component)
    pub name: String,

    /// Blob or sub-tree
    pub mode: EntryMode,

    /// Object the entry points at
    pub oid: Oid,
}

impl TreeEntry {
    /// Create a new tree entry
    pub fn new(name: impl Into<String>, mode: EntryMode, oid: Oid) -> Self {
        Self {
            name: name.into(),
            mode,
            oid,
        }
    }

    /// Check if this entry points to a tree
    pub fn is_tree(&self) -> bool {
        self.mode == EntryMode::Tree
    }
}

/// Tree object with name-sorted entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    /// Entries keyed by name
    pub entries: BTreeMap<String, TreeEntry>,
}

impl Tree {
    /// Create a new empty tree
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry
    pub fn insert(&mut self, entry: TreeEntry) -> Option<TreeEntry> {
        self.entries.insert(entry.name.clone(), entry)
    }

    /// Remove an entry by name
    pub fn remove(&mut self, name: &str) -> Option<TreeEntry> {
        self.entries.remove(name)
    }

    /// Get an entry by name
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.get(name)
    }

    /// Entries in name order
    pub fn iter(&self) -> impl Iterator<Item = &TreeEntry> {
        self.entries.values()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the tree has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Encode the tree payload
    ///
    /// The empty tree encodes to zero bytes so it shares git's well-known
    /// empty-tree id.
    pub fn encode(&self) -> MetaResult<Vec<u8>> {
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }
        let entries: Vec<&TreeEntry> = self.entries.values().collect();
        Ok(postcard::to_allocvec(&entries)?)
    }

    /// Decode a tree payload
    pub fn decode(data: &[u8]) -> MetaResult<Self> {
        if data.is_empty() {
            return Ok(Tree::new());
        }
        let entries: Vec<TreeEntry> = postcard::from_bytes(data)?;
        let mut tree = Tree::new();
        for entry in entries {
            tree.insert(entry);
        }
        Ok(tree)
    }

    /// Write the tree, returning its id
    pub fn write(&self, store: &dyn ObjectStore) -> MetaResult<Oid> {
        store.write_object(ObjectKind::Tree, &self.encode()?)
    }

    /// Read a tree by id
    ///
    /// # Errors
    ///
    /// [`MetaError::NotFound`] if absent, [`MetaError::InvalidObject`] if
    /// the id names another kind of object.
    pub fn read(store: &dyn ObjectStore, oid: &Oid) -> MetaResult<Self> {
        let raw = store.read_object(oid)?;
        if raw.kind != ObjectKind::Tree {
            return Err(MetaError::invalid_object(format!(
                "{oid} is a {}, not a tree",
                raw.kind
            )));
        }
        Tree::decode(&raw.data)
    }
}
