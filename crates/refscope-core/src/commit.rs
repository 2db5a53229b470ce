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

//! Commit objects and signatures
//!
//! A commit records a tree, an ordered list of parents (first parent is the
//! mainline), author and committer signatures and a message. Zero parents
//! marks a root commit.

use crate::{MetaError, MetaResult, ObjectKind, ObjectStore, Oid, Tree};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Author, committer or tagger identity with a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    /// Name of the person
    pub name: String,

    /// Email address
    pub email: String,

    /// Instant of the signature
    pub timestamp: DateTime<Utc>,

    /// Offset of the signer's local time from UTC, in minutes
    pub offset_minutes: i32,
}

impl Signature {
    /// Create a signature at `timestamp` in UTC
    ///
    /// # Examples
    ///
    /// ```
    /// use refscope_core::Signature;
    /// use chrono::{TimeZone, Utc};
    ///
    /// let when = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    /// let sig = Signature::new("Alice", "alice@example.com", when);
    /// assert_eq!(sig.to_string(), "Alice <alice@example.com> 1700000000 +0000");
    /// ```
    pub fn new(name: impl Into<String>, email: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            timestamp,
            offset_minutes: 0,
        }
    }

    /// Create a signature with the current time
    pub fn now(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self::new(name, email, Utc::now())
    }

    /// Set the signer's UTC offset
    pub fn with_offset(mut self, offset_minutes: i32) -> Self {
        self.offset_minutes = offset_minutes;
        self
    }

    /// Timestamp in the signer's local offset
    ///
    /// Falls back to UTC when the stored offset is out of range.
    pub fn local_time(&self) -> DateTime<FixedOffset> {
        let offset = FixedOffset::east_opt(self.offset_minutes * 60)
            .unwrap_or_else(|| Utc.fix());
        self.timestamp.with_timezone(&offset)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.offset_minutes < 0 { '-' } else { '+' };
        let abs = self.offset_minutes.unsigned_abs();
        write!(
            f,
            "{} <{}> {} {}{:02}{:02}",
            self.name,
            self.email,
            self.timestamp.timestamp(),
            sign,
            abs / 60,
            abs % 60
        )
    }
}

/// Commit object
///
/// `id` is not part of the encoded payload; it is filled in when a commit
/// is read back from the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Id of this commit (zero until written or read)
    #[serde(skip)]
    pub id: Oid,

    /// Tree this commit points to
    pub tree: Oid,

    /// Parent commits, first parent first
    pub parents: Vec<Oid>,

    /// Author information
    pub author: Signature,

    /// Committer information
    pub committer: Signature,

    /// Commit message
    pub message: String,
}

impl Commit {
    /// Create a root commit
    pub fn new(tree: Oid, author: Signature, committer: Signature, message: impl Into<String>) -> Self {
        Self::with_parents(tree, Vec::new(), author, committer, message)
    }

    /// Create a commit with parents
    pub fn with_parents(
        tree: Oid,
        parents: Vec<Oid>,
        author: Signature,
        committer: Signature,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Oid::ZERO,
            tree,
            parents,
            author,
            committer,
            message: message.into(),
        }
    }

    /// Check if this is a root commit (no parents)
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Check if this is a merge commit (multiple parents)
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }

    /// First (mainline) parent
    pub fn first_parent(&self) -> Option<&Oid> {
        self.parents.first()
    }

    /// Load every parent, in parent order
    ///
    /// # Errors
    ///
    /// [`MetaError::Corruption`] if a parent is missing from `store`.
    pub fn parent_commits(&self, store: &dyn ObjectStore) -> MetaResult<Vec<Commit>> {
        self.parents
            .iter()
            .map(|parent| match store.get_commit(parent) {
                Err(e) if e.is_not_found() => Err(MetaError::corruption(format!(
                    "commit {} names missing parent {parent}",
                    self.id
                ))),
                other => other,
            })
            .collect()
    }

    /// Load the root tree
    pub fn read_tree(&self, store: &dyn ObjectStore) -> MetaResult<Tree> {
        match Tree::read(store, &self.tree) {
            Err(e) if e.is_not_found() => Err(MetaError::corruption(format!(
                "commit {} names missing tree {}",
                self.id, self.tree
            ))),
            other => other,
        }
    }

    /// Committer timestamp, the walk ordering key
    pub fn time(&self) -> DateTime<Utc> {
        self.committer.timestamp
    }

    /// First line of the message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    /// Encode the commit payload
    pub fn encode(&self) -> MetaResult<Vec<u8>> {
        Ok(postcard::to_allocvec(self)?)
    }

    /// Decode a commit payload stored under `id`
    pub fn decode(id: Oid, data: &[u8]) -> MetaResult<Self> {
        let mut commit: Commit = postcard::from_bytes(data)
            .map_err(|e| MetaError::Encoding(format!("commit {id}: {e}")))?;
        commit.id = id;
        Ok(commit)
    }

    /// Write the commit, returning its id
    ///
    /// `self.id` is left untouched; use the returned id.
    pub fn write(&self, store: &dyn ObjectStore) -> MetaResult<Oid> {
        store.write_object(ObjectKind::Commit, &self.encode()?)
    }
}
