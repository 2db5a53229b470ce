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

//! Annotated tags and tag listing
//!
//! A tag ref under `refs/tags/` either points at a tag object (annotated)
//! or directly at any other object (lightweight).

use crate::{
    Commit, MetaError, MetaResult, ObjectKind, ObjectStore, Oid, RefTarget, ReferenceStore,
    Signature,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

const TAGS_PREFIX: &str = "refs/tags/";

/// Upper bound on tag-of-tag nesting when peeling
const MAX_PEEL_DEPTH: usize = 16;

/// Annotated tag object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Id of this tag object (zero until written or read)
    #[serde(skip)]
    pub id: Oid,

    /// Tag name without `refs/tags/`
    pub name: String,

    /// Tagged object
    pub target: Oid,

    /// Kind of the tagged object
    pub target_kind: ObjectKind,

    /// Tag message
    pub message: String,

    /// Who created the tag
    pub tagger: Signature,
}

impl Tag {
    /// Create a tag object for `target`
    pub fn new(
        name: impl Into<String>,
        target: Oid,
        target_kind: ObjectKind,
        tagger: Signature,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Oid::ZERO,
            name: name.into(),
            target,
            target_kind,
            message: message.into(),
            tagger,
        }
    }

    /// Encode the tag payload
    pub fn encode(&self) -> MetaResult<Vec<u8>> {
        Ok(postcard::to_allocvec(self)?)
    }

    /// Decode a tag payload stored under `id`
    pub fn decode(id: Oid, data: &[u8]) -> MetaResult<Self> {
        let mut tag: Tag = postcard::from_bytes(data)
            .map_err(|e| MetaError::Encoding(format!("tag {id}: {e}")))?;
        tag.id = id;
        Ok(tag)
    }

    /// Write the tag object, returning its id
    pub fn write(&self, store: &dyn ObjectStore) -> MetaResult<Oid> {
        store.write_object(ObjectKind::Tag, &self.encode()?)
    }

    /// Read a tag object
    ///
    /// # Errors
    ///
    /// [`MetaError::InvalidObject`] if `oid` is not a tag.
    pub fn read(store: &dyn ObjectStore, oid: &Oid) -> MetaResult<Self> {
        let raw = store.read_object(oid)?;
        if raw.kind != ObjectKind::Tag {
            return Err(MetaError::invalid_object(format!("{oid} is a {}, not a tag", raw.kind)));
        }
        Self::decode(*oid, &raw.data)
    }
}

/// One entry of a tag listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagEntry {
    /// Ref points at a tag object
    Annotated(Tag),
    /// Ref points straight at an object
    Lightweight {
        /// Tag name without `refs/tags/`
        name: String,
        /// Object the ref points at
        target: Oid,
    },
}

impl TagEntry {
    /// Tag name without `refs/tags/`
    pub fn name(&self) -> &str {
        match self {
            TagEntry::Annotated(tag) => &tag.name,
            TagEntry::Lightweight { name, .. } => name,
        }
    }

    /// Object the tag ultimately names (the tag object itself is skipped)
    pub fn target(&self) -> Oid {
        match self {
            TagEntry::Annotated(tag) => tag.target,
            TagEntry::Lightweight { target, .. } => *target,
        }
    }

    /// Check if this is an annotated tag
    pub fn is_annotated(&self) -> bool {
        matches!(self, TagEntry::Annotated(_))
    }
}

/// Follow tag objects from `oid` until a commit is reached
///
/// # Errors
///
/// [`MetaError::InvalidObject`] if the chain ends at something other than a
/// commit or nests deeper than the peel limit.
pub fn peel_to_commit(store: &dyn ObjectStore, oid: &Oid) -> MetaResult<Commit> {
    let mut current = *oid;
    for _ in 0..MAX_PEEL_DEPTH {
        let raw = store.read_object(&current)?;
        match raw.kind {
            ObjectKind::Commit => return Commit::decode(current, &raw.data),
            ObjectKind::Tag => current = Tag::decode(current, &raw.data)?.target,
            other => {
                return Err(MetaError::invalid_object(format!(
                    "{oid} peels to a {other}, not a commit"
                )))
            }
        }
    }
    Err(MetaError::invalid_object(format!("{oid}: tag chain too deep")))
}

impl ReferenceStore {
    /// All tags, sorted by name
    ///
    /// A tag ref whose target object is missing is listed as lightweight.
    pub fn list_tags(&self) -> MetaResult<Vec<TagEntry>> {
        let mut tags = Vec::new();

        for reference in self.list(Some(TAGS_PREFIX))? {
            let name = reference.shorthand().to_string();
            let target = match &reference.target {
                RefTarget::Direct(oid) => *oid,
                RefTarget::Symbolic(_) => match self.resolve(&reference.name) {
                    Ok(oid) => oid,
                    Err(e) if e.is_not_found() => continue,
                    Err(e) => return Err(e),
                },
            };

            let entry = match self.objects().read_object(&target) {
                Ok(raw) if raw.kind == ObjectKind::Tag => {
                    let mut tag = Tag::decode(target, &raw.data)?;
                    // the ref name is authoritative for listing
                    tag.name = name;
                    TagEntry::Annotated(tag)
                }
                Ok(_) => TagEntry::Lightweight { name, target },
                Err(e) if e.is_not_found() => TagEntry::Lightweight { name, target },
                Err(e) => return Err(e),
            };
            tags.push(entry);
        }

        debug!(count = tags.len(), "Listed tags");
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, ObjectDatabase, RefDatabase, RefStore, Tree};
    use chrono::{TimeZone, Utc};
    use refscope_storage::MemoryBackend;
    use std::sync::Arc;

    fn sig() -> Signature {
        Signature::new("Tagger", "tagger@example.com", Utc.timestamp_opt(5_000, 0).unwrap())
    }

    fn commit(odb: &ObjectDatabase) -> Oid {
        let tree = Tree::new().write(odb).unwrap();
        Commit::new(tree, sig(), sig(), "tagged").write(odb).unwrap()
    }

    #[test]
    fn test_tag_encode_excludes_id() {
        let mut tag = Tag::new("v1", Oid::hash(b"x"), ObjectKind::Commit, sig(), "release");
        let encoded = tag.encode().unwrap();
        tag.id = Oid::hash(b"other");
        assert_eq!(tag.encode().unwrap(), encoded);
    }

    #[test]
    fn test_peel_nested_tags() {
        let odb = ObjectDatabase::new(Arc::new(MemoryBackend::new()), 16);
        let c = commit(&odb);
        let inner = Tag::new("inner", c, ObjectKind::Commit, sig(), "").write(&odb).unwrap();
        let outer = Tag::new("outer", inner, ObjectKind::Tag, sig(), "").write(&odb).unwrap();

        assert_eq!(peel_to_commit(&odb, &outer).unwrap().id, c);
        assert_eq!(peel_to_commit(&odb, &c).unwrap().id, c);

        let blob = odb.write_object(ObjectKind::Blob, b"data").unwrap();
        assert!(peel_to_commit(&odb, &blob).unwrap_err().is_invalid_object());
        assert!(Tag::read(&odb, &c).unwrap_err().is_invalid_object());
    }

    #[test]
    fn test_list_tags_annotated_and_lightweight() {
        let backend = Arc::new(MemoryBackend::new());
        let odb = Arc::new(ObjectDatabase::new(backend.clone(), 16));
        let refdb = Arc::new(RefDatabase::new(backend));
        let store = ReferenceStore::new(refdb.clone(), odb.clone(), Arc::new(Config::default()));

        let c = commit(&odb);
        let tag_oid = Tag::new("v2", c, ObjectKind::Commit, sig(), "Release 2").write(&*odb).unwrap();
        refdb.write_ref("refs/tags/v1", None, Some(&RefTarget::Direct(c))).unwrap();
        refdb.write_ref("refs/tags/v2", None, Some(&RefTarget::Direct(tag_oid))).unwrap();

        let tags = store.list_tags().unwrap();
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0], TagEntry::Lightweight { name: "v1".into(), target: c });
        match &tags[1] {
            TagEntry::Annotated(tag) => {
                assert_eq!(tag.id, tag_oid);
                assert_eq!(tag.target, c);
                assert_eq!(tag.message, "Release 2");
            }
            other => panic!("expected annotated tag, got {other:?}"),
        }
        assert_eq!(tags[1].target(), c);
    }

    #[test]
    fn test_list_tags_empty_namespace() {
        let backend = Arc::new(MemoryBackend::new());
        let store = ReferenceStore::new(
            Arc::new(RefDatabase::new(backend.clone())),
            Arc::new(ObjectDatabase::new(backend, 16)),
            Arc::new(Config::default()),
        );
        assert!(store.list_tags().unwrap().is_empty());
    }
}
