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

//! References and the reference database
//!
//! References are stored as small text files keyed by their full name:
//! - Direct: `<hex-oid>\n`
//! - Symbolic: `ref: <target>\n`
//!
//! Namespaces:
//! - `HEAD` - usually symbolic, pointing at the current branch
//! - `refs/heads/main` - local branch
//! - `refs/tags/v1.0.0` - tag
//! - `refs/remotes/origin/main` - remote tracking branch
//! - `refs/notes/commits` - notes

use crate::{MetaError, MetaResult, Oid, RefStore};
use refscope_storage::StorageBackend;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Prefixes stripped by [`Reference::shorthand`], most specific first
const SHORTHAND_PREFIXES: [&str; 5] = [
    "refs/heads/",
    "refs/tags/",
    "refs/remotes/",
    "refs/notes/",
    "refs/",
];

/// Ref types in the reference database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefType {
    /// Points at an object id
    Direct,
    /// Points at another reference name
    Symbolic,
}

/// What a reference points at
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefTarget {
    /// An object id
    Direct(Oid),
    /// Another reference, by full name
    Symbolic(String),
}

impl RefTarget {
    /// Serialize to the on-disk text form
    pub fn encode(&self) -> Vec<u8> {
        match self {
            RefTarget::Direct(oid) => format!("{}\n", oid.to_hex()).into_bytes(),
            RefTarget::Symbolic(target) => format!("ref: {target}\n").into_bytes(),
        }
    }

    /// Parse the on-disk text form of the reference `name`
    ///
    /// # Errors
    ///
    /// [`MetaError::Corruption`] for unreadable reference files.
    pub fn decode(name: &str, data: &[u8]) -> MetaResult<Self> {
        let content = std::str::from_utf8(data)
            .map_err(|_| MetaError::corruption(format!("reference {name} is not UTF-8")))?
            .trim();

        if let Some(target) = content.strip_prefix("ref:") {
            let target = target.trim();
            if target.is_empty() {
                return Err(MetaError::corruption(format!(
                    "symbolic reference {name} has an empty target"
                )));
            }
            Ok(RefTarget::Symbolic(target.to_string()))
        } else {
            Oid::from_hex(content).map(RefTarget::Direct).map_err(|_| {
                MetaError::corruption(format!("reference {name} holds an invalid id"))
            })
        }
    }
}

impl fmt::Display for RefTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefTarget::Direct(oid) => write!(f, "{oid}"),
            RefTarget::Symbolic(target) => write!(f, "ref: {target}"),
        }
    }
}

/// A named pointer to an object or to another reference
///
/// # Examples
///
/// ```
/// use refscope_core::{Oid, RefType, Reference};
///
/// let main = Reference::new_direct("refs/heads/feature/auth", Oid::hash(b"c"));
/// assert_eq!(main.ref_type(), RefType::Direct);
/// assert_eq!(main.shorthand(), "feature/auth");
///
/// let head = Reference::new_symbolic("HEAD", "refs/heads/main");
/// assert_eq!(head.symbolic_target(), Some("refs/heads/main"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// Full reference name (e.g. "refs/heads/main", "HEAD")
    pub name: String,

    /// Target of the reference
    pub target: RefTarget,
}

impl Reference {
    /// Create a direct reference
    pub fn new_direct(name: impl Into<String>, oid: Oid) -> Self {
        Self {
            name: name.into(),
            target: RefTarget::Direct(oid),
        }
    }

    /// Create a symbolic reference
    pub fn new_symbolic(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: RefTarget::Symbolic(target.into()),
        }
    }

    /// Direct or symbolic
    pub fn ref_type(&self) -> RefType {
        match self.target {
            RefTarget::Direct(_) => RefType::Direct,
            RefTarget::Symbolic(_) => RefType::Symbolic,
        }
    }

    /// Object id for direct references
    pub fn target_oid(&self) -> Option<Oid> {
        match &self.target {
            RefTarget::Direct(oid) => Some(*oid),
            RefTarget::Symbolic(_) => None,
        }
    }

    /// Target name for symbolic references
    pub fn symbolic_target(&self) -> Option<&str> {
        match &self.target {
            RefTarget::Direct(_) => None,
            RefTarget::Symbolic(target) => Some(target),
        }
    }

    /// Namespace below `refs/` (e.g. "heads", "tags", "remotes")
    pub fn namespace(&self) -> Option<&str> {
        self.name
            .strip_prefix("refs/")
            .and_then(|rest| rest.split('/').next())
    }

    /// Human-readable short name
    pub fn shorthand(&self) -> &str {
        shorthand(&self.name)
    }

    /// Check if this is a local branch
    pub fn is_branch(&self) -> bool {
        self.namespace() == Some("heads")
    }

    /// Check if this is a tag
    pub fn is_tag(&self) -> bool {
        self.namespace() == Some("tags")
    }

    /// Check if this is a remote tracking branch
    pub fn is_remote(&self) -> bool {
        self.namespace() == Some("remotes")
    }

    /// Check if this is a notes reference
    pub fn is_note(&self) -> bool {
        self.namespace() == Some("notes")
    }
}

/// Short form of a full reference name
pub fn shorthand(name: &str) -> &str {
    SHORTHAND_PREFIXES
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))
        .unwrap_or(name)
}

/// Validate a full reference name
///
/// Accepts upper-case pseudo refs (`HEAD`, `FETCH_HEAD`) and names under
/// `refs/` that follow git's ref-format rules.
pub fn validate_ref_name(name: &str) -> MetaResult<()> {
    let invalid = |why: &str| MetaError::invalid_argument(format!("invalid reference name '{name}': {why}"));

    if name.is_empty() {
        return Err(invalid("empty"));
    }

    if !name.contains('/') {
        if name.bytes().all(|b| b.is_ascii_uppercase() || b == b'_') {
            return Ok(());
        }
        return Err(invalid("top-level names must be upper-case like HEAD"));
    }

    if !name.starts_with("refs/") {
        return Err(invalid("must start with refs/"));
    }
    if name.ends_with('/') || name.ends_with('.') {
        return Err(invalid("must not end with '/' or '.'"));
    }
    if name.contains("..") || name.contains("@{") {
        return Err(invalid("must not contain '..' or '@{'"));
    }
    if name
        .chars()
        .any(|c| c.is_control() || c.is_whitespace() || "~^:?*[\\".contains(c))
    {
        return Err(invalid("contains a forbidden character"));
    }
    for component in name.split('/') {
        if component.is_empty() {
            return Err(invalid("empty path component"));
        }
        if component.starts_with('.') {
            return Err(invalid("path component starts with '.'"));
        }
        if component.ends_with(".lock") {
            return Err(invalid("path component ends with '.lock'"));
        }
    }
    Ok(())
}

/// Reference database over a storage backend
///
/// # Examples
///
/// ```
/// use refscope_core::{Oid, RefDatabase, RefStore, RefTarget};
/// use refscope_storage::MemoryBackend;
/// use std::sync::Arc;
///
/// let refdb = RefDatabase::new(Arc::new(MemoryBackend::new()));
/// let oid = Oid::hash(b"commit");
///
/// refdb.write_ref("refs/heads/main", None, Some(&RefTarget::Direct(oid)))?;
/// assert_eq!(refdb.read_ref("refs/heads/main")?.target_oid(), Some(oid));
///
/// // A stale expectation is rejected
/// let stale = RefTarget::Direct(Oid::hash(b"other"));
/// let err = refdb.write_ref("refs/heads/main", Some(&stale), None).unwrap_err();
/// assert!(err.is_conflict());
/// # Ok::<(), refscope_core::MetaError>(())
/// ```
pub struct RefDatabase {
    storage: Arc<dyn StorageBackend>,
}

impl RefDatabase {
    /// Create a reference database
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    fn read_raw(&self, name: &str) -> MetaResult<Option<Vec<u8>>> {
        match self.storage.get(name) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl RefStore for RefDatabase {
    fn read_ref(&self, name: &str) -> MetaResult<Reference> {
        validate_ref_name(name)?;
        let data = self
            .read_raw(name)?
            .ok_or_else(|| MetaError::not_found(format!("reference {name}")))?;

        debug!(ref_name = %name, "Read reference");
        Ok(Reference {
            name: name.to_string(),
            target: RefTarget::decode(name, &data)?,
        })
    }

    fn write_ref(
        &self,
        name: &str,
        expected_old: Option<&RefTarget>,
        new: Option<&RefTarget>,
    ) -> MetaResult<()> {
        validate_ref_name(name)?;
        if let Some(RefTarget::Symbolic(target)) = new {
            validate_ref_name(target)?;
        }

        // Compare parsed targets so formatting differences don't conflict,
        // then swap against the exact bytes observed.
        let observed = self.read_raw(name)?;
        let current = observed
            .as_deref()
            .map(|data| RefTarget::decode(name, data))
            .transpose()?;

        if current.as_ref() != expected_old {
            debug!(
                ref_name = %name,
                expected = ?expected_old,
                current = ?current,
                "Reference moved since it was read"
            );
            return Err(MetaError::Conflict(name.to_string()));
        }

        let encoded = new.map(RefTarget::encode);
        self.storage
            .compare_and_swap(name, observed.as_deref(), encoded.as_deref())
            .map_err(|e| MetaError::from_storage(e, name))?;

        debug!(ref_name = %name, new = ?new, "Updated reference");
        Ok(())
    }

    fn list_ref_names(&self, prefix: &str) -> MetaResult<Vec<String>> {
        let mut names: Vec<String> = self
            .storage
            .list_objects(prefix)?
            .into_iter()
            .filter(|key| key.starts_with("refs/") && validate_ref_name(key).is_ok())
            .collect();
        names.sort();
        Ok(names)
    }
}

impl fmt::Debug for RefDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefDatabase")
            .field("storage", &self.storage)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refscope_storage::MemoryBackend;

    fn refdb() -> (MemoryBackend, RefDatabase) {
        let backend = MemoryBackend::new();
        let db = RefDatabase::new(Arc::new(backend.clone()));
        (backend, db)
    }

    #[test]
    fn test_target_text_format() {
        let oid = Oid::hash(b"x");
        assert_eq!(RefTarget::Direct(oid).encode(), format!("{oid}\n").into_bytes());
        assert_eq!(
            RefTarget::Symbolic("refs/heads/main".into()).encode(),
            b"ref: refs/heads/main\n"
        );
        assert_eq!(
            RefTarget::decode("HEAD", b"ref: refs/heads/main\n").unwrap(),
            RefTarget::Symbolic("refs/heads/main".into())
        );
        assert!(RefTarget::decode("HEAD", b"garbage").unwrap_err().is_corruption());
        assert!(RefTarget::decode("HEAD", b"ref: \n").unwrap_err().is_corruption());
    }

    #[test]
    fn test_shorthand() {
        assert_eq!(shorthand("refs/heads/feature/auth"), "feature/auth");
        assert_eq!(shorthand("refs/tags/v1.0"), "v1.0");
        assert_eq!(shorthand("refs/remotes/origin/main"), "origin/main");
        assert_eq!(shorthand("refs/notes/commits"), "commits");
        assert_eq!(shorthand("refs/stash"), "stash");
        assert_eq!(shorthand("HEAD"), "HEAD");
    }

    #[test]
    fn test_namespace_predicates() {
        let r = Reference::new_direct("refs/remotes/origin/main", Oid::hash(b"x"));
        assert_eq!(r.namespace(), Some("remotes"));
        assert!(r.is_remote());
        assert!(!r.is_branch());
        assert_eq!(Reference::new_symbolic("HEAD", "refs/heads/main").namespace(), None);
    }

    #[test]
    fn test_validate_ref_name() {
        for ok in ["HEAD", "FETCH_HEAD", "refs/heads/main", "refs/heads/feature/auth-2", "refs/tags/v1.0.0"] {
            assert!(validate_ref_name(ok).is_ok(), "{ok}");
        }
        for bad in [
            "", "head", "main/x", "refs/heads/", "refs//x", "refs/heads/a..b", "refs/heads/.hidden",
            "refs/heads/x.lock", "refs/heads/a b", "refs/heads/a~1", "refs/heads/x@{0}", "refs/heads/end.",
        ] {
            assert!(validate_ref_name(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_read_missing_ref() {
        let (_backend, db) = refdb();
        assert!(db.read_ref("refs/heads/nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_write_ref_cas() {
        let (_backend, db) = refdb();
        let a = RefTarget::Direct(Oid::hash(b"a"));
        let b = RefTarget::Direct(Oid::hash(b"b"));

        db.write_ref("refs/heads/main", None, Some(&a)).unwrap();
        assert!(db.write_ref("refs/heads/main", None, Some(&b)).unwrap_err().is_conflict());

        db.write_ref("refs/heads/main", Some(&a), Some(&b)).unwrap();
        assert_eq!(db.read_ref("refs/heads/main").unwrap().target, b);

        db.write_ref("refs/heads/main", Some(&b), None).unwrap();
        assert!(db.read_ref("refs/heads/main").unwrap_err().is_not_found());
    }

    #[test]
    fn test_write_ref_tolerates_foreign_formatting() {
        let (backend, db) = refdb();
        let oid = Oid::hash(b"a");
        // written without trailing newline by some other tool
        backend.put("refs/heads/main", oid.to_hex().as_bytes()).unwrap();

        db.write_ref(
            "refs/heads/main",
            Some(&RefTarget::Direct(oid)),
            Some(&RefTarget::Symbolic("refs/heads/other".into())),
        )
        .unwrap();
        assert_eq!(backend.get("refs/heads/main").unwrap(), b"ref: refs/heads/other\n");
    }

    #[test]
    fn test_list_skips_non_refs() {
        let (backend, db) = refdb();
        let t = RefTarget::Direct(Oid::hash(b"a"));
        db.write_ref("refs/heads/main", None, Some(&t)).unwrap();
        db.write_ref("refs/tags/v1", None, Some(&t)).unwrap();
        db.write_ref("HEAD", None, Some(&RefTarget::Symbolic("refs/heads/main".into()))).unwrap();
        backend.put("objects/ab/cdef", b"blob 0\0").unwrap();
        backend.put("config.toml", b"").unwrap();

        assert_eq!(db.list_ref_names("").unwrap(), vec!["refs/heads/main", "refs/tags/v1"]);
        assert_eq!(db.list_ref_names("refs/tags/").unwrap(), vec!["refs/tags/v1"]);
        assert!(db.list_ref_names("refs/notes/").unwrap().is_empty());
    }
}
