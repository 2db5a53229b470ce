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

//! Reference store: name resolution, listing and HEAD queries

use crate::{
    Branch, Commit, MetaError, MetaResult, ObjectStore, Oid, RefStore, RefTarget, Reference,
};
use refscope_config::Config;
use std::sync::Arc;
use tracing::{debug, trace};

/// Name of the HEAD reference
pub const HEAD: &str = "HEAD";

/// Where HEAD currently points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Head {
    /// HEAD symbolically targets a branch that has a commit
    Branch(Branch),
    /// HEAD holds a commit id directly
    Detached(Commit),
}

impl Head {
    /// Commit id HEAD resolves to, when known without another lookup
    pub fn target_oid(&self) -> Option<Oid> {
        match self {
            Head::Branch(branch) => branch.target_oid(),
            Head::Detached(commit) => Some(commit.id),
        }
    }

    /// Check if HEAD is detached
    pub fn is_detached(&self) -> bool {
        matches!(self, Head::Detached(_))
    }
}

/// Resolves and enumerates references
///
/// Holds only shared handles; every call reads current state.
#[derive(Debug, Clone)]
pub struct ReferenceStore {
    refs: Arc<dyn RefStore>,
    objects: Arc<dyn ObjectStore>,
    config: Arc<Config>,
}

impl ReferenceStore {
    /// Create a reference store
    pub fn new(refs: Arc<dyn RefStore>, objects: Arc<dyn ObjectStore>, config: Arc<Config>) -> Self {
        Self { refs, objects, config }
    }

    pub(crate) fn refs(&self) -> &Arc<dyn RefStore> {
        &self.refs
    }

    pub(crate) fn objects(&self) -> &Arc<dyn ObjectStore> {
        &self.objects
    }

    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve a reference name to an object id
    ///
    /// Follows at most `core.max_symbolic_depth` symbolic hops.
    ///
    /// # Errors
    ///
    /// - [`MetaError::NotFound`] if the name (or a symbolic target) doesn't exist
    /// - [`MetaError::ResolutionDepthExceeded`] if the chain is longer than
    ///   allowed, which includes every cycle
    pub fn resolve(&self, name: &str) -> MetaResult<Oid> {
        let max_depth = self.config.core.max_symbolic_depth;
        let mut current = name.to_string();

        for hops in 0..=max_depth {
            match self.refs.read_ref(&current)?.target {
                RefTarget::Direct(oid) => {
                    debug!(ref_name = %name, hops, resolved = %oid, "Resolved reference");
                    return Ok(oid);
                }
                RefTarget::Symbolic(target) => {
                    trace!(from = %current, to = %target, "Following symbolic reference");
                    current = target;
                }
            }
        }

        Err(MetaError::ResolutionDepthExceeded {
            name: name.to_string(),
            max_depth,
        })
    }

    /// Read one reference without following it
    pub fn lookup(&self, name: &str) -> MetaResult<Reference> {
        self.refs.read_ref(name)
    }

    /// All references under `refs/`, optionally narrowed by `prefix`,
    /// sorted by name
    ///
    /// An absent namespace yields an empty list.
    pub fn list(&self, prefix: Option<&str>) -> MetaResult<Vec<Reference>> {
        let prefix = prefix.unwrap_or("refs/");
        let names = self.refs.list_ref_names(prefix)?;
        let mut refs = Vec::with_capacity(names.len());

        for name in names {
            match self.refs.read_ref(&name) {
                Ok(r) => refs.push(r),
                // deleted between listing and reading
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }

        debug!(prefix = %prefix, count = refs.len(), "Listed references");
        Ok(refs)
    }

    /// Resolve a short name the way a user would type it
    ///
    /// Tries, in order: `<name>`, `refs/<name>`, `refs/tags/<name>`,
    /// `refs/heads/<name>`, `refs/remotes/<name>`, `refs/remotes/<name>/HEAD`.
    pub fn dwim(&self, short: &str) -> MetaResult<Reference> {
        let candidates = [
            short.to_string(),
            format!("refs/{short}"),
            format!("refs/tags/{short}"),
            format!("refs/heads/{short}"),
            format!("refs/remotes/{short}"),
            format!("refs/remotes/{short}/HEAD"),
        ];

        for candidate in &candidates {
            if crate::refs::validate_ref_name(candidate).is_err() {
                continue;
            }
            match self.refs.read_ref(candidate) {
                Ok(r) => {
                    debug!(short = %short, matched = %candidate, "Expanded short reference name");
                    return Ok(r);
                }
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }

        Err(MetaError::not_found(format!("no reference matches '{short}'")))
    }

    /// Current HEAD
    ///
    /// `None` when HEAD is missing or points at a branch with no commits
    /// yet (unborn).
    pub fn head(&self) -> MetaResult<Option<Head>> {
        let head = match self.refs.read_ref(HEAD) {
            Ok(head) => head,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        match head.target {
            RefTarget::Direct(oid) => Ok(Some(Head::Detached(self.objects.get_commit(&oid)?))),
            RefTarget::Symbolic(target) => {
                match self.resolve(&target) {
                    Ok(_) => {}
                    Err(e) if e.is_not_found() => {
                        debug!(branch = %target, "HEAD is unborn");
                        return Ok(None);
                    }
                    Err(e) => return Err(e),
                }
                let reference = self.refs.read_ref(&target)?;
                Ok(Some(Head::Branch(self.branch_from_ref(reference, true))))
            }
        }
    }

    /// Name of the reference HEAD symbolically targets, if attached
    pub(crate) fn head_target_name(&self) -> MetaResult<Option<String>> {
        match self.refs.read_ref(HEAD) {
            Ok(head) => Ok(head.symbolic_target().map(str::to_string)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Check if HEAD holds a commit id directly
    pub fn is_head_detached(&self) -> MetaResult<bool> {
        match self.refs.read_ref(HEAD) {
            Ok(head) => Ok(head.target_oid().is_some()),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Check that no reference under `refs/` resolves to an existing object
    pub fn is_empty(&self) -> MetaResult<bool> {
        for name in self.refs.list_ref_names("refs/")? {
            let oid = match self.resolve(&name) {
                Ok(oid) => oid,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            };
            match self.objects.object_kind(&oid) {
                Ok(_) => return Ok(false),
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ObjectDatabase, ObjectKind, RefDatabase, Signature, Tree};
    use chrono::{TimeZone, Utc};
    use refscope_storage::MemoryBackend;

    struct Fixture {
        refdb: Arc<RefDatabase>,
        odb: Arc<ObjectDatabase>,
        store: ReferenceStore,
    }

    fn fixture() -> Fixture {
        let backend = Arc::new(MemoryBackend::new());
        let refdb = Arc::new(RefDatabase::new(backend.clone()));
        let odb = Arc::new(ObjectDatabase::new(backend, 64));
        let store = ReferenceStore::new(refdb.clone(), odb.clone(), Arc::new(Config::default()));
        Fixture { refdb, odb, store }
    }

    fn commit(odb: &ObjectDatabase) -> Oid {
        let tree = Tree::new().write(odb).unwrap();
        let sig = Signature::new("T", "t@example.com", Utc.timestamp_opt(1_000, 0).unwrap());
        crate::Commit::new(tree, sig.clone(), sig, "c").write(odb).unwrap()
    }

    fn set(refdb: &RefDatabase, name: &str, target: RefTarget) {
        refdb.write_ref(name, None, Some(&target)).unwrap();
    }

    #[test]
    fn test_resolve_direct_and_symbolic() {
        let f = fixture();
        let oid = commit(&f.odb);
        set(&f.refdb, "refs/heads/main", RefTarget::Direct(oid));
        set(&f.refdb, HEAD, RefTarget::Symbolic("refs/heads/main".into()));

        assert_eq!(f.store.resolve("refs/heads/main").unwrap(), oid);
        assert_eq!(f.store.resolve(HEAD).unwrap(), oid);
        assert!(f.store.resolve("refs/heads/nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_symbolic_chain_limit() {
        let f = fixture();
        let oid = commit(&f.odb);
        set(&f.refdb, "refs/chain/0", RefTarget::Direct(oid));
        for i in 1..=6 {
            set(&f.refdb, &format!("refs/chain/{i}"), RefTarget::Symbolic(format!("refs/chain/{}", i - 1)));
        }

        // refs/chain/5 needs five symbolic hops
        assert_eq!(f.store.resolve("refs/chain/5").unwrap(), oid);
        // refs/chain/6 needs six
        assert!(f.store.resolve("refs/chain/6").unwrap_err().is_depth_exceeded());
    }

    #[test]
    fn test_symbolic_cycle() {
        let f = fixture();
        set(&f.refdb, "refs/heads/a", RefTarget::Symbolic("refs/heads/b".into()));
        set(&f.refdb, "refs/heads/b", RefTarget::Symbolic("refs/heads/a".into()));
        assert!(f.store.resolve("refs/heads/a").unwrap_err().is_depth_exceeded());
    }

    #[test]
    fn test_list_sorted_and_filtered() {
        let f = fixture();
        let oid = commit(&f.odb);
        for name in ["refs/tags/v1", "refs/heads/topic", "refs/heads/main"] {
            set(&f.refdb, name, RefTarget::Direct(oid));
        }

        let all: Vec<String> = f.store.list(None).unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(all, vec!["refs/heads/main", "refs/heads/topic", "refs/tags/v1"]);

        let heads = f.store.list(Some("refs/heads/")).unwrap();
        assert_eq!(heads.len(), 2);
        assert!(f.store.list(Some("refs/notes/")).unwrap().is_empty());
    }

    #[test]
    fn test_dwim_order() {
        let f = fixture();
        let a = commit(&f.odb);
        let b = f.odb.write_object(ObjectKind::Blob, b"tagged").unwrap();
        set(&f.refdb, "refs/heads/v1", RefTarget::Direct(a));
        set(&f.refdb, "refs/tags/v1", RefTarget::Direct(b));
        set(&f.refdb, "refs/remotes/origin/HEAD", RefTarget::Symbolic("refs/remotes/origin/main".into()));

        // tags win over heads
        assert_eq!(f.store.dwim("v1").unwrap().name, "refs/tags/v1");
        assert_eq!(f.store.dwim("heads/v1").unwrap().name, "refs/heads/v1");
        assert_eq!(f.store.dwim("origin").unwrap().name, "refs/remotes/origin/HEAD");
        assert!(f.store.dwim("missing").unwrap_err().is_not_found());
    }

    #[test]
    fn test_head_states() {
        let f = fixture();
        assert!(f.store.head().unwrap().is_none());
        assert!(f.store.is_empty().unwrap());

        // unborn
        set(&f.refdb, HEAD, RefTarget::Symbolic("refs/heads/main".into()));
        assert!(f.store.head().unwrap().is_none());
        assert!(!f.store.is_head_detached().unwrap());

        // attached
        let oid = commit(&f.odb);
        set(&f.refdb, "refs/heads/main", RefTarget::Direct(oid));
        match f.store.head().unwrap() {
            Some(Head::Branch(branch)) => {
                assert!(branch.is_head);
                assert_eq!(branch.name(), "main");
                assert_eq!(branch.target_oid(), Some(oid));
            }
            other => panic!("expected attached HEAD, got {other:?}"),
        }
        assert!(!f.store.is_empty().unwrap());

        // detached
        f.refdb
            .write_ref(
                HEAD,
                Some(&RefTarget::Symbolic("refs/heads/main".into())),
                Some(&RefTarget::Direct(oid)),
            )
            .unwrap();
        assert!(f.store.is_head_detached().unwrap());
        match f.store.head().unwrap() {
            Some(Head::Detached(c)) => assert_eq!(c.id, oid),
            other => panic!("expected detached HEAD, got {other:?}"),
        }
    }

    #[test]
    fn test_is_empty_ignores_dangling_refs() {
        let f = fixture();
        set(&f.refdb, "refs/heads/ghost", RefTarget::Direct(Oid::hash(b"never written")));
        assert!(f.store.is_empty().unwrap());
    }
}
