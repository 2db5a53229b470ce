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

//! Reference and revision metadata for refscope repositories
//!
//! This crate implements the read side of a version-control repository plus
//! the notes write path:
//! - Content-addressed objects (SHA-1, git framing) with a moka read cache
//! - References with compare-and-swap updates and symbolic resolution
//! - Branch, tag and HEAD queries
//! - Lazy commit-graph walks in time or topological order
//! - Memoized ancestry queries and merge bases
//! - Notes attached to arbitrary objects
//!
//! # Architecture
//!
//! Everything above the storage layer talks through two capabilities:
//!
//! - [`ObjectStore`]: immutable objects, implemented by [`ObjectDatabase`]
//! - [`RefStore`]: named pointers with CAS, implemented by [`RefDatabase`]
//!
//! [`ReferenceStore`], [`RevWalk`], [`AncestryOracle`] and [`NotesIndex`]
//! are built on those; [`Repository`] wires them together. All operations
//! are synchronous.
//!
//! # Examples
//!
//! ```
//! use refscope_core::{Commit, Config, Repository, Signature, Tree, WalkOptions};
//! use refscope_core::{RefStore, RefTarget};
//! use refscope_storage::MemoryBackend;
//! use std::sync::Arc;
//!
//! let repo = Repository::from_backend(Arc::new(MemoryBackend::new()), Config::default());
//!
//! let tree = Tree::new().write(&**repo.objects())?;
//! let sig = Signature::now("Alice", "alice@example.com");
//! let root = Commit::new(tree, sig.clone(), sig.clone(), "root").write(&**repo.objects())?;
//! let tip = Commit::with_parents(tree, vec![root], sig.clone(), sig, "tip").write(&**repo.objects())?;
//! repo.refs().write_ref("refs/heads/main", None, Some(&RefTarget::Direct(tip)))?;
//!
//! let history: Vec<_> = repo.walk(tip, WalkOptions::default())?.collect::<Result<_, _>>()?;
//! assert_eq!(history.len(), 2);
//! assert!(repo.ancestry().is_descendant(&tip, &root)?);
//! # Ok::<(), refscope_core::MetaError>(())
//! ```

mod ancestry;
mod branch;
mod commit;
mod error;
mod notes;
mod object;
mod odb;
mod oid;
mod reference;
mod refs;
mod repository;
mod revision;
mod store;
mod tag;
mod tree;
mod walk;

pub use ancestry::AncestryOracle;
pub use branch::{split_remote_ref, Branch, BranchFilter, BranchKind, RemoteUrl};
pub use commit::{Commit, Signature};
pub use error::{MetaError, MetaResult};
pub use notes::{Note, NotesIndex};
pub use object::{ObjectKind, RawObject};
pub use odb::{ObjectDatabase, OdbStats};
pub use oid::{Oid, OID_HEX_LEN, OID_LEN};
pub use reference::{Head, ReferenceStore, HEAD};
pub use refs::{shorthand, validate_ref_name, RefDatabase, RefTarget, RefType, Reference};
pub use repository::{Repository, REPO_DIR_NAME};
pub use revision::resolve_revision;
pub use store::{ObjectCursor, ObjectStore, RefStore};
pub use tag::{peel_to_commit, Tag, TagEntry};
pub use tree::{EntryMode, Tree, TreeEntry};
pub use walk::{RevWalk, Sorting, WalkOptions};

pub use refscope_config::Config;
