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

//! Capability traits the metadata service is built on
//!
//! Everything above this module talks to objects and references only
//! through [`ObjectStore`] and [`RefStore`]. [`crate::ObjectDatabase`] and
//! [`crate::RefDatabase`] implement them over a
//! [`refscope_storage::StorageBackend`]; tests may substitute their own.

use crate::{Commit, MetaError, MetaResult, ObjectKind, Oid, RawObject, RefTarget, Reference};
use std::fmt::Debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Read and append access to immutable objects
pub trait ObjectStore: Send + Sync + Debug {
    /// Read an object's kind and payload
    ///
    /// # Errors
    ///
    /// [`MetaError::NotFound`] if no object has this id.
    fn read_object(&self, id: &Oid) -> MetaResult<RawObject>;

    /// Store an object, returning its id; storing existing content is a no-op
    fn write_object(&self, kind: ObjectKind, payload: &[u8]) -> MetaResult<Oid>;

    /// Kind of the object stored under `id`
    fn object_kind(&self, id: &Oid) -> MetaResult<ObjectKind> {
        Ok(self.read_object(id)?.kind)
    }

    /// Read and decode a commit
    ///
    /// # Errors
    ///
    /// [`MetaError::NotFound`] if absent, [`MetaError::InvalidObject`] if
    /// `id` names a non-commit object.
    fn get_commit(&self, id: &Oid) -> MetaResult<Commit> {
        let raw = self.read_object(id)?;
        if raw.kind != ObjectKind::Commit {
            return Err(MetaError::invalid_object(format!(
                "{id} is a {}, not a commit",
                raw.kind
            )));
        }
        Commit::decode(*id, &raw.data)
    }

    /// Scoped handle held by long-running readers such as a walk
    fn open_cursor(&self) -> ObjectCursor {
        ObjectCursor::untracked()
    }
}

/// Compare-and-swap access to named references
pub trait RefStore: Send + Sync + Debug {
    /// Read a single reference without following symbolic targets
    ///
    /// # Errors
    ///
    /// [`MetaError::NotFound`] if the reference doesn't exist.
    fn read_ref(&self, name: &str) -> MetaResult<Reference>;

    /// Move `name` from `expected_old` to `new`
    ///
    /// `expected_old == None` requires the reference to be absent;
    /// `new == None` deletes it.
    ///
    /// # Errors
    ///
    /// [`MetaError::Conflict`] if the current value differs from
    /// `expected_old` or another writer holds the reference.
    fn write_ref(
        &self,
        name: &str,
        expected_old: Option<&RefTarget>,
        new: Option<&RefTarget>,
    ) -> MetaResult<()>;

    /// Reference names starting with `prefix`, sorted
    fn list_ref_names(&self, prefix: &str) -> MetaResult<Vec<String>>;
}

/// Scoped object-store handle
///
/// Stores that track readers hand out cursors bound to a shared counter;
/// dropping the cursor releases it on every exit path.
#[derive(Debug)]
pub struct ObjectCursor {
    open: Option<Arc<AtomicUsize>>,
}

impl ObjectCursor {
    /// Acquire a cursor accounted in `open`
    pub fn tracked(open: &Arc<AtomicUsize>) -> Self {
        let now = open.fetch_add(1, Ordering::AcqRel) + 1;
        trace!(open = now, "Acquired object cursor");
        Self {
            open: Some(Arc::clone(open)),
        }
    }

    /// A cursor nobody accounts for
    pub fn untracked() -> Self {
        Self { open: None }
    }
}

impl Drop for ObjectCursor {
    fn drop(&mut self) {
        if let Some(open) = self.open.take() {
            let now = open.fetch_sub(1, Ordering::AcqRel).saturating_sub(1);
            trace!(open = now, "Released object cursor");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn traits_are_object_safe() {
        fn _objects(_: &dyn ObjectStore) {}
        fn _refs(_: &dyn RefStore) {}
    }

    #[test]
    fn test_cursor_accounting() {
        let open = Arc::new(AtomicUsize::new(0));
        let a = ObjectCursor::tracked(&open);
        let b = ObjectCursor::tracked(&open);
        assert_eq!(open.load(Ordering::Acquire), 2);
        drop(a);
        assert_eq!(open.load(Ordering::Acquire), 1);
        drop(b);
        assert_eq!(open.load(Ordering::Acquire), 0);

        drop(ObjectCursor::untracked());
        assert_eq!(open.load(Ordering::Acquire), 0);
    }
}
