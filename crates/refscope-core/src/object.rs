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

//! Object kinds and the stored object frame
//!
//! Objects are stored uncompressed as `"<kind> <len>\0" ++ payload`, the
//! same bytes their id is computed over.

use crate::{MetaError, MetaResult, Oid};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Object kinds in the object database
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    /// Commit - snapshot metadata with parent links
    Commit,
    /// Tree - sorted name to object mapping
    Tree,
    /// Blob - arbitrary bytes (note messages)
    Blob,
    /// Tag - annotated tag object
    Tag,
}

impl ObjectKind {
    /// Get the kind as a string identifier
    ///
    /// # Examples
    ///
    /// ```
    /// use refscope_core::ObjectKind;
    ///
    /// assert_eq!(ObjectKind::Commit.as_str(), "commit");
    /// assert_eq!(ObjectKind::Tag.as_str(), "tag");
    /// ```
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Commit => "commit",
            ObjectKind::Tree => "tree",
            ObjectKind::Blob => "blob",
            ObjectKind::Tag => "tag",
        }
    }

    /// Parse an object kind from its string identifier
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "commit" => Some(ObjectKind::Commit),
            "tree" => Some(ObjectKind::Tree),
            "blob" => Some(ObjectKind::Blob),
            "tag" => Some(ObjectKind::Tag),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored object: its kind and undecoded payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawObject {
    /// Object kind from the frame header
    pub kind: ObjectKind,
    /// Payload bytes following the header
    pub data: Vec<u8>,
}

impl RawObject {
    /// Create a raw object
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        Self { kind, data }
    }

    /// Id this object is stored under
    pub fn id(&self) -> Oid {
        Oid::for_object(self.kind, &self.data)
    }

    /// Frame the object for storage
    pub fn encode(&self) -> Vec<u8> {
        let header = format!("{} {}\0", self.kind, self.data.len());
        let mut out = Vec::with_capacity(header.len() + self.data.len());
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(&self.data);
        out
    }

    /// Parse a stored frame
    ///
    /// # Errors
    ///
    /// [`MetaError::Corruption`] if the header is malformed or the length
    /// doesn't match the payload.
    pub fn decode(bytes: &[u8]) -> MetaResult<Self> {
        let nul = bytes
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| MetaError::corruption("object frame has no header terminator"))?;

        let header = std::str::from_utf8(&bytes[..nul])
            .map_err(|_| MetaError::corruption("object header is not UTF-8"))?;
        let (kind, len) = header
            .split_once(' ')
            .ok_or_else(|| MetaError::corruption(format!("malformed object header '{header}'")))?;

        let kind = ObjectKind::parse(kind)
            .ok_or_else(|| MetaError::corruption(format!("unknown object kind '{kind}'")))?;
        let len: usize = len
            .parse()
            .map_err(|_| MetaError::corruption(format!("bad object length '{len}'")))?;

        let data = &bytes[nul + 1..];
        if data.len() != len {
            return Err(MetaError::corruption(format!(
                "object length mismatch: header says {len}, payload has {}",
                data.len()
            )));
        }

        Ok(RawObject::new(kind, data.to_vec()))
    }
}
