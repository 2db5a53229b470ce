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

//! Object identifier
//!
//! An OID is the SHA-1 of an object's framed content
//! (`"<kind> <len>\0" ++ payload`), rendered as 40 lowercase hex characters.

use crate::{MetaError, MetaResult, ObjectKind};
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::fmt;
use std::str::FromStr;

/// Length of an OID in bytes
pub const OID_LEN: usize = 20;

/// Length of an OID rendered as hex
pub const OID_HEX_LEN: usize = OID_LEN * 2;

/// Object identifier - SHA-1 hash of a framed object
///
/// Byte-wise equality and ordering; identical content produces identical
/// OIDs.
///
/// # Examples
///
/// ```
/// use refscope_core::{ObjectKind, Oid};
///
/// let oid = Oid::for_object(ObjectKind::Blob, b"hello");
/// assert_eq!(oid.to_hex().len(), 40);
/// assert_eq!(Oid::from_hex(&oid.to_hex())?, oid);
/// # Ok::<(), refscope_core::MetaError>(())
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Oid([u8; OID_LEN]);

impl Oid {
    /// The all-zero id, used as "no object"
    pub const ZERO: Oid = Oid([0u8; OID_LEN]);

    /// Hash raw bytes
    pub fn hash(data: &[u8]) -> Self {
        let digest = Sha1::digest(data);
        let mut bytes = [0u8; OID_LEN];
        bytes.copy_from_slice(&digest);
        Oid(bytes)
    }

    /// Hash an object payload together with its kind and length header
    ///
    /// Matches git's loose-object addressing, so a blob holding `hello`
    /// gets the same id git would give it.
    pub fn for_object(kind: ObjectKind, payload: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(kind.as_str().as_bytes());
        hasher.update(b" ");
        hasher.update(payload.len().to_string().as_bytes());
        hasher.update([0u8]);
        hasher.update(payload);
        let mut bytes = [0u8; OID_LEN];
        bytes.copy_from_slice(&hasher.finalize());
        Oid(bytes)
    }

    /// Create OID from raw bytes
    pub fn from_bytes(bytes: [u8; OID_LEN]) -> Self {
        Oid(bytes)
    }

    /// Get the raw bytes of the OID
    pub fn as_bytes(&self) -> &[u8; OID_LEN] {
        &self.0
    }

    /// Whether this is [`Oid::ZERO`]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; OID_LEN]
    }

    /// Convert OID to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Abbreviated hex form (first 7 characters)
    pub fn short(&self) -> String {
        let mut hex = self.to_hex();
        hex.truncate(7);
        hex
    }

    /// Create OID from a 40-character hex string
    ///
    /// # Errors
    ///
    /// [`MetaError::InvalidArgument`] if the string is not 40 hex characters
    pub fn from_hex(s: &str) -> MetaResult<Self> {
        if s.len() != OID_HEX_LEN {
            return Err(MetaError::invalid_argument(format!(
                "OID hex string must be {OID_HEX_LEN} characters, got {}",
                s.len()
            )));
        }

        let mut bytes = [0u8; OID_LEN];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|e| MetaError::invalid_argument(format!("invalid OID '{s}': {e}")))?;
        Ok(Oid(bytes))
    }

    /// Whether `s` looks like a full hex object id
    pub fn is_hex(s: &str) -> bool {
        s.len() == OID_HEX_LEN && s.bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// Storage path fragment: `{first2hex}/{remaining38hex}`
    pub fn to_path(&self) -> String {
        let hex = self.to_hex();
        format!("{}/{}", &hex[..2], &hex[2..])
    }
}

impl FromStr for Oid {
    type Err = MetaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Oid::from_hex(s)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self.to_hex())
    }
}

impl From<[u8; OID_LEN]> for Oid {
    fn from(bytes: [u8; OID_LEN]) -> Self {
        Oid(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        assert_eq!(Oid::hash(b"test content"), Oid::hash(b"test content"));
        assert_ne!(Oid::hash(b"content1"), Oid::hash(b"content2"));
    }

    #[test]
    fn test_matches_git_blob_id() {
        // `printf hello | git hash-object --stdin`
        let oid = Oid::for_object(ObjectKind::Blob, b"hello");
        assert_eq!(oid.to_hex(), "b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0");

        // the empty tree
        let empty = Oid::for_object(ObjectKind::Tree, b"");
        assert_eq!(empty.to_hex(), "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
    }

    #[test]
    fn test_kind_changes_id() {
        assert_ne!(
            Oid::for_object(ObjectKind::Blob, b"x"),
            Oid::for_object(ObjectKind::Tree, b"x")
        );
    }

    #[test]
    fn test_hex_parsing() {
        let oid = Oid::hash(b"test");
        assert_eq!(Oid::from_hex(&oid.to_hex()).unwrap(), oid);
        assert_eq!(oid.to_hex().parse::<Oid>().unwrap(), oid);

        assert!(Oid::from_hex("too_short").is_err());
        assert!(Oid::from_hex(&"z".repeat(40)).is_err());
        assert!(Oid::from_hex(&"a".repeat(64)).is_err());
    }

    #[test]
    fn test_is_hex() {
        assert!(Oid::is_hex(&"a1".repeat(20)));
        assert!(!Oid::is_hex("main"));
        assert!(!Oid::is_hex(&"g".repeat(40)));
    }

    #[test]
    fn test_path_and_short() {
        let oid = Oid::hash(b"test");
        let path = oid.to_path();
        let parts: Vec<&str> = path.split('/').collect();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].len(), 2);
        assert_eq!(parts[1].len(), 38);
        assert_eq!(oid.short().len(), 7);
        assert!(oid.to_hex().starts_with(&oid.short()));
    }

    #[test]
    fn test_zero() {
        assert!(Oid::ZERO.is_zero());
        assert!(Oid::default().is_zero());
        assert!(!Oid::hash(b"").is_zero());
    }
}
