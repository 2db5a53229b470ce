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

//! Error types for metadata operations

use refscope_config::ConfigError;
use refscope_storage::StorageError;
use thiserror::Error;

/// Result type alias for metadata operations
pub type MetaResult<T> = Result<T, MetaError>;

/// Errors surfaced by the reference store, walker, ancestry oracle and
/// notes index
///
/// Singular lookups report absence as [`MetaError::NotFound`]; listings of
/// an absent namespace return an empty collection instead.
#[derive(Error, Debug)]
pub enum MetaError {
    /// A reference name or object id is absent
    #[error("not found: {0}")]
    NotFound(String),

    /// An id exists but is not the kind of object the operation needs
    #[error("invalid object: {0}")]
    InvalidObject(String),

    /// Symbolic reference chain longer than the configured limit (or cyclic)
    #[error("symbolic reference chain starting at '{name}' exceeds {max_depth} hops")]
    ResolutionDepthExceeded {
        /// Reference the resolution started from
        name: String,
        /// Configured hop limit
        max_depth: usize,
    },

    /// A note (or other entry) already exists and overwriting was not requested
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A compare-and-swap saw a different value than expected
    #[error("concurrent update conflict on {0}")]
    Conflict(String),

    /// The commit graph is not fully linked (dangling parent or tree)
    #[error("repository corruption: {0}")]
    Corruption(String),

    /// Storage backend failure
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Object payload could not be encoded or decoded
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Caller supplied an unusable argument (bad ref name, malformed revision)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Repository configuration could not be read or written
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl MetaError {
    /// Create a NotFound error
    pub fn not_found(what: impl Into<String>) -> Self {
        MetaError::NotFound(what.into())
    }

    /// Create an InvalidObject error
    pub fn invalid_object(msg: impl Into<String>) -> Self {
        MetaError::InvalidObject(msg.into())
    }

    /// Create a Corruption error
    pub fn corruption(msg: impl Into<String>) -> Self {
        MetaError::Corruption(msg.into())
    }

    /// Create an InvalidArgument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        MetaError::InvalidArgument(msg.into())
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, MetaError::NotFound(_))
    }

    /// Check if this is an InvalidObject error
    pub fn is_invalid_object(&self) -> bool {
        matches!(self, MetaError::InvalidObject(_))
    }

    /// Check if this is a ResolutionDepthExceeded error
    pub fn is_depth_exceeded(&self) -> bool {
        matches!(self, MetaError::ResolutionDepthExceeded { .. })
    }

    /// Check if this is an AlreadyExists error
    pub fn is_already_exists(&self) -> bool {
        matches!(self, MetaError::AlreadyExists(_))
    }

    /// Check if this is a Conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(self, MetaError::Conflict(_))
    }

    /// Check if this is a Corruption error
    pub fn is_corruption(&self) -> bool {
        matches!(self, MetaError::Corruption(_))
    }

    /// Check if this is an InvalidArgument error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, MetaError::InvalidArgument(_))
    }

    /// Map a storage error, turning storage-level absence and CAS conflicts
    /// into their metadata counterparts
    pub(crate) fn from_storage(err: StorageError, what: &str) -> Self {
        match err {
            StorageError::NotFound(_) => MetaError::NotFound(what.to_string()),
            StorageError::Conflict(_) => MetaError::Conflict(what.to_string()),
            other => MetaError::Storage(other),
        }
    }
}

impl From<postcard::Error> for MetaError {
    fn from(err: postcard::Error) -> Self {
        MetaError::Encoding(err.to_string())
    }
}
