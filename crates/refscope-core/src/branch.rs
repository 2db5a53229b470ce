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

//! Branch listing
//!
//! Local branches live under `refs/heads/`, remote tracking branches under
//! `refs/remotes/<remote>/<branch>`. A remote branch whose remote has no
//! configured URL is still listed, with [`RemoteUrl::Unconfigured`].

use crate::{MetaResult, Oid, Reference, ReferenceStore};
use std::fmt;
use tracing::{debug, warn};

const HEADS_PREFIX: &str = "refs/heads/";
const REMOTES_PREFIX: &str = "refs/remotes/";

/// Which branches to list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BranchFilter {
    /// `refs/heads/*`
    Local,
    /// `refs/remotes/*`
    Remote,
    /// Both, local first
    #[default]
    All,
}

/// URL of the remote a tracking branch belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteUrl {
    /// URL read from configuration
    Configured(String),
    /// The remote is unknown or declared without a URL
    Unconfigured,
}

impl RemoteUrl {
    /// The URL, if configured
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RemoteUrl::Configured(url) => Some(url),
            RemoteUrl::Unconfigured => None,
        }
    }
}

impl fmt::Display for RemoteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteUrl::Configured(url) => f.write_str(url),
            RemoteUrl::Unconfigured => f.write_str("(unconfigured)"),
        }
    }
}

/// Local or remote tracking
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchKind {
    /// A branch under `refs/heads/`
    Local {
        /// Name below `refs/heads/`
        name: String,
    },
    /// A remote tracking branch under `refs/remotes/`
    Remote {
        /// Remote the branch belongs to
        remote_name: String,
        /// Branch name on the remote
        short_name: String,
        /// Remote URL from configuration
        url: RemoteUrl,
    },
}

/// A branch reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    /// Underlying reference
    pub reference: Reference,

    /// Local or remote details
    pub kind: BranchKind,

    /// Whether HEAD symbolically targets this branch
    pub is_head: bool,
}

impl Branch {
    /// Display name: `main` for local, `origin/main` for remote branches
    pub fn name(&self) -> String {
        match &self.kind {
            BranchKind::Local { name } => name.clone(),
            BranchKind::Remote {
                remote_name,
                short_name,
                ..
            } => format!("{remote_name}/{short_name}"),
        }
    }

    /// Check if this is a local branch
    pub fn is_local(&self) -> bool {
        matches!(self.kind, BranchKind::Local { .. })
    }

    /// Check if this is a remote tracking branch
    pub fn is_remote(&self) -> bool {
        matches!(self.kind, BranchKind::Remote { .. })
    }

    /// Commit id for direct branch references
    pub fn target_oid(&self) -> Option<Oid> {
        self.reference.target_oid()
    }
}

/// Split the part of a remote ref after `refs/remotes/` into
/// `(remote_name, short_name)`
///
/// The longest configured remote name that prefixes the path wins, so a
/// remote called `team/upstream` owns `team/upstream/main`. Otherwise the
/// first path segment is the remote.
pub fn split_remote_ref<'a, I>(path: &'a str, configured: I) -> (&'a str, &'a str)
where
    I: IntoIterator<Item = &'a str>,
{
    let longest = configured
        .into_iter()
        .filter(|remote| {
            path.strip_prefix(remote)
                .and_then(|rest| rest.strip_prefix('/'))
                .is_some_and(|rest| !rest.is_empty())
        })
        .max_by_key(|remote| remote.len());

    match longest {
        Some(remote) => (remote, &path[remote.len() + 1..]),
        None => path.split_once('/').unwrap_or((path, "")),
    }
}

impl ReferenceStore {
    /// List branches, local ones first, each group sorted by name
    pub fn list_branches(&self, filter: BranchFilter) -> MetaResult<Vec<Branch>> {
        let head_target = self.head_target_name()?;
        let mut branches = Vec::new();

        if matches!(filter, BranchFilter::Local | BranchFilter::All) {
            for reference in self.list(Some(HEADS_PREFIX))? {
                let is_head = head_target.as_deref() == Some(reference.name.as_str());
                branches.push(self.branch_from_ref(reference, is_head));
            }
        }

        if matches!(filter, BranchFilter::Remote | BranchFilter::All) {
            for reference in self.list(Some(REMOTES_PREFIX))? {
                let is_head = head_target.as_deref() == Some(reference.name.as_str());
                branches.push(self.branch_from_ref(reference, is_head));
            }
        }

        debug!(filter = ?filter, count = branches.len(), "Listed branches");
        Ok(branches)
    }

    /// Remote tracking branch configured as upstream of a local branch
    ///
    /// `None` when no upstream is configured or the tracking ref doesn't
    /// exist yet.
    pub fn upstream(&self, branch: &Branch) -> MetaResult<Option<Branch>> {
        let BranchKind::Local { name } = &branch.kind else {
            return Ok(None);
        };
        let Some((remote, merge)) = self.config().branch_upstream(name) else {
            return Ok(None);
        };

        let short = merge.strip_prefix(HEADS_PREFIX).unwrap_or(merge);
        let tracking = format!("{REMOTES_PREFIX}{remote}/{short}");
        match self.lookup(&tracking) {
            Ok(reference) => Ok(Some(self.branch_from_ref(reference, false))),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub(crate) fn branch_from_ref(&self, reference: Reference, is_head: bool) -> Branch {
        let kind = if let Some(path) = reference.name.strip_prefix(REMOTES_PREFIX) {
            let config = self.config();
            let (remote_name, short_name) =
                split_remote_ref(path, config.remotes.keys().map(String::as_str));

            let url = match config.remote_url(remote_name) {
                Some(url) => RemoteUrl::Configured(url.to_string()),
                None => {
                    warn!(
                        remote = %remote_name,
                        branch = %reference.name,
                        "Remote has no configured URL; listing branch as unconfigured"
                    );
                    RemoteUrl::Unconfigured
                }
            };

            BranchKind::Remote {
                remote_name: remote_name.to_string(),
                short_name: short_name.to_string(),
                url,
            }
        } else {
            let name = reference
                .name
                .strip_prefix(HEADS_PREFIX)
                .unwrap_or(&reference.name)
                .to_string();
            BranchKind::Local { name }
        };

        Branch {
            reference,
            kind,
            is_head,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_remote_first_segment() {
        assert_eq!(split_remote_ref("origin/main", []), ("origin", "main"));
        assert_eq!(split_remote_ref("origin/feature/x", []), ("origin", "feature/x"));
        assert_eq!(split_remote_ref("lonely", []), ("lonely", ""));
    }

    #[test]
    fn test_split_remote_longest_configured() {
        let configured = ["team", "team/upstream", "origin"];
        assert_eq!(
            split_remote_ref("team/upstream/main", configured),
            ("team/upstream", "main")
        );
        assert_eq!(split_remote_ref("team/main", configured), ("team", "main"));
        // a configured name must be followed by a branch
        assert_eq!(split_remote_ref("team/upstream", ["team/upstream"]), ("team", "upstream"));
    }

    #[test]
    fn test_remote_url_display() {
        assert_eq!(RemoteUrl::Configured("u".into()).as_str(), Some("u"));
        assert_eq!(RemoteUrl::Unconfigured.as_str(), None);
        assert_eq!(RemoteUrl::Unconfigured.to_string(), "(unconfigured)");
    }
}
