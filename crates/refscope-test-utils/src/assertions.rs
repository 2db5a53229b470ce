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

//! Custom test assertions

use refscope_core::{MetaResult, Oid, REPO_DIR_NAME};
use std::path::Path;

/// Assert that `path` holds an initialized repository
pub fn assert_repo_initialized(path: &Path) {
    let repo_dir = path.join(REPO_DIR_NAME);
    assert!(repo_dir.is_dir(), "{REPO_DIR_NAME} directory should exist at {path:?}");
    assert!(repo_dir.join("HEAD").is_file(), "HEAD file should exist");
    assert!(repo_dir.join("config.toml").is_file(), "config.toml should exist");
}

/// Assert that a walk produced exactly `expected`, in order
pub fn assert_walk_ids<I>(walk: I, expected: &[Oid])
where
    I: IntoIterator<Item = MetaResult<refscope_core::Commit>>,
{
    let actual: Vec<Oid> = walk
        .into_iter()
        .map(|c| c.expect("walk yielded an error").id)
        .collect();
    assert_eq!(actual, expected, "walk order mismatch");
}

/// Assert that every id appears at most once
pub fn assert_unique(ids: &[Oid]) {
    let mut seen = std::collections::HashSet::new();
    for id in ids {
        assert!(seen.insert(id), "{id} yielded more than once");
    }
}
