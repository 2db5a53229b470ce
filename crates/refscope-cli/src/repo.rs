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
//! Repository access shared by the commands

use anyhow::{Context, Result};
use refscope_config::Config;
use refscope_core::{Oid, Repository, Signature, REPO_DIR_NAME};
use std::path::{Path, PathBuf};

/// Environment variable naming the author of note commits
pub const AUTHOR_NAME_ENV: &str = "REFSCOPE_AUTHOR_NAME";
/// Environment variable holding the author's email
pub const AUTHOR_EMAIL_ENV: &str = "REFSCOPE_AUTHOR_EMAIL";

/// Open the repository containing `cwd`
pub fn open_repository(cwd: &Path) -> Result<Repository> {
    Repository::open(cwd)
        .with_context(|| format!("Not a refscope repository: {}", cwd.display()))
}

/// `.refscope` directory of an open repository
pub fn repo_dir(repo: &Repository) -> Result<PathBuf> {
    repo.root()
        .map(|root| root.join(REPO_DIR_NAME))
        .context("Repository has no directory on disk")
}

/// Configuration of the repository around `cwd`, or defaults outside one
///
/// Used before logging is up, so failures fall back silently.
pub fn load_config(cwd: &Path) -> Config {
    Repository::discover(cwd)
        .ok()
        .and_then(|root| Config::load(root.join(REPO_DIR_NAME)).ok())
        .unwrap_or_default()
}

/// Run blocking core work off the async runtime
pub async fn blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .context("Background task failed")?
}

/// Resolve a revision, with a readable error
pub fn resolve(repo: &Repository, revision: &str) -> Result<Oid> {
    repo.resolve_revision(revision)
        .with_context(|| format!("Cannot resolve revision '{revision}'"))
}

/// Resolve any object: a full hex id is taken as-is, anything else is
/// resolved as a revision
pub fn resolve_object(repo: &Repository, spec: &str) -> Result<Oid> {
    if Oid::is_hex(spec) {
        return Ok(Oid::from_hex(spec)?);
    }
    resolve(repo, spec)
}

/// Identity for commits written by the CLI (note commits)
pub fn signature() -> Signature {
    let name = std::env::var(AUTHOR_NAME_ENV).unwrap_or_else(|_| "refscope".to_string());
    let email = std::env::var(AUTHOR_EMAIL_ENV).unwrap_or_else(|_| "refscope@localhost".to_string());
    Signature::now(name, email)
}
