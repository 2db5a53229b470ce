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

//! Configuration schema
//!
//! A repository's configuration lives in `.refscope/config.toml`:
//!
//! ```toml
//! [core]
//! notes_ref = "refs/notes/commits"
//! max_symbolic_depth = 5
//! cas_retries = 3
//!
//! [remotes.origin]
//! url = "https://example.com/project.git"
//!
//! [branches.main]
//! remote = "origin"
//! merge = "refs/heads/main"
//!
//! [logging]
//! level = "info"
//! format = "compact"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// File name of the configuration inside a repository directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reference and object settings
    pub core: CoreConfig,

    /// Configured remotes, keyed by remote name
    pub remotes: BTreeMap<String, RemoteConfig>,

    /// Upstream tracking for local branches, keyed by short branch name
    pub branches: BTreeMap<String, BranchConfig>,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// URL of a configured remote
    ///
    /// `None` both for an unknown remote and for a remote declared without
    /// a URL.
    pub fn remote_url(&self, remote_name: &str) -> Option<&str> {
        self.remotes.get(remote_name).and_then(|r| r.url.as_deref())
    }

    /// Add or update a remote
    pub fn set_remote(&mut self, name: impl Into<String>, url: Option<String>) {
        self.remotes.insert(name.into(), RemoteConfig { url });
    }

    /// Remove a remote
    pub fn remove_remote(&mut self, name: &str) -> Option<RemoteConfig> {
        self.remotes.remove(name)
    }

    /// Upstream `(remote, merge_ref)` for a local branch, if tracked
    pub fn branch_upstream(&self, branch: &str) -> Option<(&str, &str)> {
        self.branches
            .get(branch)
            .map(|bc| (bc.remote.as_str(), bc.merge.as_str()))
    }

    /// Set upstream tracking for a local branch
    pub fn set_branch_upstream(
        &mut self,
        branch: impl Into<String>,
        remote: impl Into<String>,
        merge: impl Into<String>,
    ) {
        self.branches.insert(
            branch.into(),
            BranchConfig {
                remote: remote.into(),
                merge: merge.into(),
            },
        );
    }

    /// Load the configuration of a repository directory
    ///
    /// A missing `config.toml` yields the defaults; environment overrides
    /// are applied either way.
    pub fn load(repo_dir: impl AsRef<Path>) -> crate::ConfigResult<Self> {
        crate::ConfigLoader::new().load_repository(repo_dir)
    }

    /// Write the configuration into a repository directory as TOML
    pub fn save(&self, repo_dir: impl AsRef<Path>) -> crate::ConfigResult<()> {
        let config_path = repo_dir.as_ref().join(CONFIG_FILE_NAME);

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, toml_str)?;
        Ok(())
    }
}

/// Reference and object settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Notes reference used when a caller doesn't name one
    #[serde(default = "default_notes_ref")]
    pub notes_ref: String,

    /// Symbolic hops allowed while resolving a reference
    #[serde(default = "default_max_symbolic_depth")]
    pub max_symbolic_depth: usize,

    /// Retries of a notes update after a compare-and-swap conflict
    #[serde(default = "default_cas_retries")]
    pub cas_retries: u32,

    /// Objects kept in the in-memory object cache
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,

    /// Branch HEAD points at in a freshly initialised repository
    #[serde(default = "default_branch")]
    pub default_branch: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        CoreConfig {
            notes_ref: default_notes_ref(),
            max_symbolic_depth: default_max_symbolic_depth(),
            cas_retries: default_cas_retries(),
            cache_capacity: default_cache_capacity(),
            default_branch: default_branch(),
        }
    }
}

/// A configured remote
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Remote URL; a remote may be declared without one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Upstream tracking for a local branch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchConfig {
    /// Remote name (e.g. "origin")
    pub remote: String,

    /// Branch ref on the remote (e.g. "refs/heads/main")
    pub merge: String,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format (pretty, compact, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_notes_ref() -> String {
    "refs/notes/commits".to_string()
}

fn default_max_symbolic_depth() -> usize {
    5
}

fn default_cas_retries() -> u32 {
    3
}

fn default_cache_capacity() -> u64 {
    1024
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.core.notes_ref, "refs/notes/commits");
        assert_eq!(config.core.max_symbolic_depth, 5);
        assert_eq!(config.core.cas_retries, 3);
        assert_eq!(config.core.default_branch, "main");
        assert!(config.remotes.is_empty());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [core]
            cas_retries = 7

            [remotes.origin]
            url = "https://example.com/repo.git"

            [remotes.mirror]
            "#,
        )
        .unwrap();

        assert_eq!(config.core.cas_retries, 7);
        assert_eq!(config.core.max_symbolic_depth, 5);
        assert_eq!(config.remote_url("origin"), Some("https://example.com/repo.git"));
        assert_eq!(config.remote_url("mirror"), None);
        assert!(config.remotes.contains_key("mirror"));
        assert_eq!(config.remote_url("upstream"), None);
    }

    #[test]
    fn test_branch_upstream() {
        let mut config = Config::default();
        config.set_branch_upstream("main", "origin", "refs/heads/main");
        assert_eq!(
            config.branch_upstream("main"),
            Some(("origin", "refs/heads/main"))
        );
        assert_eq!(config.branch_upstream("topic"), None);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.set_remote("origin", Some("https://example.com/r.git".to_string()));
        config.core.notes_ref = "refs/notes/review".to_string();
        config.save(dir.path()).unwrap();

        let loaded = crate::ConfigLoader::new()
            .load_file(dir.path().join(CONFIG_FILE_NAME))
            .unwrap();
        assert_eq!(loaded, config);
    }
}
